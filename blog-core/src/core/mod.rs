//! 核心模块 - 配置和状态
//!
//! - [`Config`] - 环境变量配置
//! - [`AppState`] - 服务集合

pub mod config;
pub mod state;

pub use config::{Config, DEFAULT_MAX_BULK_IDS};
pub use state::AppState;
