//! Blog taxonomy core
//!
//! Category tree, tag registry and subscription reconciliation over SQLite.
//!
//! # 模块结构
//!
//! ```text
//! blog-core/src/
//! ├── core/          # 配置、状态
//! ├── db/            # 连接池、迁移、仓储
//! ├── services/      # 分类树、标签、订阅
//! ├── pagination.rs  # 分页窗口
//! └── utils/         # 日志
//! ```
//!
//! Every service operation returns [`AppResult`]; wrap it in
//! [`shared::Envelope`] for the `{ success, data | error }` wire shape.

pub mod core;
pub mod db;
pub mod pagination;
pub mod services;
pub mod utils;

pub use crate::core::{AppState, Config};
pub use db::DbService;
pub use pagination::{PageLimits, Window};
pub use services::{
    CategoryService, CategorySubscriptions, ServiceSettings, SubscriptionReconciler,
    SubscriptionService, TagService, TagSubscriptions,
};
pub use shared::{AppError, AppResult, Envelope, ErrorCode};

pub use utils::logger::{init_logger, init_logger_with_file};
