//! Shared types for the blog taxonomy core
//!
//! Domain models, request payloads, pagination/multi-result shapes and the
//! unified error envelope. Kept free of any database dependency so HTTP
//! handlers and clients can depend on it directly.

pub mod error;
pub mod models;
pub mod request;
pub mod response;
pub mod types;
pub mod util;

// Re-exports
pub use error::{AppError, AppResult, Envelope, ErrorCode};
pub use request::PageRequest;
pub use response::{MultiResult, Numbered, Page};
pub use serde::{Deserialize, Serialize};
