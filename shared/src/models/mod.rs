//! Data models
//!
//! All ids are `i64` (SQLite INTEGER PRIMARY KEY), all timestamps are UTC
//! epoch milliseconds. Every entity embeds [`AuditMetadata`] and a
//! [`RecordStatus`]; rows are soft-deleted, never removed.

pub mod audit;
pub mod category;
pub mod serde_helpers;
pub mod status;
pub mod subscription;
pub mod tag;

// Re-exports
pub use audit::*;
pub use category::*;
pub use status::*;
pub use subscription::*;
pub use tag::*;
