//! Repository Module
//!
//! Free async functions over `&mut SqliteConnection`, so the same function
//! runs on a pooled connection or inside a service transaction
//! (`&mut *tx`). Business rules live in the services; repositories only map
//! rows and report what the store actually touched.

pub mod category;
pub mod mapping;
pub mod subscription;
pub mod tag;

pub use mapping::{CategoryTarget, SubscriptionTarget, TagTarget};

use shared::error::AppError;
use shared::models::{AuditMetadata, RecordStatus};
use thiserror::Error;

/// Repository error types
#[derive(Debug, Error)]
pub enum RepoError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Duplicate: {0}")]
    Duplicate(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Validation error: {0}")]
    Validation(String),
}

impl From<sqlx::Error> for RepoError {
    fn from(err: sqlx::Error) -> Self {
        if let Some(db_err) = err.as_database_error()
            && db_err.is_unique_violation()
        {
            return RepoError::Duplicate(db_err.message().to_string());
        }
        RepoError::Database(err.to_string())
    }
}

impl From<RepoError> for AppError {
    fn from(err: RepoError) -> Self {
        match err {
            RepoError::NotFound(msg) => AppError::not_found(msg),
            RepoError::Duplicate(msg) => AppError::conflict(msg),
            RepoError::Validation(msg) => AppError::bad_request(msg),
            RepoError::Database(msg) => {
                tracing::error!(target: "database", error = %msg, "Database error occurred");
                AppError::internal("Database error")
            }
        }
    }
}

/// Result type for repository operations
pub type RepoResult<T> = Result<T, RepoError>;

// =============================================================================
// Shared row fragments
// =============================================================================

/// `use_flag` / `delete_flag` pair as stored
#[derive(Debug, sqlx::FromRow)]
pub(crate) struct StatusColumns {
    pub use_flag: String,
    pub delete_flag: String,
}

impl StatusColumns {
    pub fn decode(&self) -> RepoResult<RecordStatus> {
        RecordStatus::from_flags(&self.use_flag, &self.delete_flag).ok_or_else(|| {
            RepoError::Database(format!(
                "Corrupted status flags: use_flag={}, delete_flag={}",
                self.use_flag, self.delete_flag
            ))
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
pub(crate) struct AuditColumns {
    pub creator_id: i64,
    pub created_at: i64,
    pub updater_id: i64,
    pub updated_at: i64,
    pub deleter_id: Option<i64>,
    pub deleted_at: Option<i64>,
}

impl From<AuditColumns> for AuditMetadata {
    fn from(c: AuditColumns) -> Self {
        AuditMetadata {
            creator_id: c.creator_id,
            created_at: c.created_at,
            updater_id: c.updater_id,
            updated_at: c.updated_at,
            deleter_id: c.deleter_id,
            deleted_at: c.deleted_at,
        }
    }
}

/// Window columns selected next to every list row
#[derive(Debug, sqlx::FromRow)]
pub(crate) struct WindowColumns {
    pub row_no: i64,
    pub total_cnt: i64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::error::ErrorCode;

    #[test]
    fn test_repo_error_maps_to_codes() {
        assert_eq!(
            AppError::from(RepoError::NotFound("Tag 1".into())).code,
            ErrorCode::NotFound
        );
        assert_eq!(
            AppError::from(RepoError::Duplicate("x".into())).code,
            ErrorCode::Conflict
        );
        assert_eq!(
            AppError::from(RepoError::Validation("x".into())).code,
            ErrorCode::BadRequest
        );
        let internal = AppError::from(RepoError::Database("disk I/O error".into()));
        assert_eq!(internal.code, ErrorCode::InternalServerError);
        // store details stay in the log, not in the caller-facing message
        assert_eq!(internal.message, "Database error");
    }

    #[test]
    fn test_corrupted_flags_are_database_errors() {
        let cols = StatusColumns {
            use_flag: "Y".into(),
            delete_flag: "Y".into(),
        };
        assert!(matches!(cols.decode(), Err(RepoError::Database(_))));
    }
}
