//! Application error type

use super::codes::ErrorCode;
use thiserror::Error;

/// Application error with a code and a human-readable message
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{code}: {message}")]
pub struct AppError {
    /// The error code identifying the type of error
    pub code: ErrorCode,
    /// Human-readable error message
    pub message: String,
}

/// Result type returned by every service operation
pub type AppResult<T> = Result<T, AppError>;

impl AppError {
    /// Create a new error with the default message for the error code
    pub fn new(code: ErrorCode) -> Self {
        Self {
            message: code.message().to_string(),
            code,
        }
    }

    /// Create a new error with a custom message
    pub fn with_message(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    // ==================== Convenience constructors ====================

    /// `NOT_FOUND` with "<resource> not found"
    pub fn not_found(resource: impl Into<String>) -> Self {
        Self::with_message(ErrorCode::NotFound, format!("{} not found", resource.into()))
    }

    /// `CONFLICT` with a custom message
    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::with_message(ErrorCode::Conflict, msg)
    }

    /// `BAD_REQUEST` with a custom message
    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self::with_message(ErrorCode::BadRequest, msg)
    }

    /// `INTERNAL_SERVER_ERROR` with a custom message
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::with_message(ErrorCode::InternalServerError, msg)
    }

    pub fn is_not_found(&self) -> bool {
        self.code == ErrorCode::NotFound
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_uses_default_message() {
        let err = AppError::new(ErrorCode::Conflict);
        assert_eq!(err.message, "Resource already exists");
        assert_eq!(err.to_string(), "CONFLICT: Resource already exists");
    }

    #[test]
    fn test_not_found_message() {
        let err = AppError::not_found("Category 42");
        assert_eq!(err.code, ErrorCode::NotFound);
        assert_eq!(err.message, "Category 42 not found");
        assert!(err.is_not_found());
    }
}
