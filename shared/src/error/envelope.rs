//! Result envelope
//!
//! ```json
//! { "success": true,  "data": { ... } }
//! { "success": false, "error": { "code": "NOT_FOUND", "message": "..." } }
//! ```

use super::codes::ErrorCode;
use super::types::{AppError, AppResult};
use serde::{Deserialize, Serialize};

/// Error part of a failed envelope
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub code: ErrorCode,
    pub message: String,
}

/// Two-shaped operation outcome rendered for callers
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Envelope<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorBody>,
}

impl<T> Envelope<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn err(err: AppError) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(ErrorBody {
                code: err.code,
                message: err.message,
            }),
        }
    }

    /// Convert back into a `Result`, e.g. on the client side of the wire.
    ///
    /// A success envelope without data, or a failure without an error body,
    /// is reported as `INTERNAL_SERVER_ERROR`.
    pub fn into_result(self) -> AppResult<T> {
        match (self.success, self.data, self.error) {
            (true, Some(data), _) => Ok(data),
            (false, _, Some(body)) => Err(AppError::with_message(body.code, body.message)),
            _ => Err(AppError::internal("Malformed envelope")),
        }
    }
}

impl<T> From<AppResult<T>> for Envelope<T> {
    fn from(result: AppResult<T>) -> Self {
        match result {
            Ok(data) => Self::ok(data),
            Err(err) => Self::err(err),
        }
    }
}
