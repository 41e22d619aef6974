//! Error codes
//!
//! Closed set of four outcome codes.
//! Codes serialize as their SCREAMING_SNAKE_CASE names (`"NOT_FOUND"`, ...).

use http::StatusCode;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Machine-readable error code
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// Referenced category / parent / tag / subscription / mapping is absent
    NotFound,
    /// Duplicate name or duplicate active subscription
    Conflict,
    /// Depth exceeded, self-parenting, cycles, malformed bulk id lists
    BadRequest,
    /// Store failure or an unexpected missing row
    InternalServerError,
}

impl ErrorCode {
    /// Wire name of the code
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NotFound => "NOT_FOUND",
            Self::Conflict => "CONFLICT",
            Self::BadRequest => "BAD_REQUEST",
            Self::InternalServerError => "INTERNAL_SERVER_ERROR",
        }
    }

    /// Default message used when no specific message is supplied
    pub fn message(&self) -> &'static str {
        match self {
            Self::NotFound => "Resource not found",
            Self::Conflict => "Resource already exists",
            Self::BadRequest => "Bad request",
            Self::InternalServerError => "Internal server error",
        }
    }

    /// HTTP status an API layer should answer with
    pub fn http_status(&self) -> StatusCode {
        match self {
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::Conflict => StatusCode::CONFLICT,
            Self::BadRequest => StatusCode::BAD_REQUEST,
            Self::InternalServerError => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned when parsing an unknown code name
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid error code: {0}")]
pub struct InvalidErrorCode(pub String);

impl FromStr for ErrorCode {
    type Err = InvalidErrorCode;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "NOT_FOUND" => Ok(Self::NotFound),
            "CONFLICT" => Ok(Self::Conflict),
            "BAD_REQUEST" => Ok(Self::BadRequest),
            "INTERNAL_SERVER_ERROR" => Ok(Self::InternalServerError),
            other => Err(InvalidErrorCode(other.to_string())),
        }
    }
}
