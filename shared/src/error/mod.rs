//! Unified error system
//!
//! - [`ErrorCode`]: closed taxonomy of machine-readable codes
//! - [`AppError`]: error carrying a code and a human-readable message
//! - [`Envelope`]: the `{ success, data | error }` wire shape every operation
//!   result is rendered into
//!
//! Business-rule violations travel as `Err(AppError)` through every layer
//! unchanged. Only store failures are downgraded to
//! [`ErrorCode::InternalServerError`], at the repository boundary.
//!
//! # Example
//!
//! ```
//! use shared::error::{AppError, Envelope, ErrorCode};
//!
//! let err = AppError::not_found("Category 7");
//! assert_eq!(err.code, ErrorCode::NotFound);
//!
//! let envelope: Envelope<()> = Envelope::from(Err::<(), _>(err));
//! assert!(!envelope.success);
//! ```

mod codes;
mod envelope;
mod types;

pub use codes::{ErrorCode, InvalidErrorCode};
pub use envelope::{Envelope, ErrorBody};
pub use types::{AppError, AppResult};
