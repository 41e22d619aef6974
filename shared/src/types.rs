//! Common types for the shared crate

/// Timestamp type (Unix milliseconds)
pub type Timestamp = i64;

/// Id of the acting user recorded in audit columns
pub type ActorId = i64;
