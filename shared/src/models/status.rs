//! Soft-delete state
//!
//! Persisted as the `use_flag` / `delete_flag` column pair. Only two
//! combinations exist; anything else in the table is corruption.

use serde::{Deserialize, Serialize};
use std::fmt;

pub const FLAG_YES: &str = "Y";
pub const FLAG_NO: &str = "N";

/// Lifecycle of a row
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RecordStatus {
    /// `use_flag = 'Y'`, `delete_flag = 'N'`
    #[default]
    Active,
    /// `use_flag = 'N'`, `delete_flag = 'Y'`
    Deleted,
}

impl RecordStatus {
    /// Decode the column pair. `None` for the two impossible combinations.
    pub fn from_flags(use_flag: &str, delete_flag: &str) -> Option<Self> {
        match (use_flag, delete_flag) {
            (FLAG_YES, FLAG_NO) => Some(Self::Active),
            (FLAG_NO, FLAG_YES) => Some(Self::Deleted),
            _ => None,
        }
    }

    pub fn use_flag(&self) -> &'static str {
        match self {
            Self::Active => FLAG_YES,
            Self::Deleted => FLAG_NO,
        }
    }

    pub fn delete_flag(&self) -> &'static str {
        match self {
            Self::Active => FLAG_NO,
            Self::Deleted => FLAG_YES,
        }
    }

    pub fn is_active(&self) -> bool {
        matches!(self, Self::Active)
    }
}

impl fmt::Display for RecordStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Active => f.write_str("ACTIVE"),
            Self::Deleted => f.write_str("DELETED"),
        }
    }
}
