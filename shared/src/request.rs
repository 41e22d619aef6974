//! Request types shared by list queries

use serde::{Deserialize, Serialize};

/// Paging fields accepted by every list query
///
/// Either a 1-based `page` (page size derived from `end_row - start_row` when
/// both are given) or an explicit `start_row`/`end_row` window. All fields are
/// optional; the window helper falls back to safe defaults.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_row: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_row: Option<u32>,
}

impl PageRequest {
    /// Page `page` with `size` rows per page
    pub fn page(page: u32, size: u32) -> Self {
        Self {
            page: Some(page),
            start_row: Some(0),
            end_row: Some(size),
        }
    }

    /// Explicit row window `[start_row, end_row)`
    pub fn rows(start_row: u32, end_row: u32) -> Self {
        Self {
            page: None,
            start_row: Some(start_row),
            end_row: Some(end_row),
        }
    }
}
