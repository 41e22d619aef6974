//! Tag Model

use super::audit::AuditMetadata;
use super::status::RecordStatus;
use crate::request::PageRequest;
use serde::{Deserialize, Serialize};

/// Tag entity (flat half of the taxonomy)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tag {
    pub id: i64,
    pub name: String,
    pub status: RecordStatus,
    #[serde(flatten)]
    pub audit: AuditMetadata,
}

/// Create tag payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TagCreate {
    pub name: String,
}

/// Tag list filter
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TagSearch {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub include_deleted: bool,
    #[serde(flatten)]
    pub page: PageRequest,
}
