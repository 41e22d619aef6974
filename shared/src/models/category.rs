//! Category Model

use super::audit::AuditMetadata;
use super::serde_helpers;
use super::status::RecordStatus;
use crate::request::PageRequest;
use serde::{Deserialize, Serialize};

/// Deepest level a category may sit at (root = 0)
pub const MAX_CATEGORY_LEVEL: i32 = 3;

/// Category entity
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    pub id: i64,
    pub name: String,
    pub parent_id: Option<i64>,
    /// Number of ancestor hops to the root (0..=3)
    pub level: i32,
    pub sort_order: i32,
    pub status: RecordStatus,
    #[serde(flatten)]
    pub audit: AuditMetadata,
}

impl Category {
    /// Whether a child may be attached below this category
    pub fn can_have_children(&self) -> bool {
        self.level < MAX_CATEGORY_LEVEL
    }
}

/// Create category payload
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryCreate {
    pub name: String,
    #[serde(default)]
    pub parent_id: Option<i64>,
    #[serde(default)]
    pub sort_order: Option<i32>,
}

/// Update category payload
///
/// `parent_id`: absent keeps the parent, `null` moves the category to the
/// root, a value re-parents it.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(
        default,
        deserialize_with = "serde_helpers::double_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub parent_id: Option<Option<i64>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sort_order: Option<i32>,
}

/// Category list filter
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategorySearch {
    /// Substring match on name
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub parent_id: Option<i64>,
    #[serde(default)]
    pub level: Option<i32>,
    /// 是否包含已删除 (软删除) 的记录
    #[serde(default)]
    pub include_deleted: bool,
    #[serde(flatten)]
    pub page: PageRequest,
}

/// Category with its active children, for tree-shaped reads
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryNode {
    #[serde(flatten)]
    pub category: Category,
    pub children: Vec<CategoryNode>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_update_parent_id_absent_vs_null() {
        let keep: CategoryUpdate = serde_json::from_str(r#"{"name": "JS"}"#).unwrap();
        assert_eq!(keep.parent_id, None);

        let root: CategoryUpdate = serde_json::from_str(r#"{"parentId": null}"#).unwrap();
        assert_eq!(root.parent_id, Some(None));

        let moved: CategoryUpdate = serde_json::from_str(r#"{"parentId": 4}"#).unwrap();
        assert_eq!(moved.parent_id, Some(Some(4)));
    }

    #[test]
    fn test_search_flattens_paging() {
        let search: CategorySearch =
            serde_json::from_str(r#"{"name": "te", "page": 2, "startRow": 0, "endRow": 5}"#)
                .unwrap();
        assert_eq!(search.name.as_deref(), Some("te"));
        assert_eq!(search.page, PageRequest::page(2, 5));
        assert!(!search.include_deleted);
    }
}
