//! Response shapes for list reads and bulk writes

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// One page of a windowed list query
///
/// `total_cnt` counts the whole filtered set, independent of limit/offset,
/// including for pages past the end. It is 0 only when the set is empty.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total_cnt: i64,
    pub limit: u32,
    pub offset: u32,
}

impl<T> Page<T> {
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            total_cnt: self.total_cnt,
            limit: self.limit,
            offset: self.offset,
        }
    }
}

/// A list item tagged with its window-computed ordinal
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Numbered<T> {
    /// 1-based position under the query's ORDER BY
    pub row_no: i64,
    #[serde(flatten)]
    pub item: T,
}

/// Outcome summary of a bulk operation
///
/// Always computed by diffing the requested ids against the ids the store
/// confirmed as affected, never by assuming success.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MultiResult {
    pub success_count: usize,
    pub failure_count: usize,
    pub failed_id_list: Vec<i64>,
    pub affected_id_list: Vec<i64>,
}

impl MultiResult {
    /// Diff `requested` against `affected`.
    ///
    /// Duplicates in `requested` count once; affected ids that were never
    /// requested are ignored. Both lists come out in request order.
    pub fn reconcile(requested: &[i64], affected: &[i64]) -> Self {
        let affected: BTreeSet<i64> = affected.iter().copied().collect();
        let mut seen = BTreeSet::new();
        let mut result = Self::default();
        for id in requested {
            if !seen.insert(*id) {
                continue;
            }
            if affected.contains(id) {
                result.affected_id_list.push(*id);
            } else {
                result.failed_id_list.push(*id);
            }
        }
        result.success_count = result.affected_id_list.len();
        result.failure_count = result.failed_id_list.len();
        result
    }

    pub fn all_succeeded(&self) -> bool {
        self.failure_count == 0
    }
}
