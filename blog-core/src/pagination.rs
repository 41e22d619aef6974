//! Pagination window helper
//!
//! Turns a [`PageRequest`] into a `LIMIT`/`OFFSET` pair and assembles list
//! rows into a [`Page`]. List queries select [`window_columns`] so one round
//! trip returns each row's ordinal and the size of the whole filtered set.
//! A second `COUNT(*)` runs only when a page past the end comes back empty.

use shared::{Numbered, Page, PageRequest};

/// 默认每页数量
pub const DEFAULT_PAGE_SIZE: u32 = 10;
/// 每页数量上限
pub const MAX_PAGE_SIZE: u32 = 100;

/// Page size bounds, usually taken from config
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageLimits {
    pub default_size: u32,
    pub max_size: u32,
}

impl Default for PageLimits {
    fn default() -> Self {
        Self {
            default_size: DEFAULT_PAGE_SIZE,
            max_size: MAX_PAGE_SIZE,
        }
    }
}

/// Resolved `LIMIT` / `OFFSET`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Window {
    pub limit: u32,
    pub offset: u32,
}

impl Window {
    /// Resolve paging fields.
    ///
    /// - `page` given: the page size is `end_row - start_row` (missing
    ///   `start_row` counts as 0) or the default, `offset = (page - 1) * limit`;
    ///   page 0 is treated as page 1.
    /// - rows only: `offset = start_row`, `limit = end_row - start_row`.
    /// - nothing: default limit at offset 0.
    ///
    /// An empty or inverted row span falls back to the default size, and the
    /// limit is always clamped to `1..=max_size`.
    pub fn resolve(req: &PageRequest, limits: PageLimits) -> Self {
        let start = req.start_row.unwrap_or(0);
        let span = match req.end_row {
            Some(end) if end > start => Some(end - start),
            _ => None,
        };
        let max_size = limits.max_size.max(1);
        let limit = span.unwrap_or(limits.default_size).clamp(1, max_size);

        let offset = match req.page {
            Some(page) => page.saturating_sub(1).saturating_mul(limit),
            None => start,
        };

        Self { limit, offset }
    }

    pub fn limit_i64(&self) -> i64 {
        i64::from(self.limit)
    }

    pub fn offset_i64(&self) -> i64 {
        i64::from(self.offset)
    }
}

/// `row_no` / `total_cnt` select items for a list query.
///
/// `order_by` must be the same ordering the outer query uses so `row_no`
/// matches the returned order.
pub fn window_columns(order_by: &str) -> String {
    format!("ROW_NUMBER() OVER (ORDER BY {order_by}) AS row_no, COUNT(*) OVER () AS total_cnt")
}

/// Assemble `(row_no, total_cnt, item)` rows into a page.
///
/// `total_cnt` is constant across rows. An empty result reports 0 until the
/// caller recounts it (see [`needs_total_recount`]).
pub fn collect_page<T>(rows: Vec<(i64, i64, T)>, window: Window) -> Page<Numbered<T>> {
    let total_cnt = rows.first().map(|(_, total, _)| *total).unwrap_or(0);
    Page {
        items: rows
            .into_iter()
            .map(|(row_no, _, item)| Numbered { row_no, item })
            .collect(),
        total_cnt,
        limit: window.limit,
        offset: window.offset,
    }
}

/// True when an empty page sits past the first row, so the window columns
/// could not report the size of the filtered set.
pub fn needs_total_recount<T>(page: &Page<T>) -> bool {
    page.is_empty() && page.offset > 0
}
