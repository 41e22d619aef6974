//! Services
//!
//! Business rules over the repositories. Every public operation returns
//! [`AppResult`]; every mutation runs in one transaction.
//!
//! - [`CategoryService`] - bounded-depth category tree
//! - [`TagService`] - flat tag registry
//! - [`SubscriptionService`] - per-user subscription profiles
//! - [`SubscriptionReconciler`] - bulk mapping of profiles to categories / tags

pub mod category;
pub mod reconciler;
pub mod subscription;
pub mod tag;

pub use category::CategoryService;
pub use reconciler::{CategorySubscriptions, SubscriptionReconciler, TagSubscriptions};
pub use subscription::SubscriptionService;
pub use tag::TagService;

use crate::core::{Config, DEFAULT_MAX_BULK_IDS};
use crate::db::repository::RepoError;
use crate::pagination::PageLimits;
use shared::{AppError, AppResult};
use sqlx::{Sqlite, SqlitePool, Transaction};
use std::collections::HashSet;

/// Limits shared by all services
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ServiceSettings {
    pub page_limits: PageLimits,
    /// Longest id list a bulk operation accepts
    pub max_bulk_ids: usize,
}

impl Default for ServiceSettings {
    fn default() -> Self {
        Self {
            page_limits: PageLimits::default(),
            max_bulk_ids: DEFAULT_MAX_BULK_IDS,
        }
    }
}

impl From<&Config> for ServiceSettings {
    fn from(config: &Config) -> Self {
        Self {
            page_limits: config.page_limits(),
            max_bulk_ids: config.max_bulk_ids,
        }
    }
}

impl ServiceSettings {
    /// Validate a bulk id list and drop repeated ids, keeping first-seen order
    pub fn normalize_ids(&self, ids: &[i64]) -> AppResult<Vec<i64>> {
        if ids.is_empty() {
            return Err(AppError::bad_request("Id list must not be empty"));
        }
        if ids.len() > self.max_bulk_ids {
            return Err(AppError::bad_request(format!(
                "Id list too long: {} ids (max {})",
                ids.len(),
                self.max_bulk_ids
            )));
        }
        let mut seen = HashSet::with_capacity(ids.len());
        Ok(ids.iter().copied().filter(|id| seen.insert(*id)).collect())
    }
}

/// Open a write transaction.
///
/// `IMMEDIATE` takes the write lock up front, so concurrent writers wait
/// under `busy_timeout` instead of failing on a stale read snapshot.
pub(crate) async fn begin(pool: &SqlitePool) -> AppResult<Transaction<'static, Sqlite>> {
    pool.begin_with("BEGIN IMMEDIATE")
        .await
        .map_err(|e| RepoError::from(e).into())
}

pub(crate) async fn commit(tx: Transaction<'static, Sqlite>) -> AppResult<()> {
    tx.commit().await.map_err(|e| RepoError::from(e).into())
}

pub(crate) async fn acquire(
    pool: &SqlitePool,
) -> AppResult<sqlx::pool::PoolConnection<Sqlite>> {
    pool.acquire().await.map_err(|e| RepoError::from(e).into())
}

/// Trimmed name, or `BAD_REQUEST` when nothing is left
pub(crate) fn require_name<'a>(noun: &str, name: &'a str) -> AppResult<&'a str> {
    let name = name.trim();
    if name.is_empty() {
        return Err(AppError::bad_request(format!("{noun} name must not be blank")));
    }
    Ok(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::ErrorCode;

    #[test]
    fn test_normalize_ids() {
        let settings = ServiceSettings::default();
        assert_eq!(settings.normalize_ids(&[3, 1, 3, 2, 1]).unwrap(), vec![3, 1, 2]);
        assert_eq!(
            settings.normalize_ids(&[]).unwrap_err().code,
            ErrorCode::BadRequest
        );

        let small = ServiceSettings {
            max_bulk_ids: 2,
            ..Default::default()
        };
        assert_eq!(
            small.normalize_ids(&[1, 2, 3]).unwrap_err().code,
            ErrorCode::BadRequest
        );
    }

    #[test]
    fn test_require_name_trims() {
        assert_eq!(require_name("Tag", "  rust ").unwrap(), "rust");
        assert_eq!(
            require_name("Tag", "   ").unwrap_err().message,
            "Tag name must not be blank"
        );
    }
}
