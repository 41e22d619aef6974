//! Subscription Mapping Repository
//!
//! `category_subscription` and `tag_subscription` have the same shape, so every
//! function here is generic over a [`SubscriptionTarget`] that names the two
//! tables involved.

use super::{AuditColumns, RepoError, RepoResult, StatusColumns, WindowColumns};
use crate::pagination::{self, Window};
use shared::models::{AuditStamp, MappingSearch, RecordStatus, SubscriptionMapping, TargetKind};
use shared::{Numbered, Page};
use sqlx::{QueryBuilder, Sqlite, SqliteConnection};

/// A kind of thing a subscription profile can be linked to
pub trait SubscriptionTarget: Send + Sync + 'static {
    const KIND: TargetKind;
    /// Join table holding `(subscription_id, target_id)` rows
    const MAPPING_TABLE: &'static str;
    /// Table the `target_id` column references
    const TARGET_TABLE: &'static str;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct CategoryTarget;

impl SubscriptionTarget for CategoryTarget {
    const KIND: TargetKind = TargetKind::Category;
    const MAPPING_TABLE: &'static str = "category_subscription";
    const TARGET_TABLE: &'static str = "category";
}

#[derive(Debug, Clone, Copy, Default)]
pub struct TagTarget;

impl SubscriptionTarget for TagTarget {
    const KIND: TargetKind = TargetKind::Tag;
    const MAPPING_TABLE: &'static str = "tag_subscription";
    const TARGET_TABLE: &'static str = "tag";
}

const COLUMNS: &str = "id, subscription_id, target_id, use_flag, delete_flag, creator_id, created_at, updater_id, updated_at, deleter_id, deleted_at";

#[derive(Debug, sqlx::FromRow)]
struct MappingRecord {
    id: i64,
    subscription_id: i64,
    target_id: i64,
    #[sqlx(flatten)]
    status: StatusColumns,
    #[sqlx(flatten)]
    audit: AuditColumns,
}

impl MappingRecord {
    fn into_mapping(self, target_kind: TargetKind) -> RepoResult<SubscriptionMapping> {
        Ok(SubscriptionMapping {
            status: self.status.decode()?,
            id: self.id,
            target_kind,
            subscription_id: self.subscription_id,
            target_id: self.target_id,
            audit: self.audit.into(),
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
struct WindowedMappingRecord {
    #[sqlx(flatten)]
    record: MappingRecord,
    #[sqlx(flatten)]
    window: WindowColumns,
}

fn push_id_list(qb: &mut QueryBuilder<'_, Sqlite>, ids: &[i64]) {
    qb.push("(");
    let mut separated = qb.separated(", ");
    for id in ids {
        separated.push_bind(*id);
    }
    separated.push_unseparated(")");
}

pub async fn find_by_id<K: SubscriptionTarget>(
    conn: &mut SqliteConnection,
    id: i64,
) -> RepoResult<Option<SubscriptionMapping>> {
    let sql = format!("SELECT {COLUMNS} FROM {} WHERE id = ?", K::MAPPING_TABLE);
    let row = sqlx::query_as::<_, MappingRecord>(&sql)
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?;
    row.map(|r| r.into_mapping(K::KIND)).transpose()
}

/// The row for a `(subscription, target)` pair, whatever its status
pub async fn find_pair<K: SubscriptionTarget>(
    conn: &mut SqliteConnection,
    subscription_id: i64,
    target_id: i64,
) -> RepoResult<Option<SubscriptionMapping>> {
    let sql = format!(
        "SELECT {COLUMNS} FROM {} WHERE subscription_id = ? AND target_id = ?",
        K::MAPPING_TABLE
    );
    let row = sqlx::query_as::<_, MappingRecord>(&sql)
        .bind(subscription_id)
        .bind(target_id)
        .fetch_optional(&mut *conn)
        .await?;
    row.map(|r| r.into_mapping(K::KIND)).transpose()
}

/// `(target_id, status)` of every existing row among `target_ids`
pub async fn find_pairs<K: SubscriptionTarget>(
    conn: &mut SqliteConnection,
    subscription_id: i64,
    target_ids: &[i64],
) -> RepoResult<Vec<(i64, RecordStatus)>> {
    if target_ids.is_empty() {
        return Ok(Vec::new());
    }
    let mut qb = QueryBuilder::<Sqlite>::new(format!(
        "SELECT {COLUMNS} FROM {} WHERE subscription_id = ",
        K::MAPPING_TABLE
    ));
    qb.push_bind(subscription_id).push(" AND target_id IN ");
    push_id_list(&mut qb, target_ids);

    let rows = qb
        .build_query_as::<MappingRecord>()
        .fetch_all(&mut *conn)
        .await?;
    rows.into_iter()
        .map(|r| Ok((r.target_id, r.status.decode()?)))
        .collect()
}

/// Which of `target_ids` exist and are not deleted in the target table
pub async fn active_targets_among<K: SubscriptionTarget>(
    conn: &mut SqliteConnection,
    target_ids: &[i64],
) -> RepoResult<Vec<i64>> {
    if target_ids.is_empty() {
        return Ok(Vec::new());
    }
    let mut qb = QueryBuilder::<Sqlite>::new(format!(
        "SELECT id FROM {} WHERE delete_flag = 'N' AND id IN ",
        K::TARGET_TABLE
    ));
    push_id_list(&mut qb, target_ids);
    let ids = qb
        .build_query_scalar::<i64>()
        .fetch_all(&mut *conn)
        .await?;
    Ok(ids)
}

/// Insert-or-reactivate every `(subscription_id, target_id)` pair in one
/// statement.
///
/// Existing rows keep their primary key: they are flipped back to active,
/// restamped with the updater and their deleter is cleared. `target_ids`
/// must be distinct. Returns `(mapping_id, target_id)` for every row written.
pub async fn upsert_many<K: SubscriptionTarget>(
    conn: &mut SqliteConnection,
    subscription_id: i64,
    target_ids: &[i64],
    stamp: AuditStamp,
) -> RepoResult<Vec<(i64, i64)>> {
    if target_ids.is_empty() {
        return Ok(Vec::new());
    }
    let mut qb = QueryBuilder::<Sqlite>::new(format!(
        "INSERT INTO {} (subscription_id, target_id, use_flag, delete_flag, creator_id, created_at, updater_id, updated_at) ",
        K::MAPPING_TABLE
    ));
    qb.push_values(target_ids, |mut b, target_id| {
        b.push_bind(subscription_id)
            .push_bind(*target_id)
            .push("'Y'")
            .push("'N'")
            .push_bind(stamp.actor_id)
            .push_bind(stamp.at)
            .push_bind(stamp.actor_id)
            .push_bind(stamp.at);
    });
    qb.push(
        " ON CONFLICT (subscription_id, target_id) DO UPDATE SET \
         use_flag = 'Y', delete_flag = 'N', \
         updater_id = excluded.updater_id, updated_at = excluded.updated_at, \
         deleter_id = NULL, deleted_at = NULL \
         RETURNING id, target_id",
    );
    let rows = qb
        .build_query_as::<(i64, i64)>()
        .fetch_all(&mut *conn)
        .await?;
    Ok(rows)
}

/// Apply a status change to the listed mapping rows.
///
/// `Deleted` stamps the deleter unless the row already carries one, `Active`
/// clears it, `None` only restamps the updater. With `subscription_id` set,
/// rows of other profiles are left alone. `Active` skips rows whose target is
/// deleted. Returns the ids written.
pub async fn set_status_many<K: SubscriptionTarget>(
    conn: &mut SqliteConnection,
    subscription_id: Option<i64>,
    ids: &[i64],
    status: Option<RecordStatus>,
    stamp: AuditStamp,
) -> RepoResult<Vec<i64>> {
    if ids.is_empty() {
        return Ok(Vec::new());
    }
    let mut qb = QueryBuilder::<Sqlite>::new(format!("UPDATE {} SET ", K::MAPPING_TABLE));
    match status {
        Some(RecordStatus::Active) => {
            qb.push("use_flag = 'Y', delete_flag = 'N', deleter_id = NULL, deleted_at = NULL, ");
        }
        Some(RecordStatus::Deleted) => {
            qb.push("use_flag = 'N', delete_flag = 'Y', deleter_id = COALESCE(deleter_id, ")
                .push_bind(stamp.actor_id)
                .push("), deleted_at = COALESCE(deleted_at, ")
                .push_bind(stamp.at)
                .push("), ");
        }
        None => {}
    }
    qb.push("updater_id = ")
        .push_bind(stamp.actor_id)
        .push(", updated_at = ")
        .push_bind(stamp.at)
        .push(" WHERE id IN ");
    push_id_list(&mut qb, ids);
    if let Some(subscription_id) = subscription_id {
        qb.push(" AND subscription_id = ").push_bind(subscription_id);
    }
    if status == Some(RecordStatus::Active) {
        qb.push(format!(
            " AND target_id IN (SELECT id FROM {} WHERE delete_flag = 'N')",
            K::TARGET_TABLE
        ));
    }
    qb.push(" RETURNING id");

    let affected = qb
        .build_query_scalar::<i64>()
        .fetch_all(&mut *conn)
        .await?;
    Ok(affected)
}

/// Soft delete the listed rows that are still active; returns the ids flipped
pub async fn soft_delete_many<K: SubscriptionTarget>(
    conn: &mut SqliteConnection,
    ids: &[i64],
    stamp: AuditStamp,
) -> RepoResult<Vec<i64>> {
    if ids.is_empty() {
        return Ok(Vec::new());
    }
    let mut qb = QueryBuilder::<Sqlite>::new(format!(
        "UPDATE {} SET use_flag = 'N', delete_flag = 'Y', updater_id = ",
        K::MAPPING_TABLE
    ));
    qb.push_bind(stamp.actor_id)
        .push(", updated_at = ")
        .push_bind(stamp.at)
        .push(", deleter_id = ")
        .push_bind(stamp.actor_id)
        .push(", deleted_at = ")
        .push_bind(stamp.at)
        .push(" WHERE delete_flag = 'N' AND id IN ");
    push_id_list(&mut qb, ids);
    qb.push(" RETURNING id");

    let affected = qb
        .build_query_scalar::<i64>()
        .fetch_all(&mut *conn)
        .await?;
    Ok(affected)
}

/// Windowed mappings of one profile, oldest first
pub async fn list<K: SubscriptionTarget>(
    conn: &mut SqliteConnection,
    subscription_id: i64,
    search: &MappingSearch,
    window: Window,
) -> RepoResult<Page<Numbered<SubscriptionMapping>>> {
    let mut qb = QueryBuilder::<Sqlite>::new(format!(
        "SELECT {COLUMNS}, {} FROM {} WHERE subscription_id = ",
        pagination::window_columns("id"),
        K::MAPPING_TABLE
    ));
    qb.push_bind(subscription_id);
    if !search.include_deleted {
        qb.push(" AND delete_flag = 'N'");
    }
    qb.push(" ORDER BY id LIMIT ")
        .push_bind(window.limit_i64())
        .push(" OFFSET ")
        .push_bind(window.offset_i64());

    let rows = qb
        .build_query_as::<WindowedMappingRecord>()
        .fetch_all(&mut *conn)
        .await?;
    let rows = rows
        .into_iter()
        .map(|r| {
            let mapping = r.record.into_mapping(K::KIND)?;
            Ok((r.window.row_no, r.window.total_cnt, mapping))
        })
        .collect::<RepoResult<Vec<_>>>()?;

    let mut page = pagination::collect_page(rows, window);
    if pagination::needs_total_recount(&page) {
        let mut qb = QueryBuilder::<Sqlite>::new(format!(
            "SELECT COUNT(*) FROM {} WHERE subscription_id = ",
            K::MAPPING_TABLE
        ));
        qb.push_bind(subscription_id);
        if !search.include_deleted {
            qb.push(" AND delete_flag = 'N'");
        }
        page.total_cnt = qb.build_query_scalar::<i64>().fetch_one(&mut *conn).await?;
    }
    Ok(page)
}

/// Target ids of a profile's active mappings, ascending
pub async fn active_target_ids<K: SubscriptionTarget>(
    conn: &mut SqliteConnection,
    subscription_id: i64,
) -> RepoResult<Vec<i64>> {
    let sql = format!(
        "SELECT target_id FROM {} WHERE subscription_id = ? AND delete_flag = 'N' ORDER BY target_id",
        K::MAPPING_TABLE
    );
    let ids = sqlx::query_scalar::<_, i64>(&sql)
        .bind(subscription_id)
        .fetch_all(&mut *conn)
        .await?;
    Ok(ids)
}

/// Load a mapping or fail with `NotFound`
pub async fn get_existing<K: SubscriptionTarget>(
    conn: &mut SqliteConnection,
    id: i64,
) -> RepoResult<SubscriptionMapping> {
    find_by_id::<K>(conn, id)
        .await?
        .ok_or_else(|| RepoError::NotFound(format!("{} subscription {id}", K::KIND)))
}
