//! Tag Repository

use super::{AuditColumns, RepoError, RepoResult, StatusColumns, WindowColumns};
use crate::pagination::{self, Window};
use shared::models::{AuditStamp, Tag, TagSearch};
use shared::{Numbered, Page};
use sqlx::{QueryBuilder, Sqlite, SqliteConnection};

const COLUMNS: &str = "id, name, use_flag, delete_flag, creator_id, created_at, updater_id, updated_at, deleter_id, deleted_at";

#[derive(Debug, sqlx::FromRow)]
struct TagRecord {
    id: i64,
    name: String,
    #[sqlx(flatten)]
    status: StatusColumns,
    #[sqlx(flatten)]
    audit: AuditColumns,
}

impl TryFrom<TagRecord> for Tag {
    type Error = RepoError;

    fn try_from(r: TagRecord) -> RepoResult<Self> {
        Ok(Tag {
            status: r.status.decode()?,
            id: r.id,
            name: r.name,
            audit: r.audit.into(),
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
struct WindowedTagRecord {
    #[sqlx(flatten)]
    record: TagRecord,
    #[sqlx(flatten)]
    window: WindowColumns,
}

pub async fn find_by_id(conn: &mut SqliteConnection, id: i64) -> RepoResult<Option<Tag>> {
    let sql = format!("SELECT {COLUMNS} FROM tag WHERE id = ?");
    let row = sqlx::query_as::<_, TagRecord>(&sql)
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?;
    row.map(Tag::try_from).transpose()
}

pub async fn find_active_by_name(
    conn: &mut SqliteConnection,
    name: &str,
) -> RepoResult<Option<Tag>> {
    let sql = format!("SELECT {COLUMNS} FROM tag WHERE name = ? AND delete_flag = 'N' LIMIT 1");
    let row = sqlx::query_as::<_, TagRecord>(&sql)
        .bind(name)
        .fetch_optional(&mut *conn)
        .await?;
    row.map(Tag::try_from).transpose()
}

pub async fn insert(conn: &mut SqliteConnection, name: &str, stamp: AuditStamp) -> RepoResult<i64> {
    let id = sqlx::query_scalar::<_, i64>(
        "INSERT INTO tag (name, use_flag, delete_flag, creator_id, created_at, updater_id, updated_at) VALUES (?1, 'Y', 'N', ?2, ?3, ?2, ?3) RETURNING id",
    )
    .bind(name)
    .bind(stamp.actor_id)
    .bind(stamp.at)
    .fetch_one(&mut *conn)
    .await?;
    Ok(id)
}

/// Soft delete an active tag. `false` when no active row matched.
pub async fn soft_delete(conn: &mut SqliteConnection, id: i64, stamp: AuditStamp) -> RepoResult<bool> {
    let rows = sqlx::query(
        "UPDATE tag SET use_flag = 'N', delete_flag = 'Y', updater_id = ?1, updated_at = ?2, deleter_id = ?1, deleted_at = ?2 WHERE id = ?3 AND delete_flag = 'N'",
    )
    .bind(stamp.actor_id)
    .bind(stamp.at)
    .bind(id)
    .execute(&mut *conn)
    .await?;
    Ok(rows.rows_affected() > 0)
}

pub async fn list(
    conn: &mut SqliteConnection,
    search: &TagSearch,
    window: Window,
) -> RepoResult<Page<Numbered<Tag>>> {
    let mut qb = QueryBuilder::<Sqlite>::new(format!(
        "SELECT {COLUMNS}, {} FROM tag WHERE 1 = 1",
        pagination::window_columns("name, id")
    ));
    push_search_filter(&mut qb, search);
    qb.push(" ORDER BY name, id LIMIT ")
        .push_bind(window.limit_i64())
        .push(" OFFSET ")
        .push_bind(window.offset_i64());

    let rows = qb
        .build_query_as::<WindowedTagRecord>()
        .fetch_all(&mut *conn)
        .await?;
    let rows = rows
        .into_iter()
        .map(|r| Ok((r.window.row_no, r.window.total_cnt, Tag::try_from(r.record)?)))
        .collect::<RepoResult<Vec<_>>>()?;

    let mut page = pagination::collect_page(rows, window);
    if pagination::needs_total_recount(&page) {
        let mut qb = QueryBuilder::<Sqlite>::new("SELECT COUNT(*) FROM tag WHERE 1 = 1");
        push_search_filter(&mut qb, search);
        page.total_cnt = qb.build_query_scalar::<i64>().fetch_one(&mut *conn).await?;
    }
    Ok(page)
}

fn push_search_filter(qb: &mut QueryBuilder<'_, Sqlite>, search: &TagSearch) {
    if !search.include_deleted {
        qb.push(" AND delete_flag = 'N'");
    }
    if let Some(name) = search.name.as_deref().filter(|n| !n.is_empty()) {
        qb.push(" AND instr(name, ").push_bind(name.to_string()).push(") > 0");
    }
}
