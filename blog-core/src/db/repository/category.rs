//! Category Repository

use super::{AuditColumns, RepoError, RepoResult, StatusColumns, WindowColumns};
use crate::pagination::{self, Window};
use shared::models::{AuditStamp, Category, CategorySearch};
use shared::{Numbered, Page};
use sqlx::{QueryBuilder, Sqlite, SqliteConnection};

const COLUMNS: &str = "id, name, parent_id, level, sort_order, use_flag, delete_flag, creator_id, created_at, updater_id, updated_at, deleter_id, deleted_at";

/// List ordering: roots first, then by sort order
const LIST_ORDER: &str = "level, sort_order, id";

/// Upper bound on ancestor hops followed by [`ancestor_ids`]. Far above the
/// depth limit; only reached if the table already holds a cycle.
const MAX_ANCESTOR_HOPS: i64 = 64;

#[derive(Debug, sqlx::FromRow)]
struct CategoryRecord {
    id: i64,
    name: String,
    parent_id: Option<i64>,
    level: i32,
    sort_order: i32,
    #[sqlx(flatten)]
    status: StatusColumns,
    #[sqlx(flatten)]
    audit: AuditColumns,
}

impl TryFrom<CategoryRecord> for Category {
    type Error = RepoError;

    fn try_from(r: CategoryRecord) -> RepoResult<Self> {
        Ok(Category {
            status: r.status.decode()?,
            id: r.id,
            name: r.name,
            parent_id: r.parent_id,
            level: r.level,
            sort_order: r.sort_order,
            audit: r.audit.into(),
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
struct WindowedCategoryRecord {
    #[sqlx(flatten)]
    record: CategoryRecord,
    #[sqlx(flatten)]
    window: WindowColumns,
}

/// Column values written by [`insert`] and [`update`]
#[derive(Debug, Clone, Copy)]
pub struct CategoryValues<'a> {
    pub name: &'a str,
    pub parent_id: Option<i64>,
    pub level: i32,
    pub sort_order: i32,
}

pub async fn find_by_id(conn: &mut SqliteConnection, id: i64) -> RepoResult<Option<Category>> {
    let sql = format!("SELECT {COLUMNS} FROM category WHERE id = ?");
    let row = sqlx::query_as::<_, CategoryRecord>(&sql)
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?;
    row.map(Category::try_from).transpose()
}

/// Find a non-deleted category by id
pub async fn find_active_by_id(
    conn: &mut SqliteConnection,
    id: i64,
) -> RepoResult<Option<Category>> {
    let sql = format!("SELECT {COLUMNS} FROM category WHERE id = ? AND delete_flag = 'N'");
    let row = sqlx::query_as::<_, CategoryRecord>(&sql)
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?;
    row.map(Category::try_from).transpose()
}

/// Find a non-deleted category by exact name, optionally ignoring one id
pub async fn find_active_by_name(
    conn: &mut SqliteConnection,
    name: &str,
    exclude_id: Option<i64>,
) -> RepoResult<Option<Category>> {
    let sql = format!(
        "SELECT {COLUMNS} FROM category WHERE name = ?1 AND delete_flag = 'N' AND (?2 IS NULL OR id <> ?2) LIMIT 1"
    );
    let row = sqlx::query_as::<_, CategoryRecord>(&sql)
        .bind(name)
        .bind(exclude_id)
        .fetch_optional(&mut *conn)
        .await?;
    row.map(Category::try_from).transpose()
}

/// All non-deleted categories ordered for tree assembly
pub async fn find_all_active(conn: &mut SqliteConnection) -> RepoResult<Vec<Category>> {
    let sql = format!(
        "SELECT {COLUMNS} FROM category WHERE delete_flag = 'N' ORDER BY sort_order, id"
    );
    let rows = sqlx::query_as::<_, CategoryRecord>(&sql)
        .fetch_all(&mut *conn)
        .await?;
    rows.into_iter().map(Category::try_from).collect()
}

pub async fn insert(
    conn: &mut SqliteConnection,
    values: CategoryValues<'_>,
    stamp: AuditStamp,
) -> RepoResult<i64> {
    let id = sqlx::query_scalar::<_, i64>(
        "INSERT INTO category (name, parent_id, level, sort_order, use_flag, delete_flag, creator_id, created_at, updater_id, updated_at) VALUES (?1, ?2, ?3, ?4, 'Y', 'N', ?5, ?6, ?5, ?6) RETURNING id",
    )
    .bind(values.name)
    .bind(values.parent_id)
    .bind(values.level)
    .bind(values.sort_order)
    .bind(stamp.actor_id)
    .bind(stamp.at)
    .fetch_one(&mut *conn)
    .await?;
    Ok(id)
}

/// Overwrite the mutable columns of a non-deleted category
pub async fn update(
    conn: &mut SqliteConnection,
    id: i64,
    values: CategoryValues<'_>,
    stamp: AuditStamp,
) -> RepoResult<()> {
    let rows = sqlx::query(
        "UPDATE category SET name = ?1, parent_id = ?2, level = ?3, sort_order = ?4, updater_id = ?5, updated_at = ?6 WHERE id = ?7 AND delete_flag = 'N'",
    )
    .bind(values.name)
    .bind(values.parent_id)
    .bind(values.level)
    .bind(values.sort_order)
    .bind(stamp.actor_id)
    .bind(stamp.at)
    .bind(id)
    .execute(&mut *conn)
    .await?;
    if rows.rows_affected() == 0 {
        return Err(RepoError::NotFound(format!("Category {id}")));
    }
    Ok(())
}

/// Ids on the path from `id` up to its root, starting with `id` itself.
///
/// Follows `parent_id` regardless of delete flags.
pub async fn ancestor_ids(conn: &mut SqliteConnection, id: i64) -> RepoResult<Vec<i64>> {
    let ids = sqlx::query_scalar::<_, i64>(
        r#"
        WITH RECURSIVE ancestors(id, parent_id, depth) AS (
            SELECT id, parent_id, 0 FROM category WHERE id = ?1
            UNION ALL
            SELECT c.id, c.parent_id, a.depth + 1
            FROM category c JOIN ancestors a ON c.id = a.parent_id
            WHERE a.depth < ?2
        )
        SELECT id FROM ancestors ORDER BY depth
        "#,
    )
    .bind(id)
    .bind(MAX_ANCESTOR_HOPS)
    .fetch_all(&mut *conn)
    .await?;
    Ok(ids)
}

/// `(id, level)` of every non-deleted descendant of `id` (not `id` itself)
pub async fn active_descendants(
    conn: &mut SqliteConnection,
    id: i64,
) -> RepoResult<Vec<(i64, i32)>> {
    let rows = sqlx::query_as::<_, (i64, i32)>(
        r#"
        WITH RECURSIVE subtree(id, level) AS (
            SELECT id, level FROM category WHERE id = ?1
            UNION
            SELECT c.id, c.level
            FROM category c JOIN subtree s ON c.parent_id = s.id
            WHERE c.delete_flag = 'N'
        )
        SELECT id, level FROM subtree WHERE id <> ?1
        "#,
    )
    .bind(id)
    .fetch_all(&mut *conn)
    .await?;
    Ok(rows)
}

/// Add `delta` to the level of every listed category
pub async fn shift_levels(
    conn: &mut SqliteConnection,
    ids: &[i64],
    delta: i32,
    stamp: AuditStamp,
) -> RepoResult<u64> {
    if ids.is_empty() || delta == 0 {
        return Ok(0);
    }
    let mut qb = QueryBuilder::<Sqlite>::new("UPDATE category SET level = level + ");
    qb.push_bind(delta)
        .push(", updater_id = ")
        .push_bind(stamp.actor_id)
        .push(", updated_at = ")
        .push_bind(stamp.at)
        .push(" WHERE id IN (");
    let mut separated = qb.separated(", ");
    for id in ids {
        separated.push_bind(*id);
    }
    separated.push_unseparated(")");
    let rows = qb.build().execute(&mut *conn).await?;
    Ok(rows.rows_affected())
}

/// `(parent_id, id)` of non-deleted children of any of `parent_ids`
pub async fn active_children_of(
    conn: &mut SqliteConnection,
    parent_ids: &[i64],
) -> RepoResult<Vec<(i64, i64)>> {
    if parent_ids.is_empty() {
        return Ok(Vec::new());
    }
    let mut qb = QueryBuilder::<Sqlite>::new(
        "SELECT parent_id, id FROM category WHERE delete_flag = 'N' AND parent_id IN (",
    );
    let mut separated = qb.separated(", ");
    for id in parent_ids {
        separated.push_bind(*id);
    }
    separated.push_unseparated(")");
    let rows = qb
        .build_query_as::<(i64, i64)>()
        .fetch_all(&mut *conn)
        .await?;
    Ok(rows)
}

/// Soft delete every listed non-deleted category in one statement.
///
/// Returns the ids the store actually flipped.
pub async fn soft_delete_many(
    conn: &mut SqliteConnection,
    ids: &[i64],
    stamp: AuditStamp,
) -> RepoResult<Vec<i64>> {
    if ids.is_empty() {
        return Ok(Vec::new());
    }
    let mut qb = QueryBuilder::<Sqlite>::new(
        "UPDATE category SET use_flag = 'N', delete_flag = 'Y', updater_id = ",
    );
    qb.push_bind(stamp.actor_id)
        .push(", updated_at = ")
        .push_bind(stamp.at)
        .push(", deleter_id = ")
        .push_bind(stamp.actor_id)
        .push(", deleted_at = ")
        .push_bind(stamp.at)
        .push(" WHERE delete_flag = 'N' AND id IN (");
    let mut separated = qb.separated(", ");
    for id in ids {
        separated.push_bind(*id);
    }
    separated.push_unseparated(") RETURNING id");
    let affected = qb
        .build_query_scalar::<i64>()
        .fetch_all(&mut *conn)
        .await?;
    Ok(affected)
}

/// Filtered, windowed category list
pub async fn list(
    conn: &mut SqliteConnection,
    search: &CategorySearch,
    window: Window,
) -> RepoResult<Page<Numbered<Category>>> {
    let mut qb = QueryBuilder::<Sqlite>::new(format!(
        "SELECT {COLUMNS}, {} FROM category WHERE 1 = 1",
        pagination::window_columns(LIST_ORDER)
    ));
    push_search_filter(&mut qb, search);
    qb.push(format!(" ORDER BY {LIST_ORDER} LIMIT "))
        .push_bind(window.limit_i64())
        .push(" OFFSET ")
        .push_bind(window.offset_i64());

    let rows = qb
        .build_query_as::<WindowedCategoryRecord>()
        .fetch_all(&mut *conn)
        .await?;
    let rows = rows
        .into_iter()
        .map(|r| {
            let category = Category::try_from(r.record)?;
            Ok((r.window.row_no, r.window.total_cnt, category))
        })
        .collect::<RepoResult<Vec<_>>>()?;

    let mut page = pagination::collect_page(rows, window);
    if pagination::needs_total_recount(&page) {
        let mut qb = QueryBuilder::<Sqlite>::new("SELECT COUNT(*) FROM category WHERE 1 = 1");
        push_search_filter(&mut qb, search);
        page.total_cnt = qb.build_query_scalar::<i64>().fetch_one(&mut *conn).await?;
    }
    Ok(page)
}

fn push_search_filter(qb: &mut QueryBuilder<'_, Sqlite>, search: &CategorySearch) {
    if !search.include_deleted {
        qb.push(" AND delete_flag = 'N'");
    }
    if let Some(name) = search.name.as_deref().filter(|n| !n.is_empty()) {
        qb.push(" AND instr(name, ").push_bind(name.to_string()).push(") > 0");
    }
    if let Some(parent_id) = search.parent_id {
        qb.push(" AND parent_id = ").push_bind(parent_id);
    }
    if let Some(level) = search.level {
        qb.push(" AND level = ").push_bind(level);
    }
}
