//! Subscription Profile Repository

use super::{AuditColumns, RepoError, RepoResult, StatusColumns};
use shared::models::{AuditStamp, Subscription};
use sqlx::SqliteConnection;

const COLUMNS: &str = "id, user_id, email_notification, use_flag, delete_flag, creator_id, created_at, updater_id, updated_at, deleter_id, deleted_at";

#[derive(Debug, sqlx::FromRow)]
struct SubscriptionRecord {
    id: i64,
    user_id: i64,
    email_notification: bool,
    #[sqlx(flatten)]
    status: StatusColumns,
    #[sqlx(flatten)]
    audit: AuditColumns,
}

impl TryFrom<SubscriptionRecord> for Subscription {
    type Error = RepoError;

    fn try_from(r: SubscriptionRecord) -> RepoResult<Self> {
        Ok(Subscription {
            status: r.status.decode()?,
            id: r.id,
            user_id: r.user_id,
            email_notification: r.email_notification,
            audit: r.audit.into(),
        })
    }
}

pub async fn find_by_id(conn: &mut SqliteConnection, id: i64) -> RepoResult<Option<Subscription>> {
    let sql = format!("SELECT {COLUMNS} FROM subscription WHERE id = ?");
    let row = sqlx::query_as::<_, SubscriptionRecord>(&sql)
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?;
    row.map(Subscription::try_from).transpose()
}

pub async fn find_active_by_id(
    conn: &mut SqliteConnection,
    id: i64,
) -> RepoResult<Option<Subscription>> {
    let sql = format!("SELECT {COLUMNS} FROM subscription WHERE id = ? AND delete_flag = 'N'");
    let row = sqlx::query_as::<_, SubscriptionRecord>(&sql)
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?;
    row.map(Subscription::try_from).transpose()
}

pub async fn find_active_by_user(
    conn: &mut SqliteConnection,
    user_id: i64,
) -> RepoResult<Option<Subscription>> {
    let sql = format!("SELECT {COLUMNS} FROM subscription WHERE user_id = ? AND delete_flag = 'N'");
    let row = sqlx::query_as::<_, SubscriptionRecord>(&sql)
        .bind(user_id)
        .fetch_optional(&mut *conn)
        .await?;
    row.map(Subscription::try_from).transpose()
}

/// Create the user's profile, or bring back their deleted one.
///
/// `user_id` is unique, so a deleted profile is revived in place with its
/// original id.
pub async fn insert_or_reactivate(
    conn: &mut SqliteConnection,
    user_id: i64,
    email_notification: bool,
    stamp: AuditStamp,
) -> RepoResult<i64> {
    let id = sqlx::query_scalar::<_, i64>(
        r#"
        INSERT INTO subscription (user_id, email_notification, use_flag, delete_flag, creator_id, created_at, updater_id, updated_at)
        VALUES (?1, ?2, 'Y', 'N', ?3, ?4, ?3, ?4)
        ON CONFLICT (user_id) DO UPDATE SET
            email_notification = excluded.email_notification,
            use_flag = 'Y', delete_flag = 'N',
            updater_id = excluded.updater_id, updated_at = excluded.updated_at,
            deleter_id = NULL, deleted_at = NULL
        RETURNING id
        "#,
    )
    .bind(user_id)
    .bind(email_notification)
    .bind(stamp.actor_id)
    .bind(stamp.at)
    .fetch_one(&mut *conn)
    .await?;
    Ok(id)
}

pub async fn update_email_notification(
    conn: &mut SqliteConnection,
    id: i64,
    email_notification: bool,
    stamp: AuditStamp,
) -> RepoResult<()> {
    let rows = sqlx::query(
        "UPDATE subscription SET email_notification = ?1, updater_id = ?2, updated_at = ?3 WHERE id = ?4 AND delete_flag = 'N'",
    )
    .bind(email_notification)
    .bind(stamp.actor_id)
    .bind(stamp.at)
    .bind(id)
    .execute(&mut *conn)
    .await?;
    if rows.rows_affected() == 0 {
        return Err(RepoError::NotFound(format!("Subscription {id}")));
    }
    Ok(())
}

/// Soft delete an active profile. `false` when no active row matched.
pub async fn soft_delete(conn: &mut SqliteConnection, id: i64, stamp: AuditStamp) -> RepoResult<bool> {
    let rows = sqlx::query(
        "UPDATE subscription SET use_flag = 'N', delete_flag = 'Y', updater_id = ?1, updated_at = ?2, deleter_id = ?1, deleted_at = ?2 WHERE id = ?3 AND delete_flag = 'N'",
    )
    .bind(stamp.actor_id)
    .bind(stamp.at)
    .bind(id)
    .execute(&mut *conn)
    .await?;
    Ok(rows.rows_affected() > 0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::DbService;
    use shared::models::RecordStatus;

    #[tokio::test]
    async fn test_deleted_profile_reactivates_with_same_id() {
        let db = DbService::in_memory().await.unwrap();
        let mut conn = db.pool.acquire().await.unwrap();

        let id = insert_or_reactivate(&mut conn, 42, true, AuditStamp::at(1, 1_000))
            .await
            .unwrap();
        assert!(soft_delete(&mut conn, id, AuditStamp::at(1, 2_000)).await.unwrap());
        assert!(find_active_by_user(&mut conn, 42).await.unwrap().is_none());

        let again = insert_or_reactivate(&mut conn, 42, false, AuditStamp::at(2, 3_000))
            .await
            .unwrap();
        assert_eq!(again, id);

        let profile = find_by_id(&mut conn, id).await.unwrap().unwrap();
        assert_eq!(profile.status, RecordStatus::Active);
        assert!(!profile.email_notification);
        assert_eq!(profile.audit.creator_id, 1);
        assert_eq!(profile.audit.updater_id, 2);
        assert!(profile.audit.deleter_id.is_none());
    }

    #[tokio::test]
    async fn test_update_deleted_profile_is_not_found() {
        let db = DbService::in_memory().await.unwrap();
        let mut conn = db.pool.acquire().await.unwrap();

        let id = insert_or_reactivate(&mut conn, 7, false, AuditStamp::at(1, 1_000))
            .await
            .unwrap();
        soft_delete(&mut conn, id, AuditStamp::at(1, 2_000)).await.unwrap();
        let err = update_email_notification(&mut conn, id, true, AuditStamp::at(1, 3_000))
            .await
            .unwrap_err();
        assert!(matches!(err, RepoError::NotFound(_)));
    }
}
