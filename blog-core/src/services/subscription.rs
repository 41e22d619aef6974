//! Subscription profiles
//!
//! One profile per user. Deleting a profile leaves its mappings in place as
//! history; the reconciler refuses to touch pairs of a deleted profile.

use super::{acquire, begin, commit};
use crate::db::DbService;
use crate::db::repository::subscription as repo;
use shared::models::{AuditStamp, Subscription, SubscriptionCreate, SubscriptionUpdate};
use shared::types::ActorId;
use shared::{AppError, AppResult};
use sqlx::{SqliteConnection, SqlitePool};

#[derive(Clone)]
pub struct SubscriptionService {
    pool: SqlitePool,
}

impl SubscriptionService {
    pub fn new(db: &DbService) -> Self {
        Self {
            pool: db.pool.clone(),
        }
    }

    /// Create the user's profile. A previously deleted profile of the same
    /// user comes back with its old id.
    pub async fn create(&self, actor: ActorId, data: SubscriptionCreate) -> AppResult<Subscription> {
        let mut tx = begin(&self.pool).await?;
        if repo::find_active_by_user(&mut tx, data.user_id)
            .await?
            .is_some()
        {
            return Err(AppError::conflict(format!(
                "User {} already has a subscription profile",
                data.user_id
            )));
        }
        let email = data.email_notification.unwrap_or(false);
        let id = repo::insert_or_reactivate(&mut tx, data.user_id, email, AuditStamp::now(actor))
            .await?;
        let profile = load_active(&mut tx, id).await?;
        commit(tx).await?;

        tracing::info!(id, user_id = data.user_id, "Subscription profile created");
        Ok(profile)
    }

    pub async fn get(&self, id: i64) -> AppResult<Subscription> {
        let mut conn = acquire(&self.pool).await?;
        load_active(&mut conn, id).await
    }

    pub async fn get_by_user(&self, user_id: i64) -> AppResult<Subscription> {
        let mut conn = acquire(&self.pool).await?;
        repo::find_active_by_user(&mut conn, user_id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Subscription of user {user_id}")))
    }

    pub async fn update(
        &self,
        actor: ActorId,
        id: i64,
        data: SubscriptionUpdate,
    ) -> AppResult<Subscription> {
        let mut tx = begin(&self.pool).await?;
        let current = load_active(&mut tx, id).await?;
        let email = data
            .email_notification
            .unwrap_or(current.email_notification);
        repo::update_email_notification(&mut tx, id, email, AuditStamp::now(actor)).await?;
        let profile = load_active(&mut tx, id).await?;
        commit(tx).await?;

        tracing::info!(id, email_notification = email, "Subscription profile updated");
        Ok(profile)
    }

    pub async fn delete(&self, actor: ActorId, id: i64) -> AppResult<()> {
        let mut tx = begin(&self.pool).await?;
        if !repo::soft_delete(&mut tx, id, AuditStamp::now(actor)).await? {
            return Err(AppError::not_found(format!("Subscription {id}")));
        }
        commit(tx).await?;
        tracing::info!(id, "Subscription profile deleted");
        Ok(())
    }
}

pub(crate) async fn load_active(conn: &mut SqliteConnection, id: i64) -> AppResult<Subscription> {
    repo::find_active_by_id(conn, id)
        .await?
        .ok_or_else(|| AppError::not_found(format!("Subscription {id}")))
}
