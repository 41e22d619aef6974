//! Subscription Reconciler
//!
//! Links a subscription profile to categories or tags. The target kind is a
//! type parameter, so both mapping tables share one implementation and
//! contract. Creates go through insert-or-reactivate: a pair keeps the same
//! mapping row (and primary key) across any number of subscribe and
//! unsubscribe cycles.
//!
//! Bulk results are computed from the ids the store returned inside the
//! transaction, never from the request alone.

use super::subscription::load_active as load_profile;
use super::{ServiceSettings, acquire, begin, commit};
use crate::db::DbService;
use crate::db::repository::mapping::{self as repo, CategoryTarget, SubscriptionTarget, TagTarget};
use crate::db::repository::subscription as profile_repo;
use crate::pagination::Window;
use shared::models::{
    AuditStamp, ExistingPolicy, MappingSearch, MappingUpdate, MultipleCreate, RecordStatus,
    SubscribeResult, SubscriptionMapping,
};
use shared::types::ActorId;
use shared::{AppError, AppResult, MultiResult, Numbered, Page};
use sqlx::{SqliteConnection, SqlitePool};
use std::collections::{HashMap, HashSet};
use std::marker::PhantomData;

/// Reconciler for profile ↔ category mappings
pub type CategorySubscriptions = SubscriptionReconciler<CategoryTarget>;
/// Reconciler for profile ↔ tag mappings
pub type TagSubscriptions = SubscriptionReconciler<TagTarget>;

pub struct SubscriptionReconciler<K: SubscriptionTarget> {
    pool: SqlitePool,
    settings: ServiceSettings,
    _target: PhantomData<K>,
}

// derive(Clone) would require K: Clone
impl<K: SubscriptionTarget> Clone for SubscriptionReconciler<K> {
    fn clone(&self) -> Self {
        Self {
            pool: self.pool.clone(),
            settings: self.settings,
            _target: PhantomData,
        }
    }
}

impl<K: SubscriptionTarget> SubscriptionReconciler<K> {
    pub fn new(db: &DbService, settings: ServiceSettings) -> Self {
        Self {
            pool: db.pool.clone(),
            settings,
            _target: PhantomData,
        }
    }

    /// Subscribe one target.
    ///
    /// `CONFLICT` when the pair is already active. A deleted pair is
    /// reactivated in place.
    pub async fn create(
        &self,
        actor: ActorId,
        subscription_id: i64,
        target_id: i64,
    ) -> AppResult<SubscriptionMapping> {
        let stamp = AuditStamp::now(actor);
        let mut tx = begin(&self.pool).await?;
        load_profile(&mut tx, subscription_id).await?;

        if repo::active_targets_among::<K>(&mut tx, &[target_id])
            .await?
            .is_empty()
        {
            return Err(AppError::not_found(format!("{} {target_id}", K::KIND)));
        }
        if let Some(existing) = repo::find_pair::<K>(&mut tx, subscription_id, target_id).await?
            && existing.status.is_active()
        {
            tracing::debug!(subscription_id, target_id, kind = %K::KIND, "Rejected duplicate subscription");
            return Err(AppError::conflict(format!(
                "Subscription {subscription_id} already follows {} {target_id}",
                K::KIND
            )));
        }

        let written = repo::upsert_many::<K>(&mut tx, subscription_id, &[target_id], stamp).await?;
        let (mapping_id, _) = written
            .first()
            .copied()
            .ok_or_else(|| AppError::internal("Upsert returned no row"))?;
        let mapping = repo::get_existing::<K>(&mut tx, mapping_id).await?;
        commit(tx).await?;

        tracing::info!(mapping_id, subscription_id, target_id, kind = %K::KIND, "Subscription created");
        Ok(mapping)
    }

    /// Subscribe many targets in one statement.
    ///
    /// Unknown or deleted targets are reported as failed ids. With
    /// [`ExistingPolicy::Reject`] any already active pair aborts the batch
    /// with `CONFLICT` before anything is written.
    pub async fn multiple_create(
        &self,
        actor: ActorId,
        subscription_id: i64,
        request: MultipleCreate,
    ) -> AppResult<SubscribeResult> {
        let ids = self.settings.normalize_ids(&request.target_ids)?;
        let stamp = AuditStamp::now(actor);
        let mut tx = begin(&self.pool).await?;
        load_profile(&mut tx, subscription_id).await?;

        let valid: HashSet<i64> = repo::active_targets_among::<K>(&mut tx, &ids)
            .await?
            .into_iter()
            .collect();
        let existing: HashMap<i64, RecordStatus> = repo::find_pairs::<K>(&mut tx, subscription_id, &ids)
            .await?
            .into_iter()
            .collect();

        if request.on_existing == ExistingPolicy::Reject {
            let active: Vec<i64> = ids
                .iter()
                .copied()
                .filter(|id| existing.get(id).is_some_and(RecordStatus::is_active))
                .collect();
            if !active.is_empty() {
                tracing::debug!(subscription_id, ?active, kind = %K::KIND, "Rejected batch with active pairs");
                return Err(AppError::conflict(format!(
                    "Subscription {subscription_id} already follows {} {active:?}",
                    K::KIND
                )));
            }
        }

        let writable: Vec<i64> = ids.iter().copied().filter(|id| valid.contains(id)).collect();
        let written = repo::upsert_many::<K>(&mut tx, subscription_id, &writable, stamp).await?;
        commit(tx).await?;

        let affected: Vec<i64> = written.iter().map(|(_, target_id)| *target_id).collect();
        let (reactivated, inserted): (Vec<i64>, Vec<i64>) = ids
            .iter()
            .copied()
            .filter(|id| affected.contains(id))
            .partition(|id| existing.contains_key(id));
        let result = MultiResult::reconcile(&ids, &affected);

        tracing::info!(
            subscription_id,
            kind = %K::KIND,
            inserted = inserted.len(),
            reactivated = reactivated.len(),
            failed = result.failure_count,
            "Subscriptions reconciled"
        );
        Ok(SubscribeResult {
            result,
            inserted,
            reactivated,
        })
    }

    /// Change the status of one mapping. Deleted rows may be reactivated here.
    ///
    /// `NOT_FOUND` when the mapping's profile is deleted, or when reactivating
    /// a pair whose target is deleted.
    pub async fn update(
        &self,
        actor: ActorId,
        mapping_id: i64,
        data: MappingUpdate,
    ) -> AppResult<SubscriptionMapping> {
        let stamp = AuditStamp::now(actor);
        let mut tx = begin(&self.pool).await?;
        let current = repo::get_existing::<K>(&mut tx, mapping_id).await?;
        load_profile(&mut tx, current.subscription_id).await?;
        if data.status == Some(RecordStatus::Active)
            && repo::active_targets_among::<K>(&mut tx, &[current.target_id])
                .await?
                .is_empty()
        {
            return Err(AppError::not_found(format!("{} {}", K::KIND, current.target_id)));
        }
        repo::set_status_many::<K>(&mut tx, None, &[mapping_id], data.status, stamp).await?;
        let mapping = repo::get_existing::<K>(&mut tx, mapping_id).await?;
        commit(tx).await?;

        tracing::info!(mapping_id, kind = %K::KIND, status = %mapping.status, "Subscription updated");
        Ok(mapping)
    }

    /// Change the status of many mappings of one profile in one statement.
    ///
    /// Ids that do not exist or belong to another profile fail, as do
    /// reactivations of pairs whose target is deleted.
    pub async fn multiple_update(
        &self,
        actor: ActorId,
        subscription_id: i64,
        mapping_ids: &[i64],
        data: MappingUpdate,
    ) -> AppResult<MultiResult> {
        let ids = self.settings.normalize_ids(mapping_ids)?;
        let stamp = AuditStamp::now(actor);
        let mut tx = begin(&self.pool).await?;
        load_profile(&mut tx, subscription_id).await?;
        let affected =
            repo::set_status_many::<K>(&mut tx, Some(subscription_id), &ids, data.status, stamp)
                .await?;
        commit(tx).await?;

        let result = MultiResult::reconcile(&ids, &affected);
        tracing::info!(
            subscription_id,
            kind = %K::KIND,
            updated = result.success_count,
            failed = result.failure_count,
            "Subscriptions updated"
        );
        Ok(result)
    }

    /// Unsubscribe. `NOT_FOUND` when the mapping is missing or already deleted.
    pub async fn delete(&self, actor: ActorId, mapping_id: i64) -> AppResult<SubscriptionMapping> {
        let stamp = AuditStamp::now(actor);
        let mut tx = begin(&self.pool).await?;
        let affected = repo::soft_delete_many::<K>(&mut tx, &[mapping_id], stamp).await?;
        if affected.is_empty() {
            return Err(AppError::not_found(format!("{} subscription {mapping_id}", K::KIND)));
        }
        let mapping = repo::get_existing::<K>(&mut tx, mapping_id).await?;
        commit(tx).await?;

        tracing::info!(mapping_id, kind = %K::KIND, "Subscription deleted");
        Ok(mapping)
    }

    /// Unsubscribe many mappings in one statement
    pub async fn multiple_delete(&self, actor: ActorId, mapping_ids: &[i64]) -> AppResult<MultiResult> {
        let ids = self.settings.normalize_ids(mapping_ids)?;
        let stamp = AuditStamp::now(actor);
        let mut tx = begin(&self.pool).await?;
        let affected = repo::soft_delete_many::<K>(&mut tx, &ids, stamp).await?;
        commit(tx).await?;

        let result = MultiResult::reconcile(&ids, &affected);
        tracing::info!(
            kind = %K::KIND,
            deleted = result.success_count,
            failed = result.failure_count,
            "Subscriptions deleted"
        );
        Ok(result)
    }

    /// Mappings of a profile. Deleted profiles stay listable as history.
    pub async fn list(
        &self,
        subscription_id: i64,
        search: &MappingSearch,
    ) -> AppResult<Page<Numbered<SubscriptionMapping>>> {
        let window = Window::resolve(&search.page, self.settings.page_limits);
        let mut conn = acquire(&self.pool).await?;
        ensure_profile_exists(&mut conn, subscription_id).await?;
        Ok(repo::list::<K>(&mut conn, subscription_id, search, window).await?)
    }

    /// Target ids the profile currently follows, ascending
    pub async fn active_target_ids(&self, subscription_id: i64) -> AppResult<Vec<i64>> {
        let mut conn = acquire(&self.pool).await?;
        ensure_profile_exists(&mut conn, subscription_id).await?;
        Ok(repo::active_target_ids::<K>(&mut conn, subscription_id).await?)
    }
}

async fn ensure_profile_exists(conn: &mut SqliteConnection, subscription_id: i64) -> AppResult<()> {
    profile_repo::find_by_id(conn, subscription_id)
        .await?
        .map(|_| ())
        .ok_or_else(|| AppError::not_found(format!("Subscription {subscription_id}")))
}
