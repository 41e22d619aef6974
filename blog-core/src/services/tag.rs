//! Tag registry

use super::{ServiceSettings, acquire, begin, commit, require_name};
use crate::db::DbService;
use crate::db::repository::tag as repo;
use crate::pagination::Window;
use shared::models::{AuditStamp, Tag, TagCreate, TagSearch};
use shared::types::ActorId;
use shared::{AppError, AppResult, Numbered, Page};
use sqlx::SqlitePool;

#[derive(Clone)]
pub struct TagService {
    pool: SqlitePool,
    settings: ServiceSettings,
}

impl TagService {
    pub fn new(db: &DbService, settings: ServiceSettings) -> Self {
        Self {
            pool: db.pool.clone(),
            settings,
        }
    }

    pub async fn create(&self, actor: ActorId, data: TagCreate) -> AppResult<Tag> {
        let name = require_name("Tag", &data.name)?;
        let mut tx = begin(&self.pool).await?;
        if repo::find_active_by_name(&mut tx, name).await?.is_some() {
            tracing::debug!(name, "Rejected duplicate tag name");
            return Err(AppError::conflict(format!("Tag name '{name}' is already in use")));
        }
        let id = repo::insert(&mut tx, name, AuditStamp::now(actor)).await?;
        let tag = repo::find_by_id(&mut tx, id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Tag {id}")))?;
        commit(tx).await?;

        tracing::info!(id, name, "Tag created");
        Ok(tag)
    }

    /// Non-deleted tag by id
    pub async fn get(&self, id: i64) -> AppResult<Tag> {
        let mut conn = acquire(&self.pool).await?;
        repo::find_by_id(&mut conn, id)
            .await?
            .filter(|t| t.status.is_active())
            .ok_or_else(|| AppError::not_found(format!("Tag {id}")))
    }

    pub async fn list(&self, search: &TagSearch) -> AppResult<Page<Numbered<Tag>>> {
        let window = Window::resolve(&search.page, self.settings.page_limits);
        let mut conn = acquire(&self.pool).await?;
        Ok(repo::list(&mut conn, search, window).await?)
    }

    pub async fn delete(&self, actor: ActorId, id: i64) -> AppResult<()> {
        let mut tx = begin(&self.pool).await?;
        if !repo::soft_delete(&mut tx, id, AuditStamp::now(actor)).await? {
            return Err(AppError::not_found(format!("Tag {id}")));
        }
        commit(tx).await?;
        tracing::info!(id, "Tag deleted");
        Ok(())
    }
}
