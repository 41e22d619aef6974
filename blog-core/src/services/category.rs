//! Category Tree Manager
//!
//! Keeps the category forest within [`MAX_CATEGORY_LEVEL`], acyclic, and with
//! unique names among non-deleted rows. `level` is stored and kept equal to
//! the number of hops to the root: moving a category shifts its whole active
//! subtree in the same transaction.

use super::{ServiceSettings, acquire, begin, commit, require_name};
use crate::db::DbService;
use crate::db::repository::category::{self as repo, CategoryValues};
use crate::pagination::Window;
use shared::models::{
    AuditStamp, Category, CategoryCreate, CategoryNode, CategorySearch, CategoryUpdate,
    MAX_CATEGORY_LEVEL,
};
use shared::types::ActorId;
use shared::{AppError, AppResult, MultiResult, Numbered, Page};
use sqlx::{SqliteConnection, SqlitePool};
use std::collections::{HashMap, HashSet};

#[derive(Clone)]
pub struct CategoryService {
    pool: SqlitePool,
    settings: ServiceSettings,
}

impl CategoryService {
    pub fn new(db: &DbService, settings: ServiceSettings) -> Self {
        Self {
            pool: db.pool.clone(),
            settings,
        }
    }

    pub async fn create(&self, actor: ActorId, data: CategoryCreate) -> AppResult<Category> {
        let name = require_name("Category", &data.name)?;
        let stamp = AuditStamp::now(actor);
        let mut tx = begin(&self.pool).await?;

        let level = match data.parent_id {
            Some(parent_id) => {
                let parent = load_parent(&mut tx, parent_id).await?;
                parent.level + 1
            }
            None => 0,
        };
        ensure_name_free(&mut tx, name, None).await?;

        let values = CategoryValues {
            name,
            parent_id: data.parent_id,
            level,
            sort_order: data.sort_order.unwrap_or(0),
        };
        let id = repo::insert(&mut tx, values, stamp).await?;
        let category = load_active(&mut tx, id).await?;
        commit(tx).await?;

        tracing::info!(id, name, level, parent_id = ?data.parent_id, "Category created");
        Ok(category)
    }

    pub async fn update(
        &self,
        actor: ActorId,
        id: i64,
        data: CategoryUpdate,
    ) -> AppResult<Category> {
        let stamp = AuditStamp::now(actor);
        let mut tx = begin(&self.pool).await?;
        let current = load_active(&mut tx, id).await?;

        let name = match data.name.as_deref() {
            Some(name) => {
                let name = require_name("Category", name)?;
                ensure_name_free(&mut tx, name, Some(id)).await?;
                name.to_string()
            }
            None => current.name.clone(),
        };

        let (parent_id, level) = match data.parent_id {
            None => (current.parent_id, current.level),
            Some(None) => (None, 0),
            Some(Some(parent_id)) => {
                if parent_id == id {
                    tracing::debug!(id, "Rejected self-parenting");
                    return Err(AppError::bad_request("A category cannot be its own parent"));
                }
                let parent = load_parent(&mut tx, parent_id).await?;
                let ancestors = repo::ancestor_ids(&mut tx, parent_id).await?;
                if ancestors.contains(&id) {
                    tracing::debug!(id, parent_id, "Rejected cyclic re-parent");
                    return Err(AppError::bad_request(format!(
                        "Category {parent_id} is a descendant of category {id}"
                    )));
                }
                (Some(parent_id), parent.level + 1)
            }
        };

        if level != current.level {
            move_subtree(&mut tx, &current, level, stamp).await?;
        }

        let values = CategoryValues {
            name: &name,
            parent_id,
            level,
            sort_order: data.sort_order.unwrap_or(current.sort_order),
        };
        repo::update(&mut tx, id, values, stamp).await?;
        let category = load_active(&mut tx, id).await?;
        commit(tx).await?;

        tracing::info!(id, level, parent_id = ?parent_id, "Category updated");
        Ok(category)
    }

    /// Soft delete a leaf category. Categories with active children are kept.
    pub async fn delete(&self, actor: ActorId, id: i64) -> AppResult<Category> {
        let stamp = AuditStamp::now(actor);
        let mut tx = begin(&self.pool).await?;
        load_active(&mut tx, id).await?;

        let children = repo::active_children_of(&mut tx, &[id]).await?;
        if !children.is_empty() {
            tracing::debug!(id, children = children.len(), "Rejected delete of non-leaf category");
            return Err(AppError::bad_request(format!(
                "Category {id} still has {} active children",
                children.len()
            )));
        }

        repo::soft_delete_many(&mut tx, &[id], stamp).await?;
        let deleted = repo::find_by_id(&mut tx, id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Category {id}")))?;
        commit(tx).await?;

        tracing::info!(id, "Category deleted");
        Ok(deleted)
    }

    /// Soft delete a batch of categories.
    ///
    /// A category fails when it has an active child that is not deleted in
    /// the same batch. Unknown and already deleted ids fail too.
    pub async fn multiple_delete(&self, actor: ActorId, ids: &[i64]) -> AppResult<MultiResult> {
        let ids = self.settings.normalize_ids(ids)?;
        let stamp = AuditStamp::now(actor);
        let mut tx = begin(&self.pool).await?;

        let edges = repo::active_children_of(&mut tx, &ids).await?;
        let blocked = blocked_parents(&ids, &edges);
        let deletable: Vec<i64> = ids.iter().copied().filter(|id| !blocked.contains(id)).collect();

        let affected = repo::soft_delete_many(&mut tx, &deletable, stamp).await?;
        commit(tx).await?;

        let result = MultiResult::reconcile(&ids, &affected);
        tracing::info!(
            requested = ids.len(),
            deleted = result.success_count,
            failed = result.failure_count,
            "Categories deleted"
        );
        Ok(result)
    }

    pub async fn get(&self, id: i64) -> AppResult<Category> {
        let mut conn = acquire(&self.pool).await?;
        load_active(&mut conn, id).await
    }

    pub async fn get_by_name(&self, name: &str) -> AppResult<Category> {
        let mut conn = acquire(&self.pool).await?;
        repo::find_active_by_name(&mut conn, name.trim(), None)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Category '{}'", name.trim())))
    }

    pub async fn list(&self, search: &CategorySearch) -> AppResult<Page<Numbered<Category>>> {
        let window = Window::resolve(&search.page, self.settings.page_limits);
        let mut conn = acquire(&self.pool).await?;
        Ok(repo::list(&mut conn, search, window).await?)
    }

    /// Active categories as a forest, siblings ordered by `sort_order, id`
    pub async fn tree(&self) -> AppResult<Vec<CategoryNode>> {
        let mut conn = acquire(&self.pool).await?;
        let categories = repo::find_all_active(&mut conn).await?;
        Ok(build_tree(categories))
    }
}

async fn load_active(conn: &mut SqliteConnection, id: i64) -> AppResult<Category> {
    repo::find_active_by_id(conn, id)
        .await?
        .ok_or_else(|| AppError::not_found(format!("Category {id}")))
}

/// Load a prospective parent and check it may take another child level
async fn load_parent(conn: &mut SqliteConnection, parent_id: i64) -> AppResult<Category> {
    let parent = repo::find_active_by_id(conn, parent_id)
        .await?
        .ok_or_else(|| AppError::not_found(format!("Parent category {parent_id}")))?;
    if !parent.can_have_children() {
        tracing::debug!(parent_id, level = parent.level, "Rejected child below max depth");
        return Err(AppError::bad_request(format!(
            "Category depth exceeded: parent {parent_id} is at level {}",
            parent.level
        )));
    }
    Ok(parent)
}

async fn ensure_name_free(
    conn: &mut SqliteConnection,
    name: &str,
    exclude_id: Option<i64>,
) -> AppResult<()> {
    if repo::find_active_by_name(conn, name, exclude_id)
        .await?
        .is_some()
    {
        tracing::debug!(name, "Rejected duplicate category name");
        return Err(AppError::conflict(format!(
            "Category name '{name}' is already in use"
        )));
    }
    Ok(())
}

/// Shift the active subtree below `current` so that `current` lands on
/// `new_level`, rejecting moves that would push a descendant past the limit.
async fn move_subtree(
    conn: &mut SqliteConnection,
    current: &Category,
    new_level: i32,
    stamp: AuditStamp,
) -> AppResult<()> {
    let descendants = repo::active_descendants(conn, current.id).await?;
    let height = descendants
        .iter()
        .map(|(_, level)| level - current.level)
        .max()
        .unwrap_or(0);
    if new_level + height > MAX_CATEGORY_LEVEL {
        tracing::debug!(id = current.id, new_level, height, "Rejected move past max depth");
        return Err(AppError::bad_request(format!(
            "Category depth exceeded: subtree of height {height} does not fit at level {new_level}"
        )));
    }
    let ids: Vec<i64> = descendants.iter().map(|(id, _)| *id).collect();
    repo::shift_levels(conn, &ids, new_level - current.level, stamp).await?;
    Ok(())
}

/// Requested ids that must survive because an active child stays behind.
///
/// Blocking propagates upwards: a parent whose in-batch child is blocked is
/// blocked as well.
fn blocked_parents(requested: &[i64], edges: &[(i64, i64)]) -> HashSet<i64> {
    let in_batch: HashSet<i64> = requested.iter().copied().collect();
    let mut blocked: HashSet<i64> = edges
        .iter()
        .filter(|(_, child)| !in_batch.contains(child))
        .map(|(parent, _)| *parent)
        .collect();
    loop {
        let before = blocked.len();
        for (parent, child) in edges {
            if blocked.contains(child) {
                blocked.insert(*parent);
            }
        }
        if blocked.len() == before {
            return blocked;
        }
    }
}

/// Assemble a forest from rows already ordered by `sort_order, id`.
///
/// A row whose parent is not in the set is treated as a root.
fn build_tree(categories: Vec<Category>) -> Vec<CategoryNode> {
    let known: HashSet<i64> = categories.iter().map(|c| c.id).collect();
    let mut roots = Vec::new();
    let mut by_parent: HashMap<i64, Vec<Category>> = HashMap::new();
    for category in categories {
        match category.parent_id.filter(|p| known.contains(p)) {
            Some(parent_id) => by_parent.entry(parent_id).or_default().push(category),
            None => roots.push(category),
        }
    }
    roots
        .into_iter()
        .map(|root| attach_children(root, &mut by_parent))
        .collect()
}

fn attach_children(category: Category, by_parent: &mut HashMap<i64, Vec<Category>>) -> CategoryNode {
    let children = by_parent
        .remove(&category.id)
        .unwrap_or_default()
        .into_iter()
        .map(|child| attach_children(child, by_parent))
        .collect();
    CategoryNode { category, children }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::models::{AuditMetadata, RecordStatus};

    fn category(id: i64, parent_id: Option<i64>, sort_order: i32) -> Category {
        Category {
            id,
            name: format!("c{id}"),
            parent_id,
            level: 0,
            sort_order,
            status: RecordStatus::Active,
            audit: AuditMetadata::created(AuditStamp::at(1, 0)),
        }
    }

    #[test]
    fn test_blocked_parents_propagates_up() {
        // 1 -> 2 -> 3, and 3 has a child 4 outside the batch
        let edges = [(1, 2), (2, 3), (3, 4)];
        let blocked = blocked_parents(&[1, 2, 3], &edges);
        assert_eq!(blocked, HashSet::from([1, 2, 3]));

        // whole chain in the batch: nothing blocked
        let blocked = blocked_parents(&[1, 2, 3, 4], &edges);
        assert!(blocked.is_empty());
    }

    #[test]
    fn test_build_tree_keeps_order_and_nesting() {
        let rows = vec![
            category(2, None, 0),
            category(1, None, 1),
            category(4, Some(1), 0),
            category(3, Some(1), 5),
            category(5, Some(99), 0),
        ];
        let tree = build_tree(rows);
        let roots: Vec<i64> = tree.iter().map(|n| n.category.id).collect();
        assert_eq!(roots, vec![2, 1, 5]);
        let children: Vec<i64> = tree[1].children.iter().map(|n| n.category.id).collect();
        assert_eq!(children, vec![4, 3]);
        assert!(tree[0].children.is_empty());
    }
}
