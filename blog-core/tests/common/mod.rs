#![allow(dead_code)]

use blog_core::{AppState, Config, DbService};
use shared::models::{Category, CategoryCreate, SubscriptionCreate, Tag, TagCreate};

pub const ADMIN: i64 = 1;

pub fn test_config() -> Config {
    Config {
        database_url: "sqlite::memory:".into(),
        db_max_connections: 1,
        db_busy_timeout_ms: 5000,
        default_page_size: 10,
        max_page_size: 100,
        max_bulk_ids: 50,
        log_level: "debug".into(),
        log_dir: None,
    }
}

/// Fresh in-memory database with every service wired up
pub async fn setup() -> AppState {
    let db = DbService::in_memory().await.expect("in-memory database");
    AppState::with_db(test_config(), db)
}

/// WAL database file under `dir`, pooled over `connections` connections
pub async fn setup_file(dir: &std::path::Path, connections: u32) -> AppState {
    let config = Config {
        database_url: format!("sqlite:{}", dir.join("blog.db").display()),
        db_max_connections: connections,
        ..test_config()
    };
    let db = DbService::new(&config).await.expect("file database");
    AppState::with_db(config, db)
}

pub async fn category(state: &AppState, name: &str, parent: Option<&Category>) -> Category {
    state
        .categories
        .create(
            ADMIN,
            CategoryCreate {
                name: name.into(),
                parent_id: parent.map(|p| p.id),
                sort_order: None,
            },
        )
        .await
        .expect("create category")
}

pub async fn tag(state: &AppState, name: &str) -> Tag {
    state
        .tags
        .create(ADMIN, TagCreate { name: name.into() })
        .await
        .expect("create tag")
}

/// Subscription profile id for `user_id`
pub async fn profile(state: &AppState, user_id: i64) -> i64 {
    state
        .subscriptions
        .create(
            ADMIN,
            SubscriptionCreate {
                user_id,
                email_notification: None,
            },
        )
        .await
        .expect("create profile")
        .id
}
