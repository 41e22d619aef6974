//! Database Module
//!
//! Handles the SQLite connection pool and migrations

pub mod repository;

use crate::core::Config;
use shared::AppError;
use sqlx::SqlitePool;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use std::str::FromStr;
use std::time::Duration;

/// Database service, owns the SQLite connection pool
#[derive(Clone)]
pub struct DbService {
    pub pool: SqlitePool,
}

impl DbService {
    /// Open (creating if missing) the database named by `config.database_url`
    /// in WAL mode and apply migrations.
    pub async fn new(config: &Config) -> Result<Self, AppError> {
        let options = SqliteConnectOptions::from_str(&config.database_url)
            .map_err(|e| AppError::internal(format!("Invalid database url: {e}")))?
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal)
            .foreign_keys(true)
            // 写冲突时等待而非立即失败
            .busy_timeout(Duration::from_millis(config.db_busy_timeout_ms))
            .optimize_on_close(true, None);

        let pool = SqlitePoolOptions::new()
            .max_connections(config.db_max_connections)
            .connect_with(options)
            .await
            .map_err(|e| AppError::internal(format!("Failed to open database: {e}")))?;

        tracing::info!(
            url = %config.database_url,
            busy_timeout_ms = config.db_busy_timeout_ms,
            "Database connection established (SQLite WAL)"
        );

        Self::migrate(&pool).await?;
        Ok(Self { pool })
    }

    /// Private in-memory database with migrations applied.
    ///
    /// The pool holds exactly one connection that never expires, since each
    /// `:memory:` connection is its own database.
    pub async fn in_memory() -> Result<Self, AppError> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")
            .map_err(|e| AppError::internal(format!("Invalid database url: {e}")))?
            .foreign_keys(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await
            .map_err(|e| AppError::internal(format!("Failed to open database: {e}")))?;

        Self::migrate(&pool).await?;
        Ok(Self { pool })
    }

    async fn migrate(pool: &SqlitePool) -> Result<(), AppError> {
        sqlx::migrate!("./migrations")
            .run(pool)
            .await
            .map_err(|e| AppError::internal(format!("Failed to apply migrations: {e}")))?;
        tracing::debug!("Database migrations applied");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_in_memory_enforces_foreign_keys() {
        let db = DbService::in_memory().await.unwrap();
        let err = sqlx::query(
            "INSERT INTO category_subscription (subscription_id, target_id, creator_id, created_at, updater_id, updated_at) VALUES (999, 999, 1, 0, 1, 0)",
        )
        .execute(&db.pool)
        .await;
        assert!(err.is_err());
    }

    #[tokio::test]
    async fn test_flag_check_constraint() {
        let db = DbService::in_memory().await.unwrap();
        let err = sqlx::query(
            "INSERT INTO tag (name, use_flag, delete_flag, creator_id, created_at, updater_id, updated_at) VALUES ('x', 'Y', 'Y', 1, 0, 1, 0)",
        )
        .execute(&db.pool)
        .await;
        assert!(err.is_err());
    }

    #[tokio::test]
    async fn test_file_database_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("blog.db");
        let config = Config {
            database_url: format!("sqlite:{}", path.display()),
            ..Config::default()
        };

        let db = DbService::new(&config).await.unwrap();
        sqlx::query(
            "INSERT INTO tag (name, creator_id, created_at, updater_id, updated_at) VALUES ('persisted', 1, 0, 1, 0)",
        )
        .execute(&db.pool)
        .await
        .unwrap();
        db.pool.close().await;

        let reopened = DbService::new(&config).await.unwrap();
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM tag")
            .fetch_one(&reopened.pool)
            .await
            .unwrap();
        assert_eq!(count, 1);
    }
}
