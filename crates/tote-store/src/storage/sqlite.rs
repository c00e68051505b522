//! # SQLite Storage
//!
//! Device-local key/value storage backed by a single SQLite table.
//!
//! ## Architecture
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      SQLite Key/Value Backend                           │
//! │                                                                         │
//! │  DbConfig::new(path)                                                   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SqliteStorage::open(config).await ← pool + migrations                 │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────┐               │
//! │  │ key_value_store                                     │               │
//! │  │ key (PK)  | value                  | updated_at     │               │
//! │  │ ──────────┼────────────────────────┼─────────────── │               │
//! │  │ @cart     | [{"id":"p1",...}]      | 2024-05-01T... │               │
//! │  └─────────────────────────────────────────────────────┘               │
//! │                                                                         │
//! │  set() is an upsert, so concurrent writers to '@cart' race and the     │
//! │  last statement to commit wins.                                        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## WAL Mode
//! File databases run in WAL mode with NORMAL synchronous: a crash may lose
//! the last write, never corrupt the file.

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use sqlx::migrate::Migrator;
use sqlx::SqlitePool;
use tracing::{debug, info};

use super::KeyValueStorage;
use crate::error::{DbError, DbResult, StorageResult};

const IN_MEMORY_PATH: &str = ":memory:";

/// Schema migrations from the workspace `migrations/sqlite` directory,
/// recorded in `_sqlx_migrations`. Existing files are never edited; changes
/// go in a new `NNN_description.sql`.
static MIGRATOR: Migrator = sqlx::migrate!("../../migrations/sqlite");

// =============================================================================
// Configuration
// =============================================================================

/// SQLite backend configuration.
///
/// ## Example
/// ```rust,ignore
/// let config = DbConfig::new("/path/to/tote.db").max_connections(2);
/// ```
#[derive(Debug, Clone)]
pub struct DbConfig {
    /// Path to the SQLite database file.
    pub database_path: PathBuf,

    /// Maximum number of connections in the pool.
    /// Default: 2 (one writer plus a reader is plenty for one cart)
    pub max_connections: u32,

    /// Minimum number of connections to keep alive.
    pub min_connections: u32,

    /// Connection acquire timeout.
    pub connect_timeout: Duration,

    /// Idle timeout before closing a connection. `None` keeps it forever.
    pub idle_timeout: Option<Duration>,

    /// Whether to run migrations on open.
    pub run_migrations: bool,
}

impl DbConfig {
    /// Creates a configuration for the database file at `path`.
    /// The file and its parent directory are created if missing.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        DbConfig {
            database_path: path.into(),
            max_connections: 2,
            min_connections: 1,
            connect_timeout: Duration::from_secs(30),
            idle_timeout: Some(Duration::from_secs(600)),
            run_migrations: true,
        }
    }

    /// Sets the maximum number of connections.
    pub fn max_connections(mut self, max: u32) -> Self {
        self.max_connections = max;
        self
    }

    /// Sets whether to run migrations on open.
    pub fn run_migrations(mut self, run: bool) -> Self {
        self.run_migrations = run;
        self
    }

    /// Creates an in-memory database configuration (for testing).
    ///
    /// Uses a single connection that never idles out; closing it would drop
    /// the database.
    pub fn in_memory() -> Self {
        DbConfig {
            database_path: PathBuf::from(IN_MEMORY_PATH),
            max_connections: 1,
            min_connections: 1,
            connect_timeout: Duration::from_secs(5),
            idle_timeout: None,
            run_migrations: true,
        }
    }

    fn is_in_memory(&self) -> bool {
        self.database_path.as_os_str() == IN_MEMORY_PATH
    }

    fn connect_options(&self) -> DbResult<SqliteConnectOptions> {
        if self.is_in_memory() {
            return SqliteConnectOptions::from_str("sqlite::memory:")
                .map_err(|e| DbError::ConnectionFailed(e.to_string()));
        }

        if let Some(parent) = self.database_path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)
                    .map_err(|e| DbError::ConnectionFailed(e.to_string()))?;
            }
        }

        Ok(SqliteConnectOptions::new()
            .filename(&self.database_path)
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal)
            .create_if_missing(true))
    }
}

// =============================================================================
// SQLite Storage
// =============================================================================

/// Key/value storage over the `key_value_store` table.
#[derive(Debug, Clone)]
pub struct SqliteStorage {
    pool: SqlitePool,
}

impl SqliteStorage {
    /// Opens the database and (by default) applies pending migrations.
    pub async fn open(config: DbConfig) -> DbResult<Self> {
        info!(
            path = %config.database_path.display(),
            "Initializing storage database"
        );

        let connect_options = config.connect_options()?;

        let mut pool_options = SqlitePoolOptions::new()
            .max_connections(config.max_connections)
            .min_connections(config.min_connections)
            .acquire_timeout(config.connect_timeout)
            .idle_timeout(config.idle_timeout);
        if config.is_in_memory() {
            pool_options = pool_options.max_lifetime(None);
        }

        let pool = pool_options
            .connect_with(connect_options)
            .await
            .map_err(|e| DbError::ConnectionFailed(e.to_string()))?;

        debug!(max_connections = config.max_connections, "Storage pool created");

        let storage = SqliteStorage { pool };
        if config.run_migrations {
            storage.run_migrations().await?;
        }

        Ok(storage)
    }

    /// Applies pending migrations. Idempotent.
    pub async fn run_migrations(&self) -> DbResult<()> {
        MIGRATOR.run(&self.pool).await?;
        debug!(migrations = MIGRATOR.migrations.len(), "Storage schema up to date");
        Ok(())
    }

    /// Returns a reference to the connection pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Closes the connection pool. Later calls fail with `PoolClosed`.
    pub async fn close(&self) {
        info!("Closing storage connection pool");
        self.pool.close().await;
    }

    /// Checks if the database can execute queries.
    pub async fn health_check(&self) -> bool {
        sqlx::query("SELECT 1").execute(&self.pool).await.is_ok()
    }
}

#[async_trait]
impl KeyValueStorage for SqliteStorage {
    async fn get(&self, key: &str) -> StorageResult<Option<String>> {
        let value = sqlx::query_scalar::<_, String>(
            "SELECT value FROM key_value_store WHERE key = ?1",
        )
        .bind(key)
        .fetch_optional(&self.pool)
        .await?;

        debug!(key = %key, found = value.is_some(), "Storage get");
        Ok(value)
    }

    async fn set(&self, key: &str, value: &str) -> StorageResult<()> {
        sqlx::query(
            r#"
            INSERT INTO key_value_store (key, value, updated_at)
            VALUES (?1, ?2, ?3)
            ON CONFLICT(key) DO UPDATE SET
                value = excluded.value,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(key)
        .bind(value)
        .bind(Utc::now().to_rfc3339())
        .execute(&self.pool)
        .await?;

        debug!(key = %key, bytes = value.len(), "Storage set");
        Ok(())
    }

    async fn remove(&self, key: &str) -> StorageResult<()> {
        let result = sqlx::query("DELETE FROM key_value_store WHERE key = ?1")
            .bind(key)
            .execute(&self.pool)
            .await?;

        debug!(key = %key, removed = result.rows_affected(), "Storage remove");
        Ok(())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StorageError;

    async fn memory_storage() -> SqliteStorage {
        SqliteStorage::open(DbConfig::in_memory()).await.unwrap()
    }

    #[tokio::test]
    async fn test_in_memory_database() {
        let storage = memory_storage().await;
        assert!(storage.health_check().await);

        let applied: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM _sqlx_migrations")
            .fetch_one(storage.pool())
            .await
            .unwrap();
        assert_eq!(applied as usize, MIGRATOR.migrations.len());
    }

    #[tokio::test]
    async fn test_get_missing_key() {
        let storage = memory_storage().await;
        assert_eq!(storage.get("@cart").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_set_then_upsert() {
        let storage = memory_storage().await;

        storage.set("@cart", "[]").await.unwrap();
        storage.set("@cart", r#"[{"id":"p1"}]"#).await.unwrap();

        assert_eq!(
            storage.get("@cart").await.unwrap().as_deref(),
            Some(r#"[{"id":"p1"}]"#)
        );

        let rows: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM key_value_store")
            .fetch_one(storage.pool())
            .await
            .unwrap();
        assert_eq!(rows, 1);
    }

    #[tokio::test]
    async fn test_remove() {
        let storage = memory_storage().await;

        storage.set("@cart", "[]").await.unwrap();
        storage.remove("@cart").await.unwrap();
        storage.remove("@cart").await.unwrap();

        assert_eq!(storage.get("@cart").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_file_database_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("tote.db");

        let storage = SqliteStorage::open(DbConfig::new(&path)).await.unwrap();
        storage.set("@cart", "[]").await.unwrap();
        storage.close().await;

        let reopened = SqliteStorage::open(DbConfig::new(&path)).await.unwrap();
        assert_eq!(reopened.get("@cart").await.unwrap().as_deref(), Some("[]"));
    }

    #[tokio::test]
    async fn test_closed_pool_reports_error() {
        let storage = memory_storage().await;
        storage.close().await;

        let err = storage.get("@cart").await.unwrap_err();
        assert!(matches!(err, StorageError::Database(_)));
    }

    #[tokio::test]
    async fn test_open_without_migrations_then_migrate() {
        let storage = SqliteStorage::open(DbConfig::in_memory().run_migrations(false))
            .await
            .unwrap();
        assert!(storage.get("@cart").await.is_err());

        storage.run_migrations().await.unwrap();
        storage.run_migrations().await.unwrap();
        assert_eq!(storage.get("@cart").await.unwrap(), None);
    }

    #[test]
    fn test_config_builder() {
        let config = DbConfig::new("/tmp/tote.db")
            .max_connections(4)
            .run_migrations(false);

        assert_eq!(config.max_connections, 4);
        assert!(!config.run_migrations);
        assert!(!config.is_in_memory());
        assert!(DbConfig::in_memory().is_in_memory());
    }
}
