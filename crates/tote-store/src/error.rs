//! # Store Error Types
//!
//! ## Error Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Error Propagation                                    │
//! │                                                                         │
//! │  SQLite Error (sqlx::Error)                                            │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  DbError ← Adds context and categorization                             │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  StorageError ← What every KeyValueStorage backend returns             │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  CartStore: logged with tracing::warn!, never returned                 │
//! │                                                                         │
//! │  ConfigurationError ← the only error a cart consumer can see           │
//! │  (no provider registered, no runtime, bad config file)                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use thiserror::Error;

// =============================================================================
// Database Error
// =============================================================================

/// SQLite backend errors.
#[derive(Debug, Error)]
pub enum DbError {
    /// Database connection failed.
    ///
    /// ## When This Occurs
    /// - Database file can't be created
    /// - File permissions issue
    /// - Disk full
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// Migration failed.
    #[error("Migration failed: {0}")]
    MigrationFailed(String),

    /// Query execution failed.
    #[error("Query failed: {0}")]
    QueryFailed(String),

    /// Pool exhausted (all connections in use).
    #[error("Connection pool exhausted")]
    PoolExhausted,

    /// Internal database error.
    #[error("Internal database error: {0}")]
    Internal(String),
}

/// Convert sqlx errors to DbError.
///
/// ## Error Mapping
/// ```text
/// sqlx::Error::Database       → DbError::QueryFailed
/// sqlx::Error::PoolTimedOut   → DbError::PoolExhausted
/// sqlx::Error::PoolClosed     → DbError::ConnectionFailed
/// Other                       → DbError::Internal
/// ```
impl From<sqlx::Error> for DbError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::Database(db_err) => DbError::QueryFailed(db_err.message().to_string()),
            sqlx::Error::PoolTimedOut => DbError::PoolExhausted,
            sqlx::Error::PoolClosed => DbError::ConnectionFailed("Pool is closed".to_string()),
            _ => DbError::Internal(err.to_string()),
        }
    }
}

impl From<sqlx::migrate::MigrateError> for DbError {
    fn from(err: sqlx::migrate::MigrateError) -> Self {
        DbError::MigrationFailed(err.to_string())
    }
}

/// Result type for database operations.
pub type DbResult<T> = Result<T, DbError>;

// =============================================================================
// Storage Error
// =============================================================================

/// Errors returned by [`KeyValueStorage`](crate::storage::KeyValueStorage)
/// implementations.
#[derive(Debug, Error)]
pub enum StorageError {
    /// The SQLite backend failed.
    #[error(transparent)]
    Database(#[from] DbError),

    /// Any other backend failure (used by custom backends and test doubles).
    #[error("Storage backend error: {0}")]
    Backend(String),
}

impl StorageError {
    /// Creates a backend error from a message.
    pub fn backend(message: impl Into<String>) -> Self {
        StorageError::Backend(message.into())
    }
}

impl From<sqlx::Error> for StorageError {
    fn from(err: sqlx::Error) -> Self {
        StorageError::Database(DbError::from(err))
    }
}

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

// =============================================================================
// Configuration Error
// =============================================================================

/// Wiring and configuration failures.
///
/// Unlike storage failures these are programming or deployment mistakes, so
/// they are returned to the caller instead of being absorbed.
#[derive(Debug, Error)]
pub enum ConfigurationError {
    /// The capability handle was requested from a context with no
    /// `CartProvider` registered.
    #[error("use_cart must be used within a CartProvider")]
    MissingProvider,

    /// A `CartStore` was built outside a tokio runtime.
    #[error("CartStore must be created inside a tokio runtime")]
    NoRuntime,

    /// A config value is out of range or inconsistent.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// No platform config directory and no explicit path.
    #[error("No config path available")]
    NoConfigPath,

    /// Config file could not be read or written.
    #[error("Config file I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Config file is not valid TOML for `StoreConfig`.
    #[error("Config file parse error: {0}")]
    Parse(#[from] toml::de::Error),

    /// Config could not be rendered as TOML.
    #[error("Config serialization error: {0}")]
    Serialize(#[from] toml::ser::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_provider_message() {
        assert_eq!(
            ConfigurationError::MissingProvider.to_string(),
            "use_cart must be used within a CartProvider"
        );
    }

    #[test]
    fn test_db_error_is_transparent_in_storage_error() {
        let err: StorageError = DbError::PoolExhausted.into();
        assert_eq!(err.to_string(), "Connection pool exhausted");
    }

    #[test]
    fn test_pool_closed_maps_to_connection_failed() {
        let err: DbError = sqlx::Error::PoolClosed.into();
        assert!(matches!(err, DbError::ConnectionFailed(_)));
    }
}
