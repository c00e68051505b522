//! # Key/Value Storage
//!
//! The device-local storage the cart is persisted to, seen as an opaque
//! asynchronous string map.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    KeyValueStorage                                      │
//! │                                                                         │
//! │  get(key)        → Option<String>     initialize() reads '@cart'       │
//! │  set(key, value) → ()                 every mutation writes '@cart'    │
//! │  remove(key)     → ()                 clear() drops '@cart'            │
//! │                                                                         │
//! │  ┌──────────────────┐            ┌──────────────────────────────┐      │
//! │  │  MemoryStorage   │            │  SqliteStorage               │      │
//! │  │  HashMap behind  │            │  key_value_store table       │      │
//! │  │  tokio RwLock    │            │  WAL, upsert on set          │      │
//! │  └──────────────────┘            └──────────────────────────────┘      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The store holds backends as `Arc<dyn KeyValueStorage>`, so the trait is
//! object safe through `async-trait`.

pub mod memory;
pub mod sqlite;

use std::sync::Arc;

use async_trait::async_trait;
use tracing::info;

use crate::config::{StorageBackend, StorageSettings};
use crate::error::StorageResult;

use self::memory::MemoryStorage;
use self::sqlite::{DbConfig, SqliteStorage};

/// Asynchronous string key/value storage.
#[async_trait]
pub trait KeyValueStorage: Send + Sync + std::fmt::Debug {
    /// Reads a value. `Ok(None)` when the key was never set or was removed.
    async fn get(&self, key: &str) -> StorageResult<Option<String>>;

    /// Inserts or overwrites a value.
    async fn set(&self, key: &str, value: &str) -> StorageResult<()>;

    /// Deletes a value. Succeeds when the key does not exist.
    async fn remove(&self, key: &str) -> StorageResult<()>;
}

/// Opens the backend described by `settings`.
///
/// ## Backends
/// - `memory`: fresh, empty map (nothing survives the process)
/// - `sqlite`: file at `settings.database_path`, migrations applied
pub async fn open(settings: &StorageSettings) -> StorageResult<Arc<dyn KeyValueStorage>> {
    match settings.backend {
        StorageBackend::Memory => {
            info!("Using in-memory cart storage");
            Ok(Arc::new(MemoryStorage::new()))
        }
        StorageBackend::Sqlite => {
            let path = settings.database_path();
            info!(path = %path.display(), "Using SQLite cart storage");
            let storage = SqliteStorage::open(DbConfig::new(path)).await?;
            Ok(Arc::new(storage))
        }
    }
}
