//! # tote-store: Cart Store and Storage Layer for Tote
//!
//! This crate owns everything around the cart that touches the outside
//! world: the key/value storage backends, the persistence pipeline, and the
//! provider that hands a capability handle to UI code.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                          Tote Data Flow                                 │
//! │                                                                         │
//! │  UI component                                                          │
//! │       │ use_cart(&ctx)?                                                │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                    tote-store (THIS CRATE)                      │   │
//! │  │                                                                 │   │
//! │  │   ┌──────────────┐    ┌──────────────┐    ┌──────────────────┐ │   │
//! │  │   │ CartProvider │    │  CartStore   │    │  PersistWriter   │ │   │
//! │  │   │ AppContext   │───►│ watch<Cart>  │───►│ sequenced or     │ │   │
//! │  │   │ CartHandle   │    │ initialize() │    │ unordered writes │ │   │
//! │  │   └──────────────┘    └──────────────┘    └────────┬─────────┘ │   │
//! │  │                                                    │           │   │
//! │  │                              ┌─────────────────────▼─────────┐ │   │
//! │  │                              │ dyn KeyValueStorage           │ │   │
//! │  │                              │ MemoryStorage | SqliteStorage │ │   │
//! │  │                              └───────────────────────────────┘ │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`store`] - `CartStore`: published state + persistence
//! - [`provider`] - `CartProvider`, `CartHandle`, `AppContext`, `use_cart`
//! - [`storage`] - `KeyValueStorage` trait and backends
//! - [`config`] - `StoreConfig` (TOML file + environment)
//! - [`error`] - Error types
//!
//! ## Usage
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use tote_store::{use_cart, AppContext, CartProvider, CartStoreOptions, MemoryStorage};
//!
//! let provider = CartProvider::new(Arc::new(MemoryStorage::new()), CartStoreOptions::default())?;
//! provider.mount().await;
//!
//! let mut ctx = AppContext::new();
//! ctx.provide_cart(provider);
//!
//! let cart = use_cart(&ctx)?;
//! cart.add_to_cart(NewLineItem::new("p1", "Tee", "https://img/tee", 10.0));
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod config;
pub mod error;
pub mod provider;
pub mod storage;
pub mod store;
mod writer;

// =============================================================================
// Re-exports
// =============================================================================

pub use config::{PersistenceSettings, StorageBackend, StorageSettings, StoreConfig};
pub use error::{ConfigurationError, DbError, DbResult, StorageError, StorageResult};
pub use provider::{use_cart, AppContext, CartHandle, CartProvider};
pub use storage::memory::MemoryStorage;
pub use storage::sqlite::{DbConfig, SqliteStorage};
pub use storage::KeyValueStorage;
pub use store::{CartStore, CartStoreOptions, LoadOutcome, PersistMode, WriteOrdering};

pub use tote_core::{Cart, LineItem, NewLineItem, CART_STORAGE_KEY};
