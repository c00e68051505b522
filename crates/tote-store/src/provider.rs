//! # Cart Provider
//!
//! Hands the session's cart to UI code as an explicit dependency.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Provider Wiring                                      │
//! │                                                                         │
//! │  composition root                                                      │
//! │  ────────────────                                                      │
//! │  let provider = CartProvider::new(storage, options)?;                  │
//! │  provider.mount().await;               ← loads '@cart' once            │
//! │  ctx.provide_cart(provider);           ← registered in AppContext      │
//! │                                                                         │
//! │  any component                                                         │
//! │  ─────────────                                                         │
//! │  let cart = use_cart(&ctx)?;           ← CartHandle (cheap clone)      │
//! │  cart.add_to_cart(item);                                               │
//! │                                                                         │
//! │  No provider registered ──► ConfigurationError::MissingProvider        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::watch;
use tracing::{debug, info};

use tote_core::{Cart, LineItem, NewLineItem};

use crate::error::ConfigurationError;
use crate::storage::KeyValueStorage;
use crate::store::{CartStore, CartStoreOptions, LoadOutcome};

// =============================================================================
// Cart Handle
// =============================================================================

/// The capability handle UI code works with.
///
/// Clones share the same store.
#[derive(Debug, Clone)]
pub struct CartHandle {
    store: Arc<CartStore>,
}

impl CartHandle {
    /// Current line items in cart order.
    pub fn products(&self) -> Vec<LineItem> {
        self.store.products()
    }

    /// Copy of the current cart.
    pub fn cart(&self) -> Cart {
        self.store.cart()
    }

    /// Receiver notified on every published cart.
    pub fn subscribe(&self) -> watch::Receiver<Cart> {
        self.store.subscribe()
    }

    pub fn add_to_cart(&self, item: NewLineItem) {
        self.store.add_to_cart(item);
    }

    pub fn increment(&self, id: &str) {
        self.store.increment(id);
    }

    pub fn decrement(&self, id: &str) {
        self.store.decrement(id);
    }

    pub fn clear(&self) {
        self.store.clear();
    }

    /// Waits for pending persistence writes.
    pub async fn flush(&self) {
        self.store.flush().await;
    }
}

// =============================================================================
// Cart Provider
// =============================================================================

/// Owns the one [`CartStore`] of a session.
#[derive(Debug, Clone)]
pub struct CartProvider {
    store: Arc<CartStore>,
}

impl CartProvider {
    /// Builds the session's store on the current tokio runtime.
    pub fn new(
        storage: Arc<dyn KeyValueStorage>,
        options: CartStoreOptions,
    ) -> Result<Self, ConfigurationError> {
        Ok(Self::from_store(CartStore::new(storage, options)?))
    }

    /// Wraps an existing store.
    pub fn from_store(store: CartStore) -> Self {
        CartProvider {
            store: Arc::new(store),
        }
    }

    /// Loads the stored cart. Safe to call more than once.
    pub async fn mount(&self) -> LoadOutcome {
        let outcome = self.store.initialize().await;
        info!(session = %self.store.session_id(), ?outcome, "Cart provider mounted");
        outcome
    }

    /// Returns a handle to the store.
    pub fn handle(&self) -> CartHandle {
        CartHandle {
            store: Arc::clone(&self.store),
        }
    }
}

// =============================================================================
// App Context
// =============================================================================

/// Registry of shared state, one value per type.
#[derive(Default)]
pub struct AppContext {
    states: HashMap<TypeId, Arc<dyn Any + Send + Sync>>,
}

impl std::fmt::Debug for AppContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppContext")
            .field("states", &self.states.len())
            .finish()
    }
}

impl AppContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `state`. Returns `false` (keeping the existing value) if a
    /// value of this type is already registered.
    pub fn manage<T>(&mut self, state: T) -> bool
    where
        T: Send + Sync + 'static,
    {
        let type_id = TypeId::of::<T>();
        if self.states.contains_key(&type_id) {
            debug!(state = std::any::type_name::<T>(), "State already managed");
            return false;
        }
        self.states.insert(type_id, Arc::new(state));
        true
    }

    /// Looks up the registered value of type `T`.
    pub fn state<T>(&self) -> Option<Arc<T>>
    where
        T: Send + Sync + 'static,
    {
        self.states
            .get(&TypeId::of::<T>())
            .cloned()
            .and_then(|state| state.downcast::<T>().ok())
    }

    /// Registers the session's cart provider.
    pub fn provide_cart(&mut self, provider: CartProvider) -> bool {
        self.manage(provider)
    }
}

/// Returns the cart handle registered in `ctx`.
///
/// ## Errors
/// [`ConfigurationError::MissingProvider`] if no [`CartProvider`] was
/// registered.
pub fn use_cart(ctx: &AppContext) -> Result<CartHandle, ConfigurationError> {
    ctx.state::<CartProvider>()
        .map(|provider| provider.handle())
        .ok_or(ConfigurationError::MissingProvider)
}
