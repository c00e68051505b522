//! # Cart Store
//!
//! The single source of truth for the cart during an app session.
//!
//! ## Operations Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    CartStore Operations                                 │
//! │                                                                         │
//! │  Mount ───────────► initialize() ──► storage.get('@cart')               │
//! │                                      ├─ decodes: publish it             │
//! │                                      └─ absent / bad: stay empty        │
//! │                                                                         │
//! │  Tap "Add" ───────► add_to_cart(item) ─┐                                │
//! │  Tap "+" ─────────► increment(id) ─────┼─► 1. next = cart.with_*(..)    │
//! │  Tap "-" ─────────► decrement(id) ─────┘   2. publish next (watch)      │
//! │                                            3. writer.set(snapshot)      │
//! │                                               (returns immediately)     │
//! │                                                                         │
//! │  Steps 1 and 2 happen under the watch channel's lock, so concurrent    │
//! │  callers never compute from a stale cart. Step 3 never blocks and      │
//! │  never fails the caller.                                               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Which Snapshot Is Persisted
//! [`PersistMode::Latest`] writes the cart that was just published.
//! [`PersistMode::Lagging`] writes the cart as it was *before* the mutation,
//! which leaves storage one mutation behind memory. Lagging keeps that
//! off-by-one write as a selectable mode; it is a pre-mutation snapshot, not
//! a byte-for-byte replay of earlier app releases.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::runtime::Handle;
use tokio::sync::watch;
use tracing::{debug, info, warn};
use uuid::Uuid;

use tote_core::{snapshot, Cart, LineItem, NewLineItem, CART_STORAGE_KEY};

use crate::error::ConfigurationError;
use crate::storage::KeyValueStorage;
use crate::writer::PersistWriter;

// =============================================================================
// Options
// =============================================================================

/// Which cart value a mutation writes to storage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PersistMode {
    /// Persist the cart produced by the mutation.
    #[default]
    Latest,

    /// Persist the cart as it was before the mutation.
    Lagging,
}

impl std::fmt::Display for PersistMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PersistMode::Latest => write!(f, "latest"),
            PersistMode::Lagging => write!(f, "lagging"),
        }
    }
}

impl std::str::FromStr for PersistMode {
    type Err = ConfigurationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "latest" => Ok(PersistMode::Latest),
            "lagging" | "previous" => Ok(PersistMode::Lagging),
            other => Err(ConfigurationError::InvalidConfig(format!(
                "Unknown persist mode: '{}'. Valid options: latest, lagging",
                other
            ))),
        }
    }
}

/// How persistence writes are ordered relative to each other.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WriteOrdering {
    /// Single writer; writes land in the order they were issued.
    #[default]
    Sequenced,

    /// Independent writes; the last to finish wins.
    Unordered,
}

impl std::fmt::Display for WriteOrdering {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            WriteOrdering::Sequenced => write!(f, "sequenced"),
            WriteOrdering::Unordered => write!(f, "unordered"),
        }
    }
}

impl std::str::FromStr for WriteOrdering {
    type Err = ConfigurationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "sequenced" | "serial" => Ok(WriteOrdering::Sequenced),
            "unordered" | "concurrent" => Ok(WriteOrdering::Unordered),
            other => Err(ConfigurationError::InvalidConfig(format!(
                "Unknown write ordering: '{}'. Valid options: sequenced, unordered",
                other
            ))),
        }
    }
}

/// Construction options for a [`CartStore`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CartStoreOptions {
    /// Storage key of the cart slot.
    pub key: String,

    /// Which snapshot a mutation persists.
    pub persist_mode: PersistMode,

    /// How writes are ordered.
    pub write_ordering: WriteOrdering,
}

impl Default for CartStoreOptions {
    fn default() -> Self {
        CartStoreOptions {
            key: CART_STORAGE_KEY.to_string(),
            persist_mode: PersistMode::default(),
            write_ordering: WriteOrdering::default(),
        }
    }
}

impl CartStoreOptions {
    /// Sets the storage key.
    pub fn key(mut self, key: impl Into<String>) -> Self {
        self.key = key.into();
        self
    }

    /// Sets the persist mode.
    pub fn persist_mode(mut self, mode: PersistMode) -> Self {
        self.persist_mode = mode;
        self
    }

    /// Sets the write ordering.
    pub fn write_ordering(mut self, ordering: WriteOrdering) -> Self {
        self.write_ordering = ordering;
        self
    }
}

// =============================================================================
// Load Outcome
// =============================================================================

/// What `initialize` found in storage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    /// A stored cart with this many entries was published.
    Restored(usize),

    /// Nothing was stored.
    Empty,

    /// The stored value could not be read or decoded; the cart stays empty.
    Discarded,

    /// `initialize` had already run for this store.
    AlreadyInitialized,
}

// =============================================================================
// Cart Store
// =============================================================================

/// In-memory cart published through a watch channel and mirrored to one
/// storage slot.
#[derive(Debug)]
pub struct CartStore {
    session_id: Uuid,
    state: watch::Sender<Cart>,
    storage: Arc<dyn KeyValueStorage>,
    writer: PersistWriter,
    options: CartStoreOptions,
    initialized: AtomicBool,
}

impl CartStore {
    /// Creates a store with an empty cart on the current tokio runtime.
    ///
    /// ## Errors
    /// [`ConfigurationError::NoRuntime`] when called outside a runtime.
    pub fn new(
        storage: Arc<dyn KeyValueStorage>,
        options: CartStoreOptions,
    ) -> Result<Self, ConfigurationError> {
        let runtime = Handle::try_current().map_err(|_| ConfigurationError::NoRuntime)?;
        Ok(Self::with_runtime(storage, options, runtime))
    }

    /// Creates a store whose persistence runs on `runtime`.
    ///
    /// Mutations may then be called from threads outside the runtime
    /// (a UI thread, for instance).
    pub fn with_runtime(
        storage: Arc<dyn KeyValueStorage>,
        options: CartStoreOptions,
        runtime: Handle,
    ) -> Self {
        let session_id = Uuid::new_v4();
        let writer = PersistWriter::spawn(
            Arc::clone(&storage),
            options.key.clone(),
            session_id,
            options.write_ordering,
            runtime,
        );

        info!(
            session = %session_id,
            key = %options.key,
            persist_mode = %options.persist_mode,
            write_ordering = %options.write_ordering,
            "Cart store created"
        );

        CartStore {
            session_id,
            state: watch::Sender::new(Cart::new()),
            storage,
            writer,
            options,
            initialized: AtomicBool::new(false),
        }
    }

    /// Loads the stored cart, once per store.
    ///
    /// ## Behavior
    /// - Stored value decodes: it replaces the current cart and is published
    /// - Nothing stored, read failure, or bad data: the cart is left as is
    /// - Second and later calls: no-op
    ///
    /// Never fails. Until this resolves, readers see an empty cart.
    pub async fn initialize(&self) -> LoadOutcome {
        if self.initialized.swap(true, Ordering::SeqCst) {
            debug!(session = %self.session_id, "Cart store already initialized");
            return LoadOutcome::AlreadyInitialized;
        }

        let raw = match self.storage.get(&self.options.key).await {
            Ok(Some(raw)) => raw,
            Ok(None) => {
                debug!(session = %self.session_id, key = %self.options.key, "No stored cart");
                return LoadOutcome::Empty;
            }
            Err(e) => {
                warn!(session = %self.session_id, error = %e, "Failed to read stored cart");
                return LoadOutcome::Discarded;
            }
        };

        match snapshot::decode(&raw) {
            Ok(cart) => {
                let count = cart.len();
                self.state.send_replace(cart);
                info!(session = %self.session_id, items = count, "Restored stored cart");
                LoadOutcome::Restored(count)
            }
            Err(e) => {
                warn!(session = %self.session_id, error = %e, "Ignoring unreadable stored cart");
                LoadOutcome::Discarded
            }
        }
    }

    // =========================================================================
    // Mutations
    // =========================================================================

    /// Adds one unit of `item` (appends it with quantity 1 if new).
    pub fn add_to_cart(&self, item: NewLineItem) {
        debug!(session = %self.session_id, id = %item.id, "add_to_cart");
        self.mutate(|cart| cart.with_added(item));
    }

    /// Adds one unit to the entry with `id`; unknown ids change nothing.
    pub fn increment(&self, id: &str) {
        debug!(session = %self.session_id, id = %id, "increment");
        self.mutate(|cart| cart.with_incremented(id));
    }

    /// Removes one unit from the entry with `id`; unknown ids change nothing.
    /// Quantities may drop to zero and below.
    pub fn decrement(&self, id: &str) {
        debug!(session = %self.session_id, id = %id, "decrement");
        self.mutate(|cart| cart.with_decremented(id));
    }

    /// Empties the cart and removes the storage slot.
    pub fn clear(&self) {
        debug!(session = %self.session_id, "clear");
        self.state.send_replace(Cart::new());
        self.writer.remove();
    }

    fn mutate<F>(&self, transform: F)
    where
        F: FnOnce(&Cart) -> Cart,
    {
        let mode = self.options.persist_mode;
        let mut to_persist = None;

        self.state.send_modify(|cart| {
            let next = transform(cart);
            let previous = std::mem::replace(cart, next);
            to_persist = Some(match mode {
                PersistMode::Latest => snapshot::encode(cart),
                PersistMode::Lagging => snapshot::encode(&previous),
            });
        });

        match to_persist {
            Some(Ok(encoded)) => self.writer.set(encoded),
            Some(Err(e)) => warn!(session = %self.session_id, error = %e, "Failed to encode cart"),
            None => {}
        }
    }

    // =========================================================================
    // Read Access
    // =========================================================================

    /// Returns the current line items in cart order.
    pub fn products(&self) -> Vec<LineItem> {
        self.state.borrow().items().to_vec()
    }

    /// Returns a copy of the current cart.
    pub fn cart(&self) -> Cart {
        self.state.borrow().clone()
    }

    /// Subscribes to published carts. The receiver starts at the current one.
    pub fn subscribe(&self) -> watch::Receiver<Cart> {
        self.state.subscribe()
    }

    /// Waits for every persistence write issued so far to finish.
    pub async fn flush(&self) {
        self.writer.flush().await;
    }

    /// Returns this store's session id (also on every log line).
    pub fn session_id(&self) -> Uuid {
        self.session_id
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
