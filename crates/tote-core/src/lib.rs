//! # tote-core: Pure Cart Logic for Tote
//!
//! This crate holds the cart data model and every cart transform as pure
//! functions with zero I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                          Tote Architecture                              │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                    Mobile UI (consumer)                         │   │
//! │  │      Product list ──► Cart badge ──► Cart screen (+ / -)        │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │ CartHandle                             │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │              tote-store (CartStore, storage backends)           │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ tote-core (THIS CRATE) ★                        │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐     ┌───────────┐     ┌───────────┐            │   │
//! │  │   │   types   │     │   cart    │     │ snapshot  │            │   │
//! │  │   │ LineItem  │     │   Cart    │     │ JSON slot │            │   │
//! │  │   │NewLineItem│     │ with_*()  │     │ codec     │            │   │
//! │  │   └───────────┘     └───────────┘     └───────────┘            │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO STORAGE • NO RUNTIME • PURE FUNCTIONS            │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - `LineItem` and `NewLineItem`
//! - [`cart`] - `Cart` and its immutable transforms
//! - [`snapshot`] - Encoding of a `Cart` for the persistent storage slot
//! - [`error`] - Domain error types
//!
//! ## Example Usage
//!
//! ```rust
//! use tote_core::{Cart, NewLineItem};
//!
//! let cart = Cart::new().with_added(NewLineItem::new("p1", "Tee", "img://tee", 10.0));
//! let cart = cart.with_incremented("p1");
//!
//! assert_eq!(cart.get("p1").map(|item| item.quantity), Some(2));
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod cart;
pub mod error;
pub mod snapshot;
pub mod types;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use cart::Cart;
pub use error::{SnapshotError, SnapshotResult};
pub use types::{LineItem, NewLineItem};

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Storage key of the cart snapshot slot.
///
/// Carts written by earlier releases of the mobile app live under this key,
/// so it must not change.
pub const CART_STORAGE_KEY: &str = "@cart";
