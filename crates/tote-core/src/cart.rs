//! # Cart
//!
//! The ordered list of line items and the three transforms the UI drives.
//!
//! ## Transforms Are Values
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Cart Transforms                                      │
//! │                                                                         │
//! │  UI Action              Transform                 Result               │
//! │  ─────────              ─────────                 ──────               │
//! │                                                                         │
//! │  Tap "Add" ───────────► with_added(item) ──────► new Cart              │
//! │                          known id: qty + 1, same position              │
//! │                          new id:   push, qty = 1                       │
//! │                                                                         │
//! │  Tap "+" ─────────────► with_incremented(id) ──► new Cart              │
//! │  Tap "-" ─────────────► with_decremented(id) ──► new Cart              │
//! │                          unknown id: value-equal copy                  │
//! │                                                                         │
//! │  The receiver is never modified. A previously published Cart that a   │
//! │  subscriber still holds keeps its quantities.                          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Invariants
//! - At most one item per `id`
//! - Items stay in first-added order
//! - `quantity` has no floor; decrementing past zero is allowed

use serde::{Deserialize, Serialize};

use crate::error::{SnapshotError, SnapshotResult};
use crate::types::{LineItem, NewLineItem};

/// The shopping cart.
///
/// Serializes as a bare JSON array of [`LineItem`] records.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Cart {
    items: Vec<LineItem>,
}

impl Cart {
    /// Creates a new empty cart.
    pub fn new() -> Self {
        Cart { items: Vec::new() }
    }

    /// Builds a cart from an ordered list, rejecting repeated ids.
    pub fn from_items(items: Vec<LineItem>) -> SnapshotResult<Self> {
        for (index, item) in items.iter().enumerate() {
            if items[..index].iter().any(|earlier| earlier.id == item.id) {
                return Err(SnapshotError::DuplicateId(item.id.clone()));
            }
        }
        Ok(Cart { items })
    }

    // =========================================================================
    // Transforms
    // =========================================================================

    /// Adds one unit of `item`.
    ///
    /// ## Behavior
    /// - Already in cart: quantity + 1, position unchanged
    /// - Not in cart: appended with quantity 1
    #[must_use]
    pub fn with_added(&self, item: NewLineItem) -> Cart {
        if self.contains(&item.id) {
            return self.with_delta(&item.id, 1);
        }

        let mut items = self.items.clone();
        items.push(LineItem::from_new(item, 1));
        Cart { items }
    }

    /// Adds one unit to the entry with `id`. Unknown ids leave the cart as is.
    #[must_use]
    pub fn with_incremented(&self, id: &str) -> Cart {
        self.with_delta(id, 1)
    }

    /// Removes one unit from the entry with `id`. Unknown ids leave the cart
    /// as is. The quantity may go to zero and below.
    #[must_use]
    pub fn with_decremented(&self, id: &str) -> Cart {
        self.with_delta(id, -1)
    }

    fn with_delta(&self, id: &str, delta: i64) -> Cart {
        let items = self
            .items
            .iter()
            .map(|item| {
                if item.id == id {
                    item.with_quantity_delta(delta)
                } else {
                    item.clone()
                }
            })
            .collect();
        Cart { items }
    }

    // =========================================================================
    // Read Access
    // =========================================================================

    /// Returns the items in cart order.
    pub fn items(&self) -> &[LineItem] {
        &self.items
    }

    /// Iterates over the items in cart order.
    pub fn iter(&self) -> std::slice::Iter<'_, LineItem> {
        self.items.iter()
    }

    /// Looks up an entry by product id.
    pub fn get(&self, id: &str) -> Option<&LineItem> {
        self.items.iter().find(|item| item.id == id)
    }

    /// Checks whether the product is in the cart.
    pub fn contains(&self, id: &str) -> bool {
        self.get(id).is_some()
    }

    /// Returns the number of distinct products.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Checks if the cart is empty.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Sum of all quantities (badge count), saturating at the `i64` bounds.
    /// Negative entries subtract.
    pub fn total_quantity(&self) -> i64 {
        self.items
            .iter()
            .fold(0i64, |total, item| total.saturating_add(item.quantity))
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
