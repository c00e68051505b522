//! # Domain Types
//!
//! The two record types that flow between the product catalog, the cart and
//! the UI.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐                    ┌─────────────────┐            │
//! │  │  NewLineItem    │   add_to_cart()    │    LineItem     │            │
//! │  │  ─────────────  │ ─────────────────► │  ─────────────  │            │
//! │  │  id             │                    │  id             │            │
//! │  │  title          │                    │  title          │            │
//! │  │  image_url      │                    │  image_url      │            │
//! │  │  price          │                    │  price          │            │
//! │  └─────────────────┘                    │  quantity       │            │
//! │   (from catalog)                        └─────────────────┘            │
//! │                                          (owned by the Cart)            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Identity
//! `id` is an opaque string handed over by the catalog. The cart never
//! inspects it beyond equality.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

// =============================================================================
// Line Item
// =============================================================================

/// One entry in the cart.
///
/// The display fields are a copy of what the catalog supplied when the
/// product was first added; later adds of the same id only bump `quantity`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct LineItem {
    /// Product identifier, unique within a cart.
    pub id: String,

    /// Display title.
    pub title: String,

    /// Reference to the display image.
    ///
    /// Older snapshots spelled this `imageUrl`; both spellings load.
    #[serde(alias = "imageUrl")]
    pub image_url: String,

    /// Unit price as supplied by the catalog. Carried, never computed with.
    pub price: f64,

    /// Number of units. Not bounded below.
    #[ts(type = "number")]
    pub quantity: i64,
}

impl LineItem {
    /// Builds a cart entry from catalog data with the given quantity.
    pub fn from_new(item: NewLineItem, quantity: i64) -> Self {
        LineItem {
            id: item.id,
            title: item.title,
            image_url: item.image_url,
            price: item.price,
            quantity,
        }
    }

    /// Returns a copy with `quantity` shifted by `delta`, saturating at the
    /// `i64` bounds.
    #[must_use]
    pub fn with_quantity_delta(&self, delta: i64) -> Self {
        LineItem {
            quantity: self.quantity.saturating_add(delta),
            ..self.clone()
        }
    }
}

// =============================================================================
// New Line Item
// =============================================================================

/// A product as handed to `add_to_cart`: everything but the quantity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct NewLineItem {
    pub id: String,
    pub title: String,
    #[serde(alias = "imageUrl")]
    pub image_url: String,
    pub price: f64,
}

impl NewLineItem {
    /// Convenience constructor.
    pub fn new(
        id: impl Into<String>,
        title: impl Into<String>,
        image_url: impl Into<String>,
        price: f64,
    ) -> Self {
        NewLineItem {
            id: id.into(),
            title: title.into(),
            image_url: image_url.into(),
            price,
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_new_sets_quantity() {
        let item = LineItem::from_new(NewLineItem::new("p1", "T", "u", 10.0), 1);
        assert_eq!(item.id, "p1");
        assert_eq!(item.quantity, 1);
        assert_eq!(item.price, 10.0);
    }

    #[test]
    fn test_quantity_delta_leaves_original_untouched() {
        let item = LineItem::from_new(NewLineItem::new("p1", "T", "u", 10.0), 1);
        let bumped = item.with_quantity_delta(-3);

        assert_eq!(item.quantity, 1);
        assert_eq!(bumped.quantity, -2);
        assert_eq!(bumped.title, item.title);
    }

    #[test]
    fn test_quantity_delta_saturates_at_bounds() {
        let top = LineItem::from_new(NewLineItem::new("p1", "T", "u", 1.0), i64::MAX);
        assert_eq!(top.with_quantity_delta(1).quantity, i64::MAX);

        let bottom = LineItem::from_new(NewLineItem::new("p1", "T", "u", 1.0), i64::MIN);
        assert_eq!(bottom.with_quantity_delta(-1).quantity, i64::MIN);
    }

    #[test]
    fn test_line_item_field_names() {
        let item = LineItem::from_new(NewLineItem::new("p1", "T", "u", 10.0), 2);
        let json = serde_json::to_value(&item).unwrap();

        assert_eq!(json["image_url"], "u");
        assert_eq!(json["quantity"], 2);
    }

    #[test]
    fn test_camel_case_image_url_accepted() {
        let item: LineItem = serde_json::from_str(
            r#"{"id":"p1","title":"T","imageUrl":"u","price":9.5,"quantity":3}"#,
        )
        .unwrap();
        assert_eq!(item.image_url, "u");
        assert_eq!(item.quantity, 3);
    }
}
