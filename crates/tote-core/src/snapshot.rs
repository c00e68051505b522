//! # Cart Snapshot Codec
//!
//! Converts a [`Cart`] to and from the string stored under
//! [`CART_STORAGE_KEY`](crate::CART_STORAGE_KEY).
//!
//! ## Format
//! ```text
//! [
//!   {"id":"p1","title":"Tee","image_url":"https://…","price":10,"quantity":2},
//!   {"id":"p7","title":"Mug","image_url":"https://…","price":4.5,"quantity":1}
//! ]
//! ```
//! Array order is cart order.

use crate::cart::Cart;
use crate::error::{SnapshotError, SnapshotResult};
use crate::types::LineItem;

/// Serializes the cart for storage.
pub fn encode(cart: &Cart) -> SnapshotResult<String> {
    serde_json::to_string(cart.items()).map_err(SnapshotError::Encode)
}

/// Parses a stored snapshot.
///
/// ## Errors
/// - [`SnapshotError::Malformed`] - not a JSON array of line items
/// - [`SnapshotError::DuplicateId`] - the same id appears twice
pub fn decode(raw: &str) -> SnapshotResult<Cart> {
    let items: Vec<LineItem> = serde_json::from_str(raw).map_err(SnapshotError::Malformed)?;
    Cart::from_items(items)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::NewLineItem;

    fn two_item_cart() -> Cart {
        Cart::new()
            .with_added(NewLineItem::new("p1", "Tee", "https://img/tee", 10.0))
            .with_added(NewLineItem::new("p2", "Mug", "https://img/mug", 4.5))
            .with_added(NewLineItem::new("p1", "Tee", "https://img/tee", 10.0))
    }

    #[test]
    fn test_round_trip() {
        let cart = two_item_cart().with_decremented("p2").with_decremented("p2");
        let decoded = decode(&encode(&cart).unwrap()).unwrap();
        assert_eq!(decoded, cart);
    }

    #[test]
    fn test_encode_is_a_plain_array() {
        let encoded = encode(&two_item_cart()).unwrap();
        let value: serde_json::Value = serde_json::from_str(&encoded).unwrap();

        let array = value.as_array().unwrap();
        assert_eq!(array.len(), 2);
        assert_eq!(array[0]["id"], "p1");
        assert_eq!(array[0]["quantity"], 2);
        assert_eq!(array[1]["image_url"], "https://img/mug");
    }

    #[test]
    fn test_encode_empty() {
        assert_eq!(encode(&Cart::new()).unwrap(), "[]");
    }

    #[test]
    fn test_decode_preserves_order() {
        let raw = r#"[
            {"id":"z","title":"Z","image_url":"u","price":1,"quantity":1},
            {"id":"a","title":"A","image_url":"u","price":2.25,"quantity":5}
        ]"#;
        let cart = decode(raw).unwrap();

        let ids: Vec<&str> = cart.iter().map(|i| i.id.as_str()).collect();
        assert_eq!(ids, vec!["z", "a"]);
        assert_eq!(cart.get("a").unwrap().price, 2.25);
    }

    #[test]
    fn test_decode_rejects_garbage() {
        assert!(matches!(decode("not json"), Err(SnapshotError::Malformed(_))));
        assert!(matches!(decode("{}"), Err(SnapshotError::Malformed(_))));
        assert!(matches!(
            decode(r#"[{"id":"p1"}]"#),
            Err(SnapshotError::Malformed(_))
        ));
    }

    #[test]
    fn test_decode_rejects_duplicate_ids() {
        let raw = r#"[
            {"id":"p1","title":"T","image_url":"u","price":1,"quantity":1},
            {"id":"p1","title":"T","image_url":"u","price":1,"quantity":2}
        ]"#;
        assert!(matches!(decode(raw), Err(SnapshotError::DuplicateId(_))));
    }

    #[test]
    fn test_encode_rejects_non_finite_price() {
        let cart = Cart::new().with_added(NewLineItem::new("p1", "T", "u", f64::NAN));
        // serde_json writes NaN as null
        match encode(&cart) {
            Ok(raw) => assert!(decode(&raw).is_err()),
            Err(err) => assert!(matches!(err, SnapshotError::Encode(_))),
        }
    }
}
