//! # Error Types
//!
//! Domain error types for tote-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  tote-core errors (this file)                                          │
//! │  └── SnapshotError      - Stored cart cannot be encoded/decoded         │
//! │                                                                         │
//! │  tote-store errors (separate crate)                                    │
//! │  ├── DbError            - SQLite operation failures                     │
//! │  ├── StorageError       - Key/value backend failures                    │
//! │  └── ConfigurationError - Missing provider, bad config                  │
//! │                                                                         │
//! │  Only ConfigurationError ever reaches a cart consumer. Snapshot and    │
//! │  storage errors are absorbed by the store (empty cart / log line).     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use thiserror::Error;

// =============================================================================
// Snapshot Error
// =============================================================================

/// Errors produced while moving a `Cart` in or out of its stored form.
#[derive(Debug, Error)]
pub enum SnapshotError {
    /// The stored value is not a JSON array of line items.
    ///
    /// ## When This Occurs
    /// - The slot was written by something other than the cart store
    /// - A field is missing or has the wrong type
    /// - The value was truncated
    #[error("Malformed cart snapshot: {0}")]
    Malformed(#[source] serde_json::Error),

    /// The stored value lists the same product id more than once.
    ///
    /// Loading it would break the one-entry-per-id rule, so the whole
    /// snapshot is rejected.
    #[error("Cart snapshot contains duplicate product id: {0}")]
    DuplicateId(String),

    /// The cart could not be serialized.
    #[error("Failed to encode cart snapshot: {0}")]
    Encode(#[source] serde_json::Error),
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for snapshot results.
pub type SnapshotResult<T> = Result<T, SnapshotError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duplicate_id_message() {
        let err = SnapshotError::DuplicateId("p1".to_string());
        assert_eq!(
            err.to_string(),
            "Cart snapshot contains duplicate product id: p1"
        );
    }

    #[test]
    fn test_malformed_message_carries_source() {
        let source = serde_json::from_str::<Vec<u8>>("{").unwrap_err();
        let err = SnapshotError::Malformed(source);
        assert!(err.to_string().starts_with("Malformed cart snapshot:"));
        assert!(std::error::Error::source(&err).is_some());
    }
}
