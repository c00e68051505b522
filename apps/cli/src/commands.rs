//! Cart commands run by the `tote` binary.

use clap::Subcommand;
use tracing::info;

use tote_core::{Cart, NewLineItem};
use tote_store::CartHandle;

#[derive(Debug, Clone, PartialEq, Subcommand)]
pub enum CartCommand {
    /// Print the current cart
    Show,

    /// Add one unit of a product (appends it if new)
    Add {
        /// Product id
        #[arg(long)]
        id: String,

        /// Display title
        #[arg(long)]
        title: String,

        /// Image URL
        #[arg(long)]
        image_url: String,

        /// Unit price
        #[arg(long)]
        price: f64,
    },

    /// Add one unit to an existing entry
    Increment {
        /// Product id
        id: String,
    },

    /// Remove one unit from an existing entry
    Decrement {
        /// Product id
        id: String,
    },

    /// Empty the cart and remove it from storage
    Clear,
}

/// Runs `command` against `cart`, waits for persistence, and returns the
/// resulting cart.
pub async fn execute(cart: &CartHandle, command: CartCommand) -> Cart {
    match command {
        CartCommand::Show => {}
        CartCommand::Add {
            id,
            title,
            image_url,
            price,
        } => {
            info!(id = %id, "Adding product to cart");
            cart.add_to_cart(NewLineItem::new(id, title, image_url, price));
        }
        CartCommand::Increment { id } => cart.increment(&id),
        CartCommand::Decrement { id } => cart.decrement(&id),
        CartCommand::Clear => cart.clear(),
    }

    cart.flush().await;
    cart.cart()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use tote_store::{
        use_cart, AppContext, CartProvider, CartStoreOptions, DbConfig, KeyValueStorage,
        SqliteStorage, CART_STORAGE_KEY,
    };

    fn add(id: &str) -> CartCommand {
        CartCommand::Add {
            id: id.to_string(),
            title: "Tee".to_string(),
            image_url: "https://img/tee".to_string(),
            price: 12.5,
        }
    }

    async fn mounted(storage: Arc<dyn KeyValueStorage>) -> CartHandle {
        let provider = CartProvider::new(storage, CartStoreOptions::default()).unwrap();
        provider.mount().await;

        let mut ctx = AppContext::new();
        ctx.provide_cart(provider);
        use_cart(&ctx).unwrap()
    }

    #[tokio::test]
    async fn test_commands_persist_across_invocations() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tote.db");

        let storage = Arc::new(SqliteStorage::open(DbConfig::new(&path)).await.unwrap());
        let cart = mounted(storage.clone()).await;
        execute(&cart, add("p1")).await;
        execute(&cart, add("p2")).await;
        let after = execute(&cart, CartCommand::Decrement { id: "p1".into() }).await;
        storage.close().await;

        let reopened = Arc::new(SqliteStorage::open(DbConfig::new(&path)).await.unwrap());
        let cart = mounted(reopened).await;
        let shown = execute(&cart, CartCommand::Show).await;

        assert_eq!(shown, after);
        assert_eq!(shown.get("p1").map(|item| item.quantity), Some(0));
        assert_eq!(shown.get("p2").map(|item| item.quantity), Some(1));
    }

    #[tokio::test]
    async fn test_clear_removes_stored_cart() {
        let storage = Arc::new(SqliteStorage::open(DbConfig::in_memory()).await.unwrap());
        let cart = mounted(storage.clone()).await;

        execute(&cart, add("p1")).await;
        let cleared = execute(&cart, CartCommand::Clear).await;

        assert!(cleared.is_empty());
        assert_eq!(storage.get(CART_STORAGE_KEY).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_increment_unknown_id_changes_nothing() {
        let storage = Arc::new(SqliteStorage::open(DbConfig::in_memory()).await.unwrap());
        let cart = mounted(storage).await;

        let before = execute(&cart, add("p1")).await;
        let after = execute(&cart, CartCommand::Increment { id: "ghost".into() }).await;

        assert_eq!(before, after);
    }
}
