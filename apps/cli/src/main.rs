//! # Tote CLI
//!
//! Runs one cart operation against the device's stored cart and prints the
//! result as JSON.
//!
//! ```bash
//! tote add --id p1 --title "Tee" --image-url https://img/tee --price 10
//! tote increment p1
//! tote decrement p1
//! tote show
//! tote --db /tmp/tote.db clear
//! ```
//!
//! ## Startup Sequence
//! 1. Initialize tracing (stderr, `RUST_LOG`)
//! 2. Load `tote.toml` and `TOTE_*` overrides
//! 3. Open the storage backend
//! 4. Mount the cart provider and register it in the app context
//! 5. Run the command, flush persistence, print the cart

use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use tote_store::{storage, use_cart, AppContext, CartProvider, StorageBackend, StoreConfig};

mod commands;

use commands::CartCommand;

#[derive(Debug, Parser)]
#[command(name = "tote")]
#[command(version, about = "Inspect and edit the persisted shopping cart")]
struct Cli {
    /// Config file (defaults to tote.toml in the platform config directory)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// SQLite database file; implies the sqlite backend
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    #[command(subcommand)]
    command: CartCommand,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let cli = Cli::parse();

    let mut config = StoreConfig::load(cli.config).context("Failed to load configuration")?;
    if let Some(db) = cli.db {
        config.storage.backend = StorageBackend::Sqlite;
        config.storage.database_path = Some(db);
    }

    let storage = storage::open(&config.storage)
        .await
        .context("Failed to open cart storage")?;

    let provider = CartProvider::new(storage, config.store_options())?;
    provider.mount().await;

    let mut ctx = AppContext::new();
    ctx.provide_cart(provider);

    let cart = use_cart(&ctx)?;
    let result = commands::execute(&cart, cli.command).await;

    info!(items = result.len(), "Command finished");
    println!("{}", serde_json::to_string_pretty(&result)?);

    Ok(())
}

/// Initializes the tracing subscriber. Logs go to stderr so stdout stays
/// parseable JSON.
///
/// ## Log Levels
/// - `RUST_LOG=debug` - Show debug messages
/// - `RUST_LOG=tote_store=trace` - Trace the store only
/// - Default: `info,tote=debug,sqlx=warn`
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,tote=debug,sqlx=warn"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
