//! # Store Configuration
//!
//! Where the cart is stored and how it is persisted.
//!
//! ## Configuration Sources
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Configuration Priority                               │
//! │                                                                         │
//! │  1. Environment Variables (highest priority)                           │
//! │     TOTE_STORAGE_BACKEND=memory                                        │
//! │     TOTE_DB_PATH=/tmp/tote.db                                          │
//! │                                                                         │
//! │  2. TOML Config File                                                   │
//! │     ~/.config/cart/tote.toml (Linux)                                   │
//! │     ~/Library/Application Support/com.tote.cart/tote.toml (macOS)      │
//! │                                                                         │
//! │  3. Default Values (lowest priority)                                   │
//! │     SQLite in the app data directory, key '@cart', latest/sequenced    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Configuration File Format
//! ```toml
//! # tote.toml
//! [storage]
//! backend = "sqlite"          # sqlite | memory
//! database_path = "/var/lib/tote/tote.db"
//! cart_key = "@cart"
//!
//! [persistence]
//! mode = "latest"             # latest | lagging
//! ordering = "sequenced"      # sequenced | unordered
//! ```

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::{debug, info, warn};

use tote_core::CART_STORAGE_KEY;

use crate::error::ConfigurationError;
use crate::store::{CartStoreOptions, PersistMode, WriteOrdering};

const CONFIG_FILE_NAME: &str = "tote.toml";
const DATABASE_FILE_NAME: &str = "tote.db";

// =============================================================================
// Storage Settings
// =============================================================================

/// Which storage backend holds the cart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StorageBackend {
    /// SQLite file in the app data directory.
    #[default]
    Sqlite,

    /// Process memory; nothing survives a restart.
    Memory,
}

impl std::fmt::Display for StorageBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StorageBackend::Sqlite => write!(f, "sqlite"),
            StorageBackend::Memory => write!(f, "memory"),
        }
    }
}

impl std::str::FromStr for StorageBackend {
    type Err = ConfigurationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "sqlite" | "file" => Ok(StorageBackend::Sqlite),
            "memory" | "in_memory" => Ok(StorageBackend::Memory),
            other => Err(ConfigurationError::InvalidConfig(format!(
                "Unknown storage backend: '{}'. Valid options: sqlite, memory",
                other
            ))),
        }
    }
}

/// `[storage]` section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageSettings {
    /// Backend type.
    #[serde(default)]
    pub backend: StorageBackend,

    /// SQLite file. Defaults to `tote.db` in the platform data directory.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub database_path: Option<PathBuf>,

    /// Storage key of the cart slot.
    #[serde(default = "default_cart_key")]
    pub cart_key: String,
}

fn default_cart_key() -> String {
    CART_STORAGE_KEY.to_string()
}

impl Default for StorageSettings {
    fn default() -> Self {
        StorageSettings {
            backend: StorageBackend::default(),
            database_path: None,
            cart_key: default_cart_key(),
        }
    }
}

impl StorageSettings {
    /// Returns the configured database path, or the platform default.
    ///
    /// ## Platform-Specific Paths
    /// - **macOS**: `~/Library/Application Support/com.tote.cart/tote.db`
    /// - **Windows**: `%APPDATA%\tote\cart\data\tote.db`
    /// - **Linux**: `~/.local/share/cart/tote.db`
    ///
    /// Falls back to `./tote.db` when no home directory is known.
    pub fn database_path(&self) -> PathBuf {
        if let Some(path) = &self.database_path {
            return path.clone();
        }

        project_dirs()
            .map(|dirs| dirs.data_dir().join(DATABASE_FILE_NAME))
            .unwrap_or_else(|| PathBuf::from(DATABASE_FILE_NAME))
    }
}

// =============================================================================
// Persistence Settings
// =============================================================================

/// `[persistence]` section.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PersistenceSettings {
    /// Which snapshot a mutation writes.
    #[serde(default)]
    pub mode: PersistMode,

    /// How writes are ordered.
    #[serde(default)]
    pub ordering: WriteOrdering,
}

// =============================================================================
// Store Config
// =============================================================================

/// Complete store configuration.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Storage settings.
    #[serde(default)]
    pub storage: StorageSettings,

    /// Persistence settings.
    #[serde(default)]
    pub persistence: PersistenceSettings,
}

impl StoreConfig {
    /// Loads configuration from file, environment, and defaults.
    ///
    /// ## Load Order (later overrides earlier)
    /// 1. Default values
    /// 2. Config file (tote.toml)
    /// 3. Environment variables
    pub fn load(config_path: Option<PathBuf>) -> Result<Self, ConfigurationError> {
        let mut config = Self::default();

        if let Some(path) = config_path.or_else(Self::default_config_path) {
            if path.exists() {
                info!(?path, "Loading store config from file");
                let contents = std::fs::read_to_string(&path)?;
                config = toml::from_str(&contents)?;
            } else {
                debug!(?path, "Config file not found, using defaults");
            }
        }

        config.apply_env_overrides();
        config.validate()?;

        Ok(config)
    }

    /// Loads config or returns default if load fails.
    pub fn load_or_default(config_path: Option<PathBuf>) -> Self {
        Self::load(config_path).unwrap_or_else(|e| {
            warn!("Failed to load store config: {}. Using defaults.", e);
            Self::default()
        })
    }

    /// Saves configuration to file.
    pub fn save(&self, config_path: Option<PathBuf>) -> Result<(), ConfigurationError> {
        let path = config_path
            .or_else(Self::default_config_path)
            .ok_or(ConfigurationError::NoConfigPath)?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let contents = toml::to_string_pretty(self)?;
        std::fs::write(&path, contents)?;

        info!(?path, "Store config saved");
        Ok(())
    }

    /// Validates the configuration.
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        if self.storage.cart_key.trim().is_empty() {
            return Err(ConfigurationError::InvalidConfig(
                "storage.cart_key must not be empty".into(),
            ));
        }

        if let Some(path) = &self.storage.database_path {
            if path.as_os_str().is_empty() {
                return Err(ConfigurationError::InvalidConfig(
                    "storage.database_path must not be empty".into(),
                ));
            }
        }

        Ok(())
    }

    /// Applies `TOTE_*` environment variable overrides.
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides(|name| std::env::var(name).ok());
    }

    /// Applies overrides read through `lookup`. Unparseable values are
    /// logged and ignored.
    ///
    /// | Variable               | Field                    |
    /// |------------------------|--------------------------|
    /// | `TOTE_STORAGE_BACKEND` | `storage.backend`        |
    /// | `TOTE_DB_PATH`         | `storage.database_path`  |
    /// | `TOTE_CART_KEY`        | `storage.cart_key`       |
    /// | `TOTE_PERSIST_MODE`    | `persistence.mode`       |
    /// | `TOTE_WRITE_ORDERING`  | `persistence.ordering`   |
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(backend) = lookup("TOTE_STORAGE_BACKEND") {
            match backend.parse() {
                Ok(parsed) => {
                    debug!(backend = %backend, "Overriding storage backend from environment");
                    self.storage.backend = parsed;
                }
                Err(e) => warn!(error = %e, "Ignoring TOTE_STORAGE_BACKEND"),
            }
        }

        if let Some(path) = lookup("TOTE_DB_PATH") {
            debug!(path = %path, "Overriding database path from environment");
            self.storage.database_path = Some(PathBuf::from(path));
        }

        if let Some(key) = lookup("TOTE_CART_KEY") {
            debug!(key = %key, "Overriding cart key from environment");
            self.storage.cart_key = key;
        }

        if let Some(mode) = lookup("TOTE_PERSIST_MODE") {
            match mode.parse() {
                Ok(parsed) => self.persistence.mode = parsed,
                Err(e) => warn!(error = %e, "Ignoring TOTE_PERSIST_MODE"),
            }
        }

        if let Some(ordering) = lookup("TOTE_WRITE_ORDERING") {
            match ordering.parse() {
                Ok(parsed) => self.persistence.ordering = parsed,
                Err(e) => warn!(error = %e, "Ignoring TOTE_WRITE_ORDERING"),
            }
        }
    }

    /// Returns the default config file path.
    pub fn default_config_path() -> Option<PathBuf> {
        project_dirs().map(|dirs| dirs.config_dir().join(CONFIG_FILE_NAME))
    }

    /// Builds the options for a [`crate::CartStore`].
    pub fn store_options(&self) -> CartStoreOptions {
        CartStoreOptions::default()
            .key(self.storage.cart_key.clone())
            .persist_mode(self.persistence.mode)
            .write_ordering(self.persistence.ordering)
    }
}

fn project_dirs() -> Option<directories::ProjectDirs> {
    directories::ProjectDirs::from("com", "tote", "cart")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| vars.get(name).cloned()
    }

    #[test]
    fn test_default_config() {
        let config = StoreConfig::default();
        assert_eq!(config.storage.backend, StorageBackend::Sqlite);
        assert_eq!(config.storage.cart_key, "@cart");
        assert_eq!(config.persistence.mode, PersistMode::Latest);
        assert_eq!(config.persistence.ordering, WriteOrdering::Sequenced);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_backend_parsing() {
        assert_eq!("sqlite".parse::<StorageBackend>().unwrap(), StorageBackend::Sqlite);
        assert_eq!("Memory".parse::<StorageBackend>().unwrap(), StorageBackend::Memory);
        assert!("redis".parse::<StorageBackend>().is_err());
    }

    #[test]
    fn test_partial_toml_fills_defaults() {
        let config: StoreConfig = toml::from_str(
            r#"
            [persistence]
            mode = "lagging"
            "#,
        )
        .unwrap();

        assert_eq!(config.persistence.mode, PersistMode::Lagging);
        assert_eq!(config.persistence.ordering, WriteOrdering::Sequenced);
        assert_eq!(config.storage, StorageSettings::default());
    }

    #[test]
    fn test_toml_serialization() {
        let config = StoreConfig::default();
        let toml_str = toml::to_string_pretty(&config).unwrap();
        assert!(toml_str.contains("[storage]"));
        assert!(toml_str.contains("[persistence]"));
        assert!(toml_str.contains("backend = \"sqlite\""));
    }

    #[test]
    fn test_config_validation() {
        let mut config = StoreConfig::default();

        config.storage.cart_key = "  ".to_string();
        assert!(config.validate().is_err());

        config.storage.cart_key = "@cart".to_string();
        config.storage.database_path = Some(PathBuf::new());
        assert!(config.validate().is_err());

        config.storage.database_path = Some(PathBuf::from("/tmp/tote.db"));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_overrides() {
        let mut config = StoreConfig::default();
        config.apply_overrides(lookup_from(&[
            ("TOTE_STORAGE_BACKEND", "memory"),
            ("TOTE_DB_PATH", "/tmp/other.db"),
            ("TOTE_CART_KEY", "@cart-guest"),
            ("TOTE_PERSIST_MODE", "lagging"),
            ("TOTE_WRITE_ORDERING", "unordered"),
        ]));

        assert_eq!(config.storage.backend, StorageBackend::Memory);
        assert_eq!(config.storage.database_path(), PathBuf::from("/tmp/other.db"));
        assert_eq!(config.storage.cart_key, "@cart-guest");
        assert_eq!(config.persistence.mode, PersistMode::Lagging);
        assert_eq!(config.persistence.ordering, WriteOrdering::Unordered);
    }

    #[test]
    fn test_invalid_override_is_ignored() {
        let mut config = StoreConfig::default();
        config.apply_overrides(lookup_from(&[("TOTE_PERSIST_MODE", "eventually")]));
        assert_eq!(config.persistence.mode, PersistMode::Latest);
    }

    #[test]
    fn test_save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("conf").join("tote.toml");

        let mut config = StoreConfig::default();
        config.storage.backend = StorageBackend::Memory;
        config.persistence.ordering = WriteOrdering::Unordered;
        config.save(Some(path.clone())).unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        let loaded: StoreConfig = toml::from_str(&contents).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_load_rejects_malformed_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tote.toml");
        std::fs::write(&path, "[storage\nbackend = ").unwrap();

        let err = StoreConfig::load(Some(path)).unwrap_err();
        assert!(matches!(err, ConfigurationError::Parse(_)));
    }

    #[test]
    fn test_load_or_default_falls_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tote.toml");
        std::fs::write(&path, "[storage]\ncart_key = \"\"\n").unwrap();

        let config = StoreConfig::load_or_default(Some(path));
        assert_eq!(config.storage.cart_key, "@cart");
    }

    #[test]
    fn test_store_options() {
        let mut config = StoreConfig::default();
        config.storage.cart_key = "@cart-2".to_string();
        config.persistence.mode = PersistMode::Lagging;

        let options = config.store_options();
        assert_eq!(options.key, "@cart-2");
        assert_eq!(options.persist_mode, PersistMode::Lagging);
        assert_eq!(options.write_ordering, WriteOrdering::Sequenced);
    }
}
