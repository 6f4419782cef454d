//! # Shopdesk Configuration
//!
//! ## Configuration Sources
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Configuration Priority                               │
//! │                                                                         │
//! │  1. Environment Variables (highest priority)                           │
//! │     SHOPDESK_DB_PATH=/var/lib/shopdesk/shop.db                         │
//! │     SHOPDESK_WALK_IN_PARTY_ID=...                                      │
//! │                                                                         │
//! │  2. TOML Config File                                                   │
//! │     ~/.config/shopdesk/shopdesk.toml (Linux)                           │
//! │     ~/Library/Application Support/in.shopdesk.shopdesk/... (macOS)     │
//! │                                                                         │
//! │  3. Default Values (lowest priority)                                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Configuration File Format
//! ```toml
//! [database]
//! path = "shopdesk.db"
//! max_connections = 5
//! busy_timeout_ms = 5000
//!
//! [settlement]
//! walk_in_party_id = "00000000-0000-0000-0000-000000000001"
//! sale_prefix = "INV"
//! purchase_prefix = "PINV"
//! timeout_ms = 10000
//! strict_stock = false
//! ```

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info};

use shopdesk_core::InvoiceKind;

use crate::pool::DbConfig;

/// Party every cash sale is booked against unless configured otherwise.
pub const DEFAULT_WALK_IN_PARTY_ID: &str = "00000000-0000-0000-0000-000000000001";

/// Configuration error types.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid value for {0}")]
    InvalidValue(String),

    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),
}

// =============================================================================
// Database Settings
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseSettings {
    /// Path to the SQLite database file.
    #[serde(default = "default_db_path")]
    pub path: PathBuf,

    #[serde(default = "default_max_connections")]
    pub max_connections: u32,

    /// How long a connection waits for another writer's lock.
    #[serde(default = "default_busy_timeout")]
    pub busy_timeout_ms: u64,
}

fn default_db_path() -> PathBuf {
    PathBuf::from("shopdesk.db")
}

fn default_max_connections() -> u32 {
    5
}

fn default_busy_timeout() -> u64 {
    5_000
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        DatabaseSettings {
            path: default_db_path(),
            max_connections: default_max_connections(),
            busy_timeout_ms: default_busy_timeout(),
        }
    }
}

// =============================================================================
// Settlement Settings
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SettlementSettings {
    /// Party that cash (walk-in) invoices are booked against.
    #[serde(default = "default_walk_in_party_id")]
    pub walk_in_party_id: String,

    #[serde(default = "default_sale_prefix")]
    pub sale_prefix: String,

    #[serde(default = "default_purchase_prefix")]
    pub purchase_prefix: String,

    /// Upper bound on one settlement, lock waits included.
    #[serde(default = "default_settlement_timeout")]
    pub timeout_ms: u64,

    /// Reject sales that would drive tracked stock below zero.
    #[serde(default)]
    pub strict_stock: bool,
}

fn default_walk_in_party_id() -> String {
    DEFAULT_WALK_IN_PARTY_ID.to_string()
}

fn default_sale_prefix() -> String {
    InvoiceKind::Sale.default_prefix().to_string()
}

fn default_purchase_prefix() -> String {
    InvoiceKind::Purchase.default_prefix().to_string()
}

fn default_settlement_timeout() -> u64 {
    10_000
}

impl Default for SettlementSettings {
    fn default() -> Self {
        SettlementSettings {
            walk_in_party_id: default_walk_in_party_id(),
            sale_prefix: default_sale_prefix(),
            purchase_prefix: default_purchase_prefix(),
            timeout_ms: default_settlement_timeout(),
            strict_stock: false,
        }
    }
}

impl SettlementSettings {
    /// Number prefix for invoices of the given kind.
    pub fn prefix_for(&self, kind: InvoiceKind) -> &str {
        match kind {
            InvoiceKind::Sale => &self.sale_prefix,
            InvoiceKind::Purchase => &self.purchase_prefix,
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

// =============================================================================
// App Configuration
// =============================================================================

/// Complete configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub database: DatabaseSettings,

    #[serde(default)]
    pub settlement: SettlementSettings,
}

impl AppConfig {
    /// Loads configuration from file, environment, and defaults.
    ///
    /// ## Load Order (later overrides earlier)
    /// 1. Default values
    /// 2. Config file (explicit path, else the platform config dir)
    /// 3. `SHOPDESK_*` environment variables
    pub fn load(config_path: Option<PathBuf>) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Some(path) = config_path.or_else(Self::default_config_path) {
            if path.exists() {
                info!(?path, "Loading config from file");
                let contents = std::fs::read_to_string(&path)?;
                config = Self::from_toml(&contents)?;
            } else {
                debug!(?path, "Config file not found, using defaults");
            }
        }

        config.apply_overrides(|key| std::env::var(key).ok())?;
        config.validate()?;

        Ok(config)
    }

    pub fn from_toml(contents: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(contents)?)
    }

    /// Applies `SHOPDESK_*` overrides read through `lookup`.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(path) = lookup("SHOPDESK_DB_PATH") {
            debug!(path = %path, "Overriding database path from environment");
            self.database.path = PathBuf::from(path);
        }

        if let Some(max) = lookup("SHOPDESK_DB_MAX_CONNECTIONS") {
            self.database.max_connections = parse_var("SHOPDESK_DB_MAX_CONNECTIONS", &max)?;
        }

        if let Some(ms) = lookup("SHOPDESK_DB_BUSY_TIMEOUT_MS") {
            self.database.busy_timeout_ms = parse_var("SHOPDESK_DB_BUSY_TIMEOUT_MS", &ms)?;
        }

        if let Some(id) = lookup("SHOPDESK_WALK_IN_PARTY_ID") {
            debug!(party_id = %id, "Overriding walk-in party from environment");
            self.settlement.walk_in_party_id = id;
        }

        if let Some(prefix) = lookup("SHOPDESK_SALE_PREFIX") {
            self.settlement.sale_prefix = prefix;
        }

        if let Some(prefix) = lookup("SHOPDESK_PURCHASE_PREFIX") {
            self.settlement.purchase_prefix = prefix;
        }

        if let Some(ms) = lookup("SHOPDESK_SETTLEMENT_TIMEOUT_MS") {
            self.settlement.timeout_ms = parse_var("SHOPDESK_SETTLEMENT_TIMEOUT_MS", &ms)?;
        }

        if let Some(strict) = lookup("SHOPDESK_STRICT_STOCK") {
            self.settlement.strict_stock = parse_var("SHOPDESK_STRICT_STOCK", &strict)?;
        }

        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.database.max_connections == 0 {
            return Err(ConfigError::InvalidValue("database.max_connections".into()));
        }

        if self.settlement.walk_in_party_id.trim().is_empty() {
            return Err(ConfigError::InvalidValue(
                "settlement.walk_in_party_id".into(),
            ));
        }

        for (field, prefix) in [
            ("settlement.sale_prefix", &self.settlement.sale_prefix),
            ("settlement.purchase_prefix", &self.settlement.purchase_prefix),
        ] {
            if prefix.is_empty() || !prefix.chars().all(|c| c.is_ascii_alphanumeric()) {
                return Err(ConfigError::InvalidValue(field.into()));
            }
        }

        if self.settlement.sale_prefix == self.settlement.purchase_prefix {
            return Err(ConfigError::InvalidValue(
                "settlement.purchase_prefix".into(),
            ));
        }

        if self.settlement.timeout_ms == 0 {
            return Err(ConfigError::InvalidValue("settlement.timeout_ms".into()));
        }

        Ok(())
    }

    /// Pool configuration derived from the `[database]` section.
    pub fn db_config(&self) -> DbConfig {
        DbConfig::new(&self.database.path)
            .max_connections(self.database.max_connections)
            .busy_timeout(Duration::from_millis(self.database.busy_timeout_ms))
    }

    fn default_config_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("in", "shopdesk", "shopdesk")
            .map(|dirs| dirs.config_dir().join("shopdesk.toml"))
    }
}

fn parse_var<T: std::str::FromStr>(key: &str, value: &str) -> Result<T, ConfigError> {
    value
        .trim()
        .parse()
        .map_err(|_| ConfigError::InvalidValue(key.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.settlement.walk_in_party_id, DEFAULT_WALK_IN_PARTY_ID);
        assert_eq!(config.settlement.prefix_for(InvoiceKind::Sale), "INV");
        assert_eq!(config.settlement.prefix_for(InvoiceKind::Purchase), "PINV");
        assert!(!config.settlement.strict_stock);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = AppConfig::from_toml(
            r#"
            [settlement]
            strict_stock = true
            sale_prefix = "S"
            "#,
        )
        .unwrap();
        assert!(config.settlement.strict_stock);
        assert_eq!(config.settlement.sale_prefix, "S");
        assert_eq!(config.settlement.purchase_prefix, "PINV");
        assert_eq!(config.database.max_connections, 5);
    }

    #[test]
    fn test_env_overrides() {
        let env: HashMap<&str, &str> = [
            ("SHOPDESK_DB_PATH", "/tmp/shop.db"),
            ("SHOPDESK_STRICT_STOCK", "true"),
            ("SHOPDESK_SETTLEMENT_TIMEOUT_MS", "250"),
        ]
        .into_iter()
        .collect();

        let mut config = AppConfig::default();
        config
            .apply_overrides(|key| env.get(key).map(|v| v.to_string()))
            .unwrap();

        assert_eq!(config.database.path, PathBuf::from("/tmp/shop.db"));
        assert!(config.settlement.strict_stock);
        assert_eq!(config.settlement.timeout(), Duration::from_millis(250));
    }

    #[test]
    fn test_invalid_env_value() {
        let mut config = AppConfig::default();
        let err = config
            .apply_overrides(|key| {
                (key == "SHOPDESK_DB_MAX_CONNECTIONS").then(|| "many".to_string())
            })
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue(_)));
    }

    #[test]
    fn test_validation() {
        let mut config = AppConfig::default();
        config.settlement.purchase_prefix = "INV".to_string();
        assert!(config.validate().is_err());

        let mut config = AppConfig::default();
        config.settlement.sale_prefix = "IN V".to_string();
        assert!(config.validate().is_err());

        let mut config = AppConfig::default();
        config.database.max_connections = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_toml_serialization() {
        let toml_str = toml::to_string_pretty(&AppConfig::default()).unwrap();
        assert!(toml_str.contains("[database]"));
        assert!(toml_str.contains("[settlement]"));
    }
}
