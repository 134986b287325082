//! Application configuration management.

use serde::Deserialize;

/// Application configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Server configuration.
    #[serde(default)]
    pub server: ServerConfig,
    /// Database configuration.
    pub database: DatabaseConfig,
    /// Ledger posting configuration.
    #[serde(default)]
    pub ledger: LedgerConfig,
    /// Inventory allocation configuration.
    #[serde(default)]
    pub inventory: InventoryConfig,
    /// Expiry sweep worker configuration.
    #[serde(default)]
    pub sweeper: SweeperConfig,
}

/// Server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Host to bind to.
    #[serde(default = "default_host")]
    pub host: String,
    /// Port to listen on.
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

/// Database configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// Database connection URL.
    pub url: String,
    /// Maximum number of connections in the pool.
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    /// Minimum number of connections in the pool.
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,
}

fn default_max_connections() -> u32 {
    10
}

fn default_min_connections() -> u32 {
    1
}

/// Ledger configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LedgerConfig {
    /// Semantic account roles mapped to chart-of-accounts codes.
    #[serde(default)]
    pub account_codes: AccountCodeMap,
}

/// Maps the semantic account roles used by automated postings to the
/// business's chart-of-accounts codes.
///
/// Defaults match the seeded default chart.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct AccountCodeMap {
    /// Cash on hand.
    pub cash: String,
    /// Bank account.
    pub bank: String,
    /// Accounts receivable (trade debtors).
    pub accounts_receivable: String,
    /// Inventory asset.
    pub inventory: String,
    /// Sales tax payable.
    pub sales_tax_payable: String,
    /// Sales revenue.
    pub sales_revenue: String,
    /// Cost of goods sold.
    pub cost_of_goods_sold: String,
}

impl Default for AccountCodeMap {
    fn default() -> Self {
        Self {
            cash: "1000".to_string(),
            bank: "1010".to_string(),
            accounts_receivable: "1100".to_string(),
            inventory: "1200".to_string(),
            sales_tax_payable: "2100".to_string(),
            sales_revenue: "4000".to_string(),
            cost_of_goods_sold: "5000".to_string(),
        }
    }
}

/// Inventory configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct InventoryConfig {
    /// Lots expiring within this many days raise a warning when allocated.
    #[serde(default = "default_near_expiry_days")]
    pub near_expiry_days: u32,
    /// How many times a conflicting stock consumption is retried as a whole.
    #[serde(default = "default_max_conflict_retries")]
    pub max_conflict_retries: u32,
}

impl Default for InventoryConfig {
    fn default() -> Self {
        Self {
            near_expiry_days: default_near_expiry_days(),
            max_conflict_retries: default_max_conflict_retries(),
        }
    }
}

fn default_near_expiry_days() -> u32 {
    30
}

fn default_max_conflict_retries() -> u32 {
    3
}

/// Expiry sweep worker configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct SweeperConfig {
    /// Seconds between sweeps.
    #[serde(default = "default_sweep_interval")]
    pub interval_secs: u64,
}

impl Default for SweeperConfig {
    fn default() -> Self {
        Self {
            interval_secs: default_sweep_interval(),
        }
    }
}

fn default_sweep_interval() -> u64 {
    3600 // hourly
}

impl AppConfig {
    /// Loads configuration from environment and config files.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration cannot be loaded.
    pub fn load() -> Result<Self, config::ConfigError> {
        let run_mode = std::env::var("RUN_MODE").unwrap_or_else(|_| "development".to_string());

        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{run_mode}")).required(false))
            .add_source(config::Environment::with_prefix("BACKOFFICE").separator("__"))
            .build()?;

        config.try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_from_env() {
        temp_env::with_vars(
            [
                ("BACKOFFICE__DATABASE__URL", Some("postgres://localhost/bo")),
                ("BACKOFFICE__SERVER__PORT", Some("9090")),
                ("BACKOFFICE__INVENTORY__NEAR_EXPIRY_DAYS", Some("14")),
                ("RUN_MODE", Some("nonexistent-mode")),
            ],
            || {
                let cfg = AppConfig::load().unwrap();
                assert_eq!(cfg.database.url, "postgres://localhost/bo");
                assert_eq!(cfg.database.max_connections, 10);
                assert_eq!(cfg.server.port, 9090);
                assert_eq!(cfg.server.host, "0.0.0.0");
                assert_eq!(cfg.inventory.near_expiry_days, 14);
                assert_eq!(cfg.inventory.max_conflict_retries, 3);
                assert_eq!(cfg.sweeper.interval_secs, 3600);
                assert_eq!(cfg.ledger.account_codes, AccountCodeMap::default());
            },
        );
    }

    #[test]
    fn test_missing_database_url_fails() {
        temp_env::with_vars(
            [
                ("BACKOFFICE__DATABASE__URL", None::<&str>),
                ("RUN_MODE", Some("nonexistent-mode")),
            ],
            || {
                assert!(AppConfig::load().is_err());
            },
        );
    }

    #[test]
    fn test_default_account_codes() {
        let codes = AccountCodeMap::default();
        assert_eq!(codes.accounts_receivable, "1100");
        assert_eq!(codes.sales_revenue, "4000");
        assert_eq!(codes.sales_tax_payable, "2100");
    }
}
