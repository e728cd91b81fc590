//! Store configuration.
//!
//! Configuration is loaded from environment variables with fallback to
//! defaults.
//!
//! | Variable                          | Default          |
//! |-----------------------------------|------------------|
//! | `STOREFRONT_DB_PATH`              | `storefront.db`  |
//! | `STOREFRONT_MAX_CONNECTIONS`      | `5`              |
//! | `STOREFRONT_TAX_RATE_BPS`         | `2100` (21%)     |
//! | `STOREFRONT_SHIPPING_RATE_BPS`    | `1000` (10%)     |
//! | `STOREFRONT_SHIPPING_FLOOR_CENTS` | `50000` (500.00) |
//! | `STOREFRONT_LOW_STOCK_THRESHOLD`  | `5`              |

use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;
use std::str::FromStr;

use storefront_core::pricing::{DEFAULT_SHIPPING_FLOOR, DEFAULT_SHIPPING_RATE, DEFAULT_TAX_RATE};
use storefront_core::validation::validate_rate_bps;
use storefront_core::{Money, PricingPolicy, Rate, DEFAULT_LOW_STOCK_THRESHOLD};

use crate::pool::DbConfig;

pub const ENV_DB_PATH: &str = "STOREFRONT_DB_PATH";
pub const ENV_MAX_CONNECTIONS: &str = "STOREFRONT_MAX_CONNECTIONS";
pub const ENV_TAX_RATE_BPS: &str = "STOREFRONT_TAX_RATE_BPS";
pub const ENV_SHIPPING_RATE_BPS: &str = "STOREFRONT_SHIPPING_RATE_BPS";
pub const ENV_SHIPPING_FLOOR_CENTS: &str = "STOREFRONT_SHIPPING_FLOOR_CENTS";
pub const ENV_LOW_STOCK_THRESHOLD: &str = "STOREFRONT_LOW_STOCK_THRESHOLD";

/// Storefront configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoreConfig {
    /// SQLite database file
    pub database_path: PathBuf,

    /// Pool size
    pub max_connections: u32,

    /// Tax, shipping rate and shipping floor
    pub pricing: PricingPolicy,

    /// Stock level at or below which a product is critical
    pub low_stock_threshold: i64,
}

impl Default for StoreConfig {
    fn default() -> Self {
        StoreConfig {
            database_path: PathBuf::from("storefront.db"),
            max_connections: 5,
            pricing: PricingPolicy::default(),
            low_stock_threshold: DEFAULT_LOW_STOCK_THRESHOLD,
        }
    }
}

impl StoreConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration from any key lookup (used by tests).
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let config = StoreConfig {
            database_path: lookup(ENV_DB_PATH)
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("storefront.db")),

            max_connections: parse_or(&lookup, ENV_MAX_CONNECTIONS, 5)?,

            pricing: PricingPolicy {
                tax_rate: Rate::from_bps(parse_or(&lookup, ENV_TAX_RATE_BPS, DEFAULT_TAX_RATE.bps())?),
                shipping_rate: Rate::from_bps(parse_or(
                    &lookup,
                    ENV_SHIPPING_RATE_BPS,
                    DEFAULT_SHIPPING_RATE.bps(),
                )?),
                shipping_floor: Money::from_cents(parse_or(
                    &lookup,
                    ENV_SHIPPING_FLOOR_CENTS,
                    DEFAULT_SHIPPING_FLOOR.cents(),
                )?),
            },

            low_stock_threshold: parse_or(&lookup, ENV_LOW_STOCK_THRESHOLD, DEFAULT_LOW_STOCK_THRESHOLD)?,
        };

        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.max_connections == 0 {
            return Err(ConfigError::InvalidValue(ENV_MAX_CONNECTIONS.to_string()));
        }
        validate_rate_bps(ENV_TAX_RATE_BPS, self.pricing.tax_rate.bps())
            .map_err(|_| ConfigError::InvalidValue(ENV_TAX_RATE_BPS.to_string()))?;
        validate_rate_bps(ENV_SHIPPING_RATE_BPS, self.pricing.shipping_rate.bps())
            .map_err(|_| ConfigError::InvalidValue(ENV_SHIPPING_RATE_BPS.to_string()))?;
        if self.pricing.shipping_floor.is_negative() {
            return Err(ConfigError::InvalidValue(ENV_SHIPPING_FLOOR_CENTS.to_string()));
        }
        if self.low_stock_threshold < 0 {
            return Err(ConfigError::InvalidValue(ENV_LOW_STOCK_THRESHOLD.to_string()));
        }
        Ok(())
    }

    /// Database settings derived from this configuration.
    pub fn db_config(&self) -> DbConfig {
        DbConfig::new(self.database_path.clone())
            .max_connections(self.max_connections)
            .pricing(self.pricing)
            .low_stock_threshold(self.low_stock_threshold)
    }
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidValue(key.to_string())),
        None => Ok(default),
    }
}

/// Configuration error types.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {0}")]
    InvalidValue(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = StoreConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config, StoreConfig::default());
        assert_eq!(config.pricing.tax_rate.bps(), 2100);
        assert_eq!(config.pricing.shipping_floor.cents(), 50_000);
    }

    #[test]
    fn test_overrides() {
        let config = StoreConfig::from_lookup(lookup(&[
            (ENV_DB_PATH, "/var/lib/storefront/shop.db"),
            (ENV_MAX_CONNECTIONS, "8"),
            (ENV_TAX_RATE_BPS, "1050"),
            (ENV_SHIPPING_FLOOR_CENTS, "0"),
            (ENV_LOW_STOCK_THRESHOLD, " 10 "),
        ]))
        .unwrap();

        assert_eq!(config.database_path, PathBuf::from("/var/lib/storefront/shop.db"));
        assert_eq!(config.max_connections, 8);
        assert_eq!(config.pricing.tax_rate.bps(), 1050);
        assert!(config.pricing.shipping_floor.is_zero());
        assert_eq!(config.low_stock_threshold, 10);

        let db = config.db_config();
        assert_eq!(db.max_connections, 8);
        assert_eq!(db.pricing.tax_rate.bps(), 1050);
        assert_eq!(db.low_stock_threshold, 10);
    }

    #[test]
    fn test_invalid_values() {
        let err = StoreConfig::from_lookup(lookup(&[(ENV_TAX_RATE_BPS, "veinte")])).unwrap_err();
        assert_eq!(err.to_string(), "Invalid value for STOREFRONT_TAX_RATE_BPS");

        assert!(StoreConfig::from_lookup(lookup(&[(ENV_SHIPPING_RATE_BPS, "20000")])).is_err());
        assert!(StoreConfig::from_lookup(lookup(&[(ENV_MAX_CONNECTIONS, "0")])).is_err());
        assert!(StoreConfig::from_lookup(lookup(&[(ENV_SHIPPING_FLOOR_CENTS, "-1")])).is_err());
    }
}
