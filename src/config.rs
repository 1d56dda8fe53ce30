//! Runtime configuration loaded from environment variables.
//!
//! Every knob has a default matching the production PiNa Bakes deployment,
//! so a bare `cargo run` serves the bundled catalog out of `./data`.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::PathBuf;
use std::str::FromStr;

use thiserror::Error;
use url::Url;

use crate::domain::value_objects::Money;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("invalid value for {0}: {1}")]
    Invalid(&'static str, String),
}

#[derive(Clone, Debug)]
pub struct StoreConfig {
    /// WhatsApp number the order handoff link points at.
    pub whatsapp_number: String,
    /// Flat delivery charge applied below the free-shipping threshold.
    pub shipping_charge: Money,
    /// After-discount amount at which delivery becomes free.
    pub free_shipping_threshold: Money,
    /// Where the catalog is fetched from: a file path or an http(s) URL.
    pub products_source: String,
    /// Directory backing the persistent key-value store.
    pub data_dir: PathBuf,
    /// Optional endpoint for best-effort visit/order notifications.
    pub webhook_url: Option<Url>,
    /// Whether an applied coupon survives a restart.
    pub persist_coupon: bool,
    pub host: IpAddr,
    pub port: u16,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            whatsapp_number: "917678506669".to_string(),
            shipping_charge: Money::new(60),
            free_shipping_threshold: Money::new(999),
            products_source: "products.json".to_string(),
            data_dir: PathBuf::from("data"),
            webhook_url: None,
            persist_coupon: false,
            host: IpAddr::V4(Ipv4Addr::LOCALHOST),
            port: 8083,
        }
    }
}

impl StoreConfig {
    /// Load configuration from `PINABAKES_*` environment variables,
    /// falling back to the defaults above.
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();
        let webhook_url = match std::env::var("PINABAKES_WEBHOOK_URL") {
            Ok(raw) => Some(
                Url::parse(&raw)
                    .map_err(|e| ConfigError::Invalid("PINABAKES_WEBHOOK_URL", e.to_string()))?,
            ),
            Err(_) => None,
        };
        Ok(Self {
            whatsapp_number: env_or("PINABAKES_WHATSAPP", &defaults.whatsapp_number),
            shipping_charge: Money::new(parse_env("PINABAKES_SHIPPING_CHARGE", 60)?),
            free_shipping_threshold: Money::new(parse_env("PINABAKES_FREE_SHIPPING_FROM", 999)?),
            products_source: env_or("PINABAKES_PRODUCTS", &defaults.products_source),
            data_dir: PathBuf::from(env_or("PINABAKES_DATA_DIR", "data")),
            webhook_url,
            persist_coupon: parse_env("PINABAKES_PERSIST_COUPON", false)?,
            host: parse_env("PINABAKES_HOST", defaults.host)?,
            port: parse_env("PINABAKES_PORT", defaults.port)?,
        })
    }

    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn parse_env<T>(key: &'static str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|e: T::Err| ConfigError::Invalid(key, e.to_string())),
        Err(_) => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_deployment_constants() {
        let config = StoreConfig::default();
        assert_eq!(config.shipping_charge, Money::new(60));
        assert_eq!(config.free_shipping_threshold, Money::new(999));
        assert_eq!(config.whatsapp_number, "917678506669");
        assert!(!config.persist_coupon);
        assert_eq!(config.socket_addr().port(), 8083);
    }
}
