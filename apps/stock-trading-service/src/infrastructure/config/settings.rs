//! Service Configuration Settings
//!
//! Configuration types for the stock trading service, loaded from
//! environment variables. Unset variables take their default; a variable
//! that is set but empty or unparseable fails startup.

use std::sync::Arc;
use std::time::Duration;

use crate::application::services::SubscriptionSettings;
use crate::domain::order::{AcceptAllPolicy, OrderPolicy, ValidatingPolicy};

/// Default store contents.
pub const DEFAULT_SEED: &str = "AAPL=175.50,GOOGL=2800.75,AMZN=3400.00";

/// Which order evaluation policy handlers use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OrderPolicyKind {
    /// Accept every order as received.
    #[default]
    AcceptAll,
    /// Reject orders with missing fields or non-positive amounts.
    Validate,
}

impl OrderPolicyKind {
    /// Parse a policy name.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "accept_all" => Some(Self::AcceptAll),
            "validate" => Some(Self::Validate),
            _ => None,
        }
    }

    /// Get the policy name.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::AcceptAll => "accept_all",
            Self::Validate => "validate",
        }
    }

    /// Build the policy.
    #[must_use]
    pub fn build(self) -> Arc<dyn OrderPolicy> {
        match self {
            Self::AcceptAll => Arc::new(AcceptAllPolicy),
            Self::Validate => Arc::new(ValidatingPolicy),
        }
    }
}

/// Server port settings.
#[derive(Debug, Clone)]
pub struct ServerSettings {
    /// gRPC server port.
    pub grpc_port: u16,
    /// Health check HTTP port.
    pub health_port: u16,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            grpc_port: 9090,
            health_port: 8083,
        }
    }
}

/// Streaming call settings.
#[derive(Debug, Clone)]
pub struct StreamSettings {
    /// Quotes emitted per `SubscribeQuote` call.
    pub subscribe_count: u32,
    /// Wait between subscription emissions.
    pub subscribe_interval: Duration,
    /// Capacity of each call's outbound channel.
    pub stream_capacity: usize,
}

impl Default for StreamSettings {
    fn default() -> Self {
        Self {
            subscribe_count: 10,
            subscribe_interval: Duration::from_millis(1000),
            stream_capacity: 16,
        }
    }
}

/// Simulated price source settings.
#[derive(Debug, Clone)]
pub struct PricingSettings {
    /// Exclusive upper bound for sampled prices.
    pub max_price: f64,
}

impl Default for PricingSettings {
    fn default() -> Self {
        Self { max_price: 200.0 }
    }
}

/// One initial store entry.
#[derive(Debug, Clone, PartialEq)]
pub struct SeedQuote {
    /// Ticker symbol.
    pub symbol: String,
    /// Initial price.
    pub price: f64,
}

/// Complete service configuration.
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    /// Server port settings.
    pub server: ServerSettings,
    /// Streaming call settings.
    pub streams: StreamSettings,
    /// Price source settings.
    pub pricing: PricingSettings,
    /// Order evaluation policy.
    pub order_policy: OrderPolicyKind,
    /// Initial store contents.
    pub seed: Vec<SeedQuote>,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            server: ServerSettings::default(),
            streams: StreamSettings::default(),
            pricing: PricingSettings::default(),
            order_policy: OrderPolicyKind::default(),
            seed: default_seed(),
        }
    }
}

impl ServiceConfig {
    /// Create configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if a variable is set to an empty or invalid value.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Create configuration from an arbitrary key lookup.
    ///
    /// # Errors
    ///
    /// Returns an error if a key maps to an empty or invalid value.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let env = Lookup(lookup);
        let defaults = Self::default();

        let server = ServerSettings {
            grpc_port: env.parse("STOCK_TRADING_GRPC_PORT", defaults.server.grpc_port)?,
            health_port: env.parse("STOCK_TRADING_HEALTH_PORT", defaults.server.health_port)?,
        };

        let subscribe_interval_ms: u64 = env.parse(
            "STOCK_TRADING_SUBSCRIBE_INTERVAL_MS",
            u64::try_from(defaults.streams.subscribe_interval.as_millis()).unwrap_or(1000),
        )?;
        if subscribe_interval_ms == 0 {
            return Err(ConfigError::invalid(
                "STOCK_TRADING_SUBSCRIBE_INTERVAL_MS",
                "0",
                "interval must be positive",
            ));
        }

        let stream_capacity: usize = env.parse(
            "STOCK_TRADING_STREAM_CAPACITY",
            defaults.streams.stream_capacity,
        )?;
        if stream_capacity == 0 {
            return Err(ConfigError::invalid(
                "STOCK_TRADING_STREAM_CAPACITY",
                "0",
                "capacity must be positive",
            ));
        }

        let subscribe_count: u32 = env.parse(
            "STOCK_TRADING_SUBSCRIBE_COUNT",
            defaults.streams.subscribe_count,
        )?;
        if subscribe_count == 0 {
            return Err(ConfigError::invalid(
                "STOCK_TRADING_SUBSCRIBE_COUNT",
                "0",
                "count must be positive",
            ));
        }

        let streams = StreamSettings {
            subscribe_count,
            subscribe_interval: Duration::from_millis(subscribe_interval_ms),
            stream_capacity,
        };

        let max_price: f64 = env.parse("STOCK_TRADING_MAX_PRICE", defaults.pricing.max_price)?;
        if !max_price.is_finite() || max_price <= 0.0 {
            return Err(ConfigError::invalid(
                "STOCK_TRADING_MAX_PRICE",
                max_price.to_string(),
                "must be a positive number",
            ));
        }

        let order_policy = match env.get("STOCK_TRADING_ORDER_POLICY")? {
            None => defaults.order_policy,
            Some(raw) => OrderPolicyKind::parse(&raw).ok_or_else(|| {
                ConfigError::invalid(
                    "STOCK_TRADING_ORDER_POLICY",
                    raw.as_str(),
                    "expected accept_all or validate",
                )
            })?,
        };

        let seed = match env.get("STOCK_TRADING_SEED")? {
            None => defaults.seed,
            Some(raw) => parse_seed(&raw)
                .map_err(|reason| ConfigError::invalid("STOCK_TRADING_SEED", raw.as_str(), reason))?,
        };

        Ok(Self {
            server,
            streams,
            pricing: PricingSettings { max_price },
            order_policy,
            seed,
        })
    }

    /// Subscription settings derived from the stream settings.
    #[must_use]
    pub const fn subscription_settings(&self) -> SubscriptionSettings {
        SubscriptionSettings {
            count: self.streams.subscribe_count,
            interval: self.streams.subscribe_interval,
        }
    }
}

/// Configuration error.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Environment variable has empty value.
    #[error("environment variable {0} cannot be empty")]
    EmptyValue(String),
    /// Environment variable could not be parsed.
    #[error("invalid value {value:?} for {key}: {reason}")]
    InvalidValue {
        /// Variable name.
        key: String,
        /// Offending value.
        value: String,
        /// Why it was rejected.
        reason: String,
    },
}

impl ConfigError {
    fn invalid(key: &str, value: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidValue {
            key: key.to_string(),
            value: value.into(),
            reason: reason.into(),
        }
    }
}

struct Lookup<F>(F);

impl<F> Lookup<F>
where
    F: Fn(&str) -> Option<String>,
{
    fn get(&self, key: &str) -> Result<Option<String>, ConfigError> {
        match (self.0)(key) {
            None => Ok(None),
            Some(value) if value.trim().is_empty() => Err(ConfigError::EmptyValue(key.to_string())),
            Some(value) => Ok(Some(value.trim().to_string())),
        }
    }

    fn parse<T>(&self, key: &str, default: T) -> Result<T, ConfigError>
    where
        T: std::str::FromStr,
        T::Err: std::fmt::Display,
    {
        match self.get(key)? {
            None => Ok(default),
            Some(raw) => raw
                .parse()
                .map_err(|e: T::Err| ConfigError::invalid(key, raw.as_str(), e.to_string())),
        }
    }
}

fn default_seed() -> Vec<SeedQuote> {
    vec![
        SeedQuote {
            symbol: "AAPL".to_string(),
            price: 175.50,
        },
        SeedQuote {
            symbol: "GOOGL".to_string(),
            price: 2800.75,
        },
        SeedQuote {
            symbol: "AMZN".to_string(),
            price: 3400.00,
        },
    ]
}

/// Parse `SYMBOL=price` pairs separated by commas.
fn parse_seed(raw: &str) -> Result<Vec<SeedQuote>, String> {
    raw.split(',')
        .map(|entry| {
            let (symbol, price) = entry
                .split_once('=')
                .ok_or_else(|| format!("entry {entry:?} is not SYMBOL=price"))?;
            let symbol = symbol.trim();
            if symbol.is_empty() {
                return Err(format!("entry {entry:?} has an empty symbol"));
            }
            let price: f64 = price
                .trim()
                .parse()
                .map_err(|e| format!("entry {entry:?} has a bad price: {e}"))?;
            if !price.is_finite() || price < 0.0 {
                return Err(format!("entry {entry:?} has a negative or non-finite price"));
            }
            Ok(SeedQuote {
                symbol: symbol.to_string(),
                price,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use test_case::test_case;

    use super::*;

    fn config_from(vars: &[(&str, &str)]) -> Result<ServiceConfig, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        ServiceConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults_when_unset() {
        let config = config_from(&[]).unwrap();

        assert_eq!(config.server.grpc_port, 9090);
        assert_eq!(config.server.health_port, 8083);
        assert_eq!(config.streams.subscribe_count, 10);
        assert_eq!(config.streams.subscribe_interval, Duration::from_secs(1));
        assert_eq!(config.streams.stream_capacity, 16);
        assert!((config.pricing.max_price - 200.0).abs() < f64::EPSILON);
        assert_eq!(config.order_policy, OrderPolicyKind::AcceptAll);
        assert_eq!(config.seed, parse_seed(DEFAULT_SEED).unwrap());
    }

    #[test]
    fn overrides_are_applied() {
        let config = config_from(&[
            ("STOCK_TRADING_GRPC_PORT", "50051"),
            ("STOCK_TRADING_SUBSCRIBE_COUNT", "3"),
            ("STOCK_TRADING_SUBSCRIBE_INTERVAL_MS", "250"),
            ("STOCK_TRADING_ORDER_POLICY", "VALIDATE"),
            ("STOCK_TRADING_SEED", "MSFT=410.25"),
        ])
        .unwrap();

        assert_eq!(config.server.grpc_port, 50051);
        let settings = config.subscription_settings();
        assert_eq!(settings.count, 3);
        assert_eq!(settings.interval, Duration::from_millis(250));
        assert_eq!(config.order_policy, OrderPolicyKind::Validate);
        assert_eq!(
            config.seed,
            vec![SeedQuote {
                symbol: "MSFT".to_string(),
                price: 410.25
            }]
        );
    }

    #[test_case("STOCK_TRADING_GRPC_PORT", "not-a-port" ; "non numeric port")]
    #[test_case("STOCK_TRADING_HEALTH_PORT", "70000" ; "port out of range")]
    #[test_case("STOCK_TRADING_SUBSCRIBE_COUNT", "0" ; "zero count")]
    #[test_case("STOCK_TRADING_SUBSCRIBE_INTERVAL_MS", "0" ; "zero interval")]
    #[test_case("STOCK_TRADING_STREAM_CAPACITY", "0" ; "zero capacity")]
    #[test_case("STOCK_TRADING_MAX_PRICE", "-5" ; "negative max price")]
    #[test_case("STOCK_TRADING_ORDER_POLICY", "reject_all" ; "unknown policy")]
    #[test_case("STOCK_TRADING_SEED", "AAPL" ; "seed without price")]
    #[test_case("STOCK_TRADING_SEED", "=1.0" ; "seed without symbol")]
    fn invalid_values_are_rejected(key: &str, value: &str) {
        let error = config_from(&[(key, value)]).unwrap_err();

        assert!(matches!(error, ConfigError::InvalidValue { .. }));
        assert!(error.to_string().contains(key));
    }

    #[test]
    fn empty_value_is_rejected() {
        let error = config_from(&[("STOCK_TRADING_SUBSCRIBE_COUNT", "  ")]).unwrap_err();

        assert!(matches!(error, ConfigError::EmptyValue(ref key) if key == "STOCK_TRADING_SUBSCRIBE_COUNT"));
    }

    #[test_case("accept_all", Some(OrderPolicyKind::AcceptAll))]
    #[test_case(" Validate ", Some(OrderPolicyKind::Validate))]
    #[test_case("strict", None)]
    fn order_policy_parsing(raw: &str, expected: Option<OrderPolicyKind>) {
        assert_eq!(OrderPolicyKind::parse(raw), expected);
    }

    #[test]
    fn built_policy_matches_kind() {
        assert_eq!(OrderPolicyKind::AcceptAll.build().name(), "accept_all");
        assert_eq!(OrderPolicyKind::Validate.build().name(), "validate");
    }

    #[test]
    fn seed_parsing_trims_whitespace() {
        let seed = parse_seed(" AAPL = 1.5 , GOOGL=2").unwrap();

        assert_eq!(seed.len(), 2);
        assert_eq!(seed[0].symbol, "AAPL");
        assert!((seed[1].price - 2.0).abs() < f64::EPSILON);
    }
}
