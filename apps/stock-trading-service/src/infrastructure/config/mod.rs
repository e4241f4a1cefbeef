//! Configuration Module
//!
//! Configuration loading for the stock trading service.

mod settings;

pub use settings::{
    ConfigError, DEFAULT_SEED, OrderPolicyKind, PricingSettings, SeedQuote, ServerSettings,
    ServiceConfig, StreamSettings,
};
