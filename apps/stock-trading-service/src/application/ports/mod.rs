//! Port Interfaces
//!
//! Defines the interfaces (ports) for external collaborators following
//! the Hexagonal Architecture pattern. These are the contracts that
//! infrastructure adapters must implement.
//!
//! ## Driven Ports (Outbound)
//!
//! - `QuoteStore`: Latest quote per symbol, supplied externally
//! - `PriceSource`: Next price sample for a subscription
//! - `Clock`: Wall-clock time and cancellable pacing tickers

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::quote::Quote;
use crate::error::TradingError;

// =============================================================================
// Quote Store
// =============================================================================

/// Quote store errors.
#[derive(Debug, Clone, thiserror::Error)]
pub enum QuoteStoreError {
    /// No quote stored for the symbol.
    #[error("symbol not found: {0}")]
    NotFound(String),
    /// Store is unreachable.
    #[error("quote store unavailable: {0}")]
    Unavailable(String),
    /// Store did not answer in time.
    #[error("quote store timed out: {0}")]
    Timeout(String),
}

impl From<QuoteStoreError> for TradingError {
    fn from(error: QuoteStoreError) -> Self {
        match error {
            QuoteStoreError::NotFound(symbol) => Self::symbol_not_found(&symbol),
            QuoteStoreError::Unavailable(_) | QuoteStoreError::Timeout(_) => {
                Self::upstream_unavailable(error.to_string())
            }
        }
    }
}

/// Read access to the latest quote per symbol.
///
/// Implementations must support concurrent reads and must never return a
/// quote that mixes two store updates.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait QuoteStore: Send + Sync {
    /// Look up the latest quote for `symbol`.
    ///
    /// # Errors
    ///
    /// Returns `QuoteStoreError::NotFound` for unknown symbols, or an
    /// availability error if the store cannot answer.
    async fn lookup(&self, symbol: &str) -> Result<Quote, QuoteStoreError>;

    /// Whether the store is currently able to serve lookups.
    fn is_available(&self) -> bool;
}

// =============================================================================
// Price Source
// =============================================================================

/// Price source errors.
#[derive(Debug, Clone, thiserror::Error)]
#[error("price source failed for {symbol}: {reason}")]
pub struct PriceSourceError {
    /// Symbol being sampled.
    pub symbol: String,
    /// Failure detail.
    pub reason: String,
}

/// Supplies the next price sample for a symbol.
#[async_trait]
pub trait PriceSource: Send + Sync {
    /// Sample the next price for `symbol`.
    ///
    /// # Errors
    ///
    /// Returns `PriceSourceError` if no sample can be produced.
    async fn next_price(&self, symbol: &str) -> Result<f64, PriceSourceError>;
}

// =============================================================================
// Clock
// =============================================================================

/// Pacing errors.
#[derive(Debug, Clone, thiserror::Error)]
#[error("pacing timer failed: {0}")]
pub struct PacingError(pub String);

/// A periodic, cancellable pacing timer owned by one stream.
///
/// Dropping a pending `tick` future must release the wait.
#[async_trait]
pub trait Ticker: Send {
    /// Wait for the next period to elapse.
    ///
    /// # Errors
    ///
    /// Returns `PacingError` if the timer cannot be awaited.
    async fn tick(&mut self) -> Result<(), PacingError>;
}

/// Source of wall-clock time and pacing tickers.
pub trait Clock: Send + Sync {
    /// Current wall-clock time.
    fn now(&self) -> DateTime<Utc>;

    /// Create a ticker whose first tick completes one `period` from now.
    fn ticker(&self, period: Duration) -> Box<dyn Ticker>;
}
