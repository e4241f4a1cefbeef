//! Price Source and Clock Adapters
//!
//! - `RandomPriceSource`: uniform samples in `[0, max_price)`
//! - `ScriptedPriceSource`: cycles through a fixed sequence (tests, demos)
//! - `SystemClock`: wall-clock time and `tokio::time` interval tickers
//!
//! Tickers are built on `tokio::time`, so tests that pause the runtime
//! clock drive pacing without real delays.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rand::Rng;
use tokio::time::{Instant, Interval, MissedTickBehavior};

use crate::application::ports::{Clock, PacingError, PriceSource, PriceSourceError, Ticker};

// =============================================================================
// Price Sources
// =============================================================================

/// Samples prices uniformly below a fixed bound.
#[derive(Debug, Clone, Copy)]
pub struct RandomPriceSource {
    max_price: f64,
}

impl RandomPriceSource {
    /// Create a source sampling in `[0, max_price)`.
    #[must_use]
    pub const fn new(max_price: f64) -> Self {
        Self { max_price }
    }

    fn sample(&self, symbol: &str) -> Result<f64, PriceSourceError> {
        if !self.max_price.is_finite() || self.max_price <= 0.0 {
            return Err(PriceSourceError {
                symbol: symbol.to_string(),
                reason: format!("invalid price bound {}", self.max_price),
            });
        }
        Ok(rand::rng().random_range(0.0..self.max_price))
    }
}

#[async_trait]
impl PriceSource for RandomPriceSource {
    async fn next_price(&self, symbol: &str) -> Result<f64, PriceSourceError> {
        self.sample(symbol)
    }
}

/// Replays a fixed price sequence, wrapping around at the end.
#[derive(Debug)]
pub struct ScriptedPriceSource {
    prices: Vec<f64>,
    cursor: AtomicUsize,
}

impl ScriptedPriceSource {
    /// Create a source that yields `prices` in order, repeating.
    #[must_use]
    pub const fn new(prices: Vec<f64>) -> Self {
        Self {
            prices,
            cursor: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl PriceSource for ScriptedPriceSource {
    async fn next_price(&self, symbol: &str) -> Result<f64, PriceSourceError> {
        if self.prices.is_empty() {
            return Err(PriceSourceError {
                symbol: symbol.to_string(),
                reason: "no scripted prices".to_string(),
            });
        }
        let index = self.cursor.fetch_add(1, Ordering::Relaxed) % self.prices.len();
        Ok(self.prices[index])
    }
}

// =============================================================================
// Clock
// =============================================================================

/// Wall-clock time with `tokio::time` tickers.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }

    fn ticker(&self, period: Duration) -> Box<dyn Ticker> {
        Box::new(IntervalTicker::new(period))
    }
}

/// Ticker over `tokio::time::Interval`; the first tick lands one period out.
///
/// A pending tick is released as soon as its future is dropped.
#[derive(Debug)]
pub struct IntervalTicker {
    interval: Interval,
}

impl IntervalTicker {
    /// Create a ticker with the given period.
    #[must_use]
    pub fn new(period: Duration) -> Self {
        let mut interval = tokio::time::interval_at(Instant::now() + period, period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        Self { interval }
    }
}

#[async_trait]
impl Ticker for IntervalTicker {
    async fn tick(&mut self) -> Result<(), PacingError> {
        self.interval.tick().await;
        Ok(())
    }
}
