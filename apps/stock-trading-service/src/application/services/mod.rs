//! Call Handlers
//!
//! One handler per call shape. Each handler is stateless across calls;
//! per-call state lives only for the duration of the call.
//!
//! - `QuoteLookup`: unary lookup against the quote store
//! - `QuoteSubscription`: paced, finite producer of sampled quotes
//! - `OrderAggregator`: folds a client order stream into one summary
//! - `LiveTradingSession`: one correlated status per inbound order
//!
//! Streaming handlers write into a bounded `tokio::sync::mpsc` channel that
//! the transport drains, so a slow consumer suspends the producer and a
//! dropped consumer stops it.

mod live_trading;
mod order_aggregator;
mod quote_lookup;
mod quote_subscription;

pub use live_trading::LiveTradingSession;
pub use order_aggregator::OrderAggregator;
pub use quote_lookup::QuoteLookup;
pub use quote_subscription::{QuoteSubscription, SubscriptionSettings};

use crate::error::TradingError;

/// Terminal state of a streaming call, as seen by the server.
#[derive(Debug, Clone)]
pub enum StreamOutcome {
    /// All units were produced and the stream closed normally.
    Completed {
        /// Units emitted to the consumer.
        emitted: u64,
    },
    /// The consumer went away (or the server shut down) before completion.
    Cancelled {
        /// Units emitted before cancellation was observed.
        emitted: u64,
    },
    /// A fault terminated the stream with an error signal.
    Failed {
        /// Units emitted before the fault.
        emitted: u64,
        /// The fault sent as the terminal signal.
        error: TradingError,
    },
}

impl StreamOutcome {
    /// Units emitted before the stream terminated.
    #[must_use]
    pub const fn emitted(&self) -> u64 {
        match self {
            Self::Completed { emitted }
            | Self::Cancelled { emitted }
            | Self::Failed { emitted, .. } => *emitted,
        }
    }

    /// Outcome label for logs and metrics.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Completed { .. } => "completed",
            Self::Cancelled { .. } => "cancelled",
            Self::Failed { .. } => "failed",
        }
    }
}
