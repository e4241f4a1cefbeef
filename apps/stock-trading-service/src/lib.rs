#![cfg_attr(
    test,
    allow(
        clippy::unwrap_used,
        clippy::expect_used,
        clippy::float_cmp,
        clippy::significant_drop_tightening,
        clippy::too_many_lines,
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss,
        clippy::cast_possible_wrap,
        clippy::needless_pass_by_value,
        clippy::items_after_statements
    )
)]

//! Stock Trading Service - Quotes and Orders over gRPC
//!
//! A gRPC service exposing the four call shapes over a small trading
//! domain: a unary quote lookup, a paced quote subscription, a
//! client-streamed order batch summarized on completion, and a
//! bidirectional session answering each order with one status.
//!
//! # Layers (inside → outside)
//!
//! - **Domain**: Quote and order types and business rules
//!   - `quote`: Quote snapshots and wire timestamp format
//!   - `order`: Orders, summaries, trade statuses, evaluation policies
//!
//! - **Application**: Call handlers and port definitions
//!   - `ports`: Quote store, price source, clock/ticker interfaces
//!   - `services`: Lookup, subscription, aggregation, live trading
//!
//! - **Infrastructure**: Adapters and external integrations
//!   - `grpc`: Service adapter over the generated tonic stubs
//!   - `store`: In-memory quote store with seed data
//!   - `pricing`: Random/scripted price sources and the system clock
//!   - `config`: Environment configuration
//!   - `health`: Health check HTTP endpoint
//!   - `metrics`, `telemetry`: Prometheus metrics and tracing
//!
//! # Data Flow
//!
//! ```text
//!              ┌──────────────┐   lookup    ┌─────────────┐
//! GetQuote ───►│              │────────────►│ QuoteStore  │
//!              │              │             └─────────────┘
//! Subscribe ──►│  gRPC        │── spawn ──► QuoteSubscription ──► mpsc ──► client
//!              │  adapter     │
//! SubmitOrders►│              │── await ──► OrderAggregator ──► OrderSummary
//!              │              │
//! LiveTrade ──►│              │── spawn ──► LiveTradingSession ──► mpsc ──► client
//!              └──────────────┘
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::pedantic)]

// =============================================================================
// Module Declarations
// =============================================================================

/// Domain layer - Quote and order types with no transport dependencies.
pub mod domain;

/// Application layer - Call handlers and port definitions.
pub mod application;

/// Infrastructure layer - Adapters and external integrations.
pub mod infrastructure;

/// Error taxonomy and gRPC status mapping.
pub mod error;

// =============================================================================
// Re-exports
// =============================================================================

// Domain types
pub use domain::order::{
    AcceptAllPolicy, Order, OrderPolicy, OrderSide, OrderSummary, SummaryOverflow, TradeStatus,
    ValidatingPolicy, Verdict,
};
pub use domain::quote::{Quote, Symbol, format_timestamp};

// Errors
pub use error::{ErrorCode, TradingError};

// Handlers
pub use application::services::{
    LiveTradingSession, OrderAggregator, QuoteLookup, QuoteSubscription, StreamOutcome,
    SubscriptionSettings,
};

// Infrastructure config
pub use infrastructure::config::{ConfigError, OrderPolicyKind, ServiceConfig};

// Adapters
pub use infrastructure::pricing::{RandomPriceSource, ScriptedPriceSource, SystemClock};
pub use infrastructure::store::InMemoryQuoteStore;

// gRPC server (for integration tests)
pub use infrastructure::grpc::{
    ServiceHandlers, StockTradingServer, StockTradingServerConfig,
    proto::stocktrading::v1 as proto,
};

// Health server
pub use infrastructure::health::{HealthServer, HealthServerError, HealthServerState};

// Metrics
pub use infrastructure::metrics::init_metrics;

// Telemetry
pub use infrastructure::telemetry::{TelemetryConfig, TelemetryGuard, init as init_telemetry};
