//! Prometheus Metrics Module
//!
//! Exposes call-level metrics via Prometheus format for monitoring.
//!
//! # Metrics Categories
//!
//! - **Calls**: Started/finished calls per method and outcome
//! - **Concurrency**: Calls currently in flight per method
//! - **Volume**: Orders received and quotes streamed
//! - **Latency**: Call duration from accept to terminal signal
//!
//! # Integration
//!
//! Metrics are exposed at `/metrics` on the health server port.

use std::sync::OnceLock;
use std::time::Duration;

use metrics::{counter, describe_counter, describe_gauge, describe_histogram, gauge, histogram};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder, PrometheusHandle};

// =============================================================================
// Global Metrics Handle
// =============================================================================

static PROMETHEUS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

/// Initialize the Prometheus metrics recorder.
///
/// Calling this again after a successful install returns the existing handle.
///
/// # Errors
///
/// Returns `BuildError` if the global recorder cannot be installed.
pub fn init_metrics() -> Result<PrometheusHandle, BuildError> {
    if let Some(handle) = PROMETHEUS_HANDLE.get() {
        return Ok(handle.clone());
    }

    let handle = PrometheusBuilder::new().install_recorder()?;
    register_metrics();
    Ok(PROMETHEUS_HANDLE.get_or_init(|| handle).clone())
}

/// Get the Prometheus handle for rendering metrics.
///
/// Returns `None` if metrics have not been initialized.
#[must_use]
pub fn get_metrics_handle() -> Option<PrometheusHandle> {
    PROMETHEUS_HANDLE.get().cloned()
}

// =============================================================================
// Metric Registration
// =============================================================================

fn register_metrics() {
    describe_counter!(
        "stock_trading_rpc_calls_total",
        "Total finished calls by method and outcome"
    );
    describe_gauge!(
        "stock_trading_active_calls",
        "Number of calls currently in flight"
    );
    describe_counter!(
        "stock_trading_orders_received_total",
        "Total orders read from client streams"
    );
    describe_counter!(
        "stock_trading_quotes_streamed_total",
        "Total quotes written to subscription streams"
    );
    describe_histogram!(
        "stock_trading_rpc_duration_seconds",
        "Time from call accept to terminal signal"
    );
}

// =============================================================================
// Metric Labels
// =============================================================================

/// Metric labels for service methods.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RpcMethod {
    /// Unary quote lookup.
    GetQuote,
    /// Server-streamed quote subscription.
    SubscribeQuote,
    /// Client-streamed order submission.
    SubmitOrders,
    /// Bidirectional live trading.
    LiveTrade,
}

impl RpcMethod {
    /// All methods, in declaration order.
    pub const ALL: [Self; 4] = [
        Self::GetQuote,
        Self::SubscribeQuote,
        Self::SubmitOrders,
        Self::LiveTrade,
    ];

    /// Label value.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::GetQuote => "get_quote",
            Self::SubscribeQuote => "subscribe_quote",
            Self::SubmitOrders => "submit_orders",
            Self::LiveTrade => "live_trade",
        }
    }
}

/// Metric labels for call outcomes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallOutcome {
    /// Completed normally.
    Completed,
    /// Ended by the caller or by shutdown.
    Cancelled,
    /// Ended with an error status.
    Failed,
}

impl CallOutcome {
    /// Label value.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
            Self::Failed => "failed",
        }
    }
}

// =============================================================================
// Metric Recording Functions
// =============================================================================

/// Record a call entering the server.
pub fn record_call_started(method: RpcMethod) {
    gauge!("stock_trading_active_calls", "method" => method.as_str()).increment(1.0);
}

/// Record a call reaching its terminal state.
pub fn record_call_finished(method: RpcMethod, outcome: CallOutcome, duration: Duration) {
    gauge!("stock_trading_active_calls", "method" => method.as_str()).decrement(1.0);
    counter!(
        "stock_trading_rpc_calls_total",
        "method" => method.as_str(),
        "outcome" => outcome.as_str()
    )
    .increment(1);
    histogram!(
        "stock_trading_rpc_duration_seconds",
        "method" => method.as_str()
    )
    .record(duration.as_secs_f64());
}

/// Record orders read from a client stream.
pub fn record_orders_received(method: RpcMethod, count: u64) {
    counter!(
        "stock_trading_orders_received_total",
        "method" => method.as_str()
    )
    .increment(count);
}

/// Record quotes written to subscription streams.
pub fn record_quotes_streamed(count: u64) {
    counter!("stock_trading_quotes_streamed_total").increment(count);
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rpc_method_as_str() {
        assert_eq!(RpcMethod::GetQuote.as_str(), "get_quote");
        assert_eq!(RpcMethod::SubscribeQuote.as_str(), "subscribe_quote");
        assert_eq!(RpcMethod::SubmitOrders.as_str(), "submit_orders");
        assert_eq!(RpcMethod::LiveTrade.as_str(), "live_trade");
    }

    #[test]
    fn call_outcome_as_str() {
        assert_eq!(CallOutcome::Completed.as_str(), "completed");
        assert_eq!(CallOutcome::Cancelled.as_str(), "cancelled");
        assert_eq!(CallOutcome::Failed.as_str(), "failed");
    }

    #[test]
    fn recording_without_recorder_is_noop() {
        record_call_started(RpcMethod::GetQuote);
        record_call_finished(RpcMethod::GetQuote, CallOutcome::Completed, Duration::ZERO);
        record_orders_received(RpcMethod::SubmitOrders, 3);
        record_quotes_streamed(10);
    }
}
