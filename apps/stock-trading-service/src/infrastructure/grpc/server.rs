//! gRPC Service Implementation
//!
//! Implements the `StockTradingService` gRPC service over the four call
//! handlers, with per-method call statistics.

use std::collections::BTreeMap;
use std::pin::Pin;
use std::sync::Arc;
use std::sync::atomic::{AtomicI64, AtomicU64, Ordering};
use std::time::Instant;

use futures::StreamExt;
use serde::Serialize;
use tokio::sync::mpsc;
use tokio_stream::Stream;
use tokio_stream::wrappers::ReceiverStream;
use tokio_util::sync::CancellationToken;
use tonic::{Request, Response, Status, Streaming};
use uuid::Uuid;

use super::converters::{order_from_proto, quote_to_proto, summary_to_proto, trade_status_to_proto};
use super::proto::stocktrading::v1::{
    self as proto, stock_trading_service_server::StockTradingService,
};
use crate::application::ports::{Clock, PriceSource, QuoteStore};
use crate::application::services::{
    LiveTradingSession, OrderAggregator, QuoteLookup, QuoteSubscription, StreamOutcome,
    SubscriptionSettings,
};
use crate::domain::order::{Order, OrderPolicy};
use crate::error::TradingError;
use crate::infrastructure::metrics::{self, CallOutcome, RpcMethod};

// =============================================================================
// Type Aliases
// =============================================================================

type RpcResult<T> = Result<Response<T>, Status>;
type BoxedStream<T> = Pin<Box<dyn Stream<Item = Result<T, Status>> + Send>>;

// =============================================================================
// Server Configuration
// =============================================================================

/// Configuration for the gRPC server.
#[derive(Debug, Clone)]
pub struct StockTradingServerConfig {
    /// Service version string.
    pub version: String,
    /// Capacity of each call's outbound channel.
    pub stream_capacity: usize,
}

impl Default for StockTradingServerConfig {
    fn default() -> Self {
        Self {
            version: env!("CARGO_PKG_VERSION").to_string(),
            stream_capacity: 16,
        }
    }
}

/// The call handlers the service dispatches to.
#[derive(Clone)]
pub struct ServiceHandlers {
    /// `GetQuote` handler.
    pub lookup: QuoteLookup,
    /// `SubscribeQuote` handler.
    pub subscription: QuoteSubscription,
    /// `SubmitOrders` handler.
    pub aggregator: OrderAggregator,
    /// Policy for `LiveTrade` sessions.
    pub order_policy: Arc<dyn OrderPolicy>,
}

impl ServiceHandlers {
    /// Wire the handlers to their collaborators.
    #[must_use]
    pub fn new(
        store: Arc<dyn QuoteStore>,
        price_source: Arc<dyn PriceSource>,
        clock: Arc<dyn Clock>,
        subscription: SubscriptionSettings,
        order_policy: Arc<dyn OrderPolicy>,
    ) -> Self {
        Self {
            lookup: QuoteLookup::new(store),
            subscription: QuoteSubscription::new(price_source, clock, subscription),
            aggregator: OrderAggregator::new(Arc::clone(&order_policy)),
            order_policy,
        }
    }
}

// =============================================================================
// Call Statistics
// =============================================================================

/// Call counters for one method.
#[derive(Debug, Default)]
pub struct CallStats {
    active: AtomicI64,
    started: AtomicU64,
    completed: AtomicU64,
    failed: AtomicU64,
    cancelled: AtomicU64,
}

/// Point-in-time copy of [`CallStats`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct CallStatsSnapshot {
    /// Calls currently in flight.
    pub active: i64,
    /// Calls accepted since start.
    pub started: u64,
    /// Calls that completed normally.
    pub completed: u64,
    /// Calls that ended with an error status.
    pub failed: u64,
    /// Calls ended by the caller or by shutdown.
    pub cancelled: u64,
}

impl CallStats {
    fn begin(&self) {
        self.active.fetch_add(1, Ordering::Relaxed);
        self.started.fetch_add(1, Ordering::Relaxed);
    }

    fn finish(&self, outcome: CallOutcome) {
        self.active.fetch_sub(1, Ordering::Relaxed);
        let counter = match outcome {
            CallOutcome::Completed => &self.completed,
            CallOutcome::Cancelled => &self.cancelled,
            CallOutcome::Failed => &self.failed,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    /// Get a snapshot of the counters.
    #[must_use]
    pub fn snapshot(&self) -> CallStatsSnapshot {
        CallStatsSnapshot {
            active: self.active.load(Ordering::Relaxed),
            started: self.started.load(Ordering::Relaxed),
            completed: self.completed.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
            cancelled: self.cancelled.load(Ordering::Relaxed),
        }
    }
}

/// Call counters for every method.
#[derive(Debug, Default)]
pub struct ServiceStats {
    get_quote: CallStats,
    subscribe_quote: CallStats,
    submit_orders: CallStats,
    live_trade: CallStats,
}

impl ServiceStats {
    /// Counters for one method.
    #[must_use]
    pub const fn for_method(&self, method: RpcMethod) -> &CallStats {
        match method {
            RpcMethod::GetQuote => &self.get_quote,
            RpcMethod::SubscribeQuote => &self.subscribe_quote,
            RpcMethod::SubmitOrders => &self.submit_orders,
            RpcMethod::LiveTrade => &self.live_trade,
        }
    }

    /// Snapshot of every method, keyed by metric label.
    #[must_use]
    pub fn snapshot(&self) -> BTreeMap<&'static str, CallStatsSnapshot> {
        RpcMethod::ALL
            .into_iter()
            .map(|method| (method.as_str(), self.for_method(method).snapshot()))
            .collect()
    }
}

/// Tracks one call from accept to terminal state.
///
/// A tracker dropped without `finish` records the call as cancelled; this
/// covers unary and client-streaming futures that tonic drops when the
/// caller goes away.
struct CallTracker {
    call_id: Uuid,
    method: RpcMethod,
    stats: Arc<ServiceStats>,
    started_at: Instant,
    finished: bool,
}

impl CallTracker {
    fn start(method: RpcMethod, stats: Arc<ServiceStats>) -> Self {
        let call_id = Uuid::new_v4();
        stats.for_method(method).begin();
        metrics::record_call_started(method);
        tracing::info!(call_id = %call_id, method = method.as_str(), "Call started");

        Self {
            call_id,
            method,
            stats,
            started_at: Instant::now(),
            finished: false,
        }
    }

    fn finish(mut self, outcome: CallOutcome, emitted: Option<u64>) {
        self.record(outcome, emitted);
    }

    fn finish_stream(self, outcome: &StreamOutcome) {
        match outcome {
            StreamOutcome::Completed { emitted } => {
                self.finish(CallOutcome::Completed, Some(*emitted));
            }
            StreamOutcome::Cancelled { emitted } => {
                self.finish(CallOutcome::Cancelled, Some(*emitted));
            }
            StreamOutcome::Failed { emitted, error } => {
                tracing::warn!(
                    call_id = %self.call_id,
                    method = self.method.as_str(),
                    error = %error,
                    "Stream terminated by fault"
                );
                self.finish(CallOutcome::Failed, Some(*emitted));
            }
        }
    }

    fn finish_with_error(self, error: &TradingError) {
        if error.is_cancelled() {
            self.finish(CallOutcome::Cancelled, None);
        } else {
            tracing::warn!(
                call_id = %self.call_id,
                method = self.method.as_str(),
                error = %error,
                "Call failed"
            );
            self.finish(CallOutcome::Failed, None);
        }
    }

    fn record(&mut self, outcome: CallOutcome, emitted: Option<u64>) {
        if self.finished {
            return;
        }
        self.finished = true;

        let elapsed = self.started_at.elapsed();
        self.stats.for_method(self.method).finish(outcome);
        metrics::record_call_finished(self.method, outcome, elapsed);

        let elapsed_ms = u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX);
        if outcome == CallOutcome::Cancelled {
            tracing::debug!(
                call_id = %self.call_id,
                method = self.method.as_str(),
                emitted,
                elapsed_ms,
                "Call cancelled"
            );
        } else {
            tracing::info!(
                call_id = %self.call_id,
                method = self.method.as_str(),
                outcome = outcome.as_str(),
                emitted,
                elapsed_ms,
                "Call finished"
            );
        }
    }
}

impl Drop for CallTracker {
    fn drop(&mut self) {
        self.record(CallOutcome::Cancelled, None);
    }
}

// =============================================================================
// Server Implementation
// =============================================================================

/// gRPC server for quotes and orders.
pub struct StockTradingServer {
    config: StockTradingServerConfig,
    handlers: ServiceHandlers,
    stats: Arc<ServiceStats>,
    shutdown: CancellationToken,
}

impl StockTradingServer {
    /// Create a new gRPC server.
    ///
    /// Streams in flight when `shutdown` fires end with `UNAVAILABLE`.
    #[must_use]
    pub fn new(
        config: StockTradingServerConfig,
        handlers: ServiceHandlers,
        shutdown: CancellationToken,
    ) -> Self {
        Self {
            config,
            handlers,
            stats: Arc::new(ServiceStats::default()),
            shutdown,
        }
    }

    /// Get the per-method call statistics.
    #[must_use]
    pub fn stats(&self) -> Arc<ServiceStats> {
        Arc::clone(&self.stats)
    }

    /// Get the server configuration.
    #[must_use]
    pub const fn config(&self) -> &StockTradingServerConfig {
        &self.config
    }

    fn track(&self, method: RpcMethod) -> CallTracker {
        CallTracker::start(method, Arc::clone(&self.stats))
    }
}

/// Map an inbound order stream into domain orders, counting each one.
fn inbound_orders(
    inbound: Streaming<proto::Order>,
    method: RpcMethod,
) -> impl Stream<Item = Result<Order, TradingError>> + Send + 'static {
    inbound.map(move |item| match item {
        Ok(order) => {
            metrics::record_orders_received(method, 1);
            Ok(order_from_proto(order))
        }
        Err(status) => Err(TradingError::from_inbound_status(&status)),
    })
}

/// Tell a still-connected caller that its stream ended because of shutdown.
async fn send_shutdown_notice<T>(
    tx: &mpsc::Sender<Result<T, TradingError>>,
    shutdown: &CancellationToken,
    outcome: &StreamOutcome,
) {
    if shutdown.is_cancelled() && matches!(outcome, StreamOutcome::Cancelled { .. }) {
        let notice = TradingError::upstream_unavailable("service shutting down");
        let _ = tx.send(Err(notice)).await;
    }
}

#[tonic::async_trait]
impl StockTradingService for StockTradingServer {
    type SubscribeQuoteStream = BoxedStream<proto::QuoteResponse>;
    type LiveTradeStream = BoxedStream<proto::TradeStatus>;

    async fn get_quote(
        &self,
        request: Request<proto::QuoteRequest>,
    ) -> RpcResult<proto::QuoteResponse> {
        let tracker = self.track(RpcMethod::GetQuote);
        let symbol = request.into_inner().symbol;

        match self.handlers.lookup.get_quote(&symbol).await {
            Ok(quote) => {
                tracker.finish(CallOutcome::Completed, Some(1));
                Ok(Response::new(quote_to_proto(&quote)))
            }
            Err(e) => {
                tracker.finish_with_error(&e);
                Err(e.into())
            }
        }
    }

    async fn subscribe_quote(
        &self,
        request: Request<proto::QuoteRequest>,
    ) -> RpcResult<Self::SubscribeQuoteStream> {
        let tracker = self.track(RpcMethod::SubscribeQuote);
        let symbol = request.into_inner().symbol;

        let (tx, rx) = mpsc::channel(self.config.stream_capacity);
        let subscription = self.handlers.subscription.clone();
        let shutdown = self.shutdown.clone();

        tokio::spawn(async move {
            let notice_tx = tx.clone();
            let outcome = subscription.run(symbol, tx, shutdown.clone()).await;
            send_shutdown_notice(&notice_tx, &shutdown, &outcome).await;
            metrics::record_quotes_streamed(outcome.emitted());
            tracker.finish_stream(&outcome);
        });

        let stream = ReceiverStream::new(rx).map(|item| match item {
            Ok(quote) => Ok(quote_to_proto(&quote)),
            Err(e) => Err(Status::from(e)),
        });
        Ok(Response::new(Box::pin(stream) as Self::SubscribeQuoteStream))
    }

    async fn submit_orders(
        &self,
        request: Request<Streaming<proto::Order>>,
    ) -> RpcResult<proto::OrderSummary> {
        let tracker = self.track(RpcMethod::SubmitOrders);
        let orders = inbound_orders(request.into_inner(), RpcMethod::SubmitOrders);

        let result = tokio::select! {
            result = self.handlers.aggregator.aggregate(orders) => result,
            () = self.shutdown.cancelled() => {
                Err(TradingError::upstream_unavailable("service shutting down"))
            }
        };

        match result {
            Ok(summary) => {
                tracker.finish(
                    CallOutcome::Completed,
                    u64::try_from(summary.total_orders).ok(),
                );
                Ok(Response::new(summary_to_proto(&summary)))
            }
            Err(e) => {
                tracker.finish_with_error(&e);
                Err(e.into())
            }
        }
    }

    async fn live_trade(
        &self,
        request: Request<Streaming<proto::Order>>,
    ) -> RpcResult<Self::LiveTradeStream> {
        let tracker = self.track(RpcMethod::LiveTrade);
        let orders = inbound_orders(request.into_inner(), RpcMethod::LiveTrade);

        let (tx, rx) = mpsc::channel(self.config.stream_capacity);
        let session = LiveTradingSession::new(Arc::clone(&self.handlers.order_policy));
        let shutdown = self.shutdown.clone();
        tracing::debug!(call_id = %tracker.call_id, session_id = %session.id(), "Live trading session opened");

        tokio::spawn(async move {
            let notice_tx = tx.clone();
            let outcome = session.run(orders, tx, shutdown.clone()).await;
            send_shutdown_notice(&notice_tx, &shutdown, &outcome).await;
            tracker.finish_stream(&outcome);
        });

        let stream = ReceiverStream::new(rx).map(|item| match item {
            Ok(status) => Ok(trade_status_to_proto(status)),
            Err(e) => Err(Status::from(e)),
        });
        Ok(Response::new(Box::pin(stream) as Self::LiveTradeStream))
    }
}

// =============================================================================
// Tests
// =============================================================================
