//! Handler Integration Tests
//!
//! Drives the call handlers directly over channels, without a transport,
//! to check per-call isolation and timing under concurrency.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::float_cmp)]

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, TimeZone, Utc};
use futures::stream;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use stock_trading_service::application::ports::{Clock, Ticker};
use stock_trading_service::infrastructure::pricing::IntervalTicker;
use stock_trading_service::{
    AcceptAllPolicy, ErrorCode, LiveTradingSession, Order, OrderAggregator, OrderSide,
    QuoteSubscription, ScriptedPriceSource, StreamOutcome, SubscriptionSettings, TradingError,
    ValidatingPolicy,
};

/// Clock frozen at a fixed instant, pacing on tokio time.
struct FixedClock(DateTime<Utc>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }

    fn ticker(&self, period: Duration) -> Box<dyn Ticker> {
        Box::new(IntervalTicker::new(period))
    }
}

fn fixed_clock() -> Arc<FixedClock> {
    Arc::new(FixedClock(Utc.with_ymd_and_hms(2024, 3, 1, 14, 30, 0).unwrap()))
}

fn order(id: &str, price: f64, quantity: i32) -> Order {
    Order {
        order_id: id.to_string(),
        symbol: "AAPL".to_string(),
        side: OrderSide::Buy,
        price,
        quantity,
    }
}

// =============================================================================
// Subscriptions
// =============================================================================

#[tokio::test(start_paused = true)]
async fn concurrent_subscriptions_are_independent() {
    let subscription = QuoteSubscription::new(
        Arc::new(ScriptedPriceSource::new(vec![50.0])),
        fixed_clock(),
        SubscriptionSettings::default(),
    );

    let mut handles = Vec::new();
    let mut receivers = Vec::new();
    for symbol in ["AAPL", "GOOGL", "AMZN"] {
        let (tx, rx) = mpsc::channel(16);
        let run = subscription
            .clone()
            .run(symbol.to_string(), tx, CancellationToken::new());
        handles.push(tokio::spawn(run));
        receivers.push((symbol, rx));
    }

    // Abandon the middle subscription after its first quote.
    let (_, mut abandoned) = receivers.remove(1);
    assert!(abandoned.recv().await.is_some());
    drop(abandoned);

    for (symbol, mut rx) in receivers {
        let mut count = 0;
        while let Some(item) = rx.recv().await {
            let quote = item.unwrap();
            assert_eq!(quote.symbol, symbol);
            assert_eq!(quote.timestamp(), "2024-03-01T14:30:00Z");
            count += 1;
        }
        assert_eq!(count, 10);
    }

    let outcomes: Vec<StreamOutcome> = futures::future::join_all(handles)
        .await
        .into_iter()
        .map(Result::unwrap)
        .collect();

    assert!(matches!(outcomes[0], StreamOutcome::Completed { emitted: 10 }));
    assert!(matches!(outcomes[1], StreamOutcome::Cancelled { .. }));
    assert!(matches!(outcomes[2], StreamOutcome::Completed { emitted: 10 }));
}

#[tokio::test(start_paused = true)]
async fn shared_shutdown_stops_every_subscription() {
    let subscription = QuoteSubscription::new(
        Arc::new(ScriptedPriceSource::new(vec![1.0])),
        fixed_clock(),
        SubscriptionSettings::default(),
    );
    let shutdown = CancellationToken::new();

    let mut handles = Vec::new();
    let mut receivers = Vec::new();
    for symbol in ["AAPL", "GOOGL"] {
        let (tx, rx) = mpsc::channel(16);
        handles.push(tokio::spawn(subscription.clone().run(
            symbol.to_string(),
            tx,
            shutdown.clone(),
        )));
        receivers.push(rx);
    }

    tokio::time::sleep(Duration::from_millis(2500)).await;
    shutdown.cancel();

    for handle in handles {
        let outcome = handle.await.unwrap();
        assert!(matches!(outcome, StreamOutcome::Cancelled { emitted: 3 }));
    }
    for mut rx in receivers {
        let mut received = 0;
        while rx.recv().await.is_some() {
            received += 1;
        }
        assert_eq!(received, 3);
    }
}

// =============================================================================
// Order Aggregation
// =============================================================================

#[tokio::test]
async fn aggregators_share_nothing_between_calls() {
    let aggregator = OrderAggregator::new(Arc::new(AcceptAllPolicy));

    let first = stream::iter(vec![Ok(order("a", 10.0, 2)), Ok(order("b", 5.0, 4))]);
    let second = stream::iter(vec![Ok(order("c", 1.5, 2))]);

    let (first, second) = tokio::join!(aggregator.aggregate(first), aggregator.aggregate(second));

    let first = first.unwrap();
    let second = second.unwrap();
    assert_eq!(first.total_orders, 2);
    assert_eq!(first.total_amount, 40.0);
    assert_eq!(second.total_orders, 1);
    assert_eq!(second.total_amount, 3.0);
}

#[tokio::test]
async fn aggregation_fault_discards_partial_summary() {
    let aggregator = OrderAggregator::new(Arc::new(AcceptAllPolicy));

    let orders = stream::iter(vec![
        Ok(order("a", 10.0, 1)),
        Err(TradingError::stream_failure("connection reset")),
        Ok(order("b", 10.0, 1)),
    ]);

    let error = aggregator.aggregate(orders).await.unwrap_err();

    assert_eq!(error.code(), ErrorCode::StreamFailure);
}

// =============================================================================
// Live Trading
// =============================================================================

#[tokio::test]
async fn live_sessions_interleave_without_crosstalk() {
    let policy = Arc::new(ValidatingPolicy);

    let (in_a, rx_a_in) = mpsc::channel::<Result<Order, TradingError>>(4);
    let (in_b, rx_b_in) = mpsc::channel::<Result<Order, TradingError>>(4);
    let (tx_a, mut out_a) = mpsc::channel(4);
    let (tx_b, mut out_b) = mpsc::channel(4);

    let session_a = LiveTradingSession::new(policy.clone());
    let session_b = LiveTradingSession::new(policy);
    assert_ne!(session_a.id(), session_b.id());

    let run_a = tokio::spawn(session_a.run(
        tokio_stream::wrappers::ReceiverStream::new(rx_a_in),
        tx_a,
        CancellationToken::new(),
    ));
    let run_b = tokio::spawn(session_b.run(
        tokio_stream::wrappers::ReceiverStream::new(rx_b_in),
        tx_b,
        CancellationToken::new(),
    ));

    in_a.send(Ok(order("a-1", 10.0, 1))).await.unwrap();
    in_b.send(Ok(order("b-1", 10.0, 0))).await.unwrap();
    in_a.send(Ok(order("a-2", 12.0, 3))).await.unwrap();

    let b1 = out_b.recv().await.unwrap().unwrap();
    assert_eq!(b1.order_id, "b-1");
    assert!(!b1.accepted);

    let a1 = out_a.recv().await.unwrap().unwrap();
    let a2 = out_a.recv().await.unwrap().unwrap();
    assert_eq!((a1.order_id.as_str(), a2.order_id.as_str()), ("a-1", "a-2"));
    assert!(a1.accepted && a2.accepted);

    drop(in_a);
    drop(in_b);

    assert!(matches!(
        run_a.await.unwrap(),
        StreamOutcome::Completed { emitted: 2 }
    ));
    assert!(matches!(
        run_b.await.unwrap(),
        StreamOutcome::Completed { emitted: 1 }
    ));
    assert!(out_a.recv().await.is_none());
    assert!(out_b.recv().await.is_none());
}
