//! Server-paced quote subscription.
//!
//! A subscription emits a fixed number of sampled quotes for one symbol,
//! waiting one interval between emissions, then completes:
//!
//! ```text
//! OPEN -> EMITTING(0..count) -> COMPLETED
//!   \________ fault ________-> FAILED     (error sent as terminal signal)
//!   \____ consumer gone ____-> CANCELLED  (nothing more is sent)
//! ```
//!
//! The producer runs as its own task and writes into a bounded channel.
//! Each quote is stamped when it is handed to the channel, and the next
//! pacing wait starts after that hand-off, so a slow consumer delays the
//! stream without compressing the gaps between quotes. Cancellation is
//! observed while waiting on the pacing ticker and while blocked on a full
//! channel, so an abandoned subscription stops within one scheduling step.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use super::StreamOutcome;
use crate::application::ports::{Clock, PriceSource};
use crate::domain::quote::{Quote, Symbol};
use crate::error::TradingError;

/// Emission count and pacing for one subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubscriptionSettings {
    /// Quotes emitted per subscription.
    pub count: u32,
    /// Wait between consecutive emissions.
    pub interval: Duration,
}

impl Default for SubscriptionSettings {
    fn default() -> Self {
        Self {
            count: 10,
            interval: Duration::from_secs(1),
        }
    }
}

/// Produces the quote stream for `SubscribeQuote`.
#[derive(Clone)]
pub struct QuoteSubscription {
    price_source: Arc<dyn PriceSource>,
    clock: Arc<dyn Clock>,
    settings: SubscriptionSettings,
}

impl QuoteSubscription {
    /// Create a subscription handler.
    #[must_use]
    pub fn new(
        price_source: Arc<dyn PriceSource>,
        clock: Arc<dyn Clock>,
        settings: SubscriptionSettings,
    ) -> Self {
        Self {
            price_source,
            clock,
            settings,
        }
    }

    /// Emission settings in effect.
    #[must_use]
    pub const fn settings(&self) -> SubscriptionSettings {
        self.settings
    }

    /// Run one subscription to its terminal state.
    ///
    /// Quotes are sent on `tx`; a fault is sent as a final `Err`. The call
    /// stops without sending anything further once `tx` is closed by the
    /// consumer or `shutdown` is cancelled.
    pub async fn run(
        self,
        symbol: Symbol,
        tx: mpsc::Sender<Result<Quote, TradingError>>,
        shutdown: CancellationToken,
    ) -> StreamOutcome {
        let mut emitted = 0_u64;

        for index in 0..self.settings.count {
            if index > 0 {
                // Interval runs from the previous emission.
                let mut ticker = self.clock.ticker(self.settings.interval);
                tokio::select! {
                    biased;
                    () = tx.closed() => return StreamOutcome::Cancelled { emitted },
                    () = shutdown.cancelled() => return StreamOutcome::Cancelled { emitted },
                    tick = ticker.tick() => {
                        if let Err(e) = tick {
                            let error = TradingError::stream_failure(e.to_string())
                                .with_context("symbol", symbol.as_str());
                            return fail(&tx, emitted, error).await;
                        }
                    }
                }
            }

            let price = match self.price_source.next_price(&symbol).await {
                Ok(price) => price,
                Err(e) => {
                    let error = TradingError::stream_failure(e.to_string())
                        .with_context("symbol", symbol.as_str());
                    return fail(&tx, emitted, error).await;
                }
            };

            let permit = tokio::select! {
                biased;
                () = shutdown.cancelled() => return StreamOutcome::Cancelled { emitted },
                permit = tx.reserve() => match permit {
                    Ok(permit) => permit,
                    Err(_) => return StreamOutcome::Cancelled { emitted },
                },
            };
            // Stamp only once channel capacity is held.
            permit.send(Ok(Quote::new(symbol.as_str(), price, self.clock.now())));
            emitted += 1;
            tracing::trace!(symbol = %symbol, index, price, "Quote emitted");
        }

        StreamOutcome::Completed { emitted }
    }
}

async fn fail(
    tx: &mpsc::Sender<Result<Quote, TradingError>>,
    emitted: u64,
    error: TradingError,
) -> StreamOutcome {
    // The consumer may already be gone; the outcome is a failure either way.
    let _ = tx.send(Err(error.clone())).await;
    StreamOutcome::Failed { emitted, error }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;
    use chrono::{DateTime, Utc};

    use super::*;
    use crate::application::ports::{PacingError, PriceSourceError, Ticker};
    use crate::error::ErrorCode;
    use crate::infrastructure::pricing::{ScriptedPriceSource, SystemClock};

    struct FailingPriceSource {
        fail_at: usize,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl PriceSource for FailingPriceSource {
        async fn next_price(&self, symbol: &str) -> Result<f64, PriceSourceError> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            if call == self.fail_at {
                return Err(PriceSourceError {
                    symbol: symbol.to_string(),
                    reason: "feed offline".to_string(),
                });
            }
            Ok(100.0)
        }
    }

    struct BrokenTicker;

    #[async_trait]
    impl Ticker for BrokenTicker {
        async fn tick(&mut self) -> Result<(), PacingError> {
            Err(PacingError("timer wheel shut down".to_string()))
        }
    }

    struct BrokenClock;

    impl Clock for BrokenClock {
        fn now(&self) -> DateTime<Utc> {
            Utc::now()
        }

        fn ticker(&self, _period: Duration) -> Box<dyn Ticker> {
            Box::new(BrokenTicker)
        }
    }

    /// Wall clock that follows tokio's (pausable) time.
    struct TokioClock {
        origin: tokio::time::Instant,
        base: DateTime<Utc>,
    }

    impl TokioClock {
        fn new() -> Self {
            Self {
                origin: tokio::time::Instant::now(),
                base: DateTime::<Utc>::from_timestamp(0, 0).unwrap(),
            }
        }
    }

    impl Clock for TokioClock {
        fn now(&self) -> DateTime<Utc> {
            let elapsed = chrono::Duration::from_std(self.origin.elapsed()).unwrap();
            self.base + elapsed
        }

        fn ticker(&self, period: Duration) -> Box<dyn Ticker> {
            SystemClock.ticker(period)
        }
    }

    fn subscription(price_source: Arc<dyn PriceSource>, clock: Arc<dyn Clock>) -> QuoteSubscription {
        QuoteSubscription::new(price_source, clock, SubscriptionSettings::default())
    }

    #[tokio::test(start_paused = true)]
    async fn emits_count_quotes_then_completes() {
        let prices = Arc::new(ScriptedPriceSource::new(vec![10.0, 20.0, 30.0]));
        let sub = subscription(prices, Arc::new(SystemClock));
        let (tx, mut rx) = mpsc::channel(4);

        let handle = tokio::spawn(sub.run("AAPL".to_string(), tx, CancellationToken::new()));

        let mut received = Vec::new();
        while let Some(item) = rx.recv().await {
            received.push(item.unwrap());
        }

        let outcome = handle.await.unwrap();
        assert!(matches!(outcome, StreamOutcome::Completed { emitted: 10 }));
        assert_eq!(received.len(), 10);
        assert!(received.iter().all(|q| q.symbol == "AAPL"));
        let prices: Vec<f64> = received.iter().take(4).map(|q| q.price).collect();
        assert_eq!(prices, vec![10.0, 20.0, 30.0, 10.0]);
    }

    #[tokio::test(start_paused = true)]
    async fn emissions_are_paced_by_interval() {
        let prices = Arc::new(ScriptedPriceSource::new(vec![1.0]));
        let sub = subscription(prices, Arc::new(SystemClock));
        let (tx, mut rx) = mpsc::channel(16);
        let started = tokio::time::Instant::now();

        tokio::spawn(sub.run("AAPL".to_string(), tx, CancellationToken::new()));

        rx.recv().await.unwrap().unwrap();
        assert_eq!(started.elapsed(), Duration::ZERO);

        rx.recv().await.unwrap().unwrap();
        assert_eq!(started.elapsed(), Duration::from_secs(1));

        while rx.recv().await.is_some() {}
        assert_eq!(started.elapsed(), Duration::from_secs(9));
    }

    #[tokio::test(start_paused = true)]
    async fn consumer_drop_cancels_without_further_emission() {
        let prices = Arc::new(ScriptedPriceSource::new(vec![1.0]));
        let sub = subscription(prices, Arc::new(SystemClock));
        let (tx, mut rx) = mpsc::channel(1);

        let handle = tokio::spawn(sub.run("AAPL".to_string(), tx, CancellationToken::new()));

        for _ in 0..3 {
            rx.recv().await.unwrap().unwrap();
        }
        drop(rx);

        let outcome = handle.await.unwrap();
        assert!(matches!(outcome, StreamOutcome::Cancelled { .. }));
        assert!(outcome.emitted() <= 4);
    }

    #[tokio::test(start_paused = true)]
    async fn shutdown_interrupts_pending_wait() {
        let prices = Arc::new(ScriptedPriceSource::new(vec![1.0]));
        let settings = SubscriptionSettings {
            count: 3,
            interval: Duration::from_secs(3600),
        };
        let sub = QuoteSubscription::new(prices, Arc::new(SystemClock), settings);
        let (tx, mut rx) = mpsc::channel(4);
        let shutdown = CancellationToken::new();

        let handle = tokio::spawn(sub.run("AAPL".to_string(), tx, shutdown.clone()));
        rx.recv().await.unwrap().unwrap();

        let started = tokio::time::Instant::now();
        shutdown.cancel();
        let outcome = handle.await.unwrap();

        assert!(matches!(outcome, StreamOutcome::Cancelled { emitted: 1 }));
        assert!(started.elapsed() < Duration::from_secs(3600));
        assert!(rx.recv().await.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn price_source_fault_terminates_with_error() {
        let prices = Arc::new(FailingPriceSource {
            fail_at: 2,
            calls: AtomicUsize::new(0),
        });
        let sub = subscription(prices, Arc::new(SystemClock));
        let (tx, mut rx) = mpsc::channel(16);

        let outcome = tokio::spawn(sub.run("AAPL".to_string(), tx, CancellationToken::new()))
            .await
            .unwrap();

        assert!(rx.recv().await.unwrap().is_ok());
        assert!(rx.recv().await.unwrap().is_ok());
        let terminal = rx.recv().await.unwrap().unwrap_err();
        assert_eq!(terminal.code(), ErrorCode::StreamFailure);
        assert!(terminal.message().contains("feed offline"));
        assert!(rx.recv().await.is_none());
        assert!(matches!(outcome, StreamOutcome::Failed { emitted: 2, .. }));
    }

    #[tokio::test]
    async fn pacing_fault_terminates_with_error() {
        let prices = Arc::new(ScriptedPriceSource::new(vec![5.0]));
        let sub = subscription(prices, Arc::new(BrokenClock));
        let (tx, mut rx) = mpsc::channel(16);

        let outcome = sub
            .run("GOOGL".to_string(), tx, CancellationToken::new())
            .await;

        assert!(rx.recv().await.unwrap().is_ok());
        let terminal = rx.recv().await.unwrap().unwrap_err();
        assert_eq!(terminal.code(), ErrorCode::StreamFailure);
        assert!(matches!(outcome, StreamOutcome::Failed { emitted: 1, .. }));
    }

    #[tokio::test(start_paused = true)]
    async fn stalled_consumer_gets_fresh_stamps_and_full_gaps() {
        let prices = Arc::new(ScriptedPriceSource::new(vec![1.0]));
        let settings = SubscriptionSettings {
            count: 5,
            interval: Duration::from_secs(1),
        };
        let sub = QuoteSubscription::new(prices, Arc::new(TokioClock::new()), settings);
        let (tx, mut rx) = mpsc::channel(1);
        let started = tokio::time::Instant::now();

        let handle = tokio::spawn(sub.run("AAPL".to_string(), tx, CancellationToken::new()));

        let mut stamps = Vec::new();
        stamps.push(rx.recv().await.unwrap().unwrap().as_of.timestamp_millis());
        tokio::time::sleep(Duration::from_secs(5)).await;
        while let Some(item) = rx.recv().await {
            let quote = item.unwrap();
            stamps.push(quote.as_of.timestamp_millis());
        }

        // The second quote sat in the buffer; the third waited for capacity
        // and is stamped when it was actually handed over.
        assert_eq!(stamps, vec![0, 1_000, 5_000, 6_000, 7_000]);
        assert!(stamps.windows(2).all(|pair| pair[1] - pair[0] >= 1_000));
        assert_eq!(started.elapsed(), Duration::from_secs(7));
        assert!(matches!(
            handle.await.unwrap(),
            StreamOutcome::Completed { emitted: 5 }
        ));
    }
}
