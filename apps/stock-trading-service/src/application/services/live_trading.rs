//! Bidirectional live trading session.
//!
//! For every order read from the inbound stream the session evaluates it and
//! writes exactly one `TradeStatus`, in arrival order. Only one order is in
//! flight at a time: the next order is not read until the status for the
//! previous one has been accepted by the outbound channel, so a slow reader
//! throttles the writer through transport flow control.

use std::sync::Arc;

use futures::{Stream, StreamExt};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use super::StreamOutcome;
use crate::domain::order::{Order, OrderPolicy, TradeStatus};
use crate::error::TradingError;

/// One `LiveTrade` call.
pub struct LiveTradingSession {
    id: Uuid,
    policy: Arc<dyn OrderPolicy>,
}

impl LiveTradingSession {
    /// Open a session that evaluates orders with `policy`.
    #[must_use]
    pub fn new(policy: Arc<dyn OrderPolicy>) -> Self {
        Self {
            id: Uuid::new_v4(),
            policy,
        }
    }

    /// Session identifier used in logs and error context.
    #[must_use]
    pub const fn id(&self) -> Uuid {
        self.id
    }

    /// Drive the session until the inbound stream ends, the consumer goes
    /// away, `shutdown` fires, or a fault occurs.
    ///
    /// A fault (inbound failure other than cancellation, or an order that
    /// cannot be evaluated) is sent on `tx` as the terminal `Err`.
    pub async fn run<S>(
        self,
        orders: S,
        tx: mpsc::Sender<Result<TradeStatus, TradingError>>,
        shutdown: CancellationToken,
    ) -> StreamOutcome
    where
        S: Stream<Item = Result<Order, TradingError>> + Send,
    {
        let mut orders = std::pin::pin!(orders);
        let mut emitted = 0_u64;

        loop {
            let next = tokio::select! {
                biased;
                () = tx.closed() => return StreamOutcome::Cancelled { emitted },
                () = shutdown.cancelled() => return StreamOutcome::Cancelled { emitted },
                next = orders.next() => next,
            };

            let order = match next {
                None => return StreamOutcome::Completed { emitted },
                Some(Err(e)) if e.is_cancelled() => {
                    tracing::debug!(session_id = %self.id, "Caller cancelled live trade");
                    return StreamOutcome::Cancelled { emitted };
                }
                Some(Err(e)) => {
                    let error = e.with_context("session_id", self.id.to_string());
                    return fail(&tx, emitted, error).await;
                }
                Some(Ok(order)) => order,
            };

            let verdict = match self.policy.evaluate(&order) {
                Ok(verdict) => verdict,
                Err(e) => {
                    let error = TradingError::stream_failure(e.to_string())
                        .with_context("session_id", self.id.to_string())
                        .with_context("order_id", order.order_id.as_str());
                    return fail(&tx, emitted, error).await;
                }
            };

            tracing::debug!(
                session_id = %self.id,
                order_id = %order.order_id,
                symbol = %order.symbol,
                side = order.side.as_str(),
                price = order.price,
                quantity = order.quantity,
                accepted = verdict.is_accepted(),
                "Live order evaluated"
            );

            let status = TradeStatus::for_order(&order, &verdict);
            tokio::select! {
                biased;
                () = shutdown.cancelled() => return StreamOutcome::Cancelled { emitted },
                sent = tx.send(Ok(status)) => {
                    if sent.is_err() {
                        return StreamOutcome::Cancelled { emitted };
                    }
                }
            }
            emitted += 1;
        }
    }
}

async fn fail(
    tx: &mpsc::Sender<Result<TradeStatus, TradingError>>,
    emitted: u64,
    error: TradingError,
) -> StreamOutcome {
    let _ = tx.send(Err(error.clone())).await;
    StreamOutcome::Failed { emitted, error }
}
