//! Client-streamed order aggregation.

use std::sync::Arc;

use futures::{Stream, StreamExt};

use crate::domain::order::{Order, OrderPolicy, OrderSummary};
use crate::error::TradingError;

/// Folds the orders of one `SubmitOrders` call into a single summary.
///
/// The summary is produced only after the inbound stream ends normally. An
/// inbound fault abandons the partial aggregate and surfaces as the call's
/// error; no partial summary is ever returned.
#[derive(Clone)]
pub struct OrderAggregator {
    policy: Arc<dyn OrderPolicy>,
}

impl OrderAggregator {
    /// Create an aggregator that evaluates orders with `policy`.
    #[must_use]
    pub fn new(policy: Arc<dyn OrderPolicy>) -> Self {
        Self { policy }
    }

    /// Consume `orders` to completion and return the summary.
    ///
    /// # Errors
    ///
    /// Returns the inbound stream's error if it fails before completing, or
    /// `STREAM_FAILURE` if an order cannot be evaluated.
    pub async fn aggregate<S>(&self, orders: S) -> Result<OrderSummary, TradingError>
    where
        S: Stream<Item = Result<Order, TradingError>> + Send,
    {
        let mut orders = std::pin::pin!(orders);
        let mut summary = OrderSummary::default();

        while let Some(next) = orders.next().await {
            let order = next.inspect_err(|e| {
                tracing::warn!(
                    error = %e,
                    received = summary.total_orders,
                    "Order stream failed before completion"
                );
            })?;

            let verdict = self.policy.evaluate(&order).map_err(|e| {
                TradingError::stream_failure(e.to_string())
                    .with_context("order_id", order.order_id.as_str())
            })?;

            tracing::debug!(
                order_id = %order.order_id,
                symbol = %order.symbol,
                side = order.side.as_str(),
                accepted = verdict.is_accepted(),
                "Order aggregated"
            );
            summary.record(&order, &verdict).map_err(|e| {
                TradingError::stream_failure(e.to_string())
                    .with_context("order_id", order.order_id.as_str())
            })?;
        }

        tracing::info!(
            total_orders = summary.total_orders,
            success_count = summary.success_count,
            total_amount = summary.total_amount,
            policy = self.policy.name(),
            "Order stream summarized"
        );
        Ok(summary)
    }
}
