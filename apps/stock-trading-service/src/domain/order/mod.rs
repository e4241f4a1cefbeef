//! Order Types
//!
//! Orders arrive one per streamed unit on `SubmitOrders` and `LiveTrade`.
//! Each order is evaluated by an [`OrderPolicy`] into a [`Verdict`]; the
//! verdict drives both the per-order [`TradeStatus`] and the running
//! [`OrderSummary`].
//!
//! # Invariants
//!
//! - Every recorded order increments `total_orders` exactly once.
//! - Every accepted order adds one to `success_count` and its full notional
//!   (`price * quantity`) to `total_amount`.
//! - Rejected orders count toward `total_orders` only.
//! - A summary at `i32::MAX` orders refuses further orders instead of
//!   miscounting.

mod policy;

pub use policy::{AcceptAllPolicy, OrderPolicy, OrderPolicyError, ValidatingPolicy};

use crate::domain::quote::Symbol;

// =============================================================================
// Order
// =============================================================================

/// Side of an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum OrderSide {
    /// Side not set by the producer.
    #[default]
    Unspecified,
    /// Buy order.
    Buy,
    /// Sell order.
    Sell,
}

impl OrderSide {
    /// Side label for logs.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Unspecified => "UNSPECIFIED",
            Self::Buy => "BUY",
            Self::Sell => "SELL",
        }
    }
}

/// A single client order.
///
/// Price and quantity are expected to be non-negative, but that is the
/// producer's responsibility; only [`ValidatingPolicy`] enforces it.
#[derive(Debug, Clone, PartialEq)]
pub struct Order {
    /// Client-assigned order identifier.
    pub order_id: String,
    /// Ticker symbol.
    pub symbol: Symbol,
    /// Buy or sell.
    pub side: OrderSide,
    /// Limit price per share.
    pub price: f64,
    /// Number of shares.
    pub quantity: i32,
}

impl Order {
    /// Price times quantity.
    #[must_use]
    pub fn notional(&self) -> f64 {
        self.price * f64::from(self.quantity)
    }
}

// =============================================================================
// Verdict and Trade Status
// =============================================================================

/// Outcome of evaluating one order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    /// Order accepted.
    Accepted,
    /// Order rejected with a human-readable reason.
    Rejected {
        /// Why the order was rejected.
        reason: String,
    },
}

impl Verdict {
    /// Whether the order was accepted.
    #[must_use]
    pub const fn is_accepted(&self) -> bool {
        matches!(self, Self::Accepted)
    }
}

/// Per-order reply on a live trading session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TradeStatus {
    /// Identifier of the order this status answers.
    pub order_id: String,
    /// Whether the order was accepted.
    pub accepted: bool,
    /// Human-readable outcome.
    pub message: String,
}

impl TradeStatus {
    /// Build the status for an evaluated order.
    #[must_use]
    pub fn for_order(order: &Order, verdict: &Verdict) -> Self {
        let message = match verdict {
            Verdict::Accepted => format!("Order {} accepted", order.order_id),
            Verdict::Rejected { reason } => {
                format!("Order {} rejected: {reason}", order.order_id)
            }
        };

        Self {
            order_id: order.order_id.clone(),
            accepted: verdict.is_accepted(),
            message,
        }
    }
}

// =============================================================================
// Order Summary
// =============================================================================

/// Running aggregate over one order stream.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct OrderSummary {
    /// Orders received.
    pub total_orders: i32,
    /// Orders accepted.
    pub success_count: i32,
    /// Sum of `price * quantity` over accepted orders.
    pub total_amount: f64,
}

/// The summary cannot count any more orders.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("order summary cannot count more than {} orders", i32::MAX)]
pub struct SummaryOverflow;

impl OrderSummary {
    /// Fold one evaluated order into the summary.
    ///
    /// # Errors
    ///
    /// Returns `SummaryOverflow`, leaving the summary unchanged, once
    /// `total_orders` has reached `i32::MAX`.
    pub fn record(&mut self, order: &Order, verdict: &Verdict) -> Result<(), SummaryOverflow> {
        let total_orders = self.total_orders.checked_add(1).ok_or(SummaryOverflow)?;
        if verdict.is_accepted() {
            self.success_count = self.success_count.checked_add(1).ok_or(SummaryOverflow)?;
            self.total_amount += order.notional();
        }
        self.total_orders = total_orders;
        Ok(())
    }

    /// Orders received but not accepted.
    #[must_use]
    pub const fn rejected_count(&self) -> i32 {
        self.total_orders - self.success_count
    }
}
