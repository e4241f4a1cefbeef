//! Type conversion functions between proto and domain types.
//!
//! Proto enums travel as `i32`; values this build does not know map to
//! `OrderSide::Unspecified` rather than failing the stream.

use super::proto::stocktrading::v1 as proto;
use crate::domain::order::{Order, OrderSide, OrderSummary, TradeStatus};
use crate::domain::quote::{Quote, format_timestamp};

/// Convert a domain quote to the wire response.
pub fn quote_to_proto(quote: &Quote) -> proto::QuoteResponse {
    proto::QuoteResponse {
        symbol: quote.symbol.clone(),
        price: quote.price,
        timestamp: format_timestamp(quote.as_of),
    }
}

/// Convert a wire order side to the domain side.
pub fn side_from_proto(side: i32) -> OrderSide {
    match proto::OrderSide::try_from(side) {
        Ok(proto::OrderSide::Buy) => OrderSide::Buy,
        Ok(proto::OrderSide::Sell) => OrderSide::Sell,
        Ok(proto::OrderSide::Unspecified) | Err(_) => OrderSide::Unspecified,
    }
}

/// Convert a wire order to the domain order.
pub fn order_from_proto(order: proto::Order) -> Order {
    Order {
        side: side_from_proto(order.side),
        order_id: order.order_id,
        symbol: order.symbol,
        price: order.price,
        quantity: order.quantity,
    }
}

/// Convert a domain summary to the wire message.
pub const fn summary_to_proto(summary: &OrderSummary) -> proto::OrderSummary {
    proto::OrderSummary {
        total_orders: summary.total_orders,
        success_count: summary.success_count,
        total_amount: summary.total_amount,
    }
}

/// Convert a domain trade status to the wire message.
pub fn trade_status_to_proto(status: TradeStatus) -> proto::TradeStatus {
    proto::TradeStatus {
        order_id: status.order_id,
        accepted: status.accepted,
        message: status.message,
    }
}
