// @generated
// This file is @generated by prost-build.
/// Request for a single symbol.
#[derive(Clone, PartialEq, Eq, Hash, ::prost::Message)]
pub struct QuoteRequest {
    #[prost(string, tag = "1")]
    pub symbol: ::prost::alloc::string::String,
}
/// Quote snapshot. `timestamp` is RFC 3339 in UTC.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct QuoteResponse {
    #[prost(string, tag = "1")]
    pub symbol: ::prost::alloc::string::String,
    #[prost(double, tag = "2")]
    pub price: f64,
    #[prost(string, tag = "3")]
    pub timestamp: ::prost::alloc::string::String,
}
/// A single order sent by the client.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Order {
    #[prost(string, tag = "1")]
    pub order_id: ::prost::alloc::string::String,
    #[prost(string, tag = "2")]
    pub symbol: ::prost::alloc::string::String,
    #[prost(enumeration = "OrderSide", tag = "3")]
    pub side: i32,
    #[prost(double, tag = "4")]
    pub price: f64,
    #[prost(int32, tag = "5")]
    pub quantity: i32,
}
/// Aggregate over one SubmitOrders call.
#[derive(Clone, Copy, PartialEq, ::prost::Message)]
pub struct OrderSummary {
    #[prost(int32, tag = "1")]
    pub total_orders: i32,
    #[prost(int32, tag = "2")]
    pub success_count: i32,
    #[prost(double, tag = "3")]
    pub total_amount: f64,
}
/// Per-order outcome on the LiveTrade stream.
#[derive(Clone, PartialEq, Eq, Hash, ::prost::Message)]
pub struct TradeStatus {
    #[prost(string, tag = "1")]
    pub order_id: ::prost::alloc::string::String,
    #[prost(bool, tag = "2")]
    pub accepted: bool,
    #[prost(string, tag = "3")]
    pub message: ::prost::alloc::string::String,
}
/// Side of an order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, ::prost::Enumeration)]
#[repr(i32)]
pub enum OrderSide {
    Unspecified = 0,
    Buy = 1,
    Sell = 2,
}
impl OrderSide {
    /// String value of the enum field names used in the ProtoBuf definition.
    ///
    /// The values are not transformed in any way and thus are considered stable
    /// (if the ProtoBuf definition does not change) and safe for programmatic use.
    pub fn as_str_name(&self) -> &'static str {
        match self {
            Self::Unspecified => "ORDER_SIDE_UNSPECIFIED",
            Self::Buy => "ORDER_SIDE_BUY",
            Self::Sell => "ORDER_SIDE_SELL",
        }
    }
    /// Creates an enum from field names used in the ProtoBuf definition.
    pub fn from_str_name(value: &str) -> ::core::option::Option<Self> {
        match value {
            "ORDER_SIDE_UNSPECIFIED" => Some(Self::Unspecified),
            "ORDER_SIDE_BUY" => Some(Self::Buy),
            "ORDER_SIDE_SELL" => Some(Self::Sell),
            _ => None,
        }
    }
}
