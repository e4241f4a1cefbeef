//! gRPC Service Adapter
//!
//! Implements the `StockTradingService` gRPC service on top of the
//! application handlers.
//!
//! # Architecture
//!
//! Each call shape maps to one handler:
//!
//! 1. `GetQuote` awaits `QuoteLookup` and converts the result
//! 2. `SubscribeQuote` spawns a `QuoteSubscription` producer task
//! 3. `SubmitOrders` feeds the inbound stream to `OrderAggregator`
//! 4. `LiveTrade` spawns a `LiveTradingSession` over the inbound stream
//!
//! Streaming producers write into a bounded channel wrapped in a
//! `ReceiverStream`; tonic drops that stream when the caller goes away,
//! which closes the channel and stops the producer.
//!
//! # Module Structure
//!
//! - `converters`: Conversions between proto and domain types
//! - `server`: Service implementation and per-method call statistics

mod converters;
pub mod server;

/// Include generated protobuf code.
/// The generated code is in packages/schema-gen/rust/stocktrading/v1/
#[allow(
    dead_code,
    missing_docs,
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    clippy::unwrap_used,
    clippy::expect_used
)]
pub mod proto {
    pub mod stocktrading {
        pub mod v1 {
            include!(concat!(
                env!("CARGO_MANIFEST_DIR"),
                "/../../packages/schema-gen/rust/stocktrading/v1/stocktrading.v1.rs"
            ));
            include!(concat!(
                env!("CARGO_MANIFEST_DIR"),
                "/../../packages/schema-gen/rust/stocktrading/v1/stocktrading.v1.tonic.rs"
            ));
        }
    }
}

pub use server::{
    CallStats, CallStatsSnapshot, ServiceHandlers, ServiceStats, StockTradingServer,
    StockTradingServerConfig,
};
