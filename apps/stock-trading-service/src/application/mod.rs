//! Application Layer - Call handlers and port definitions.
//!
//! This layer contains the four call handlers (lookup, subscription,
//! aggregation, live trading) and the port interfaces they depend on.
//! Handlers speak domain types and channels; the gRPC adapter in the
//! infrastructure layer bridges them to the wire.

/// Port interfaces for external collaborators (quote store, prices, time).
pub mod ports;

/// Call handlers, one per call shape.
pub mod services;
