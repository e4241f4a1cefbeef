//! Domain Layer - Quote and order types and business rules.
//!
//! This layer holds the canonical internal representation of quotes and
//! orders, the per-call order summary accumulator, and the order evaluation
//! policies. Nothing here knows about gRPC or tokio.

/// Quote snapshots and timestamp formatting.
pub mod quote;

/// Orders, trade statuses, summaries and evaluation policies.
pub mod order;
