//! Infrastructure Layer - Adapters and external integrations.
//!
//! This layer contains the concrete implementations of the port interfaces
//! defined in the application layer, plus the transport and ops surfaces.

/// gRPC service adapter and generated wire types.
pub mod grpc;

/// In-memory quote store adapter.
pub mod store;

/// Price source and clock adapters.
pub mod pricing;

/// Configuration loading.
pub mod config;

/// Health check HTTP endpoint.
pub mod health;

/// Prometheus metrics instrumentation.
pub mod metrics;

/// Logging and OpenTelemetry tracing.
pub mod telemetry;
