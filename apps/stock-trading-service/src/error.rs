//! Error taxonomy for the stock trading service.
//!
//! Every handler fault is a [`TradingError`] carrying an [`ErrorCode`]. The
//! gRPC adapter converts it into a `tonic::Status` with rich `ErrorInfo`
//! details, so a caller always receives either a well-formed response or an
//! explicit terminal status.
//!
//! # gRPC Status Codes
//!
//! | Code | Name | Usage |
//! |------|------|-------|
//! | `INVALID_ARGUMENT` (3) | Invalid Argument | Empty symbol on lookup |
//! | `NOT_FOUND` (5) | Not Found | Unknown symbol |
//! | `UNAVAILABLE` (14) | Unavailable | Store, price source or transport down |
//! | `CANCELLED` (1) | Cancelled | Caller ended the call early |
//! | `ABORTED` (10) | Aborted | Mid-stream fault, stream terminated |
//! | `INTERNAL` (13) | Internal Error | Unexpected server error |

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tonic::Code;
use tonic_types::{ErrorDetails, StatusExt};

/// Domain for stock trading service errors.
pub const ERROR_DOMAIN: &str = "stocktrading.service";

/// Error codes for the stock trading service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// Malformed request (e.g. empty symbol).
    InvalidRequest,
    /// Symbol has no stored quote.
    SymbolNotFound,
    /// Quote store, price source or transport is unavailable.
    UpstreamUnavailable,
    /// Caller ended the call early.
    Cancelled,
    /// Any mid-stream fault other than cancellation.
    StreamFailure,
    /// Unexpected server fault.
    Internal,
}

impl ErrorCode {
    /// Get the gRPC status code for this error.
    #[must_use]
    pub const fn grpc_code(&self) -> Code {
        match self {
            Self::InvalidRequest => Code::InvalidArgument,
            Self::SymbolNotFound => Code::NotFound,
            Self::UpstreamUnavailable => Code::Unavailable,
            Self::Cancelled => Code::Cancelled,
            Self::StreamFailure => Code::Aborted,
            Self::Internal => Code::Internal,
        }
    }

    /// Get the error reason string (for gRPC ErrorInfo).
    #[must_use]
    pub const fn reason(&self) -> &'static str {
        match self {
            Self::InvalidRequest => "INVALID_REQUEST",
            Self::SymbolNotFound => "SYMBOL_NOT_FOUND",
            Self::UpstreamUnavailable => "UPSTREAM_UNAVAILABLE",
            Self::Cancelled => "CANCELLED",
            Self::StreamFailure => "STREAM_FAILURE",
            Self::Internal => "INTERNAL_ERROR",
        }
    }
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.reason())
    }
}

/// A service error with context.
#[derive(Debug, Clone, Error)]
#[error("[{}] {}", .code.reason(), .message)]
pub struct TradingError {
    code: ErrorCode,
    message: String,
    context: Vec<(String, String)>,
}

impl TradingError {
    /// Create a new error.
    #[must_use]
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            context: Vec::new(),
        }
    }

    /// Add context to the error.
    #[must_use]
    pub fn with_context(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.context.push((key.into(), value.into()));
        self
    }

    /// Get the error code.
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        self.code
    }

    /// Get the message.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Get the context.
    #[must_use]
    pub fn context(&self) -> &[(String, String)] {
        &self.context
    }

    /// Whether this error is a caller-initiated cancellation.
    #[must_use]
    pub const fn is_cancelled(&self) -> bool {
        matches!(self.code, ErrorCode::Cancelled)
    }

    /// Convert to a tonic Status with rich error details.
    #[must_use]
    pub fn to_status(&self) -> tonic::Status {
        let mut details = ErrorDetails::new();

        let metadata: HashMap<String, String> = self.context.iter().cloned().collect();
        details.set_error_info(self.code.reason(), ERROR_DOMAIN, metadata);

        if self.code == ErrorCode::InvalidRequest {
            details.add_bad_request_violation("request", &self.message);
        }

        tonic::Status::with_error_details(self.code.grpc_code(), &self.message, details)
    }

    /// Classify a status received on an inbound client stream.
    ///
    /// Cancellation stays cancellation; everything else aborts the call.
    #[must_use]
    pub fn from_inbound_status(status: &tonic::Status) -> Self {
        match status.code() {
            Code::Cancelled => Self::cancelled(status.message()),
            _ => Self::stream_failure(format!(
                "inbound stream failed: {}",
                status.message()
            ))
            .with_context("inbound_code", format!("{:?}", status.code())),
        }
    }
}

/// Convenience constructors for common errors.
impl TradingError {
    /// Invalid request format.
    #[must_use]
    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidRequest, message)
    }

    /// Symbol not present in the quote store.
    #[must_use]
    pub fn symbol_not_found(symbol: &str) -> Self {
        Self::new(
            ErrorCode::SymbolNotFound,
            format!("No quote for symbol {symbol}"),
        )
        .with_context("symbol", symbol)
    }

    /// Upstream collaborator unavailable.
    #[must_use]
    pub fn upstream_unavailable(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::UpstreamUnavailable, message)
    }

    /// Caller ended the call early.
    #[must_use]
    pub fn cancelled(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::Cancelled, message)
    }

    /// Mid-stream fault.
    #[must_use]
    pub fn stream_failure(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::StreamFailure, message)
    }

    /// Internal error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::Internal, message)
    }
}

impl From<TradingError> for tonic::Status {
    fn from(error: TradingError) -> Self {
        error.to_status()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_code_grpc_mapping() {
        assert_eq!(ErrorCode::InvalidRequest.grpc_code(), Code::InvalidArgument);
        assert_eq!(ErrorCode::SymbolNotFound.grpc_code(), Code::NotFound);
        assert_eq!(ErrorCode::UpstreamUnavailable.grpc_code(), Code::Unavailable);
        assert_eq!(ErrorCode::Cancelled.grpc_code(), Code::Cancelled);
        assert_eq!(ErrorCode::StreamFailure.grpc_code(), Code::Aborted);
        assert_eq!(ErrorCode::Internal.grpc_code(), Code::Internal);
    }

    #[test]
    fn test_symbol_not_found_carries_symbol() {
        let error = TradingError::symbol_not_found("MSFT");

        assert_eq!(error.code(), ErrorCode::SymbolNotFound);
        assert!(error.message().contains("MSFT"));
        assert_eq!(
            error.context(),
            &[("symbol".to_string(), "MSFT".to_string())]
        );
    }

    #[test]
    fn test_to_status_includes_error_info() {
        let status = TradingError::symbol_not_found("MSFT").to_status();

        assert_eq!(status.code(), Code::NotFound);
        let details = status.get_error_details();
        let info = details.error_info().unwrap();
        assert_eq!(info.reason, "SYMBOL_NOT_FOUND");
        assert_eq!(info.domain, ERROR_DOMAIN);
        assert_eq!(info.metadata.get("symbol").map(String::as_str), Some("MSFT"));
    }

    #[test]
    fn test_inbound_status_classification() {
        let cancelled = TradingError::from_inbound_status(&tonic::Status::cancelled("gone"));
        assert!(cancelled.is_cancelled());

        let reset = TradingError::from_inbound_status(&tonic::Status::unknown("h2 reset"));
        assert_eq!(reset.code(), ErrorCode::StreamFailure);
        assert!(reset.message().contains("h2 reset"));
    }

    #[test]
    fn test_error_display() {
        let error = TradingError::invalid_request("symbol must not be empty");
        assert_eq!(
            error.to_string(),
            "[INVALID_REQUEST] symbol must not be empty"
        );
    }
}
