//! Quote Types
//!
//! A [`Quote`] is an immutable price snapshot for one symbol. Quotes are
//! owned by the quote store and handed to handlers by value, so a reader
//! always sees one consistent store update.

use chrono::{DateTime, SecondsFormat, Utc};

/// A ticker symbol.
pub type Symbol = String;

/// Latest known price for a symbol.
#[derive(Debug, Clone, PartialEq)]
pub struct Quote {
    /// Ticker symbol.
    pub symbol: Symbol,
    /// Last price.
    pub price: f64,
    /// When the price was recorded.
    pub as_of: DateTime<Utc>,
}

impl Quote {
    /// Create a new quote.
    #[must_use]
    pub fn new(symbol: impl Into<Symbol>, price: f64, as_of: DateTime<Utc>) -> Self {
        Self {
            symbol: symbol.into(),
            price,
            as_of,
        }
    }

    /// The `as_of` timestamp in wire format.
    #[must_use]
    pub fn timestamp(&self) -> String {
        format_timestamp(self.as_of)
    }
}

/// Format a timestamp the way every quote response carries it (RFC 3339, UTC, `Z` suffix).
#[must_use]
pub fn format_timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::AutoSi, true)
}
