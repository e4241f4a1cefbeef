//! Unary quote lookup.

use std::sync::Arc;

use crate::application::ports::QuoteStore;
use crate::domain::quote::Quote;
use crate::error::TradingError;

/// Looks up the latest stored quote for a symbol.
///
/// No retries happen here; store failures surface unchanged.
#[derive(Clone)]
pub struct QuoteLookup {
    store: Arc<dyn QuoteStore>,
}

impl QuoteLookup {
    /// Create a lookup handler over a quote store.
    #[must_use]
    pub fn new(store: Arc<dyn QuoteStore>) -> Self {
        Self { store }
    }

    /// Return the latest quote for `symbol`.
    ///
    /// # Errors
    ///
    /// - `InvalidRequest` if the symbol is empty
    /// - `SymbolNotFound` if the store has no quote for it
    /// - `UpstreamUnavailable` if the store cannot answer
    pub async fn get_quote(&self, symbol: &str) -> Result<Quote, TradingError> {
        if symbol.trim().is_empty() {
            return Err(TradingError::invalid_request("symbol must not be empty"));
        }

        let quote = self.store.lookup(symbol).await?;
        tracing::debug!(symbol, price = quote.price, "Quote looked up");
        Ok(quote)
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use mockall::predicate::eq;

    use super::*;
    use crate::application::ports::{MockQuoteStore, QuoteStoreError};
    use crate::error::ErrorCode;

    #[tokio::test]
    async fn returns_stored_quote() {
        let as_of = Utc::now();
        let mut store = MockQuoteStore::new();
        store
            .expect_lookup()
            .with(eq("AAPL"))
            .times(1)
            .returning(move |symbol| Ok(Quote::new(symbol, 175.5, as_of)));

        let lookup = QuoteLookup::new(Arc::new(store));
        let quote = lookup.get_quote("AAPL").await.unwrap();

        assert_eq!(quote.symbol, "AAPL");
        assert!((quote.price - 175.5).abs() < f64::EPSILON);
        assert_eq!(quote.as_of, as_of);
    }

    #[tokio::test]
    async fn unknown_symbol_is_not_found() {
        let mut store = MockQuoteStore::new();
        store
            .expect_lookup()
            .returning(|symbol| Err(QuoteStoreError::NotFound(symbol.to_string())));

        let lookup = QuoteLookup::new(Arc::new(store));
        let error = lookup.get_quote("NOPE").await.unwrap_err();

        assert_eq!(error.code(), ErrorCode::SymbolNotFound);
    }

    #[tokio::test]
    async fn store_outage_surfaces_unchanged() {
        let mut store = MockQuoteStore::new();
        store
            .expect_lookup()
            .times(1)
            .returning(|_| Err(QuoteStoreError::Timeout("lookup exceeded 5s".to_string())));

        let lookup = QuoteLookup::new(Arc::new(store));
        let error = lookup.get_quote("AAPL").await.unwrap_err();

        assert_eq!(error.code(), ErrorCode::UpstreamUnavailable);
        assert!(error.message().contains("lookup exceeded 5s"));
    }

    #[tokio::test]
    async fn empty_symbol_never_reaches_store() {
        let mut store = MockQuoteStore::new();
        store.expect_lookup().never();

        let lookup = QuoteLookup::new(Arc::new(store));
        let error = lookup.get_quote("  ").await.unwrap_err();

        assert_eq!(error.code(), ErrorCode::InvalidRequest);
    }
}
