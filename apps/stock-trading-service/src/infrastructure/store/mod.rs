//! In-memory Quote Store
//!
//! `QuoteStore` adapter backed by a `parking_lot::RwLock<HashMap>`. Writes
//! replace a symbol's whole [`Quote`] under the write lock, so a concurrent
//! reader sees either the previous quote or the new one, never a mix.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;

use crate::application::ports::{QuoteStore, QuoteStoreError};
use crate::domain::quote::{Quote, Symbol};
use crate::infrastructure::config::SeedQuote;

/// Quote store held in process memory.
#[derive(Debug)]
pub struct InMemoryQuoteStore {
    quotes: RwLock<HashMap<Symbol, Quote>>,
    available: AtomicBool,
}

impl Default for InMemoryQuoteStore {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryQuoteStore {
    /// Create an empty, available store.
    #[must_use]
    pub fn new() -> Self {
        Self {
            quotes: RwLock::new(HashMap::new()),
            available: AtomicBool::new(true),
        }
    }

    /// Create a store holding `seed`, every entry stamped `as_of`.
    #[must_use]
    pub fn from_seed(seed: &[SeedQuote], as_of: DateTime<Utc>) -> Self {
        let store = Self::new();
        for entry in seed {
            store.upsert(entry.symbol.as_str(), entry.price, as_of);
        }
        store
    }

    /// Replace the quote for `symbol`, returning the stored quote.
    pub fn upsert(&self, symbol: impl Into<Symbol>, price: f64, as_of: DateTime<Utc>) -> Quote {
        let quote = Quote::new(symbol, price, as_of);
        self.quotes
            .write()
            .insert(quote.symbol.clone(), quote.clone());
        quote
    }

    /// Mark the store as able or unable to serve lookups.
    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::Relaxed);
    }

    /// Number of stored symbols.
    #[must_use]
    pub fn len(&self) -> usize {
        self.quotes.read().len()
    }

    /// Whether no symbols are stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.quotes.read().is_empty()
    }
}

#[async_trait]
impl QuoteStore for InMemoryQuoteStore {
    async fn lookup(&self, symbol: &str) -> Result<Quote, QuoteStoreError> {
        if !self.is_available() {
            return Err(QuoteStoreError::Unavailable(
                "store marked unavailable".to_string(),
            ));
        }

        self.quotes
            .read()
            .get(symbol)
            .cloned()
            .ok_or_else(|| QuoteStoreError::NotFound(symbol.to_string()))
    }

    fn is_available(&self) -> bool {
        self.available.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use chrono::TimeZone;

    use super::*;
    use crate::infrastructure::config::ServiceConfig;

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(1_767_225_600 + secs, 0).unwrap()
    }

    #[tokio::test]
    async fn default_seed_is_loaded() {
        let store = InMemoryQuoteStore::from_seed(&ServiceConfig::default().seed, at(0));

        assert_eq!(store.len(), 3);
        let quote = store.lookup("GOOGL").await.unwrap();
        assert!((quote.price - 2800.75).abs() < f64::EPSILON);
        assert_eq!(quote.as_of, at(0));
    }

    #[tokio::test]
    async fn unknown_symbol_is_not_found() {
        let store = InMemoryQuoteStore::new();

        let error = store.lookup("MSFT").await.unwrap_err();

        assert!(matches!(error, QuoteStoreError::NotFound(ref s) if s == "MSFT"));
    }

    #[tokio::test]
    async fn upsert_replaces_whole_quote() {
        let store = InMemoryQuoteStore::new();
        store.upsert("AAPL", 175.5, at(0));
        store.upsert("AAPL", 180.0, at(60));

        let quote = store.lookup("AAPL").await.unwrap();

        assert_eq!(quote, Quote::new("AAPL", 180.0, at(60)));
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn unavailable_store_fails_lookups() {
        let store = InMemoryQuoteStore::from_seed(&ServiceConfig::default().seed, at(0));
        store.set_available(false);

        assert!(!store.is_available());
        assert!(matches!(
            store.lookup("AAPL").await,
            Err(QuoteStoreError::Unavailable(_))
        ));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn readers_never_observe_torn_quotes() {
        let store = Arc::new(InMemoryQuoteStore::new());
        store.upsert("AAPL", 0.0, at(0));

        let writer = {
            let store = Arc::clone(&store);
            tokio::spawn(async move {
                for i in 1..=500_i32 {
                    store.upsert("AAPL", f64::from(i), at(i64::from(i)));
                    tokio::task::yield_now().await;
                }
            })
        };

        let readers: Vec<_> = (0..4)
            .map(|_| {
                let store = Arc::clone(&store);
                tokio::spawn(async move {
                    for _ in 0..500 {
                        let quote = store.lookup("AAPL").await.unwrap();
                        // Each write pairs price i with timestamp offset i.
                        let offset = (quote.as_of - at(0)).num_seconds();
                        assert!((quote.price - offset as f64).abs() < f64::EPSILON);
                        tokio::task::yield_now().await;
                    }
                })
            })
            .collect();

        writer.await.unwrap();
        for reader in readers {
            reader.await.unwrap();
        }
    }
}
