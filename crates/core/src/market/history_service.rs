use std::sync::Arc;

use futures::stream::{self, StreamExt};
use log::{debug, warn};

use coinpulse_market_data::{
    MarketDataError, MarketDataProvider, NegativeCache, PricePoint, RetryPolicy,
};

use crate::constants::HISTORY_CONCURRENCY;
use crate::errors::{Error, Result};
use crate::limits::RateLimitTracker;

/// Fetches provider price history for one or many symbols.
///
/// Symbols the provider does not know are remembered in a negative cache so
/// they are not requested again until the entry expires.
pub struct HistoryService {
    provider: Arc<dyn MarketDataProvider>,
    retry: RetryPolicy,
    negative_cache: NegativeCache,
    rate_limiter: Option<Arc<RateLimitTracker>>,
    concurrency: usize,
}

impl HistoryService {
    pub fn new(provider: Arc<dyn MarketDataProvider>) -> Self {
        Self {
            provider,
            retry: RetryPolicy::default(),
            negative_cache: NegativeCache::new(),
            rate_limiter: None,
            concurrency: HISTORY_CONCURRENCY,
        }
    }

    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_rate_limiter(mut self, rate_limiter: Arc<RateLimitTracker>) -> Self {
        self.rate_limiter = Some(rate_limiter);
        self
    }

    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    pub fn negative_cache(&self) -> &NegativeCache {
        &self.negative_cache
    }

    /// Price history for one symbol over the last `days` days.
    pub async fn fetch_history(&self, symbol: &str, days: u32) -> Result<Vec<PricePoint>> {
        let symbol = symbol.trim().to_uppercase();

        if let Some(message) = self.negative_cache.get(&symbol) {
            debug!("Skipping history for {}: {}", symbol, message);
            return Err(MarketDataError::SymbolNotFound(symbol).into());
        }

        if let Some(limiter) = &self.rate_limiter {
            limiter.acquire(self.provider.id()).await?;
        }

        let operation = format!("{} history {}", self.provider.id(), symbol);
        let result = self
            .retry
            .run(&operation, || self.provider.get_price_history(&symbol, days))
            .await;

        match result {
            Ok(points) => Ok(points),
            Err(err @ MarketDataError::SymbolNotFound(_)) => {
                self.negative_cache.set(&symbol, err.to_string());
                Err(Error::MarketData(err))
            }
            Err(err) => Err(Error::MarketData(err)),
        }
    }

    /// Price history for many symbols, at most `concurrency` requests in
    /// flight. Results come back in input order.
    pub async fn fetch_many(
        &self,
        symbols: &[String],
        days: u32,
    ) -> Vec<(String, Result<Vec<PricePoint>>)> {
        let mut results: Vec<(usize, String, Result<Vec<PricePoint>>)> =
            stream::iter(symbols.iter().cloned().enumerate())
                .map(|(index, symbol)| async move {
                    let result = self.fetch_history(&symbol, days).await;
                    (index, symbol, result)
                })
                .buffer_unordered(self.concurrency)
                .collect()
                .await;

        results.sort_by_key(|(index, _, _)| *index);

        let failures = results.iter().filter(|(_, _, r)| r.is_err()).count();
        if failures > 0 {
            warn!(
                "History fetch failed for {} of {} symbols",
                failures,
                results.len()
            );
        }

        results
            .into_iter()
            .map(|(_, symbol, result)| (symbol, result))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::Utc;
    use coinpulse_market_data::CoinListing;
    use rust_decimal_macros::dec;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    #[derive(Default)]
    struct MockHistoryProvider {
        calls: Mutex<HashMap<String, usize>>,
        in_flight: AtomicUsize,
        max_in_flight: AtomicUsize,
    }

    impl MockHistoryProvider {
        fn calls_for(&self, symbol: &str) -> usize {
            self.calls.lock().unwrap().get(symbol).copied().unwrap_or(0)
        }
    }

    #[async_trait]
    impl MarketDataProvider for MockHistoryProvider {
        fn id(&self) -> &'static str {
            "mock"
        }

        async fn get_listings(
            &self,
            _limit: usize,
        ) -> std::result::Result<Vec<CoinListing>, MarketDataError> {
            Ok(Vec::new())
        }

        async fn get_price_history(
            &self,
            symbol: &str,
            _days: u32,
        ) -> std::result::Result<Vec<PricePoint>, MarketDataError> {
            *self
                .calls
                .lock()
                .unwrap()
                .entry(symbol.to_string())
                .or_insert(0) += 1;

            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.max_in_flight.fetch_max(now, Ordering::SeqCst);
            tokio::task::yield_now().await;
            self.in_flight.fetch_sub(1, Ordering::SeqCst);

            if symbol == "NOPE" {
                return Err(MarketDataError::SymbolNotFound(symbol.to_string()));
            }
            if symbol == "QUIET" {
                return Err(MarketDataError::ValidationFailed {
                    message: format!("No price history for {}", symbol),
                });
            }
            Ok(vec![PricePoint {
                timestamp: Utc::now(),
                price: dec!(1.5),
            }])
        }
    }

    #[tokio::test]
    async fn test_unknown_symbol_is_negative_cached() {
        let provider = Arc::new(MockHistoryProvider::default());
        let service = HistoryService::new(provider.clone()).with_retry_policy(RetryPolicy::no_retry());

        assert!(service.fetch_history("nope", 7).await.is_err());
        assert!(service.fetch_history("NOPE", 7).await.is_err());

        assert_eq!(provider.calls_for("NOPE"), 1);
        assert!(service.negative_cache().contains("NOPE"));
    }

    #[tokio::test]
    async fn test_empty_history_is_not_negative_cached() {
        let provider = Arc::new(MockHistoryProvider::default());
        let service = HistoryService::new(provider.clone()).with_retry_policy(RetryPolicy::no_retry());

        assert!(service.fetch_history("QUIET", 7).await.is_err());
        assert!(service.fetch_history("QUIET", 7).await.is_err());

        assert_eq!(provider.calls_for("QUIET"), 2);
        assert!(!service.negative_cache().contains("QUIET"));
    }

    #[tokio::test]
    async fn test_fetch_many_preserves_order_and_bounds_concurrency() {
        let provider = Arc::new(MockHistoryProvider::default());
        let service = HistoryService::new(provider.clone())
            .with_retry_policy(RetryPolicy::no_retry())
            .with_concurrency(2);

        let symbols: Vec<String> = ["BTC", "ETH", "NOPE", "SOL", "ADA"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        let results = service.fetch_many(&symbols, 1).await;

        let order: Vec<&str> = results.iter().map(|(s, _)| s.as_str()).collect();
        assert_eq!(order, vec!["BTC", "ETH", "NOPE", "SOL", "ADA"]);
        assert!(results[2].1.is_err());
        assert!(results[0].1.is_ok());
        assert!(provider.max_in_flight.load(Ordering::SeqCst) <= 2);
    }
}
