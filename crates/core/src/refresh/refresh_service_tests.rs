//! Tests for the refresh coordinator.
//!
//! # Contract Points
//!
//! 1. Staleness gate: a fresh dataset is never fetched
//! 2. Same-bucket writes replace rather than duplicate
//! 3. Rate limits are checked before any provider call
//! 4. Invalidation follows persistence and only on success
//! 5. Every failure is reported as a structured result

#[cfg(test)]
mod tests {
    use crate::articles::{
        ArticleContext, ArticleGenerator, ArticleRepositoryTrait, GeneratedArticle,
        GenerationError,
    };
    use crate::errors::{DatabaseError, Error, Result};
    use crate::events::MockInvalidationSink;
    use crate::limits::{ApiLimitCounter, ApiLimitRepositoryTrait, RateLimitTracker};
    use crate::market::{
        MarketMetadata, MarketSnapshot, MetadataRepositoryTrait, SnapshotRepositoryTrait,
    };
    use crate::refresh::{
        DatasetKind, RefreshCoordinator, RefreshErrorKind, RefreshProviders, RefreshResult,
        RefreshStores,
    };
    use crate::utils::time_utils::hour_bucket;
    use async_trait::async_trait;
    use chrono::{DateTime, Duration, TimeZone, Utc};
    use coinpulse_market_data::{
        CoinListing, CoinProfile, GlobalStats, MarketDataError, MarketDataProvider,
        MetadataProvider, NewsItem, NewsProvider, PricePoint, ProfileBatch, RetryPolicy,
    };
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 1, 14, 20, 0).unwrap()
    }

    // =========================================================================
    // Mock stores
    // =========================================================================

    #[derive(Clone, Default)]
    struct MockSnapshotRepository {
        rows: Arc<Mutex<HashMap<String, MarketSnapshot>>>,
        fail_on_save: Arc<AtomicBool>,
    }

    impl MockSnapshotRepository {
        fn all(&self) -> Vec<MarketSnapshot> {
            self.rows.lock().unwrap().values().cloned().collect()
        }

        fn seed(&self, snapshot: MarketSnapshot) {
            self.rows
                .lock()
                .unwrap()
                .insert(snapshot.id.clone(), snapshot);
        }
    }

    #[async_trait]
    impl SnapshotRepositoryTrait for MockSnapshotRepository {
        async fn upsert_snapshots(&self, snapshots: Vec<MarketSnapshot>) -> Result<usize> {
            if self.fail_on_save.load(Ordering::SeqCst) {
                return Err(Error::Database(DatabaseError::QueryFailed(
                    "database is locked".into(),
                )));
            }
            let mut rows = self.rows.lock().unwrap();
            let count = snapshots.len();
            for snapshot in snapshots {
                rows.insert(snapshot.id.clone(), snapshot);
            }
            Ok(count)
        }

        fn latest_snapshot_timestamp(&self) -> Result<Option<DateTime<Utc>>> {
            Ok(self.rows.lock().unwrap().values().map(|s| s.timestamp).max())
        }

        fn latest_snapshots(&self) -> Result<Vec<MarketSnapshot>> {
            let rows = self.rows.lock().unwrap();
            let Some(bucket) = rows.values().map(|s| s.hour_bucket).max() else {
                return Ok(Vec::new());
            };
            let mut latest: Vec<MarketSnapshot> = rows
                .values()
                .filter(|s| s.hour_bucket == bucket)
                .cloned()
                .collect();
            latest.sort_by(|a, b| b.market_cap.cmp(&a.market_cap));
            Ok(latest)
        }

        fn snapshot_history(
            &self,
            symbol: &str,
            since: DateTime<Utc>,
        ) -> Result<Vec<MarketSnapshot>> {
            let mut rows: Vec<MarketSnapshot> = self
                .rows
                .lock()
                .unwrap()
                .values()
                .filter(|s| s.symbol == symbol && s.timestamp >= since)
                .cloned()
                .collect();
            rows.sort_by_key(|s| s.timestamp);
            Ok(rows)
        }
    }

    #[derive(Clone, Default)]
    struct MockMetadataRepository {
        rows: Arc<Mutex<HashMap<String, MarketMetadata>>>,
    }

    #[async_trait]
    impl MetadataRepositoryTrait for MockMetadataRepository {
        async fn upsert_metadata(&self, rows: Vec<MarketMetadata>) -> Result<usize> {
            let mut stored = self.rows.lock().unwrap();
            let count = rows.len();
            for row in rows {
                stored.insert(row.symbol.clone(), row);
            }
            Ok(count)
        }

        fn latest_metadata_timestamp(&self) -> Result<Option<DateTime<Utc>>> {
            Ok(self.rows.lock().unwrap().values().map(|m| m.timestamp).max())
        }

        fn list_metadata(&self) -> Result<Vec<MarketMetadata>> {
            let mut rows: Vec<MarketMetadata> =
                self.rows.lock().unwrap().values().cloned().collect();
            rows.sort_by(|a, b| a.symbol.cmp(&b.symbol));
            Ok(rows)
        }

        fn get_metadata(&self, symbol: &str) -> Result<Option<MarketMetadata>> {
            Ok(self.rows.lock().unwrap().get(symbol).cloned())
        }
    }

    #[derive(Clone, Default)]
    struct MockArticleRepository {
        articles: Arc<Mutex<Vec<GeneratedArticle>>>,
    }

    #[async_trait]
    impl ArticleRepositoryTrait for MockArticleRepository {
        async fn insert_article(&self, article: GeneratedArticle) -> Result<GeneratedArticle> {
            self.articles.lock().unwrap().push(article.clone());
            Ok(article)
        }

        fn latest_article_created_at(&self) -> Result<Option<DateTime<Utc>>> {
            Ok(self.articles.lock().unwrap().iter().map(|a| a.created_at).max())
        }

        fn latest_article(&self) -> Result<Option<GeneratedArticle>> {
            Ok(self
                .articles
                .lock()
                .unwrap()
                .iter()
                .max_by_key(|a| a.created_at)
                .cloned())
        }

        fn article_for_bucket(&self, bucket: DateTime<Utc>) -> Result<Option<GeneratedArticle>> {
            Ok(self
                .articles
                .lock()
                .unwrap()
                .iter()
                .filter(|a| a.created_at >= bucket && a.created_at < bucket + Duration::hours(1))
                .max_by_key(|a| a.created_at)
                .cloned())
        }
    }

    #[derive(Clone, Default)]
    struct MockApiLimitRepository {
        counters: Arc<Mutex<HashMap<String, ApiLimitCounter>>>,
    }

    impl MockApiLimitRepository {
        fn seed(&self, counter: ApiLimitCounter) {
            self.counters
                .lock()
                .unwrap()
                .insert(counter.api_name.clone(), counter);
        }
    }

    #[async_trait]
    impl ApiLimitRepositoryTrait for MockApiLimitRepository {
        async fn record_request(
            &self,
            api_name: &str,
            default_limit: i32,
            now: DateTime<Utc>,
            window: Duration,
        ) -> Result<ApiLimitCounter> {
            let mut counters = self.counters.lock().unwrap();
            let counter = counters
                .entry(api_name.to_string())
                .and_modify(|c| {
                    if c.window_expired(now, window) {
                        c.request_count = 1;
                        c.last_reset = now;
                    } else {
                        c.request_count += 1;
                    }
                })
                .or_insert_with(|| ApiLimitCounter {
                    api_name: api_name.to_string(),
                    daily_limit: default_limit,
                    request_count: 1,
                    last_reset: now,
                });
            Ok(counter.clone())
        }

        fn get_counter(&self, api_name: &str) -> Result<Option<ApiLimitCounter>> {
            Ok(self.counters.lock().unwrap().get(api_name).cloned())
        }

        async fn set_daily_limit(
            &self,
            api_name: &str,
            daily_limit: i32,
            now: DateTime<Utc>,
        ) -> Result<ApiLimitCounter> {
            let mut counters = self.counters.lock().unwrap();
            let counter = counters
                .entry(api_name.to_string())
                .or_insert_with(|| ApiLimitCounter {
                    api_name: api_name.to_string(),
                    daily_limit,
                    request_count: 0,
                    last_reset: now,
                });
            counter.daily_limit = daily_limit;
            Ok(counter.clone())
        }
    }

    // =========================================================================
    // Mock providers
    // =========================================================================

    fn listing(rank: usize) -> CoinListing {
        CoinListing {
            provider_id: format!("coin-{}", rank),
            symbol: format!("c{}", rank),
            name: format!("Coin {}", rank),
            price: Decimal::from(1000 - rank as i64),
            change_percent_24h: rank as f64 * 0.1,
            volume_24h: dec!(1000),
            market_cap: Decimal::from(1_000_000 - rank as i64 * 1000),
            last_updated: None,
        }
    }

    #[derive(Default)]
    struct MockMarketProvider {
        listings: Mutex<Vec<CoinListing>>,
        error: Mutex<Option<MarketDataError>>,
        calls: AtomicUsize,
    }

    impl MockMarketProvider {
        fn with_listings(count: usize) -> Self {
            let provider = Self::default();
            *provider.listings.lock().unwrap() = (0..count).map(listing).collect();
            provider
        }

        fn fail_with(&self, err: MarketDataError) {
            *self.error.lock().unwrap() = Some(err);
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl MarketDataProvider for MockMarketProvider {
        fn id(&self) -> &'static str {
            "coingecko"
        }

        async fn get_listings(
            &self,
            limit: usize,
        ) -> std::result::Result<Vec<CoinListing>, MarketDataError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if let Some(err) = self.error.lock().unwrap().take() {
                return Err(err);
            }
            Ok(self
                .listings
                .lock()
                .unwrap()
                .iter()
                .take(limit)
                .cloned()
                .collect())
        }

        async fn get_price_history(
            &self,
            symbol: &str,
            _days: u32,
        ) -> std::result::Result<Vec<PricePoint>, MarketDataError> {
            Err(MarketDataError::SymbolNotFound(symbol.to_string()))
        }
    }

    #[derive(Default)]
    struct MockMetadataProvider {
        unknown: Vec<String>,
        requested: Mutex<Vec<Vec<String>>>,
    }

    #[async_trait]
    impl MetadataProvider for MockMetadataProvider {
        fn id(&self) -> &'static str {
            "coinmarketcap"
        }

        async fn get_profiles(
            &self,
            symbols: &[String],
        ) -> std::result::Result<ProfileBatch, MarketDataError> {
            self.requested.lock().unwrap().push(symbols.to_vec());
            let (missing, known): (Vec<String>, Vec<String>) = symbols
                .iter()
                .cloned()
                .partition(|s| self.unknown.contains(s));
            Ok(ProfileBatch {
                profiles: known
                    .into_iter()
                    .map(|s| CoinProfile {
                        name: Some(format!("{} name", s)),
                        ..CoinProfile::new(s)
                    })
                    .collect(),
                missing,
            })
        }

        async fn get_global_stats(&self) -> std::result::Result<GlobalStats, MarketDataError> {
            Ok(GlobalStats {
                total_market_cap: dec!(2400000000000),
                total_volume_24h: dec!(90000000000),
                btc_dominance: 52.0,
                eth_dominance: 17.0,
            })
        }
    }

    #[derive(Default)]
    struct MockNewsProvider {
        fail: bool,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl NewsProvider for MockNewsProvider {
        fn id(&self) -> &'static str {
            "cryptocompare"
        }

        async fn get_latest_news(
            &self,
            limit: usize,
        ) -> std::result::Result<Vec<NewsItem>, MarketDataError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(MarketDataError::Http {
                    provider: "cryptocompare".into(),
                    status: 500,
                    message: "boom".into(),
                });
            }
            Ok((0..limit.min(3))
                .map(|i| NewsItem {
                    title: format!("Headline {}", i),
                    description: String::new(),
                    published_at: now(),
                    source: "Wire".into(),
                    url: None,
                })
                .collect())
        }
    }

    #[derive(Default)]
    struct MockGenerator {
        content: Mutex<String>,
        contexts: Mutex<Vec<ArticleContext>>,
    }

    impl MockGenerator {
        fn returning(content: &str) -> Self {
            let generator = Self::default();
            *generator.content.lock().unwrap() = content.to_string();
            generator
        }

        fn calls(&self) -> usize {
            self.contexts.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl ArticleGenerator for MockGenerator {
        fn id(&self) -> &'static str {
            "llm"
        }

        async fn generate(
            &self,
            context: &ArticleContext,
        ) -> std::result::Result<String, GenerationError> {
            self.contexts.lock().unwrap().push(context.clone());
            Ok(self.content.lock().unwrap().clone())
        }
    }

    // =========================================================================
    // Harness
    // =========================================================================

    struct Harness {
        snapshots: MockSnapshotRepository,
        metadata: MockMetadataRepository,
        articles: MockArticleRepository,
        limits: MockApiLimitRepository,
        market: Arc<MockMarketProvider>,
        metadata_provider: Arc<MockMetadataProvider>,
        news: Arc<MockNewsProvider>,
        generator: Arc<MockGenerator>,
        sink: MockInvalidationSink,
    }

    impl Harness {
        fn new() -> Self {
            Self {
                snapshots: MockSnapshotRepository::default(),
                metadata: MockMetadataRepository::default(),
                articles: MockArticleRepository::default(),
                limits: MockApiLimitRepository::default(),
                market: Arc::new(MockMarketProvider::with_listings(25)),
                metadata_provider: Arc::new(MockMetadataProvider::default()),
                news: Arc::new(MockNewsProvider::default()),
                generator: Arc::new(MockGenerator::returning("<p>Bitcoin held steady.</p>")),
                sink: MockInvalidationSink::new(),
            }
        }

        fn coordinator(&self) -> RefreshCoordinator {
            let stores = RefreshStores {
                snapshots: Arc::new(self.snapshots.clone()),
                metadata: Arc::new(self.metadata.clone()),
                articles: Arc::new(self.articles.clone()),
            };
            let providers = RefreshProviders {
                market: self.market.clone(),
                metadata: self.metadata_provider.clone(),
                news: self.news.clone(),
                generator: self.generator.clone(),
            };
            let tracker = Arc::new(RateLimitTracker::new(Arc::new(self.limits.clone())));
            RefreshCoordinator::new(stores, providers, tracker, Arc::new(self.sink.clone()))
                .with_retry_policy(RetryPolicy::no_retry())
        }
    }

    // =========================================================================
    // Snapshots
    // =========================================================================

    #[tokio::test]
    async fn test_empty_store_persists_listings_and_invalidates() {
        let h = Harness::new();
        let coordinator = h.coordinator();

        let result = coordinator
            .check_and_refresh_at(DatasetKind::MarketSnapshot, now())
            .await;

        assert_eq!(result, RefreshResult::updated_count(25));
        let rows = h.snapshots.all();
        assert_eq!(rows.len(), 25);
        assert!(rows.iter().all(|s| s.hour_bucket == hour_bucket(now())));

        let invalidations = h.sink.invalidations();
        assert_eq!(invalidations.len(), 1);
        assert_eq!(invalidations[0].dataset, DatasetKind::MarketSnapshot);
        assert!(invalidations[0].contains_path("/"));
        assert!(invalidations[0].contains_path("/api/v1/market/latest"));
    }

    #[tokio::test]
    async fn test_second_check_within_interval_is_up_to_date() {
        let h = Harness::new();
        let coordinator = h.coordinator();

        let first = coordinator
            .check_and_refresh_at(DatasetKind::MarketSnapshot, now())
            .await;
        let second = coordinator
            .check_and_refresh_at(DatasetKind::MarketSnapshot, now() + Duration::minutes(10))
            .await;

        assert!(first.updated);
        assert_eq!(second, RefreshResult::up_to_date());
        assert_eq!(h.market.calls(), 1);
        assert_eq!(h.snapshots.all().len(), 25);
        assert_eq!(h.sink.len(), 1);
    }

    #[tokio::test]
    async fn test_concurrent_refreshes_do_not_duplicate_bucket_rows() {
        let h = Harness::new();
        let coordinator = h.coordinator();

        let (a, b) = futures::join!(
            coordinator.check_and_refresh_at(DatasetKind::MarketSnapshot, now()),
            coordinator.check_and_refresh_at(
                DatasetKind::MarketSnapshot,
                now() + Duration::minutes(1)
            ),
        );

        assert!(a.updated || b.updated);
        assert_eq!(h.snapshots.all().len(), 25);
    }

    #[tokio::test]
    async fn test_stale_after_interval_rewrites_new_bucket() {
        let h = Harness::new();
        let coordinator = h.coordinator();

        coordinator
            .check_and_refresh_at(DatasetKind::MarketSnapshot, now())
            .await;
        let later = now() + Duration::minutes(56);
        let result = coordinator
            .check_and_refresh_at(DatasetKind::MarketSnapshot, later)
            .await;

        assert!(result.updated);
        assert_eq!(h.market.calls(), 2);
        // 14:20 and 15:16 fall in different buckets
        assert_eq!(h.snapshots.all().len(), 50);
    }

    #[tokio::test]
    async fn test_exhausted_rate_limit_skips_provider() {
        let h = Harness::new();
        h.limits.seed(ApiLimitCounter {
            api_name: "coingecko".into(),
            daily_limit: 30,
            request_count: 30,
            last_reset: Utc::now() - Duration::hours(1),
        });
        let coordinator = h.coordinator();

        let result = coordinator.check_and_refresh(DatasetKind::MarketSnapshot).await;

        assert!(!result.updated);
        assert_eq!(result.error, Some(RefreshErrorKind::RateLimitExceeded));
        assert_eq!(h.market.calls(), 0);
        assert!(h.snapshots.all().is_empty());
        assert!(h.sink.is_empty());
    }

    #[tokio::test]
    async fn test_malformed_payload_is_validation_error_without_side_effects() {
        let h = Harness::new();
        h.market.fail_with(MarketDataError::MalformedResponse {
            provider: "coingecko".into(),
            message: "expected an array".into(),
        });
        let coordinator = h.coordinator();

        let result = coordinator
            .check_and_refresh_at(DatasetKind::MarketSnapshot, now())
            .await;

        assert_eq!(result.error, Some(RefreshErrorKind::ValidationError));
        assert!(result.message.is_some());
        assert!(h.snapshots.all().is_empty());
        assert!(h.sink.is_empty());
    }

    #[tokio::test]
    async fn test_provider_outage_is_provider_error() {
        let h = Harness::new();
        h.market.fail_with(MarketDataError::Http {
            provider: "coingecko".into(),
            status: 503,
            message: "unavailable".into(),
        });
        let coordinator = h.coordinator();

        let result = coordinator
            .check_and_refresh_at(DatasetKind::MarketSnapshot, now())
            .await;
        assert_eq!(result.error, Some(RefreshErrorKind::ProviderError));
    }

    #[tokio::test]
    async fn test_persistence_failure_does_not_invalidate() {
        let h = Harness::new();
        h.snapshots.fail_on_save.store(true, Ordering::SeqCst);
        let coordinator = h.coordinator();

        let result = coordinator
            .check_and_refresh_at(DatasetKind::MarketSnapshot, now())
            .await;

        assert_eq!(result.error, Some(RefreshErrorKind::PersistenceError));
        assert!(h.sink.is_empty());
    }

    // =========================================================================
    // Metadata
    // =========================================================================

    #[tokio::test]
    async fn test_metadata_uses_latest_bucket_and_caches_unknown_symbols() {
        let mut h = Harness::new();
        h.metadata_provider = Arc::new(MockMetadataProvider {
            unknown: vec!["C3".to_string()],
            ..Default::default()
        });
        *h.market.listings.lock().unwrap() = (0..5).map(listing).collect();
        let coordinator = h.coordinator();

        coordinator
            .check_and_refresh_at(DatasetKind::MarketSnapshot, now())
            .await;
        let result = coordinator
            .check_and_refresh_at(DatasetKind::MarketMetadata, now())
            .await;

        assert_eq!(result, RefreshResult::updated_count(4));
        assert!(coordinator.metadata_negative_cache().contains("C3"));
        let row = h.metadata.get_metadata("C0").unwrap().unwrap();
        assert_eq!(row.btc_dominance, 52.0);
        assert_eq!(row.total_market_cap, dec!(2400000000000));

        // Past the interval, the unknown symbol is no longer requested
        coordinator
            .check_and_refresh_at(DatasetKind::MarketMetadata, now() + Duration::hours(13))
            .await;
        let requested = h.metadata_provider.requested.lock().unwrap().clone();
        assert_eq!(requested.len(), 2);
        assert!(requested[0].contains(&"C3".to_string()));
        assert!(!requested[1].contains(&"C3".to_string()));
    }

    #[tokio::test]
    async fn test_metadata_falls_back_to_majors() {
        let h = Harness::new();
        let coordinator = h.coordinator();

        let result = coordinator
            .check_and_refresh_at(DatasetKind::MarketMetadata, now())
            .await;

        assert!(result.updated);
        let requested = h.metadata_provider.requested.lock().unwrap().clone();
        assert!(requested[0].contains(&"BTC".to_string()));
        assert!(h.sink.paths().contains(&"/api/v1/market/metadata".to_string()));
    }

    // =========================================================================
    // Articles
    // =========================================================================

    #[tokio::test]
    async fn test_recent_article_is_up_to_date_without_provider_calls() {
        let h = Harness::new();
        h.articles.articles.lock().unwrap().push(GeneratedArticle {
            id: "a1".into(),
            content: "<p>old</p>".into(),
            created_at: now() - Duration::minutes(30),
            updated_at: now() - Duration::minutes(30),
        });
        let coordinator = h.coordinator();

        let result = coordinator
            .check_and_refresh_at(DatasetKind::Article, now())
            .await;

        assert_eq!(result, RefreshResult::up_to_date());
        assert_eq!(h.news.calls.load(Ordering::SeqCst), 0);
        assert_eq!(h.generator.calls(), 0);
    }

    #[tokio::test]
    async fn test_article_generated_from_market_and_news() {
        let h = Harness::new();
        let coordinator = h.coordinator();
        coordinator
            .check_and_refresh_at(DatasetKind::MarketSnapshot, now())
            .await;

        let result = coordinator
            .check_and_refresh_at(DatasetKind::Article, now())
            .await;

        assert!(result.updated);
        let id = result.id.clone().unwrap();
        let stored = h.articles.latest_article().unwrap().unwrap();
        assert_eq!(stored.id, id);
        assert_eq!(stored.content, "<p>Bitcoin held steady.</p>");

        let contexts = h.generator.contexts.lock().unwrap().clone();
        assert_eq!(contexts[0].market.len(), 25);
        assert_eq!(contexts[0].headlines.len(), 3);
        assert!(h.sink.paths().contains(&"/api/v1/articles/latest".to_string()));
    }

    #[tokio::test]
    async fn test_news_failure_degrades_to_no_headlines() {
        let mut h = Harness::new();
        h.news = Arc::new(MockNewsProvider {
            fail: true,
            ..Default::default()
        });
        h.snapshots.seed(MarketSnapshot::from_listing(&listing(0), now()));
        let coordinator = h.coordinator();

        let result = coordinator
            .check_and_refresh_at(DatasetKind::Article, now())
            .await;

        assert!(result.updated);
        let contexts = h.generator.contexts.lock().unwrap().clone();
        assert!(contexts[0].headlines.is_empty());
    }

    #[tokio::test]
    async fn test_empty_generated_content_is_validation_error() {
        let mut h = Harness::new();
        h.generator = Arc::new(MockGenerator::returning("  "));
        h.snapshots.seed(MarketSnapshot::from_listing(&listing(0), now()));
        let coordinator = h.coordinator();

        let result = coordinator
            .check_and_refresh_at(DatasetKind::Article, now())
            .await;

        assert_eq!(result.error, Some(RefreshErrorKind::ValidationError));
        assert!(h.articles.latest_article().unwrap().is_none());
        assert!(h.sink.is_empty());
    }

    // =========================================================================
    // Full pass
    // =========================================================================

    #[tokio::test]
    async fn test_refresh_all_reports_every_dataset() {
        let h = Harness::new();
        let coordinator = h.coordinator();

        let summary = coordinator.refresh_all().await;

        assert!(!summary.any_error());
        for kind in DatasetKind::ALL {
            assert!(summary.get(kind).updated, "{} was not refreshed", kind);
        }

        let again = coordinator.refresh_all().await;
        for kind in DatasetKind::ALL {
            assert_eq!(again.get(kind), &RefreshResult::up_to_date());
        }
        assert_eq!(h.market.calls(), 1);
        assert_eq!(h.generator.calls(), 1);
    }
}
