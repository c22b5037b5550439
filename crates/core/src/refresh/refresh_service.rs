use std::collections::HashSet;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use log::{debug, error, info, warn};

use coinpulse_market_data::{
    MarketDataProvider, MetadataProvider, NegativeCache, NewsItem, NewsProvider, RetryPolicy,
};

use super::refresh_model::{
    DatasetKind, RefreshErrorKind, RefreshResult, RefreshSettings, RefreshSummary,
};
use crate::articles::{ArticleContext, ArticleGenerator, ArticleRepositoryTrait, GeneratedArticle};
use crate::constants::DEFAULT_METADATA_SYMBOLS;
use crate::errors::{Error, Result, ValidationError};
use crate::events::{CacheInvalidation, InvalidationSink};
use crate::limits::RateLimitTracker;
use crate::market::{
    MarketMetadata, MarketSnapshot, MetadataRepositoryTrait, SnapshotRepositoryTrait,
};
use crate::utils::time_utils::is_stale;

/// Stores written by the coordinator.
#[derive(Clone)]
pub struct RefreshStores {
    pub snapshots: Arc<dyn SnapshotRepositoryTrait>,
    pub metadata: Arc<dyn MetadataRepositoryTrait>,
    pub articles: Arc<dyn ArticleRepositoryTrait>,
}

/// External sources read by the coordinator.
#[derive(Clone)]
pub struct RefreshProviders {
    pub market: Arc<dyn MarketDataProvider>,
    pub metadata: Arc<dyn MetadataProvider>,
    pub news: Arc<dyn NewsProvider>,
    pub generator: Arc<dyn ArticleGenerator>,
}

/// Staleness-gated refresh of every dataset.
///
/// A check reads the dataset's last write time and does nothing while it is
/// within its interval. Otherwise it spends rate-limit budget, fetches with
/// retry, validates, persists, and finally emits a cache invalidation.
/// Failures become structured [`RefreshResult`]s; nothing is propagated.
pub struct RefreshCoordinator {
    stores: RefreshStores,
    providers: RefreshProviders,
    rate_limiter: Arc<RateLimitTracker>,
    sink: Arc<dyn InvalidationSink>,
    retry: RetryPolicy,
    settings: RefreshSettings,
    metadata_negative_cache: NegativeCache,
}

impl RefreshCoordinator {
    pub fn new(
        stores: RefreshStores,
        providers: RefreshProviders,
        rate_limiter: Arc<RateLimitTracker>,
        sink: Arc<dyn InvalidationSink>,
    ) -> Self {
        Self {
            stores,
            providers,
            rate_limiter,
            sink,
            retry: RetryPolicy::default(),
            settings: RefreshSettings::default(),
            metadata_negative_cache: NegativeCache::new(),
        }
    }

    pub fn with_settings(mut self, settings: RefreshSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn settings(&self) -> &RefreshSettings {
        &self.settings
    }

    pub fn metadata_negative_cache(&self) -> &NegativeCache {
        &self.metadata_negative_cache
    }

    /// Refresh `kind` if it is stale.
    pub async fn check_and_refresh(&self, kind: DatasetKind) -> RefreshResult {
        self.check_and_refresh_at(kind, Utc::now()).await
    }

    pub async fn check_and_refresh_at(&self, kind: DatasetKind, now: DateTime<Utc>) -> RefreshResult {
        match self.try_refresh(kind, now).await {
            Ok(result) => result,
            Err(err) => {
                let result = RefreshResult::from_error(&err);
                match result.error {
                    Some(RefreshErrorKind::RateLimitExceeded) => {
                        warn!("Refresh of {} skipped: {}", kind, err)
                    }
                    _ => error!("Refresh of {} failed: {}", kind, err),
                }
                result
            }
        }
    }

    /// Check every dataset concurrently.
    pub async fn refresh_all(&self) -> RefreshSummary {
        let now = Utc::now();
        let (snapshots, metadata, articles) = futures::join!(
            self.check_and_refresh_at(DatasetKind::MarketSnapshot, now),
            self.check_and_refresh_at(DatasetKind::MarketMetadata, now),
            self.check_and_refresh_at(DatasetKind::Article, now),
        );
        RefreshSummary {
            snapshots,
            metadata,
            articles,
        }
    }

    /// Time of the most recent persisted write for `kind`.
    pub fn last_updated(&self, kind: DatasetKind) -> Result<Option<DateTime<Utc>>> {
        match kind {
            DatasetKind::MarketSnapshot => self.stores.snapshots.latest_snapshot_timestamp(),
            DatasetKind::MarketMetadata => self.stores.metadata.latest_metadata_timestamp(),
            DatasetKind::Article => self.stores.articles.latest_article_created_at(),
        }
    }

    async fn try_refresh(&self, kind: DatasetKind, now: DateTime<Utc>) -> Result<RefreshResult> {
        let last = self.last_updated(kind)?;
        if !is_stale(last, now, self.settings.interval_for(kind)) {
            debug!("{} is up to date (last write {:?})", kind, last);
            return Ok(RefreshResult::up_to_date());
        }

        info!("Refreshing {} (last write {:?})", kind, last);
        let result = match kind {
            DatasetKind::MarketSnapshot => self.refresh_snapshots(now).await?,
            DatasetKind::MarketMetadata => self.refresh_metadata(now).await?,
            DatasetKind::Article => self.refresh_article(now).await?,
        };

        // Only reached once the write has been persisted
        self.sink
            .invalidate(CacheInvalidation::for_dataset(kind, now));
        Ok(result)
    }

    async fn refresh_snapshots(&self, now: DateTime<Utc>) -> Result<RefreshResult> {
        let provider = &self.providers.market;
        self.rate_limiter.acquire(provider.id()).await?;

        let limit = self.settings.listing_limit;
        let listings = self
            .retry
            .run(&format!("{} listings", provider.id()), || {
                provider.get_listings(limit)
            })
            .await?;

        let mut seen = HashSet::new();
        let mut snapshots = Vec::with_capacity(listings.len());
        for listing in &listings {
            let snapshot = MarketSnapshot::from_listing(listing, now);
            if let Err(e) = snapshot.validate() {
                warn!("Dropping invalid listing '{}': {}", listing.symbol, e);
                continue;
            }
            // Listings are ordered by market cap, so the first ticker wins
            if seen.insert(snapshot.symbol.clone()) {
                snapshots.push(snapshot);
            }
        }

        if snapshots.is_empty() {
            return Err(ValidationError::InvalidInput(format!(
                "{} returned no valid listings",
                provider.id()
            ))
            .into());
        }

        let count = self.stores.snapshots.upsert_snapshots(snapshots).await?;
        info!("Stored {} market snapshots", count);
        Ok(RefreshResult::updated_count(count))
    }

    /// Symbols to describe: those of the latest bucket, or the majors list
    /// before any snapshot exists.
    fn metadata_symbols(&self) -> Result<Vec<String>> {
        let latest = self.stores.snapshots.latest_snapshots()?;
        if latest.is_empty() {
            return Ok(DEFAULT_METADATA_SYMBOLS
                .iter()
                .map(|s| s.to_string())
                .collect());
        }
        Ok(latest.into_iter().map(|s| s.symbol).collect())
    }

    async fn refresh_metadata(&self, now: DateTime<Utc>) -> Result<RefreshResult> {
        let provider = &self.providers.metadata;

        let (skipped, symbols): (Vec<String>, Vec<String>) = self
            .metadata_symbols()?
            .into_iter()
            .partition(|s| self.metadata_negative_cache.contains(s));
        if !skipped.is_empty() {
            debug!("Skipping unsupported symbols: {}", skipped.join(", "));
        }
        if symbols.is_empty() {
            return Err(ValidationError::InvalidInput(
                "Every candidate symbol is marked unsupported".to_string(),
            )
            .into());
        }

        self.rate_limiter.acquire(provider.id()).await?;
        let batch = self
            .retry
            .run(&format!("{} profiles", provider.id()), || {
                provider.get_profiles(&symbols)
            })
            .await?;

        for symbol in &batch.missing {
            self.metadata_negative_cache
                .set(symbol, format!("{} has no profile for {}", provider.id(), symbol));
        }

        if batch.profiles.is_empty() {
            return Err(ValidationError::InvalidInput(format!(
                "{} returned no profiles",
                provider.id()
            ))
            .into());
        }

        self.rate_limiter.acquire(provider.id()).await?;
        let global = self
            .retry
            .run(&format!("{} global stats", provider.id()), || {
                provider.get_global_stats()
            })
            .await?;

        let rows: Vec<MarketMetadata> = batch
            .profiles
            .into_iter()
            .map(|profile| MarketMetadata::from_profile(profile, &global, now))
            .collect();

        let count = self.stores.metadata.upsert_metadata(rows).await?;
        info!("Stored metadata for {} symbols", count);
        Ok(RefreshResult::updated_count(count))
    }

    /// Latest headlines. Any failure degrades to an empty list.
    async fn fetch_headlines(&self) -> Vec<NewsItem> {
        let provider = &self.providers.news;
        if let Err(e) = self.rate_limiter.acquire(provider.id()).await {
            warn!("Writing article without headlines: {}", e);
            return Vec::new();
        }

        let limit = self.settings.news_limit;
        match self
            .retry
            .run(&format!("{} news", provider.id()), || {
                provider.get_latest_news(limit)
            })
            .await
        {
            Ok(items) => items,
            Err(e) => {
                warn!("Writing article without headlines: {}", e);
                Vec::new()
            }
        }
    }

    async fn refresh_article(&self, now: DateTime<Utc>) -> Result<RefreshResult> {
        let market = self.stores.snapshots.latest_snapshots()?;
        let global = self
            .stores
            .metadata
            .list_metadata()?
            .into_iter()
            .max_by_key(|m| m.timestamp)
            .map(|m| m.global_stats());
        let headlines = self.fetch_headlines().await;

        let context = ArticleContext {
            generated_at: now,
            market,
            global,
            headlines,
        };
        if context.is_empty() {
            return Err(Error::NoData(
                "No market data or headlines to write about".to_string(),
            ));
        }

        let generator = &self.providers.generator;
        self.rate_limiter.acquire(generator.id()).await?;
        let content = self
            .retry
            .run(&format!("{} article", generator.id()), || {
                generator.generate(&context)
            })
            .await?;

        let article = GeneratedArticle::new(content, now)?;
        let saved = self.stores.articles.insert_article(article).await?;
        info!("Stored generated article {}", saved.id);
        Ok(RefreshResult::updated_id(saved.id))
    }
}
