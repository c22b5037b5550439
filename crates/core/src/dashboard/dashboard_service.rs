use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use log::{debug, warn};

use coinpulse_market_data::PricePoint;

use crate::articles::{ArticleRepositoryTrait, GeneratedArticle};
use crate::errors::{Error, Result, ValidationError};
use crate::market::{
    HistoryService, HistorySource, MarketHistory, MarketMetadata, MarketSnapshot,
    MetadataRepositoryTrait, SnapshotRepositoryTrait,
};
use crate::utils::time_utils::hour_bucket;

/// Longest history window served, in hours.
const MAX_HISTORY_HOURS: i64 = 24 * 90;

/// Most symbols accepted by one multi-symbol history query.
const MAX_HISTORY_SYMBOLS: usize = 50;

/// Read-only queries over persisted data.
///
/// Always answers with the last known good data; [`Error::NoData`] only
/// when nothing has been stored yet.
pub struct DashboardService {
    snapshots: Arc<dyn SnapshotRepositoryTrait>,
    metadata: Arc<dyn MetadataRepositoryTrait>,
    articles: Arc<dyn ArticleRepositoryTrait>,
    history: Option<Arc<HistoryService>>,
}

impl DashboardService {
    pub fn new(
        snapshots: Arc<dyn SnapshotRepositoryTrait>,
        metadata: Arc<dyn MetadataRepositoryTrait>,
        articles: Arc<dyn ArticleRepositoryTrait>,
    ) -> Self {
        Self {
            snapshots,
            metadata,
            articles,
            history: None,
        }
    }

    /// Fall back to provider history when the store is too sparse.
    pub fn with_history_service(mut self, history: Arc<HistoryService>) -> Self {
        self.history = Some(history);
        self
    }

    /// Latest bucket, ordered by market cap descending.
    pub fn latest_market(&self) -> Result<Vec<MarketSnapshot>> {
        let latest = self.snapshots.latest_snapshots()?;
        if latest.is_empty() {
            return Err(Error::NoData("market snapshots".to_string()));
        }
        Ok(latest)
    }

    pub async fn market_history(&self, symbol: &str, hours: i64) -> Result<MarketHistory> {
        self.market_history_at(symbol, hours, Utc::now()).await
    }

    pub async fn market_history_at(
        &self,
        symbol: &str,
        hours: i64,
        now: DateTime<Utc>,
    ) -> Result<MarketHistory> {
        let symbol = symbol.trim().to_uppercase();
        if symbol.is_empty() {
            return Err(ValidationError::MissingField("symbol".to_string()).into());
        }
        self.market_histories_at(std::slice::from_ref(&symbol), hours, now)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| Error::NoData(format!("history for {}", symbol)))
    }

    pub async fn market_histories(
        &self,
        symbols: &[String],
        hours: i64,
    ) -> Result<Vec<MarketHistory>> {
        self.market_histories_at(symbols, hours, Utc::now()).await
    }

    /// History for several symbols over the last `hours` hours.
    ///
    /// Symbols with fewer than two stored points in the window are fetched
    /// from the provider in one bounded fan-out. Symbols with no data at all
    /// are left out; the result is in request order.
    pub async fn market_histories_at(
        &self,
        symbols: &[String],
        hours: i64,
        now: DateTime<Utc>,
    ) -> Result<Vec<MarketHistory>> {
        if hours <= 0 || hours > MAX_HISTORY_HOURS {
            return Err(ValidationError::InvalidInput(format!(
                "hours must be between 1 and {}",
                MAX_HISTORY_HOURS
            ))
            .into());
        }

        let mut seen = HashSet::new();
        let symbols: Vec<String> = symbols
            .iter()
            .map(|s| s.trim().to_uppercase())
            .filter(|s| !s.is_empty() && seen.insert(s.clone()))
            .collect();
        if symbols.is_empty() {
            return Err(ValidationError::MissingField("symbols".to_string()).into());
        }
        if symbols.len() > MAX_HISTORY_SYMBOLS {
            return Err(ValidationError::InvalidInput(format!(
                "at most {} symbols per request",
                MAX_HISTORY_SYMBOLS
            ))
            .into());
        }

        let since = now - Duration::hours(hours);
        let mut stored = Vec::with_capacity(symbols.len());
        for symbol in symbols {
            let rows = self.snapshots.snapshot_history(&symbol, since)?;
            stored.push((symbol, rows));
        }

        let mut fetched = self.fetch_sparse(&stored, hours, since).await;

        let histories: Vec<MarketHistory> = stored
            .into_iter()
            .filter_map(|(symbol, rows)| {
                if rows.len() < 2 {
                    if let Some(points) = fetched.remove(&symbol) {
                        return Some(MarketHistory {
                            symbol,
                            source: HistorySource::Provider,
                            points,
                        });
                    }
                }
                if rows.is_empty() {
                    return None;
                }
                Some(MarketHistory {
                    symbol,
                    source: HistorySource::Store,
                    points: rows.iter().map(MarketSnapshot::price_point).collect(),
                })
            })
            .collect();

        if histories.is_empty() {
            return Err(Error::NoData("price history".to_string()));
        }
        Ok(histories)
    }

    /// Provider points within the window for every symbol the store cannot
    /// serve on its own.
    async fn fetch_sparse(
        &self,
        stored: &[(String, Vec<MarketSnapshot>)],
        hours: i64,
        since: DateTime<Utc>,
    ) -> HashMap<String, Vec<PricePoint>> {
        let mut fetched = HashMap::new();
        let Some(history) = &self.history else {
            return fetched;
        };

        let sparse: Vec<String> = stored
            .iter()
            .filter(|(_, rows)| rows.len() < 2)
            .map(|(symbol, _)| symbol.clone())
            .collect();
        if sparse.is_empty() {
            return fetched;
        }

        let days = ((hours + 23) / 24) as u32;
        for (symbol, result) in history.fetch_many(&sparse, days).await {
            match result {
                Ok(points) => {
                    let points: Vec<_> = points
                        .into_iter()
                        .filter(|p| p.timestamp >= since)
                        .collect();
                    if !points.is_empty() {
                        debug!("Served {} history from provider", symbol);
                        fetched.insert(symbol, points);
                    }
                }
                Err(e) => warn!("Provider history for {} unavailable: {}", symbol, e),
            }
        }
        fetched
    }

    pub fn metadata(&self) -> Result<Vec<MarketMetadata>> {
        let rows = self.metadata.list_metadata()?;
        if rows.is_empty() {
            return Err(Error::NoData("coin metadata".to_string()));
        }
        Ok(rows)
    }

    pub fn current_article(&self) -> Result<GeneratedArticle> {
        self.current_article_at(Utc::now())
    }

    /// The newest article of the current hour bucket, or the newest overall
    /// while this hour has none yet.
    pub fn current_article_at(&self, now: DateTime<Utc>) -> Result<GeneratedArticle> {
        if let Some(article) = self.articles.article_for_bucket(hour_bucket(now))? {
            return Ok(article);
        }
        self.articles
            .latest_article()?
            .ok_or_else(|| Error::NoData("generated articles".to_string()))
    }
}
