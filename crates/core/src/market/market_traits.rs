use async_trait::async_trait;
use chrono::{DateTime, Utc};

use super::market_model::{MarketMetadata, MarketSnapshot};
use crate::errors::Result;

/// Persistence for hourly market snapshots.
#[async_trait]
pub trait SnapshotRepositoryTrait: Send + Sync {
    /// Insert or replace snapshots keyed by `(symbol, hour_bucket)`.
    /// Returns the number of rows written.
    async fn upsert_snapshots(&self, snapshots: Vec<MarketSnapshot>) -> Result<usize>;

    /// Timestamp of the most recent snapshot, if any.
    fn latest_snapshot_timestamp(&self) -> Result<Option<DateTime<Utc>>>;

    /// All snapshots in the most recent bucket, ordered by market cap descending.
    fn latest_snapshots(&self) -> Result<Vec<MarketSnapshot>>;

    /// Snapshots for one symbol at or after `since`, oldest first.
    fn snapshot_history(&self, symbol: &str, since: DateTime<Utc>) -> Result<Vec<MarketSnapshot>>;
}

/// Persistence for per-symbol coin metadata.
#[async_trait]
pub trait MetadataRepositoryTrait: Send + Sync {
    /// Insert or replace rows keyed by symbol.
    async fn upsert_metadata(&self, rows: Vec<MarketMetadata>) -> Result<usize>;

    fn latest_metadata_timestamp(&self) -> Result<Option<DateTime<Utc>>>;

    /// All rows ordered by symbol.
    fn list_metadata(&self) -> Result<Vec<MarketMetadata>>;

    fn get_metadata(&self, symbol: &str) -> Result<Option<MarketMetadata>>;
}
