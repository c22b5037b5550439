use async_trait::async_trait;
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use diesel::sqlite::SqliteConnection;
use std::sync::Arc;

use coinpulse_core::market::{MarketSnapshot, SnapshotRepositoryTrait};
use coinpulse_core::Result;

use super::model::MarketSnapshotDB;
use crate::db::{get_connection, DbPool, WriteHandle};
use crate::errors::StorageError;
use crate::schema::market_snapshots::dsl;
use crate::utils::{chunk_for_sqlite, parse_timestamp, to_storage_string};

pub struct SnapshotRepository {
    pool: Arc<DbPool>,
    writer: WriteHandle,
}

impl SnapshotRepository {
    pub fn new(pool: Arc<DbPool>, writer: WriteHandle) -> Self {
        Self { pool, writer }
    }
}

fn into_domain(rows: Vec<MarketSnapshotDB>) -> Result<Vec<MarketSnapshot>> {
    rows.into_iter()
        .map(|row| MarketSnapshot::try_from(row).map_err(Into::into))
        .collect()
}

#[async_trait]
impl SnapshotRepositoryTrait for SnapshotRepository {
    async fn upsert_snapshots(&self, snapshots: Vec<MarketSnapshot>) -> Result<usize> {
        if snapshots.is_empty() {
            return Ok(0);
        }
        let rows: Vec<MarketSnapshotDB> = snapshots.iter().map(MarketSnapshotDB::from).collect();

        self.writer
            .exec(move |conn: &mut SqliteConnection| -> Result<usize> {
                let mut written = 0;
                for chunk in chunk_for_sqlite(&rows) {
                    // REPLACE resolves conflicts on both the id and the
                    // (symbol, hour_bucket) unique index.
                    written += diesel::replace_into(dsl::market_snapshots)
                        .values(chunk)
                        .execute(conn)
                        .map_err(StorageError::from)?;
                }
                Ok(written)
            })
            .await
    }

    fn latest_snapshot_timestamp(&self) -> Result<Option<DateTime<Utc>>> {
        let mut conn = get_connection(&self.pool)?;
        let latest: Option<String> = dsl::market_snapshots
            .select(diesel::dsl::max(dsl::timestamp))
            .first(&mut conn)
            .map_err(StorageError::from)?;

        latest
            .map(|t| parse_timestamp("timestamp", &t).map_err(Into::into))
            .transpose()
    }

    fn latest_snapshots(&self) -> Result<Vec<MarketSnapshot>> {
        let mut conn = get_connection(&self.pool)?;
        let bucket: Option<String> = dsl::market_snapshots
            .select(diesel::dsl::max(dsl::hour_bucket))
            .first(&mut conn)
            .map_err(StorageError::from)?;
        let Some(bucket) = bucket else {
            return Ok(Vec::new());
        };

        let rows = dsl::market_snapshots
            .filter(dsl::hour_bucket.eq(bucket))
            .select(MarketSnapshotDB::as_select())
            .load(&mut conn)
            .map_err(StorageError::from)?;

        // Market cap is stored as text, so order numerically here
        let mut snapshots = into_domain(rows)?;
        snapshots.sort_by(|a, b| {
            b.market_cap
                .cmp(&a.market_cap)
                .then_with(|| a.symbol.cmp(&b.symbol))
        });
        Ok(snapshots)
    }

    fn snapshot_history(&self, symbol: &str, since: DateTime<Utc>) -> Result<Vec<MarketSnapshot>> {
        let mut conn = get_connection(&self.pool)?;
        let rows = dsl::market_snapshots
            .filter(dsl::symbol.eq(symbol.to_uppercase()))
            .filter(dsl::timestamp.ge(to_storage_string(since)))
            .order(dsl::timestamp.asc())
            .select(MarketSnapshotDB::as_select())
            .load(&mut conn)
            .map_err(StorageError::from)?;

        into_domain(rows)
    }
}
