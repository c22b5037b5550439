use async_trait::async_trait;
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use diesel::sqlite::SqliteConnection;
use std::sync::Arc;

use coinpulse_core::market::{MarketMetadata, MetadataRepositoryTrait};
use coinpulse_core::Result;

use super::model::MarketMetadataDB;
use crate::db::{get_connection, DbPool, WriteHandle};
use crate::errors::StorageError;
use crate::schema::market_metadata::dsl;
use crate::utils::{chunk_for_sqlite, parse_timestamp};

pub struct MetadataRepository {
    pool: Arc<DbPool>,
    writer: WriteHandle,
}

impl MetadataRepository {
    pub fn new(pool: Arc<DbPool>, writer: WriteHandle) -> Self {
        Self { pool, writer }
    }
}

#[async_trait]
impl MetadataRepositoryTrait for MetadataRepository {
    async fn upsert_metadata(&self, rows: Vec<MarketMetadata>) -> Result<usize> {
        if rows.is_empty() {
            return Ok(0);
        }
        let rows: Vec<MarketMetadataDB> = rows.iter().map(MarketMetadataDB::from).collect();

        self.writer
            .exec(move |conn: &mut SqliteConnection| -> Result<usize> {
                let mut written = 0;
                for chunk in chunk_for_sqlite(&rows) {
                    written += diesel::replace_into(dsl::market_metadata)
                        .values(chunk)
                        .execute(conn)
                        .map_err(StorageError::from)?;
                }
                Ok(written)
            })
            .await
    }

    fn latest_metadata_timestamp(&self) -> Result<Option<DateTime<Utc>>> {
        let mut conn = get_connection(&self.pool)?;
        let latest: Option<String> = dsl::market_metadata
            .select(diesel::dsl::max(dsl::timestamp))
            .first(&mut conn)
            .map_err(StorageError::from)?;

        latest
            .map(|t| parse_timestamp("timestamp", &t).map_err(Into::into))
            .transpose()
    }

    fn list_metadata(&self) -> Result<Vec<MarketMetadata>> {
        let mut conn = get_connection(&self.pool)?;
        let rows = dsl::market_metadata
            .order(dsl::symbol.asc())
            .select(MarketMetadataDB::as_select())
            .load(&mut conn)
            .map_err(StorageError::from)?;

        rows.into_iter()
            .map(|row| MarketMetadata::try_from(row).map_err(Into::into))
            .collect()
    }

    fn get_metadata(&self, symbol: &str) -> Result<Option<MarketMetadata>> {
        let mut conn = get_connection(&self.pool)?;
        let row = dsl::market_metadata
            .find(symbol.to_uppercase())
            .select(MarketMetadataDB::as_select())
            .first(&mut conn)
            .optional()
            .map_err(StorageError::from)?;

        row.map(|r| MarketMetadata::try_from(r).map_err(Into::into))
            .transpose()
    }
}
