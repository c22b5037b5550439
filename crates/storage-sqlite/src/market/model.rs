//! Database models for market snapshots and metadata.

use diesel::prelude::*;

use coinpulse_core::market::{MarketMetadata, MarketSnapshot};

use crate::errors::StorageError;
use crate::utils::{parse_decimal, parse_timestamp, to_storage_string};

#[derive(Queryable, Selectable, Insertable, Debug, Clone, PartialEq)]
#[diesel(table_name = crate::schema::market_snapshots)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct MarketSnapshotDB {
    pub id: String,
    pub symbol: String,
    pub name: String,
    pub price: String,
    pub change_percent_24h: f64,
    pub volume: String,
    pub market_cap: String,
    pub timestamp: String,
    pub hour_bucket: String,
}

impl From<&MarketSnapshot> for MarketSnapshotDB {
    fn from(s: &MarketSnapshot) -> Self {
        Self {
            id: s.id.clone(),
            symbol: s.symbol.clone(),
            name: s.name.clone(),
            price: s.price.to_string(),
            change_percent_24h: s.change_percent_24h,
            volume: s.volume.to_string(),
            market_cap: s.market_cap.to_string(),
            timestamp: to_storage_string(s.timestamp),
            hour_bucket: to_storage_string(s.hour_bucket),
        }
    }
}

impl TryFrom<MarketSnapshotDB> for MarketSnapshot {
    type Error = StorageError;

    fn try_from(db: MarketSnapshotDB) -> Result<Self, Self::Error> {
        Ok(Self {
            price: parse_decimal("price", &db.price)?,
            volume: parse_decimal("volume", &db.volume)?,
            market_cap: parse_decimal("market_cap", &db.market_cap)?,
            timestamp: parse_timestamp("timestamp", &db.timestamp)?,
            hour_bucket: parse_timestamp("hour_bucket", &db.hour_bucket)?,
            id: db.id,
            symbol: db.symbol,
            name: db.name,
            change_percent_24h: db.change_percent_24h,
        })
    }
}

#[derive(Queryable, Selectable, Insertable, Debug, Clone, PartialEq)]
#[diesel(table_name = crate::schema::market_metadata)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct MarketMetadataDB {
    pub symbol: String,
    pub name: Option<String>,
    pub logo_url: Option<String>,
    pub description: Option<String>,
    pub category: Option<String>,
    pub website_url: Option<String>,
    pub total_market_cap: String,
    pub total_volume_24h: String,
    pub btc_dominance: f64,
    pub eth_dominance: f64,
    pub timestamp: String,
}

impl From<&MarketMetadata> for MarketMetadataDB {
    fn from(m: &MarketMetadata) -> Self {
        Self {
            symbol: m.symbol.clone(),
            name: m.name.clone(),
            logo_url: m.logo_url.clone(),
            description: m.description.clone(),
            category: m.category.clone(),
            website_url: m.website_url.clone(),
            total_market_cap: m.total_market_cap.to_string(),
            total_volume_24h: m.total_volume_24h.to_string(),
            btc_dominance: m.btc_dominance,
            eth_dominance: m.eth_dominance,
            timestamp: to_storage_string(m.timestamp),
        }
    }
}

impl TryFrom<MarketMetadataDB> for MarketMetadata {
    type Error = StorageError;

    fn try_from(db: MarketMetadataDB) -> Result<Self, Self::Error> {
        Ok(Self {
            total_market_cap: parse_decimal("total_market_cap", &db.total_market_cap)?,
            total_volume_24h: parse_decimal("total_volume_24h", &db.total_volume_24h)?,
            timestamp: parse_timestamp("timestamp", &db.timestamp)?,
            symbol: db.symbol,
            name: db.name,
            logo_url: db.logo_url,
            description: db.description,
            category: db.category,
            website_url: db.website_url,
            btc_dominance: db.btc_dominance,
            eth_dominance: db.eth_dominance,
        })
    }
}
