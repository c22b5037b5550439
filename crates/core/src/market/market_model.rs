//! Market domain models.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use coinpulse_market_data::{CoinListing, CoinProfile, GlobalStats, PricePoint};

use crate::errors::{Result, ValidationError};
use crate::utils::time_utils::hour_bucket;

/// One coin's market state within an hour bucket.
///
/// At most one row exists per `(symbol, hour_bucket)`; a later write in the
/// same bucket replaces the earlier one.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarketSnapshot {
    pub id: String,
    pub symbol: String,
    pub name: String,
    pub price: Decimal,
    pub change_percent_24h: f64,
    pub volume: Decimal,
    pub market_cap: Decimal,
    pub timestamp: DateTime<Utc>,
    pub hour_bucket: DateTime<Utc>,
}

impl MarketSnapshot {
    /// Deterministic row id for a `(symbol, bucket)` pair.
    pub fn snapshot_id(symbol: &str, bucket: DateTime<Utc>) -> String {
        format!("{}_{}", symbol.to_uppercase(), bucket.format("%Y%m%d%H"))
    }

    /// Build a snapshot for the bucket containing `now`.
    pub fn from_listing(listing: &CoinListing, now: DateTime<Utc>) -> Self {
        let bucket = hour_bucket(now);
        let symbol = listing.symbol.trim().to_uppercase();
        Self {
            id: Self::snapshot_id(&symbol, bucket),
            symbol,
            name: listing.name.trim().to_string(),
            price: listing.price,
            change_percent_24h: listing.change_percent_24h,
            volume: listing.volume_24h,
            market_cap: listing.market_cap,
            timestamp: now,
            hour_bucket: bucket,
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.symbol.is_empty() {
            return Err(ValidationError::MissingField("symbol".to_string()).into());
        }
        if self.price.is_sign_negative() {
            return Err(ValidationError::InvalidInput(format!(
                "Negative price for {}: {}",
                self.symbol, self.price
            ))
            .into());
        }
        if !self.change_percent_24h.is_finite() {
            return Err(ValidationError::InvalidInput(format!(
                "Non-finite 24h change for {}",
                self.symbol
            ))
            .into());
        }
        Ok(())
    }

    pub fn price_point(&self) -> PricePoint {
        PricePoint {
            timestamp: self.timestamp,
            price: self.price,
        }
    }
}

/// Static profile of a coin, stamped with the global stats of the refresh
/// that wrote it.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarketMetadata {
    pub symbol: String,
    pub name: Option<String>,
    pub logo_url: Option<String>,
    pub description: Option<String>,
    pub category: Option<String>,
    pub website_url: Option<String>,
    pub total_market_cap: Decimal,
    pub total_volume_24h: Decimal,
    pub btc_dominance: f64,
    pub eth_dominance: f64,
    pub timestamp: DateTime<Utc>,
}

impl MarketMetadata {
    pub fn from_profile(profile: CoinProfile, global: &GlobalStats, now: DateTime<Utc>) -> Self {
        Self {
            symbol: profile.symbol.to_uppercase(),
            name: profile.name,
            logo_url: profile.logo_url,
            description: profile.description,
            category: profile.category,
            website_url: profile.website_url,
            total_market_cap: global.total_market_cap,
            total_volume_24h: global.total_volume_24h,
            btc_dominance: global.btc_dominance,
            eth_dominance: global.eth_dominance,
            timestamp: now,
        }
    }

    /// Global stats recorded alongside this row.
    pub fn global_stats(&self) -> GlobalStats {
        GlobalStats {
            total_market_cap: self.total_market_cap,
            total_volume_24h: self.total_volume_24h,
            btc_dominance: self.btc_dominance,
            eth_dominance: self.eth_dominance,
        }
    }
}

/// Where a history series came from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HistorySource {
    Store,
    Provider,
}

/// Price series for one symbol.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarketHistory {
    pub symbol: String,
    pub source: HistorySource,
    pub points: Vec<PricePoint>,
}
