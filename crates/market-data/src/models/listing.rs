use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// One coin in a market listing.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CoinListing {
    /// Provider-internal identifier (e.g. CoinGecko's "bitcoin").
    pub provider_id: String,

    /// Uppercase ticker (e.g. "BTC").
    pub symbol: String,

    /// Display name (e.g. "Bitcoin").
    pub name: String,

    /// Spot price in USD.
    pub price: Decimal,

    /// Signed 24h change in percent. Not rounded.
    pub change_percent_24h: f64,

    /// 24h traded volume in USD.
    pub volume_24h: Decimal,

    /// Market capitalization in USD.
    pub market_cap: Decimal,

    /// When the provider last updated this row.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_updated: Option<DateTime<Utc>>,
}

/// A single historical price observation.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PricePoint {
    pub timestamp: DateTime<Utc>,
    pub price: Decimal,
}
