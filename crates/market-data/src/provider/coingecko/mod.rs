//! CoinGecko market data provider implementation.
//!
//! This module provides market data from the CoinGecko API:
//! - Top coins by market cap via /coins/markets
//! - Price history via /coins/{id}/market_chart
//! - Symbol to coin id resolution via /search
//!
//! The public API works without a key at a low rate; a demo key raises the
//! limit. API documentation: https://docs.coingecko.com/reference/introduction

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use reqwest::Client;
use rust_decimal::Decimal;
use serde::Deserialize;
use tracing::{debug, warn};

use super::http;
use crate::errors::MarketDataError;
use crate::models::{CoinListing, PricePoint};
use crate::provider::MarketDataProvider;

const BASE_URL: &str = "https://api.coingecko.com/api/v3";
const PROVIDER_ID: &str = "coingecko";
const VS_CURRENCY: &str = "usd";

/// Maximum page size accepted by /coins/markets.
const MAX_PER_PAGE: usize = 250;

// ============================================================================
// API Response Structures
// ============================================================================

/// Row from /coins/markets
#[derive(Debug, Deserialize)]
struct MarketRow {
    id: String,
    symbol: String,
    name: String,
    current_price: Option<f64>,
    market_cap: Option<f64>,
    total_volume: Option<f64>,
    price_change_percentage_24h: Option<f64>,
    last_updated: Option<DateTime<Utc>>,
}

/// Response from /coins/{id}/market_chart
#[derive(Debug, Deserialize)]
struct MarketChartResponse {
    /// `[unix_ms, price]` pairs
    #[serde(default)]
    prices: Vec<(f64, f64)>,
}

/// Response from /search
#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    coins: Vec<SearchCoin>,
}

#[derive(Debug, Deserialize)]
struct SearchCoin {
    id: String,
    symbol: String,
    market_cap_rank: Option<u32>,
}

// ============================================================================
// CoinGeckoProvider
// ============================================================================

/// CoinGecko market data provider.
pub struct CoinGeckoProvider {
    client: Client,
    api_key: Option<String>,
    base_url: String,
    /// Symbol -> coin id, learned from listings and searches.
    coin_ids: Mutex<HashMap<String, String>>,
}

impl CoinGeckoProvider {
    /// Create a new CoinGecko provider, optionally with a demo API key.
    pub fn new(api_key: Option<String>) -> Self {
        Self::with_base_url(api_key, BASE_URL)
    }

    /// Create a provider pointed at a custom base URL (pro endpoint, proxies).
    pub fn with_base_url(api_key: Option<String>, base_url: impl Into<String>) -> Self {
        Self {
            client: http::build_client(),
            api_key: api_key.filter(|k| !k.trim().is_empty()),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            coin_ids: Mutex::new(HashMap::new()),
        }
    }

    fn lock_ids(&self) -> MutexGuard<'_, HashMap<String, String>> {
        self.coin_ids.lock().unwrap_or_else(|poisoned| {
            warn!("CoinGecko id map mutex was poisoned, recovering");
            poisoned.into_inner()
        })
    }

    /// Make a GET request to the CoinGecko API.
    async fn fetch(&self, endpoint: &str, params: &[(&str, String)]) -> Result<String, MarketDataError> {
        let url = format!("{}{}", self.base_url, endpoint);
        let mut request = self.client.get(&url).query(params);

        if let Some(key) = &self.api_key {
            request = request.header("x-cg-demo-api-key", key);
        }

        debug!("CoinGecko request: {} with {} params", endpoint, params.len());
        http::send(PROVIDER_ID, request).await
    }

    /// Resolve a ticker to a CoinGecko coin id.
    async fn resolve_coin_id(&self, symbol: &str) -> Result<String, MarketDataError> {
        let symbol = symbol.to_uppercase();
        if let Some(id) = self.lock_ids().get(&symbol) {
            return Ok(id.clone());
        }

        let body = self.fetch("/search", &[("query", symbol.clone())]).await?;
        let response: SearchResponse = http::parse_json(PROVIDER_ID, &body)?;
        let id = pick_search_match(&symbol, response.coins)
            .ok_or_else(|| MarketDataError::SymbolNotFound(symbol.clone()))?;

        self.lock_ids().insert(symbol, id.clone());
        Ok(id)
    }
}

/// Pick the best-ranked coin whose ticker matches exactly.
fn pick_search_match(symbol: &str, coins: Vec<SearchCoin>) -> Option<String> {
    coins
        .into_iter()
        .filter(|c| c.symbol.eq_ignore_ascii_case(symbol))
        .min_by_key(|c| c.market_cap_rank.unwrap_or(u32::MAX))
        .map(|c| c.id)
}

fn to_decimal(value: Option<f64>) -> Decimal {
    value
        .and_then(|v| Decimal::try_from(v).ok())
        .unwrap_or(Decimal::ZERO)
}

fn listing_from_row(row: MarketRow) -> Result<CoinListing, MarketDataError> {
    let price = row.current_price.ok_or_else(|| MarketDataError::ValidationFailed {
        message: format!("Missing price for {}", row.symbol),
    })?;
    let price = Decimal::try_from(price).map_err(|_| MarketDataError::ValidationFailed {
        message: format!("Invalid price for {}: {}", row.symbol, price),
    })?;

    Ok(CoinListing {
        provider_id: row.id,
        symbol: row.symbol.to_uppercase(),
        name: row.name,
        price,
        change_percent_24h: row.price_change_percentage_24h.unwrap_or(0.0),
        volume_24h: to_decimal(row.total_volume),
        market_cap: to_decimal(row.market_cap),
        last_updated: row.last_updated,
    })
}

/// Listings for every usable row; a row without a valid price is dropped.
fn listings_from_rows(rows: Vec<MarketRow>) -> Vec<CoinListing> {
    rows.into_iter()
        .filter_map(|row| {
            let id = row.id.clone();
            match listing_from_row(row) {
                Ok(listing) => Some(listing),
                Err(e) => {
                    warn!("Skipping CoinGecko row {}: {}", id, e);
                    None
                }
            }
        })
        .collect()
}

fn points_from_chart(chart: MarketChartResponse) -> Vec<PricePoint> {
    chart
        .prices
        .into_iter()
        .filter_map(|(ms, price)| {
            let timestamp = Utc.timestamp_millis_opt(ms as i64).single()?;
            let price = Decimal::try_from(price).ok()?;
            Some(PricePoint { timestamp, price })
        })
        .collect()
}

#[async_trait]
impl MarketDataProvider for CoinGeckoProvider {
    fn id(&self) -> &'static str {
        PROVIDER_ID
    }

    async fn get_listings(&self, limit: usize) -> Result<Vec<CoinListing>, MarketDataError> {
        let per_page = limit.clamp(1, MAX_PER_PAGE);
        let params = [
            ("vs_currency", VS_CURRENCY.to_string()),
            ("order", "market_cap_desc".to_string()),
            ("per_page", per_page.to_string()),
            ("page", "1".to_string()),
            ("price_change_percentage", "24h".to_string()),
        ];
        let body = self.fetch("/coins/markets", &params).await?;
        let rows: Vec<MarketRow> = http::parse_json(PROVIDER_ID, &body)?;

        let listings = listings_from_rows(rows);

        {
            let mut ids = self.lock_ids();
            for listing in &listings {
                ids.entry(listing.symbol.clone())
                    .or_insert_with(|| listing.provider_id.clone());
            }
        }

        debug!("CoinGecko returned {} listings", listings.len());
        Ok(listings)
    }

    async fn get_price_history(
        &self,
        symbol: &str,
        days: u32,
    ) -> Result<Vec<PricePoint>, MarketDataError> {
        let coin_id = self.resolve_coin_id(symbol).await?;
        let endpoint = format!("/coins/{}/market_chart", urlencoding::encode(&coin_id));
        let params = [
            ("vs_currency", VS_CURRENCY.to_string()),
            ("days", days.max(1).to_string()),
        ];
        let body = self.fetch(&endpoint, &params).await?;
        let chart: MarketChartResponse = http::parse_json(PROVIDER_ID, &body)?;

        let points = points_from_chart(chart);
        if points.is_empty() {
            // A known coin with an empty chart is not a missing symbol.
            return Err(MarketDataError::ValidationFailed {
                message: format!("No price history for {}", symbol),
            });
        }
        Ok(points)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_parse_market_rows() {
        let body = r#"[
            {
                "id": "bitcoin",
                "symbol": "btc",
                "name": "Bitcoin",
                "current_price": 64250.5,
                "market_cap": 1265000000000,
                "total_volume": 31000000000.25,
                "price_change_percentage_24h": -1.2345,
                "last_updated": "2026-03-01T12:00:00.000Z"
            },
            {
                "id": "tether",
                "symbol": "usdt",
                "name": "Tether",
                "current_price": 1.0,
                "market_cap": null,
                "total_volume": null,
                "price_change_percentage_24h": null,
                "last_updated": null
            }
        ]"#;

        let rows: Vec<MarketRow> = http::parse_json(PROVIDER_ID, body).unwrap();
        let listings: Vec<CoinListing> = rows
            .into_iter()
            .map(listing_from_row)
            .collect::<Result<_, _>>()
            .unwrap();

        assert_eq!(listings.len(), 2);
        assert_eq!(listings[0].symbol, "BTC");
        assert_eq!(listings[0].provider_id, "bitcoin");
        assert_eq!(listings[0].price, dec!(64250.5));
        assert!((listings[0].change_percent_24h + 1.2345).abs() < f64::EPSILON);
        assert!(listings[0].last_updated.is_some());

        assert_eq!(listings[1].symbol, "USDT");
        assert_eq!(listings[1].market_cap, Decimal::ZERO);
        assert_eq!(listings[1].change_percent_24h, 0.0);
    }

    #[test]
    fn test_missing_price_is_validation_error() {
        let row = MarketRow {
            id: "ghost".into(),
            symbol: "gst".into(),
            name: "Ghost".into(),
            current_price: None,
            market_cap: None,
            total_volume: None,
            price_change_percentage_24h: None,
            last_updated: None,
        };
        let err = listing_from_row(row).unwrap_err();
        assert!(err.is_validation());
    }

    #[test]
    fn test_rows_without_price_are_skipped() {
        let body = r#"[
            {
                "id": "bitcoin",
                "symbol": "btc",
                "name": "Bitcoin",
                "current_price": 64250.5,
                "market_cap": 1265000000000,
                "total_volume": 31000000000.25,
                "price_change_percentage_24h": 0.5,
                "last_updated": null
            },
            {
                "id": "fresh-listing",
                "symbol": "new",
                "name": "Fresh Listing",
                "current_price": null,
                "market_cap": null,
                "total_volume": null,
                "price_change_percentage_24h": null,
                "last_updated": null
            }
        ]"#;

        let rows: Vec<MarketRow> = http::parse_json(PROVIDER_ID, body).unwrap();
        let listings = listings_from_rows(rows);

        assert_eq!(listings.len(), 1);
        assert_eq!(listings[0].symbol, "BTC");
    }

    #[test]
    fn test_parse_market_chart() {
        let body = r#"{"prices": [[1709294400000, 61000.0], [1709298000000, 61500.5]]}"#;
        let chart: MarketChartResponse = http::parse_json(PROVIDER_ID, body).unwrap();
        let points = points_from_chart(chart);
        assert_eq!(points.len(), 2);
        assert_eq!(points[1].price, dec!(61500.5));
        assert!(points[0].timestamp < points[1].timestamp);
    }

    #[test]
    fn test_pick_search_match_prefers_rank() {
        let coins = vec![
            SearchCoin {
                id: "fake-btc".into(),
                symbol: "BTC".into(),
                market_cap_rank: Some(4000),
            },
            SearchCoin {
                id: "bitcoin".into(),
                symbol: "btc".into(),
                market_cap_rank: Some(1),
            },
            SearchCoin {
                id: "bitcoin-cash".into(),
                symbol: "bch".into(),
                market_cap_rank: Some(20),
            },
        ];
        assert_eq!(pick_search_match("BTC", coins).as_deref(), Some("bitcoin"));
        assert_eq!(pick_search_match("XYZ", Vec::new()), None);
    }

    #[test]
    fn test_blank_api_key_is_ignored() {
        let provider = CoinGeckoProvider::new(Some("   ".to_string()));
        assert!(provider.api_key.is_none());
        assert_eq!(provider.id(), "coingecko");
    }
}
