//! CoinMarketCap metadata provider implementation.
//!
//! Uses the CoinMarketCap Pro API for:
//! - Coin profiles (logo, description, category, website) via /v2/cryptocurrency/info
//! - Market-wide statistics via /v1/global-metrics/quotes/latest
//!
//! An API key is required and sent in the `X-CMC_PRO_API_KEY` header.
//! API documentation: https://coinmarketcap.com/api/documentation/v1/

use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use reqwest::Client;
use rust_decimal::Decimal;
use serde::Deserialize;
use tracing::{debug, warn};

use super::http;
use crate::errors::MarketDataError;
use crate::models::{CoinProfile, GlobalStats, ProfileBatch};
use crate::provider::MetadataProvider;

const BASE_URL: &str = "https://pro-api.coinmarketcap.com";
const PROVIDER_ID: &str = "coinmarketcap";

/// Max length kept from a provider description.
const MAX_DESCRIPTION_CHARS: usize = 2000;

// ============================================================================
// API Response Structures
// ============================================================================

#[derive(Debug, Deserialize)]
struct ApiStatus {
    #[serde(default)]
    error_code: i64,
    error_message: Option<String>,
}

/// Response from /v2/cryptocurrency/info (keyed by symbol; each symbol may
/// map to several coins sharing the ticker)
#[derive(Debug, Deserialize)]
struct InfoResponse {
    status: ApiStatus,
    #[serde(default)]
    data: HashMap<String, Vec<InfoEntry>>,
}

#[derive(Debug, Deserialize)]
struct InfoEntry {
    symbol: String,
    name: Option<String>,
    category: Option<String>,
    description: Option<String>,
    logo: Option<String>,
    #[serde(default)]
    urls: InfoUrls,
}

#[derive(Debug, Default, Deserialize)]
struct InfoUrls {
    #[serde(default)]
    website: Vec<String>,
}

/// Response from /v1/global-metrics/quotes/latest
#[derive(Debug, Deserialize)]
struct GlobalResponse {
    status: ApiStatus,
    data: Option<GlobalData>,
}

#[derive(Debug, Deserialize)]
struct GlobalData {
    btc_dominance: Option<f64>,
    eth_dominance: Option<f64>,
    quote: HashMap<String, GlobalQuote>,
}

#[derive(Debug, Deserialize)]
struct GlobalQuote {
    total_market_cap: Option<f64>,
    total_volume_24h: Option<f64>,
}

// ============================================================================
// CoinMarketCapProvider
// ============================================================================

/// CoinMarketCap metadata provider.
pub struct CoinMarketCapProvider {
    client: Client,
    api_key: String,
    base_url: String,
}

impl CoinMarketCapProvider {
    pub fn new(api_key: String) -> Self {
        Self::with_base_url(api_key, BASE_URL)
    }

    pub fn with_base_url(api_key: String, base_url: impl Into<String>) -> Self {
        Self {
            client: http::build_client(),
            api_key,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    async fn fetch(&self, endpoint: &str, params: &[(&str, String)]) -> Result<String, MarketDataError> {
        if self.api_key.trim().is_empty() {
            return Err(MarketDataError::Unauthorized {
                provider: PROVIDER_ID.to_string(),
            });
        }

        let url = format!("{}{}", self.base_url, endpoint);
        let request = self
            .client
            .get(&url)
            .query(params)
            .header("X-CMC_PRO_API_KEY", &self.api_key)
            .header("Accept", "application/json");

        debug!("CoinMarketCap request: {}", endpoint);
        http::send(PROVIDER_ID, request).await
    }
}

/// Reject payloads whose status block reports an error.
fn check_status(status: &ApiStatus) -> Result<(), MarketDataError> {
    if status.error_code == 0 {
        return Ok(());
    }
    let message = status
        .error_message
        .clone()
        .unwrap_or_else(|| format!("error code {}", status.error_code));

    // 1008/1009/1010/1011 are the plan/minute/daily/monthly rate limit codes
    match status.error_code {
        1008..=1011 => Err(MarketDataError::RateLimited {
            provider: PROVIDER_ID.to_string(),
        }),
        1001 | 1002 => Err(MarketDataError::Unauthorized {
            provider: PROVIDER_ID.to_string(),
        }),
        _ => Err(MarketDataError::ProviderError {
            provider: PROVIDER_ID.to_string(),
            message,
        }),
    }
}

fn clean_description(text: &str) -> Option<String> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return None;
    }
    if trimmed.chars().count() > MAX_DESCRIPTION_CHARS {
        Some(trimmed.chars().take(MAX_DESCRIPTION_CHARS).collect())
    } else {
        Some(trimmed.to_string())
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

/// Convert an info payload into a batch, tracking requested symbols that
/// came back empty.
fn batch_from_info(requested: &[String], response: InfoResponse) -> ProfileBatch {
    let mut profiles = Vec::with_capacity(response.data.len());
    let mut found = HashSet::new();

    for (key, entries) in response.data {
        // The first entry is the highest ranked coin for that ticker
        let Some(entry) = entries.into_iter().next() else {
            continue;
        };
        let symbol = if entry.symbol.is_empty() {
            key.to_uppercase()
        } else {
            entry.symbol.to_uppercase()
        };
        found.insert(symbol.clone());

        profiles.push(CoinProfile {
            symbol,
            name: non_empty(entry.name),
            logo_url: non_empty(entry.logo),
            description: entry.description.as_deref().and_then(clean_description),
            category: non_empty(entry.category),
            website_url: entry.urls.website.into_iter().find(|u| !u.trim().is_empty()),
        });
    }

    profiles.sort_by(|a, b| a.symbol.cmp(&b.symbol));

    let missing = requested
        .iter()
        .map(|s| s.to_uppercase())
        .filter(|s| !found.contains(s))
        .collect();

    ProfileBatch { profiles, missing }
}

fn to_decimal(value: Option<f64>) -> Decimal {
    value
        .and_then(|v| Decimal::try_from(v).ok())
        .unwrap_or(Decimal::ZERO)
}

fn stats_from_global(response: GlobalResponse) -> Result<GlobalStats, MarketDataError> {
    check_status(&response.status)?;
    let data = response.data.ok_or_else(|| MarketDataError::MalformedResponse {
        provider: PROVIDER_ID.to_string(),
        message: "Missing data block in global metrics".to_string(),
    })?;
    let usd = data
        .quote
        .get("USD")
        .ok_or_else(|| MarketDataError::MalformedResponse {
            provider: PROVIDER_ID.to_string(),
            message: "Missing USD quote in global metrics".to_string(),
        })?;

    Ok(GlobalStats {
        total_market_cap: to_decimal(usd.total_market_cap),
        total_volume_24h: to_decimal(usd.total_volume_24h),
        btc_dominance: data.btc_dominance.unwrap_or(0.0),
        eth_dominance: data.eth_dominance.unwrap_or(0.0),
    })
}

#[async_trait]
impl MetadataProvider for CoinMarketCapProvider {
    fn id(&self) -> &'static str {
        PROVIDER_ID
    }

    async fn get_profiles(&self, symbols: &[String]) -> Result<ProfileBatch, MarketDataError> {
        if symbols.is_empty() {
            return Ok(ProfileBatch::default());
        }

        let joined = symbols
            .iter()
            .map(|s| s.to_uppercase())
            .collect::<Vec<_>>()
            .join(",");
        let params = [
            ("symbol", joined),
            ("skip_invalid", "true".to_string()),
            ("aux", "urls,logo,description,category".to_string()),
        ];
        let body = self.fetch("/v2/cryptocurrency/info", &params).await?;
        let response: InfoResponse = http::parse_json(PROVIDER_ID, &body)?;
        check_status(&response.status)?;

        let batch = batch_from_info(symbols, response);
        if !batch.missing.is_empty() {
            warn!(
                "CoinMarketCap has no profile for: {}",
                batch.missing.join(", ")
            );
        }
        Ok(batch)
    }

    async fn get_global_stats(&self) -> Result<GlobalStats, MarketDataError> {
        let params = [("convert", "USD".to_string())];
        let body = self
            .fetch("/v1/global-metrics/quotes/latest", &params)
            .await?;
        let response: GlobalResponse = http::parse_json(PROVIDER_ID, &body)?;
        stats_from_global(response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ClassifyRetry;
    use rust_decimal_macros::dec;

    const INFO_BODY: &str = r#"{
        "status": {"error_code": 0, "error_message": null},
        "data": {
            "BTC": [{
                "id": 1,
                "symbol": "BTC",
                "name": "Bitcoin",
                "category": "coin",
                "description": "  Bitcoin is a decentralized currency.  ",
                "logo": "https://s2.coinmarketcap.com/static/img/coins/64x64/1.png",
                "urls": {"website": ["https://bitcoin.org/"], "twitter": []}
            }],
            "ETH": [{
                "id": 1027,
                "symbol": "ETH",
                "name": "Ethereum",
                "category": "coin",
                "description": "",
                "logo": "https://s2.coinmarketcap.com/static/img/coins/64x64/1027.png",
                "urls": {"website": []}
            }]
        }
    }"#;

    #[test]
    fn test_batch_from_info_reports_missing() {
        let response: InfoResponse = http::parse_json(PROVIDER_ID, INFO_BODY).unwrap();
        let requested = vec!["btc".to_string(), "ETH".to_string(), "NOPE".to_string()];
        let batch = batch_from_info(&requested, response);

        assert_eq!(batch.profiles.len(), 2);
        assert_eq!(batch.missing, vec!["NOPE".to_string()]);

        let btc = &batch.profiles[0];
        assert_eq!(btc.symbol, "BTC");
        assert_eq!(btc.name.as_deref(), Some("Bitcoin"));
        assert_eq!(
            btc.description.as_deref(),
            Some("Bitcoin is a decentralized currency.")
        );
        assert_eq!(btc.website_url.as_deref(), Some("https://bitcoin.org/"));

        let eth = &batch.profiles[1];
        assert_eq!(eth.description, None);
        assert_eq!(eth.website_url, None);
    }

    #[test]
    fn test_stats_from_global() {
        let body = r#"{
            "status": {"error_code": 0},
            "data": {
                "btc_dominance": 52.31,
                "eth_dominance": 16.9,
                "quote": {"USD": {"total_market_cap": 2400000000000.5, "total_volume_24h": 95000000000}}
            }
        }"#;
        let response: GlobalResponse = http::parse_json(PROVIDER_ID, body).unwrap();
        let stats = stats_from_global(response).unwrap();

        assert_eq!(stats.total_market_cap, dec!(2400000000000.5));
        assert_eq!(stats.total_volume_24h, dec!(95000000000));
        assert!((stats.btc_dominance - 52.31).abs() < 1e-9);
    }

    #[test]
    fn test_global_without_usd_quote_is_malformed() {
        let body = r#"{"status": {"error_code": 0}, "data": {"quote": {}}}"#;
        let response: GlobalResponse = http::parse_json(PROVIDER_ID, body).unwrap();
        let err = stats_from_global(response).unwrap_err();
        assert!(err.is_validation());
    }

    #[test]
    fn test_status_error_codes() {
        let limited = ApiStatus {
            error_code: 1008,
            error_message: Some("minute rate limit".into()),
        };
        let err = check_status(&limited).unwrap_err();
        assert!(matches!(err, MarketDataError::RateLimited { .. }));
        assert!(err.is_retryable());

        let bad_key = ApiStatus {
            error_code: 1001,
            error_message: None,
        };
        let err = check_status(&bad_key).unwrap_err();
        assert!(!err.is_retryable());
    }

    #[tokio::test]
    async fn test_missing_key_is_unauthorized() {
        let provider = CoinMarketCapProvider::new(String::new());
        let err = provider.get_global_stats().await.unwrap_err();
        assert!(matches!(err, MarketDataError::Unauthorized { .. }));
    }

    #[tokio::test]
    async fn test_empty_symbol_list_skips_request() {
        let provider = CoinMarketCapProvider::new(String::new());
        let batch = provider.get_profiles(&[]).await.unwrap();
        assert!(batch.profiles.is_empty());
        assert!(batch.missing.is_empty());
    }
}
