//! CryptoCompare news provider implementation.
//!
//! Latest crypto headlines from /data/v2/news/. The endpoint answers without
//! a key but a key (`authorization: Apikey ...`) lifts the anonymous limit.

use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use reqwest::Client;
use serde::Deserialize;
use tracing::debug;

use super::http;
use crate::errors::MarketDataError;
use crate::models::NewsItem;
use crate::provider::NewsProvider;

const BASE_URL: &str = "https://min-api.cryptocompare.com";
const PROVIDER_ID: &str = "cryptocompare";

/// Teaser length kept from each article body.
const MAX_DESCRIPTION_CHARS: usize = 400;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct NewsResponse {
    #[serde(rename = "Type")]
    kind: Option<i64>,
    message: Option<String>,
    #[serde(default)]
    data: Vec<NewsRow>,
}

#[derive(Debug, Deserialize)]
struct NewsRow {
    title: String,
    #[serde(default)]
    body: String,
    published_on: i64,
    url: Option<String>,
    source: Option<String>,
    source_info: Option<SourceInfo>,
}

#[derive(Debug, Deserialize)]
struct SourceInfo {
    name: Option<String>,
}

/// CryptoCompare news provider.
pub struct CryptoCompareProvider {
    client: Client,
    api_key: Option<String>,
    base_url: String,
}

impl CryptoCompareProvider {
    pub fn new(api_key: Option<String>) -> Self {
        Self::with_base_url(api_key, BASE_URL)
    }

    pub fn with_base_url(api_key: Option<String>, base_url: impl Into<String>) -> Self {
        Self {
            client: http::build_client(),
            api_key: api_key.filter(|k| !k.trim().is_empty()),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }
}

fn excerpt(body: &str) -> String {
    let collapsed = body.split_whitespace().collect::<Vec<_>>().join(" ");
    if collapsed.chars().count() <= MAX_DESCRIPTION_CHARS {
        collapsed
    } else {
        let cut: String = collapsed.chars().take(MAX_DESCRIPTION_CHARS).collect();
        format!("{}...", cut.trim_end())
    }
}

fn items_from_response(
    response: NewsResponse,
    limit: usize,
) -> Result<Vec<NewsItem>, MarketDataError> {
    // Type 100 is success; anything else carries an error message
    if let Some(kind) = response.kind {
        if kind != 100 {
            let message = response
                .message
                .unwrap_or_else(|| format!("response type {}", kind));
            if message.to_lowercase().contains("rate limit") {
                return Err(MarketDataError::RateLimited {
                    provider: PROVIDER_ID.to_string(),
                });
            }
            return Err(MarketDataError::ProviderError {
                provider: PROVIDER_ID.to_string(),
                message,
            });
        }
    }

    let mut items: Vec<NewsItem> = response
        .data
        .into_iter()
        .filter(|row| !row.title.trim().is_empty())
        .filter_map(|row| {
            let published_at = Utc.timestamp_opt(row.published_on, 0).single()?;
            let source = row
                .source_info
                .and_then(|s| s.name)
                .or(row.source)
                .unwrap_or_else(|| "Unknown".to_string());
            Some(NewsItem {
                title: row.title.trim().to_string(),
                description: excerpt(&row.body),
                published_at,
                source,
                url: row.url,
            })
        })
        .collect();

    items.sort_by(|a, b| b.published_at.cmp(&a.published_at));
    items.truncate(limit);
    Ok(items)
}

#[async_trait]
impl NewsProvider for CryptoCompareProvider {
    fn id(&self) -> &'static str {
        PROVIDER_ID
    }

    async fn get_latest_news(&self, limit: usize) -> Result<Vec<NewsItem>, MarketDataError> {
        let url = format!("{}/data/v2/news/", self.base_url);
        let mut request = self
            .client
            .get(&url)
            .query(&[("lang", "EN"), ("sortOrder", "latest")]);
        if let Some(key) = &self.api_key {
            request = request.header("authorization", format!("Apikey {}", key));
        }

        let body = http::send(PROVIDER_ID, request).await?;
        let response: NewsResponse = http::parse_json(PROVIDER_ID, &body)?;
        let items = items_from_response(response, limit)?;
        debug!("CryptoCompare returned {} headlines", items.len());
        Ok(items)
    }
}
