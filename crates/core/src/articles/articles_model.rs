use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use coinpulse_market_data::{GlobalStats, NewsItem};

use crate::errors::{Result, ValidationError};
use crate::market::MarketSnapshot;

/// A market summary produced by the article generator.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedArticle {
    pub id: String,
    /// Rendered HTML markup.
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl GeneratedArticle {
    /// New article with a fresh v4 id. Rejects blank content.
    pub fn new(content: impl Into<String>, now: DateTime<Utc>) -> Result<Self> {
        let content = content.into().trim().to_string();
        if content.is_empty() {
            return Err(ValidationError::InvalidInput(
                "Generated article content is empty".to_string(),
            )
            .into());
        }
        Ok(Self {
            id: Uuid::new_v4().to_string(),
            content,
            created_at: now,
            updated_at: now,
        })
    }
}

/// Everything the generator is given to write one article.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArticleContext {
    pub generated_at: DateTime<Utc>,
    /// Latest bucket, ordered by market cap descending.
    pub market: Vec<MarketSnapshot>,
    pub global: Option<GlobalStats>,
    pub headlines: Vec<NewsItem>,
}

impl ArticleContext {
    pub fn is_empty(&self) -> bool {
        self.market.is_empty() && self.global.is_none() && self.headlines.is_empty()
    }

    /// Biggest absolute 24h movers, at most `n`.
    pub fn top_movers(&self, n: usize) -> Vec<&MarketSnapshot> {
        let mut movers: Vec<&MarketSnapshot> = self.market.iter().collect();
        movers.sort_by(|a, b| {
            b.change_percent_24h
                .abs()
                .partial_cmp(&a.change_percent_24h.abs())
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        movers.truncate(n);
        movers
    }
}
