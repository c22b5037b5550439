use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A news headline from a news provider.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewsItem {
    pub title: String,

    /// Article teaser or body excerpt
    pub description: String,

    pub published_at: DateTime<Utc>,

    /// Publisher name (e.g. "CoinDesk")
    pub source: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}
