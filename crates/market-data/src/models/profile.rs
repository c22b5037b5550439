use serde::{Deserialize, Serialize};

/// Coin profile data from metadata providers
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CoinProfile {
    /// Uppercase ticker this profile describes
    pub symbol: String,

    /// Coin name
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Logo URL
    #[serde(skip_serializing_if = "Option::is_none")]
    pub logo_url: Option<String>,

    /// Project description
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Provider category (e.g. "coin", "token")
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,

    /// Project website URL
    #[serde(skip_serializing_if = "Option::is_none")]
    pub website_url: Option<String>,
}

impl CoinProfile {
    /// Create an empty profile for a symbol
    pub fn new(symbol: impl Into<String>) -> Self {
        Self {
            symbol: symbol.into(),
            ..Default::default()
        }
    }
}

/// Result of a batched profile lookup.
///
/// Providers silently drop symbols they do not know; those are reported in
/// `missing` so callers can remember them.
#[derive(Clone, Debug, Default)]
pub struct ProfileBatch {
    pub profiles: Vec<CoinProfile>,
    pub missing: Vec<String>,
}
