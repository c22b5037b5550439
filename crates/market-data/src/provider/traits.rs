//! Provider trait definitions.
//!
//! Each external data source implements one of these traits. The core crate
//! only ever talks to providers through them, so tests can substitute fakes.

use async_trait::async_trait;

use crate::errors::MarketDataError;
use crate::models::{CoinListing, GlobalStats, NewsItem, PricePoint, ProfileBatch};

/// Trait for market listing providers.
///
/// # Example
///
/// ```ignore
/// use async_trait::async_trait;
/// use coinpulse_market_data::provider::MarketDataProvider;
///
/// struct MyProvider;
///
/// #[async_trait]
/// impl MarketDataProvider for MyProvider {
///     fn id(&self) -> &'static str {
///         "my_provider"
///     }
///
///     // ... implement listing and history methods
/// }
/// ```
#[async_trait]
pub trait MarketDataProvider: Send + Sync {
    /// Unique identifier for this provider.
    ///
    /// Used for logging and as the rate-limit counter key
    /// (e.g. "coingecko").
    fn id(&self) -> &'static str;

    /// Fetch the top `limit` coins ordered by market cap, descending.
    async fn get_listings(&self, limit: usize) -> Result<Vec<CoinListing>, MarketDataError>;

    /// Fetch price history for a symbol over the last `days` days.
    ///
    /// Points are ordered by timestamp ascending. Unknown symbols return
    /// [`MarketDataError::SymbolNotFound`]; a known symbol without points
    /// returns [`MarketDataError::ValidationFailed`].
    async fn get_price_history(
        &self,
        symbol: &str,
        days: u32,
    ) -> Result<Vec<PricePoint>, MarketDataError>;
}

/// Trait for coin metadata providers.
#[async_trait]
pub trait MetadataProvider: Send + Sync {
    fn id(&self) -> &'static str;

    /// Fetch profiles for the given symbols in one request.
    ///
    /// Symbols the provider does not recognise are reported in
    /// [`ProfileBatch::missing`] instead of failing the whole batch.
    async fn get_profiles(&self, symbols: &[String]) -> Result<ProfileBatch, MarketDataError>;

    /// Fetch aggregated market-wide statistics.
    async fn get_global_stats(&self) -> Result<GlobalStats, MarketDataError>;
}

/// Trait for news providers.
#[async_trait]
pub trait NewsProvider: Send + Sync {
    fn id(&self) -> &'static str;

    /// Fetch the most recent `limit` headlines, newest first.
    async fn get_latest_news(&self, limit: usize) -> Result<Vec<NewsItem>, MarketDataError>;
}
