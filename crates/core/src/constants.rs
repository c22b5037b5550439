/// Provider id used for market listings and price history
pub const PROVIDER_COINGECKO: &str = "coingecko";

/// Provider id used for coin profiles and global stats
pub const PROVIDER_COINMARKETCAP: &str = "coinmarketcap";

/// Provider id used for news headlines
pub const PROVIDER_CRYPTOCOMPARE: &str = "cryptocompare";

/// Counter key for LLM completions
pub const PROVIDER_LLM: &str = "llm";

/// Default staleness interval for market snapshots, in minutes
pub const SNAPSHOT_INTERVAL_MINUTES: i64 = 55;

/// Default staleness interval for coin metadata, in hours
pub const METADATA_INTERVAL_HOURS: i64 = 12;

/// Default staleness interval for generated articles, in minutes
pub const ARTICLE_INTERVAL_MINUTES: i64 = 60;

/// Number of coins fetched per snapshot refresh
pub const DEFAULT_LISTING_LIMIT: usize = 25;

/// Number of headlines passed to the article generator
pub const DEFAULT_NEWS_LIMIT: usize = 10;

/// Length of a rate-limit window, in hours
pub const RATE_LIMIT_WINDOW_HOURS: i64 = 24;

/// Daily request limit for providers without an explicit setting
pub const DEFAULT_DAILY_LIMIT: i32 = 300;

/// Concurrent provider calls made by the history service
pub const HISTORY_CONCURRENCY: usize = 4;

/// Symbols used for metadata refresh before any snapshot exists
pub const DEFAULT_METADATA_SYMBOLS: &[&str] = &[
    "BTC", "ETH", "USDT", "BNB", "SOL", "XRP", "USDC", "ADA", "DOGE", "TRX",
];
