//! Provider abstractions and implementations.
//!
//! This module contains:
//! - The provider traits (`MarketDataProvider`, `MetadataProvider`, `NewsProvider`)
//! - Shared HTTP plumbing that maps responses onto `MarketDataError`
//! - Concrete provider implementations (CoinGecko, CoinMarketCap, CryptoCompare)
//!
//! Providers are constructed once at startup and shared behind `Arc<dyn Trait>`.

mod http;
mod traits;

pub mod coingecko;
pub mod coinmarketcap;
pub mod cryptocompare;

pub use traits::{MarketDataProvider, MetadataProvider, NewsProvider};

/// Default per-request timeout for provider HTTP calls.
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;
