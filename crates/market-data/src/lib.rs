//! Coinpulse Market Data Crate
//!
//! This crate provides provider-agnostic fetching of cryptocurrency market data
//! for the Coinpulse refresh service.
//!
//! # Overview
//!
//! The market data crate supports:
//! - Market listings and price history (CoinGecko)
//! - Coin profiles and aggregated global stats (CoinMarketCap)
//! - News headlines (CryptoCompare)
//! - Bounded, classification-aware retry of provider calls
//! - A short-lived negative-result cache for lookups known to fail
//!
//! # Architecture
//!
//! ```text
//! +------------------+     +------------------+
//! |   Core services  | --> |   RetryPolicy    |  (Retryable | Fatal)
//! +------------------+     +------------------+
//!          |                        |
//!          v                        v
//! +------------------+     +------------------+
//! |  NegativeCache   |     |    Provider      |  (CoinGecko, CoinMarketCap, ...)
//! +------------------+     +------------------+
//!                                   |
//!                                   v
//!                          +------------------+
//!                          |  Listing / News  |  (market data)
//!                          +------------------+
//! ```
//!
//! # Core Types
//!
//! - [`CoinListing`] - One row of a market listing (price, volume, market cap)
//! - [`PricePoint`] - A single historical price observation
//! - [`NewsItem`] - A news headline
//! - [`CoinProfile`] - Static coin metadata (logo, description, category)
//! - [`GlobalStats`] - Aggregated market-wide statistics

pub mod cache;
pub mod errors;
pub mod models;
pub mod provider;
pub mod registry;

// Re-export all public types from models
pub use models::{CoinListing, CoinProfile, GlobalStats, NewsItem, PricePoint, ProfileBatch};

// Re-export error types
pub use errors::{ClassifyRetry, MarketDataError, RetryClass};

// Re-export provider types
pub use provider::coingecko::CoinGeckoProvider;
pub use provider::coinmarketcap::CoinMarketCapProvider;
pub use provider::cryptocompare::CryptoCompareProvider;
pub use provider::{MarketDataProvider, MetadataProvider, NewsProvider};

// Re-export registry and cache types
pub use cache::{NegativeCache, NegativeCacheEntry};
pub use registry::RetryPolicy;
