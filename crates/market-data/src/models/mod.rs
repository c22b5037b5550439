//! Market data models
//!
//! This module contains the core data types for market data operations:
//! - `listing` - Market listing rows and historical price points
//! - `profile` - Coin profile data (CoinProfile, ProfileBatch)
//! - `global` - Aggregated market-wide statistics (GlobalStats)
//! - `news` - News headlines (NewsItem)

mod global;
mod listing;
mod news;
mod profile;

pub use global::GlobalStats;
pub use listing::{CoinListing, PricePoint};
pub use news::NewsItem;
pub use profile::{CoinProfile, ProfileBatch};
