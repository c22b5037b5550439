//! Market module - snapshots, coin metadata, and provider price history.

mod history_service;
mod market_model;
mod market_traits;

pub use history_service::HistoryService;
pub use market_model::{HistorySource, MarketHistory, MarketMetadata, MarketSnapshot};
pub use market_traits::{MetadataRepositoryTrait, SnapshotRepositoryTrait};
