//! SQLite storage for market snapshots and coin metadata.

mod metadata_repository;
mod model;
mod snapshot_repository;

pub use metadata_repository::MetadataRepository;
pub use model::{MarketMetadataDB, MarketSnapshotDB};
pub use snapshot_repository::SnapshotRepository;
