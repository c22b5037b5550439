//! SQLite storage implementation for Coinpulse.
//!
//! This crate provides all database-related functionality using Diesel ORM with SQLite.
//! It implements the store traits defined in `coinpulse-core` and contains:
//! - Database connection pooling and the single-writer actor
//! - Embedded Diesel migrations
//! - Repositories for snapshots, metadata, articles and rate-limit counters
//!
//! All other crates are database-agnostic and work with traits.

pub mod api_limits;
pub mod articles;
pub mod db;
pub mod errors;
pub mod market;
pub mod schema;
pub mod utils;

pub use api_limits::ApiLimitRepository;
pub use articles::ArticleRepository;
pub use market::{MetadataRepository, SnapshotRepository};

// Re-export database utilities
pub use db::{
    create_pool, get_connection, init, open, run_migrations, spawn_writer, DbConnection, DbPool,
    WriteHandle,
};

// Re-export storage errors and conversion helpers
pub use errors::{IntoCore, StorageError};

pub use coinpulse_core::errors::{DatabaseError, Error, Result};
