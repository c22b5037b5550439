//! Column codecs and batching helpers for SQLite storage.

use std::str::FromStr;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use crate::errors::StorageError;

pub use coinpulse_core::utils::time_utils::to_storage_string;

/// Rows per multi-row INSERT.
///
/// Snapshot rows bind nine parameters each, so this stays well under
/// SQLite's 32766 variable limit.
pub const SQLITE_MAX_ROWS_CHUNK: usize = 1000;

/// Chunk a slice into batches of at most `SQLITE_MAX_ROWS_CHUNK` rows.
pub fn chunk_for_sqlite<T>(items: &[T]) -> impl Iterator<Item = &[T]> {
    items.chunks(SQLITE_MAX_ROWS_CHUNK)
}

pub fn parse_timestamp(column: &str, value: &str) -> Result<DateTime<Utc>, StorageError> {
    DateTime::parse_from_rfc3339(value)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| StorageError::Decode(format!("{} '{}': {}", column, value, e)))
}

pub fn parse_decimal(column: &str, value: &str) -> Result<Decimal, StorageError> {
    Decimal::from_str(value)
        .map_err(|e| StorageError::Decode(format!("{} '{}': {}", column, value, e)))
}
