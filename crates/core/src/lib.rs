//! Coinpulse Core - Domain entities, services, and traits.
//!
//! This crate contains the refresh logic for Coinpulse: the staleness-gated
//! coordinator, rate-limit tracking, and the read-side dashboard queries.
//! It is database-agnostic and defines traits that are implemented
//! by the `storage-sqlite` crate.

pub mod articles;
pub mod constants;
pub mod dashboard;
pub mod errors;
pub mod events;
pub mod limits;
pub mod market;
pub mod refresh;
pub mod utils;

// Re-export error types
pub use errors::Error;
pub use errors::Result;
