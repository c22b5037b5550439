//! In-memory caches owned by lookup services.

mod negative_cache;

pub use negative_cache::{NegativeCache, NegativeCacheEntry};
