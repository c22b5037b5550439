//! Cache invalidation events.
//!
//! Core services emit a [`CacheInvalidation`] after a dataset write has been
//! persisted. Runtime adapters implement [`InvalidationSink`] to forward the
//! notice to whatever caches the rendered output (the server streams it over
//! SSE).

mod cache_invalidation;
mod sink;

pub use cache_invalidation::*;
pub use sink::*;
