//! Invalidation sink trait and implementations.

use std::sync::{Arc, Mutex};

use super::CacheInvalidation;

/// Receives cache invalidations after successful dataset writes.
///
/// # Design Rules
///
/// - `invalidate()` must be fast and non-blocking (no network calls, no DB writes)
/// - Failure to deliver must not affect the refresh that triggered it
pub trait InvalidationSink: Send + Sync {
    fn invalidate(&self, invalidation: CacheInvalidation);
}

/// No-op implementation for contexts without subscribers.
#[derive(Clone, Default)]
pub struct NoOpInvalidationSink;

impl InvalidationSink for NoOpInvalidationSink {
    fn invalidate(&self, _invalidation: CacheInvalidation) {}
}

/// Mock sink for testing - collects invalidations.
#[derive(Clone, Default)]
pub struct MockInvalidationSink {
    invalidations: Arc<Mutex<Vec<CacheInvalidation>>>,
}

impl MockInvalidationSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns all collected invalidations.
    pub fn invalidations(&self) -> Vec<CacheInvalidation> {
        self.invalidations.lock().unwrap().clone()
    }

    /// Every path seen so far, in emission order.
    pub fn paths(&self) -> Vec<String> {
        self.invalidations
            .lock()
            .unwrap()
            .iter()
            .flat_map(|i| i.paths.clone())
            .collect()
    }

    pub fn clear(&self) {
        self.invalidations.lock().unwrap().clear();
    }

    pub fn len(&self) -> usize {
        self.invalidations.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.invalidations.lock().unwrap().is_empty()
    }
}

impl InvalidationSink for MockInvalidationSink {
    fn invalidate(&self, invalidation: CacheInvalidation) {
        self.invalidations.lock().unwrap().push(invalidation);
    }
}
