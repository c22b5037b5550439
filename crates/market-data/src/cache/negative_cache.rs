//! Short-lived cache of lookups that are known to fail.
//!
//! When a provider reports that a key (usually a symbol) is unsupported, the
//! failure is remembered for a TTL so that repeated refreshes do not keep
//! paying for the same failing request. The cache is process-local and safe
//! to lose: a cold cache simply lets the next lookup through.
//!
//! Growth is bounded by `max_entries`. When the cap is reached, expired
//! entries are swept first and, if that is not enough, the oldest entry is
//! evicted.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, Duration, Utc};
use log::{debug, warn};

/// Default time-to-live for a cached failure.
const DEFAULT_TTL_HOURS: i64 = 24;

/// Default cap on the number of cached keys.
const DEFAULT_MAX_ENTRIES: usize = 1024;

/// A cached failure.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NegativeCacheEntry {
    pub message: String,
    pub cached_at: DateTime<Utc>,
}

/// Thread-safe negative-result cache keyed by lookup key.
pub struct NegativeCache {
    entries: Mutex<HashMap<String, NegativeCacheEntry>>,
    ttl: Duration,
    max_entries: usize,
}

impl NegativeCache {
    /// Create a cache with the default 24h TTL and size cap.
    pub fn new() -> Self {
        Self::with_config(Duration::hours(DEFAULT_TTL_HOURS), DEFAULT_MAX_ENTRIES)
    }

    /// Create a cache with a custom TTL and size cap.
    pub fn with_config(ttl: Duration, max_entries: usize) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            ttl,
            max_entries: max_entries.max(1),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Lock the entries mutex, recovering from poison if necessary.
    ///
    /// Losing cached failures only costs an extra lookup, so recovering is
    /// always preferable to panicking.
    fn lock_entries(&self) -> MutexGuard<'_, HashMap<String, NegativeCacheEntry>> {
        self.entries.lock().unwrap_or_else(|poisoned| {
            warn!("Negative cache mutex was poisoned, recovering");
            poisoned.into_inner()
        })
    }

    /// Cached failure message for `key`, if still within the TTL.
    pub fn get(&self, key: &str) -> Option<String> {
        self.get_at(key, Utc::now())
    }

    /// Same as [`get`](Self::get) with an explicit clock.
    pub fn get_at(&self, key: &str, now: DateTime<Utc>) -> Option<String> {
        let mut entries = self.lock_entries();
        match entries.get(key) {
            Some(entry) if now - entry.cached_at < self.ttl => Some(entry.message.clone()),
            Some(_) => {
                entries.remove(key);
                None
            }
            None => None,
        }
    }

    /// True if `key` has a live cached failure.
    pub fn contains(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// Remember a failure for `key`.
    pub fn set(&self, key: &str, message: impl Into<String>) {
        self.set_at(key, message, Utc::now());
    }

    /// Same as [`set`](Self::set) with an explicit clock.
    pub fn set_at(&self, key: &str, message: impl Into<String>, now: DateTime<Utc>) {
        let mut entries = self.lock_entries();

        if entries.len() >= self.max_entries && !entries.contains_key(key) {
            let ttl = self.ttl;
            entries.retain(|_, entry| now - entry.cached_at < ttl);

            if entries.len() >= self.max_entries {
                let oldest = entries
                    .iter()
                    .min_by_key(|(_, entry)| entry.cached_at)
                    .map(|(k, _)| k.clone());
                if let Some(oldest) = oldest {
                    debug!("Negative cache full, evicting '{}'", oldest);
                    entries.remove(&oldest);
                }
            }
        }

        entries.insert(
            key.to_string(),
            NegativeCacheEntry {
                message: message.into(),
                cached_at: now,
            },
        );
    }

    /// Forget a key.
    pub fn remove(&self, key: &str) {
        self.lock_entries().remove(key);
    }

    /// Drop every expired entry. Returns the number removed.
    pub fn sweep_expired(&self) -> usize {
        self.sweep_expired_at(Utc::now())
    }

    pub fn sweep_expired_at(&self, now: DateTime<Utc>) -> usize {
        let mut entries = self.lock_entries();
        let before = entries.len();
        let ttl = self.ttl;
        entries.retain(|_, entry| now - entry.cached_at < ttl);
        before - entries.len()
    }

    pub fn len(&self) -> usize {
        self.lock_entries().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock_entries().is_empty()
    }

    pub fn clear(&self) {
        self.lock_entries().clear();
    }
}

impl Default for NegativeCache {
    fn default() -> Self {
        Self::new()
    }
}
