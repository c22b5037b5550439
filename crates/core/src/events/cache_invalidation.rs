//! Cache invalidation notices.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::refresh::DatasetKind;

/// Presentation paths whose cached rendering is stale after a dataset write.
///
/// Serialized as `{"dataset": "...", "paths": [...], "emittedAt": "..."}`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheInvalidation {
    pub dataset: DatasetKind,
    pub paths: Vec<String>,
    pub emitted_at: DateTime<Utc>,
}

impl CacheInvalidation {
    /// Invalidation for every path derived from `dataset`.
    pub fn for_dataset(dataset: DatasetKind, now: DateTime<Utc>) -> Self {
        Self {
            dataset,
            paths: dataset
                .invalidation_paths()
                .iter()
                .map(|p| p.to_string())
                .collect(),
            emitted_at: now,
        }
    }

    pub fn contains_path(&self, path: &str) -> bool {
        self.paths.iter().any(|p| p == path)
    }
}
