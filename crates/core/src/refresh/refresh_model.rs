use std::fmt;
use std::str::FromStr;

use chrono::Duration;
use serde::{Deserialize, Serialize};

use coinpulse_market_data::MarketDataError;

use crate::articles::GenerationError;
use crate::constants::{
    ARTICLE_INTERVAL_MINUTES, DEFAULT_LISTING_LIMIT, DEFAULT_NEWS_LIMIT, METADATA_INTERVAL_HOURS,
    SNAPSHOT_INTERVAL_MINUTES,
};
use crate::errors::{Error, ValidationError};

/// Datasets maintained by the refresh coordinator.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DatasetKind {
    #[serde(rename = "snapshots")]
    MarketSnapshot,
    #[serde(rename = "metadata")]
    MarketMetadata,
    #[serde(rename = "articles")]
    Article,
}

impl DatasetKind {
    pub const ALL: [DatasetKind; 3] = [
        DatasetKind::MarketSnapshot,
        DatasetKind::MarketMetadata,
        DatasetKind::Article,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            DatasetKind::MarketSnapshot => "snapshots",
            DatasetKind::MarketMetadata => "metadata",
            DatasetKind::Article => "articles",
        }
    }

    /// Presentation paths rendered from this dataset.
    pub fn invalidation_paths(&self) -> &'static [&'static str] {
        match self {
            DatasetKind::MarketSnapshot => {
                &["/", "/api/v1/market/latest", "/api/v1/market/history"]
            }
            DatasetKind::MarketMetadata => &["/", "/api/v1/market/metadata"],
            DatasetKind::Article => &["/", "/api/v1/articles/latest"],
        }
    }
}

impl fmt::Display for DatasetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DatasetKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "snapshots" | "snapshot" | "market" => Ok(DatasetKind::MarketSnapshot),
            "metadata" => Ok(DatasetKind::MarketMetadata),
            "articles" | "article" => Ok(DatasetKind::Article),
            other => Err(ValidationError::InvalidInput(format!("Unknown dataset '{}'", other)).into()),
        }
    }
}

/// Failure categories reported in a [`RefreshResult`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum RefreshErrorKind {
    ProviderError,
    RateLimitExceeded,
    ValidationError,
    PersistenceError,
}

impl RefreshErrorKind {
    pub fn classify(err: &Error) -> Self {
        match err {
            Error::Database(_) => RefreshErrorKind::PersistenceError,
            Error::RateLimitExceeded(_) => RefreshErrorKind::RateLimitExceeded,
            Error::Validation(_) | Error::NoData(_) => RefreshErrorKind::ValidationError,
            Error::MarketData(e) => match e {
                MarketDataError::RateLimited { .. } => RefreshErrorKind::RateLimitExceeded,
                MarketDataError::SymbolNotFound(_) => RefreshErrorKind::ValidationError,
                e if e.is_validation() => RefreshErrorKind::ValidationError,
                _ => RefreshErrorKind::ProviderError,
            },
            Error::Generation(e) => match e {
                GenerationError::EmptyContent => RefreshErrorKind::ValidationError,
                GenerationError::RateLimited(_) => RefreshErrorKind::RateLimitExceeded,
                _ => RefreshErrorKind::ProviderError,
            },
            Error::InvalidConfigValue(_) | Error::Unexpected(_) => RefreshErrorKind::ProviderError,
        }
    }
}

/// Structured outcome of one refresh check. Never an `Err`.
///
/// Serialized as `{updated, reason?, count?, id?, error?, message?}`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefreshResult {
    pub updated: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub count: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<RefreshErrorKind>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl RefreshResult {
    pub const UP_TO_DATE: &'static str = "up to date";

    pub fn up_to_date() -> Self {
        Self {
            updated: false,
            reason: Some(Self::UP_TO_DATE.to_string()),
            count: None,
            id: None,
            error: None,
            message: None,
        }
    }

    pub fn updated_count(count: usize) -> Self {
        Self {
            updated: true,
            reason: None,
            count: Some(count),
            id: None,
            error: None,
            message: None,
        }
    }

    pub fn updated_id(id: impl Into<String>) -> Self {
        Self {
            updated: true,
            reason: None,
            count: None,
            id: Some(id.into()),
            error: None,
            message: None,
        }
    }

    pub fn failed(kind: RefreshErrorKind, message: impl Into<String>) -> Self {
        Self {
            updated: false,
            reason: None,
            count: None,
            id: None,
            error: Some(kind),
            message: Some(message.into()),
        }
    }

    pub fn from_error(err: &Error) -> Self {
        Self::failed(RefreshErrorKind::classify(err), err.to_string())
    }

    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }
}

/// Results of a full refresh pass, keyed by dataset.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefreshSummary {
    pub snapshots: RefreshResult,
    pub metadata: RefreshResult,
    pub articles: RefreshResult,
}

impl RefreshSummary {
    pub fn get(&self, kind: DatasetKind) -> &RefreshResult {
        match kind {
            DatasetKind::MarketSnapshot => &self.snapshots,
            DatasetKind::MarketMetadata => &self.metadata,
            DatasetKind::Article => &self.articles,
        }
    }

    pub fn any_error(&self) -> bool {
        DatasetKind::ALL.iter().any(|k| self.get(*k).is_error())
    }
}

/// Staleness intervals and fetch sizes.
#[derive(Clone, Debug)]
pub struct RefreshSettings {
    pub snapshot_interval: Duration,
    pub metadata_interval: Duration,
    pub article_interval: Duration,
    pub listing_limit: usize,
    pub news_limit: usize,
}

impl RefreshSettings {
    pub fn interval_for(&self, kind: DatasetKind) -> Duration {
        match kind {
            DatasetKind::MarketSnapshot => self.snapshot_interval,
            DatasetKind::MarketMetadata => self.metadata_interval,
            DatasetKind::Article => self.article_interval,
        }
    }
}

impl Default for RefreshSettings {
    fn default() -> Self {
        Self {
            snapshot_interval: Duration::minutes(SNAPSHOT_INTERVAL_MINUTES),
            metadata_interval: Duration::hours(METADATA_INTERVAL_HOURS),
            article_interval: Duration::minutes(ARTICLE_INTERVAL_MINUTES),
            listing_limit: DEFAULT_LISTING_LIMIT,
            news_limit: DEFAULT_NEWS_LIMIT,
        }
    }
}
