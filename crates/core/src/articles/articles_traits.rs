use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;

use coinpulse_market_data::{ClassifyRetry, RetryClass};

use super::articles_model::{ArticleContext, GeneratedArticle};
use crate::errors::Result;

#[async_trait]
pub trait ArticleRepositoryTrait: Send + Sync {
    async fn insert_article(&self, article: GeneratedArticle) -> Result<GeneratedArticle>;

    fn latest_article_created_at(&self) -> Result<Option<DateTime<Utc>>>;

    fn latest_article(&self) -> Result<Option<GeneratedArticle>>;

    /// Latest article created within `[bucket, bucket + 1h)`.
    fn article_for_bucket(&self, bucket: DateTime<Utc>) -> Result<Option<GeneratedArticle>>;
}

/// Errors raised by an article generator.
#[derive(Error, Debug)]
pub enum GenerationError {
    #[error("Generation timed out after {0}s")]
    Timeout(u64),

    #[error("Generation rate limited by {0}")]
    RateLimited(String),

    /// Transient upstream failure (5xx, connection reset).
    #[error("Generation service unavailable: {0}")]
    Unavailable(String),

    /// The upstream rejected the request (bad key, bad model, bad prompt).
    #[error("Generation request rejected: {0}")]
    Rejected(String),

    #[error("Generator returned empty content")]
    EmptyContent,

    #[error("Generator not configured: {0}")]
    NotConfigured(String),
}

impl ClassifyRetry for GenerationError {
    fn retry_class(&self) -> RetryClass {
        match self {
            GenerationError::Timeout(_)
            | GenerationError::RateLimited(_)
            | GenerationError::Unavailable(_) => RetryClass::Retryable,
            GenerationError::Rejected(_)
            | GenerationError::EmptyContent
            | GenerationError::NotConfigured(_) => RetryClass::Fatal,
        }
    }
}

/// Writes a market summary from an [`ArticleContext`].
///
/// Implementations return rendered HTML.
#[async_trait]
pub trait ArticleGenerator: Send + Sync {
    /// Counter key used for rate limiting (e.g. "llm").
    fn id(&self) -> &'static str;

    async fn generate(&self, context: &ArticleContext) -> std::result::Result<String, GenerationError>;
}
