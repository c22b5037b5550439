//! Article writer error types.

use coinpulse_core::articles::GenerationError;
use thiserror::Error;

/// LLM article writer errors.
#[derive(Debug, Error)]
pub enum AiError {
    /// Invalid configuration or request.
    #[error("{0}")]
    InvalidInput(String),

    /// Missing API key for a provider.
    #[error("Missing API key for provider {0}")]
    MissingApiKey(String),

    /// Unknown provider id.
    #[error("Unsupported LLM provider: {0}")]
    UnsupportedProvider(String),

    /// Provider error (from rig-core or the API).
    #[error("Provider error: {0}")]
    Provider(String),

    /// No response within the deadline.
    #[error("LLM call timed out after {0}s")]
    Timeout(u64),

    /// Response was empty after cleanup.
    #[error("LLM returned no usable content")]
    EmptyResponse,
}

impl AiError {
    pub fn provider(msg: impl Into<String>) -> Self {
        Self::Provider(msg.into())
    }

    pub(crate) fn provider_err(e: impl std::fmt::Display) -> Self {
        Self::Provider(e.to_string())
    }

    /// Error code for logs and API bodies.
    pub fn code(&self) -> &'static str {
        match self {
            AiError::InvalidInput(_) => "INVALID_INPUT",
            AiError::MissingApiKey(_) => "MISSING_API_KEY",
            AiError::UnsupportedProvider(_) => "UNSUPPORTED_PROVIDER",
            AiError::Provider(_) => "PROVIDER_ERROR",
            AiError::Timeout(_) => "TIMEOUT",
            AiError::EmptyResponse => "EMPTY_RESPONSE",
        }
    }
}

/// Sort a provider message into transient or permanent failure.
///
/// rig surfaces upstream HTTP failures as text, so this matches on the status
/// codes and phrases the supported providers use.
fn classify_provider_message(msg: &str) -> GenerationError {
    let lower = msg.to_lowercase();
    if lower.contains("429") || lower.contains("rate limit") || lower.contains("quota") {
        GenerationError::RateLimited(msg.to_string())
    } else if lower.contains("401")
        || lower.contains("403")
        || lower.contains("invalid api key")
        || lower.contains("unauthorized")
        || lower.contains("model not found")
        || lower.contains("400")
    {
        GenerationError::Rejected(msg.to_string())
    } else {
        GenerationError::Unavailable(msg.to_string())
    }
}

impl From<AiError> for GenerationError {
    fn from(err: AiError) -> Self {
        match err {
            AiError::Timeout(secs) => GenerationError::Timeout(secs),
            AiError::EmptyResponse => GenerationError::EmptyContent,
            AiError::Provider(msg) => classify_provider_message(&msg),
            AiError::InvalidInput(_) | AiError::MissingApiKey(_) | AiError::UnsupportedProvider(_) => {
                GenerationError::NotConfigured(err.to_string())
            }
        }
    }
}
