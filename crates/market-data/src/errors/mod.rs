//! Error types and retry classification for the market data crate.
//!
//! This module provides:
//! - [`MarketDataError`]: The main error enum for all market data operations
//! - [`RetryClass`]: Classification for determining retry behavior
//! - [`ClassifyRetry`]: The trait consulted by the retry policy

mod retry;

pub use retry::{ClassifyRetry, RetryClass};

use thiserror::Error;

/// Errors that can occur during market data operations.
///
/// Each variant is classified into a [`RetryClass`] via
/// [`ClassifyRetry::retry_class`], which determines whether the retry policy
/// should spend another attempt on it.
#[derive(Error, Debug)]
pub enum MarketDataError {
    /// The requested symbol was not found by the provider.
    /// This is a terminal error - retrying won't help.
    #[error("Symbol not found: {0}")]
    SymbolNotFound(String),

    /// The provider rate limited the request (HTTP 429).
    #[error("Rate limited: {provider}")]
    RateLimited {
        /// The provider that rate limited the request
        provider: String,
    },

    /// The request to the provider timed out.
    #[error("Timeout: {provider}")]
    Timeout {
        /// The provider that timed out
        provider: String,
    },

    /// The provider rejected our credentials (HTTP 401/403).
    #[error("Unauthorized: {provider}")]
    Unauthorized {
        /// The provider that rejected the request
        provider: String,
    },

    /// The provider answered with a non-success HTTP status.
    #[error("HTTP {status} from {provider}: {message}")]
    Http {
        /// The provider that returned the status
        provider: String,
        /// The HTTP status code
        status: u16,
        /// Response body or provider error message
        message: String,
    },

    /// A provider-specific error occurred (transport failure, error envelope).
    #[error("Provider error: {provider} - {message}")]
    ProviderError {
        /// The provider that returned the error
        provider: String,
        /// The error message from the provider
        message: String,
    },

    /// The provider returned a payload we could not decode.
    #[error("Malformed response from {provider}: {message}")]
    MalformedResponse {
        /// The provider that returned the payload
        provider: String,
        /// Description of the decoding failure
        message: String,
    },

    /// Data validation failed.
    /// The provider returned data that failed validation checks.
    #[error("Validation failed: {message}")]
    ValidationFailed {
        /// Description of the validation failure
        message: String,
    },

    /// A network error occurred while communicating with a provider.
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),
}

impl MarketDataError {
    /// True when the provider answered but the payload itself was unusable.
    ///
    /// Callers surface these as validation failures rather than upstream
    /// outages.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            Self::MalformedResponse { .. } | Self::ValidationFailed { .. }
        )
    }

    /// Provider name carried by the error, if any.
    pub fn provider(&self) -> Option<&str> {
        match self {
            Self::RateLimited { provider }
            | Self::Timeout { provider }
            | Self::Unauthorized { provider }
            | Self::Http { provider, .. }
            | Self::ProviderError { provider, .. }
            | Self::MalformedResponse { provider, .. } => Some(provider),
            Self::SymbolNotFound(_) | Self::ValidationFailed { .. } | Self::Network(_) => None,
        }
    }
}

impl ClassifyRetry for MarketDataError {
    /// Returns the retry classification for this error.
    ///
    /// # Examples
    ///
    /// ```
    /// use coinpulse_market_data::errors::{ClassifyRetry, MarketDataError, RetryClass};
    ///
    /// let error = MarketDataError::RateLimited { provider: "coingecko".to_string() };
    /// assert_eq!(error.retry_class(), RetryClass::Retryable);
    ///
    /// let error = MarketDataError::SymbolNotFound("INVALID".to_string());
    /// assert_eq!(error.retry_class(), RetryClass::Fatal);
    /// ```
    fn retry_class(&self) -> RetryClass {
        match self {
            // Transient errors - retry with backoff
            Self::RateLimited { .. }
            | Self::Timeout { .. }
            | Self::ProviderError { .. }
            | Self::Network(_) => RetryClass::Retryable,

            Self::Http { status, .. } if *status >= 500 => RetryClass::Retryable,

            // Terminal errors - never retry
            Self::Http { .. }
            | Self::SymbolNotFound(_)
            | Self::Unauthorized { .. }
            | Self::MalformedResponse { .. }
            | Self::ValidationFailed { .. } => RetryClass::Fatal,
        }
    }
}
