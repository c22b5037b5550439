//! HTTP plumbing shared by the provider implementations.

use std::time::Duration;

use reqwest::{Client, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use tracing::debug;

use super::DEFAULT_REQUEST_TIMEOUT_SECS;
use crate::errors::MarketDataError;

/// Build the reqwest client used by a provider.
pub(crate) fn build_client() -> Client {
    Client::builder()
        .timeout(Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS))
        .user_agent(concat!("coinpulse/", env!("CARGO_PKG_VERSION")))
        .build()
        .unwrap_or_else(|_| Client::new())
}

/// Send a request and return the body of a successful response.
pub(crate) async fn send(
    provider: &'static str,
    request: RequestBuilder,
) -> Result<String, MarketDataError> {
    let response = request.send().await.map_err(|e| {
        if e.is_timeout() {
            MarketDataError::Timeout {
                provider: provider.to_string(),
            }
        } else {
            MarketDataError::ProviderError {
                provider: provider.to_string(),
                message: format!("Request failed: {}", e),
            }
        }
    })?;

    let status = response.status();
    debug!("{} responded with {}", provider, status);

    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(status_error(provider, status, body));
    }

    response.text().await.map_err(|e| {
        if e.is_timeout() {
            MarketDataError::Timeout {
                provider: provider.to_string(),
            }
        } else {
            MarketDataError::ProviderError {
                provider: provider.to_string(),
                message: format!("Failed to read response: {}", e),
            }
        }
    })
}

/// Map a non-success status onto the error taxonomy.
pub(crate) fn status_error(
    provider: &'static str,
    status: StatusCode,
    body: String,
) -> MarketDataError {
    match status {
        StatusCode::TOO_MANY_REQUESTS => MarketDataError::RateLimited {
            provider: provider.to_string(),
        },
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => MarketDataError::Unauthorized {
            provider: provider.to_string(),
        },
        StatusCode::REQUEST_TIMEOUT | StatusCode::GATEWAY_TIMEOUT => MarketDataError::Timeout {
            provider: provider.to_string(),
        },
        _ => MarketDataError::Http {
            provider: provider.to_string(),
            status: status.as_u16(),
            message: truncate(&body, 256),
        },
    }
}

/// Decode a JSON body, reporting failures as malformed responses.
pub(crate) fn parse_json<T: DeserializeOwned>(
    provider: &'static str,
    body: &str,
) -> Result<T, MarketDataError> {
    serde_json::from_str(body).map_err(|e| MarketDataError::MalformedResponse {
        provider: provider.to_string(),
        message: e.to_string(),
    })
}

fn truncate(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        text.to_string()
    } else {
        let cut: String = text.chars().take(max_chars).collect();
        format!("{}...", cut)
    }
}
