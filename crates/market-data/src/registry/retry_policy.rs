//! Bounded linear-backoff retry for provider calls.
//!
//! A call is attempted up to `max_attempts` times. After the `n`th failed
//! attempt (1-based) the policy sleeps `n * base_delay` before trying again.
//! Only errors classified as [`RetryClass::Retryable`] consume retry budget;
//! fatal errors are returned straight away.

use std::fmt::Display;
use std::future::Future;
use std::time::Duration;

use log::{debug, warn};

use crate::errors::{ClassifyRetry, RetryClass};

/// Default number of attempts (first call included).
const DEFAULT_MAX_ATTEMPTS: u32 = 3;

/// Default delay unit between attempts.
const DEFAULT_BASE_DELAY: Duration = Duration::from_secs(5);

/// Retry configuration for a single provider call.
#[derive(Clone, Debug)]
pub struct RetryPolicy {
    max_attempts: u32,
    base_delay: Duration,
}

impl RetryPolicy {
    /// Create a policy. `max_attempts` is clamped to at least one attempt.
    pub fn new(max_attempts: u32, base_delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            base_delay,
        }
    }

    /// A policy that never retries.
    pub fn no_retry() -> Self {
        Self::new(1, Duration::ZERO)
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Delay applied after the given failed attempt (1-based).
    pub fn delay_for(&self, attempt: u32) -> Duration {
        self.base_delay * attempt
    }

    /// Run `call` until it succeeds, fails fatally, or exhausts the budget.
    ///
    /// The last error is returned once the budget is exhausted.
    pub async fn run<T, E, F, Fut>(&self, operation: &str, mut call: F) -> Result<T, E>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: ClassifyRetry + Display,
    {
        let mut attempt = 1;
        loop {
            match call().await {
                Ok(value) => {
                    if attempt > 1 {
                        debug!("{} succeeded on attempt {}", operation, attempt);
                    }
                    return Ok(value);
                }
                Err(err) => {
                    if err.retry_class() == RetryClass::Fatal {
                        warn!("{} failed with non-retryable error: {}", operation, err);
                        return Err(err);
                    }

                    if attempt >= self.max_attempts {
                        warn!(
                            "{} failed after {} attempts: {}",
                            operation, attempt, err
                        );
                        return Err(err);
                    }

                    let delay = self.delay_for(attempt);
                    warn!(
                        "{} attempt {}/{} failed: {}. Retrying in {:?}",
                        operation, attempt, self.max_attempts, err, delay
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
            }
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_ATTEMPTS, DEFAULT_BASE_DELAY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::MarketDataError;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;
    use tokio::time::Instant;

    fn rate_limited() -> MarketDataError {
        MarketDataError::RateLimited {
            provider: "coingecko".to_string(),
        }
    }

    #[test]
    fn test_linear_delay() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.delay_for(1), Duration::from_secs(5));
        assert_eq!(policy.delay_for(2), Duration::from_secs(10));
        assert_eq!(policy.max_attempts(), 3);
    }

    #[test]
    fn test_zero_attempts_clamped() {
        let policy = RetryPolicy::new(0, Duration::from_millis(1));
        assert_eq!(policy.max_attempts(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_succeeds_on_third_attempt_after_two_delays() {
        let policy = RetryPolicy::default();
        let calls = Arc::new(AtomicU32::new(0));
        let start = Instant::now();

        let result: Result<u32, MarketDataError> = policy
            .run("listings", || {
                let calls = calls.clone();
                async move {
                    let n = calls.fetch_add(1, Ordering::SeqCst) + 1;
                    if n < 3 {
                        Err(rate_limited())
                    } else {
                        Ok(n)
                    }
                }
            })
            .await;

        assert_eq!(result.unwrap(), 3);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        // 5s after attempt 1, 10s after attempt 2
        assert_eq!(start.elapsed(), Duration::from_secs(15));
    }

    #[tokio::test(start_paused = true)]
    async fn test_exhausted_budget_returns_last_error() {
        let policy = RetryPolicy::default();
        let calls = Arc::new(AtomicU32::new(0));

        let result: Result<(), MarketDataError> = policy
            .run("listings", || {
                let calls = calls.clone();
                async move {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Err(MarketDataError::Timeout {
                        provider: "coingecko".to_string(),
                    })
                }
            })
            .await;

        assert!(matches!(result, Err(MarketDataError::Timeout { .. })));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_fatal_error_does_not_consume_budget() {
        let policy = RetryPolicy::default();
        let calls = Arc::new(AtomicU32::new(0));
        let start = Instant::now();

        let result: Result<(), MarketDataError> = policy
            .run("profiles", || {
                let calls = calls.clone();
                async move {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Err(MarketDataError::Unauthorized {
                        provider: "coinmarketcap".to_string(),
                    })
                }
            })
            .await;

        assert!(matches!(result, Err(MarketDataError::Unauthorized { .. })));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(start.elapsed(), Duration::ZERO);
    }
}
