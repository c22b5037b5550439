use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use chrono::{DateTime, Duration, Utc};
use log::{debug, warn};

use super::api_limits_model::{RateLimitDecision, RateLimitStatus};
use super::api_limits_traits::ApiLimitRepositoryTrait;
use crate::constants::{DEFAULT_DAILY_LIMIT, RATE_LIMIT_WINDOW_HOURS};
use crate::errors::{Error, Result};

/// Per-provider daily request budget backed by persistent counters.
///
/// The counter update is a single atomic store operation, so concurrent
/// callers never lose increments.
pub struct RateLimitTracker {
    repository: Arc<dyn ApiLimitRepositoryTrait>,
    limits: RwLock<HashMap<String, i32>>,
    default_limit: i32,
    window: Duration,
}

impl RateLimitTracker {
    pub fn new(repository: Arc<dyn ApiLimitRepositoryTrait>) -> Self {
        Self {
            repository,
            limits: RwLock::new(HashMap::new()),
            default_limit: DEFAULT_DAILY_LIMIT,
            window: Duration::hours(RATE_LIMIT_WINDOW_HOURS),
        }
    }

    pub fn with_default_limit(mut self, default_limit: i32) -> Self {
        self.default_limit = default_limit;
        self
    }

    /// Limit applied to counters created for `provider`.
    pub fn limit_for(&self, provider: &str) -> i32 {
        let limits = self.limits.read().unwrap_or_else(|poisoned| {
            warn!("Rate limit table lock was poisoned, recovering");
            poisoned.into_inner()
        });
        limits.get(provider).copied().unwrap_or(self.default_limit)
    }

    /// Count one call to `provider` and report whether it is within budget.
    pub async fn record_and_check(&self, provider: &str) -> Result<RateLimitDecision> {
        self.record_and_check_at(provider, Utc::now()).await
    }

    pub async fn record_and_check_at(
        &self,
        provider: &str,
        now: DateTime<Utc>,
    ) -> Result<RateLimitDecision> {
        let counter = self
            .repository
            .record_request(provider, self.limit_for(provider), now, self.window)
            .await?;
        let decision = RateLimitDecision::from_counter(&counter);

        if decision.is_new_window {
            debug!("Opened new rate-limit window for {}", provider);
        }
        if !decision.allowed {
            warn!(
                "Daily limit reached for {} ({} of {})",
                provider, counter.request_count, counter.daily_limit
            );
        }
        Ok(decision)
    }

    /// Like [`record_and_check`](Self::record_and_check), but turns a refusal
    /// into [`Error::RateLimitExceeded`].
    pub async fn acquire(&self, provider: &str) -> Result<RateLimitDecision> {
        let decision = self.record_and_check(provider).await?;
        if decision.allowed {
            Ok(decision)
        } else {
            Err(Error::RateLimitExceeded(provider.to_string()))
        }
    }

    /// Current counter state without counting a request.
    pub fn status(&self, provider: &str) -> Result<RateLimitStatus> {
        self.status_at(provider, Utc::now())
    }

    pub fn status_at(&self, provider: &str, now: DateTime<Utc>) -> Result<RateLimitStatus> {
        let status = match self.repository.get_counter(provider)? {
            Some(counter) if !counter.window_expired(now, self.window) => RateLimitStatus {
                api_name: counter.api_name.clone(),
                daily_limit: counter.daily_limit,
                request_count: counter.request_count,
                remaining: counter.remaining(),
                window_started_at: Some(counter.last_reset),
                window_resets_at: Some(counter.last_reset + self.window),
            },
            Some(counter) => RateLimitStatus {
                api_name: counter.api_name,
                daily_limit: counter.daily_limit,
                request_count: 0,
                remaining: counter.daily_limit.max(0),
                window_started_at: None,
                window_resets_at: None,
            },
            None => {
                let limit = self.limit_for(provider);
                RateLimitStatus {
                    api_name: provider.to_string(),
                    daily_limit: limit,
                    request_count: 0,
                    remaining: limit.max(0),
                    window_started_at: None,
                    window_resets_at: None,
                }
            }
        };
        Ok(status)
    }

    /// Set the daily limit for a provider, both for new and existing counters.
    pub async fn configure_limit(&self, provider: &str, daily_limit: i32) -> Result<()> {
        if daily_limit < 0 {
            return Err(Error::InvalidConfigValue(format!(
                "Daily limit for {} must be non-negative, got {}",
                provider, daily_limit
            )));
        }
        {
            let mut limits = self.limits.write().unwrap_or_else(|poisoned| {
                warn!("Rate limit table lock was poisoned, recovering");
                poisoned.into_inner()
            });
            limits.insert(provider.to_string(), daily_limit);
        }
        self.repository
            .set_daily_limit(provider, daily_limit, Utc::now())
            .await?;
        debug!("Configured daily limit for {}: {}", provider, daily_limit);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::limits::ApiLimitCounter;
    use async_trait::async_trait;
    use chrono::TimeZone;
    use std::sync::Mutex;

    #[derive(Clone, Default)]
    struct MockApiLimitRepository {
        counters: Arc<Mutex<HashMap<String, ApiLimitCounter>>>,
    }

    impl MockApiLimitRepository {
        fn with_counter(counter: ApiLimitCounter) -> Self {
            let repo = Self::default();
            repo.counters
                .lock()
                .unwrap()
                .insert(counter.api_name.clone(), counter);
            repo
        }
    }

    #[async_trait]
    impl ApiLimitRepositoryTrait for MockApiLimitRepository {
        async fn record_request(
            &self,
            api_name: &str,
            default_limit: i32,
            now: DateTime<Utc>,
            window: Duration,
        ) -> Result<ApiLimitCounter> {
            let mut counters = self.counters.lock().unwrap();
            let counter = counters
                .entry(api_name.to_string())
                .and_modify(|c| {
                    if c.window_expired(now, window) {
                        c.request_count = 1;
                        c.last_reset = now;
                    } else {
                        c.request_count += 1;
                    }
                })
                .or_insert_with(|| ApiLimitCounter {
                    api_name: api_name.to_string(),
                    daily_limit: default_limit,
                    request_count: 1,
                    last_reset: now,
                });
            Ok(counter.clone())
        }

        fn get_counter(&self, api_name: &str) -> Result<Option<ApiLimitCounter>> {
            Ok(self.counters.lock().unwrap().get(api_name).cloned())
        }

        async fn set_daily_limit(
            &self,
            api_name: &str,
            daily_limit: i32,
            now: DateTime<Utc>,
        ) -> Result<ApiLimitCounter> {
            let mut counters = self.counters.lock().unwrap();
            let counter = counters
                .entry(api_name.to_string())
                .or_insert_with(|| ApiLimitCounter {
                    api_name: api_name.to_string(),
                    daily_limit,
                    request_count: 0,
                    last_reset: now,
                });
            counter.daily_limit = daily_limit;
            Ok(counter.clone())
        }
    }

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap()
    }

    #[tokio::test]
    async fn test_call_over_limit_is_refused_then_resets() {
        let repo = Arc::new(MockApiLimitRepository::default());
        let tracker = RateLimitTracker::new(repo).with_default_limit(3);

        for i in 0..3 {
            let d = tracker
                .record_and_check_at("coingecko", t0() + Duration::minutes(i))
                .await
                .unwrap();
            assert!(d.allowed);
            assert_eq!(d.is_new_window, i == 0);
        }

        let fourth = tracker
            .record_and_check_at("coingecko", t0() + Duration::minutes(10))
            .await
            .unwrap();
        assert!(!fourth.allowed);
        assert_eq!(fourth.remaining, 0);

        let next_day = tracker
            .record_and_check_at("coingecko", t0() + Duration::hours(24) + Duration::seconds(1))
            .await
            .unwrap();
        assert!(next_day.allowed);
        assert!(next_day.is_new_window);
        assert_eq!(next_day.remaining, 2);
    }

    #[tokio::test]
    async fn test_exhausted_counter_refuses() {
        let now = t0();
        let repo = Arc::new(MockApiLimitRepository::with_counter(ApiLimitCounter {
            api_name: "coingecko".to_string(),
            daily_limit: 30,
            request_count: 30,
            last_reset: now - Duration::hours(1),
        }));
        let tracker = RateLimitTracker::new(repo);

        let decision = tracker.record_and_check_at("coingecko", now).await.unwrap();
        assert!(!decision.allowed);
        assert_eq!(decision.remaining, 0);
        assert!(!decision.is_new_window);
    }

    #[tokio::test]
    async fn test_status_does_not_count() {
        let repo = Arc::new(MockApiLimitRepository::default());
        let tracker = RateLimitTracker::new(repo.clone()).with_default_limit(10);

        tracker.record_and_check_at("llm", t0()).await.unwrap();
        let status = tracker.status_at("llm", t0() + Duration::minutes(5)).unwrap();
        assert_eq!(status.request_count, 1);
        assert_eq!(status.remaining, 9);
        assert_eq!(status.window_resets_at, Some(t0() + Duration::hours(24)));

        let status = tracker.status_at("llm", t0() + Duration::minutes(6)).unwrap();
        assert_eq!(status.request_count, 1);

        let expired = tracker.status_at("llm", t0() + Duration::hours(25)).unwrap();
        assert_eq!(expired.request_count, 0);
        assert_eq!(expired.remaining, 10);

        let unknown = tracker.status_at("cryptocompare", t0()).unwrap();
        assert_eq!(unknown.daily_limit, 10);
        assert_eq!(unknown.window_started_at, None);
    }

    #[tokio::test]
    async fn test_configure_limit_applies_to_new_and_existing() {
        let repo = Arc::new(MockApiLimitRepository::default());
        let tracker = RateLimitTracker::new(repo.clone());

        tracker.configure_limit("coinmarketcap", 2).await.unwrap();
        assert_eq!(tracker.limit_for("coinmarketcap"), 2);
        assert_eq!(tracker.limit_for("coingecko"), DEFAULT_DAILY_LIMIT);

        assert!(tracker.acquire("coinmarketcap").await.is_ok());
        assert!(tracker.acquire("coinmarketcap").await.is_ok());
        let err = tracker.acquire("coinmarketcap").await.unwrap_err();
        assert!(matches!(err, Error::RateLimitExceeded(ref p) if p == "coinmarketcap"));

        assert!(tracker.configure_limit("coinmarketcap", -1).await.is_err());
    }
}
