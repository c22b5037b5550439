use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};

use super::api_limits_model::ApiLimitCounter;
use crate::errors::Result;

#[async_trait]
pub trait ApiLimitRepositoryTrait: Send + Sync {
    /// Atomically count one request for `api_name` and return the updated row.
    ///
    /// A missing row is created with `default_limit` and a count of 1. A row
    /// whose window (`now - last_reset > window`) has elapsed is reset to a
    /// count of 1 with `last_reset = now`. Otherwise the count is incremented.
    async fn record_request(
        &self,
        api_name: &str,
        default_limit: i32,
        now: DateTime<Utc>,
        window: Duration,
    ) -> Result<ApiLimitCounter>;

    fn get_counter(&self, api_name: &str) -> Result<Option<ApiLimitCounter>>;

    /// Set the daily limit, creating an empty counter if none exists.
    async fn set_daily_limit(
        &self,
        api_name: &str,
        daily_limit: i32,
        now: DateTime<Utc>,
    ) -> Result<ApiLimitCounter>;
}
