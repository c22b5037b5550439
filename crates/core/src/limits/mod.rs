//! Provider rate limits - daily counters, the tracker, and the store trait.

mod api_limits_model;
mod api_limits_traits;
mod rate_limit_tracker;

pub use api_limits_model::{ApiLimitCounter, RateLimitDecision, RateLimitStatus};
pub use api_limits_traits::ApiLimitRepositoryTrait;
pub use rate_limit_tracker::RateLimitTracker;
