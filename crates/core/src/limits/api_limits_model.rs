use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Daily request counter for one external provider.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiLimitCounter {
    pub api_name: String,
    pub daily_limit: i32,
    pub request_count: i32,
    pub last_reset: DateTime<Utc>,
}

impl ApiLimitCounter {
    /// True once the window that started at `last_reset` has elapsed.
    pub fn window_expired(&self, now: DateTime<Utc>, window: Duration) -> bool {
        now - self.last_reset > window
    }

    /// Requests left in the current window, never negative.
    pub fn remaining(&self) -> i32 {
        (self.daily_limit - self.request_count).max(0)
    }
}

/// Outcome of recording one provider call.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RateLimitDecision {
    pub allowed: bool,
    pub remaining: i32,
    /// The call opened a fresh window (first call ever, or first after a reset).
    pub is_new_window: bool,
}

impl RateLimitDecision {
    pub fn from_counter(counter: &ApiLimitCounter) -> Self {
        Self {
            allowed: counter.request_count <= counter.daily_limit,
            remaining: counter.remaining(),
            // Within a window the count is always >= 2 after an increment
            is_new_window: counter.request_count == 1,
        }
    }
}

/// Read-only view of a provider counter.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RateLimitStatus {
    pub api_name: String,
    pub daily_limit: i32,
    /// Requests counted in the current window (0 if the window has expired).
    pub request_count: i32,
    pub remaining: i32,
    pub window_started_at: Option<DateTime<Utc>>,
    pub window_resets_at: Option<DateTime<Utc>>,
}
