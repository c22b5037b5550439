//! Provider call orchestration.
//!
//! This module provides the resilience layer wrapped around provider calls:
//! - Bounded retry with linear backoff
//! - Error-class aware retry decisions (only transient failures are retried)

mod retry_policy;

pub use retry_policy::RetryPolicy;
