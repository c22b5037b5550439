/// Classification for retry policy.
///
/// Used by [`RetryPolicy`](crate::registry::RetryPolicy) to decide whether a
/// failed provider call may consume another attempt.
///
/// # Behavior Summary
///
/// | Class | Consumes retry budget? | Examples |
/// |-------|------------------------|----------|
/// | `Retryable` | Yes | HTTP 429, timeout, 5xx, transport failure |
/// | `Fatal` | No, surfaced immediately | malformed payload, auth failure, unknown symbol |
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum RetryClass {
    /// Transient failure. Another attempt may succeed after a delay.
    Retryable,

    /// Terminal failure. The request is fundamentally invalid and retrying
    /// won't help.
    Fatal,
}

/// Errors that know how they should be retried.
///
/// Implemented by every error type that flows through a
/// [`RetryPolicy`](crate::registry::RetryPolicy), including errors that live
/// outside this crate (LLM generation failures, for instance).
pub trait ClassifyRetry {
    /// Returns the retry classification for this error.
    fn retry_class(&self) -> RetryClass;

    /// Shorthand for `retry_class() == RetryClass::Retryable`.
    fn is_retryable(&self) -> bool {
        self.retry_class() == RetryClass::Retryable
    }
}
