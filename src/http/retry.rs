//! Retry policy for HTTP attempts.
//!
//! A policy only decides whether to retry and how long to wait; the actual
//! sleeping happens in the execution layer.

use super::HttpFailure;

/// Hard upper bound on total attempts for one operation, regardless of
/// configuration.
pub const MAX_TOTAL_ATTEMPTS: u32 = 10;

/// Everything a policy may consult after a failed attempt.
///
/// Ephemeral: built per failed attempt and discarded immediately.
pub struct RetryContext<'a> {
    /// Zero-based index of the retry under consideration. Equals the number
    /// of attempts already failed, minus one.
    pub attempt_index: u32,
    /// The failure just observed.
    pub failure: &'a HttpFailure,
}

/// Decides whether a failed attempt is retried and with what delay.
pub trait RetryPolicy: Send + Sync {
    /// Whether another attempt should be made.
    fn should_retry(&self, context: &RetryContext<'_>) -> bool;

    /// Backoff delay in milliseconds before the next attempt.
    fn delay_ms(&self, context: &RetryContext<'_>) -> u64;
}

/// Exponential backoff: `delay = base_delay_ms * backoff_factor^attempt_index`.
///
/// A persistently failing operation makes `max_retries + 1` attempts in total
/// (one initial plus `max_retries` retries), capped at [`MAX_TOTAL_ATTEMPTS`].
#[derive(Debug, Clone)]
pub struct ExponentialBackoff {
    /// Maximum number of retries after the initial attempt.
    pub max_retries: u32,
    /// Delay before the first retry.
    pub base_delay_ms: u64,
    /// Multiplier applied per subsequent retry.
    pub backoff_factor: u32,
}

impl Default for ExponentialBackoff {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay_ms: 1000,
            backoff_factor: 2,
        }
    }
}

impl RetryPolicy for ExponentialBackoff {
    fn should_retry(&self, context: &RetryContext<'_>) -> bool {
        // attempt_index + 1 attempts have already been made.
        if context.attempt_index + 2 > MAX_TOTAL_ATTEMPTS {
            return false;
        }
        context.attempt_index < self.max_retries
    }

    fn delay_ms(&self, context: &RetryContext<'_>) -> u64 {
        let factor = (self.backoff_factor as u64).saturating_pow(context.attempt_index);
        self.base_delay_ms.saturating_mul(factor)
    }
}
