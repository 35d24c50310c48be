//! Reconnection backoff policy.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default delay before the first automatic retry.
pub const DEFAULT_BASE_DELAY: Duration = Duration::from_millis(1000);

/// Default number of automatic retries before giving up.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 5;

/// Exponential backoff without jitter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackoffPolicy {
    /// Delay before the first retry.
    pub base_delay: Duration,
    /// Maximum number of automatic retries.
    pub max_attempts: u32,
}

impl Default for BackoffPolicy {
    fn default() -> Self {
        Self {
            base_delay: DEFAULT_BASE_DELAY,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
        }
    }
}

impl BackoffPolicy {
    /// Create a new backoff policy.
    pub fn new(base_delay: Duration, max_attempts: u32) -> Self {
        Self {
            base_delay,
            max_attempts,
        }
    }

    /// Delay for the retry made after `attempts` previous retries.
    pub fn delay_for_attempt(&self, attempts: u32) -> Duration {
        2u32.checked_pow(attempts)
            .and_then(|factor| self.base_delay.checked_mul(factor))
            .unwrap_or(Duration::MAX)
    }

    /// Delay for the next retry, or `None` once the attempt cap is reached.
    pub fn next_delay(&self, attempts: u32) -> Option<Duration> {
        if attempts >= self.max_attempts {
            return None;
        }
        Some(self.delay_for_attempt(attempts))
    }
}
