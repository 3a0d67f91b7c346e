//! Fixed-delay retry policy for the proximity provider.
//!
//! RepeaterBook rate-limits aggressively, so an HTTP 429 earns a long
//! penalty wait while ordinary request/parse failures retry quickly. Both
//! draw from the same attempt budget.

use std::time::Duration;

use crate::error::ProximityError;

pub const DEFAULT_MAX_RETRIES: u32 = 2;
pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_secs(1);
pub const DEFAULT_RATE_LIMIT_DELAY: Duration = Duration::from_secs(60);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Retries allowed after the first attempt.
    pub max_retries: u32,
    pub retry_delay: Duration,
    pub rate_limit_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: DEFAULT_MAX_RETRIES,
            retry_delay: DEFAULT_RETRY_DELAY,
            rate_limit_delay: DEFAULT_RATE_LIMIT_DELAY,
        }
    }
}

impl RetryPolicy {
    /// Policy with no waiting between attempts.
    pub fn immediate(max_retries: u32) -> Self {
        Self {
            max_retries,
            retry_delay: Duration::ZERO,
            rate_limit_delay: Duration::ZERO,
        }
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_retries.saturating_add(1)
    }

    /// Wait before the next attempt, or `None` once the budget is spent.
    ///
    /// `attempt` is zero-based: the first call passes 0.
    pub fn delay_after(&self, attempt: u32, err: &ProximityError) -> Option<Duration> {
        if attempt >= self.max_retries {
            return None;
        }
        if err.is_rate_limited() {
            Some(self.rate_limit_delay)
        } else {
            Some(self.retry_delay)
        }
    }
}
