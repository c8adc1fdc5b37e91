use std::time::Duration;

use rand::Rng;

/// Calculate exponential backoff delay with jitter.
///
/// Formula: `min(base_ms * 2^(attempt-1) + jitter, max_ms)` (0-25% jitter)
pub fn calculate_backoff(attempt: u8, base_ms: u64, max_ms: u64) -> Duration {
    if attempt == 0 {
        return Duration::ZERO;
    }

    let exp_factor = 2u64.saturating_pow((attempt - 1) as u32);
    let delay_ms = base_ms.saturating_mul(exp_factor);

    let jitter = if delay_ms > 0 {
        rand::rng().random_range(0..=delay_ms / 4)
    } else {
        0
    };

    let total_delay = delay_ms.saturating_add(jitter).min(max_ms);
    Duration::from_millis(total_delay)
}

/// Bounded retry policy for a single external call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Retries after the first attempt.
    pub max_retries: u8,
    pub base_delay_ms: u64,
    pub max_delay_ms: u64,
}

impl RetryPolicy {
    /// One retry with a short pause, used for transport round-trips.
    pub const fn once(base_delay_ms: u64) -> Self {
        Self {
            max_retries: 1,
            base_delay_ms,
            max_delay_ms: base_delay_ms * 4,
        }
    }

    pub fn total_attempts(&self) -> u8 {
        self.max_retries.saturating_add(1)
    }

    /// Delay before retry number `attempt` (1-based).
    pub fn delay(&self, attempt: u8) -> Duration {
        calculate_backoff(attempt, self.base_delay_ms, self.max_delay_ms)
    }
}

/// Tracks consecutive failures of a long-running loop and yields the pause
/// before the next iteration.
#[derive(Debug, Clone)]
pub struct FailureBackoff {
    consecutive: u8,
    base_ms: u64,
    max_ms: u64,
}

impl FailureBackoff {
    pub fn new(base_ms: u64, max_ms: u64) -> Self {
        Self {
            consecutive: 0,
            base_ms,
            max_ms,
        }
    }

    /// Record a failure and return how long to wait before trying again.
    pub fn record_failure(&mut self) -> Duration {
        self.consecutive = self.consecutive.saturating_add(1);
        calculate_backoff(self.consecutive, self.base_ms, self.max_ms)
    }

    pub fn reset(&mut self) {
        self.consecutive = 0;
    }

    pub fn consecutive_failures(&self) -> u8 {
        self.consecutive
    }
}
