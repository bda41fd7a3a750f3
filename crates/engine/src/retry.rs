//! Submission retry policy
//!
//! Transient venue failures are retried a bounded number of times with
//! exponential backoff, always under the original idempotency key.
//! Permanent rejections never retry.

use chrono::Duration;
use hermes_ports::VenueError;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryPolicy {
    /// Total submission attempts allowed, the first one included
    pub max_attempts: u32,
    /// Backoff before the second attempt, in milliseconds
    pub backoff_base_ms: u64,
    /// Upper bound on any single backoff, in milliseconds
    pub backoff_cap_ms: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 4,
            backoff_base_ms: 250,
            backoff_cap_ms: 5_000,
        }
    }
}

impl RetryPolicy {
    /// Whether another attempt may follow `attempts` completed ones that
    /// ended in `error`
    pub fn should_retry(&self, attempts: u32, error: &VenueError) -> bool {
        error.is_transient() && attempts < self.max_attempts
    }

    /// Backoff before attempt `attempts + 1`, doubling from the base and
    /// capped
    pub fn delay_after(&self, attempts: u32) -> Duration {
        let exp = attempts.saturating_sub(1).min(16);
        let ms = self
            .backoff_base_ms
            .saturating_mul(1u64 << exp)
            .min(self.backoff_cap_ms);
        Duration::milliseconds(ms as i64)
    }
}
