//! Retry backoff.
//!
//! Delays use a fixed formula with no jitter so that retry timing is
//! reproducible under test:
//!
//! ```
//! use easel_sync::next_delay;
//! use std::time::Duration;
//!
//! let base = Duration::from_millis(100);
//! let cap = Duration::from_secs(5);
//!
//! assert_eq!(next_delay(0, base, cap), Duration::from_millis(100));
//! assert_eq!(next_delay(1, base, cap), Duration::from_millis(200));
//! assert_eq!(next_delay(2, base, cap), Duration::from_millis(400));
//! ```

use crate::config::SyncConfig;
use std::time::Duration;

/// Exponential backoff: `base * 2^attempt`, capped at `cap`
pub fn next_delay(attempt: u32, base: Duration, cap: Duration) -> Duration {
    let multiplier = 1u32.checked_shl(attempt).unwrap_or(u32::MAX);
    base.checked_mul(multiplier).unwrap_or(cap).min(cap)
}

/// Retry budget plus backoff curve
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Retries after the initial attempt (0 = never retry)
    pub max_retries: u32,
    pub base: Duration,
    pub cap: Duration,
}

impl RetryPolicy {
    pub fn new(max_retries: u32, base: Duration, cap: Duration) -> Self {
        Self {
            max_retries,
            base,
            cap,
        }
    }

    pub fn from_config(config: &SyncConfig) -> Self {
        Self::new(config.max_retries, config.backoff_base(), config.backoff_max())
    }

    /// Whether another retry is allowed after `retries_used` retries
    pub fn allows_retry(&self, retries_used: u32) -> bool {
        retries_used < self.max_retries
    }

    /// Delay before retry number `retries_used + 1`
    pub fn delay(&self, retries_used: u32) -> Duration {
        next_delay(retries_used, self.base, self.cap)
    }

    /// Sum of every retry delay, for timeout budgeting
    pub fn total_delay(&self) -> Duration {
        (0..self.max_retries).map(|i| self.delay(i)).sum()
    }
}
