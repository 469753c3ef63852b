//! Retry delay schedule.

use std::time::Duration;

/// Delay to wait after the given failed attempt (1-based).
///
/// Doubles each time: 2s after the first failure, then 4s, 8s, and so on.
/// Saturates instead of overflowing for absurd attempt numbers.
#[must_use]
pub fn backoff_delay(attempt: u32) -> Duration {
    Duration::from_secs(2u64.saturating_pow(attempt))
}
