//! Exponential backoff.

use std::time::Duration;

/// Delay before the given attempt (1-indexed).
///
/// Attempt 1 runs immediately; attempt `k > 1` waits
/// `initial_delay_ms * 2^(k-2)`.
pub fn backoff_delay(attempt: u32, initial_delay_ms: u64) -> Duration {
    if attempt <= 1 {
        return Duration::ZERO;
    }

    let factor = 2u64.saturating_pow(attempt - 2);
    Duration::from_millis(initial_delay_ms.saturating_mul(factor))
}
