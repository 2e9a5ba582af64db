//! Retry logic.
//!
//! # Responsibilities
//! - Decide whether a failure is retryable (rate-limit class only)
//! - Execute attempts sequentially with exponential backoff
//! - Convert exhausted retries into the distinguished `RateLimited` error

use std::future::Future;

use crate::blockchain::types::{BlockchainError, BlockchainResult};
use crate::config::RetryConfig;
use crate::observability::metrics;
use crate::resilience::backoff::backoff_delay;

/// Attempt budget and backoff base for one wrapped operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first.
    pub max_attempts: u32,
    /// Delay before the second attempt.
    pub initial_delay_ms: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_delay_ms: 1000,
        }
    }
}

impl From<&RetryConfig> for RetryPolicy {
    fn from(config: &RetryConfig) -> Self {
        Self {
            max_attempts: config.max_attempts.max(1),
            initial_delay_ms: config.initial_delay_ms,
        }
    }
}

/// Run `operation` until it succeeds, fails with a non-retryable error, or
/// runs out of attempts.
pub async fn retry_with_backoff<T, F, Fut>(
    policy: RetryPolicy,
    label: &'static str,
    mut operation: F,
) -> BlockchainResult<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = BlockchainResult<T>>,
{
    let max_attempts = policy.max_attempts.max(1);
    let mut attempt = 1;

    loop {
        match operation().await {
            Ok(value) => return Ok(value),
            Err(e) if !e.is_rate_limit() => return Err(e),
            Err(e) if attempt >= max_attempts => {
                tracing::warn!(
                    operation = label,
                    attempts = attempt,
                    error = %e,
                    "Rate limited on every attempt, giving up"
                );
                metrics::record_rate_limited();
                return Err(BlockchainError::RateLimited { attempts: attempt });
            }
            Err(e) => {
                attempt += 1;
                let delay = backoff_delay(attempt, policy.initial_delay_ms);
                tracing::debug!(
                    operation = label,
                    attempt = attempt,
                    delay_ms = delay.as_millis() as u64,
                    error = %e,
                    "Rate limited, backing off"
                );
                metrics::record_retry();
                tokio::time::sleep(delay).await;
            }
        }
    }
}
