//! Metrics collection.
//!
//! # Metrics
//! - `riddlepay_rpc_fallback_total` (counter): primary endpoint failures answered by the fallback
//! - `riddlepay_rpc_retry_total` (counter): backoff retries performed
//! - `riddlepay_rate_limited_total` (counter): operations that exhausted their retries
//! - `riddlepay_records_dropped_total` (counter): records dropped from a listing pass
//! - `riddlepay_leaderboard_cache_hits_total` (counter)
//! - `riddlepay_transactions_total` (counter): submitted transactions by kind

use metrics::counter;

/// Record a call that moved from the primary to the fallback endpoint.
pub fn record_rpc_fallback(method: &'static str) {
    counter!("riddlepay_rpc_fallback_total", "method" => method).increment(1);
}

/// Record one backoff retry.
pub fn record_retry() {
    counter!("riddlepay_rpc_retry_total").increment(1);
}

/// Record an operation that stayed throttled through every attempt.
pub fn record_rate_limited() {
    counter!("riddlepay_rate_limited_total").increment(1);
}

/// Record records dropped from a listing pass.
pub fn record_dropped(count: usize) {
    counter!("riddlepay_records_dropped_total").increment(count as u64);
}

/// Record a leaderboard cache hit.
pub fn record_cache_hit() {
    counter!("riddlepay_leaderboard_cache_hits_total").increment(1);
}

/// Record a submitted transaction.
pub fn record_transaction(kind: &'static str) {
    counter!("riddlepay_transactions_total", "kind" => kind).increment(1);
}
