//! Resilience subsystem.
//!
//! # Data Flow
//! ```text
//! Contract call:
//!     → retries.rs (classify failure, retry rate-limited calls with backoff)
//!     → blockchain::provider (primary endpoint, then fallback)
//!
//! Aggregated reads:
//!     → timeouts.rs (per-record and per-load deadlines)
//! ```
//!
//! # Design Decisions
//! - Only rate-limit-class failures are retried; everything else surfaces at once
//! - Backoff is deterministic (no jitter) and attempts never overlap
//! - Exhausted retries surface as `RateLimited`, never the raw provider error

pub mod backoff;
pub mod retries;
pub mod timeouts;

pub use retries::{retry_with_backoff, RetryPolicy};
pub use timeouts::with_timeout;
