//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! All subsystems produce:
//!     → logging.rs (structured log events via `tracing`)
//!     → metrics.rs (counters via the `metrics` facade)
//!
//! Consumers:
//!     → stderr (human-readable or JSON lines)
//!     → any installed `metrics` recorder
//! ```
//!
//! # Design Decisions
//! - Structured fields (`gift_id`, `endpoint`, `error`) over formatted strings
//! - Metrics are cheap; without a recorder they are no-ops

pub mod logging;
pub mod metrics;
