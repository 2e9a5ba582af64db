//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! riddlepay.toml (optional)
//!     → loader.rs (parse & deserialize)
//!     → RIDDLEPAY_* environment overrides
//!     → validation.rs (semantic checks)
//!     → RiddlePayConfig (validated, immutable)
//!     → shared via Arc through AppContext
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, ConfigError};
pub use schema::{
    AggregationConfig, LeaderboardConfig, NetworkConfig, ObservabilityConfig, RetryConfig,
    RiddlePayConfig, SignerConfig, TvlConfig,
};
