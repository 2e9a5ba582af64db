//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Check addresses and URLs parse
//! - Validate value ranges (attempts > 0, batch sizes sane)
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: RiddlePayConfig → Result<(), Vec<ValidationError>>

use std::fmt;
use std::str::FromStr;

use alloy::primitives::Address;

use crate::config::schema::RiddlePayConfig;

/// A single semantic problem with the configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// Dotted path of the offending field.
    pub field: &'static str,
    /// What is wrong with it.
    pub reason: String,
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.reason)
    }
}

/// Validate a configuration, collecting every error.
pub fn validate_config(config: &RiddlePayConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();
    let mut push = |field: &'static str, reason: String| {
        errors.push(ValidationError { field, reason });
    };

    let network = &config.network;
    for (field, value) in [
        ("network.contract_address", &network.contract_address),
        ("network.token_address", &network.token_address),
    ] {
        if !value.is_empty() {
            if let Err(e) = Address::from_str(value) {
                push(field, format!("invalid address '{}': {}", value, e));
            }
        }
    }

    for (field, value) in [
        ("network.primary_rpc_url", &network.primary_rpc_url),
        ("network.fallback_rpc_url", &network.fallback_rpc_url),
    ] {
        if let Some(url) = value.as_deref().filter(|u| !u.is_empty()) {
            if let Err(e) = url::Url::parse(url) {
                push(field, format!("invalid URL '{}': {}", url, e));
            }
        }
    }

    if network.rpc_timeout_secs == 0 {
        push("network.rpc_timeout_secs", "must be greater than zero".into());
    }
    if config.retries.max_attempts == 0 {
        push("retries.max_attempts", "must be at least 1".into());
    }
    if config.signer.wait_attempts == 0 {
        push("signer.wait_attempts", "must be at least 1".into());
    }

    let aggregation = &config.aggregation;
    if aggregation.batch_size == 0 {
        push("aggregation.batch_size", "must be greater than zero".into());
    }
    if aggregation.max_listed == 0 {
        push("aggregation.max_listed", "must be greater than zero".into());
    } else if aggregation.batch_size > aggregation.max_listed {
        push(
            "aggregation.batch_size",
            format!("exceeds max_listed ({})", aggregation.max_listed),
        );
    }
    if aggregation.record_timeout_ms == 0 || aggregation.load_timeout_ms == 0 {
        push("aggregation", "timeouts must be greater than zero".into());
    }

    if config.leaderboard.top_n == 0 {
        push("leaderboard.top_n", "must be greater than zero".into());
    }
    if config.tvl.pause_every == 0 {
        push("tvl.pause_every", "must be greater than zero".into());
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
