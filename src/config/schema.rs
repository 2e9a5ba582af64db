//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the client.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

/// Public endpoint used when neither RPC URL is configured.
pub const DEFAULT_PUBLIC_RPC_URL: &str = "https://mainnet.base.org";

/// Root configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct RiddlePayConfig {
    /// Contract, token and RPC endpoints.
    pub network: NetworkConfig,

    /// Retry-with-backoff settings for every contract call.
    pub retries: RetryConfig,

    /// Bounded polling while the signer handle is being constructed.
    pub signer: SignerConfig,

    /// Batched listing settings.
    pub aggregation: AggregationConfig,

    /// Event-log leaderboard settings.
    pub leaderboard: LeaderboardConfig,

    /// Total-value-locked manual scan settings.
    pub tvl: TvlConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Network and contract configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct NetworkConfig {
    /// Address of the deployed gift contract. Empty disables the facade.
    pub contract_address: String,

    /// Paid JSON-RPC endpoint, tried first.
    pub primary_rpc_url: Option<String>,

    /// Public JSON-RPC endpoint, tried when the primary fails.
    pub fallback_rpc_url: Option<String>,

    /// Fungible token used for non-native gifts.
    pub token_address: String,

    /// Decimals of the fungible token.
    pub token_decimals: u8,

    /// Chain ID (e.g., 8453 for Base mainnet, 31337 for local Anvil).
    pub chain_id: u64,

    /// RPC request timeout in seconds.
    pub rpc_timeout_secs: u64,

    /// Number of block confirmations required for finality.
    pub confirmation_blocks: u32,

    /// Seconds to wait for a receipt before giving up.
    pub confirmation_timeout_secs: u64,

    /// Notification API key. Carried for callers, unused by the core.
    pub notification_api_key: Option<String>,
}

impl NetworkConfig {
    /// Endpoint for the fallback side of the hybrid provider.
    pub fn effective_fallback_url(&self) -> &str {
        self.fallback_rpc_url
            .as_deref()
            .filter(|u| !u.is_empty())
            .or(self.primary_rpc_url.as_deref().filter(|u| !u.is_empty()))
            .unwrap_or(DEFAULT_PUBLIC_RPC_URL)
    }

    /// Primary endpoint, only when a distinct fallback also exists.
    pub fn effective_primary_url(&self) -> Option<&str> {
        let primary = self.primary_rpc_url.as_deref().filter(|u| !u.is_empty())?;
        (primary != self.effective_fallback_url()).then_some(primary)
    }
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            contract_address: String::new(),
            primary_rpc_url: None,
            fallback_rpc_url: None,
            token_address: String::new(),
            token_decimals: 6,
            chain_id: 8453,
            rpc_timeout_secs: 10,
            confirmation_blocks: 1,
            confirmation_timeout_secs: 120,
            notification_api_key: None,
        }
    }
}

/// Retry configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Total attempts, including the first.
    pub max_attempts: u32,

    /// Delay before the second attempt; doubles for each later one.
    pub initial_delay_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_delay_ms: 1000,
        }
    }
}

/// Signer readiness polling.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SignerConfig {
    /// Number of polls before reporting the contract as not initialized.
    pub wait_attempts: u32,

    /// Fixed sleep between polls in milliseconds.
    pub wait_interval_ms: u64,
}

impl Default for SignerConfig {
    fn default() -> Self {
        Self {
            wait_attempts: 10,
            wait_interval_ms: 300,
        }
    }
}

/// Batched per-account listing.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AggregationConfig {
    /// Maximum ids fetched per account.
    pub max_listed: usize,

    /// Ids per concurrent batch.
    pub batch_size: usize,

    /// Per-record fetch timeout in milliseconds.
    pub record_timeout_ms: u64,

    /// Deadline for a whole load cycle in milliseconds.
    pub load_timeout_ms: u64,
}

impl Default for AggregationConfig {
    fn default() -> Self {
        Self {
            max_listed: 50,
            batch_size: 20,
            record_timeout_ms: 3000,
            load_timeout_ms: 8000,
        }
    }
}

/// Leaderboard event scanning.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LeaderboardConfig {
    /// How many recent blocks the ranged log query covers.
    pub lookback_blocks: u64,

    /// Pause between the two event queries in milliseconds.
    pub throttle_ms: u64,

    /// Result cache lifetime in seconds.
    pub cache_ttl_secs: u64,

    /// Entries per category.
    pub top_n: usize,
}

impl Default for LeaderboardConfig {
    fn default() -> Self {
        Self {
            lookback_blocks: 10_000,
            throttle_ms: 500,
            cache_ttl_secs: 5,
            top_n: 10,
        }
    }
}

/// Manual total-value-locked scan.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TvlConfig {
    /// Maximum records summed.
    pub scan_cap: u64,

    /// Pause after this many records.
    pub pause_every: u64,

    /// Pause length in milliseconds.
    pub pause_ms: u64,
}

impl Default for TvlConfig {
    fn default() -> Self {
        Self {
            scan_cap: 500,
            pause_every: 10,
            pause_ms: 200,
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Emit JSON log lines instead of the human-readable format.
    pub json_logs: bool,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            json_logs: false,
        }
    }
}
