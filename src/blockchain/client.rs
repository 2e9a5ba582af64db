//! Blockchain RPC endpoint with timeout and error handling.
//!
//! # Responsibilities
//! - Connect to a single JSON-RPC endpoint
//! - Enforce a per-request deadline on every call
//! - Convert transport failures into `BlockchainError`
//! - Assemble the primary/fallback hybrid from configuration

use std::time::Duration;

use alloy::primitives::{Address, Bytes, U256};
use alloy::providers::{DynProvider, Provider, ProviderBuilder};
use alloy::rpc::types::{Filter, Log, TransactionRequest};

use crate::blockchain::provider::{ChainReader, HybridProvider};
use crate::blockchain::types::{BlockchainError, BlockchainResult, NetworkConfig};
use crate::resilience::with_timeout;

/// One JSON-RPC endpoint.
#[derive(Clone)]
pub struct RpcEndpoint {
    /// Endpoint URL, kept for diagnostics.
    url: String,
    /// Alloy HTTP provider.
    provider: DynProvider,
    /// Request timeout duration.
    timeout: Duration,
}

impl RpcEndpoint {
    /// Connect a read-only endpoint.
    pub fn connect(url: &str, timeout: Duration) -> BlockchainResult<Self> {
        let parsed = parse_url(url)?;
        let provider = ProviderBuilder::new().connect_http(parsed).erased();
        Ok(Self::from_provider(url, provider, timeout))
    }

    /// Wrap an already-built provider (e.g. one carrying a wallet filler).
    pub fn from_provider(url: &str, provider: DynProvider, timeout: Duration) -> Self {
        Self {
            url: url.to_string(),
            provider,
            timeout,
        }
    }

    /// Endpoint URL.
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Underlying alloy provider.
    pub fn provider(&self) -> &DynProvider {
        &self.provider
    }

    /// Per-request deadline.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}

impl ChainReader for RpcEndpoint {
    async fn call(&self, tx: TransactionRequest) -> BlockchainResult<Bytes> {
        with_timeout(self.timeout, async { Ok(self.provider.call(tx).await?) }).await
    }

    async fn get_block_number(&self) -> BlockchainResult<u64> {
        with_timeout(self.timeout, async { Ok(self.provider.get_block_number().await?) }).await
    }

    async fn get_balance(&self, address: Address) -> BlockchainResult<U256> {
        with_timeout(self.timeout, async { Ok(self.provider.get_balance(address).await?) }).await
    }

    async fn get_logs(&self, filter: &Filter) -> BlockchainResult<Vec<Log>> {
        with_timeout(self.timeout, async { Ok(self.provider.get_logs(filter).await?) }).await
    }
}

impl std::fmt::Debug for RpcEndpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RpcEndpoint")
            .field("url", &self.url)
            .field("timeout", &self.timeout)
            .finish()
    }
}

/// Build the read-only hybrid provider described by the network settings.
///
/// No RPC URL at all falls back to the public default endpoint.
pub fn connect_hybrid(network: &NetworkConfig) -> BlockchainResult<HybridProvider<RpcEndpoint>> {
    let timeout = Duration::from_secs(network.rpc_timeout_secs);
    let fallback = RpcEndpoint::connect(network.effective_fallback_url(), timeout)?;

    let primary = match network.effective_primary_url() {
        Some(url) => match RpcEndpoint::connect(url, timeout) {
            Ok(endpoint) => Some(endpoint),
            Err(e) => {
                tracing::warn!(error = %e, "Ignoring invalid primary RPC URL");
                None
            }
        },
        None => None,
    };

    tracing::info!(
        fallback = %fallback.url(),
        has_primary = primary.is_some(),
        "Read-only RPC provider initialized"
    );

    Ok(HybridProvider::new(primary, fallback))
}

pub(crate) fn parse_url(url: &str) -> BlockchainResult<url::Url> {
    url.parse()
        .map_err(|e| BlockchainError::NotConfigured(format!("Invalid RPC URL '{}': {}", url, e)))
}
