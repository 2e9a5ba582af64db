//! Read/write seams over a JSON-RPC node and the primary/fallback hybrid.
//!
//! # Responsibilities
//! - Define the small set of chain methods the client actually uses
//! - Route every read to the primary endpoint, then once to the fallback
//! - Keep the failure path statically typed so it can be exercised in tests

use std::future::Future;

use alloy::primitives::{Address, Bytes, TxHash, U256};
use alloy::rpc::types::{Filter, Log, TransactionRequest};

use crate::blockchain::types::{BlockchainResult, ConfirmationStatus};
use crate::observability::metrics;

/// Read-only access to a chain.
pub trait ChainReader: Send + Sync {
    /// Execute `eth_call` against the latest block.
    fn call(&self, tx: TransactionRequest) -> impl Future<Output = BlockchainResult<Bytes>> + Send;

    /// Latest block number.
    fn get_block_number(&self) -> impl Future<Output = BlockchainResult<u64>> + Send;

    /// Native balance of an account.
    fn get_balance(&self, address: Address) -> impl Future<Output = BlockchainResult<U256>> + Send;

    /// Logs matching a filter.
    fn get_logs(&self, filter: &Filter) -> impl Future<Output = BlockchainResult<Vec<Log>>> + Send;
}

/// A chain handle backed by a wallet that can authorize transactions.
pub trait ChainSigner: ChainReader {
    /// Account that signs submitted transactions.
    fn address(&self) -> Address;

    /// Sign and broadcast a transaction, returning its hash.
    fn send_transaction(
        &self,
        tx: TransactionRequest,
    ) -> impl Future<Output = BlockchainResult<TxHash>> + Send;

    /// Wait until a broadcast transaction is mined.
    fn wait_for_confirmation(
        &self,
        tx_hash: TxHash,
    ) -> impl Future<Output = BlockchainResult<ConfirmationStatus>> + Send;
}

/// Provider that tries a primary endpoint first and retries each failed
/// call once on a fallback.
///
/// Without a primary every call goes straight to the fallback. When both
/// fail, the fallback's error is returned unchanged.
#[derive(Debug, Clone)]
pub struct HybridProvider<P> {
    primary: Option<P>,
    fallback: P,
}

impl<P: ChainReader> HybridProvider<P> {
    /// Create a hybrid provider.
    pub fn new(primary: Option<P>, fallback: P) -> Self {
        Self { primary, fallback }
    }

    /// Whether a primary endpoint is configured.
    pub fn has_primary(&self) -> bool {
        self.primary.is_some()
    }

    async fn route<'a, T, F, Fut>(&'a self, method: &'static str, f: F) -> BlockchainResult<T>
    where
        F: Fn(&'a P) -> Fut,
        Fut: Future<Output = BlockchainResult<T>>,
    {
        if let Some(primary) = &self.primary {
            match f(primary).await {
                Ok(value) => return Ok(value),
                Err(e) => {
                    tracing::warn!(method, error = %e, "Primary RPC failed, using fallback");
                    metrics::record_rpc_fallback(method);
                }
            }
        }
        f(&self.fallback).await
    }
}

impl<P: ChainReader> ChainReader for HybridProvider<P> {
    async fn call(&self, tx: TransactionRequest) -> BlockchainResult<Bytes> {
        self.route("eth_call", |p| p.call(tx.clone())).await
    }

    async fn get_block_number(&self) -> BlockchainResult<u64> {
        self.route("eth_blockNumber", |p| p.get_block_number()).await
    }

    async fn get_balance(&self, address: Address) -> BlockchainResult<U256> {
        self.route("eth_getBalance", |p| p.get_balance(address)).await
    }

    async fn get_logs(&self, filter: &Filter) -> BlockchainResult<Vec<Log>> {
        self.route("eth_getLogs", |p| p.get_logs(filter)).await
    }
}
