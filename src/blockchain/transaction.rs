//! Signer-bound handle: broadcasting and confirmation monitoring.
//!
//! # Responsibilities
//! - Sign and broadcast transactions through a wallet-filled provider
//! - Poll for receipts until the required confirmation depth
//! - Serve reads from the same endpoint when no read-only handle exists

use std::time::Duration;

use alloy::network::ReceiptResponse;
use alloy::primitives::{Address, Bytes, TxHash, U256};
use alloy::providers::{Provider, ProviderBuilder};
use alloy::rpc::types::{Filter, Log, TransactionRequest};
use tokio::time::{interval, timeout};

use crate::blockchain::client::{parse_url, RpcEndpoint};
use crate::blockchain::provider::{ChainReader, ChainSigner};
use crate::blockchain::types::{BlockchainError, BlockchainResult, ConfirmationStatus, NetworkConfig};
use crate::blockchain::wallet::Wallet;
use crate::resilience::with_timeout;

/// Receipt polling interval.
const RECEIPT_POLL_INTERVAL: Duration = Duration::from_secs(2);

/// Chain handle that can authorize transactions.
///
/// Recreated whenever the wallet or account changes.
#[derive(Clone, Debug)]
pub struct SignerHandle {
    endpoint: RpcEndpoint,
    address: Address,
    confirmation_blocks: u32,
    confirmation_timeout: Duration,
}

impl SignerHandle {
    /// Bind a wallet to the preferred endpoint (primary if configured).
    pub fn connect(wallet: &Wallet, network: &NetworkConfig) -> BlockchainResult<Self> {
        let url = network
            .effective_primary_url()
            .unwrap_or_else(|| network.effective_fallback_url());
        let provider = ProviderBuilder::new()
            .wallet(wallet.to_ethereum_wallet())
            .connect_http(parse_url(url)?)
            .erased();

        tracing::info!(address = %wallet.address(), rpc_url = %url, "Signer handle connected");

        Ok(Self {
            endpoint: RpcEndpoint::from_provider(
                url,
                provider,
                Duration::from_secs(network.rpc_timeout_secs),
            ),
            address: wallet.address(),
            confirmation_blocks: network.confirmation_blocks,
            confirmation_timeout: Duration::from_secs(network.confirmation_timeout_secs),
        })
    }

    /// Number of confirmation blocks required.
    pub fn confirmation_blocks(&self) -> u32 {
        self.confirmation_blocks
    }
}

impl ChainReader for SignerHandle {
    async fn call(&self, tx: TransactionRequest) -> BlockchainResult<Bytes> {
        self.endpoint.call(tx).await
    }

    async fn get_block_number(&self) -> BlockchainResult<u64> {
        self.endpoint.get_block_number().await
    }

    async fn get_balance(&self, address: Address) -> BlockchainResult<U256> {
        self.endpoint.get_balance(address).await
    }

    async fn get_logs(&self, filter: &Filter) -> BlockchainResult<Vec<Log>> {
        self.endpoint.get_logs(filter).await
    }
}

impl ChainSigner for SignerHandle {
    fn address(&self) -> Address {
        self.address
    }

    async fn send_transaction(&self, tx: TransactionRequest) -> BlockchainResult<TxHash> {
        let provider = self.endpoint.provider();
        with_timeout(self.endpoint.timeout(), async {
            let pending = provider.send_transaction(tx).await?;
            Ok(*pending.tx_hash())
        })
        .await
    }

    async fn wait_for_confirmation(&self, tx_hash: TxHash) -> BlockchainResult<ConfirmationStatus> {
        let provider = self.endpoint.provider();
        let required = u64::from(self.confirmation_blocks);

        let polling = async {
            let mut ticker = interval(RECEIPT_POLL_INTERVAL);

            loop {
                ticker.tick().await;

                let receipt = match provider.get_transaction_receipt(tx_hash).await? {
                    Some(r) => r,
                    None => {
                        tracing::debug!(tx_hash = %tx_hash, "Transaction pending");
                        continue;
                    }
                };

                if !ReceiptResponse::status(&receipt) {
                    return BlockchainResult::Ok(ConfirmationStatus::Failed(
                        "Transaction reverted".to_string(),
                    ));
                }

                let current_block = provider.get_block_number().await?;
                let tx_block = ReceiptResponse::block_number(&receipt).unwrap_or(current_block);
                // The inclusion block counts as the first confirmation.
                let confirmations = current_block.saturating_sub(tx_block) + 1;

                if confirmations >= required {
                    return BlockchainResult::Ok(ConfirmationStatus::Confirmed {
                        block_number: tx_block,
                    });
                }

                tracing::debug!(
                    tx_hash = %tx_hash,
                    confirmations = confirmations,
                    required = required,
                    "Waiting for confirmations"
                );
            }
        };
        let result: Result<BlockchainResult<ConfirmationStatus>, _> =
            timeout(self.confirmation_timeout, polling).await;

        match result {
            Ok(status) => status,
            Err(_) => Err(BlockchainError::Timeout(
                self.confirmation_timeout.as_millis() as u64,
            )),
        }
    }
}
