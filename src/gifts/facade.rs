//! Contract read/write facade.
//!
//! # Responsibilities
//! - Validate inputs before anything reaches the network
//! - Prefer the read-only handle for queries; fall back to the signer handle
//! - Wrap every contract call in retry-with-backoff
//! - Normalize contract structs into [`GiftRecord`]
//!
//! # Handle lifecycle
//! The read-only handle is fixed at construction. The signer handle is
//! swapped in and out as wallets connect, disconnect or change account;
//! writes poll briefly for it before failing with `NotInitialized`.

use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use alloy::primitives::{Address, Bytes, TxHash, U256};
use alloy::rpc::types::{Filter, Log, TransactionRequest};
use alloy::sol_types::SolCall;
use arc_swap::ArcSwapOption;

use crate::blockchain::contract::{eth_call, write_request, IRiddlePay};
use crate::blockchain::provider::{ChainReader, ChainSigner};
use crate::blockchain::types::{BlockchainError, BlockchainResult, ConfirmationStatus};
use crate::config::RiddlePayConfig;
use crate::gifts::types::{parse_amount, to_u64, AssetKind, GiftRecord, LockedTotals, NATIVE_DECIMALS};
use crate::observability::metrics;
use crate::resilience::{retry_with_backoff, RetryPolicy};

/// Most receivers accepted by one bulk call.
pub const MAX_BULK_RECIPIENTS: usize = 100;

/// Tunables the facade needs beyond the contract address.
#[derive(Debug, Clone)]
pub struct ClientSettings {
    /// Fungible token for non-native gifts.
    pub token: Option<Address>,
    pub token_decimals: u8,
    pub retry: RetryPolicy,
    pub signer_wait_attempts: u32,
    pub signer_wait_interval: Duration,
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            token: None,
            token_decimals: 6,
            retry: RetryPolicy::default(),
            signer_wait_attempts: 10,
            signer_wait_interval: Duration::from_millis(300),
        }
    }
}

impl ClientSettings {
    /// Derive settings from validated configuration.
    pub fn from_config(config: &RiddlePayConfig) -> BlockchainResult<Self> {
        let token = match config.network.token_address.trim() {
            "" => None,
            raw => Some(parse_address("token address", raw)?),
        };
        Ok(Self {
            token,
            token_decimals: config.network.token_decimals,
            retry: RetryPolicy::from(&config.retries),
            signer_wait_attempts: config.signer.wait_attempts,
            signer_wait_interval: Duration::from_millis(config.signer.wait_interval_ms),
        })
    }
}

/// Parameters for a single gift.
#[derive(Debug, Clone, Default)]
pub struct GiftRequest {
    pub receiver: String,
    /// Empty for a direct transfer.
    pub riddle: String,
    pub answer: String,
    pub message: String,
    /// Human-readable decimal amount.
    pub amount: String,
    pub asset: AssetKind,
    pub unlock_time: u64,
    pub expiration_time: u64,
}

/// Parameters for a bulk gift.
#[derive(Debug, Clone, Default)]
pub struct BulkGiftRequest {
    pub receivers: Vec<String>,
    pub amounts: Vec<String>,
    pub asset: AssetKind,
    pub message: String,
    pub unlock_time: u64,
    pub expiration_time: u64,
}

/// A gift request that passed client-side validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreparedGift {
    pub receiver: Address,
    pub riddle: String,
    pub answer: String,
    pub amount: U256,
}

/// A bulk request that passed client-side validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreparedBulk {
    pub receivers: Vec<Address>,
    pub amounts: Vec<U256>,
    pub total: U256,
}

/// Validate a single gift request.
pub fn prepare_gift(request: &GiftRequest, decimals: u8) -> BlockchainResult<PreparedGift> {
    let receiver = parse_address("receiver", &request.receiver)?;
    let riddle = request.riddle.trim().to_string();
    let answer = request.answer.trim().to_string();
    if !riddle.is_empty() && answer.is_empty() {
        return Err(BlockchainError::InvalidInput(
            "a riddle needs an answer".to_string(),
        ));
    }
    let amount = parse_amount(&request.amount, decimals)?;
    Ok(PreparedGift {
        receiver,
        riddle,
        answer,
        amount,
    })
}

/// Validate a bulk gift request.
pub fn prepare_bulk(request: &BulkGiftRequest, decimals: u8) -> BlockchainResult<PreparedBulk> {
    if request.receivers.len() != request.amounts.len() {
        return Err(BlockchainError::InvalidInput(format!(
            "{} receivers but {} amounts",
            request.receivers.len(),
            request.amounts.len()
        )));
    }
    if request.receivers.is_empty() {
        return Err(BlockchainError::InvalidInput(
            "at least one receiver is required".to_string(),
        ));
    }
    if request.receivers.len() > MAX_BULK_RECIPIENTS {
        return Err(BlockchainError::InvalidInput(format!(
            "at most {} receivers per bulk gift, got {}",
            MAX_BULK_RECIPIENTS,
            request.receivers.len()
        )));
    }

    let receivers = request
        .receivers
        .iter()
        .map(|r| parse_address("receiver", r))
        .collect::<BlockchainResult<Vec<_>>>()?;
    let amounts = request
        .amounts
        .iter()
        .map(|a| parse_amount(a, decimals))
        .collect::<BlockchainResult<Vec<_>>>()?;
    let total = amounts
        .iter()
        .try_fold(U256::ZERO, |acc, a| acc.checked_add(*a))
        .ok_or_else(|| BlockchainError::InvalidInput("total amount overflows".to_string()))?;

    Ok(PreparedBulk {
        receivers,
        amounts,
        total,
    })
}

pub(crate) fn parse_address(what: &str, raw: &str) -> BlockchainResult<Address> {
    Address::from_str(raw.trim())
        .map_err(|e| BlockchainError::InvalidInput(format!("invalid {} '{}': {}", what, raw, e)))
}

/// Whichever handle currently serves reads.
enum ReadHandle<'a, R, S> {
    ReadOnly(&'a R),
    Signer(Arc<S>),
}

impl<R: ChainReader, S: ChainReader> ChainReader for ReadHandle<'_, R, S> {
    async fn call(&self, tx: TransactionRequest) -> BlockchainResult<Bytes> {
        match self {
            Self::ReadOnly(r) => r.call(tx).await,
            Self::Signer(s) => s.call(tx).await,
        }
    }

    async fn get_block_number(&self) -> BlockchainResult<u64> {
        match self {
            Self::ReadOnly(r) => r.get_block_number().await,
            Self::Signer(s) => s.get_block_number().await,
        }
    }

    async fn get_balance(&self, address: Address) -> BlockchainResult<U256> {
        match self {
            Self::ReadOnly(r) => r.get_balance(address).await,
            Self::Signer(s) => s.get_balance(address).await,
        }
    }

    async fn get_logs(&self, filter: &Filter) -> BlockchainResult<Vec<Log>> {
        match self {
            Self::ReadOnly(r) => r.get_logs(filter).await,
            Self::Signer(s) => s.get_logs(filter).await,
        }
    }
}

/// Typed client for the gift contract.
pub struct RiddlePayClient<R, S> {
    contract: Address,
    reader: Option<R>,
    signer: ArcSwapOption<S>,
    settings: ClientSettings,
}

impl<R: ChainReader, S: ChainSigner> RiddlePayClient<R, S> {
    /// Create a client. `reader` is the read-only handle, if one exists.
    pub fn new(contract: Address, reader: Option<R>, settings: ClientSettings) -> Self {
        Self {
            contract,
            reader,
            signer: ArcSwapOption::empty(),
            settings,
        }
    }

    /// Create a client from configuration.
    ///
    /// An empty contract address disables the facade entirely.
    pub fn from_config(config: &RiddlePayConfig, reader: Option<R>) -> BlockchainResult<Self> {
        let raw = config.network.contract_address.trim();
        if raw.is_empty() {
            return Err(BlockchainError::NotConfigured(
                "contract address is not set".to_string(),
            ));
        }
        let contract = parse_address("contract address", raw)
            .map_err(|e| BlockchainError::NotConfigured(e.to_string()))?;
        Ok(Self::new(contract, reader, ClientSettings::from_config(config)?))
    }

    /// Address of the gift contract.
    pub fn contract(&self) -> Address {
        self.contract
    }

    pub fn settings(&self) -> &ClientSettings {
        &self.settings
    }

    /// Install (or replace) the signer handle.
    pub fn connect_signer(&self, signer: S) {
        tracing::info!(address = %signer.address(), "Signer connected");
        self.signer.store(Some(Arc::new(signer)));
    }

    /// Drop the signer handle, e.g. when the wallet disconnects.
    pub fn disconnect_signer(&self) {
        if self.signer.swap(None).is_some() {
            tracing::info!("Signer disconnected");
        }
    }

    /// Account of the current signer, if any.
    pub fn signer_address(&self) -> Option<Address> {
        self.signer.load_full().map(|s| s.address())
    }

    /// Decimals used to parse amounts of the given asset.
    pub fn decimals(&self, asset: AssetKind) -> u8 {
        match asset {
            AssetKind::Native => NATIVE_DECIMALS,
            AssetKind::Token => self.settings.token_decimals,
        }
    }

    fn read_handle(&self) -> BlockchainResult<ReadHandle<'_, R, S>> {
        if let Some(reader) = &self.reader {
            return Ok(ReadHandle::ReadOnly(reader));
        }
        self.signer
            .load_full()
            .map(ReadHandle::Signer)
            .ok_or_else(|| {
                BlockchainError::NotInitialized("no read-only or signer handle available".into())
            })
    }

    /// Call a view function with retries.
    pub(crate) async fn read_at<C: SolCall>(
        &self,
        label: &'static str,
        to: Address,
        call: C,
    ) -> BlockchainResult<C::Return> {
        let call = &call;
        retry_with_backoff(self.settings.retry, label, || async move {
            let handle = self.read_handle()?;
            eth_call(&handle, to, call).await
        })
        .await
    }

    /// Fetch one gift.
    pub async fn get_record(&self, id: u64) -> BlockchainResult<GiftRecord> {
        let gift = self
            .read_at("getGift", self.contract, IRiddlePay::getGiftCall { giftId: U256::from(id) })
            .await?;
        Ok(GiftRecord::from_contract(id, gift))
    }

    /// Number of gifts ever created.
    pub async fn get_record_count(&self) -> BlockchainResult<u64> {
        let count = self
            .read_at("giftCount", self.contract, IRiddlePay::giftCountCall {})
            .await?;
        Ok(to_u64(count))
    }

    /// Ids of gifts sent or received by `account`.
    pub async fn get_record_ids_for_account(&self, account: Address) -> BlockchainResult<Vec<u64>> {
        let ids = self
            .read_at("getUserGifts", self.contract, IRiddlePay::getUserGiftsCall { user: account })
            .await?;
        Ok(ids.into_iter().map(to_u64).collect())
    }

    /// Whether the contract considers a gift expired.
    pub async fn is_expired(&self, id: u64) -> BlockchainResult<bool> {
        self.read_at("isExpired", self.contract, IRiddlePay::isExpiredCall { giftId: U256::from(id) })
            .await
    }

    /// Unclaimed totals as reported by the contract.
    pub async fn get_total_locked(&self) -> BlockchainResult<LockedTotals> {
        let totals = self
            .read_at("getTotalValueLocked", self.contract, IRiddlePay::getTotalValueLockedCall {})
            .await?;
        Ok(LockedTotals {
            native: totals.totalNative,
            token: totals.totalToken,
        })
    }

    /// Latest block number.
    pub async fn get_block_number(&self) -> BlockchainResult<u64> {
        retry_with_backoff(self.settings.retry, "eth_blockNumber", || async move {
            self.read_handle()?.get_block_number().await
        })
        .await
    }

    /// Logs matching `filter`.
    pub async fn get_logs(&self, filter: &Filter) -> BlockchainResult<Vec<Log>> {
        retry_with_backoff(self.settings.retry, "eth_getLogs", || async move {
            self.read_handle()?.get_logs(filter).await
        })
        .await
    }

    /// Wait briefly for a signer, since handle construction races startup.
    pub(crate) async fn ready_signer(&self) -> BlockchainResult<Arc<S>> {
        let attempts = self.settings.signer_wait_attempts.max(1);
        for attempt in 1..=attempts {
            if let Some(signer) = self.signer.load_full() {
                return Ok(signer);
            }
            if attempt < attempts {
                tracing::debug!(attempt, "Signer not ready, waiting");
                tokio::time::sleep(self.settings.signer_wait_interval).await;
            }
        }
        Err(BlockchainError::NotInitialized(
            "wallet signer not connected".to_string(),
        ))
    }

    /// Broadcast a call and wait for it to be mined.
    pub(crate) async fn submit<C: SolCall>(
        &self,
        signer: &S,
        kind: &'static str,
        to: Address,
        call: C,
        value: U256,
    ) -> BlockchainResult<TxHash> {
        let tx = write_request(signer.address(), to, &call, value);
        let tx = &tx;
        let retry = self.settings.retry;

        let hash = retry_with_backoff(retry, kind, || signer.send_transaction(tx.clone())).await?;
        metrics::record_transaction(kind);
        tracing::info!(kind, tx_hash = %hash, "Transaction submitted");

        match retry_with_backoff(retry, kind, || signer.wait_for_confirmation(hash)).await? {
            ConfirmationStatus::Confirmed { block_number } => {
                tracing::info!(kind, tx_hash = %hash, block_number, "Transaction confirmed");
                Ok(hash)
            }
            ConfirmationStatus::Failed(reason) => {
                tracing::warn!(kind, tx_hash = %hash, reason = %reason, "Transaction failed");
                Err(BlockchainError::Reverted(format!("{} ({})", reason, hash)))
            }
        }
    }

    /// On-chain address of an asset; the zero address for native.
    pub fn asset_address(&self, asset: AssetKind) -> BlockchainResult<Address> {
        match asset {
            AssetKind::Native => Ok(Address::ZERO),
            AssetKind::Token => self.settings.token.ok_or_else(|| {
                BlockchainError::NotConfigured("token address is not set".to_string())
            }),
        }
    }

    /// Create one gift. Returns the hash of the create transaction.
    ///
    /// Token gifts first make sure the contract may spend the amount.
    pub async fn create_transfer(&self, request: &GiftRequest) -> BlockchainResult<TxHash> {
        let prepared = prepare_gift(request, self.decimals(request.asset))?;
        let asset = self.asset_address(request.asset)?;

        let signer = self.ready_signer().await?;
        let value = match request.asset {
            AssetKind::Native => prepared.amount,
            AssetKind::Token => {
                self.ensure_allowance(&signer, asset, prepared.amount).await?;
                U256::ZERO
            }
        };
        let call = IRiddlePay::createGiftCall {
            receiver: prepared.receiver,
            riddle: prepared.riddle,
            answer: prepared.answer,
            message: request.message.clone(),
            amount: prepared.amount,
            token: asset,
            unlockTime: U256::from(request.unlock_time),
            expirationTime: U256::from(request.expiration_time),
        };
        self.submit(&signer, "create_gift", self.contract, call, value).await
    }

    /// Create one gift per receiver in a single transaction.
    pub async fn create_bulk_transfers(&self, request: &BulkGiftRequest) -> BlockchainResult<TxHash> {
        let prepared = prepare_bulk(request, self.decimals(request.asset))?;
        let asset = self.asset_address(request.asset)?;

        let signer = self.ready_signer().await?;
        let value = match request.asset {
            AssetKind::Native => prepared.total,
            AssetKind::Token => {
                self.ensure_allowance(&signer, asset, prepared.total).await?;
                U256::ZERO
            }
        };
        let call = IRiddlePay::bulkCreateGiftsCall {
            receivers: prepared.receivers,
            amounts: prepared.amounts,
            token: asset,
            message: request.message.clone(),
            unlockTime: U256::from(request.unlock_time),
            expirationTime: U256::from(request.expiration_time),
        };
        self.submit(&signer, "bulk_create_gifts", self.contract, call, value)
            .await
    }

    /// Claim a gift. `guess` is ignored by the contract for riddle-less gifts.
    pub async fn claim(&self, id: u64, guess: &str) -> BlockchainResult<TxHash> {
        let signer = self.ready_signer().await?;
        let call = IRiddlePay::claimGiftCall {
            giftId: U256::from(id),
            answer: guess.trim().to_string(),
        };
        self.submit(&signer, "claim_gift", self.contract, call, U256::ZERO)
            .await
    }

    /// Return an expired, unclaimed gift to its sender.
    pub async fn refund(&self, id: u64) -> BlockchainResult<TxHash> {
        let signer = self.ready_signer().await?;
        let call = IRiddlePay::refundGiftCall {
            giftId: U256::from(id),
        };
        self.submit(&signer, "refund_gift", self.contract, call, U256::ZERO)
            .await
    }
}
