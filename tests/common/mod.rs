//! Shared utilities for integration tests: an in-memory gift contract.

#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use alloy::primitives::{keccak256, Address, Bytes, TxHash, B256, U256};
use alloy::rpc::types::{Filter, Log, TransactionRequest};
use alloy::sol_types::{SolCall, SolEvent};

use riddlepay::blockchain::contract::{IRiddlePay, IERC20};
use riddlepay::blockchain::{
    BlockchainError, BlockchainResult, ChainReader, ChainSigner, ConfirmationStatus,
};
use riddlepay::gifts::{ClientSettings, RiddlePayClient};
use riddlepay::resilience::RetryPolicy;

pub const CONTRACT: Address = Address::new([0xc0; 20]);
pub const TOKEN: Address = Address::new([0x70; 20]);
pub const SENDER: Address = Address::new([0x11; 20]);
pub const RECEIVER: Address = Address::new([0x22; 20]);

/// A transaction the mock accepted.
#[derive(Debug, Clone)]
pub struct SentTx {
    pub name: &'static str,
    pub to: Address,
    pub value: U256,
    pub input: Bytes,
}

#[derive(Default)]
struct MockState {
    gifts: Vec<IRiddlePay::Gift>,
    user_gifts: HashMap<Address, Vec<u64>>,
    allowance: U256,
    approvals_take_effect: bool,
    totals: (U256, U256),
    failing_ids: HashSet<u64>,
    stalled_ids: HashSet<u64>,
    stall_user_gifts: bool,
    rate_limited_calls: u32,
    rate_limited_logs: u32,
    down: bool,
    revert_writes: bool,
    reject_ranged_logs: bool,
    block_number: u64,
    logs: Vec<Log>,
    log_queries: Vec<Option<u64>>,
    calls: Vec<&'static str>,
    sent: Vec<SentTx>,
}

/// In-memory chain implementing both the read and signer seams.
///
/// Clones share state; `as_signer` gives a clone bound to another account.
#[derive(Clone)]
pub struct MockChain {
    address: Address,
    state: Arc<Mutex<MockState>>,
}

pub fn gift(sender: Address, receiver: Address, amount: u64, created_at: u64) -> IRiddlePay::Gift {
    IRiddlePay::Gift {
        sender,
        receiver,
        riddle: String::new(),
        answerHash: B256::ZERO,
        message: String::new(),
        amount: U256::from(amount),
        token: Address::ZERO,
        createdAt: U256::from(created_at),
        unlockTime: U256::ZERO,
        expirationTime: U256::ZERO,
        claimed: false,
    }
}

/// Wrap an event as a log emitted by the mock contract.
pub fn event_log<E: SolEvent>(event: &E) -> Log {
    Log {
        inner: alloy::primitives::Log {
            address: CONTRACT,
            data: event.encode_log_data(),
        },
        ..Log::default()
    }
}

pub fn created_event(id: u64, sender: Address, receiver: Address) -> Log {
    event_log(&IRiddlePay::GiftCreated {
        giftId: U256::from(id),
        sender,
        receiver,
        amount: U256::from(1),
        token: Address::ZERO,
        unlockTime: U256::ZERO,
        riddle: String::new(),
    })
}

pub fn claimed_event(id: u64, receiver: Address) -> Log {
    event_log(&IRiddlePay::GiftClaimed {
        giftId: U256::from(id),
        receiver,
        amount: U256::from(1),
        token: Address::ZERO,
    })
}

/// Settings with the default retry policy and a short signer wait.
pub fn test_settings() -> ClientSettings {
    ClientSettings {
        token: Some(TOKEN),
        token_decimals: 6,
        retry: RetryPolicy::default(),
        signer_wait_attempts: 3,
        signer_wait_interval: Duration::from_millis(100),
    }
}

/// Client with `chain` as read-only handle and no signer.
pub fn read_only_client(chain: &MockChain) -> RiddlePayClient<MockChain, MockChain> {
    RiddlePayClient::new(CONTRACT, Some(chain.clone()), test_settings())
}

/// Client with `chain` as read-only handle and a signer for `SENDER`.
pub fn signing_client(chain: &MockChain) -> RiddlePayClient<MockChain, MockChain> {
    let client = read_only_client(chain);
    client.connect_signer(chain.as_signer(SENDER));
    client
}

fn rpc_error(message: &str) -> BlockchainError {
    BlockchainError::Rpc {
        code: Some(-32000),
        message: message.to_string(),
    }
}

impl MockChain {
    pub fn new() -> Self {
        let state = MockState {
            approvals_take_effect: true,
            block_number: 20_000,
            ..MockState::default()
        };
        Self {
            address: Address::ZERO,
            state: Arc::new(Mutex::new(state)),
        }
    }

    pub fn as_signer(&self, address: Address) -> Self {
        Self {
            address,
            state: self.state.clone(),
        }
    }

    fn with_state<T>(&self, f: impl FnOnce(&mut MockState) -> T) -> T {
        f(&mut self.state.lock().unwrap())
    }

    /// Store a gift and index it for both parties. Returns its id.
    pub fn push_gift(&self, gift: IRiddlePay::Gift) -> u64 {
        self.with_state(|s| {
            let id = s.gifts.len() as u64;
            s.user_gifts.entry(gift.sender).or_default().push(id);
            if gift.receiver != gift.sender {
                s.user_gifts.entry(gift.receiver).or_default().push(id);
            }
            s.gifts.push(gift);
            id
        })
    }

    pub fn set_allowance(&self, amount: U256) {
        self.with_state(|s| s.allowance = amount);
    }

    pub fn allowance(&self) -> U256 {
        self.with_state(|s| s.allowance)
    }

    /// Approvals get mined but leave the allowance untouched.
    pub fn ignore_approvals(&self) {
        self.with_state(|s| s.approvals_take_effect = false);
    }

    pub fn set_totals(&self, native: U256, token: U256) {
        self.with_state(|s| s.totals = (native, token));
    }

    pub fn fail_id(&self, id: u64) {
        self.with_state(|s| s.failing_ids.insert(id));
    }

    pub fn stall_id(&self, id: u64) {
        self.with_state(|s| s.stalled_ids.insert(id));
    }

    /// `getUserGifts` never answers.
    pub fn stall_user_gifts(&self) {
        self.with_state(|s| s.stall_user_gifts = true);
    }

    /// The next `count` log queries are recorded, then fail with HTTP 429.
    pub fn rate_limit_logs(&self, count: u32) {
        self.with_state(|s| s.rate_limited_logs = count);
    }

    /// The next `count` calls fail with HTTP 429.
    pub fn rate_limit_next(&self, count: u32) {
        self.with_state(|s| s.rate_limited_calls = count);
    }

    /// Every call fails as if the endpoint were unreachable.
    pub fn set_down(&self, down: bool) {
        self.with_state(|s| s.down = down);
    }

    pub fn revert_writes(&self) {
        self.with_state(|s| s.revert_writes = true);
    }

    pub fn reject_ranged_logs(&self) {
        self.with_state(|s| s.reject_ranged_logs = true);
    }

    pub fn push_log(&self, log: Log) {
        self.with_state(|s| s.logs.push(log));
    }

    /// `from_block` of every log query, `None` for unbounded ones.
    pub fn log_queries(&self) -> Vec<Option<u64>> {
        self.with_state(|s| s.log_queries.clone())
    }

    /// Names of every call received, including failed ones.
    pub fn calls(&self) -> Vec<&'static str> {
        self.with_state(|s| s.calls.clone())
    }

    pub fn sent(&self) -> Vec<SentTx> {
        self.with_state(|s| s.sent.clone())
    }

    pub fn sent_names(&self) -> Vec<&'static str> {
        self.sent().iter().map(|tx| tx.name).collect()
    }

    fn too_many_requests() -> BlockchainError {
        BlockchainError::Rpc {
            code: Some(429),
            message: "Too Many Requests".to_string(),
        }
    }

    /// Shared failure injection. `Err` when the call must fail.
    fn gate(&self, name: &'static str) -> BlockchainResult<()> {
        self.with_state(|s| {
            s.calls.push(name);
            if s.down {
                return Err(rpc_error("connection refused"));
            }
            if s.rate_limited_calls > 0 {
                s.rate_limited_calls -= 1;
                return Err(Self::too_many_requests());
            }
            Ok(())
        })
    }

    fn view(&self, input: &[u8]) -> BlockchainResult<Vec<u8>> {
        let selector: [u8; 4] = input
            .get(..4)
            .and_then(|s| s.try_into().ok())
            .ok_or_else(|| rpc_error("empty calldata"))?;

        match selector {
            IRiddlePay::getGiftCall::SELECTOR => {
                let call = IRiddlePay::getGiftCall::abi_decode(input)?;
                let id: u64 = call.giftId.to();
                self.with_state(|s| {
                    if s.failing_ids.contains(&id) {
                        return Err(rpc_error("execution reverted: Gift does not exist"));
                    }
                    let gift = s
                        .gifts
                        .get(id as usize)
                        .cloned()
                        .ok_or_else(|| rpc_error("execution reverted: Gift does not exist"))?;
                    Ok(IRiddlePay::getGiftCall::abi_encode_returns(&gift))
                })
            }
            IRiddlePay::giftCountCall::SELECTOR => self.with_state(|s| {
                Ok(IRiddlePay::giftCountCall::abi_encode_returns(&U256::from(
                    s.gifts.len(),
                )))
            }),
            IRiddlePay::getUserGiftsCall::SELECTOR => {
                let call = IRiddlePay::getUserGiftsCall::abi_decode(input)?;
                self.with_state(|s| {
                    let ids: Vec<U256> = s
                        .user_gifts
                        .get(&call.user)
                        .map(|ids| ids.iter().map(|&id| U256::from(id)).collect())
                        .unwrap_or_default();
                    Ok(IRiddlePay::getUserGiftsCall::abi_encode_returns(&ids))
                })
            }
            IRiddlePay::isExpiredCall::SELECTOR => {
                let call = IRiddlePay::isExpiredCall::abi_decode(input)?;
                let id: usize = call.giftId.to();
                self.with_state(|s| {
                    let expired = s
                        .gifts
                        .get(id)
                        .map(|g| !g.expirationTime.is_zero() && g.expirationTime <= U256::from(1_000))
                        .unwrap_or(false);
                    Ok(IRiddlePay::isExpiredCall::abi_encode_returns(&expired))
                })
            }
            IRiddlePay::getTotalValueLockedCall::SELECTOR => self.with_state(|s| {
                Ok(IRiddlePay::getTotalValueLockedCall::abi_encode_returns(
                    &IRiddlePay::getTotalValueLockedReturn {
                        totalNative: s.totals.0,
                        totalToken: s.totals.1,
                    },
                ))
            }),
            IERC20::allowanceCall::SELECTOR => self.with_state(|s| {
                Ok(IERC20::allowanceCall::abi_encode_returns(&s.allowance))
            }),
            _ => Err(rpc_error("unknown selector")),
        }
    }

    fn apply_write(&self, tx: &TransactionRequest) -> BlockchainResult<&'static str> {
        let input = tx.input.input().cloned().unwrap_or_default();
        let selector: [u8; 4] = input
            .get(..4)
            .and_then(|s| s.try_into().ok())
            .ok_or_else(|| rpc_error("empty calldata"))?;
        let sender = tx.from.unwrap_or(self.address);

        let name = match selector {
            IERC20::approveCall::SELECTOR => {
                let call = IERC20::approveCall::abi_decode(&input)?;
                self.with_state(|s| {
                    if s.approvals_take_effect {
                        s.allowance = call.amount;
                    }
                });
                "approve"
            }
            IRiddlePay::createGiftCall::SELECTOR => {
                let call = IRiddlePay::createGiftCall::abi_decode(&input)?;
                let created_at = 1_700_000_000 + self.with_state(|s| s.gifts.len() as u64);
                let answer_hash = if call.riddle.is_empty() {
                    B256::ZERO
                } else {
                    keccak256(call.answer.as_bytes())
                };
                self.push_gift(IRiddlePay::Gift {
                    sender,
                    receiver: call.receiver,
                    riddle: call.riddle,
                    answerHash: answer_hash,
                    message: call.message,
                    amount: call.amount,
                    token: call.token,
                    createdAt: U256::from(created_at),
                    unlockTime: call.unlockTime,
                    expirationTime: call.expirationTime,
                    claimed: false,
                });
                "create_gift"
            }
            IRiddlePay::bulkCreateGiftsCall::SELECTOR => "bulk_create_gifts",
            IRiddlePay::claimGiftCall::SELECTOR => "claim_gift",
            IRiddlePay::refundGiftCall::SELECTOR => "refund_gift",
            _ => return Err(rpc_error("unknown selector")),
        };
        Ok(name)
    }
}

impl ChainReader for MockChain {
    async fn call(&self, tx: TransactionRequest) -> BlockchainResult<Bytes> {
        let input = tx.input.input().cloned().unwrap_or_default();
        let stalled = input.len() >= 36
            && input[..4] == IRiddlePay::getGiftCall::SELECTOR
            && IRiddlePay::getGiftCall::abi_decode(&input)
                .map(|c| self.with_state(|s| s.stalled_ids.contains(&c.giftId.to::<u64>())))
                .unwrap_or(false)
            || (input.get(..4) == Some(&IRiddlePay::getUserGiftsCall::SELECTOR[..])
                && self.with_state(|s| s.stall_user_gifts));

        self.gate("eth_call")?;
        if stalled {
            std::future::pending::<()>().await;
        }
        Ok(self.view(&input)?.into())
    }

    async fn get_block_number(&self) -> BlockchainResult<u64> {
        self.gate("eth_blockNumber")?;
        Ok(self.with_state(|s| s.block_number))
    }

    async fn get_balance(&self, _address: Address) -> BlockchainResult<U256> {
        self.gate("eth_getBalance")?;
        Ok(U256::ZERO)
    }

    async fn get_logs(&self, filter: &Filter) -> BlockchainResult<Vec<Log>> {
        self.gate("eth_getLogs")?;
        let from_block = filter.get_from_block();
        self.with_state(|s| {
            s.log_queries.push(from_block);
            if s.rate_limited_logs > 0 {
                s.rate_limited_logs -= 1;
                return Err(Self::too_many_requests());
            }
            if s.reject_ranged_logs && from_block.is_some() {
                return Err(rpc_error("block range is too wide"));
            }
            Ok(s.logs
                .iter()
                .filter(|log| {
                    log.topics()
                        .first()
                        .map(|topic| filter.topics[0].matches(topic))
                        .unwrap_or(false)
                })
                .cloned()
                .collect())
        })
    }
}

impl ChainSigner for MockChain {
    fn address(&self) -> Address {
        self.address
    }

    async fn send_transaction(&self, tx: TransactionRequest) -> BlockchainResult<TxHash> {
        self.gate("eth_sendTransaction")?;
        let name = self.apply_write(&tx)?;
        let sent = SentTx {
            name,
            to: tx.to.and_then(|kind| kind.to().copied()).unwrap_or_default(),
            value: tx.value.unwrap_or_default(),
            input: tx.input.input().cloned().unwrap_or_default(),
        };
        Ok(self.with_state(|s| {
            s.sent.push(sent);
            B256::with_last_byte(s.sent.len() as u8)
        }))
    }

    async fn wait_for_confirmation(&self, _tx_hash: TxHash) -> BlockchainResult<ConfirmationStatus> {
        self.with_state(|s| {
            if s.revert_writes {
                Ok(ConfirmationStatus::Failed(
                    "execution reverted: Incorrect answer".to_string(),
                ))
            } else {
                s.block_number += 1;
                Ok(ConfirmationStatus::Confirmed {
                    block_number: s.block_number,
                })
            }
        })
    }
}
