//! Gift record model and amount handling.

use alloy::primitives::utils::{parse_units, ParseUnits};
use alloy::primitives::{Address, B256, U256};
use serde::{Deserialize, Serialize};

use crate::blockchain::contract::IRiddlePay;
use crate::blockchain::types::{BlockchainError, BlockchainResult};

/// Decimals of the native asset.
pub const NATIVE_DECIMALS: u8 = 18;

/// Which asset a gift moves.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AssetKind {
    /// The chain's native currency (zero-address sentinel on-chain).
    #[default]
    Native,
    /// The configured fungible token.
    Token,
}

/// One gift as tracked by the contract.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GiftRecord {
    pub id: u64,
    pub sender: Address,
    pub receiver: Address,
    /// Empty means a direct transfer with no challenge.
    pub riddle: String,
    /// Commitment to the answer; never the plaintext.
    pub answer_hash: B256,
    pub message: String,
    /// Smallest unit of the asset.
    pub amount: U256,
    /// `Address::ZERO` for the native asset.
    pub asset: Address,
    pub created_at: u64,
    /// Zero means claimable immediately.
    pub unlock_time: u64,
    /// Zero means the contract's default window.
    pub expiration_time: u64,
    pub claimed: bool,
}

/// Lifecycle position of a gift at a point in time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "status")]
pub enum GiftStatus {
    Claimed,
    Locked { unlocks_at: u64 },
    Claimable,
    Expired,
}

impl GiftRecord {
    /// Normalize a contract struct.
    pub fn from_contract(id: u64, gift: IRiddlePay::Gift) -> Self {
        Self {
            id,
            sender: gift.sender,
            receiver: gift.receiver,
            riddle: gift.riddle,
            answer_hash: gift.answerHash,
            message: gift.message,
            amount: gift.amount,
            asset: gift.token,
            created_at: to_u64(gift.createdAt),
            unlock_time: to_u64(gift.unlockTime),
            expiration_time: to_u64(gift.expirationTime),
            claimed: gift.claimed,
        }
    }

    pub fn has_riddle(&self) -> bool {
        !self.riddle.is_empty()
    }

    pub fn is_native(&self) -> bool {
        self.asset == Address::ZERO
    }

    pub fn asset_kind(&self) -> AssetKind {
        if self.is_native() {
            AssetKind::Native
        } else {
            AssetKind::Token
        }
    }

    /// Expired by the record's own timestamp. Records using the contract's
    /// default window (`expiration_time == 0`) are never expired here; ask
    /// the contract's `isExpired` for those.
    pub fn is_expired_at(&self, now: u64) -> bool {
        self.expiration_time != 0 && now >= self.expiration_time
    }

    /// Status at `now` (unix seconds).
    pub fn status(&self, now: u64) -> GiftStatus {
        if self.claimed {
            GiftStatus::Claimed
        } else if self.is_expired_at(now) {
            GiftStatus::Expired
        } else if self.unlock_time > now {
            GiftStatus::Locked {
                unlocks_at: self.unlock_time,
            }
        } else {
            GiftStatus::Claimable
        }
    }

    /// Whether `caller` may claim at `now`.
    pub fn can_claim(&self, caller: Address, now: u64) -> bool {
        caller == self.receiver && self.status(now) == GiftStatus::Claimable
    }

    /// Whether `caller` may refund at `now`.
    pub fn can_refund(&self, caller: Address, now: u64) -> bool {
        caller == self.sender && self.status(now) == GiftStatus::Expired
    }
}

/// Totals of unclaimed gift amounts as reported by the contract.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LockedTotals {
    pub native: U256,
    pub token: U256,
}

impl LockedTotals {
    pub fn is_zero(&self) -> bool {
        self.native.is_zero() && self.token.is_zero()
    }

    /// Add an amount to the matching bucket.
    pub fn add(&mut self, asset: AssetKind, amount: U256) {
        match asset {
            AssetKind::Native => self.native = self.native.saturating_add(amount),
            AssetKind::Token => self.token = self.token.saturating_add(amount),
        }
    }
}

/// Parse a human-readable decimal amount into the asset's smallest unit.
///
/// Zero, negative and malformed amounts are rejected.
pub fn parse_amount(text: &str, decimals: u8) -> BlockchainResult<U256> {
    let trimmed = text.trim();
    let parsed = parse_units(trimmed, decimals)
        .map_err(|e| BlockchainError::InvalidInput(format!("invalid amount '{}': {}", trimmed, e)))?;

    match parsed {
        ParseUnits::U256(value) if !value.is_zero() => Ok(value),
        _ => Err(BlockchainError::InvalidInput(format!(
            "amount must be positive, got '{}'",
            trimmed
        ))),
    }
}

/// Format a smallest-unit amount with the given decimals, trimming
/// trailing zeros.
pub fn format_amount(amount: U256, decimals: u8) -> String {
    if amount.is_zero() {
        return "0".to_string();
    }

    let divisor = U256::from(10u64).pow(U256::from(decimals));
    let whole = amount / divisor;
    let remainder = amount % divisor;

    if remainder.is_zero() {
        return whole.to_string();
    }

    let decimal_str = format!("{:0>width$}", remainder, width = decimals as usize);
    format!("{}.{}", whole, decimal_str.trim_end_matches('0'))
}

/// Current unix time in seconds.
pub fn unix_now() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}

pub(crate) fn to_u64(value: U256) -> u64 {
    u64::try_from(value).unwrap_or(u64::MAX)
}
