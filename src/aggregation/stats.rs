//! Dashboard statistics for one account.

use alloy::primitives::Address;
use serde::Serialize;

use crate::aggregation::listing::{collect_account_gifts, ListingOptions};
use crate::blockchain::provider::{ChainReader, ChainSigner};
use crate::blockchain::types::BlockchainResult;
use crate::gifts::{unix_now, GiftRecord, GiftStatus, LockedTotals, RiddlePayClient};

/// Counts and totals over the gifts an account sent or received.
///
/// A gift an account sent to itself counts on both sides.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AccountStats {
    pub account: Address,
    pub sent: usize,
    pub received: usize,
    /// Received and claimed.
    pub claimed: usize,
    /// Received, not claimed, not expired.
    pub pending: usize,
    /// Sent, expired and unclaimed.
    pub refundable: usize,
    pub total_sent: LockedTotals,
    pub total_received: LockedTotals,
    /// Gifts the listing could not load; the figures above exclude them.
    pub unavailable: usize,
}

/// Fold a set of records into stats for `account` at `now`.
pub fn summarize(account: Address, gifts: &[GiftRecord], now: u64) -> AccountStats {
    gifts.iter().fold(
        AccountStats {
            account,
            ..AccountStats::default()
        },
        |mut stats, gift| {
            if gift.sender == account {
                stats.sent += 1;
                stats.total_sent.add(gift.asset_kind(), gift.amount);
                if gift.can_refund(account, now) {
                    stats.refundable += 1;
                }
            }
            if gift.receiver == account {
                stats.received += 1;
                stats.total_received.add(gift.asset_kind(), gift.amount);
                match gift.status(now) {
                    GiftStatus::Claimed => stats.claimed += 1,
                    GiftStatus::Locked { .. } | GiftStatus::Claimable => stats.pending += 1,
                    GiftStatus::Expired => {}
                }
            }
            stats
        },
    )
}

/// Load the account's gifts and summarize them.
pub async fn account_stats<R, S>(
    client: &RiddlePayClient<R, S>,
    account: Address,
    options: &ListingOptions,
) -> BlockchainResult<AccountStats>
where
    R: ChainReader,
    S: ChainSigner,
{
    let listing = collect_account_gifts(client, account, options).await?;
    let mut stats = summarize(account, &listing.gifts, unix_now());
    stats.unavailable = listing.dropped + listing.truncated;
    Ok(stats)
}
