//! Progressive account listing.
//!
//! # Load cycle
//! ```text
//! getUserGifts(account)
//!     → keep the newest `max_listed` ids
//!     → split into batches of `batch_size`
//!     → all batches in flight at once; records inside a batch fetched
//!       concurrently, each under `record_timeout`
//!     → as each batch lands: merge, sort newest first, emit
//! ```
//! Records that fail or stall are dropped from the cycle without retry.
//! The whole cycle, `getUserGifts` included, is bounded by `load_timeout`.
//! Batches still in flight at the deadline are dropped too. A batch that
//! lands exactly at the deadline is merged, but the snapshot still reports
//! `timed_out` if any batch remains.

use std::time::Duration;

use alloy::primitives::Address;
use futures_util::future::join_all;
use futures_util::stream::{FuturesUnordered, StreamExt};
use serde::Serialize;
use tokio::sync::mpsc;
use tokio::time::{timeout_at, Instant};

use crate::blockchain::provider::{ChainReader, ChainSigner};
use crate::blockchain::types::BlockchainResult;
use crate::config::AggregationConfig;
use crate::gifts::{GiftRecord, RiddlePayClient};
use crate::observability::metrics;
use crate::resilience::with_timeout;

/// Bounds for one load cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListingOptions {
    pub max_listed: usize,
    pub batch_size: usize,
    pub record_timeout: Duration,
    pub load_timeout: Duration,
}

impl Default for ListingOptions {
    fn default() -> Self {
        Self::from(&AggregationConfig::default())
    }
}

impl From<&AggregationConfig> for ListingOptions {
    fn from(config: &AggregationConfig) -> Self {
        Self {
            max_listed: config.max_listed,
            batch_size: config.batch_size.max(1),
            record_timeout: Duration::from_millis(config.record_timeout_ms),
            load_timeout: Duration::from_millis(config.load_timeout_ms),
        }
    }
}

/// Snapshot of a load cycle, emitted after every batch.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct GiftListing {
    pub account: Address,
    /// Merged so far, newest first.
    pub gifts: Vec<GiftRecord>,
    pub batches_done: usize,
    pub batches_total: usize,
    /// Records dropped so far (failed, stalled or cut off by the deadline).
    pub dropped: usize,
    /// Ids the account owns beyond the listing cap.
    pub truncated: usize,
    pub timed_out: bool,
    /// No further snapshots follow this one.
    pub complete: bool,
}

/// Keep the `max` highest ids, highest first.
pub fn cap_ids(mut ids: Vec<u64>, max: usize) -> Vec<u64> {
    ids.sort_unstable_by(|a, b| b.cmp(a));
    ids.dedup();
    ids.truncate(max);
    ids
}

/// Order records newest first; ids break ties so the order is stable
/// regardless of arrival order.
pub fn sort_newest_first(gifts: &mut [GiftRecord]) {
    gifts.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
}

async fn fetch_batch<R, S>(
    client: &RiddlePayClient<R, S>,
    ids: &[u64],
    record_timeout: Duration,
) -> Vec<(u64, BlockchainResult<GiftRecord>)>
where
    R: ChainReader,
    S: ChainSigner,
{
    join_all(ids.iter().map(|&id| async move {
        (id, with_timeout(record_timeout, client.get_record(id)).await)
    }))
    .await
}

/// Run one load cycle, handing every snapshot to `on_update`.
///
/// `on_update` returning `false` cancels the cycle: in-flight fetches are
/// abandoned and the last snapshot is returned as is.
pub async fn load_account_gifts<R, S, F>(
    client: &RiddlePayClient<R, S>,
    account: Address,
    options: &ListingOptions,
    mut on_update: F,
) -> BlockchainResult<GiftListing>
where
    R: ChainReader,
    S: ChainSigner,
    F: FnMut(&GiftListing) -> bool,
{
    let deadline = Instant::now() + options.load_timeout;
    let all_ids = match timeout_at(deadline, client.get_record_ids_for_account(account)).await {
        Ok(ids) => ids?,
        Err(_) => {
            tracing::warn!(account = %account, "Listing load timed out before ids arrived");
            let listing = GiftListing {
                account,
                timed_out: true,
                complete: true,
                ..GiftListing::default()
            };
            on_update(&listing);
            return Ok(listing);
        }
    };
    let owned = all_ids.len();
    let ids = cap_ids(all_ids, options.max_listed);

    let batches: Vec<&[u64]> = ids.chunks(options.batch_size.max(1)).collect();
    let mut listing = GiftListing {
        account,
        gifts: Vec::with_capacity(ids.len()),
        batches_total: batches.len(),
        truncated: owned.saturating_sub(ids.len()),
        ..GiftListing::default()
    };

    tracing::debug!(
        account = %account,
        owned,
        listed = ids.len(),
        batches = batches.len(),
        "Loading account gifts"
    );

    if batches.is_empty() {
        listing.complete = true;
        on_update(&listing);
        return Ok(listing);
    }

    let mut pending: FuturesUnordered<_> = batches
        .iter()
        .map(|batch| fetch_batch(client, batch, options.record_timeout))
        .collect();

    while listing.batches_done < listing.batches_total {
        // `timeout_at` polls its future before the timer, so check the
        // clock first to stop merging once the deadline has passed.
        let next = if Instant::now() >= deadline {
            None
        } else {
            timeout_at(deadline, pending.next()).await.ok()
        };
        let results = match next {
            Some(Some(results)) => results,
            Some(None) => break,
            None => {
                let settled = listing.gifts.len() + listing.dropped;
                let cut_off = ids.len().saturating_sub(settled);
                tracing::warn!(
                    account = %account,
                    batches_done = listing.batches_done,
                    batches_total = listing.batches_total,
                    cut_off,
                    "Listing load timed out"
                );
                metrics::record_dropped(cut_off);
                listing.dropped += cut_off;
                listing.timed_out = true;
                listing.complete = true;
                on_update(&listing);
                return Ok(listing);
            }
        };

        let mut failed = 0;
        for (id, result) in results {
            match result {
                Ok(gift) => listing.gifts.push(gift),
                Err(e) => {
                    tracing::debug!(gift_id = id, error = %e, "Dropping gift from listing");
                    failed += 1;
                }
            }
        }
        if failed > 0 {
            metrics::record_dropped(failed);
        }

        listing.dropped += failed;
        listing.batches_done += 1;
        listing.complete = listing.batches_done == listing.batches_total;
        sort_newest_first(&mut listing.gifts);

        if !listing.complete && Instant::now() >= deadline {
            continue;
        }
        if !on_update(&listing) {
            tracing::debug!(account = %account, "Listing cancelled by consumer");
            return Ok(listing);
        }
    }

    Ok(listing)
}

/// Run one load cycle, sending every snapshot down `tx`.
///
/// Dropping the receiver cancels the cycle.
pub async fn stream_account_gifts<R, S>(
    client: &RiddlePayClient<R, S>,
    account: Address,
    options: &ListingOptions,
    tx: mpsc::UnboundedSender<GiftListing>,
) -> BlockchainResult<GiftListing>
where
    R: ChainReader,
    S: ChainSigner,
{
    load_account_gifts(client, account, options, |snapshot| tx.send(snapshot.clone()).is_ok()).await
}

/// Run one load cycle and return only the final snapshot.
pub async fn collect_account_gifts<R, S>(
    client: &RiddlePayClient<R, S>,
    account: Address,
    options: &ListingOptions,
) -> BlockchainResult<GiftListing>
where
    R: ChainReader,
    S: ChainSigner,
{
    load_account_gifts(client, account, options, |_| true).await
}
