//! Total value locked and global counters.
//!
//! The contract's own total is trusted unless it reports nothing locked
//! while gifts exist. In that case unclaimed amounts are summed by hand and
//! the result is tagged so callers can tell the two apart.

use std::time::Duration;

use serde::Serialize;

use crate::blockchain::provider::{ChainReader, ChainSigner};
use crate::blockchain::types::BlockchainResult;
use crate::config::TvlConfig;
use crate::gifts::{LockedTotals, RiddlePayClient};
use crate::observability::metrics;

/// Bounds for the manual scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TvlOptions {
    pub scan_cap: u64,
    pub pause_every: u64,
    pub pause: Duration,
}

impl Default for TvlOptions {
    fn default() -> Self {
        Self::from(&TvlConfig::default())
    }
}

impl From<&TvlConfig> for TvlOptions {
    fn from(config: &TvlConfig) -> Self {
        Self {
            scan_cap: config.scan_cap,
            pause_every: config.pause_every,
            pause: Duration::from_millis(config.pause_ms),
        }
    }
}

/// Where a total came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum TvlSource {
    Contract,
    /// Summed from `scanned` records; `truncated` when the cap cut the scan short.
    ManualScan { scanned: u64, truncated: bool },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TotalLocked {
    pub totals: LockedTotals,
    pub source: TvlSource,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct GlobalStats {
    pub record_count: u64,
    pub total_locked: TotalLocked,
}

/// Whether the contract's total disagrees with the record count.
pub fn needs_manual_scan(totals: &LockedTotals, record_count: u64) -> bool {
    totals.is_zero() && record_count > 0
}

/// Sum unclaimed amounts of the first `scan_cap` records, pausing every
/// `pause_every` records. Unreadable records are skipped.
pub async fn scan_unclaimed<R, S>(
    client: &RiddlePayClient<R, S>,
    record_count: u64,
    options: &TvlOptions,
) -> TotalLocked
where
    R: ChainReader,
    S: ChainSigner,
{
    let limit = record_count.min(options.scan_cap);
    let mut totals = LockedTotals::default();
    let mut skipped = 0;

    for id in 0..limit {
        if id > 0 && options.pause_every > 0 && id % options.pause_every == 0 {
            tokio::time::sleep(options.pause).await;
        }
        match client.get_record(id).await {
            Ok(gift) if !gift.claimed => totals.add(gift.asset_kind(), gift.amount),
            Ok(_) => {}
            Err(e) => {
                tracing::debug!(gift_id = id, error = %e, "Skipping gift in value scan");
                skipped += 1;
            }
        }
    }
    if skipped > 0 {
        metrics::record_dropped(skipped);
    }

    TotalLocked {
        totals,
        source: TvlSource::ManualScan {
            scanned: limit,
            truncated: limit < record_count,
        },
    }
}

/// Value locked, given a known record count.
pub async fn total_locked<R, S>(
    client: &RiddlePayClient<R, S>,
    record_count: u64,
    options: &TvlOptions,
) -> BlockchainResult<TotalLocked>
where
    R: ChainReader,
    S: ChainSigner,
{
    let totals = client.get_total_locked().await?;
    if !needs_manual_scan(&totals, record_count) {
        return Ok(TotalLocked {
            totals,
            source: TvlSource::Contract,
        });
    }

    tracing::warn!(
        record_count,
        scan_cap = options.scan_cap,
        "Contract reports nothing locked while gifts exist, summing records"
    );
    Ok(scan_unclaimed(client, record_count, options).await)
}

/// Record count and value locked.
pub async fn global_stats<R, S>(
    client: &RiddlePayClient<R, S>,
    options: &TvlOptions,
) -> BlockchainResult<GlobalStats>
where
    R: ChainReader,
    S: ChainSigner,
{
    let record_count = client.get_record_count().await?;
    let total_locked = total_locked(client, record_count, options).await?;
    Ok(GlobalStats {
        record_count,
        total_locked,
    })
}
