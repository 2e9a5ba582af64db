//! Leaderboards from contract events.
//!
//! # Flow
//! ```text
//! latest block
//!     → GiftCreated logs over the lookback range (unbounded if rejected)
//!     → throttle
//!     → GiftClaimed logs, same range
//!     → tally senders / receivers, keep the top N of each
//! ```
//! Undecodable logs are collected as diagnostics, never raised.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use alloy::primitives::Address;
use alloy::rpc::types::{Filter, Log};
use alloy::eips::BlockNumberOrTag;
use alloy::sol_types::SolEvent;
use dashmap::DashMap;
use serde::Serialize;
use tokio::time::Instant;

use crate::blockchain::contract::IRiddlePay;
use crate::blockchain::provider::{ChainReader, ChainSigner};
use crate::blockchain::types::{BlockchainError, BlockchainResult};
use crate::config::LeaderboardConfig;
use crate::gifts::RiddlePayClient;
use crate::observability::metrics;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LeaderboardOptions {
    pub lookback_blocks: u64,
    /// Pause between the two event queries.
    pub throttle: Duration,
    pub cache_ttl: Duration,
    pub top_n: usize,
}

impl Default for LeaderboardOptions {
    fn default() -> Self {
        Self::from(&LeaderboardConfig::default())
    }
}

impl From<&LeaderboardConfig> for LeaderboardOptions {
    fn from(config: &LeaderboardConfig) -> Self {
        Self {
            lookback_blocks: config.lookback_blocks,
            throttle: Duration::from_millis(config.throttle_ms),
            cache_ttl: Duration::from_secs(config.cache_ttl_secs),
            top_n: config.top_n,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LeaderboardEntry {
    pub address: Address,
    pub count: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Leaderboard {
    pub top_creators: Vec<LeaderboardEntry>,
    pub top_claimers: Vec<LeaderboardEntry>,
    /// First block scanned; `None` when the ranged query was rejected.
    pub from_block: Option<u64>,
    pub diagnostics: Vec<String>,
}

/// Per-address occurrence counts plus the logs that could not be read.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Tally {
    pub counts: HashMap<Address, u64>,
    pub diagnostics: Vec<String>,
}

/// Fold logs of event `E` into counts keyed by `key`.
pub fn tally_events<E, K>(logs: &[Log], key: K) -> Tally
where
    E: SolEvent,
    K: Fn(&E) -> Address,
{
    logs.iter().fold(Tally::default(), |mut tally, log| {
        match log.log_decode::<E>() {
            Ok(decoded) => *tally.counts.entry(key(&decoded.inner.data)).or_default() += 1,
            Err(e) => tally.diagnostics.push(format!(
                "{} in tx {}: {}",
                E::SIGNATURE,
                log.transaction_hash.map(|h| h.to_string()).unwrap_or_default(),
                e
            )),
        }
        tally
    })
}

/// Highest counts first; ties ordered by address.
pub fn top_entries(counts: HashMap<Address, u64>, n: usize) -> Vec<LeaderboardEntry> {
    let mut entries: Vec<LeaderboardEntry> = counts
        .into_iter()
        .map(|(address, count)| LeaderboardEntry { address, count })
        .collect();
    entries.sort_by(|a, b| b.count.cmp(&a.count).then(a.address.cmp(&b.address)));
    entries.truncate(n);
    entries
}

async fn query_events<R, S, E>(
    client: &RiddlePayClient<R, S>,
    from_block: Option<u64>,
) -> BlockchainResult<(Vec<Log>, Option<u64>)>
where
    R: ChainReader,
    S: ChainSigner,
    E: SolEvent,
{
    let base = Filter::new()
        .address(client.contract())
        .event_signature(E::SIGNATURE_HASH);

    if let Some(from) = from_block {
        match client.get_logs(&base.clone().from_block(from)).await {
            Ok(logs) => return Ok((logs, Some(from))),
            Err(e @ BlockchainError::RateLimited { .. }) => return Err(e),
            Err(e) => {
                tracing::warn!(event = E::SIGNATURE, from_block = from, error = %e, "Ranged log query rejected, retrying unbounded");
            }
        }
    }

    let logs = client
        .get_logs(&base.from_block(BlockNumberOrTag::Earliest))
        .await?;
    Ok((logs, None))
}

/// Scan recent events and rank creators and claimers.
pub async fn build_leaderboard<R, S>(
    client: &RiddlePayClient<R, S>,
    options: &LeaderboardOptions,
) -> BlockchainResult<Leaderboard>
where
    R: ChainReader,
    S: ChainSigner,
{
    let latest = client.get_block_number().await?;
    let from_block = latest.saturating_sub(options.lookback_blocks);

    let (created, created_from) =
        query_events::<_, _, IRiddlePay::GiftCreated>(client, Some(from_block)).await?;
    tokio::time::sleep(options.throttle).await;
    // Once a ranged query was rejected, don't bother with another one.
    let (claimed, claimed_from) =
        query_events::<_, _, IRiddlePay::GiftClaimed>(client, created_from).await?;

    let creators = tally_events::<IRiddlePay::GiftCreated, _>(&created, |e| e.sender);
    let claimers = tally_events::<IRiddlePay::GiftClaimed, _>(&claimed, |e| e.receiver);

    let mut diagnostics = creators.diagnostics;
    diagnostics.extend(claimers.diagnostics);
    if !diagnostics.is_empty() {
        tracing::debug!(count = diagnostics.len(), "Undecodable leaderboard logs skipped");
    }

    tracing::debug!(
        created = created.len(),
        claimed = claimed.len(),
        latest,
        "Leaderboard built"
    );

    Ok(Leaderboard {
        top_creators: top_entries(creators.counts, options.top_n),
        top_claimers: top_entries(claimers.counts, options.top_n),
        from_block: created_from.and(claimed_from),
        diagnostics,
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct CacheKey {
    contract: Address,
    lookback_blocks: u64,
    top_n: usize,
}

#[derive(Debug, Clone)]
struct CachedBoard {
    stored_at: Instant,
    board: Arc<Leaderboard>,
}

/// Short-lived leaderboard cache shared by every caller in the process.
///
/// Entries are advisory; a concurrent rebuild simply overwrites.
#[derive(Debug, Clone, Default)]
pub struct LeaderboardCache {
    inner: Arc<DashMap<CacheKey, CachedBoard>>,
}

impl LeaderboardCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    pub fn clear(&self) {
        self.inner.clear();
    }

    /// Cached leaderboard if still fresh, otherwise a rebuilt one.
    pub async fn get_or_build<R, S>(
        &self,
        client: &RiddlePayClient<R, S>,
        options: &LeaderboardOptions,
    ) -> BlockchainResult<Arc<Leaderboard>>
    where
        R: ChainReader,
        S: ChainSigner,
    {
        let key = CacheKey {
            contract: client.contract(),
            lookback_blocks: options.lookback_blocks,
            top_n: options.top_n,
        };

        if let Some(cached) = self.inner.get(&key) {
            if cached.stored_at.elapsed() < options.cache_ttl {
                metrics::record_cache_hit();
                return Ok(cached.board.clone());
            }
        }

        let board = Arc::new(build_leaderboard(client, options).await?);
        self.inner.insert(
            key,
            CachedBoard {
                stored_at: Instant::now(),
                board: board.clone(),
            },
        );
        Ok(board)
    }
}
