//! Aggregated views: listing, stats, value locked and leaderboard.

use std::time::Duration;

use alloy::primitives::U256;
use tokio::sync::mpsc;
use tokio::time::Instant;

use riddlepay::aggregation::{
    account_stats, build_leaderboard, collect_account_gifts, global_stats, load_account_gifts,
    stream_account_gifts, LeaderboardCache, LeaderboardEntry, LeaderboardOptions, ListingOptions,
    TvlOptions, TvlSource,
};

use riddlepay::blockchain::BlockchainError;

mod common;
use common::{claimed_event, created_event, MockChain, RECEIVER, SENDER};

/// Gifts to `RECEIVER` whose creation times are scrambled relative to ids.
fn seed_gifts(chain: &MockChain, count: u64) {
    for id in 0..count {
        let created_at = 1_000 + (id * 7) % count;
        chain.push_gift(common::gift(SENDER, RECEIVER, id + 1, created_at));
    }
}

fn assert_newest_first(created: &[u64]) {
    assert!(created.windows(2).all(|w| w[0] >= w[1]), "{created:?}");
}

#[tokio::test(start_paused = true)]
async fn test_listing_drops_failed_and_stalled_records() {
    let chain = MockChain::new();
    seed_gifts(&chain, 25);
    chain.fail_id(3);
    chain.fail_id(17);
    chain.stall_id(9);
    let client = common::read_only_client(&chain);

    let start = Instant::now();
    let listing = collect_account_gifts(&client, RECEIVER, &ListingOptions::default())
        .await
        .unwrap();

    assert_eq!(listing.gifts.len(), 22);
    assert_eq!(listing.dropped, 3);
    assert_eq!(listing.batches_total, 2);
    assert_eq!(listing.batches_done, 2);
    assert!(listing.complete);
    assert!(!listing.timed_out);
    assert!(listing.gifts.iter().all(|g| ![3, 9, 17].contains(&g.id)));

    let created: Vec<u64> = listing.gifts.iter().map(|g| g.created_at).collect();
    assert_newest_first(&created);

    // The stalled record costs one per-record timeout, not the load deadline.
    assert_eq!(start.elapsed(), Duration::from_secs(3));
}

#[tokio::test]
async fn test_listing_emits_progressive_snapshots() {
    let chain = MockChain::new();
    seed_gifts(&chain, 45);
    let client = common::read_only_client(&chain);

    let (tx, mut rx) = mpsc::unbounded_channel();
    let last = stream_account_gifts(&client, RECEIVER, &ListingOptions::default(), tx)
        .await
        .unwrap();

    let mut snapshots = Vec::new();
    while let Some(snapshot) = rx.recv().await {
        snapshots.push(snapshot);
    }

    assert_eq!(snapshots.len(), 3);
    for (i, snapshot) in snapshots.iter().enumerate() {
        assert_eq!(snapshot.batches_done, i + 1);
        assert_eq!(snapshot.batches_total, 3);
        assert_eq!(snapshot.complete, i == 2);
        let created: Vec<u64> = snapshot.gifts.iter().map(|g| g.created_at).collect();
        assert_newest_first(&created);
    }
    assert!(snapshots.windows(2).all(|w| w[0].gifts.len() < w[1].gifts.len()));
    assert_eq!(snapshots.last(), Some(&last));
    assert_eq!(last.gifts.len(), 45);
}

#[tokio::test]
async fn test_listing_caps_to_newest_ids() {
    let chain = MockChain::new();
    seed_gifts(&chain, 60);
    let client = common::read_only_client(&chain);

    let listing = collect_account_gifts(&client, RECEIVER, &ListingOptions::default())
        .await
        .unwrap();

    assert_eq!(listing.gifts.len(), 50);
    assert_eq!(listing.truncated, 10);
    assert!(listing.gifts.iter().all(|g| g.id >= 10));
}

#[tokio::test(start_paused = true)]
async fn test_listing_load_deadline() {
    let chain = MockChain::new();
    seed_gifts(&chain, 5);
    chain.stall_id(2);
    let client = common::read_only_client(&chain);

    let options = ListingOptions {
        record_timeout: Duration::from_secs(30),
        ..ListingOptions::default()
    };
    let start = Instant::now();
    let listing = collect_account_gifts(&client, RECEIVER, &options).await.unwrap();

    assert!(listing.timed_out);
    assert!(listing.complete);
    assert!(listing.gifts.is_empty());
    assert_eq!(listing.dropped, 5);
    assert_eq!(start.elapsed(), Duration::from_secs(8));
}

#[tokio::test(start_paused = true)]
async fn test_listing_deadline_covers_id_lookup() {
    let chain = MockChain::new();
    seed_gifts(&chain, 3);
    chain.stall_user_gifts();
    let client = common::read_only_client(&chain);

    let start = Instant::now();
    let mut snapshots = 0;
    let listing = load_account_gifts(&client, RECEIVER, &ListingOptions::default(), |_| {
        snapshots += 1;
        true
    })
    .await
    .unwrap();

    assert_eq!(start.elapsed(), Duration::from_secs(8));
    assert_eq!(snapshots, 1);
    assert!(listing.timed_out);
    assert!(listing.complete);
    assert!(listing.gifts.is_empty());
    assert_eq!(listing.batches_total, 0);
}

#[tokio::test(start_paused = true)]
async fn test_batch_landing_at_deadline_still_reports_timeout() {
    let chain = MockChain::new();
    seed_gifts(&chain, 40);
    // One stalled record per batch; both batches settle exactly at the deadline.
    chain.stall_id(30);
    chain.stall_id(5);
    let client = common::read_only_client(&chain);

    let options = ListingOptions {
        record_timeout: Duration::from_secs(8),
        ..ListingOptions::default()
    };
    let start = Instant::now();
    let listing = collect_account_gifts(&client, RECEIVER, &options).await.unwrap();

    assert_eq!(start.elapsed(), Duration::from_secs(8));
    assert!(listing.timed_out);
    assert!(listing.complete);
    assert_eq!(listing.batches_done, 1);
    assert_eq!(listing.gifts.len(), 19);
    assert_eq!(listing.dropped, 21);
}

#[tokio::test]
async fn test_listing_cancelled_by_consumer() {
    let chain = MockChain::new();
    seed_gifts(&chain, 45);
    let client = common::read_only_client(&chain);

    let mut seen = 0;
    let listing = load_account_gifts(&client, RECEIVER, &ListingOptions::default(), |_| {
        seen += 1;
        false
    })
    .await
    .unwrap();

    assert_eq!(seen, 1);
    assert_eq!(listing.batches_done, 1);
    assert!(!listing.complete);
}

#[tokio::test]
async fn test_listing_for_account_without_gifts() {
    let chain = MockChain::new();
    let client = common::read_only_client(&chain);

    let listing = collect_account_gifts(&client, SENDER, &ListingOptions::default())
        .await
        .unwrap();
    assert!(listing.gifts.is_empty());
    assert_eq!(listing.batches_total, 0);
    assert!(listing.complete);
}

#[tokio::test]
async fn test_account_stats() {
    let chain = MockChain::new();
    chain.push_gift(common::gift(SENDER, RECEIVER, 10, 1));
    let mut claimed = common::gift(SENDER, RECEIVER, 4, 2);
    claimed.claimed = true;
    chain.push_gift(claimed);
    chain.push_gift(common::gift(RECEIVER, SENDER, 3, 3));
    let client = common::read_only_client(&chain);

    let stats = account_stats(&client, RECEIVER, &ListingOptions::default())
        .await
        .unwrap();

    assert_eq!(stats.received, 2);
    assert_eq!(stats.sent, 1);
    assert_eq!(stats.claimed, 1);
    assert_eq!(stats.pending, 1);
    assert_eq!(stats.total_received.native, U256::from(14));
    assert_eq!(stats.total_sent.native, U256::from(3));
    assert_eq!(stats.unavailable, 0);
}

#[tokio::test]
async fn test_tvl_trusts_contract_total() {
    let chain = MockChain::new();
    seed_gifts(&chain, 3);
    chain.set_totals(U256::from(42), U256::ZERO);
    let client = common::read_only_client(&chain);

    let stats = global_stats(&client, &TvlOptions::default()).await.unwrap();

    assert_eq!(stats.record_count, 3);
    assert_eq!(stats.total_locked.source, TvlSource::Contract);
    assert_eq!(stats.total_locked.totals.native, U256::from(42));
}

#[tokio::test(start_paused = true)]
async fn test_tvl_reconciles_by_scan_when_contract_reports_zero() {
    let chain = MockChain::new();
    seed_gifts(&chain, 25);
    let mut claimed = common::gift(SENDER, RECEIVER, 1_000, 1);
    claimed.claimed = true;
    chain.push_gift(claimed);
    let client = common::read_only_client(&chain);

    let start = Instant::now();
    let stats = global_stats(&client, &TvlOptions::default()).await.unwrap();

    assert_eq!(stats.record_count, 26);
    assert_eq!(
        stats.total_locked.source,
        TvlSource::ManualScan {
            scanned: 26,
            truncated: false
        }
    );
    // Amounts 1..=25; the claimed gift is excluded.
    assert_eq!(stats.total_locked.totals.native, U256::from(325));
    // Pauses before records 10 and 20.
    assert_eq!(start.elapsed(), Duration::from_millis(400));
}

#[tokio::test]
async fn test_tvl_scan_respects_cap() {
    let chain = MockChain::new();
    seed_gifts(&chain, 6);
    let client = common::read_only_client(&chain);

    let options = TvlOptions {
        scan_cap: 4,
        pause_every: 0,
        pause: Duration::ZERO,
    };
    let stats = global_stats(&client, &options).await.unwrap();

    assert_eq!(
        stats.total_locked.source,
        TvlSource::ManualScan {
            scanned: 4,
            truncated: true
        }
    );
    assert_eq!(stats.total_locked.totals.native, U256::from(10));
}

fn seed_events(chain: &MockChain) {
    chain.push_log(created_event(0, SENDER, RECEIVER));
    chain.push_log(created_event(1, SENDER, RECEIVER));
    chain.push_log(created_event(2, RECEIVER, SENDER));
    chain.push_log(created_event(3, SENDER, RECEIVER));
    chain.push_log(claimed_event(0, RECEIVER));
    chain.push_log(claimed_event(1, RECEIVER));
}

#[tokio::test(start_paused = true)]
async fn test_leaderboard_ranks_and_throttles() {
    let chain = MockChain::new();
    seed_events(&chain);
    let client = common::read_only_client(&chain);

    let start = Instant::now();
    let board = build_leaderboard(&client, &LeaderboardOptions::default())
        .await
        .unwrap();

    assert_eq!(
        board.top_creators,
        vec![
            LeaderboardEntry { address: SENDER, count: 3 },
            LeaderboardEntry { address: RECEIVER, count: 1 },
        ]
    );
    assert_eq!(
        board.top_claimers,
        vec![LeaderboardEntry { address: RECEIVER, count: 2 }]
    );
    assert_eq!(board.from_block, Some(10_000));
    assert!(board.diagnostics.is_empty());
    assert_eq!(chain.log_queries(), vec![Some(10_000), Some(10_000)]);
    assert_eq!(start.elapsed(), Duration::from_millis(500));
}

#[tokio::test(start_paused = true)]
async fn test_leaderboard_falls_back_to_unbounded_query() {
    let chain = MockChain::new();
    seed_events(&chain);
    chain.reject_ranged_logs();
    let client = common::read_only_client(&chain);

    let board = build_leaderboard(&client, &LeaderboardOptions::default())
        .await
        .unwrap();

    assert_eq!(board.from_block, None);
    assert_eq!(board.top_creators[0].count, 3);
    assert_eq!(chain.log_queries(), vec![Some(10_000), None, None]);
}

#[tokio::test(start_paused = true)]
async fn test_leaderboard_rate_limit_skips_unbounded_query() {
    let chain = MockChain::new();
    seed_events(&chain);
    chain.rate_limit_logs(10);
    let client = common::read_only_client(&chain);

    let err = build_leaderboard(&client, &LeaderboardOptions::default())
        .await
        .unwrap_err();

    assert_eq!(err, BlockchainError::RateLimited { attempts: 3 });
    assert_eq!(chain.log_queries(), vec![Some(10_000); 3]);
}

#[tokio::test(start_paused = true)]
async fn test_leaderboard_cache_window() {
    let chain = MockChain::new();
    seed_events(&chain);
    let client = common::read_only_client(&chain);
    let cache = LeaderboardCache::new();
    let options = LeaderboardOptions::default();

    let first = cache.get_or_build(&client, &options).await.unwrap();
    let second = cache.get_or_build(&client, &options).await.unwrap();
    assert_eq!(first, second);
    assert_eq!(chain.log_queries().len(), 2);
    assert_eq!(cache.len(), 1);

    tokio::time::advance(Duration::from_secs(6)).await;
    cache.get_or_build(&client, &options).await.unwrap();
    assert_eq!(chain.log_queries().len(), 4);
}
