//! Aggregated views composed from single-record reads.
//!
//! The contract has no batch-read or indexed-query endpoint, so every view
//! here fans out into many facade calls and tolerates partial failure:
//! per-record errors are logged and dropped, never raised.
//!
//! - `listing`: capped, batched, progressive per-account listing
//! - `stats`: dashboard counts over a listing
//! - `leaderboard`: event-log tallies with a short-lived cache
//! - `tvl`: value locked, with a reported manual-scan reconciliation

pub mod leaderboard;
pub mod listing;
pub mod stats;
pub mod tvl;

pub use leaderboard::{build_leaderboard, Leaderboard, LeaderboardCache, LeaderboardEntry, LeaderboardOptions};
pub use listing::{
    collect_account_gifts, load_account_gifts, stream_account_gifts, GiftListing, ListingOptions,
};
pub use stats::{account_stats, summarize, AccountStats};
pub use tvl::{global_stats, total_locked, GlobalStats, TotalLocked, TvlOptions, TvlSource};
