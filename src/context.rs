//! Process-scoped application state.
//!
//! # Lifecycle
//! - `config`, `client` and the read-only handle: created once at startup
//! - signer handle: installed on wallet connect, replaced on account change,
//!   dropped on disconnect
//! - leaderboard cache: lives as long as the context
//!
//! Components receive the context (or a clone of its `Arc`s) explicitly;
//! nothing here is a global.

use std::sync::Arc;

use alloy::primitives::Address;
use tokio::sync::mpsc;

use crate::aggregation::{
    account_stats, collect_account_gifts, global_stats, stream_account_gifts, AccountStats,
    GiftListing, GlobalStats, Leaderboard, LeaderboardCache, LeaderboardOptions, ListingOptions,
    TvlOptions,
};
use crate::blockchain::{
    connect_hybrid, BlockchainResult, ChainReader, ChainSigner, HybridProvider, RpcEndpoint,
    SignerHandle, Wallet,
};
use crate::config::RiddlePayConfig;
use crate::gifts::RiddlePayClient;

/// Client wired to live RPC endpoints.
pub type LiveClient = RiddlePayClient<HybridProvider<RpcEndpoint>, SignerHandle>;

/// Shared state handed to every consumer.
pub struct AppContext<R, S> {
    config: Arc<RiddlePayConfig>,
    client: Arc<RiddlePayClient<R, S>>,
    leaderboard_cache: LeaderboardCache,
}

impl<R, S> Clone for AppContext<R, S> {
    fn clone(&self) -> Self {
        Self {
            config: self.config.clone(),
            client: self.client.clone(),
            leaderboard_cache: self.leaderboard_cache.clone(),
        }
    }
}

impl<R: ChainReader, S: ChainSigner> AppContext<R, S> {
    pub fn new(config: RiddlePayConfig, client: RiddlePayClient<R, S>) -> Self {
        Self {
            config: Arc::new(config),
            client: Arc::new(client),
            leaderboard_cache: LeaderboardCache::new(),
        }
    }

    pub fn config(&self) -> &RiddlePayConfig {
        &self.config
    }

    pub fn client(&self) -> &Arc<RiddlePayClient<R, S>> {
        &self.client
    }

    pub fn leaderboard_cache(&self) -> &LeaderboardCache {
        &self.leaderboard_cache
    }

    pub fn listing_options(&self) -> ListingOptions {
        ListingOptions::from(&self.config.aggregation)
    }

    /// Final snapshot of an account listing.
    pub async fn account_gifts(&self, account: Address) -> BlockchainResult<GiftListing> {
        collect_account_gifts(&self.client, account, &self.listing_options()).await
    }

    /// Stream listing snapshots; dropping the receiver cancels the load.
    pub async fn stream_account_gifts(
        &self,
        account: Address,
        tx: mpsc::UnboundedSender<GiftListing>,
    ) -> BlockchainResult<GiftListing> {
        stream_account_gifts(&self.client, account, &self.listing_options(), tx).await
    }

    pub async fn account_stats(&self, account: Address) -> BlockchainResult<AccountStats> {
        account_stats(&self.client, account, &self.listing_options()).await
    }

    /// Leaderboard, served from the cache while fresh.
    pub async fn leaderboard(&self) -> BlockchainResult<Arc<Leaderboard>> {
        let options = LeaderboardOptions::from(&self.config.leaderboard);
        self.leaderboard_cache
            .get_or_build(&self.client, &options)
            .await
    }

    pub async fn global_stats(&self) -> BlockchainResult<GlobalStats> {
        global_stats(&self.client, &TvlOptions::from(&self.config.tvl)).await
    }
}

impl AppContext<HybridProvider<RpcEndpoint>, SignerHandle> {
    /// Build the read-only handle and the facade from configuration.
    pub fn connect(config: RiddlePayConfig) -> BlockchainResult<Self> {
        let reader = connect_hybrid(&config.network)?;
        tracing::info!(
            fallback = %config.network.effective_fallback_url(),
            has_primary = reader.has_primary(),
            "Read-only handle ready"
        );
        let client = LiveClient::from_config(&config, Some(reader))?;
        Ok(Self::new(config, client))
    }

    /// Bind `wallet` as the signer, replacing any previous one.
    pub fn connect_wallet(&self, wallet: &Wallet) -> BlockchainResult<Address> {
        let handle = SignerHandle::connect(wallet, &self.config.network)?;
        let address = handle.address();
        self.client.connect_signer(handle);
        Ok(address)
    }

    /// Bind the wallet whose key is in the environment.
    pub fn connect_wallet_from_env(&self) -> BlockchainResult<Address> {
        self.connect_wallet(&Wallet::from_env()?)
    }
}
