//! Blockchain integration subsystem.
//!
//! # Data Flow
//! ```text
//! NetworkConfig (primary URL, fallback URL)
//!     → client.rs (one RpcEndpoint per URL, per-request timeout)
//!     → provider.rs (HybridProvider: primary, then fallback once)
//!
//! RIDDLEPAY_PRIVATE_KEY
//!     → wallet.rs (key loading)
//!     → transaction.rs (SignerHandle: broadcast, confirm)
//!
//! contract.rs encodes calls for both handles.
//! ```
//!
//! # Security Constraints
//! - Private keys ONLY from environment variables
//! - Never log private keys or sensitive data
//! - All RPC calls have configurable timeouts

pub mod client;
pub mod contract;
pub mod provider;
pub mod transaction;
pub mod types;
pub mod wallet;

pub use client::{connect_hybrid, RpcEndpoint};
pub use provider::{ChainReader, ChainSigner, HybridProvider};
pub use transaction::SignerHandle;
pub use types::{BlockchainError, BlockchainResult, ConfirmationStatus};
pub use wallet::Wallet;
