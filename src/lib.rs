//! RiddlePay core library
//!
//! Typed access to the RiddlePay gift contract: endpoint failover,
//! rate-limit retries, a read/write facade and best-effort aggregated views.

pub mod aggregation;
pub mod blockchain;
pub mod config;
pub mod context;
pub mod gifts;
pub mod observability;
pub mod resilience;

pub use blockchain::{BlockchainError, BlockchainResult};
pub use config::schema::RiddlePayConfig;
pub use context::{AppContext, LiveClient};
pub use gifts::{GiftRecord, RiddlePayClient};
