//! RiddlePay command-line client.
//!
//! # Architecture Overview
//!
//! ```text
//!   riddlepay <command>
//!        │
//!        ▼
//!   config (TOML + RIDDLEPAY_* env) ──▶ AppContext
//!                                         │
//!              ┌──────────────────────────┼──────────────────────────┐
//!              ▼                          ▼                          ▼
//!        aggregation               gifts facade                 signer handle
//!   (listing, stats, tvl,     (validate, allowance,        (RIDDLEPAY_PRIVATE_KEY,
//!     leaderboard cache)        retry-with-backoff)          broadcast, confirm)
//!              │                          │                          │
//!              └──────────────┬───────────┘                          │
//!                             ▼                                      ▼
//!                  HybridProvider (primary, then fallback)     wallet endpoint
//! ```
//!
//! Every command prints JSON on stdout; logs go to stderr.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use serde::Serialize;
use serde_json::json;

use riddlepay::blockchain::BlockchainError;
use riddlepay::config::load_config;
use riddlepay::gifts::{unix_now, AssetKind, BulkGiftRequest, GiftRequest};
use riddlepay::observability::logging::init_logging;
use riddlepay::AppContext;

#[derive(Parser)]
#[command(name = "riddlepay")]
#[command(about = "Send, claim and inspect RiddlePay gifts", long_about = None)]
struct Cli {
    /// Path to a TOML config file
    #[arg(short, long, env = "RIDDLEPAY_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show one gift
    Gift { id: u64 },
    /// Number of gifts ever created
    Count,
    /// Gifts sent or received by an account, newest first
    List {
        account: String,
        /// Print every progressive snapshot instead of only the last
        #[arg(long)]
        progress: bool,
    },
    /// Dashboard statistics for an account
    Stats { account: String },
    /// Top creators and claimers over recent blocks
    Leaderboard,
    /// Gift count and total value locked
    Tvl,
    /// Whether the contract considers a gift expired
    Expired { id: u64 },
    /// Create a gift (needs RIDDLEPAY_PRIVATE_KEY)
    Send {
        receiver: String,
        amount: String,
        #[arg(long, default_value = "")]
        riddle: String,
        #[arg(long, default_value = "")]
        answer: String,
        #[arg(long, default_value = "")]
        message: String,
        /// Send the configured token instead of the native asset
        #[arg(long)]
        token: bool,
        #[arg(long, default_value_t = 0)]
        unlock_time: u64,
        #[arg(long, default_value_t = 0)]
        expiration_time: u64,
    },
    /// Create one gift per receiver (needs RIDDLEPAY_PRIVATE_KEY)
    Bulk {
        /// Comma-separated receivers
        #[arg(long, value_delimiter = ',', required = true)]
        receivers: Vec<String>,
        /// Comma-separated amounts, one per receiver
        #[arg(long, value_delimiter = ',', required = true)]
        amounts: Vec<String>,
        #[arg(long, default_value = "")]
        message: String,
        #[arg(long)]
        token: bool,
        #[arg(long, default_value_t = 0)]
        unlock_time: u64,
        #[arg(long, default_value_t = 0)]
        expiration_time: u64,
    },
    /// Claim a gift (needs RIDDLEPAY_PRIVATE_KEY)
    Claim {
        id: u64,
        #[arg(long, default_value = "")]
        answer: String,
    },
    /// Refund an expired gift (needs RIDDLEPAY_PRIVATE_KEY)
    Refund { id: u64 },
}

fn asset(token: bool) -> AssetKind {
    if token {
        AssetKind::Token
    } else {
        AssetKind::Native
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<(), Box<dyn std::error::Error>> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn parse_account(raw: &str) -> Result<alloy::primitives::Address, BlockchainError> {
    raw.trim()
        .parse()
        .map_err(|e| BlockchainError::InvalidInput(format!("invalid account '{}': {}", raw, e)))
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let config = load_config(cli.config.as_deref())?;
    init_logging(&config.observability);

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        contract = %config.network.contract_address,
        chain_id = config.network.chain_id,
        "riddlepay starting"
    );

    let ctx = AppContext::connect(config)?;
    let client = ctx.client();

    match cli.command {
        Commands::Gift { id } => {
            let gift = client.get_record(id).await?;
            let status = gift.status(unix_now());
            print_json(&json!({ "gift": gift, "status": status }))?;
        }
        Commands::Count => {
            print_json(&json!({ "count": client.get_record_count().await? }))?;
        }
        Commands::List { account, progress } => {
            let account = parse_account(&account)?;
            if progress {
                let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
                let load = ctx.stream_account_gifts(account, tx);
                let print = async {
                    while let Some(snapshot) = rx.recv().await {
                        if let Err(e) = print_json(&snapshot) {
                            tracing::warn!(error = %e, "Failed to print snapshot");
                        }
                    }
                };
                let (result, ()) = tokio::join!(load, print);
                result?;
            } else {
                print_json(&ctx.account_gifts(account).await?)?;
            }
        }
        Commands::Stats { account } => {
            print_json(&ctx.account_stats(parse_account(&account)?).await?)?;
        }
        Commands::Leaderboard => {
            print_json(ctx.leaderboard().await?.as_ref())?;
        }
        Commands::Tvl => {
            print_json(&ctx.global_stats().await?)?;
        }
        Commands::Expired { id } => {
            print_json(&json!({ "id": id, "expired": client.is_expired(id).await? }))?;
        }
        Commands::Send {
            receiver,
            amount,
            riddle,
            answer,
            message,
            token,
            unlock_time,
            expiration_time,
        } => {
            ctx.connect_wallet_from_env()?;
            let request = GiftRequest {
                receiver,
                riddle,
                answer,
                message,
                amount,
                asset: asset(token),
                unlock_time,
                expiration_time,
            };
            let hash = client.create_transfer(&request).await?;
            print_json(&json!({ "tx_hash": hash }))?;
        }
        Commands::Bulk {
            receivers,
            amounts,
            message,
            token,
            unlock_time,
            expiration_time,
        } => {
            ctx.connect_wallet_from_env()?;
            let request = BulkGiftRequest {
                receivers,
                amounts,
                asset: asset(token),
                message,
                unlock_time,
                expiration_time,
            };
            let hash = client.create_bulk_transfers(&request).await?;
            print_json(&json!({ "tx_hash": hash, "count": request.receivers.len() }))?;
        }
        Commands::Claim { id, answer } => {
            ctx.connect_wallet_from_env()?;
            let hash = client.claim(id, &answer).await?;
            print_json(&json!({ "tx_hash": hash }))?;
        }
        Commands::Refund { id } => {
            ctx.connect_wallet_from_env()?;
            let hash = client.refund(id).await?;
            print_json(&json!({ "tx_hash": hash }))?;
        }
    }

    Ok(())
}
