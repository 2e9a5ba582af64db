//! Chain-facing types and the caller-visible error taxonomy.

use alloy::transports::{RpcError, TransportError, TransportErrorKind};
use thiserror::Error;

pub use crate::config::schema::NetworkConfig;

/// JSON-RPC error codes providers use to signal throttling.
pub const RATE_LIMIT_CODES: &[i64] = &[429, -32005, -32029];

/// Message fragments providers use to signal throttling.
/// A bare status code is only trusted next to a word that marks it as one.
const RATE_LIMIT_MARKERS: &[&str] = &[
    "rate limit",
    "too many requests",
    "request limit",
    "status 429",
    "http 429",
    "error 429",
];

/// JSON-RPC code returned by nodes for `execution reverted`.
const EXECUTION_REVERTED_CODE: i64 = 3;

/// Errors that can occur during blockchain operations.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum BlockchainError {
    /// Client-side validation failed; nothing was sent to the network.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Token approval did not leave a sufficient allowance.
    #[error("Approval failed: {0}")]
    ApprovalFailed(String),

    /// Transaction or call was reverted on-chain.
    #[error("Transaction reverted: {0}")]
    Reverted(String),

    /// Still throttled after every retry attempt.
    #[error("Rate limit exceeded after {attempts} attempts, please wait and retry")]
    RateLimited { attempts: u32 },

    /// The handle an operation needs has not been constructed yet.
    #[error("Contract not initialized: {0}")]
    NotInitialized(String),

    /// A required configuration value is absent.
    #[error("Not configured: {0}")]
    NotConfigured(String),

    /// RPC connection or request failed.
    #[error("RPC error{}: {message}", .code.map(|c| format!(" ({c})")).unwrap_or_default())]
    Rpc { code: Option<i64>, message: String },

    /// Request did not complete within its deadline.
    #[error("Timed out after {0} ms")]
    Timeout(u64),

    /// Response bytes did not match the expected ABI.
    #[error("Decode error: {0}")]
    Decode(String),

    /// Invalid private key format or signing error.
    #[error("Wallet error: {0}")]
    Wallet(String),
}

impl BlockchainError {
    /// Build an RPC error without a code.
    pub fn rpc(message: impl Into<String>) -> Self {
        Self::Rpc {
            code: None,
            message: message.into(),
        }
    }

    /// Whether this error looks like provider-side throttling.
    pub fn is_rate_limit(&self) -> bool {
        match self {
            Self::Rpc { code, message } => {
                if code.is_some_and(|c| RATE_LIMIT_CODES.contains(&c)) {
                    return true;
                }
                let lower = message.to_lowercase();
                RATE_LIMIT_MARKERS.iter().any(|m| lower.contains(m))
            }
            Self::RateLimited { .. } => true,
            _ => false,
        }
    }
}

impl From<TransportError> for BlockchainError {
    fn from(err: TransportError) -> Self {
        match &err {
            RpcError::ErrorResp(payload) => {
                let message = payload.message.to_string();
                if payload.code == EXECUTION_REVERTED_CODE
                    || message.to_lowercase().contains("execution reverted")
                {
                    Self::Reverted(message)
                } else {
                    Self::Rpc {
                        code: Some(payload.code),
                        message,
                    }
                }
            }
            RpcError::Transport(TransportErrorKind::HttpError(http)) => Self::Rpc {
                code: Some(i64::from(http.status)),
                message: http.body.clone(),
            },
            _ => Self::rpc(err.to_string()),
        }
    }
}

impl From<alloy::sol_types::Error> for BlockchainError {
    fn from(err: alloy::sol_types::Error) -> Self {
        Self::Decode(err.to_string())
    }
}

/// Result type for blockchain operations.
pub type BlockchainResult<T> = Result<T, BlockchainError>;

/// Transaction confirmation status.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfirmationStatus {
    /// Transaction has been mined with required block depth.
    Confirmed { block_number: u64 },
    /// Transaction was mined but reverted, or was dropped.
    Failed(String),
}
