//! Timeout enforcement.

use std::future::Future;
use std::time::Duration;

use crate::blockchain::types::{BlockchainError, BlockchainResult};

/// Run `fut` under a deadline, mapping expiry to [`BlockchainError::Timeout`].
///
/// The inner future is dropped on expiry; a request already on the wire is
/// not aborted, only its result is discarded.
pub async fn with_timeout<T, F>(limit: Duration, fut: F) -> BlockchainResult<T>
where
    F: Future<Output = BlockchainResult<T>>,
{
    match tokio::time::timeout(limit, fut).await {
        Ok(result) => result,
        Err(_) => Err(BlockchainError::Timeout(limit.as_millis() as u64)),
    }
}
