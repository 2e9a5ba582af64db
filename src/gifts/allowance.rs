//! Token spending approval.

use alloy::primitives::{Address, TxHash, U256};

use crate::blockchain::contract::IERC20;
use crate::blockchain::provider::{ChainReader, ChainSigner};
use crate::blockchain::types::{BlockchainError, BlockchainResult};
use crate::gifts::facade::RiddlePayClient;

/// Approvals cover this many multiples of the requested amount so that
/// follow-up gifts skip the approval round trip.
pub const APPROVAL_MULTIPLIER: u64 = 10;

impl<R: ChainReader, S: ChainSigner> RiddlePayClient<R, S> {
    /// Current allowance granted by `owner` to the gift contract.
    pub async fn get_allowance(&self, token: Address, owner: Address) -> BlockchainResult<U256> {
        self.read_at(
            "allowance",
            token,
            IERC20::allowanceCall {
                owner,
                spender: self.contract(),
            },
        )
        .await
    }

    /// Make sure the contract may spend `required` of `token` on behalf of
    /// the signer. Returns the approval hash when one was sent.
    pub(crate) async fn ensure_allowance(
        &self,
        signer: &S,
        token: Address,
        required: U256,
    ) -> BlockchainResult<Option<TxHash>> {
        let owner = signer.address();
        let current = self.get_allowance(token, owner).await?;
        if current >= required {
            tracing::debug!(%token, %current, %required, "Allowance sufficient");
            return Ok(None);
        }

        let amount = required.saturating_mul(U256::from(APPROVAL_MULTIPLIER));
        tracing::info!(%token, %current, %required, approving = %amount, "Approving token spend");

        let call = IERC20::approveCall {
            spender: self.contract(),
            amount,
        };
        let hash = self
            .submit(signer, "approve", token, call, U256::ZERO)
            .await
            .map_err(|e| match e {
                BlockchainError::RateLimited { .. } => e,
                other => BlockchainError::ApprovalFailed(other.to_string()),
            })?;

        let updated = self.get_allowance(token, owner).await?;
        if updated < required {
            return Err(BlockchainError::ApprovalFailed(format!(
                "allowance is {} after approval, {} required",
                updated, required
            )));
        }
        Ok(Some(hash))
    }
}
