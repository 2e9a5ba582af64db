//! ABI of the gift contract and the fungible token, plus call encoding.

use alloy::network::TransactionBuilder;
use alloy::primitives::{Address, U256};
use alloy::rpc::types::TransactionRequest;
use alloy::sol;
use alloy::sol_types::SolCall;

use crate::blockchain::provider::ChainReader;
use crate::blockchain::types::BlockchainResult;

sol! {
    #[sol(all_derives)]
    interface IRiddlePay {
        struct Gift {
            address sender;
            address receiver;
            string riddle;
            bytes32 answerHash;
            string message;
            uint256 amount;
            address token;
            uint256 createdAt;
            uint256 unlockTime;
            uint256 expirationTime;
            bool claimed;
        }

        /// Emitted when a gift is created.
        event GiftCreated(
            uint256 indexed giftId,
            address indexed sender,
            address indexed receiver,
            uint256 amount,
            address token,
            uint256 unlockTime,
            string riddle
        );

        /// Emitted when a receiver claims a gift.
        event GiftClaimed(uint256 indexed giftId, address indexed receiver, uint256 amount, address token);

        /// Emitted when a sender recovers an expired gift.
        event GiftRefunded(uint256 indexed giftId, address indexed sender, uint256 amount, address token);

        function createGift(
            address receiver,
            string riddle,
            string answer,
            string message,
            uint256 amount,
            address token,
            uint256 unlockTime,
            uint256 expirationTime
        ) external payable returns (uint256 giftId);

        function bulkCreateGifts(
            address[] receivers,
            uint256[] amounts,
            address token,
            string message,
            uint256 unlockTime,
            uint256 expirationTime
        ) external payable;

        function claimGift(uint256 giftId, string answer) external;
        function refundGift(uint256 giftId) external;

        function getGift(uint256 giftId) external view returns (Gift gift);
        function giftCount() external view returns (uint256 count);
        function getUserGifts(address user) external view returns (uint256[] giftIds);
        function isExpired(uint256 giftId) external view returns (bool expired);
        function getTotalValueLocked() external view returns (uint256 totalNative, uint256 totalToken);
    }

    #[sol(all_derives)]
    interface IERC20 {
        function allowance(address owner, address spender) external view returns (uint256 remaining);
        function approve(address spender, uint256 amount) external returns (bool success);
    }
}

/// Build an `eth_call` request for a view function.
pub fn read_request<C: SolCall>(to: Address, call: &C) -> TransactionRequest {
    TransactionRequest::default()
        .with_to(to)
        .with_input(call.abi_encode())
}

/// Build a state-changing transaction from `from`, optionally carrying value.
pub fn write_request<C: SolCall>(from: Address, to: Address, call: &C, value: U256) -> TransactionRequest {
    let tx = TransactionRequest::default()
        .with_from(from)
        .with_to(to)
        .with_input(call.abi_encode());
    if value.is_zero() {
        tx
    } else {
        tx.with_value(value)
    }
}

/// Execute a view function and decode its return value.
pub async fn eth_call<R, C>(reader: &R, to: Address, call: &C) -> BlockchainResult<C::Return>
where
    R: ChainReader,
    C: SolCall,
{
    let output = reader.call(read_request(to, call)).await?;
    Ok(C::abi_decode_returns(&output)?)
}
