//! Gift contract facade.
//!
//! # Data Flow
//! ```text
//! GiftRequest / BulkGiftRequest
//!     → facade.rs (validation, no network)
//!     → allowance.rs (token gifts: read allowance, approve if short)
//!     → facade.rs (sign, broadcast, wait for confirmation)
//!
//! getGift / giftCount / getUserGifts / isExpired / getTotalValueLocked
//!     → facade.rs (read handle, else signer handle; retried)
//!     → types.rs (GiftRecord)
//! ```

pub mod allowance;
pub mod facade;
pub mod types;

pub use facade::{
    prepare_bulk, prepare_gift, BulkGiftRequest, ClientSettings, GiftRequest, RiddlePayClient,
    MAX_BULK_RECIPIENTS,
};
pub use types::{
    format_amount, parse_amount, unix_now, AssetKind, GiftRecord, GiftStatus, LockedTotals,
};
