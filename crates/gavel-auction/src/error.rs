//! Error type for the auction layer.

use gavel_protocol::{ErrorKind, FranchiseCode, Lakhs, PlayerId, RoomCode};

/// Why an intent was rejected.
///
/// Every variant maps onto one wire [`ErrorKind`] through
/// [`AuctionError::kind`]. A rejected intent never changes room state.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AuctionError {
    #[error("{0} not found")]
    NotFound(String),

    #[error("forbidden: {0}")]
    Forbidden(String),

    #[error("invalid state: {0}")]
    InvalidState(String),

    #[error("precondition failed: {0}")]
    PreconditionFailed(String),

    #[error("not your turn: {0}")]
    NotYourTurn(String),

    #[error("franchise {0} is not active for this player")]
    TeamInactive(FranchiseCode),

    #[error("bid must be exactly {expected}, got {amount}")]
    AmountMismatch { expected: Lakhs, amount: Lakhs },

    #[error("purse of {available} cannot cover a bid of {needed}")]
    InsufficientPurse { needed: Lakhs, available: Lakhs },

    #[error("franchise {0} already holds the highest bid")]
    SelfBid(FranchiseCode),

    #[error("franchise {0} already owns player {1}")]
    OwnPlayer(FranchiseCode, PlayerId),

    #[error("room version is {actual}, request expected {expected}")]
    VersionConflict { expected: u64, actual: u64 },

    #[error("bidding deadline has passed")]
    DeadlineExpired,

    #[error("bidding deadline not reached, {remaining_ms} ms left")]
    DeadlineNotExpired { remaining_ms: i64 },

    #[error("no auction in progress: {0}")]
    StaleAuction(String),

    #[error("bad request: {0}")]
    BadRequest(String),

    /// The room actor stopped or its queue is closed.
    #[error("room {0} is unavailable")]
    Unavailable(RoomCode),
}

impl AuctionError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::NotFound(_) => ErrorKind::NotFound,
            Self::Forbidden(_) => ErrorKind::Forbidden,
            Self::InvalidState(_) => ErrorKind::InvalidState,
            Self::PreconditionFailed(_) => ErrorKind::PreconditionFailed,
            Self::NotYourTurn(_) => ErrorKind::NotYourTurn,
            Self::TeamInactive(_) => ErrorKind::TeamInactive,
            Self::AmountMismatch { .. } => ErrorKind::AmountMismatch,
            Self::InsufficientPurse { .. } => ErrorKind::InsufficientPurse,
            Self::SelfBid(_) => ErrorKind::SelfBid,
            Self::OwnPlayer(..) => ErrorKind::OwnPlayer,
            Self::VersionConflict { .. } => ErrorKind::VersionConflict,
            Self::DeadlineExpired => ErrorKind::DeadlineExpired,
            Self::DeadlineNotExpired { .. } => ErrorKind::DeadlineNotExpired,
            Self::StaleAuction(_) => ErrorKind::StaleAuction,
            Self::BadRequest(_) => ErrorKind::BadRequest,
            Self::Unavailable(_) => ErrorKind::Unavailable,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_maps_every_bid_rejection() {
        assert_eq!(AuctionError::SelfBid(FranchiseCode::Mi).kind(), ErrorKind::SelfBid);
        assert_eq!(
            AuctionError::AmountMismatch { expected: 500, amount: 400 }.kind(),
            ErrorKind::AmountMismatch
        );
        assert_eq!(
            AuctionError::VersionConflict { expected: 1, actual: 2 }.kind(),
            ErrorKind::VersionConflict
        );
        assert_eq!(AuctionError::DeadlineExpired.kind(), ErrorKind::DeadlineExpired);
    }

    #[test]
    fn test_display_includes_detail() {
        let err = AuctionError::InsufficientPurse { needed: 1_500, available: 900 };
        assert_eq!(err.to_string(), "purse of 900 cannot cover a bid of 1500");
    }
}
