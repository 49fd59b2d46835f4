//! Wire protocol for the Gavel auction server.
//!
//! - **Types** ([`RoomCode`], [`FranchiseCode`], [`RoomStatus`], ...): ids
//!   and closed enumerations shared by every layer.
//! - **Model** ([`Room`], [`Team`], [`AuctionSnapshot`], ...): entity
//!   records as the engine stores them and clients read them.
//! - **Messages** ([`Request`], [`Response`], [`Envelope`]): what travels
//!   over a connection.
//! - **Codec** ([`Codec`], [`JsonCodec`]): bytes in, values out.
//!
//! Nothing here knows about sockets or room actors.

mod codec;
mod error;
mod messages;
mod model;
mod types;

pub use codec::Codec;
#[cfg(feature = "json")]
pub use codec::JsonCodec;
pub use error::ProtocolError;
pub use messages::{Envelope, Payload, Request, Response};
pub use model::{
    AuctionSnapshot, Bid, Lot, LotOutcome, Member, Player, QueueEntry, Room, RoomSnapshot, Skip,
    SquadEntry, SquadPlayer, Summary, Team, TeamSquad, TeamSummary,
};
pub use types::{
    ErrorKind, FranchiseCode, Lakhs, MemberRole, PlayerId, PlayerRole, QueueStatus, RoomCode,
    RoomId, RoomStatus, UserId,
};
