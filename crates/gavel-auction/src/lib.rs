//! The auction core of Gavel.
//!
//! - [`AuctionRoom`]: one room's state and every rule that mutates it
//!   (lifecycle, turn-ordered franchise selection, bid validation, skip
//!   consensus, awards).
//! - [`RoomHandle`]: talks to the Tokio task that owns a room.
//! - [`RoomManager`]: creates rooms and finds them by code.
//! - [`Catalog`]: the read-only list of auctionable players.
//!
//! Supporting pieces: the bid increment schedule in [`increment`], the
//! per-room stores ([`Membership`], [`PlayerQueue`], [`Ledger`]), and the
//! [`Clock`] the engine reads time from.

mod actor;
mod catalog;
mod clock;
mod config;
mod error;
pub mod identity;
pub mod increment;
mod ledger;
mod manager;
mod membership;
mod queue;
mod room;

pub use actor::RoomHandle;
pub use catalog::{Catalog, CatalogError, PlayerRecord};
pub use clock::{Clock, SystemClock};
pub use config::{AuctionConfig, FinalizeMode};
pub use error::AuctionError;
pub use ledger::Ledger;
pub use manager::{CreatedRoom, RoomManager};
pub use membership::Membership;
pub use queue::PlayerQueue;
pub use room::{AcceptedBid, AuctionRoom, BiddingEnded, FinalizeTrigger};
