//! # Gavel
//!
//! WebSocket server for multiplayer sports-auction rooms.
//!
//! A host creates a room and shares its six-character code; members join,
//! claim franchises in turn order, then bid on a shuffled player list
//! against a per-player countdown. Each room is owned by its own Tokio task
//! (see [`gavel_auction`]); this crate accepts connections and routes
//! request envelopes to those tasks.
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use gavel::prelude::*;
//!
//! # async fn start() -> Result<(), GavelError> {
//! let settings = ServerSettings::from_env()?;
//! let server = GavelServerBuilder::from_settings(&settings)?.build().await?;
//! server.run().await
//! # }
//! ```

#![allow(async_fn_in_trait)]

mod error;
mod handler;
mod server;
pub mod settings;
pub mod transport;

pub use error::GavelError;
pub use server::{GavelServer, GavelServerBuilder};
pub use settings::{ServerSettings, SettingsError};

/// Everything needed to start a server or speak its protocol.
pub mod prelude {
    pub use crate::{GavelError, GavelServer, GavelServerBuilder, ServerSettings, SettingsError};
    pub use gavel_auction::{AuctionConfig, Catalog, Clock, FinalizeMode, SystemClock};
    pub use gavel_protocol::{
        Codec, Envelope, ErrorKind, FranchiseCode, JsonCodec, LotOutcome, Payload, Request,
        Response, RoomCode, RoomStatus, UserId,
    };
}
