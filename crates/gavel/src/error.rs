//! Unified error type for the Gavel server.

use gavel_auction::{AuctionError, CatalogError};
use gavel_protocol::ProtocolError;

use crate::settings::SettingsError;
use crate::transport::TransportError;

/// Top-level error wrapping every crate-specific error.
///
/// Intent rejections ([`AuctionError`]) normally travel back to the client
/// as error responses; they only surface here when server setup fails.
#[derive(Debug, thiserror::Error)]
pub enum GavelError {
    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    #[error(transparent)]
    Auction(#[from] AuctionError),

    #[error(transparent)]
    Catalog(#[from] CatalogError),

    #[error(transparent)]
    Settings(#[from] SettingsError),
}
