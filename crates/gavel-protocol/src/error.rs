//! Error type for the protocol layer.

/// Errors raised while encoding, decoding, or validating wire values.
///
/// A decode failure is the client's fault (malformed frame, unknown
/// franchise code, missing field); the server answers it with a
/// `bad_request` error response instead of dropping the connection.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    #[cfg(feature = "json")]
    #[error("encode failed: {0}")]
    Encode(serde_json::Error),

    #[cfg(feature = "json")]
    #[error("decode failed: {0}")]
    Decode(serde_json::Error),

    /// The value deserialized but breaks a protocol rule, e.g. a room code
    /// of the wrong length.
    #[error("invalid message: {0}")]
    InvalidMessage(String),
}
