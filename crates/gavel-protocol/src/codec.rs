//! Conversion between wire values and bytes.
//!
//! The server only ever talks to a [`Codec`], so the framing format can be
//! swapped without touching the handler. [`JsonCodec`] is the only
//! implementation today and is what browser clients speak.

use serde::{Serialize, de::DeserializeOwned};

use crate::ProtocolError;

/// Encodes values to bytes and decodes them back.
///
/// `Send + Sync + 'static` so one codec can be shared by every connection
/// task through an `Arc`.
pub trait Codec: Send + Sync + 'static {
    /// # Errors
    /// Returns [`ProtocolError::Encode`] if the value cannot be represented.
    fn encode<T: Serialize>(&self, value: &T) -> Result<Vec<u8>, ProtocolError>;

    /// # Errors
    /// Returns [`ProtocolError::Decode`] if the bytes are malformed or do
    /// not match `T`.
    fn decode<T: DeserializeOwned>(&self, data: &[u8]) -> Result<T, ProtocolError>;
}

/// JSON codec backed by `serde_json`. Enabled by the default `json` feature.
///
/// ```rust
/// use gavel_protocol::{Codec, Envelope, JsonCodec, Payload, Request};
///
/// let codec = JsonCodec;
/// let envelope = Envelope {
///     seq: 7,
///     timestamp: 1_000,
///     payload: Payload::Request(Request::Heartbeat { client_time: 42 }),
/// };
///
/// let bytes = codec.encode(&envelope).unwrap();
/// let decoded: Envelope = codec.decode(&bytes).unwrap();
/// assert_eq!(envelope, decoded);
/// ```
#[cfg(feature = "json")]
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

#[cfg(feature = "json")]
impl Codec for JsonCodec {
    fn encode<T: Serialize>(&self, value: &T) -> Result<Vec<u8>, ProtocolError> {
        serde_json::to_vec(value).map_err(ProtocolError::Encode)
    }

    fn decode<T: DeserializeOwned>(&self, data: &[u8]) -> Result<T, ProtocolError> {
        serde_json::from_slice(data).map_err(ProtocolError::Decode)
    }
}

#[cfg(all(test, feature = "json"))]
mod tests {
    use super::*;
    use crate::{Envelope, ErrorKind, Payload, Request, Response, RoomCode};

    #[test]
    fn test_json_codec_decodes_client_request_frame() {
        let raw = br#"{
            "seq": 3,
            "timestamp": 0,
            "payload": {
                "type": "Request",
                "data": { "type": "placeBid", "code": "ab12cd", "userId": "user_1", "amount": 500 }
            }
        }"#;

        let envelope: Envelope = JsonCodec.decode(raw).unwrap();
        assert_eq!(envelope.seq, 3);
        match envelope.payload {
            Payload::Request(Request::PlaceBid {
                code,
                amount,
                expected_version,
                ..
            }) => {
                assert_eq!(code, RoomCode::parse("AB12CD").unwrap());
                assert_eq!(amount, 500);
                assert_eq!(expected_version, None);
            }
            other => panic!("unexpected payload: {other:?}"),
        }
    }

    #[test]
    fn test_json_codec_rejects_unknown_franchise() {
        let raw = br#"{
            "seq": 1,
            "timestamp": 0,
            "payload": {
                "type": "Request",
                "data": { "type": "selectFranchise", "code": "AB12CD", "userId": "u", "franchise": "XYZ" }
            }
        }"#;

        let result: Result<Envelope, _> = JsonCodec.decode(raw);
        assert!(matches!(result, Err(ProtocolError::Decode(_))));
    }

    #[test]
    fn test_json_codec_encodes_error_response() {
        let envelope = Envelope {
            seq: 9,
            timestamp: 12,
            payload: Payload::Response(Response::error(ErrorKind::SelfBid, "already highest")),
        };

        let value: serde_json::Value =
            serde_json::from_slice(&JsonCodec.encode(&envelope).unwrap()).unwrap();
        assert_eq!(value["payload"]["type"], "Response");
        let data = &value["payload"]["data"];
        assert_eq!(data["type"], "error");
        assert_eq!(data["kind"], "self_bid");
        assert_eq!(data["code"], 400);
    }

    #[test]
    fn test_json_codec_reports_garbage_as_decode_error() {
        let result: Result<Envelope, _> = JsonCodec.decode(b"not json");
        assert!(matches!(result, Err(ProtocolError::Decode(_))));
    }
}
