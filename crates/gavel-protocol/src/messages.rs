//! Intents, results, and the envelope that carries them.
//!
//! Every client frame is an [`Envelope`] holding a [`Request`]; the server
//! answers each one with exactly one [`Envelope`] holding a [`Response`]
//! under the same `seq`. There is no server push: clients poll
//! `getRoom` / `getAuction` to observe what other members did.
//!
//! ```text
//! { "seq": 4, "timestamp": 0,
//!   "payload": { "type": "Request",
//!                "data": { "type": "placeBid", "code": "K3Z9QA",
//!                          "userId": "user_…", "amount": 7500,
//!                          "expectedVersion": 12 } } }
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{
    AuctionSnapshot, Bid, ErrorKind, FranchiseCode, Lakhs, LotOutcome, Member, MemberRole,
    PlayerId, Room, RoomCode, RoomSnapshot, Skip, Summary, Team, UserId,
};

/// A client intent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum Request {
    CreateRoom {
        room_name: String,
        display_name: String,
    },
    /// Joins as a new member, or rejoins when `user_id` names an existing one.
    JoinRoom {
        code: RoomCode,
        display_name: String,
        #[serde(default)]
        role: Option<MemberRole>,
        #[serde(default)]
        user_id: Option<UserId>,
    },
    GetRoom {
        code: RoomCode,
    },
    StartTeamSelection {
        code: RoomCode,
        user_id: UserId,
    },
    SelectFranchise {
        code: RoomCode,
        user_id: UserId,
        franchise: FranchiseCode,
    },
    /// Completes team selection and puts the first player on the block.
    StartAuction {
        code: RoomCode,
        user_id: UserId,
    },
    Pause {
        code: RoomCode,
        user_id: UserId,
    },
    Resume {
        code: RoomCode,
        user_id: UserId,
    },
    GetAuction {
        code: RoomCode,
    },
    PlaceBid {
        code: RoomCode,
        user_id: UserId,
        amount: Lakhs,
        /// Room version the client last saw; a mismatch is rejected.
        #[serde(default)]
        expected_version: Option<u64>,
    },
    Skip {
        code: RoomCode,
        user_id: UserId,
    },
    /// Settles the current player once its deadline has passed.
    Finalize {
        code: RoomCode,
        #[serde(default)]
        player_id: Option<PlayerId>,
    },
    EndBidding {
        code: RoomCode,
        user_id: UserId,
    },
    GetSummary {
        code: RoomCode,
    },
    Heartbeat {
        client_time: u64,
    },
}

impl Request {
    /// The room this intent addresses, if any.
    pub fn room_code(&self) -> Option<&RoomCode> {
        match self {
            Self::CreateRoom { .. } | Self::Heartbeat { .. } => None,
            Self::JoinRoom { code, .. }
            | Self::GetRoom { code }
            | Self::StartTeamSelection { code, .. }
            | Self::SelectFranchise { code, .. }
            | Self::StartAuction { code, .. }
            | Self::Pause { code, .. }
            | Self::Resume { code, .. }
            | Self::GetAuction { code }
            | Self::PlaceBid { code, .. }
            | Self::Skip { code, .. }
            | Self::Finalize { code, .. }
            | Self::EndBidding { code, .. }
            | Self::GetSummary { code } => Some(code),
        }
    }

    /// Short name used in log fields.
    pub fn name(&self) -> &'static str {
        match self {
            Self::CreateRoom { .. } => "create_room",
            Self::JoinRoom { .. } => "join_room",
            Self::GetRoom { .. } => "get_room",
            Self::StartTeamSelection { .. } => "start_team_selection",
            Self::SelectFranchise { .. } => "select_franchise",
            Self::StartAuction { .. } => "start_auction",
            Self::Pause { .. } => "pause",
            Self::Resume { .. } => "resume",
            Self::GetAuction { .. } => "get_auction",
            Self::PlaceBid { .. } => "place_bid",
            Self::Skip { .. } => "skip",
            Self::Finalize { .. } => "finalize",
            Self::EndBidding { .. } => "end_bidding",
            Self::GetSummary { .. } => "get_summary",
            Self::Heartbeat { .. } => "heartbeat",
        }
    }
}

/// The server's answer to one [`Request`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum Response {
    RoomCreated {
        room: Room,
        user_id: UserId,
        member: Member,
    },
    Joined {
        room: Room,
        user_id: UserId,
        member: Member,
        rejoined: bool,
    },
    Room(RoomSnapshot),
    /// A lifecycle transition succeeded; carries the updated room header.
    Transitioned {
        room: Room,
    },
    FranchiseSelected {
        team: Team,
    },
    Auction(Box<AuctionSnapshot>),
    BidAccepted {
        bid: Bid,
        deadline: DateTime<Utc>,
        version: u64,
    },
    /// `outcome` is set when this skip completed a consensus.
    Skipped {
        skip: Skip,
        outcome: Option<LotOutcome>,
    },
    Finalized {
        outcome: LotOutcome,
    },
    BiddingEnded {
        team: Team,
        room_ended: bool,
    },
    Summary(Summary),
    HeartbeatAck {
        client_time: u64,
        server_time: u64,
    },
    Error {
        kind: ErrorKind,
        /// HTTP-style status derived from `kind`.
        code: u16,
        message: String,
    },
}

impl Response {
    pub fn error(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self::Error {
            kind,
            code: kind.status_code(),
            message: message.into(),
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Self::Error { .. })
    }
}

/// Direction-tagged content of an [`Envelope`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum Payload {
    Request(Request),
    Response(Response),
}

/// The top-level frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    /// Chosen by the client; echoed on the reply so it can match answers
    /// to questions.
    pub seq: u64,
    /// Milliseconds since the sender started.
    pub timestamp: u64,
    pub payload: Payload,
}

impl Envelope {
    /// Builds the reply to a request carrying `seq`.
    pub fn reply(seq: u64, timestamp: u64, response: Response) -> Self {
        Self {
            seq,
            timestamp,
            payload: Payload::Response(response),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_tags_are_camel_case() {
        let req = Request::StartTeamSelection {
            code: RoomCode::parse("ABCDEF").unwrap(),
            user_id: UserId::new("user_1"),
        };
        let json = serde_json::to_value(&req).unwrap();
        assert_eq!(json["type"], "startTeamSelection");
        assert_eq!(json["userId"], "user_1");
        assert_eq!(json["code"], "ABCDEF");
    }

    #[test]
    fn test_join_request_optional_fields_default_to_none() {
        let req: Request =
            serde_json::from_str(r#"{"type":"joinRoom","code":"abcdef","displayName":"Ana"}"#)
                .unwrap();
        assert_eq!(
            req,
            Request::JoinRoom {
                code: RoomCode::parse("ABCDEF").unwrap(),
                display_name: "Ana".into(),
                role: None,
                user_id: None,
            }
        );
    }

    #[test]
    fn test_request_room_code_is_none_for_room_less_intents() {
        assert!(Request::Heartbeat { client_time: 1 }.room_code().is_none());
        let create = Request::CreateRoom {
            room_name: "Final".into(),
            display_name: "Host".into(),
        };
        assert!(create.room_code().is_none());
        assert_eq!(create.name(), "create_room");
    }

    #[test]
    fn test_response_error_carries_status_code() {
        let resp = Response::error(ErrorKind::VersionConflict, "stale");
        assert!(resp.is_error());
        let json = serde_json::to_value(&resp).unwrap();
        assert_eq!(json["type"], "error");
        assert_eq!(json["kind"], "version_conflict");
        assert_eq!(json["code"], 409);
        assert_eq!(json["message"], "stale");
    }

    #[test]
    fn test_heartbeat_ack_fields_are_camel_case() {
        let json = serde_json::to_value(Response::HeartbeatAck {
            client_time: 5,
            server_time: 6,
        })
        .unwrap();
        assert_eq!(json["type"], "heartbeatAck");
        assert_eq!(json["clientTime"], 5);
        assert_eq!(json["serverTime"], 6);
    }

    #[test]
    fn test_envelope_reply_wraps_response() {
        let env = Envelope::reply(11, 0, Response::HeartbeatAck {
            client_time: 1,
            server_time: 2,
        });
        assert_eq!(env.seq, 11);
        assert!(matches!(env.payload, Payload::Response(_)));
    }
}
