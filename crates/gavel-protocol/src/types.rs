//! Identity types and closed enumerations shared by every layer.
//!
//! Everything here travels on the wire, so each type pins down its JSON
//! shape with serde attributes. Status-like fields are closed enums rather
//! than strings: an unknown status simply fails to deserialize.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::ProtocolError;

// ---------------------------------------------------------------------------
// Identity types
// ---------------------------------------------------------------------------

/// Internal identifier of a room. Clients address rooms by [`RoomCode`];
/// the numeric id only shows up in logs and snapshots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoomId(pub u64);

impl fmt::Display for RoomId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "R-{}", self.0)
    }
}

/// The short, human-shareable code of a room (e.g. `"K3Z9QA"`).
///
/// Codes are case-insensitive: [`RoomCode::parse`] upper-cases its input,
/// so `"k3z9qa"` and `"K3Z9QA"` name the same room. Deserialization goes
/// through the same normalization.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RoomCode(String);

impl RoomCode {
    /// Number of characters in a room code.
    pub const LEN: usize = 6;

    /// Characters a generated code is drawn from.
    pub const ALPHABET: &'static [u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

    /// Normalizes and validates a user-supplied code.
    ///
    /// # Errors
    /// Returns [`ProtocolError::InvalidMessage`] if the code is not exactly
    /// [`Self::LEN`] ASCII alphanumerics.
    pub fn parse(raw: &str) -> Result<Self, ProtocolError> {
        let code = raw.trim().to_ascii_uppercase();
        if code.len() != Self::LEN || !code.bytes().all(|b| b.is_ascii_alphanumeric()) {
            return Err(ProtocolError::InvalidMessage(format!(
                "room code must be {} letters or digits, got {raw:?}",
                Self::LEN
            )));
        }
        Ok(Self(code))
    }

    /// The normalized (upper-case) code.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for RoomCode {
    type Error = ProtocolError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<RoomCode> for String {
    fn from(code: RoomCode) -> Self {
        code.0
    }
}

impl fmt::Display for RoomCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Opaque identity handed to a participant when they create or join a
/// room. Clients echo it back on every intent.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub String);

impl UserId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Position of a player in the reference catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlayerId(pub u32);

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PL-{}", self.0)
    }
}

/// Amounts are integers in the smallest currency sub-unit (lakhs).
pub type Lakhs = u32;

// ---------------------------------------------------------------------------
// FranchiseCode
// ---------------------------------------------------------------------------

/// The closed set of franchises a member can claim.
///
/// Serialized as the upper-case code (`"CSK"`, `"PBKS"`, ...) and parsed
/// case-insensitively, on the wire too. `Ord` follows declaration order,
/// which is also the order used in listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE", try_from = "String")]
pub enum FranchiseCode {
    Csk,
    Mi,
    Rcb,
    Kkr,
    Srh,
    Rr,
    Dc,
    Pbks,
    Lsg,
    Gt,
}

impl FranchiseCode {
    /// Every franchise, in listing order.
    pub const ALL: [FranchiseCode; 10] = [
        Self::Csk,
        Self::Mi,
        Self::Rcb,
        Self::Kkr,
        Self::Srh,
        Self::Rr,
        Self::Dc,
        Self::Pbks,
        Self::Lsg,
        Self::Gt,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Csk => "CSK",
            Self::Mi => "MI",
            Self::Rcb => "RCB",
            Self::Kkr => "KKR",
            Self::Srh => "SRH",
            Self::Rr => "RR",
            Self::Dc => "DC",
            Self::Pbks => "PBKS",
            Self::Lsg => "LSG",
            Self::Gt => "GT",
        }
    }
}

impl FromStr for FranchiseCode {
    type Err = ProtocolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|code| code.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| ProtocolError::InvalidMessage(format!("unknown franchise code {s:?}")))
    }
}

impl TryFrom<String> for FranchiseCode {
    type Error = ProtocolError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl fmt::Display for FranchiseCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// RoomStatus
// ---------------------------------------------------------------------------

/// Lifecycle of a room.
///
/// ```text
/// Lobby → TeamSelection → Live ⇄ Paused
///                           │       │
///                           └─→ Ended ←┘
/// ```
///
/// `Ended` is terminal. `Paused → Ended` happens only when the last
/// franchise ends its bidding while the host has the auction paused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoomStatus {
    Lobby,
    TeamSelection,
    Live,
    Paused,
    Ended,
}

impl RoomStatus {
    /// Returns `true` if moving from `self` to `target` is a legal
    /// lifecycle transition.
    pub fn can_transition_to(self, target: Self) -> bool {
        matches!(
            (self, target),
            (Self::Lobby, Self::TeamSelection)
                | (Self::TeamSelection, Self::Live)
                | (Self::Live, Self::Paused)
                | (Self::Paused, Self::Live)
                | (Self::Live, Self::Ended)
                | (Self::Paused, Self::Ended)
        )
    }

    /// Whether the room has a player on the block (live or paused).
    pub fn is_auction_running(self) -> bool {
        matches!(self, Self::Live | Self::Paused)
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Ended)
    }
}

impl fmt::Display for RoomStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Lobby => "lobby",
            Self::TeamSelection => "team_selection",
            Self::Live => "live",
            Self::Paused => "paused",
            Self::Ended => "ended",
        };
        f.write_str(s)
    }
}

// ---------------------------------------------------------------------------
// Roles and statuses
// ---------------------------------------------------------------------------

/// What a member is allowed to do in a room.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum MemberRole {
    Host,
    #[default]
    Team,
    Spectator,
}

impl MemberRole {
    /// Hosts and team members take part in franchise selection.
    pub fn participates(self) -> bool {
        !matches!(self, Self::Spectator)
    }
}

/// Progress of one player through a room's auction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueueStatus {
    Queued,
    Auctioning,
    Sold,
    Unsold,
}

impl QueueStatus {
    pub fn is_settled(self) -> bool {
        matches!(self, Self::Sold | Self::Unsold)
    }
}

/// Playing role of a catalog player.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PlayerRole {
    Batsman,
    Bowler,
    #[serde(rename = "All-Rounder")]
    AllRounder,
    #[serde(rename = "Wicket-Keeper")]
    WicketKeeper,
}

// ---------------------------------------------------------------------------
// ErrorKind
// ---------------------------------------------------------------------------

/// Stable, machine-readable reason attached to every rejected intent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    NotFound,
    Forbidden,
    InvalidState,
    PreconditionFailed,
    NotYourTurn,
    TeamInactive,
    AmountMismatch,
    InsufficientPurse,
    SelfBid,
    OwnPlayer,
    VersionConflict,
    DeadlineExpired,
    DeadlineNotExpired,
    StaleAuction,
    BadRequest,
    Unavailable,
}

impl ErrorKind {
    /// HTTP-style status code for clients that branch on numbers.
    pub fn status_code(self) -> u16 {
        match self {
            Self::NotFound => 404,
            Self::Forbidden => 403,
            Self::VersionConflict => 409,
            Self::PreconditionFailed => 412,
            Self::Unavailable => 503,
            Self::InvalidState
            | Self::NotYourTurn
            | Self::TeamInactive
            | Self::AmountMismatch
            | Self::InsufficientPurse
            | Self::SelfBid
            | Self::OwnPlayer
            | Self::DeadlineExpired
            | Self::DeadlineNotExpired
            | Self::StaleAuction
            | Self::BadRequest => 400,
        }
    }
}
