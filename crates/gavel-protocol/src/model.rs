//! Entity records and snapshot views.
//!
//! These are the shapes the engine stores and the shapes clients read.
//! Keeping one definition for both means a snapshot is a plain clone of
//! engine state, never a hand-maintained projection of it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{
    FranchiseCode, Lakhs, MemberRole, PlayerId, PlayerRole, QueueStatus, RoomCode, RoomId,
    RoomStatus, UserId,
};

/// The player currently on the block and when bidding on them closes.
///
/// Bundling both in one optional value is what keeps "current player" and
/// "current deadline" either both set or both absent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Lot {
    pub player_id: PlayerId,
    pub deadline: DateTime<Utc>,
}

/// A room aggregate's header.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Room {
    pub id: RoomId,
    pub code: RoomCode,
    pub name: String,
    pub status: RoomStatus,
    pub host: UserId,
    pub current: Option<Lot>,
    pub countdown_secs: u32,
    /// Bumped on every accepted bid, status transition and player advance.
    pub version: u64,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Member {
    pub user_id: UserId,
    pub display_name: String,
    pub role: MemberRole,
    /// 1-based turn order for franchise selection; `None` for spectators.
    pub selection_order: Option<u32>,
    pub joined_at: DateTime<Utc>,
}

/// A claimed franchise and its ledger counters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Team {
    pub franchise: FranchiseCode,
    pub owner: UserId,
    pub owner_name: String,
    pub selection_order: u32,
    pub purse_left: Lakhs,
    pub total_count: u32,
    pub overseas_count: u32,
    pub has_ended: bool,
}

/// A catalog entry. Read-only reference data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Player {
    pub id: PlayerId,
    pub name: String,
    pub role: PlayerRole,
    pub nationality: String,
    pub base_price: Lakhs,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rating: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
}

impl Player {
    /// Overseas means "not from the home nation"; compared case-insensitively.
    pub fn is_overseas(&self, home_nationality: &str) -> bool {
        !self.nationality.trim().eq_ignore_ascii_case(home_nationality.trim())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueueEntry {
    pub player_id: PlayerId,
    pub position: u32,
    pub status: QueueStatus,
}

impl QueueEntry {
    pub fn is_auctioning(&self) -> bool {
        self.status == QueueStatus::Auctioning
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Bid {
    pub player_id: PlayerId,
    pub franchise: FranchiseCode,
    pub amount: Lakhs,
    pub placed_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Skip {
    pub player_id: PlayerId,
    pub franchise: FranchiseCode,
    pub skipped_at: DateTime<Utc>,
}

/// Permanent award record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SquadPlayer {
    pub franchise: FranchiseCode,
    pub player_id: PlayerId,
    pub price: Lakhs,
    pub purchased_at: DateTime<Utc>,
}

/// How the player on the block was resolved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "result", rename_all = "snake_case", rename_all_fields = "camelCase")]
pub enum LotOutcome {
    Sold {
        player_id: PlayerId,
        franchise: FranchiseCode,
        price: Lakhs,
    },
    Unsold {
        player_id: PlayerId,
    },
    /// The player named in the request is no longer on the block.
    AlreadySettled,
}

// ---------------------------------------------------------------------------
// Snapshot views
// ---------------------------------------------------------------------------

/// Lobby / team-selection view of a room.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomSnapshot {
    pub room: Room,
    pub members: Vec<Member>,
    pub teams: Vec<Team>,
    pub current_player: Option<Player>,
}

/// A franchise together with the players it has won.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TeamSquad {
    #[serde(flatten)]
    pub team: Team,
    pub squad: Vec<SquadPlayer>,
}

/// Everything a bidding screen polls for.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuctionSnapshot {
    pub room: Room,
    pub current_player: Option<Player>,
    pub last_bid: Option<Bid>,
    pub bids: Vec<Bid>,
    pub skips: Vec<Skip>,
    pub teams: Vec<TeamSquad>,
    /// Franchises that may still bid on or skip the current player.
    pub active_franchises: Vec<FranchiseCode>,
    pub next_min_bid: Option<Lakhs>,
    /// `true` while the room is live.
    pub is_active: bool,
}

/// A squad entry joined with the catalog record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SquadEntry {
    pub price: Lakhs,
    pub purchased_at: DateTime<Utc>,
    pub player: Player,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TeamSummary {
    #[serde(flatten)]
    pub team: Team,
    pub players: Vec<SquadEntry>,
}

/// Post-auction view of every franchise.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Summary {
    pub room: Room,
    pub teams: Vec<TeamSummary>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_player(nationality: &str) -> Player {
        Player {
            id: PlayerId(3),
            name: "Test Player".into(),
            role: PlayerRole::Bowler,
            nationality: nationality.into(),
            base_price: 200,
            rating: None,
            image: None,
        }
    }

    #[test]
    fn test_player_is_overseas_compares_case_insensitively() {
        assert!(!sample_player("India").is_overseas("india"));
        assert!(sample_player("Australia").is_overseas("India"));
    }

    #[test]
    fn test_player_json_uses_camel_case_and_skips_missing_optionals() {
        let json = serde_json::to_value(sample_player("India")).unwrap();
        assert_eq!(json["basePrice"], 200);
        assert!(json.get("rating").is_none());
        assert!(json.get("image").is_none());
    }

    #[test]
    fn test_lot_outcome_is_tagged_by_result() {
        let sold = LotOutcome::Sold {
            player_id: PlayerId(1),
            franchise: FranchiseCode::Mi,
            price: 500,
        };
        let json = serde_json::to_value(&sold).unwrap();
        assert_eq!(json["result"], "sold");
        assert_eq!(json["playerId"], 1);
        assert_eq!(json["franchise"], "MI");

        let settled = serde_json::to_value(LotOutcome::AlreadySettled).unwrap();
        assert_eq!(settled["result"], "already_settled");
    }

    #[test]
    fn test_team_squad_flattens_team_fields() {
        let squad = TeamSquad {
            team: Team {
                franchise: FranchiseCode::Gt,
                owner: UserId::new("user_a"),
                owner_name: "A".into(),
                selection_order: 1,
                purse_left: 10_000,
                total_count: 0,
                overseas_count: 0,
                has_ended: false,
            },
            squad: vec![],
        };
        let json = serde_json::to_value(&squad).unwrap();
        assert_eq!(json["franchise"], "GT");
        assert_eq!(json["purseLeft"], 10_000);
        assert!(json["squad"].as_array().unwrap().is_empty());
    }
}
