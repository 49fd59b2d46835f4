//! Auction rules and how deadlines are enforced.

use serde::{Deserialize, Serialize};
use tracing::warn;

use gavel_protocol::{FranchiseCode, Lakhs};

/// Who settles a player once its bidding deadline passes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FinalizeMode {
    /// The room actor arms a timer and settles the player itself.
    #[default]
    Scheduled,
    /// Nothing happens until a client sends `finalize` after the deadline.
    Lazy,
}

/// Per-room auction rules.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AuctionConfig {
    /// Purse every franchise starts with.
    pub starting_purse: Lakhs,
    /// Squad size a franchise must reach before it may end its bidding.
    pub team_min: u32,
    /// Squad size cap; a full franchise is no longer active.
    pub team_max: u32,
    /// Cap on overseas players, enforced when a player is awarded.
    pub max_overseas: u32,
    /// Non-spectator members needed before team selection can start.
    pub min_members_to_start: usize,
    /// Claimed franchises needed before the auction can start.
    pub min_franchises_to_start: usize,
    /// Bidding window per player, restarted by every accepted bid.
    pub countdown_secs: u32,
    /// Players from any other nation count as overseas.
    pub home_nationality: String,
    pub finalize_mode: FinalizeMode,
    /// How long an ended room keeps answering reads before its actor stops
    /// and the registry may drop it.
    pub ended_linger_secs: u32,
}

impl Default for AuctionConfig {
    fn default() -> Self {
        Self {
            starting_purse: 10_000,
            team_min: 15,
            team_max: 20,
            max_overseas: 8,
            min_members_to_start: 2,
            min_franchises_to_start: 2,
            countdown_secs: 30,
            home_nationality: "India".to_owned(),
            finalize_mode: FinalizeMode::Scheduled,
            ended_linger_secs: 600,
        }
    }
}

impl AuctionConfig {
    /// Longest countdown accepted; anything above is clamped.
    pub const MAX_COUNTDOWN_SECS: u32 = 3_600;

    /// Clamps out-of-range values so every room runs on a coherent rule set.
    ///
    /// - `team_max` is at least 1 and `team_min` at most `team_max`.
    /// - `max_overseas` at most `team_max`.
    /// - `countdown_secs` within `1..=MAX_COUNTDOWN_SECS`.
    /// - Start thresholds within `1..=` the number of franchises.
    pub fn validated(mut self) -> Self {
        let franchises = FranchiseCode::ALL.len();

        if self.team_max == 0 {
            warn!("team_max is 0, raising to 1");
            self.team_max = 1;
        }
        if self.team_min > self.team_max {
            warn!(
                team_min = self.team_min,
                team_max = self.team_max,
                "team_min exceeds team_max, clamping"
            );
            self.team_min = self.team_max;
        }
        if self.max_overseas > self.team_max {
            warn!(
                max_overseas = self.max_overseas,
                team_max = self.team_max,
                "max_overseas exceeds team_max, clamping"
            );
            self.max_overseas = self.team_max;
        }
        let countdown = self.countdown_secs.clamp(1, Self::MAX_COUNTDOWN_SECS);
        if countdown != self.countdown_secs {
            warn!(
                requested = self.countdown_secs,
                clamped = countdown,
                "countdown_secs out of range, clamping"
            );
            self.countdown_secs = countdown;
        }
        let members = self.min_members_to_start.clamp(1, franchises);
        if members != self.min_members_to_start {
            warn!(
                requested = self.min_members_to_start,
                clamped = members,
                "min_members_to_start out of range"
            );
            self.min_members_to_start = members;
        }
        let teams = self.min_franchises_to_start.clamp(1, franchises);
        if teams != self.min_franchises_to_start {
            warn!(
                requested = self.min_franchises_to_start,
                clamped = teams,
                "min_franchises_to_start out of range"
            );
            self.min_franchises_to_start = teams;
        }
        if self.home_nationality.trim().is_empty() {
            warn!("home_nationality is empty, every player will count as overseas");
        }
        self
    }

    pub fn with_countdown(mut self, secs: u32) -> Self {
        self.countdown_secs = secs;
        self
    }

    pub fn with_finalize_mode(mut self, mode: FinalizeMode) -> Self {
        self.finalize_mode = mode;
        self
    }

    pub fn with_ended_linger(mut self, secs: u32) -> Self {
        self.ended_linger_secs = secs;
        self
    }

    pub fn ended_linger(&self) -> std::time::Duration {
        std::time::Duration::from_secs(u64::from(self.ended_linger_secs))
    }

    pub fn countdown(&self) -> chrono::Duration {
        chrono::Duration::seconds(i64::from(self.countdown_secs))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_matches_house_rules() {
        let config = AuctionConfig::default();
        assert_eq!(config.starting_purse, 10_000);
        assert_eq!(config.team_min, 15);
        assert_eq!(config.team_max, 20);
        assert_eq!(config.max_overseas, 8);
        assert_eq!(config.countdown_secs, 30);
        assert_eq!(config.finalize_mode, FinalizeMode::Scheduled);
        assert_eq!(config.ended_linger(), std::time::Duration::from_secs(600));
    }

    #[test]
    fn test_validated_clamps_inconsistent_values() {
        let config = AuctionConfig {
            team_min: 25,
            team_max: 20,
            max_overseas: 30,
            countdown_secs: 0,
            min_members_to_start: 50,
            min_franchises_to_start: 0,
            ..AuctionConfig::default()
        }
        .validated();

        assert_eq!(config.team_min, 20);
        assert_eq!(config.max_overseas, 20);
        assert_eq!(config.countdown_secs, 1);
        assert_eq!(config.min_members_to_start, 10);
        assert_eq!(config.min_franchises_to_start, 1);
    }

    #[test]
    fn test_validated_keeps_sane_config_unchanged() {
        let config = AuctionConfig::default();
        assert_eq!(config.clone().validated(), config);
    }

    #[test]
    fn test_config_deserializes_partial_json() {
        let config: AuctionConfig =
            serde_json::from_str(r#"{"countdown_secs": 10, "finalize_mode": "lazy"}"#).unwrap();
        assert_eq!(config.countdown_secs, 10);
        assert_eq!(config.finalize_mode, FinalizeMode::Lazy);
        assert_eq!(config.team_max, 20);
    }
}
