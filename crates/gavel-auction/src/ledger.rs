//! Bid, skip, and squad ledgers for one room.
//!
//! Bids and squad entries are append-only. Skips are the only records
//! ever removed, and only in bulk per player once that player settles.

use std::collections::{BTreeMap, HashMap};

use gavel_protocol::{Bid, FranchiseCode, Lakhs, PlayerId, Skip, SquadPlayer};

#[derive(Debug, Clone, Default)]
pub struct Ledger {
    bids: Vec<Bid>,
    skips: HashMap<PlayerId, BTreeMap<FranchiseCode, Skip>>,
    squads: Vec<SquadPlayer>,
}

impl Ledger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_bid(&mut self, bid: Bid) {
        self.bids.push(bid);
    }

    /// Most recent bid on `player_id`.
    pub fn last_bid(&self, player_id: PlayerId) -> Option<&Bid> {
        self.bids.iter().rev().find(|b| b.player_id == player_id)
    }

    /// Bids on `player_id` in acceptance order.
    pub fn bids_for(&self, player_id: PlayerId) -> impl Iterator<Item = &Bid> {
        self.bids.iter().filter(move |b| b.player_id == player_id)
    }

    /// Records a skip. A second skip by the same franchise keeps the first.
    ///
    /// Returns the stored skip and whether it was newly added.
    pub fn add_skip(&mut self, skip: Skip) -> (Skip, bool) {
        let by_franchise = self.skips.entry(skip.player_id).or_default();
        match by_franchise.get(&skip.franchise) {
            Some(existing) => (existing.clone(), false),
            None => {
                by_franchise.insert(skip.franchise, skip.clone());
                (skip, true)
            }
        }
    }

    pub fn has_skipped(&self, player_id: PlayerId, franchise: FranchiseCode) -> bool {
        self.skips
            .get(&player_id)
            .is_some_and(|s| s.contains_key(&franchise))
    }

    pub fn skips_for(&self, player_id: PlayerId) -> impl Iterator<Item = &Skip> {
        self.skips.get(&player_id).into_iter().flat_map(|s| s.values())
    }

    pub fn clear_skips(&mut self, player_id: PlayerId) {
        self.skips.remove(&player_id);
    }

    pub fn award(&mut self, entry: SquadPlayer) {
        self.squads.push(entry);
    }

    /// Players won by `franchise`, in award order.
    pub fn squad_of(&self, franchise: FranchiseCode) -> impl Iterator<Item = &SquadPlayer> {
        self.squads.iter().filter(move |s| s.franchise == franchise)
    }

    pub fn owns(&self, franchise: FranchiseCode, player_id: PlayerId) -> bool {
        self.squad_of(franchise).any(|s| s.player_id == player_id)
    }

    /// Total paid by `franchise` across its squad.
    pub fn spent_by(&self, franchise: FranchiseCode) -> Lakhs {
        self.squad_of(franchise).map(|s| s.price).sum()
    }

    pub fn squads(&self) -> &[SquadPlayer] {
        &self.squads
    }
}

#[cfg(test)]
mod tests {
    use chrono::{DateTime, Utc};

    use super::*;

    fn at(secs: i64) -> DateTime<Utc> {
        DateTime::from_timestamp(1_700_000_000 + secs, 0).unwrap()
    }

    fn bid(player: u32, franchise: FranchiseCode, amount: Lakhs, secs: i64) -> Bid {
        Bid {
            player_id: PlayerId(player),
            franchise,
            amount,
            placed_at: at(secs),
        }
    }

    #[test]
    fn test_last_bid_is_most_recent_for_player() {
        let mut ledger = Ledger::new();
        ledger.record_bid(bid(1, FranchiseCode::Mi, 500, 0));
        ledger.record_bid(bid(1, FranchiseCode::Csk, 1_000, 1));
        ledger.record_bid(bid(2, FranchiseCode::Mi, 500, 2));

        assert_eq!(ledger.last_bid(PlayerId(1)).unwrap().amount, 1_000);
        assert_eq!(ledger.bids_for(PlayerId(1)).count(), 2);
        assert!(ledger.last_bid(PlayerId(3)).is_none());
    }

    #[test]
    fn test_add_skip_is_idempotent() {
        let mut ledger = Ledger::new();
        let first = Skip {
            player_id: PlayerId(4),
            franchise: FranchiseCode::Dc,
            skipped_at: at(0),
        };
        let again = Skip {
            skipped_at: at(5),
            ..first.clone()
        };

        assert!(ledger.add_skip(first.clone()).1);
        let (stored, added) = ledger.add_skip(again);
        assert!(!added);
        assert_eq!(stored, first);
        assert_eq!(ledger.skips_for(PlayerId(4)).count(), 1);
    }

    #[test]
    fn test_clear_skips_only_touches_one_player() {
        let mut ledger = Ledger::new();
        for player in [1, 2] {
            ledger.add_skip(Skip {
                player_id: PlayerId(player),
                franchise: FranchiseCode::Rr,
                skipped_at: at(0),
            });
        }
        ledger.clear_skips(PlayerId(1));
        assert!(!ledger.has_skipped(PlayerId(1), FranchiseCode::Rr));
        assert!(ledger.has_skipped(PlayerId(2), FranchiseCode::Rr));
    }

    #[test]
    fn test_squad_queries() {
        let mut ledger = Ledger::new();
        ledger.award(SquadPlayer {
            franchise: FranchiseCode::Kkr,
            player_id: PlayerId(9),
            price: 1_500,
            purchased_at: at(0),
        });
        ledger.award(SquadPlayer {
            franchise: FranchiseCode::Kkr,
            player_id: PlayerId(3),
            price: 500,
            purchased_at: at(1),
        });

        assert!(ledger.owns(FranchiseCode::Kkr, PlayerId(9)));
        assert!(!ledger.owns(FranchiseCode::Srh, PlayerId(9)));
        assert_eq!(ledger.spent_by(FranchiseCode::Kkr), 2_000);
        assert_eq!(ledger.squads().len(), 2);
    }
}
