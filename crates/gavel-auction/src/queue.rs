//! Per-room player queue.

use rand::Rng;
use rand::seq::SliceRandom;

use gavel_protocol::{Player, PlayerId, QueueEntry, QueueStatus};

/// Shuffled order in which players come up for auction.
///
/// At most one entry is `Auctioning` at any time: [`start_next`] only
/// promotes an entry when none is on the block.
///
/// [`start_next`]: PlayerQueue::start_next
#[derive(Debug, Clone, Default)]
pub struct PlayerQueue {
    entries: Vec<QueueEntry>,
}

impl PlayerQueue {
    /// Uniformly shuffles `players` into a fresh queue, every entry `Queued`.
    pub fn shuffled<R: Rng + ?Sized>(players: &[Player], rng: &mut R) -> Self {
        let mut ids: Vec<PlayerId> = players.iter().map(|p| p.id).collect();
        ids.shuffle(rng);
        let entries = ids
            .into_iter()
            .zip(1u32..)
            .map(|(player_id, position)| QueueEntry {
                player_id,
                position,
                status: QueueStatus::Queued,
            })
            .collect();
        Self { entries }
    }

    /// Promotes the lowest-positioned queued entry to `Auctioning`.
    ///
    /// Returns `None` when nothing is queued, or when a player is already
    /// on the block.
    pub fn start_next(&mut self) -> Option<PlayerId> {
        if self.current().is_some() {
            return None;
        }
        let entry = self
            .entries
            .iter_mut()
            .find(|e| e.status == QueueStatus::Queued)?;
        entry.status = QueueStatus::Auctioning;
        Some(entry.player_id)
    }

    /// The player on the block.
    pub fn current(&self) -> Option<PlayerId> {
        self.entries
            .iter()
            .find(|e| e.is_auctioning())
            .map(|e| e.player_id)
    }

    /// Moves the auctioning entry for `player_id` to a settled status.
    ///
    /// Returns `false` (and changes nothing) if that player is not on the
    /// block.
    pub fn settle(&mut self, player_id: PlayerId, status: QueueStatus) -> bool {
        debug_assert!(status.is_settled());
        match self
            .entries
            .iter_mut()
            .find(|e| e.player_id == player_id && e.is_auctioning())
        {
            Some(entry) => {
                entry.status = status;
                true
            }
            None => false,
        }
    }

    /// Entries still waiting their turn.
    pub fn remaining(&self) -> usize {
        self.entries
            .iter()
            .filter(|e| e.status == QueueStatus::Queued)
            .count()
    }

    pub fn status_of(&self, player_id: PlayerId) -> Option<QueueStatus> {
        self.entries
            .iter()
            .find(|e| e.player_id == player_id)
            .map(|e| e.status)
    }

    pub fn entries(&self) -> &[QueueEntry] {
        &self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    use super::*;
    use crate::Catalog;

    fn queue() -> PlayerQueue {
        let catalog = Catalog::builtin();
        PlayerQueue::shuffled(catalog.players(), &mut StdRng::seed_from_u64(42))
    }

    #[test]
    fn test_shuffled_contains_every_player_once() {
        let q = queue();
        let mut ids: Vec<u32> = q.entries().iter().map(|e| e.player_id.0).collect();
        ids.sort_unstable();
        assert_eq!(ids, (0..25).collect::<Vec<_>>());

        let positions: Vec<u32> = q.entries().iter().map(|e| e.position).collect();
        assert_eq!(positions, (1..=25).collect::<Vec<_>>());
        assert_eq!(q.remaining(), 25);
    }

    #[test]
    fn test_start_next_keeps_single_auctioning_entry() {
        let mut q = queue();
        let first = q.start_next().unwrap();
        assert_eq!(q.current(), Some(first));
        assert_eq!(q.start_next(), None);

        assert!(q.settle(first, QueueStatus::Sold));
        let second = q.start_next().unwrap();
        assert_ne!(first, second);

        let auctioning = q.entries().iter().filter(|e| e.is_auctioning()).count();
        assert_eq!(auctioning, 1);
        assert_eq!(q.remaining(), 23);
    }

    #[test]
    fn test_settle_is_noop_for_player_not_on_block() {
        let mut q = queue();
        let first = q.start_next().unwrap();
        assert!(q.settle(first, QueueStatus::Unsold));
        assert!(!q.settle(first, QueueStatus::Sold));
        assert_eq!(q.status_of(first), Some(QueueStatus::Unsold));
    }

    #[test]
    fn test_start_next_exhausts() {
        let mut q = queue();
        while let Some(id) = q.start_next() {
            q.settle(id, QueueStatus::Unsold);
        }
        assert_eq!(q.remaining(), 0);
        assert_eq!(q.current(), None);
    }
}
