//! The auction engine: one room's aggregate and every rule that mutates it.
//!
//! [`AuctionRoom`] is plain synchronous state. It never reads a clock or a
//! random source on its own; callers pass `now` and an RNG in. Serializing
//! access is the job of the room actor that owns it.
//!
//! Every intent validates fully before it touches state, so a rejected
//! intent leaves the room exactly as it was.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use rand::Rng;
use tracing::{debug, info};

use gavel_protocol::{
    AuctionSnapshot, Bid, FranchiseCode, Lakhs, Lot, LotOutcome, Member, MemberRole, Player,
    PlayerId, QueueStatus, Room, RoomCode, RoomId, RoomSnapshot, RoomStatus, Skip, SquadEntry,
    SquadPlayer, Summary, Team, TeamSquad, TeamSummary, UserId,
};

use crate::increment::{expected_next, is_aligned_opening};
use crate::{AuctionConfig, AuctionError, Catalog, Ledger, Membership, PlayerQueue};

/// What asked for the current player to be settled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FinalizeTrigger {
    /// A client `finalize` request; only honoured once the deadline passed.
    Poll,
    /// The room's own deadline timer fired.
    Scheduled,
}

/// Result of an accepted bid.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AcceptedBid {
    pub bid: Bid,
    pub deadline: DateTime<Utc>,
    pub version: u64,
}

/// Result of `end_bidding`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BiddingEnded {
    pub team: Team,
    pub room_ended: bool,
    /// Set when ending the room settled the player on the block.
    pub outcome: Option<LotOutcome>,
}

/// One room's full auction state.
#[derive(Debug, Clone)]
pub struct AuctionRoom {
    room: Room,
    config: AuctionConfig,
    catalog: Arc<Catalog>,
    membership: Membership,
    queue: PlayerQueue,
    ledger: Ledger,
}

impl AuctionRoom {
    /// Creates a room in `lobby` with the creator as its host (rank 1).
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        id: RoomId,
        code: RoomCode,
        name: String,
        host_id: UserId,
        host_name: String,
        config: AuctionConfig,
        catalog: Arc<Catalog>,
        now: DateTime<Utc>,
    ) -> (Self, Member) {
        let mut membership = Membership::new();
        let host = membership.add(host_id.clone(), host_name, MemberRole::Host, now);
        let room = Room {
            id,
            code,
            name,
            status: RoomStatus::Lobby,
            host: host_id,
            current: None,
            countdown_secs: config.countdown_secs,
            version: 0,
            created_at: now,
        };
        let this = Self {
            room,
            config,
            catalog,
            membership,
            queue: PlayerQueue::default(),
            ledger: Ledger::new(),
        };
        (this, host)
    }

    // -----------------------------------------------------------------------
    // Accessors
    // -----------------------------------------------------------------------

    pub fn room(&self) -> &Room {
        &self.room
    }

    pub fn code(&self) -> &RoomCode {
        &self.room.code
    }

    pub fn status(&self) -> RoomStatus {
        self.room.status
    }

    pub fn version(&self) -> u64 {
        self.room.version
    }

    pub fn current_lot(&self) -> Option<&Lot> {
        self.room.current.as_ref()
    }

    pub fn config(&self) -> &AuctionConfig {
        &self.config
    }

    pub fn membership(&self) -> &Membership {
        &self.membership
    }

    pub fn queue(&self) -> &PlayerQueue {
        &self.queue
    }

    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    // -----------------------------------------------------------------------
    // Membership
    // -----------------------------------------------------------------------

    /// Adds a new member under `user_id`.
    ///
    /// Participants may only join in `lobby` and only while a franchise is
    /// left for them; spectators may join until the room ends.
    pub fn join(
        &mut self,
        user_id: UserId,
        display_name: String,
        role: Option<MemberRole>,
        now: DateTime<Utc>,
    ) -> Result<Member, AuctionError> {
        let role = role.unwrap_or_default();
        let display_name = display_name.trim().to_owned();
        if display_name.is_empty() {
            return Err(AuctionError::BadRequest("display name is empty".into()));
        }
        if role == MemberRole::Host {
            return Err(AuctionError::Forbidden(
                "the host role belongs to the room creator".into(),
            ));
        }
        if self.room.status.is_terminal() {
            return Err(AuctionError::InvalidState("room has ended".into()));
        }
        if self.membership.member(&user_id).is_some() {
            return Err(AuctionError::PreconditionFailed(format!(
                "{user_id} is already a member"
            )));
        }
        if role.participates() {
            if self.room.status != RoomStatus::Lobby {
                return Err(AuctionError::InvalidState(format!(
                    "room is in {}, only spectators may join",
                    self.room.status
                )));
            }
            if self.membership.participant_count() >= FranchiseCode::ALL.len() {
                return Err(AuctionError::PreconditionFailed(
                    "every franchise already has a member".into(),
                ));
            }
        }

        let member = self.membership.add(user_id, display_name, role, now);
        info!(
            room = %self.room.code,
            user = %member.user_id,
            role = ?member.role,
            rank = ?member.selection_order,
            "member joined"
        );
        Ok(member)
    }

    /// Looks up an existing member for a client that reconnects.
    pub fn rejoin(&self, user_id: &UserId) -> Result<Member, AuctionError> {
        let member = self.member(user_id)?.clone();
        debug!(room = %self.room.code, user = %user_id, "member rejoined");
        Ok(member)
    }

    // -----------------------------------------------------------------------
    // Lifecycle
    // -----------------------------------------------------------------------

    /// `lobby → team_selection`.
    pub fn start_team_selection(&mut self, caller: &UserId) -> Result<(), AuctionError> {
        self.require_host(caller)?;
        self.require_status(RoomStatus::Lobby)?;
        let members = self.membership.participant_count();
        if members < self.config.min_members_to_start {
            return Err(AuctionError::PreconditionFailed(format!(
                "{members} member(s) joined, {} needed",
                self.config.min_members_to_start
            )));
        }
        self.transition(RoomStatus::TeamSelection)
    }

    /// Claims `franchise` for `caller`, strictly in selection order.
    pub fn select_franchise(
        &mut self,
        caller: &UserId,
        franchise: FranchiseCode,
    ) -> Result<Team, AuctionError> {
        self.require_status(RoomStatus::TeamSelection)?;
        let member = self.member(caller)?.clone();
        if !member.role.participates() {
            return Err(AuctionError::Forbidden(
                "spectators cannot claim a franchise".into(),
            ));
        }
        if let Some(owned) = self.membership.franchise_of(caller) {
            return Err(AuctionError::PreconditionFailed(format!(
                "{caller} already owns {owned}"
            )));
        }
        if self.membership.is_claimed(franchise) {
            return Err(AuctionError::PreconditionFailed(format!(
                "{franchise} is already claimed"
            )));
        }
        match self.membership.next_to_pick() {
            Some(next) if next.user_id == member.user_id => {}
            Some(next) => {
                return Err(AuctionError::NotYourTurn(format!(
                    "{} (rank {}) picks next",
                    next.display_name,
                    next.selection_order.unwrap_or_default()
                )));
            }
            None => {
                return Err(AuctionError::InvalidState(
                    "every member has already picked".into(),
                ));
            }
        }

        let team = self
            .membership
            .claim(&member, franchise, self.config.starting_purse);
        info!(
            room = %self.room.code,
            user = %caller,
            franchise = %franchise,
            rank = team.selection_order,
            "franchise claimed"
        );
        Ok(team)
    }

    /// `team_selection → live`: shuffles the catalog into the queue and puts
    /// the first player on the block.
    pub fn start_auction<R: Rng + ?Sized>(
        &mut self,
        caller: &UserId,
        rng: &mut R,
        now: DateTime<Utc>,
    ) -> Result<(), AuctionError> {
        self.require_host(caller)?;
        self.require_status(RoomStatus::TeamSelection)?;
        let teams = self.membership.team_count();
        if teams < self.config.min_franchises_to_start {
            return Err(AuctionError::PreconditionFailed(format!(
                "{teams} franchise(s) claimed, {} needed",
                self.config.min_franchises_to_start
            )));
        }
        if self.catalog.is_empty() {
            return Err(AuctionError::PreconditionFailed(
                "the player catalog is empty".into(),
            ));
        }

        self.queue = PlayerQueue::shuffled(self.catalog.players(), rng);
        self.transition(RoomStatus::Live)?;
        info!(
            room = %self.room.code,
            teams,
            players = self.queue.entries().len(),
            "auction started"
        );
        self.advance(now);
        Ok(())
    }

    /// `live → paused`. The player stays on the block.
    pub fn pause(&mut self, caller: &UserId) -> Result<(), AuctionError> {
        self.require_host(caller)?;
        self.require_status(RoomStatus::Live)?;
        self.transition(RoomStatus::Paused)
    }

    /// `paused → live` with a fresh deadline for the player on the block.
    pub fn resume(&mut self, caller: &UserId, now: DateTime<Utc>) -> Result<(), AuctionError> {
        self.require_host(caller)?;
        self.require_status(RoomStatus::Paused)?;
        let deadline = now + self.config.countdown();
        if let Some(lot) = self.room.current.as_mut() {
            lot.deadline = deadline;
        }
        self.transition(RoomStatus::Live)
    }

    // -----------------------------------------------------------------------
    // Bidding
    // -----------------------------------------------------------------------

    /// The amount the next bid on the current player must carry.
    pub fn next_min_bid(&self) -> Option<Lakhs> {
        let lot = self.room.current.as_ref()?;
        let player = self.catalog.get(lot.player_id)?;
        Some(self.expected_for(player))
    }

    /// Franchises that may bid on or skip the current player.
    pub fn active_franchises(&self) -> Vec<FranchiseCode> {
        let Some(expected) = self.next_min_bid() else {
            return Vec::new();
        };
        self.membership
            .teams()
            .into_iter()
            .filter(|t| self.is_active(t, expected))
            .map(|t| t.franchise)
            .collect()
    }

    /// Places `amount` on the current player for the caller's franchise.
    ///
    /// A franchise that has ended its bidding or filled its squad gets
    /// [`AuctionError::TeamInactive`]. A purse that cannot cover `amount` is
    /// reported as [`AuctionError::InsufficientPurse`] rather than
    /// `TeamInactive`, even though such a franchise is left out of
    /// [`active_franchises`](Self::active_franchises).
    pub fn place_bid(
        &mut self,
        caller: &UserId,
        amount: Lakhs,
        expected_version: Option<u64>,
        now: DateTime<Utc>,
    ) -> Result<AcceptedBid, AuctionError> {
        let lot = self.live_lot()?;
        if now >= lot.deadline {
            return Err(AuctionError::DeadlineExpired);
        }
        if let Some(expected) = expected_version {
            if expected != self.room.version {
                return Err(AuctionError::VersionConflict {
                    expected,
                    actual: self.room.version,
                });
            }
        }
        let franchise = self.franchise_of(caller)?;
        let team = self.team(franchise)?;
        let player = self.player(lot.player_id)?;
        let last = self.ledger.last_bid(player.id);
        let expected = self.expected_for(player);

        if team.has_ended || team.total_count >= self.config.team_max {
            return Err(AuctionError::TeamInactive(franchise));
        }
        if last.is_some_and(|b| b.franchise == franchise) {
            return Err(AuctionError::SelfBid(franchise));
        }
        if self.ledger.owns(franchise, player.id) {
            return Err(AuctionError::OwnPlayer(franchise, player.id));
        }
        let opening_misaligned = last.is_none() && !is_aligned_opening(amount, player.base_price);
        if amount != expected || opening_misaligned {
            return Err(AuctionError::AmountMismatch { expected, amount });
        }
        if team.purse_left < amount {
            return Err(AuctionError::InsufficientPurse {
                needed: amount,
                available: team.purse_left,
            });
        }

        let bid = Bid {
            player_id: player.id,
            franchise,
            amount,
            placed_at: now,
        };
        let deadline = now + self.config.countdown();
        self.ledger.record_bid(bid.clone());
        if let Some(lot) = self.room.current.as_mut() {
            lot.deadline = deadline;
        }
        self.bump_version();

        info!(
            room = %self.room.code,
            franchise = %franchise,
            player = %bid.player_id,
            amount,
            version = self.room.version,
            "bid accepted"
        );
        Ok(AcceptedBid {
            bid,
            deadline,
            version: self.room.version,
        })
    }

    /// Passes on the current player. May settle the player early when every
    /// other active franchise has passed too.
    pub fn skip(
        &mut self,
        caller: &UserId,
        now: DateTime<Utc>,
    ) -> Result<(Skip, Option<LotOutcome>), AuctionError> {
        let lot = self.live_lot()?;
        let franchise = self.franchise_of(caller)?;
        if self.ledger.has_skipped(lot.player_id, franchise) {
            let (existing, _) = self.ledger.add_skip(Skip {
                player_id: lot.player_id,
                franchise,
                skipped_at: now,
            });
            return Ok((existing, None));
        }
        let active = self.active_franchises();
        if !active.contains(&franchise) {
            return Err(AuctionError::TeamInactive(franchise));
        }

        let (skip, _) = self.ledger.add_skip(Skip {
            player_id: lot.player_id,
            franchise,
            skipped_at: now,
        });
        debug!(
            room = %self.room.code,
            franchise = %franchise,
            player = %lot.player_id,
            "player skipped"
        );

        let leader = self.ledger.last_bid(lot.player_id).map(|b| b.franchise);
        let consensus = active
            .iter()
            .filter(|f| Some(**f) != leader)
            .all(|f| self.ledger.has_skipped(lot.player_id, *f));
        let outcome = consensus.then(|| {
            info!(room = %self.room.code, player = %lot.player_id, "every active franchise passed");
            self.settle(now)
        });
        Ok((skip, outcome))
    }

    /// Settles the current player.
    ///
    /// `expected_player` names the player the caller believes is on the
    /// block; if that player has already been settled (or the room ended),
    /// this is a no-op returning [`LotOutcome::AlreadySettled`].
    pub fn finalize(
        &mut self,
        expected_player: Option<PlayerId>,
        trigger: FinalizeTrigger,
        now: DateTime<Utc>,
    ) -> Result<LotOutcome, AuctionError> {
        if self.room.status.is_terminal() {
            return Ok(LotOutcome::AlreadySettled);
        }
        let current = self.room.current.as_ref().map(|lot| lot.player_id);
        if let Some(expected) = expected_player {
            if current != Some(expected) {
                return Ok(LotOutcome::AlreadySettled);
            }
        }
        let lot = self.live_lot()?;
        if trigger == FinalizeTrigger::Poll && now < lot.deadline {
            return Err(AuctionError::DeadlineNotExpired {
                remaining_ms: (lot.deadline - now).num_milliseconds(),
            });
        }
        Ok(self.settle(now))
    }

    /// Sets the caller's franchise aside for the rest of the auction.
    pub fn end_bidding(
        &mut self,
        caller: &UserId,
        now: DateTime<Utc>,
    ) -> Result<BiddingEnded, AuctionError> {
        if self.room.status.is_terminal() {
            return Err(AuctionError::InvalidState("room has ended".into()));
        }
        let franchise = self.franchise_of(caller)?;
        let team = self.team(franchise)?;
        if team.has_ended {
            return Ok(BiddingEnded {
                team: team.clone(),
                room_ended: false,
                outcome: None,
            });
        }
        if team.total_count < self.config.team_min {
            return Err(AuctionError::PreconditionFailed(format!(
                "{franchise} has {} player(s), needs {} before ending",
                team.total_count, self.config.team_min
            )));
        }

        if let Some(team) = self.membership.team_mut(franchise) {
            team.has_ended = true;
        }
        info!(room = %self.room.code, franchise = %franchise, "franchise ended bidding");

        let mut outcome = None;
        let room_ended = self.membership.all_ended() && self.room.status.is_auction_running();
        if room_ended {
            outcome = self.settle_current(now);
            self.end_auction("every franchise ended bidding");
        }
        let team = self.team(franchise)?.clone();
        Ok(BiddingEnded {
            team,
            room_ended,
            outcome,
        })
    }

    // -----------------------------------------------------------------------
    // Snapshots
    // -----------------------------------------------------------------------

    pub fn room_snapshot(&self) -> RoomSnapshot {
        RoomSnapshot {
            room: self.room.clone(),
            members: self.membership.members().to_vec(),
            teams: self.membership.teams().into_iter().cloned().collect(),
            current_player: self.current_player().cloned(),
        }
    }

    pub fn auction_snapshot(&self) -> AuctionSnapshot {
        let current = self.room.current.as_ref().map(|lot| lot.player_id);
        let (bids, skips, last_bid) = match current {
            Some(id) => (
                self.ledger.bids_for(id).cloned().collect(),
                self.ledger.skips_for(id).cloned().collect(),
                self.ledger.last_bid(id).cloned(),
            ),
            None => (Vec::new(), Vec::new(), None),
        };
        let teams = self
            .membership
            .teams()
            .into_iter()
            .map(|team| TeamSquad {
                team: team.clone(),
                squad: self.ledger.squad_of(team.franchise).cloned().collect(),
            })
            .collect();

        AuctionSnapshot {
            room: self.room.clone(),
            current_player: self.current_player().cloned(),
            last_bid,
            bids,
            skips,
            teams,
            active_franchises: self.active_franchises(),
            next_min_bid: self.next_min_bid(),
            is_active: self.room.status == RoomStatus::Live,
        }
    }

    /// Every franchise with its squad joined to catalog details.
    pub fn summary(&self) -> Summary {
        let teams = self
            .membership
            .teams()
            .into_iter()
            .map(|team| TeamSummary {
                team: team.clone(),
                players: self
                    .ledger
                    .squad_of(team.franchise)
                    .filter_map(|entry| {
                        self.catalog.get(entry.player_id).map(|player| SquadEntry {
                            price: entry.price,
                            purchased_at: entry.purchased_at,
                            player: player.clone(),
                        })
                    })
                    .collect(),
            })
            .collect();
        Summary {
            room: self.room.clone(),
            teams,
        }
    }

    // -----------------------------------------------------------------------
    // Internals
    // -----------------------------------------------------------------------

    fn member(&self, user_id: &UserId) -> Result<&Member, AuctionError> {
        self.membership
            .member(user_id)
            .ok_or_else(|| AuctionError::NotFound(format!("member {user_id}")))
    }

    fn require_host(&self, caller: &UserId) -> Result<(), AuctionError> {
        self.member(caller)?;
        if caller != &self.room.host {
            return Err(AuctionError::Forbidden("only the host may do that".into()));
        }
        Ok(())
    }

    fn require_status(&self, status: RoomStatus) -> Result<(), AuctionError> {
        if self.room.status != status {
            return Err(AuctionError::InvalidState(format!(
                "room is {}, expected {status}",
                self.room.status
            )));
        }
        Ok(())
    }

    fn franchise_of(&self, caller: &UserId) -> Result<FranchiseCode, AuctionError> {
        self.member(caller)?;
        self.membership
            .franchise_of(caller)
            .ok_or_else(|| AuctionError::NotFound(format!("franchise owned by {caller}")))
    }

    fn team(&self, franchise: FranchiseCode) -> Result<&Team, AuctionError> {
        self.membership
            .team(franchise)
            .ok_or_else(|| AuctionError::NotFound(format!("team {franchise}")))
    }

    fn player(&self, id: PlayerId) -> Result<&Player, AuctionError> {
        self.catalog
            .get(id)
            .ok_or_else(|| AuctionError::NotFound(format!("player {id}")))
    }

    fn current_player(&self) -> Option<&Player> {
        self.room
            .current
            .as_ref()
            .and_then(|lot| self.catalog.get(lot.player_id))
    }

    /// The lot, provided the room is live and has a player on the block.
    fn live_lot(&self) -> Result<Lot, AuctionError> {
        if self.room.status != RoomStatus::Live {
            return Err(AuctionError::StaleAuction(format!(
                "room is {}",
                self.room.status
            )));
        }
        self.room
            .current
            .clone()
            .ok_or_else(|| AuctionError::StaleAuction("no player on the block".into()))
    }

    fn expected_for(&self, player: &Player) -> Lakhs {
        let last = self.ledger.last_bid(player.id).map(|b| b.amount);
        expected_next(last, player.base_price)
    }

    fn is_active(&self, team: &Team, expected: Lakhs) -> bool {
        !team.has_ended && team.total_count < self.config.team_max && team.purse_left >= expected
    }

    /// Whether `team` may legally receive `player` at `price`.
    fn can_receive(&self, team: &Team, player: &Player, price: Lakhs) -> bool {
        let overseas_ok = !player.is_overseas(&self.config.home_nationality)
            || team.overseas_count < self.config.max_overseas;
        team.purse_left >= price && team.total_count < self.config.team_max && overseas_ok
    }

    fn bump_version(&mut self) {
        self.room.version += 1;
    }

    fn transition(&mut self, to: RoomStatus) -> Result<(), AuctionError> {
        let from = self.room.status;
        if !from.can_transition_to(to) {
            return Err(AuctionError::InvalidState(format!(
                "cannot move from {from} to {to}"
            )));
        }
        self.room.status = to;
        self.bump_version();
        info!(
            room = %self.room.code,
            %from,
            %to,
            version = self.room.version,
            "room status changed"
        );
        Ok(())
    }

    /// Settles the current player and moves to the next one.
    fn settle(&mut self, now: DateTime<Utc>) -> LotOutcome {
        match self.settle_current(now) {
            Some(outcome) => {
                self.advance(now);
                outcome
            }
            None => LotOutcome::AlreadySettled,
        }
    }

    /// Awards or passes the player on the block and takes it off the block.
    /// Does not pick the next player.
    fn settle_current(&mut self, now: DateTime<Utc>) -> Option<LotOutcome> {
        let lot = self.room.current.take()?;
        let player_id = lot.player_id;

        let winner = self.ledger.last_bid(player_id).cloned().and_then(|bid| {
            let player = self.catalog.get(player_id)?;
            let team = self.membership.team(bid.franchise)?;
            self.can_receive(team, player, bid.amount)
                .then(|| (bid, player.is_overseas(&self.config.home_nationality)))
        });

        let outcome = match winner {
            Some((bid, overseas)) => {
                if let Some(team) = self.membership.team_mut(bid.franchise) {
                    team.purse_left -= bid.amount;
                    team.total_count += 1;
                    if overseas {
                        team.overseas_count += 1;
                    }
                }
                self.ledger.award(SquadPlayer {
                    franchise: bid.franchise,
                    player_id,
                    price: bid.amount,
                    purchased_at: now,
                });
                self.queue.settle(player_id, QueueStatus::Sold);
                info!(
                    room = %self.room.code,
                    player = %player_id,
                    franchise = %bid.franchise,
                    price = bid.amount,
                    "player sold"
                );
                LotOutcome::Sold {
                    player_id,
                    franchise: bid.franchise,
                    price: bid.amount,
                }
            }
            None => {
                self.queue.settle(player_id, QueueStatus::Unsold);
                info!(room = %self.room.code, player = %player_id, "player unsold");
                LotOutcome::Unsold { player_id }
            }
        };
        self.ledger.clear_skips(player_id);
        Some(outcome)
    }

    /// Puts the next queued player on the block, or ends the auction.
    fn advance(&mut self, now: DateTime<Utc>) {
        match self.queue.start_next() {
            Some(player_id) => {
                let deadline = now + self.config.countdown();
                self.room.current = Some(Lot {
                    player_id,
                    deadline,
                });
                self.bump_version();
                debug!(
                    room = %self.room.code,
                    player = %player_id,
                    remaining = self.queue.remaining(),
                    version = self.room.version,
                    "player on the block"
                );
            }
            None => self.end_auction("queue exhausted"),
        }
    }

    fn end_auction(&mut self, reason: &str) {
        self.room.current = None;
        if self.transition(RoomStatus::Ended).is_ok() {
            info!(room = %self.room.code, reason, "auction ended");
        }
    }
}
