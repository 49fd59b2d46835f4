//! Room actor: a Tokio task that owns one [`AuctionRoom`].
//!
//! All intents for a room go through the actor's bounded channel, so they
//! apply one at a time in arrival order. Rooms share nothing; different
//! rooms make progress in parallel.
//!
//! In [`FinalizeMode::Scheduled`] the actor also owns a [`DeadlineTimer`]
//! armed for the current player's deadline and settles the player itself
//! when it fires.
//!
//! Once the room ends the actor keeps answering reads for
//! [`AuctionConfig::ended_linger_secs`](crate::AuctionConfig), then stops.
//! The registry drops stopped rooms in
//! [`RoomManager::prune_stopped`](crate::RoomManager::prune_stopped).

use std::sync::Arc;
use std::time::Duration;

use rand::rngs::StdRng;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info, warn};

use gavel_protocol::{Lot, PlayerId, Request, Response, RoomCode, RoomId, RoomStatus};
use gavel_timer::{DeadlineTimer, Expiry};

use crate::identity::generate_user_id;
use crate::{AuctionError, AuctionRoom, Clock, FinalizeMode, FinalizeTrigger};

type Reply = oneshot::Sender<Result<Response, AuctionError>>;

pub(crate) enum RoomCommand {
    /// Apply one client intent and answer on `reply`.
    Request { request: Request, reply: Reply },
    Shutdown,
}

/// Cheap, cloneable handle to a running room actor.
#[derive(Debug, Clone)]
pub struct RoomHandle {
    id: RoomId,
    code: RoomCode,
    sender: mpsc::Sender<RoomCommand>,
}

impl std::fmt::Debug for RoomCommand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Request { request, .. } => write!(f, "Request({})", request.name()),
            Self::Shutdown => f.write_str("Shutdown"),
        }
    }
}

impl RoomHandle {
    pub fn id(&self) -> RoomId {
        self.id
    }

    pub fn code(&self) -> &RoomCode {
        &self.code
    }

    /// Sends an intent to the room and waits for its answer.
    ///
    /// # Errors
    /// The engine's rejection, or [`AuctionError::Unavailable`] if the
    /// actor has stopped.
    pub async fn request(&self, request: Request) -> Result<Response, AuctionError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.sender
            .send(RoomCommand::Request {
                request,
                reply: reply_tx,
            })
            .await
            .map_err(|_| AuctionError::Unavailable(self.code.clone()))?;
        reply_rx
            .await
            .map_err(|_| AuctionError::Unavailable(self.code.clone()))?
    }

    /// Stops the actor after it drains commands already queued.
    pub async fn shutdown(&self) -> Result<(), AuctionError> {
        self.sender
            .send(RoomCommand::Shutdown)
            .await
            .map_err(|_| AuctionError::Unavailable(self.code.clone()))
    }

    pub fn is_closed(&self) -> bool {
        self.sender.is_closed()
    }
}

struct RoomActor {
    room: AuctionRoom,
    clock: Arc<dyn Clock>,
    rng: StdRng,
    timer: DeadlineTimer<PlayerId>,
    /// The lot the timer is currently armed for.
    armed_for: Option<Lot>,
    /// Armed once the room ends; the actor stops when it fires.
    linger: DeadlineTimer<()>,
    receiver: mpsc::Receiver<RoomCommand>,
}

impl RoomActor {
    async fn run(mut self) {
        info!(room = %self.room.code(), id = %self.room.room().id, "room actor started");

        loop {
            tokio::select! {
                cmd = self.receiver.recv() => match cmd {
                    Some(RoomCommand::Request { request, reply }) => {
                        let result = self.handle(request);
                        let _ = reply.send(result);
                        self.sync_timer();
                    }
                    Some(RoomCommand::Shutdown) | None => break,
                },
                expiry = self.timer.expired() => {
                    self.on_deadline(expiry);
                    self.sync_timer();
                }
                _ = self.linger.expired() => {
                    info!(room = %self.room.code(), "ended room released");
                    break;
                }
            }
        }

        info!(room = %self.room.code(), "room actor stopped");
    }

    fn handle(&mut self, request: Request) -> Result<Response, AuctionError> {
        let name = request.name();
        let result = self.dispatch(request);
        if let Err(err) = &result {
            debug!(
                room = %self.room.code(),
                request = name,
                kind = ?err.kind(),
                error = %err,
                "intent rejected"
            );
        }
        result
    }

    fn dispatch(&mut self, request: Request) -> Result<Response, AuctionError> {
        let now = self.clock.now();
        let room = &mut self.room;

        match request {
            Request::JoinRoom {
                display_name,
                role,
                user_id,
                ..
            } => match user_id {
                Some(user_id) => {
                    let member = room.rejoin(&user_id)?;
                    Ok(Response::Joined {
                        room: room.room().clone(),
                        user_id,
                        member,
                        rejoined: true,
                    })
                }
                None => {
                    let user_id = generate_user_id();
                    let member = room.join(user_id.clone(), display_name, role, now)?;
                    Ok(Response::Joined {
                        room: room.room().clone(),
                        user_id,
                        member,
                        rejoined: false,
                    })
                }
            },
            Request::GetRoom { .. } => Ok(Response::Room(room.room_snapshot())),
            Request::StartTeamSelection { user_id, .. } => {
                room.start_team_selection(&user_id)?;
                Ok(Response::Transitioned {
                    room: room.room().clone(),
                })
            }
            Request::SelectFranchise {
                user_id, franchise, ..
            } => {
                let team = room.select_franchise(&user_id, franchise)?;
                Ok(Response::FranchiseSelected { team })
            }
            Request::StartAuction { user_id, .. } => {
                room.start_auction(&user_id, &mut self.rng, now)?;
                Ok(Response::Transitioned {
                    room: room.room().clone(),
                })
            }
            Request::Pause { user_id, .. } => {
                room.pause(&user_id)?;
                Ok(Response::Transitioned {
                    room: room.room().clone(),
                })
            }
            Request::Resume { user_id, .. } => {
                room.resume(&user_id, now)?;
                Ok(Response::Transitioned {
                    room: room.room().clone(),
                })
            }
            Request::GetAuction { .. } => Ok(Response::Auction(Box::new(room.auction_snapshot()))),
            Request::PlaceBid {
                user_id,
                amount,
                expected_version,
                ..
            } => {
                let accepted = room.place_bid(&user_id, amount, expected_version, now)?;
                Ok(Response::BidAccepted {
                    bid: accepted.bid,
                    deadline: accepted.deadline,
                    version: accepted.version,
                })
            }
            Request::Skip { user_id, .. } => {
                let (skip, outcome) = room.skip(&user_id, now)?;
                Ok(Response::Skipped { skip, outcome })
            }
            Request::Finalize { player_id, .. } => {
                let outcome = room.finalize(player_id, FinalizeTrigger::Poll, now)?;
                Ok(Response::Finalized { outcome })
            }
            Request::EndBidding { user_id, .. } => {
                let ended = room.end_bidding(&user_id, now)?;
                Ok(Response::BiddingEnded {
                    team: ended.team,
                    room_ended: ended.room_ended,
                })
            }
            Request::GetSummary { .. } => Ok(Response::Summary(room.summary())),
            Request::CreateRoom { .. } | Request::Heartbeat { .. } => Err(
                AuctionError::BadRequest(format!("{} is not a room intent", request.name())),
            ),
        }
    }

    fn on_deadline(&mut self, expiry: Expiry<PlayerId>) {
        self.armed_for = None;
        let now = self.clock.now();
        match self
            .room
            .finalize(Some(expiry.tag), FinalizeTrigger::Scheduled, now)
        {
            Ok(outcome) => debug!(
                room = %self.room.code(),
                player = %expiry.tag,
                late_ms = expiry.late_by.as_millis() as u64,
                ?outcome,
                "deadline settled player"
            ),
            Err(err) => warn!(
                room = %self.room.code(),
                player = %expiry.tag,
                error = %err,
                "scheduled finalize failed"
            ),
        }
    }

    /// Points the timer at the current deadline, or disarms it when nothing
    /// should fire. Arms the linger timer the first time the room is seen
    /// ended.
    fn sync_timer(&mut self) {
        if self.room.status() == RoomStatus::Ended && !self.linger.is_armed() {
            let linger = self.room.config().ended_linger();
            debug!(room = %self.room.code(), linger_secs = linger.as_secs(), "room ended, lingering");
            self.linger.arm(linger, ());
        }

        let wanted = match self.room.config().finalize_mode {
            FinalizeMode::Scheduled if self.room.status() == RoomStatus::Live => {
                self.room.current_lot().cloned()
            }
            _ => None,
        };
        if wanted == self.armed_for {
            return;
        }

        match &wanted {
            Some(lot) => {
                let remaining = (lot.deadline - self.clock.now())
                    .to_std()
                    .unwrap_or(Duration::ZERO);
                self.timer.arm(remaining, lot.player_id);
            }
            None => {
                self.timer.disarm();
            }
        }
        self.armed_for = wanted;
    }
}

/// Spawns the actor for `room` and returns its handle.
pub(crate) fn spawn_room(
    room: AuctionRoom,
    clock: Arc<dyn Clock>,
    rng: StdRng,
    channel_size: usize,
) -> RoomHandle {
    let (tx, rx) = mpsc::channel(channel_size);
    let handle = RoomHandle {
        id: room.room().id,
        code: room.code().clone(),
        sender: tx,
    };

    let mut actor = RoomActor {
        room,
        clock,
        rng,
        timer: DeadlineTimer::default(),
        armed_for: None,
        linger: DeadlineTimer::default(),
        receiver: rx,
    };
    actor.sync_timer();
    tokio::spawn(actor.run());

    handle
}
