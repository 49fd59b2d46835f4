//! Room registry: creates rooms, hands out codes, routes by code.

use std::collections::HashMap;
use std::sync::Arc;

use rand::SeedableRng;
use rand::rngs::StdRng;
use tracing::{debug, info};

use gavel_protocol::{Member, Room, RoomCode, RoomId, UserId};

use crate::actor::spawn_room;
use crate::identity::{generate_room_code, generate_user_id};
use crate::{AuctionConfig, AuctionError, AuctionRoom, Catalog, Clock, RoomHandle};

/// Default command channel size for room actors.
const DEFAULT_CHANNEL_SIZE: usize = 64;

/// What [`RoomManager::create_room`] hands back to the creator.
#[derive(Debug, Clone)]
pub struct CreatedRoom {
    pub handle: RoomHandle,
    pub room: Room,
    pub user_id: UserId,
    pub member: Member,
}

/// Every live room, keyed by code.
///
/// The manager only creates and looks up rooms. Callers clone the
/// [`RoomHandle`] out and talk to the room after releasing whatever lock
/// guards the manager.
pub struct RoomManager {
    rooms: HashMap<RoomCode, RoomHandle>,
    catalog: Arc<Catalog>,
    config: AuctionConfig,
    clock: Arc<dyn Clock>,
    next_id: u64,
    /// When set, room `n` shuffles with `seed + n`.
    seed: Option<u64>,
}

impl RoomManager {
    pub fn new(catalog: Arc<Catalog>, config: AuctionConfig, clock: Arc<dyn Clock>) -> Self {
        Self {
            rooms: HashMap::new(),
            catalog,
            config: config.validated(),
            clock,
            next_id: 1,
            seed: None,
        }
    }

    /// Makes every room's queue shuffle reproducible.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn config(&self) -> &AuctionConfig {
        &self.config
    }

    /// Creates a room in `lobby` with the caller as host and spawns its actor.
    pub fn create_room(
        &mut self,
        room_name: &str,
        display_name: &str,
    ) -> Result<CreatedRoom, AuctionError> {
        let room_name = room_name.trim();
        let display_name = display_name.trim();
        if room_name.is_empty() {
            return Err(AuctionError::BadRequest("room name is empty".into()));
        }
        if display_name.is_empty() {
            return Err(AuctionError::BadRequest("display name is empty".into()));
        }

        let id = RoomId(self.next_id);
        self.next_id += 1;
        let code = self.unique_code();
        let user_id = generate_user_id();
        let (room, member) = AuctionRoom::new(
            id,
            code.clone(),
            room_name.to_owned(),
            user_id.clone(),
            display_name.to_owned(),
            self.config.clone(),
            Arc::clone(&self.catalog),
            self.clock.now(),
        );
        let snapshot = room.room().clone();

        let rng = match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed.wrapping_add(id.0)),
            None => StdRng::from_rng(&mut rand::rng()),
        };
        let handle = spawn_room(room, Arc::clone(&self.clock), rng, DEFAULT_CHANNEL_SIZE);
        self.rooms.insert(code.clone(), handle.clone());
        info!(room = %code, %id, host = %user_id, "room created");

        Ok(CreatedRoom {
            handle,
            room: snapshot,
            user_id,
            member,
        })
    }

    /// The handle for `code`. A room whose actor has stopped is not found,
    /// even before [`prune_stopped`](Self::prune_stopped) drops it.
    pub fn get(&self, code: &RoomCode) -> Result<RoomHandle, AuctionError> {
        self.rooms
            .get(code)
            .filter(|handle| !handle.is_closed())
            .cloned()
            .ok_or_else(|| AuctionError::NotFound(format!("room {code}")))
    }

    pub fn room_count(&self) -> usize {
        self.rooms.len()
    }

    /// Drops handles whose actor has stopped, either by shutdown or after
    /// an ended room's linger period.
    pub fn prune_stopped(&mut self) -> usize {
        let before = self.rooms.len();
        self.rooms.retain(|code, handle| {
            let open = !handle.is_closed();
            if !open {
                debug!(room = %code, "room dropped from registry");
            }
            open
        });
        before - self.rooms.len()
    }

    fn unique_code(&self) -> RoomCode {
        let mut rng = rand::rng();
        loop {
            if let Some(code) = generate_room_code(&mut rng) {
                if !self.rooms.contains_key(&code) {
                    return code;
                }
            }
        }
    }
}
