//! Process-wide set of rooms.
//!
//! Each room sits behind its own mutex so every event against one room is
//! applied as a unit, while different rooms can be driven from different
//! threads. A room is evicted as soon as its last player leaves.

use crate::game::outcome::{Departure, PlayOutcome, Rejection, RosterError};
use crate::game::room::{GameRoom, RoomId};
use crate::game::view::GameView;
use crate::model::card::Card;
use crate::model::player::{PlayerCount, PlayerId};
use parking_lot::{Mutex, RwLock};
use rand::rngs::StdRng;
use rand::{RngCore, SeedableRng};
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;
use tracing::{Level, event};

pub type SharedRoom = Arc<Mutex<GameRoom>>;

#[derive(Debug, Error)]
pub enum RoomError {
    #[error("room '{0}' does not exist")]
    UnknownRoom(RoomId),
    #[error("rooms seat 2 to 4 players, not {0}")]
    InvalidPlayerCount(u8),
    #[error(transparent)]
    Roster(#[from] RosterError),
    #[error(transparent)]
    Rejected(#[from] Rejection),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JoinOutcome {
    pub player: PlayerId,
    pub seat: usize,
    /// This join filled the room and dealt the first hand.
    pub started: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LeaveOutcome {
    pub departure: Departure,
    pub room_evicted: bool,
}

#[derive(Debug, Default)]
pub struct RoomRegistry {
    rooms: RwLock<HashMap<RoomId, SharedRoom>>,
    seeds: Mutex<Option<StdRng>>,
}

impl RoomRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rooms created by this registry shuffle from seeds drawn off `seed`.
    pub fn with_seed(seed: u64) -> Self {
        Self {
            rooms: RwLock::new(HashMap::new()),
            seeds: Mutex::new(Some(StdRng::seed_from_u64(seed))),
        }
    }

    pub fn room_count(&self) -> usize {
        self.rooms.read().len()
    }

    pub fn room(&self, room_id: &str) -> Option<SharedRoom> {
        self.rooms.read().get(room_id).cloned()
    }

    pub fn with_room<T>(&self, room_id: &str, f: impl FnOnce(&GameRoom) -> T) -> Option<T> {
        let room = self.room(room_id)?;
        let guard = room.lock();
        Some(f(&guard))
    }

    /// Seats `player`, creating the room on first reference. The room deals
    /// automatically once the last seat is taken.
    pub fn join(
        &self,
        room_id: &str,
        max_players: u8,
        player: PlayerId,
    ) -> Result<JoinOutcome, RoomError> {
        // The map stays locked until the seat is taken so a concurrent
        // `leave` cannot evict the room in between.
        let mut rooms = self.rooms.write();
        let shared = match rooms.get(room_id) {
            Some(room) => Arc::clone(room),
            None => {
                let count = PlayerCount::from_u8(max_players)
                    .ok_or(RoomError::InvalidPlayerCount(max_players))?;
                let room = GameRoom::with_seed(room_id, count, self.next_seed());
                event!(
                    target: "septica_core::registry",
                    Level::INFO,
                    room = room_id,
                    %count,
                    "room created"
                );
                let shared = Arc::new(Mutex::new(room));
                rooms.insert(room_id.to_string(), Arc::clone(&shared));
                shared
            }
        };

        let mut room = shared.lock();
        let seat = room.add_player(player.clone())?;
        let started = room.is_full() && !room.is_started();
        if started {
            room.start();
        }
        drop(room);
        drop(rooms);
        Ok(JoinOutcome {
            player,
            seat,
            started,
        })
    }

    pub fn play(
        &self,
        room_id: &str,
        player: &PlayerId,
        card: Card,
    ) -> Result<PlayOutcome, RoomError> {
        let room = self.require(room_id)?;
        let outcome = room.lock().play_card(player, card)?;
        Ok(outcome)
    }

    pub fn pass(&self, room_id: &str, player: &PlayerId) -> Result<PlayOutcome, RoomError> {
        let room = self.require(room_id)?;
        let outcome = room.lock().pass_turn(player)?;
        Ok(outcome)
    }

    pub fn restart(&self, room_id: &str) -> Result<(), RoomError> {
        let room = self.require(room_id)?;
        room.lock().reset();
        Ok(())
    }

    /// Returns `None` when the player was not seated in that room.
    pub fn leave(
        &self,
        room_id: &str,
        player: &PlayerId,
    ) -> Result<Option<LeaveOutcome>, RoomError> {
        let mut rooms = self.rooms.write();
        let shared = rooms
            .get(room_id)
            .cloned()
            .ok_or_else(|| RoomError::UnknownRoom(room_id.to_string()))?;
        let mut room = shared.lock();
        let Some(departure) = room.remove_player(player) else {
            return Ok(None);
        };
        let room_evicted = room.players().is_empty();
        drop(room);
        if room_evicted {
            rooms.remove(room_id);
            event!(
                target: "septica_core::registry",
                Level::INFO,
                room = room_id,
                "room evicted"
            );
        }
        Ok(Some(LeaveOutcome {
            departure,
            room_evicted,
        }))
    }

    /// Unseats `player` from every room, returning the rooms they left.
    pub fn disconnect(&self, player: &PlayerId) -> Vec<RoomId> {
        let ids: Vec<RoomId> = self.rooms.read().keys().cloned().collect();
        ids.into_iter()
            .filter(|room_id| matches!(self.leave(room_id, player), Ok(Some(_))))
            .collect()
    }

    /// One projection per seated player, ready to push after a mutation.
    pub fn views(&self, room_id: &str) -> Result<Vec<(PlayerId, GameView)>, RoomError> {
        let room = self.require(room_id)?;
        let room = room.lock();
        Ok(room
            .players()
            .iter()
            .map(|player| (player.id().clone(), room.view_for(player.id())))
            .collect())
    }

    fn require(&self, room_id: &str) -> Result<SharedRoom, RoomError> {
        self.room(room_id)
            .ok_or_else(|| RoomError::UnknownRoom(room_id.to_string()))
    }

    fn next_seed(&self) -> u64 {
        match self.seeds.lock().as_mut() {
            Some(rng) => rng.next_u64(),
            None => rand::random(),
        }
    }
}
