use crate::game::room::GameRoom;
use crate::model::card::Card;
use crate::model::player::{PlayerCount, PlayerId};
use crate::model::score::GameResult;
use crate::model::trick::Play;
use serde::{Deserialize, Serialize};

/// What one seat is allowed to see of a room.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameView {
    pub players: Vec<SeatView>,
    pub table: Vec<Play>,
    pub turn: Option<PlayerId>,
    pub deck_count: usize,
    pub started: bool,
    pub max_players: PlayerCount,
    pub winner: Option<GameResult>,
    pub waiting_for_response: bool,
    pub waiting_for_initiator_response: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeatView {
    pub id: PlayerId,
    /// Only populated for the requester's own seat.
    pub hand: Vec<Card>,
    pub hand_count: usize,
    pub collected_count: usize,
}

impl GameView {
    pub fn project(room: &GameRoom, requester: &PlayerId) -> Self {
        let players = room
            .players()
            .iter()
            .map(|player| SeatView {
                id: player.id().clone(),
                hand: if player.id() == requester {
                    player.hand().cards().to_vec()
                } else {
                    Vec::new()
                },
                hand_count: player.hand().len(),
                collected_count: player.collected().len(),
            })
            .collect();

        Self {
            players,
            table: room.trick().plays().to_vec(),
            turn: room.current_player().cloned(),
            deck_count: room.deck_len(),
            started: room.is_started(),
            max_players: room.player_count(),
            winner: room.result().cloned(),
            waiting_for_response: room.waiting_for_response(),
            waiting_for_initiator_response: room.waiting_for_initiator_response(),
        }
    }

    pub fn seat(&self, id: &PlayerId) -> Option<&SeatView> {
        self.players.iter().find(|seat| &seat.id == id)
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }
}

impl GameRoom {
    pub fn view_for(&self, requester: &PlayerId) -> GameView {
        GameView::project(self, requester)
    }
}
