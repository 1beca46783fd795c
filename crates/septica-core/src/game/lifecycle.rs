//! Dealing, refilling and closing out tricks.

use crate::game::room::GameRoom;
use crate::model::deck::Deck;
use crate::model::hand::Hand;
use crate::model::player::PlayerId;
use crate::model::score::ScoreBoard;
use tracing::{Level, event};

impl GameRoom {
    /// Fresh shuffle and deal for the current roster. Safe to call again to restart.
    pub fn start(&mut self) {
        self.deck = Deck::shuffled(self.count, &mut self.rng);
        for player in &mut self.players {
            player.clear();
            for card in self.deck.draw_many(Hand::FULL) {
                player.hand_mut().add(card);
            }
        }
        self.turn_index = 0;
        self.trick.clear();
        self.started = true;
        self.result = None;
        event!(
            target: "septica_core::lifecycle",
            Level::INFO,
            room = %self.room_id,
            players = self.players.len(),
            protocol = self.protocol.name(),
            deck = self.deck.len(),
            "game started"
        );
    }

    /// Tops every hand back up to four, in seat order, while the deck lasts.
    pub fn refill_hands(&mut self) {
        for player in &mut self.players {
            while player.hand().needs_cards() {
                let Some(card) = self.deck.draw() else {
                    return;
                };
                player.hand_mut().add(card);
            }
        }
    }

    pub fn is_game_over(&self) -> bool {
        self.deck.is_empty() && self.players.iter().all(|p| p.hand().is_empty())
    }

    pub fn scores(&self) -> ScoreBoard {
        ScoreBoard::tally(&self.players)
    }

    /// Every resolved trick passes through here. The winner leads next.
    /// Returns true once the game has ended and a result is recorded.
    pub(crate) fn reset_round(&mut self, next_player: &PlayerId) -> bool {
        self.trick.clear();
        self.turn_index = self.seat_of(next_player).unwrap_or(0);
        self.refill_hands();

        if self.is_game_over() {
            self.result = self.scores().result();
            event!(
                target: "septica_core::lifecycle",
                Level::INFO,
                room = %self.room_id,
                result = ?self.result,
                "game over"
            );
            return true;
        }

        self.skip_empty_leader();
        false
    }

    // Short three-handed endgames can leave the winner without cards to lead.
    fn skip_empty_leader(&mut self) {
        let len = self.players.len();
        if len == 0 || !self.players[self.turn_index].hand().is_empty() {
            return;
        }
        if let Some(next) = (1..len)
            .map(|offset| (self.turn_index + offset) % len)
            .find(|&seat| !self.players[seat].hand().is_empty())
        {
            self.turn_index = next;
        }
    }
}
