use crate::game::outcome::{Action, Departure, PlayOutcome, Rejection, RosterError};
use crate::game::protocol::{TrickContext, TrickPhase, TrickProtocol, TrickState, TrickStep, protocol_for};
use crate::model::card::Card;
use crate::model::deck::Deck;
use crate::model::player::{Player, PlayerCount, PlayerId};
use crate::model::rank::Rank;
use crate::model::score::GameResult;
use crate::model::trick::Trick;
use rand::SeedableRng;
use rand::rngs::StdRng;
use tracing::{Level, event};

pub type RoomId = String;

/// One table: roster, deck, trick in progress and the turn pointer.
#[derive(Debug, Clone)]
pub struct GameRoom {
    pub(crate) room_id: RoomId,
    pub(crate) count: PlayerCount,
    pub(crate) protocol: &'static dyn TrickProtocol,
    pub(crate) players: Vec<Player>,
    pub(crate) deck: Deck,
    pub(crate) trick: TrickState,
    pub(crate) turn_index: usize,
    pub(crate) started: bool,
    pub(crate) result: Option<GameResult>,
    pub(crate) rng: StdRng,
    seed: u64,
}

impl GameRoom {
    pub fn new(room_id: impl Into<RoomId>, count: PlayerCount) -> Self {
        let seed: u64 = rand::random();
        Self::with_seed(room_id, count, seed)
    }

    pub fn with_seed(room_id: impl Into<RoomId>, count: PlayerCount, seed: u64) -> Self {
        Self {
            room_id: room_id.into(),
            count,
            protocol: protocol_for(count),
            players: Vec::with_capacity(count.seats()),
            deck: Deck::default(),
            trick: TrickState::default(),
            turn_index: 0,
            started: false,
            result: None,
            rng: StdRng::seed_from_u64(seed),
            seed,
        }
    }

    /// A started room with the given hands and an unshuffled draw pile.
    pub fn from_parts(
        room_id: impl Into<RoomId>,
        count: PlayerCount,
        players: Vec<Player>,
        deck: Deck,
    ) -> Self {
        let mut room = Self::with_seed(room_id, count, 0);
        room.players = players;
        room.deck = deck;
        room.started = true;
        room
    }

    pub fn room_id(&self) -> &str {
        &self.room_id
    }

    pub fn player_count(&self) -> PlayerCount {
        self.count
    }

    pub fn protocol(&self) -> &'static dyn TrickProtocol {
        self.protocol
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn players(&self) -> &[Player] {
        &self.players
    }

    pub fn player(&self, id: &PlayerId) -> Option<&Player> {
        self.players.iter().find(|p| p.id() == id)
    }

    pub fn seat_of(&self, id: &PlayerId) -> Option<usize> {
        self.players.iter().position(|p| p.id() == id)
    }

    pub fn is_full(&self) -> bool {
        self.players.len() >= self.count.seats()
    }

    pub fn deck_len(&self) -> usize {
        self.deck.len()
    }

    pub fn trick(&self) -> &Trick {
        &self.trick.trick
    }

    pub fn phase(&self) -> TrickPhase {
        self.trick.phase
    }

    pub fn turn_index(&self) -> usize {
        self.turn_index
    }

    pub fn current_player(&self) -> Option<&PlayerId> {
        self.players.get(self.turn_index).map(Player::id)
    }

    pub fn current_lead(&self) -> Option<Rank> {
        self.trick.trick.lead_rank()
    }

    pub fn round_initiator(&self) -> Option<&PlayerId> {
        self.trick.trick.initiator()
    }

    pub fn waiting_for_response(&self) -> bool {
        self.trick.phase == TrickPhase::AwaitingResponse
    }

    pub fn waiting_for_initiator_response(&self) -> bool {
        self.trick.phase == TrickPhase::AwaitingInitiator
    }

    pub fn is_started(&self) -> bool {
        self.started
    }

    pub fn is_finished(&self) -> bool {
        self.result.is_some()
    }

    pub fn result(&self) -> Option<&GameResult> {
        self.result.as_ref()
    }

    /// Cards currently accounted for across deck, hands, piles and table.
    pub fn cards_in_play(&self) -> usize {
        let held: usize = self
            .players
            .iter()
            .map(|p| p.hand().len() + p.collected().len())
            .sum();
        self.deck.len() + held + self.trick.trick.len()
    }

    pub fn add_player(&mut self, id: PlayerId) -> Result<usize, RosterError> {
        if self.is_full() {
            return Err(RosterError::RoomFull {
                capacity: self.count.seats(),
            });
        }
        if self.seat_of(&id).is_some() {
            return Err(RosterError::AlreadySeated(id));
        }
        event!(
            target: "septica_core::room",
            Level::DEBUG,
            room = %self.room_id,
            player = %id,
            seat = self.players.len(),
        );
        self.players.push(Player::new(id));
        Ok(self.players.len() - 1)
    }

    /// Drops a seat. Leaving a game in progress voids it.
    pub fn remove_player(&mut self, id: &PlayerId) -> Option<Departure> {
        let seat = self.seat_of(id)?;
        self.players.remove(seat);

        let departure = if self.started && self.result.is_none() {
            self.void();
            Departure::GameVoided
        } else {
            Departure::Removed
        };

        if self.turn_index >= self.players.len() {
            self.turn_index = 0;
        }
        event!(
            target: "septica_core::room",
            Level::INFO,
            room = %self.room_id,
            player = %id,
            ?departure,
        );
        Some(departure)
    }

    fn void(&mut self) {
        let dropped: usize = self.players.iter_mut().map(Player::clear).sum();
        event!(
            target: "septica_core::room",
            Level::WARN,
            room = %self.room_id,
            returned_cards = dropped + self.deck.len() + self.trick.trick.len(),
            "game voided by departure"
        );
        self.deck.clear();
        self.trick.clear();
        self.turn_index = 0;
        self.started = false;
        self.result = None;
    }

    pub fn reset(&mut self) {
        self.start();
    }

    pub fn play_card(&mut self, id: &PlayerId, card: Card) -> Result<PlayOutcome, Rejection> {
        let seat = self.acting_seat(id)?;
        let protocol = self.protocol;
        let phase = self.trick.phase;
        let step = {
            let mut ctx = self.context();
            match phase {
                TrickPhase::Lead => protocol.on_lead(&mut ctx, seat, card),
                TrickPhase::AwaitingResponse | TrickPhase::Following => {
                    protocol.on_respond(&mut ctx, seat, card)
                }
                TrickPhase::AwaitingInitiator => protocol.on_initiator_decide(&mut ctx, seat, card),
            }
        };
        match step {
            Ok(step) => Ok(self.settle(step)),
            Err(rejection) => {
                self.log_rejection(id, &rejection);
                Err(rejection)
            }
        }
    }

    pub fn pass_turn(&mut self, id: &PlayerId) -> Result<PlayOutcome, Rejection> {
        let seat = self.acting_seat(id)?;
        let protocol = self.protocol;
        let step = {
            let mut ctx = self.context();
            protocol.on_pass(&mut ctx, seat)
        };
        match step {
            Ok(step) => Ok(self.settle(step)),
            Err(rejection) => {
                self.log_rejection(id, &rejection);
                Err(rejection)
            }
        }
    }

    pub fn apply(&mut self, id: &PlayerId, action: Action) -> Result<PlayOutcome, Rejection> {
        match action {
            Action::Play(card) => self.play_card(id, card),
            Action::Pass => self.pass_turn(id),
        }
    }

    /// Every action `id` could take right now without being rejected.
    pub fn legal_actions(&self, id: &PlayerId) -> Vec<Action> {
        let Ok(seat) = self.acting_seat(id) else {
            return Vec::new();
        };
        let hand = self.players[seat].hand();
        match (self.trick.phase, self.current_lead()) {
            (TrickPhase::AwaitingInitiator, Some(lead)) => hand
                .cutting_cards(lead, self.count)
                .map(Action::Play)
                .chain(std::iter::once(Action::Pass))
                .collect(),
            (TrickPhase::AwaitingInitiator, None) => Vec::new(),
            _ => hand.iter().copied().map(Action::Play).collect(),
        }
    }

    fn acting_seat(&self, id: &PlayerId) -> Result<usize, Rejection> {
        if self.result.is_some() {
            return Err(Rejection::GameOver);
        }
        if !self.started {
            return Err(Rejection::NotStarted);
        }
        let seat = self
            .seat_of(id)
            .ok_or_else(|| Rejection::UnknownPlayer(id.clone()))?;
        if seat != self.turn_index {
            let expected = self
                .current_player()
                .cloned()
                .ok_or_else(|| Rejection::UnknownPlayer(id.clone()))?;
            return Err(Rejection::OutOfTurn {
                expected,
                actual: id.clone(),
            });
        }
        Ok(seat)
    }

    fn context(&mut self) -> TrickContext<'_> {
        TrickContext {
            count: self.count,
            players: &mut self.players,
            state: &mut self.trick,
            turn: &mut self.turn_index,
        }
    }

    fn settle(&mut self, step: TrickStep) -> PlayOutcome {
        match step {
            TrickStep::Resolved { winner } => {
                let game_over = self.reset_round(&winner);
                PlayOutcome::TrickWon { winner, game_over }
            }
            TrickStep::Continue => match (self.trick.phase, self.round_initiator()) {
                (TrickPhase::AwaitingInitiator, Some(initiator)) => PlayOutcome::AwaitingInitiator {
                    initiator: initiator.clone(),
                },
                _ => PlayOutcome::Played,
            },
        }
    }

    fn log_rejection(&self, id: &PlayerId, rejection: &Rejection) {
        event!(
            target: "septica_core::room",
            Level::DEBUG,
            room = %self.room_id,
            player = %id,
            reason = %rejection,
            "action rejected"
        );
    }
}
