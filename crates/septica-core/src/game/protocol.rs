//! Trick protocols.
//!
//! Two and three handed rooms play a [`Duel`]: the leader is answered by a
//! single responder, and a cut hands the decision back to the leader. Four
//! handed rooms play a [`FullRound`] where every seat lays one card before the
//! trick is judged. Both sit behind [`TrickProtocol`] and are picked once per
//! room by [`protocol_for`].

use crate::game::outcome::Rejection;
use crate::model::card::Card;
use crate::model::hand::Hand;
use crate::model::player::{Player, PlayerCount, PlayerId};
use crate::model::trick::Trick;
use core::fmt;
use tracing::{Level, event};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TrickPhase {
    /// Table is empty; the seat on turn leads.
    #[default]
    Lead,
    /// Duel only: one opponent answers the lead.
    AwaitingResponse,
    /// Full round: seats follow in turn until everyone has played.
    Following,
    /// The initiator was cut and must re-cut or pass.
    AwaitingInitiator,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TrickState {
    pub trick: Trick,
    pub phase: TrickPhase,
}

impl TrickState {
    pub fn clear(&mut self) {
        self.trick.clear();
        self.phase = TrickPhase::Lead;
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TrickStep {
    Continue,
    Resolved { winner: PlayerId },
}

/// Mutable view of the room handed to a protocol for one action.
pub struct TrickContext<'a> {
    pub count: PlayerCount,
    pub players: &'a mut [Player],
    pub state: &'a mut TrickState,
    pub turn: &'a mut usize,
}

impl TrickContext<'_> {
    pub fn seat_of(&self, player: &PlayerId) -> Option<usize> {
        self.players.iter().position(|p| p.id() == player)
    }

    fn initiator_seat(&self) -> Option<usize> {
        let initiator = self.state.trick.initiator()?;
        self.seat_of(initiator)
    }

    /// Next seat after `seat` that still holds cards.
    pub fn next_holding_seat(&self, seat: usize) -> Option<usize> {
        let len = self.players.len();
        (1..len)
            .map(|offset| (seat + offset) % len)
            .find(|&candidate| !self.players[candidate].hand().is_empty())
    }

    fn lay(&mut self, seat: usize, card: Card) -> Result<(), Rejection> {
        let player = &mut self.players[seat];
        if !player.hand_mut().remove(card) {
            return Err(Rejection::CardNotHeld(card));
        }
        let id = player.id().clone();
        self.state.trick.push(id, card);
        Ok(())
    }

    /// Moves the whole table into `seat`'s pile.
    fn award(&mut self, seat: usize) -> TrickStep {
        let cards = self.state.trick.take_cards();
        let player = &mut self.players[seat];
        event!(
            target: "septica_core::trick",
            Level::DEBUG,
            winner = %player.id(),
            cards = cards.len(),
        );
        player.collect(cards);
        TrickStep::Resolved {
            winner: player.id().clone(),
        }
    }

    fn award_to(&mut self, player: &PlayerId) -> TrickStep {
        match self.seat_of(player) {
            Some(seat) => self.award(seat),
            None => TrickStep::Resolved {
                winner: player.clone(),
            },
        }
    }

    fn pending_initiator(&self, seat: usize) -> Result<usize, Rejection> {
        let player = self.players[seat].id().clone();
        if self.state.phase != TrickPhase::AwaitingInitiator {
            return Err(Rejection::NotAwaitingDecision(player));
        }
        match self.initiator_seat() {
            Some(initiator) if initiator == seat => Ok(seat),
            _ => Err(Rejection::NotAwaitingDecision(player)),
        }
    }

    /// Validates and lays a re-cut from the initiator.
    fn recut(&mut self, seat: usize, card: Card) -> Result<(), Rejection> {
        self.pending_initiator(seat)?;
        let lead = self
            .state
            .trick
            .lead_rank()
            .ok_or(Rejection::WrongPhase(self.state.phase))?;
        if !card.cuts(lead, self.count) {
            return Err(Rejection::NotCutting { card, lead });
        }
        self.lay(seat, card)
    }

    fn open(&mut self, seat: usize, card: Card) -> Result<(), Rejection> {
        if self.state.phase != TrickPhase::Lead || !self.state.trick.is_empty() {
            return Err(Rejection::WrongPhase(self.state.phase));
        }
        self.lay(seat, card)
    }
}

pub trait TrickProtocol: fmt::Debug + Send + Sync {
    fn name(&self) -> &'static str;

    fn on_lead(
        &self,
        ctx: &mut TrickContext<'_>,
        seat: usize,
        card: Card,
    ) -> Result<TrickStep, Rejection>;

    fn on_respond(
        &self,
        ctx: &mut TrickContext<'_>,
        seat: usize,
        card: Card,
    ) -> Result<TrickStep, Rejection>;

    fn on_initiator_decide(
        &self,
        ctx: &mut TrickContext<'_>,
        seat: usize,
        card: Card,
    ) -> Result<TrickStep, Rejection>;

    /// The initiator declines to re-cut; the last card laid takes the trick.
    fn on_pass(&self, ctx: &mut TrickContext<'_>, seat: usize) -> Result<TrickStep, Rejection> {
        ctx.pending_initiator(seat)?;
        let last = ctx
            .state
            .trick
            .last_play()
            .map(|play| play.player_id.clone())
            .ok_or(Rejection::WrongPhase(ctx.state.phase))?;
        Ok(ctx.award_to(&last))
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Duel;

#[derive(Debug, Clone, Copy, Default)]
pub struct FullRound;

static DUEL: Duel = Duel;
static FULL_ROUND: FullRound = FullRound;

pub fn protocol_for(count: PlayerCount) -> &'static dyn TrickProtocol {
    if count.uses_duel() { &DUEL } else { &FULL_ROUND }
}

impl TrickProtocol for Duel {
    fn name(&self) -> &'static str {
        "duel"
    }

    fn on_lead(
        &self,
        ctx: &mut TrickContext<'_>,
        seat: usize,
        card: Card,
    ) -> Result<TrickStep, Rejection> {
        ctx.open(seat, card)?;
        match ctx.next_holding_seat(seat) {
            Some(responder) => {
                ctx.state.phase = TrickPhase::AwaitingResponse;
                *ctx.turn = responder;
                Ok(TrickStep::Continue)
            }
            // Nobody left who could answer.
            None => Ok(ctx.award(seat)),
        }
    }

    fn on_respond(
        &self,
        ctx: &mut TrickContext<'_>,
        seat: usize,
        card: Card,
    ) -> Result<TrickStep, Rejection> {
        if ctx.state.phase != TrickPhase::AwaitingResponse {
            return Err(Rejection::WrongPhase(ctx.state.phase));
        }
        let (Some(lead), Some(initiator)) = (ctx.state.trick.lead_rank(), ctx.initiator_seat())
        else {
            return Err(Rejection::WrongPhase(ctx.state.phase));
        };
        ctx.lay(seat, card)?;

        if card.cuts(lead, ctx.count) {
            ctx.state.phase = TrickPhase::AwaitingInitiator;
            *ctx.turn = initiator;
            Ok(TrickStep::Continue)
        } else {
            Ok(ctx.award(initiator))
        }
    }

    fn on_initiator_decide(
        &self,
        ctx: &mut TrickContext<'_>,
        seat: usize,
        card: Card,
    ) -> Result<TrickStep, Rejection> {
        let responder = ctx
            .state
            .trick
            .plays()
            .get(1)
            .and_then(|play| ctx.seat_of(&play.player_id))
            .ok_or(Rejection::WrongPhase(ctx.state.phase))?;
        ctx.recut(seat, card)?;

        if ctx.players[responder].hand().is_empty() {
            return Ok(ctx.award(seat));
        }
        ctx.state.phase = TrickPhase::AwaitingResponse;
        *ctx.turn = responder;
        Ok(TrickStep::Continue)
    }
}

impl TrickProtocol for FullRound {
    fn name(&self) -> &'static str {
        "full_round"
    }

    fn on_lead(
        &self,
        ctx: &mut TrickContext<'_>,
        seat: usize,
        card: Card,
    ) -> Result<TrickStep, Rejection> {
        ctx.open(seat, card)?;
        ctx.state.phase = TrickPhase::Following;
        self.advance_or_judge(ctx, seat)
    }

    fn on_respond(
        &self,
        ctx: &mut TrickContext<'_>,
        seat: usize,
        card: Card,
    ) -> Result<TrickStep, Rejection> {
        if ctx.state.phase != TrickPhase::Following {
            return Err(Rejection::WrongPhase(ctx.state.phase));
        }
        ctx.lay(seat, card)?;
        self.advance_or_judge(ctx, seat)
    }

    fn on_initiator_decide(
        &self,
        ctx: &mut TrickContext<'_>,
        seat: usize,
        card: Card,
    ) -> Result<TrickStep, Rejection> {
        ctx.recut(seat, card)?;
        ctx.state.phase = TrickPhase::Following;
        match ctx.next_holding_seat(seat) {
            Some(next) => {
                *ctx.turn = next;
                Ok(TrickStep::Continue)
            }
            None => self.judge(ctx),
        }
    }
}

impl FullRound {
    fn advance_or_judge(
        &self,
        ctx: &mut TrickContext<'_>,
        seat: usize,
    ) -> Result<TrickStep, Rejection> {
        if ctx.state.trick.len() < ctx.players.len() {
            if let Some(next) = ctx.next_holding_seat(seat) {
                *ctx.turn = next;
                return Ok(TrickStep::Continue);
            }
        }
        self.judge(ctx)
    }

    fn judge(&self, ctx: &mut TrickContext<'_>) -> Result<TrickStep, Rejection> {
        let initiator = ctx
            .initiator_seat()
            .ok_or(Rejection::WrongPhase(ctx.state.phase))?;
        let verdict = resolve_full_round(
            &ctx.state.trick,
            ctx.count,
            ctx.players[initiator].hand(),
        )
        .ok_or(Rejection::WrongPhase(ctx.state.phase))?;

        match verdict {
            FullRoundVerdict::Award(winner) => Ok(ctx.award_to(&winner)),
            FullRoundVerdict::SecondChance => {
                ctx.state.phase = TrickPhase::AwaitingInitiator;
                *ctx.turn = initiator;
                Ok(TrickStep::Continue)
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FullRoundVerdict {
    Award(PlayerId),
    /// Initiator still holds a cut and may try to take the trick back.
    SecondChance,
}

/// Judges a filled full-round trick.
///
/// The last cutting card wins, defaulting to the lead. When that lands on the
/// initiator while an opponent also cut, the initiator gets a second chance if
/// a cut remains in `initiator_hand`, otherwise the last card laid wins. With
/// every seat playing exactly once that branch cannot trigger, because any
/// opponent cut follows the lead and becomes the winner.
pub fn resolve_full_round(
    trick: &Trick,
    count: PlayerCount,
    initiator_hand: &Hand,
) -> Option<FullRoundVerdict> {
    let initiator = trick.initiator()?;
    let lead = trick.lead_rank()?;
    let winner = trick.last_cutter(count)?;

    if winner == initiator && trick.opponent_cut(count) {
        if initiator_hand.has_cut(lead, count) {
            return Some(FullRoundVerdict::SecondChance);
        }
        let last = trick.last_play()?;
        return Some(FullRoundVerdict::Award(last.player_id.clone()));
    }

    Some(FullRoundVerdict::Award(winner.clone()))
}

#[cfg(test)]
mod tests {
    use super::{
        Duel, FullRound, FullRoundVerdict, TrickContext, TrickPhase, TrickProtocol, TrickState,
        TrickStep, protocol_for, resolve_full_round,
    };
    use crate::game::outcome::Rejection;
    use crate::model::card::Card;
    use crate::model::hand::Hand;
    use crate::model::player::{Player, PlayerCount, PlayerId};
    use crate::model::rank::Rank;
    use crate::model::suit::Suit;
    use crate::model::trick::{Play, Trick};
    use proptest::prelude::*;

    fn card(rank: Rank, suit: Suit) -> Card {
        Card::new(rank, suit)
    }

    fn seat(id: &str, cards: &[Card]) -> Player {
        Player::with_hand(PlayerId::from(id), cards.to_vec())
    }

    struct Table {
        count: PlayerCount,
        players: Vec<Player>,
        state: TrickState,
        turn: usize,
    }

    impl Table {
        fn new(count: PlayerCount, players: Vec<Player>) -> Self {
            Self {
                count,
                players,
                state: TrickState::default(),
                turn: 0,
            }
        }

        fn ctx(&mut self) -> TrickContext<'_> {
            TrickContext {
                count: self.count,
                players: &mut self.players,
                state: &mut self.state,
                turn: &mut self.turn,
            }
        }
    }

    #[test]
    fn protocol_is_chosen_by_table_size() {
        assert_eq!(protocol_for(PlayerCount::Two).name(), "duel");
        assert_eq!(protocol_for(PlayerCount::Three).name(), "duel");
        assert_eq!(protocol_for(PlayerCount::Four).name(), "full_round");
    }

    #[test]
    fn duel_non_cutting_response_goes_to_initiator() {
        let mut table = Table::new(
            PlayerCount::Two,
            vec![
                seat("a", &[card(Rank::Nine, Suit::Spades)]),
                seat("b", &[card(Rank::King, Suit::Hearts)]),
            ],
        );
        let step = Duel
            .on_lead(&mut table.ctx(), 0, card(Rank::Nine, Suit::Spades))
            .unwrap();
        assert_eq!(step, TrickStep::Continue);
        assert_eq!(table.state.phase, TrickPhase::AwaitingResponse);
        assert_eq!(table.turn, 1);

        let step = Duel
            .on_respond(&mut table.ctx(), 1, card(Rank::King, Suit::Hearts))
            .unwrap();
        assert_eq!(
            step,
            TrickStep::Resolved {
                winner: PlayerId::from("a")
            }
        );
        assert_eq!(table.players[0].collected().len(), 2);
        assert!(table.state.trick.is_empty());
    }

    #[test]
    fn duel_recut_hands_turn_back_to_responder() {
        let mut table = Table::new(
            PlayerCount::Two,
            vec![
                seat(
                    "a",
                    &[card(Rank::Nine, Suit::Spades), card(Rank::Nine, Suit::Clubs)],
                ),
                seat(
                    "b",
                    &[card(Rank::Seven, Suit::Hearts), card(Rank::Ace, Suit::Hearts)],
                ),
            ],
        );
        Duel.on_lead(&mut table.ctx(), 0, card(Rank::Nine, Suit::Spades))
            .unwrap();
        Duel.on_respond(&mut table.ctx(), 1, card(Rank::Seven, Suit::Hearts))
            .unwrap();
        assert_eq!(table.state.phase, TrickPhase::AwaitingInitiator);
        assert_eq!(table.turn, 0);

        Duel.on_initiator_decide(&mut table.ctx(), 0, card(Rank::Nine, Suit::Clubs))
            .unwrap();
        assert_eq!(table.state.phase, TrickPhase::AwaitingResponse);
        assert_eq!(table.turn, 1);

        let step = Duel
            .on_respond(&mut table.ctx(), 1, card(Rank::Ace, Suit::Hearts))
            .unwrap();
        assert_eq!(
            step,
            TrickStep::Resolved {
                winner: PlayerId::from("a")
            }
        );
        assert_eq!(table.players[0].collected().len(), 4);
    }

    #[test]
    fn initiator_must_recut_with_a_cutting_card() {
        let mut table = Table::new(
            PlayerCount::Two,
            vec![
                seat(
                    "a",
                    &[card(Rank::Nine, Suit::Spades), card(Rank::King, Suit::Clubs)],
                ),
                seat("b", &[card(Rank::Nine, Suit::Hearts)]),
            ],
        );
        Duel.on_lead(&mut table.ctx(), 0, card(Rank::Nine, Suit::Spades))
            .unwrap();
        Duel.on_respond(&mut table.ctx(), 1, card(Rank::Nine, Suit::Hearts))
            .unwrap();
        let before = table.state.clone();
        let err = Duel
            .on_initiator_decide(&mut table.ctx(), 0, card(Rank::King, Suit::Clubs))
            .unwrap_err();
        assert!(matches!(err, Rejection::NotCutting { .. }));
        assert_eq!(table.state, before);
        assert_eq!(table.players[0].hand().len(), 1);
    }

    #[test]
    fn pass_awards_last_cutter() {
        let mut table = Table::new(
            PlayerCount::Two,
            vec![
                seat("a", &[card(Rank::Nine, Suit::Spades)]),
                seat("b", &[card(Rank::Seven, Suit::Hearts)]),
            ],
        );
        Duel.on_lead(&mut table.ctx(), 0, card(Rank::Nine, Suit::Spades))
            .unwrap();
        Duel.on_respond(&mut table.ctx(), 1, card(Rank::Seven, Suit::Hearts))
            .unwrap();
        assert!(matches!(
            Duel.on_pass(&mut table.ctx(), 1),
            Err(Rejection::NotAwaitingDecision(_))
        ));
        let step = Duel.on_pass(&mut table.ctx(), 0).unwrap();
        assert_eq!(
            step,
            TrickStep::Resolved {
                winner: PlayerId::from("b")
            }
        );
        assert_eq!(table.players[1].collected().len(), 2);
    }

    #[test]
    fn uncontested_lead_resolves_immediately() {
        let mut table = Table::new(
            PlayerCount::Three,
            vec![
                seat("a", &[card(Rank::Ten, Suit::Spades)]),
                seat("b", &[]),
                seat("c", &[]),
            ],
        );
        let step = Duel
            .on_lead(&mut table.ctx(), 0, card(Rank::Ten, Suit::Spades))
            .unwrap();
        assert_eq!(
            step,
            TrickStep::Resolved {
                winner: PlayerId::from("a")
            }
        );
    }

    #[test]
    fn duel_skips_seats_without_cards() {
        let mut table = Table::new(
            PlayerCount::Three,
            vec![
                seat("a", &[card(Rank::Ten, Suit::Spades)]),
                seat("b", &[]),
                seat("c", &[card(Rank::Jack, Suit::Clubs)]),
            ],
        );
        Duel.on_lead(&mut table.ctx(), 0, card(Rank::Ten, Suit::Spades))
            .unwrap();
        assert_eq!(table.turn, 2);
    }

    #[test]
    fn full_round_waits_for_every_seat() {
        let mut table = Table::new(
            PlayerCount::Four,
            vec![
                seat("a", &[card(Rank::Nine, Suit::Spades)]),
                seat("b", &[card(Rank::Jack, Suit::Hearts)]),
                seat("c", &[card(Rank::Nine, Suit::Clubs)]),
                seat("d", &[card(Rank::Ace, Suit::Diamonds)]),
            ],
        );
        FullRound
            .on_lead(&mut table.ctx(), 0, card(Rank::Nine, Suit::Spades))
            .unwrap();
        assert_eq!(table.state.phase, TrickPhase::Following);
        FullRound
            .on_respond(&mut table.ctx(), 1, card(Rank::Jack, Suit::Hearts))
            .unwrap();
        FullRound
            .on_respond(&mut table.ctx(), 2, card(Rank::Nine, Suit::Clubs))
            .unwrap();
        assert_eq!(table.turn, 3);
        let step = FullRound
            .on_respond(&mut table.ctx(), 3, card(Rank::Ace, Suit::Diamonds))
            .unwrap();
        assert_eq!(
            step,
            TrickStep::Resolved {
                winner: PlayerId::from("c")
            }
        );
        assert_eq!(table.players[2].collected().len(), 4);
    }

    #[test]
    fn full_round_rejects_duel_phases() {
        let mut table = Table::new(
            PlayerCount::Four,
            vec![seat("a", &[card(Rank::Nine, Suit::Spades)])],
        );
        let err = FullRound
            .on_respond(&mut table.ctx(), 0, card(Rank::Nine, Suit::Spades))
            .unwrap_err();
        assert_eq!(err, Rejection::WrongPhase(TrickPhase::Lead));
    }

    fn plays(entries: &[(&str, Card)]) -> Trick {
        Trick::from_plays(
            entries
                .iter()
                .map(|(id, card)| Play {
                    player_id: PlayerId::from(*id),
                    card: *card,
                })
                .collect(),
        )
    }

    #[test]
    fn verdict_defaults_to_leader_without_cuts() {
        let trick = plays(&[
            ("a", card(Rank::Nine, Suit::Spades)),
            ("b", card(Rank::Jack, Suit::Hearts)),
            ("c", card(Rank::Queen, Suit::Clubs)),
            ("d", card(Rank::King, Suit::Diamonds)),
        ]);
        assert_eq!(
            resolve_full_round(&trick, PlayerCount::Four, &Hand::new()),
            Some(FullRoundVerdict::Award(PlayerId::from("a")))
        );
    }

    #[test]
    fn second_chance_branch_needs_the_initiator_to_cut_last() {
        // Only reachable when the initiator lays a second card after an opponent cut.
        let trick = plays(&[
            ("a", card(Rank::Nine, Suit::Spades)),
            ("b", card(Rank::Seven, Suit::Hearts)),
            ("c", card(Rank::Queen, Suit::Clubs)),
            ("d", card(Rank::King, Suit::Diamonds)),
            ("a", card(Rank::Nine, Suit::Clubs)),
        ]);
        let with_cut = Hand::with_cards(vec![card(Rank::Seven, Suit::Clubs)]);
        assert_eq!(
            resolve_full_round(&trick, PlayerCount::Four, &with_cut),
            Some(FullRoundVerdict::SecondChance)
        );
        let without_cut = Hand::with_cards(vec![card(Rank::Ace, Suit::Clubs)]);
        assert_eq!(
            resolve_full_round(&trick, PlayerCount::Four, &without_cut),
            Some(FullRoundVerdict::Award(PlayerId::from("a")))
        );
    }

    fn any_card() -> impl Strategy<Value = Card> {
        (0usize..8, 0usize..4).prop_map(|(r, s)| {
            Card::new(Rank::ORDERED[r], Suit::ALL[s])
        })
    }

    proptest! {
        #[test]
        fn single_pass_tricks_never_offer_a_second_chance(
            cards in proptest::collection::vec(any_card(), 4),
            spare in proptest::collection::vec(any_card(), 0..4),
        ) {
            let ids = ["a", "b", "c", "d"];
            let entries: Vec<_> = ids.iter().copied().zip(cards.iter().copied()).collect();
            let trick = plays(&entries);
            let hand = Hand::with_cards(spare);
            let verdict = resolve_full_round(&trick, PlayerCount::Four, &hand).unwrap();
            let expected = trick.last_cutter(PlayerCount::Four).unwrap().clone();
            prop_assert_eq!(verdict, FullRoundVerdict::Award(expected));
        }
    }
}
