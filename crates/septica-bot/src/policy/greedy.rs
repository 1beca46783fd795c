use super::{Policy, PolicyContext};
use septica_core::game::{Action, TrickPhase};
use septica_core::model::card::Card;
use septica_core::model::player::PlayerCount;
use septica_core::model::rank::Rank;
use tracing::{Level, event};

/// Keeps its cutters and point cards back until the table is worth taking.
#[derive(Debug, Default, Clone, Copy)]
pub struct GreedyPolicy;

impl GreedyPolicy {
    pub fn new() -> Self {
        Self
    }
}

/// Rough worth of keeping `card` in hand. Points first, then universal cutters.
fn keep_value(card: Card, count: PlayerCount) -> u8 {
    let base = card.rank.value();
    if card.is_point() {
        40 + base
    } else if count.is_universal_cutter(card.rank) {
        20 + base
    } else {
        base
    }
}

fn cheapest(cards: impl IntoIterator<Item = Card>, count: PlayerCount) -> Option<Card> {
    cards.into_iter().min_by_key(|&card| keep_value(card, count))
}

/// Cheapest cut, preferring a matching rank over spending a universal cutter.
fn cheapest_cut(cards: &[Card], lead: Rank, count: PlayerCount) -> Option<Card> {
    let cuts = cards.iter().copied().filter(|card| card.cuts(lead, count));
    cuts.min_by_key(|&card| (card.rank != lead, keep_value(card, count)))
}

impl GreedyPolicy {
    fn lead(&self, cards: &[Card], count: PlayerCount) -> (Option<Card>, &'static str) {
        // Lead a rank we hold twice so a cut can be answered.
        let paired = cards
            .iter()
            .copied()
            .filter(|card| !card.is_point())
            .filter(|card| cards.iter().filter(|c| c.rank == card.rank).count() > 1);
        if let Some(card) = cheapest(paired, count) {
            return (Some(card), "lead_pair");
        }
        (cheapest(cards.iter().copied(), count), "lead_cheapest")
    }

    fn respond(
        &self,
        cards: &[Card],
        lead: Rank,
        count: PlayerCount,
        table_points: usize,
    ) -> (Option<Card>, &'static str) {
        if table_points > 0 {
            if let Some(card) = cheapest_cut(cards, lead, count) {
                return (Some(card), "cut_for_points");
            }
        }
        let shed = cards
            .iter()
            .copied()
            .filter(|card| !card.cuts(lead, count) && !card.is_point());
        if let Some(card) = cheapest(shed, count) {
            return (Some(card), "shed");
        }
        (cheapest(cards.iter().copied(), count), "shed_forced")
    }

    fn decide(
        &self,
        cards: &[Card],
        lead: Rank,
        count: PlayerCount,
        table_points: usize,
    ) -> (Action, &'static str) {
        let Some(cut) = cheapest_cut(cards, lead, count) else {
            return (Action::Pass, "no_cut");
        };
        if table_points > 0 {
            return (Action::Play(cut), "recut_for_points");
        }
        let spare = cards.iter().filter(|card| card.cuts(lead, count)).count() > 1;
        if spare {
            return (Action::Play(cut), "recut_spare");
        }
        (Action::Pass, "hold_cut")
    }
}

impl Policy for GreedyPolicy {
    fn name(&self) -> &str {
        "greedy"
    }

    fn choose(&mut self, ctx: &PolicyContext) -> Action {
        let legal = ctx.legal_actions();
        let count = ctx.count();
        let table_points = ctx.table_points();
        let cards = ctx.hand().map(|hand| hand.cards()).unwrap_or_default();

        let (preferred, reason) = match (ctx.phase(), ctx.lead()) {
            (TrickPhase::AwaitingInitiator, Some(lead)) => {
                self.decide(cards, lead, count, table_points)
            }
            (TrickPhase::AwaitingResponse | TrickPhase::Following, Some(lead)) => {
                let (card, reason) = self.respond(cards, lead, count, table_points);
                (card.map_or(Action::Pass, Action::Play), reason)
            }
            _ => {
                let (card, reason) = self.lead(cards, count);
                (card.map_or(Action::Pass, Action::Play), reason)
            }
        };

        let (chosen, reason) = if legal.contains(&preferred) || legal.is_empty() {
            (preferred, reason)
        } else {
            (legal[0], "fallback_first_legal")
        };

        event!(
            target: "septica_bot::greedy",
            Level::DEBUG,
            player = %ctx.player,
            phase = ?ctx.phase(),
            legal_count = legal.len(),
            table_points,
            chosen = ?chosen,
            reason,
        );
        chosen
    }
}
