use crate::model::card::Card;
use crate::model::player::PlayerCount;
use crate::model::rank::Rank;

/// Cards held by one seat, in the order they were dealt or drawn.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Hand {
    cards: Vec<Card>,
}

impl Hand {
    pub const FULL: usize = 4;

    pub fn new() -> Self {
        Self {
            cards: Vec::with_capacity(Self::FULL),
        }
    }

    pub fn with_cards(cards: Vec<Card>) -> Self {
        Self { cards }
    }

    pub fn add(&mut self, card: Card) {
        self.cards.push(card);
    }

    pub fn remove(&mut self, card: Card) -> bool {
        if let Some(index) = self.cards.iter().position(|&c| c == card) {
            self.cards.remove(index);
            true
        } else {
            false
        }
    }

    pub fn contains(&self, card: Card) -> bool {
        self.cards.contains(&card)
    }

    pub fn len(&self) -> usize {
        self.cards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    pub fn needs_cards(&self) -> bool {
        self.cards.len() < Self::FULL
    }

    pub fn clear(&mut self) {
        self.cards.clear();
    }

    pub fn iter(&self) -> impl Iterator<Item = &Card> {
        self.cards.iter()
    }

    pub fn cards(&self) -> &[Card] {
        &self.cards
    }

    pub fn cutting_cards(&self, lead: Rank, count: PlayerCount) -> impl Iterator<Item = Card> + '_ {
        self.cards
            .iter()
            .copied()
            .filter(move |card| card.cuts(lead, count))
    }

    pub fn has_cut(&self, lead: Rank, count: PlayerCount) -> bool {
        self.cutting_cards(lead, count).next().is_some()
    }
}
