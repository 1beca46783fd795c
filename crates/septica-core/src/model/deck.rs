use crate::model::card::Card;
use crate::model::player::PlayerCount;
use crate::model::rank::Rank;
use crate::model::suit::Suit;
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use std::collections::VecDeque;

/// Eights removed from a three-handed deck.
const THREE_HANDED_DROPPED_EIGHTS: usize = 2;

#[derive(Debug, Clone, Default)]
pub struct Deck {
    cards: VecDeque<Card>,
}

impl Deck {
    /// Suit-major 7..A deck, minus the first two eights for three players.
    pub fn for_players(count: PlayerCount) -> Self {
        let mut cards = VecDeque::with_capacity(32);
        let mut eights_to_drop = if count.eights_cut() {
            THREE_HANDED_DROPPED_EIGHTS
        } else {
            0
        };
        for suit in Suit::ALL.iter().copied() {
            for rank in Rank::ORDERED.iter().copied() {
                if rank == Rank::Eight && eights_to_drop > 0 {
                    eights_to_drop -= 1;
                    continue;
                }
                cards.push_back(Card::new(rank, suit));
            }
        }
        Self { cards }
    }

    pub fn shuffled<R: rand::Rng + ?Sized>(count: PlayerCount, rng: &mut R) -> Self {
        let mut deck = Self::for_players(count);
        deck.shuffle_in_place(rng);
        deck
    }

    pub fn shuffled_with_seed(count: PlayerCount, seed: u64) -> Self {
        let mut rng = StdRng::seed_from_u64(seed);
        Self::shuffled(count, &mut rng)
    }

    /// Deck in exactly the given order; the first card is drawn first.
    pub fn from_cards(cards: Vec<Card>) -> Self {
        Self {
            cards: cards.into(),
        }
    }

    pub fn shuffle_in_place<R: rand::Rng + ?Sized>(&mut self, rng: &mut R) {
        self.cards.make_contiguous().shuffle(rng);
    }

    pub fn draw(&mut self) -> Option<Card> {
        self.cards.pop_front()
    }

    pub fn draw_many(&mut self, count: usize) -> Vec<Card> {
        let take = count.min(self.cards.len());
        self.cards.drain(..take).collect()
    }

    pub fn len(&self) -> usize {
        self.cards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    pub fn clear(&mut self) {
        self.cards.clear();
    }

    pub fn cards(&self) -> impl Iterator<Item = &Card> {
        self.cards.iter()
    }
}
