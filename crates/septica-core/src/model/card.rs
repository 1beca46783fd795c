use crate::model::player::PlayerCount;
use crate::model::rank::Rank;
use crate::model::suit::Suit;
use core::fmt;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Card {
    pub rank: Rank,
    pub suit: Suit,
}

impl Card {
    pub const fn new(rank: Rank, suit: Suit) -> Self {
        Self { rank, suit }
    }

    /// A card cuts when it matches the lead rank or is a universal cutter for
    /// this table size.
    pub const fn cuts(self, lead: Rank, count: PlayerCount) -> bool {
        self.rank as u8 == lead as u8 || count.is_universal_cutter(self.rank)
    }

    pub const fn is_point(self) -> bool {
        self.rank.is_point()
    }
}

impl fmt::Display for Card {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.rank, self.suit)
    }
}
