use crate::model::card::Card;
use crate::model::hand::Hand;
use crate::model::rank::Rank;
use core::fmt;
use serde::{Deserialize, Serialize};

/// Number of seats a room is built for. Fixed for the lifetime of the room.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
#[repr(u8)]
pub enum PlayerCount {
    Two = 2,
    Three = 3,
    Four = 4,
}

impl PlayerCount {
    pub const ALL: [PlayerCount; 3] = [PlayerCount::Two, PlayerCount::Three, PlayerCount::Four];

    pub const fn from_u8(value: u8) -> Option<Self> {
        match value {
            2 => Some(PlayerCount::Two),
            3 => Some(PlayerCount::Three),
            4 => Some(PlayerCount::Four),
            _ => None,
        }
    }

    pub const fn seats(self) -> usize {
        self as usize
    }

    pub const fn deck_size(self) -> usize {
        match self {
            PlayerCount::Three => 30,
            PlayerCount::Two | PlayerCount::Four => 32,
        }
    }

    /// Three-handed games strip two eights and make the rest universal cutters.
    pub const fn eights_cut(self) -> bool {
        matches!(self, PlayerCount::Three)
    }

    pub const fn uses_duel(self) -> bool {
        !matches!(self, PlayerCount::Four)
    }

    pub const fn is_universal_cutter(self, rank: Rank) -> bool {
        matches!(rank, Rank::Seven) || (self.eights_cut() && matches!(rank, Rank::Eight))
    }
}

impl TryFrom<u8> for PlayerCount {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        PlayerCount::from_u8(value).ok_or_else(|| format!("unsupported player count {value}"))
    }
}

impl From<PlayerCount> for u8 {
    fn from(count: PlayerCount) -> Self {
        count as u8
    }
}

impl fmt::Display for PlayerCount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.seats())
    }
}

/// Opaque identifier handed to the engine by whoever owns the connection.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlayerId(String);

impl PlayerId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for PlayerId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for PlayerId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone)]
pub struct Player {
    id: PlayerId,
    hand: Hand,
    collected: Vec<Card>,
}

impl Player {
    pub fn new(id: PlayerId) -> Self {
        Self {
            id,
            hand: Hand::new(),
            collected: Vec::new(),
        }
    }

    pub fn with_hand(id: PlayerId, cards: Vec<Card>) -> Self {
        Self {
            id,
            hand: Hand::with_cards(cards),
            collected: Vec::new(),
        }
    }

    pub fn id(&self) -> &PlayerId {
        &self.id
    }

    pub fn hand(&self) -> &Hand {
        &self.hand
    }

    pub fn hand_mut(&mut self) -> &mut Hand {
        &mut self.hand
    }

    pub fn collected(&self) -> &[Card] {
        &self.collected
    }

    pub fn collect(&mut self, cards: impl IntoIterator<Item = Card>) {
        self.collected.extend(cards);
    }

    /// Empties hand and pile, returning how many cards were dropped.
    pub fn clear(&mut self) -> usize {
        let dropped = self.hand.len() + self.collected.len();
        self.hand.clear();
        self.collected.clear();
        dropped
    }
}
