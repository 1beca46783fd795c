use crate::model::card::Card;
use crate::model::player::{Player, PlayerId};
use crate::model::rank::Rank;
use serde::{Deserialize, Serialize};

/// Holding every ten and every ace doubles the haul.
const SWEEP_MULTIPLIER: u32 = 2;
const COPIES_PER_RANK: usize = 4;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeatScore {
    pub player: PlayerId,
    pub tens: usize,
    pub aces: usize,
    pub points: u32,
}

impl SeatScore {
    pub fn from_pile(player: PlayerId, collected: &[Card]) -> Self {
        let tens = collected.iter().filter(|c| c.rank == Rank::Ten).count();
        let aces = collected.iter().filter(|c| c.rank == Rank::Ace).count();
        let mut points = (tens + aces) as u32;
        if tens == COPIES_PER_RANK && aces == COPIES_PER_RANK {
            points *= SWEEP_MULTIPLIER;
        }
        Self {
            player,
            tens,
            aces,
            points,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Winner {
    Single(PlayerId),
    Tied(Vec<PlayerId>),
}

impl Winner {
    pub fn ids(&self) -> Vec<&PlayerId> {
        match self {
            Winner::Single(id) => vec![id],
            Winner::Tied(ids) => ids.iter().collect(),
        }
    }

    pub fn includes(&self, player: &PlayerId) -> bool {
        self.ids().contains(&player)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameResult {
    pub winner: Winner,
    pub points: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScoreBoard {
    seats: Vec<SeatScore>,
}

impl ScoreBoard {
    pub fn tally(players: &[Player]) -> Self {
        let seats = players
            .iter()
            .map(|p| SeatScore::from_pile(p.id().clone(), p.collected()))
            .collect();
        Self { seats }
    }

    pub fn seats(&self) -> &[SeatScore] {
        &self.seats
    }

    pub fn score(&self, player: &PlayerId) -> Option<u32> {
        self.seats
            .iter()
            .find(|seat| &seat.player == player)
            .map(|seat| seat.points)
    }

    /// Highest total wins; equal totals at the top are reported together.
    pub fn result(&self) -> Option<GameResult> {
        let points = self.seats.iter().map(|seat| seat.points).max()?;
        let mut leaders: Vec<PlayerId> = self
            .seats
            .iter()
            .filter(|seat| seat.points == points)
            .map(|seat| seat.player.clone())
            .collect();
        let winner = if leaders.len() == 1 {
            Winner::Single(leaders.remove(0))
        } else {
            Winner::Tied(leaders)
        };
        Some(GameResult { winner, points })
    }
}
