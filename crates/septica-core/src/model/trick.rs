use crate::model::card::Card;
use crate::model::player::{PlayerCount, PlayerId};
use crate::model::rank::Rank;
use serde::{Deserialize, Serialize};

/// Cards on the table for the trick in progress, in play order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Trick {
    plays: Vec<Play>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Play {
    pub player_id: PlayerId,
    pub card: Card,
}

impl Trick {
    pub fn new() -> Self {
        Self {
            plays: Vec::with_capacity(4),
        }
    }

    pub fn from_plays(plays: Vec<Play>) -> Self {
        Self { plays }
    }

    pub fn plays(&self) -> &[Play] {
        &self.plays
    }

    pub fn len(&self) -> usize {
        self.plays.len()
    }

    pub fn is_empty(&self) -> bool {
        self.plays.is_empty()
    }

    pub fn push(&mut self, player_id: PlayerId, card: Card) {
        self.plays.push(Play { player_id, card });
    }

    pub fn lead(&self) -> Option<&Play> {
        self.plays.first()
    }

    pub fn lead_rank(&self) -> Option<Rank> {
        self.lead().map(|play| play.card.rank)
    }

    /// Whoever led this trick.
    pub fn initiator(&self) -> Option<&PlayerId> {
        self.lead().map(|play| &play.player_id)
    }

    pub fn last_play(&self) -> Option<&Play> {
        self.plays.last()
    }

    /// Scans in play order; the most recent cutting card wins, the lead by default.
    pub fn last_cutter(&self, count: PlayerCount) -> Option<&PlayerId> {
        let lead = self.lead_rank()?;
        self.plays
            .iter()
            .filter(|play| play.card.cuts(lead, count))
            .map(|play| &play.player_id)
            .last()
    }

    /// True when someone other than the initiator laid a cutting card.
    pub fn opponent_cut(&self, count: PlayerCount) -> bool {
        let (Some(initiator), Some(lead)) = (self.initiator(), self.lead_rank()) else {
            return false;
        };
        self.plays
            .iter()
            .any(|play| &play.player_id != initiator && play.card.cuts(lead, count))
    }

    pub fn point_cards(&self) -> usize {
        self.plays.iter().filter(|play| play.card.is_point()).count()
    }

    pub fn take_cards(&mut self) -> Vec<Card> {
        self.plays.drain(..).map(|play| play.card).collect()
    }

    pub fn clear(&mut self) {
        self.plays.clear();
    }
}
