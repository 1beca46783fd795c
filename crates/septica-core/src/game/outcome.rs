use crate::game::protocol::TrickPhase;
use crate::model::card::Card;
use crate::model::player::PlayerId;
use crate::model::rank::Rank;
use thiserror::Error;

/// Something a seated player can do on their turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Play(Card),
    Pass,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlayOutcome {
    /// Card is on the table and the trick continues.
    Played,
    /// The initiator was cut and must re-cut or pass.
    AwaitingInitiator { initiator: PlayerId },
    TrickWon { winner: PlayerId, game_over: bool },
}

impl PlayOutcome {
    pub fn trick_winner(&self) -> Option<&PlayerId> {
        match self {
            PlayOutcome::TrickWon { winner, .. } => Some(winner),
            _ => None,
        }
    }
}

/// Why an action was refused. A rejected action never changes room state.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Rejection {
    #[error("game has not started")]
    NotStarted,
    #[error("game is over")]
    GameOver,
    #[error("player {0} is not seated in this room")]
    UnknownPlayer(PlayerId),
    #[error("expected {expected} to act but got {actual}")]
    OutOfTurn { expected: PlayerId, actual: PlayerId },
    #[error("{0} is not in hand")]
    CardNotHeld(Card),
    #[error("{card} does not cut a lead of {lead}")]
    NotCutting { card: Card, lead: Rank },
    #[error("no decision is pending for {0}")]
    NotAwaitingDecision(PlayerId),
    #[error("action does not fit the {0:?} phase")]
    WrongPhase(TrickPhase),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RosterError {
    #[error("room is full ({capacity} seats)")]
    RoomFull { capacity: usize },
    #[error("player {0} already has a seat")]
    AlreadySeated(PlayerId),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Departure {
    Removed,
    /// The leaver was mid-game; every card went back and the room waits to restart.
    GameVoided,
}
