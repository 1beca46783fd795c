mod greedy;
mod random;

pub use greedy::GreedyPolicy;
pub use random::RandomPolicy;

use core::fmt;
use core::str::FromStr;
use septica_core::game::{Action, GameRoom, TrickPhase};
use septica_core::model::hand::Hand;
use septica_core::model::player::{PlayerCount, PlayerId};
use septica_core::model::rank::Rank;

/// Context provided to policies for decision-making
pub struct PolicyContext<'a> {
    pub player: &'a PlayerId,
    pub room: &'a GameRoom,
}

impl<'a> PolicyContext<'a> {
    pub fn new(player: &'a PlayerId, room: &'a GameRoom) -> Self {
        Self { player, room }
    }

    /// Context for whoever holds the turn, if anyone does.
    pub fn for_current(room: &'a GameRoom) -> Option<Self> {
        room.current_player().map(|player| Self { player, room })
    }

    pub fn hand(&self) -> Option<&'a Hand> {
        self.room.player(self.player).map(|p| p.hand())
    }

    pub fn legal_actions(&self) -> Vec<Action> {
        self.room.legal_actions(self.player)
    }

    pub fn phase(&self) -> TrickPhase {
        self.room.phase()
    }

    pub fn lead(&self) -> Option<Rank> {
        self.room.current_lead()
    }

    pub fn count(&self) -> PlayerCount {
        self.room.player_count()
    }

    pub fn table_points(&self) -> usize {
        self.room.trick().point_cards()
    }
}

/// Chooses one action for the seat on turn.
pub trait Policy: Send {
    fn name(&self) -> &str;

    /// Must return one of `ctx.legal_actions()` whenever that list is non-empty.
    fn choose(&mut self, ctx: &PolicyContext) -> Action;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PolicyKind {
    Random,
    Greedy,
}

impl PolicyKind {
    pub const ALL: [PolicyKind; 2] = [PolicyKind::Random, PolicyKind::Greedy];

    pub const fn as_str(self) -> &'static str {
        match self {
            PolicyKind::Random => "random",
            PolicyKind::Greedy => "greedy",
        }
    }

    /// Seed only matters for policies that roll dice.
    pub fn build(self, seed: u64) -> Box<dyn Policy> {
        match self {
            PolicyKind::Random => Box::new(RandomPolicy::new(seed)),
            PolicyKind::Greedy => Box::new(GreedyPolicy::new()),
        }
    }
}

impl fmt::Display for PolicyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PolicyKind {
    type Err = String;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "random" | "uniform" => Ok(PolicyKind::Random),
            "greedy" | "heuristic" => Ok(PolicyKind::Greedy),
            other => Err(format!("unknown policy kind '{other}'")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{PolicyContext, PolicyKind};
    use septica_core::game::GameRoom;
    use septica_core::model::player::{PlayerCount, PlayerId};

    #[test]
    fn kinds_parse_from_config_names() {
        assert_eq!("random".parse::<PolicyKind>(), Ok(PolicyKind::Random));
        assert_eq!(" Greedy ".parse::<PolicyKind>(), Ok(PolicyKind::Greedy));
        assert_eq!("heuristic".parse::<PolicyKind>(), Ok(PolicyKind::Greedy));
        assert!("mcts".parse::<PolicyKind>().is_err());
        for kind in PolicyKind::ALL {
            assert_eq!(kind.as_str().parse::<PolicyKind>(), Ok(kind));
            assert_eq!(kind.build(1).name(), kind.as_str());
        }
    }

    #[test]
    fn context_follows_the_turn() {
        let mut room = GameRoom::with_seed("room", PlayerCount::Two, 4);
        assert!(PolicyContext::for_current(&room).is_none());
        room.add_player(PlayerId::from("a")).unwrap();
        room.add_player(PlayerId::from("b")).unwrap();
        room.start();
        let ctx = PolicyContext::for_current(&room).unwrap();
        assert_eq!(ctx.player, &PlayerId::from("a"));
        assert_eq!(ctx.hand().map(|h| h.len()), Some(4));
        assert_eq!(ctx.legal_actions().len(), 4);
        assert_eq!(ctx.table_points(), 0);
    }
}
