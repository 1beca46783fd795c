use super::{Policy, PolicyContext};
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use septica_core::game::Action;
use tracing::{Level, event};

/// Uniform over whatever the room would accept.
pub struct RandomPolicy {
    rng: StdRng,
}

impl RandomPolicy {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl Policy for RandomPolicy {
    fn name(&self) -> &str {
        "random"
    }

    fn choose(&mut self, ctx: &PolicyContext) -> Action {
        let legal = ctx.legal_actions();
        let chosen = legal.choose(&mut self.rng).copied().unwrap_or(Action::Pass);
        event!(
            target: "septica_bot::random",
            Level::DEBUG,
            player = %ctx.player,
            legal_count = legal.len(),
            chosen = ?chosen,
        );
        chosen
    }
}
