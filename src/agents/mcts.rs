use std::time::Duration;

use rand::rngs::SmallRng;
use rand::SeedableRng;

use crate::game::board::{Board, Move};
use crate::mcts::{select_move, Opts};

use super::Strategy;

/// The decoupled-UCT engine, wrapped with its own PRNG so a server holding
/// several of these (one per concurrent game) gets independent streams.
pub struct MctsStrategy {
    opts: Opts,
    rng: SmallRng,
    name: &'static str,
}

impl MctsStrategy {
    pub fn production() -> Self {
        MctsStrategy {
            opts: Opts::production(),
            rng: SmallRng::from_entropy(),
            name: "mcts",
        }
    }

    pub fn legacy_v1() -> Self {
        MctsStrategy {
            opts: Opts::legacy_v1(),
            rng: SmallRng::from_entropy(),
            name: "mcts-legacy",
        }
    }
}

impl Strategy for MctsStrategy {
    fn step(&mut self, board: &Board, root_idx: usize, deadline: Duration) -> Move {
        select_move(board, root_idx, &self.opts, deadline, &mut self.rng)
    }

    fn name(&self) -> &'static str {
        self.name
    }
}
