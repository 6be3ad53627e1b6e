use std::time::Duration;

use rand::rngs::SmallRng;
use rand::Rng;
use rand::SeedableRng;

use crate::env::Direction;
use crate::game::board::{Board, Move};
use crate::game::rules::is_rational;

use super::Strategy;

/// Uniformly picks among the rational moves, or `Up` if none exist.
pub struct RandomStrategy {
    rng: SmallRng,
}

impl Default for RandomStrategy {
    fn default() -> Self {
        RandomStrategy {
            rng: SmallRng::from_entropy(),
        }
    }
}

impl Strategy for RandomStrategy {
    fn step(&mut self, board: &Board, root_idx: usize, _deadline: Duration) -> Move {
        let rational: Vec<Move> = Direction::iter().filter(|&m| is_rational(board, root_idx, m)).collect();
        if rational.is_empty() {
            Direction::Up
        } else {
            rational[self.rng.gen_range(0..rational.len())]
        }
    }

    fn name(&self) -> &'static str {
        "random"
    }
}
