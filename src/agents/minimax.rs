use std::time::Duration;

use crate::game::board::{Board, Move};
use crate::game::floodfill::HeurFactors;
use crate::search::select_move_deadline;

use super::Strategy;

/// Fixed-depth negamax over the flood-fill heuristic, iteratively deepened
/// within the step's deadline.
pub struct MinimaxStrategy {
    factors: HeurFactors,
}

impl Default for MinimaxStrategy {
    fn default() -> Self {
        MinimaxStrategy {
            factors: HeurFactors::default(),
        }
    }
}

impl Strategy for MinimaxStrategy {
    fn step(&mut self, board: &Board, root_idx: usize, deadline: Duration) -> Move {
        select_move_deadline(board, root_idx, &self.factors, deadline)
    }

    fn name(&self) -> &'static str {
        "minimax"
    }
}
