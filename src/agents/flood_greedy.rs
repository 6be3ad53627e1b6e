//! One-ply greedy baseline: picks the rational move that maximises the
//! flood-fill heuristic score for the root agent one turn out, ignoring how
//! opponents might reply. Far cheaper than MCTS or minimax; kept around as
//! a fast comparison point for benchmarking, never the production decision
//! procedure.

use std::time::Duration;

use crate::game::board::{Board, Move};
use crate::game::floodfill::{calc, HeurFactors};
use crate::game::rules::{gen_move_set, next_state};

use super::Strategy;

pub struct FloodGreedyStrategy;

impl Strategy for FloodGreedyStrategy {
    fn step(&mut self, board: &Board, root_idx: usize, _deadline: Duration) -> Move {
        let factors = HeurFactors::default();
        let mut best_score = f64::MIN;
        let mut best_move = Move::default();

        for moves in gen_move_set(board) {
            let Some(mv) = moves[root_idx] else { continue };
            let Ok(next) = next_state(board, &moves) else { continue };
            let scores = calc(&factors, &next);
            if scores[root_idx] > best_score {
                best_score = scores[root_idx];
                best_move = mv;
            }
        }

        best_move
    }

    fn name(&self) -> &'static str {
        "flood-greedy"
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::env::Direction;
    use crate::game::board::{Agent, Point};
    use crate::game::rules::is_rational;

    #[test]
    fn picks_a_rational_move_toward_food() {
        let board = Board::new(
            11,
            11,
            vec![Agent::new(
                "a",
                vec![Point::new(5, 5), Point::new(5, 4), Point::new(5, 3)],
                50,
            )],
        );
        let mut strategy = FloodGreedyStrategy;
        let mv = strategy.step(&board, 0, Duration::from_millis(5));
        assert!(is_rational(&board, 0, mv));
        assert_ne!(mv, Direction::Down);
    }
}
