//! Pluggable move-selection strategies sharing the [`crate::game`] board
//! model. Named `Strategy` rather than `Agent` to avoid colliding with
//! [`crate::game::board::Agent`], the in-game snake entity.

pub mod flood_greedy;
pub mod mcts;
pub mod minimax;
pub mod random;

use std::time::Duration;

use clap::ValueEnum;

use crate::game::board::{Board, Move};

/// One decision-making strategy: given a board and which agent index it is
/// playing, picks a move within the given wall-clock budget.
pub trait Strategy {
    fn step(&mut self, board: &Board, root_idx: usize, deadline: Duration) -> Move;
    fn name(&self) -> &'static str;
}

/// Selects which [`Strategy`] implementation to construct; exposed directly
/// as a `clap` argument so the server and CLI tools share one flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
#[clap(rename_all = "kebab-case")]
pub enum StrategyKind {
    /// Decoupled-UCT MCTS with heuristic-leaf evaluation (production).
    Mcts,
    /// Decoupled-UCT MCTS with random playouts and plain RobustMoves
    /// (the historical V1 baseline).
    MctsLegacy,
    /// Fixed-depth negamax over the flood-fill heuristic.
    Minimax,
    /// Uniformly random rational move.
    Random,
    /// One-ply greedy move maximising the flood-fill heuristic.
    FloodGreedy,
}

impl StrategyKind {
    pub fn build(self) -> Box<dyn Strategy> {
        match self {
            StrategyKind::Mcts => Box::new(mcts::MctsStrategy::production()),
            StrategyKind::MctsLegacy => Box::new(mcts::MctsStrategy::legacy_v1()),
            StrategyKind::Minimax => Box::new(minimax::MinimaxStrategy::default()),
            StrategyKind::Random => Box::new(random::RandomStrategy::default()),
            StrategyKind::FloodGreedy => Box::new(flood_greedy::FloodGreedyStrategy),
        }
    }
}
