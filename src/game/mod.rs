//! Game model: the immutable board, the rules simulator and the flood-fill
//! heuristic built on top of it.

pub mod board;
pub mod floodfill;
pub mod rules;

pub use board::{Agent, Board, EliminationCause, Move, Point, RuleSet};
