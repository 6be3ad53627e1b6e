//! Alternative search strategies built on the same board/simulator core as
//! the decoupled-UCT engine in [`crate::mcts`].

pub mod minimax;

pub use minimax::{select_move, select_move_deadline, AgentChoice};
