//! Decoupled-UCT Monte Carlo tree search over simultaneous joint moves.

pub mod driver;
pub mod edge;
pub mod tree;

pub use driver::{check_terminal, once, select_move, Opts};
pub use edge::Edge;
pub use tree::{Node, NodeId, Tree};
