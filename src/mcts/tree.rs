//! Arena-backed decoupled-UCT search tree.
//!
//! Nodes own an immutable [`Board`] snapshot; children are addressed by the
//! [`Edge`] (joint move vector) that produced them from their parent.

use crate::env::Direction;
use crate::game::board::{Board, Move};

use super::edge::Edge;

pub type NodeId = usize;

/// One tree node: a board position reached after some joint move, plus the
/// accumulated per-agent statistics used by selection and extraction.
pub struct Node {
    pub board: Board,
    pub depth: usize,
    pub parent: Option<NodeId>,
    pub children: Vec<(Edge, NodeId)>,

    pub n: f64,
    pub totals: Vec<f64>,
    pub total_squares: Vec<f64>,
    /// Set once, the first time this node is found to be terminal; every
    /// later visit propagates this fixed vector instead of rolling out again.
    pub term_totals: Option<Vec<f64>>,
    pub heur_totals: Vec<f64>,
}

impl Node {
    fn new(board: Board, depth: usize, parent: Option<NodeId>) -> Node {
        let agents = board.agents.len();
        Node {
            board,
            depth,
            parent,
            children: Vec::new(),
            n: 0.0,
            totals: vec![0.0; agents],
            total_squares: vec![0.0; agents],
            term_totals: None,
            heur_totals: vec![0.0; agents],
        }
    }

    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    pub fn is_terminal(&self) -> bool {
        self.term_totals.is_some()
    }

    pub fn avg(&self, agent: usize) -> f64 {
        if self.n == 0.0 {
            0.0
        } else {
            self.totals[agent] / self.n
        }
    }

    /// Sample variance of agent `agent`'s per-playout reward, used by the
    /// UCB1-Tuned exploration bonus.
    pub fn variance(&self, agent: usize) -> f64 {
        if self.n <= 1.0 {
            0.0
        } else {
            (self.total_squares[agent] - self.totals[agent] * self.totals[agent] / self.n)
                / (self.n - 1.0)
        }
    }
}

/// The search tree for one decision: every node shares the same `root_idx`
/// (the agent the final move is chosen for).
pub struct Tree {
    nodes: Vec<Node>,
    pub root: NodeId,
    pub root_idx: usize,
}

impl Tree {
    pub fn new(board: Board, root_idx: usize) -> Tree {
        let mut root_node = Node::new(board, 0, None);
        // The root is conceptually already visited once: this makes the
        // first `once()` call expand it immediately instead of treating it
        // as an as-yet-unvisited leaf.
        root_node.n = 1.0;
        Tree {
            nodes: vec![root_node],
            root: 0,
            root_idx,
        }
    }

    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id]
    }

    pub fn node_mut(&mut self, id: NodeId) -> &mut Node {
        &mut self.nodes[id]
    }

    pub fn agent_count(&self) -> usize {
        self.nodes[self.root].board.agents.len()
    }

    pub fn add_child(&mut self, parent: NodeId, edge: Edge, board: Board) -> NodeId {
        let depth = self.nodes[parent].depth + 1;
        let id = self.nodes.len();
        self.nodes.push(Node::new(board, depth, Some(parent)));
        self.nodes[parent].children.push((edge, id));
        id
    }

    pub fn size(&self) -> usize {
        self.nodes.len()
    }

    /// Sum of visit counts, across children of `node`, of edges assigning
    /// `mv` to `agent`; descending order, per move.
    pub fn robust_moves(&self, node: NodeId, agent: usize) -> Vec<Move> {
        let mut totals: Vec<(Move, f64)> =
            Direction::ALL.iter().map(|&m| (m, 0.0)).collect();
        for &(edge, child) in &self.nodes[node].children {
            if let Some(mv) = edge.get(agent) {
                let slot = totals.iter_mut().find(|(m, _)| *m == mv).unwrap();
                slot.1 += self.nodes[child].n;
            }
        }
        totals.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap());
        totals.into_iter().map(|(m, _)| m).collect()
    }

    /// Minimum, over children carrying `mv` for `agent`, of that child's
    /// average reward for `agent`. `f64::MAX` if no child carries it.
    pub fn min_avg_score(&self, node: NodeId, agent: usize, mv: Move) -> f64 {
        self.nodes[node]
            .children
            .iter()
            .filter(|(edge, _)| edge.is(agent, mv))
            .map(|(_, child)| self.nodes[*child].avg(agent))
            .fold(f64::MAX, f64::min)
    }

    /// The most-visited move for `agent`, falling back through progressively
    /// less-visited alternatives until one has a non-certain-loss minimum
    /// average score.
    pub fn robust_safe_move(&self, node: NodeId, agent: usize) -> Move {
        let moves = self.robust_moves(node, agent);
        let mut first = None;
        for mv in moves {
            if first.is_none() {
                first = Some(mv);
            }
            if self.min_avg_score(node, agent, mv) <= -1.0 {
                continue;
            }
            return mv;
        }
        first.unwrap_or_default()
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::game::board::Agent;
    use crate::game::board::Point;

    fn simple_board() -> Board {
        Board::new(11, 11, vec![Agent::new("a", vec![Point::new(5, 5)], 100)])
    }

    #[test]
    fn root_starts_visited_once() {
        let tree = Tree::new(simple_board(), 0);
        assert_eq!(tree.node(tree.root).n, 1.0);
        assert!(tree.node(tree.root).is_leaf());
    }

    #[test]
    fn add_child_links_parent_and_depth() {
        let mut tree = Tree::new(simple_board(), 0);
        let edge = Edge::encode(&[Some(Direction::Up)]);
        let child = tree.add_child(tree.root, edge, simple_board());
        assert_eq!(tree.node(child).depth, 1);
        assert_eq!(tree.node(child).parent, Some(tree.root));
        assert_eq!(tree.node(tree.root).children.len(), 1);
    }

    #[test]
    fn robust_safe_move_skips_certain_losses() {
        let mut tree = Tree::new(simple_board(), 0);
        let losing = Edge::encode(&[Some(Direction::Up)]);
        let winning = Edge::encode(&[Some(Direction::Down)]);
        let lose_child = tree.add_child(tree.root, losing, simple_board());
        let win_child = tree.add_child(tree.root, winning, simple_board());
        tree.node_mut(lose_child).n = 5.0;
        tree.node_mut(lose_child).totals[0] = -5.0;
        tree.node_mut(win_child).n = 1.0;
        tree.node_mut(win_child).totals[0] = 1.0;

        assert_eq!(tree.robust_moves(tree.root, 0)[0], Direction::Up);
        assert_eq!(tree.robust_safe_move(tree.root, 0), Direction::Down);
    }
}
