//! A classical negamax/max-n search, used as a standalone alternative to the
//! decoupled-UCT engine. Built on the same board/simulator types but its own
//! arena tree; it never interleaves with MCTS iterations.

use std::time::{Duration, Instant};

use crate::env::Direction;
use crate::game::board::{Board, Move};
use crate::game::floodfill::{self, HeurFactors};
use crate::game::rules::{gen_move_set, next_state};
use crate::mcts::{check_terminal, Edge, NodeId, Tree};

/// Deep minimax recursion is pruned past this depth and evaluated with the
/// static heuristic immediately, regardless of the requested ply. Unlike
/// MCTS, which never short-circuits a playout this way, the minimax variant
/// bounds its own worst-case recursion.
const DEPTH_PRUNE: usize = 20;

/// Per-agent outcome of one negamax pass: the move it should make and the
/// guaranteed (minimum-over-replies) score that move secures.
#[derive(Debug, Clone, Copy)]
pub struct AgentChoice {
    pub mv: Option<Move>,
    pub score: f64,
}

/// Expands `node` `ply` layers deep (or until [`DEPTH_PRUNE`] total depth is
/// reached), evaluating leaves with [`floodfill::calc`], and returns each
/// agent's best guaranteed move at `node`.
pub fn minimax(tree: &mut Tree, node: NodeId, factors: &HeurFactors, ply: usize) -> Vec<AgentChoice> {
    if tree.node(node).depth >= DEPTH_PRUNE {
        return evaluate_leaf(tree, node, factors);
    }

    let board = tree.node(node).board.clone();
    for moves in gen_move_set(&board) {
        let next = next_state(&board, &moves)
            .expect("gen_move_set only yields moves next_state accepts");
        let edge = Edge::encode(&moves);
        let child = tree.add_child(node, edge, next);

        if let Some(totals) = check_terminal(&tree.node(child).board, tree.root_idx) {
            tree.node_mut(child).term_totals = Some(totals.clone());
            tree.node_mut(child).totals = totals;
            tree.node_mut(child).n = 1.0;
            continue;
        }

        if ply <= 1 {
            evaluate_leaf(tree, child, factors);
        } else {
            minimax(tree, child, factors, ply - 1);
        }
    }

    propagate_minimax(tree, node)
}

fn evaluate_leaf(tree: &mut Tree, node: NodeId, factors: &HeurFactors) -> Vec<AgentChoice> {
    let totals = floodfill::calc(factors, &tree.node(node).board);
    let n = tree.node_mut(node);
    n.heur_totals = totals.clone();
    n.totals = totals.clone();
    n.n = 1.0;
    totals
        .into_iter()
        .map(|score| AgentChoice { mv: None, score })
        .collect()
}

/// For each agent, picks the move maximising the minimum score any of that
/// move's children guarantee it, then stores the result as `node`'s own
/// score vector so the parent's recursion sees it as a plain leaf value.
fn propagate_minimax(tree: &mut Tree, node: NodeId) -> Vec<AgentChoice> {
    let n = tree.agent_count();
    let mut result = Vec::with_capacity(n);

    for i in 0..n {
        let mut best: Option<(Move, f64)> = None;
        for &mv in Direction::ALL.iter() {
            let mut min: Option<f64> = None;
            for &(edge, child) in &tree.node(node).children {
                if edge.is(i, mv) {
                    let v = tree.node(child).totals[i];
                    min = Some(min.map_or(v, |m| m.min(v)));
                }
            }
            if let Some(min_v) = min {
                if best.map_or(true, |(_, s)| s < min_v) {
                    best = Some((mv, min_v));
                }
            }
        }

        let (mv, score) = match best {
            Some((mv, score)) => (Some(mv), score),
            None => (None, 0.0),
        };
        tree.node_mut(node).heur_totals[i] = score;
        tree.node_mut(node).totals[i] = score;
        result.push(AgentChoice { mv, score });
    }

    tree.node_mut(node).n += 1.0;
    result
}

/// Runs a fixed-ply negamax from scratch and returns the root agent's move,
/// falling back to `Up` if every option is immediately fatal.
pub fn select_move(board: &Board, root_idx: usize, factors: &HeurFactors, ply: usize) -> Move {
    let mut tree = Tree::new(board.clone(), root_idx);
    let choices = minimax(&mut tree, tree.root, factors, ply);
    choices[root_idx].mv.unwrap_or_default()
}

/// Iterative deepening within a wall-clock budget: re-runs [`minimax`] at
/// increasing ply until the deadline, keeping the deepest completed result.
/// Each depth is a fresh tree; this does not interleave with MCTS state.
pub fn select_move_deadline(board: &Board, root_idx: usize, factors: &HeurFactors, deadline: Duration) -> Move {
    let t0 = Instant::now();
    let mut best = Direction::Up;
    let mut ply = 1;
    while t0.elapsed() < deadline {
        let mv = select_move(board, root_idx, factors, ply);
        best = mv;
        ply += 1;
        if ply > DEPTH_PRUNE {
            break;
        }
    }
    best
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::game::board::{Agent, EliminationCause, Point};

    fn board_with(bodies: &[&[(i16, i16)]]) -> Board {
        let agents = bodies
            .iter()
            .enumerate()
            .map(|(i, body)| {
                Agent::new(
                    format!("s{i}"),
                    body.iter().map(|&(x, y)| Point::new(x, y)).collect(),
                    100,
                )
            })
            .collect();
        Board::new(11, 11, agents)
    }

    #[test]
    fn single_ply_picks_a_legal_move() {
        let board = board_with(&[&[(5, 5), (5, 4), (5, 3)]]);
        let mv = select_move(&board, 0, &HeurFactors::default(), 1);
        assert_ne!(mv, Direction::Down); // would hit the neck
    }

    #[test]
    fn terminal_root_scores_minus_one() {
        let mut board = board_with(&[&[(5, 5), (5, 4)]]);
        board.agents[0].eliminated = Some(EliminationCause::WallCollision);
        let mut tree = Tree::new(board, 0);
        let choices = minimax(&mut tree, tree.root, &HeurFactors::default(), 2);
        assert_eq!(choices[0].score, -1.0);
    }

    #[test]
    fn deeper_ply_explores_more_nodes() {
        let board = board_with(&[&[(5, 5), (5, 4), (5, 3)]]);
        let mut shallow = Tree::new(board.clone(), 0);
        minimax(&mut shallow, shallow.root, &HeurFactors::default(), 1);
        let mut deep = Tree::new(board, 0);
        minimax(&mut deep, deep.root, &HeurFactors::default(), 2);
        assert!(deep.size() > shallow.size());
    }
}
