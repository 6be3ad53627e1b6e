//! The decoupled-UCT search loop: one playable iteration (`once`), the
//! wall-clock-bounded `select_move` driver, and the parameter bundle that
//! tunes both.

use std::time::{Duration, Instant};

use rand::Rng;

use crate::env::Direction;
use crate::game::board::{Board, Move, RuleSet};
use crate::game::floodfill::{self, HeurFactors};
use crate::game::rules::{gen_move_set, is_losing_h2h, is_rational, next_state, permutations, RulesError};

use super::edge::Edge;
use super::tree::{NodeId, Tree};

/// The recognized tunable fields of a search configuration. Not all
/// combinations are meaningful: `leaf_playout` and `leaf_heur` are mutually
/// exclusive.
#[derive(Debug, Clone)]
pub struct Opts {
    pub version: u8,
    pub ucb1_c: f64,
    pub max_playout: usize,
    pub select_random: f64,
    pub select_heur: bool,
    pub heur_factors: Option<HeurFactors>,
    pub greedy_prob: f64,
    pub tuned: bool,
    pub playout_max_heur: bool,
    pub leaf_playout: bool,
    pub leaf_heur: bool,
    pub avoid_lh2h: bool,
}

impl Opts {
    /// Production configuration (V3/V5 in the historical naming): heuristic
    /// leaf evaluation, losing head-to-head avoidance at expansion, and the
    /// UCB1-Tuned exploration bonus.
    pub fn production() -> Opts {
        Opts {
            version: 3,
            ucb1_c: 4.0,
            max_playout: 30,
            select_random: 20.0,
            select_heur: false,
            heur_factors: Some(HeurFactors::default()),
            greedy_prob: 0.0,
            tuned: true,
            playout_max_heur: false,
            leaf_playout: false,
            leaf_heur: true,
            avoid_lh2h: true,
        }
    }

    /// The legacy V1 baseline: random-rational playouts to a fixed depth,
    /// plain RobustMoves extraction, no heuristic leaf or H2H avoidance.
    pub fn legacy_v1() -> Opts {
        Opts {
            version: 1,
            ucb1_c: 4.0,
            max_playout: 30,
            select_random: 20.0,
            select_heur: false,
            heur_factors: None,
            greedy_prob: 0.0,
            tuned: true,
            playout_max_heur: false,
            leaf_playout: true,
            leaf_heur: false,
            avoid_lh2h: false,
        }
    }
}

impl Default for Opts {
    fn default() -> Self {
        Opts::production()
    }
}

/// Runs one full selection/expansion/evaluation/propagation cycle.
pub fn once<R: Rng>(tree: &mut Tree, opts: &Opts, rng: &mut R) -> Result<(), RulesError> {
    let leaf = selection(tree, opts, rng);

    if tree.node(leaf).is_terminal() {
        let totals = tree.node(leaf).term_totals.clone().expect("is_terminal implies term_totals");
        propagate(tree, leaf, &totals);
        return Ok(());
    }

    let leaf = if tree.node(leaf).n == 1.0 {
        expansion(tree, leaf, opts)?
    } else {
        leaf
    };
    debug_assert_eq!(tree.node(leaf).n, 0.0, "playout visited an already-visited node");

    if let Some(totals) = check_terminal(&tree.node(leaf).board, tree.root_idx) {
        tree.node_mut(leaf).term_totals = Some(totals.clone());
        propagate(tree, leaf, &totals);
        return Ok(());
    }

    let totals = if opts.leaf_heur {
        floodfill::calc(
            opts.heur_factors.as_ref().unwrap_or(&HeurFactors::default()),
            &tree.node(leaf).board,
        )
    } else {
        playout(&tree.node(leaf).board, opts, rng)?
    };
    tree.node_mut(leaf).heur_totals = totals.clone();
    propagate(tree, leaf, &totals);
    Ok(())
}

fn selection<R: Rng>(tree: &Tree, opts: &Opts, rng: &mut R) -> NodeId {
    let mut current = tree.root;
    loop {
        let node = tree.node(current);
        if node.is_leaf() {
            return current;
        }

        if let Some(&(_, unvisited)) = node.children.iter().find(|(_, c)| tree.node(*c).n == 0.0) {
            return unvisited;
        }

        if node.n < opts.select_random {
            let idx = rng.gen_range(0..node.children.len());
            current = node.children[idx].1;
            continue;
        }

        let agents = tree.agent_count();
        let mut choice: Vec<Option<Move>> = vec![None; agents];
        for i in 0..agents {
            let mut best = f64::MIN;
            for &mv in Direction::ALL.iter() {
                let (sum_n, sum_totals, sum_sq, sum_heur) = node
                    .children
                    .iter()
                    .filter(|(edge, _)| edge.is(i, mv))
                    .map(|(_, c)| tree.node(*c))
                    .fold((0.0, 0.0, 0.0, 0.0), |(n, t, s, h), c| {
                        (n + c.n, t + c.totals[i], s + c.total_squares[i], h + c.heur_totals[i])
                    });
                if sum_n == 0.0 {
                    continue;
                }
                let mean = sum_totals / sum_n;
                let c = if opts.tuned {
                    let variance = (sum_sq / sum_n - mean * mean).max(0.0);
                    (variance + (2.0 * node.n.ln() / sum_n).sqrt()).min(0.25)
                } else {
                    opts.ucb1_c
                };
                let bonus = (c * node.n.ln() / sum_n).sqrt();
                let heur_bias = if opts.select_heur { sum_heur / (sum_n + 1.0) } else { 0.0 };
                let ucb1 = mean + bonus + heur_bias;
                if ucb1 > best {
                    best = ucb1;
                    choice[i] = Some(mv);
                }
            }
        }

        let edge = Edge::encode(&choice);
        current = node
            .children
            .iter()
            .find(|(e, _)| *e == edge)
            .map(|(_, c)| *c)
            .expect("the argmax joint vector must match a child created by gen_move_set");
    }
}

fn expansion(tree: &mut Tree, node: NodeId, opts: &Opts) -> Result<NodeId, RulesError> {
    let board = tree.node(node).board.clone();
    let mut move_sets = gen_move_set(&board);

    if opts.avoid_lh2h {
        let root_idx = tree.root_idx;
        let filtered: Vec<_> = move_sets
            .iter()
            .filter(|moves| {
                moves[root_idx].map_or(true, |m| !is_losing_h2h(&board, root_idx, m))
            })
            .cloned()
            .collect();
        if !filtered.is_empty() {
            move_sets = filtered;
        }
    }

    let mut first = None;
    for moves in move_sets {
        let next = next_state(&board, &moves)?;
        let edge = Edge::encode(&moves);
        let child = tree.add_child(node, edge, next);
        if first.is_none() {
            first = Some(child);
        }
    }

    Ok(first.expect("gen_move_set always yields at least one joint move vector"))
}

/// Per [4.4.1]: a reward vector iff the game is over, or this search's root
/// agent has died even though other agents are still playing.
pub fn check_terminal(board: &Board, root_idx: usize) -> Option<Vec<f64>> {
    let root_dead = !board.agents[root_idx].alive();
    if !root_dead && !board.is_over() {
        return None;
    }

    let n = board.agents.len();
    let mut res = vec![0.0; n];
    if board.is_over() {
        if n > 1 && board.living_count() == 0 {
            return Some(res);
        }
        for i in 0..n {
            res[i] = if board.agents[i].alive() { 1.0 } else { -1.0 };
        }
    } else {
        let num_dead = board.agents.iter().filter(|a| !a.alive()).count().max(1);
        for i in 0..n {
            if !board.agents[i].alive() {
                res[i] = -1.0 / num_dead as f64;
            }
        }
    }
    Some(res)
}

fn propagate(tree: &mut Tree, node: NodeId, totals: &[f64]) {
    let mut current = Some(node);
    while let Some(id) = current {
        let n = tree.node_mut(id);
        for (i, &t) in totals.iter().enumerate() {
            n.totals[i] += t;
            n.total_squares[i] += t * t;
        }
        n.n += 1.0;
        current = n.parent;
    }
}

fn random_rational_moves<R: Rng>(board: &Board, opts: &Opts, rng: &mut R) -> Vec<Option<Move>> {
    let perms = permutations();
    board
        .agents
        .iter()
        .enumerate()
        .map(|(i, agent)| {
            if !agent.alive() || agent.is_empty() {
                return None;
            }
            if opts.greedy_prob > 0.0 && rng.gen::<f64>() < opts.greedy_prob {
                if let Some(mv) = greedy_move(board, i) {
                    return Some(mv);
                }
            }
            let perm = perms[rng.gen_range(0..perms.len())];
            for (j, &mv) in perm.iter().enumerate() {
                if j < 3 && !is_rational(board, i, mv) {
                    continue;
                }
                return Some(mv);
            }
            Some(perm[3])
        })
        .collect()
}

/// A one-ply greedy-toward-food policy, used in playouts with `greedy_prob`
/// > 0 instead of a uniformly random rational move.
fn greedy_move(board: &Board, i: usize) -> Option<Move> {
    if board.food.is_empty() {
        return None;
    }
    let head = board.agents[i].head();
    Direction::iter()
        .filter(|&m| is_rational(board, i, m))
        .min_by_key(|&m| {
            let dest = head.apply(m);
            board.food.iter().map(|&f| (f - dest).manhattan()).min().unwrap_or(0)
        })
}

fn cutoff_rewards(start: &Board, end: &Board, solo: bool) -> Vec<f64> {
    let n = end.agents.len();
    let longest = end
        .agents
        .iter()
        .filter(|a| a.alive())
        .map(|a| a.len())
        .max()
        .unwrap_or(0);

    (0..n)
        .map(|i| {
            if !end.agents[i].alive() {
                return -1.0;
            }
            let delta = end.agents[i].len() as f64 - start.agents[i].len() as f64;
            if solo {
                -0.1 * delta.min(8.0)
            } else if end.agents[i].len() == longest {
                0.1 * (n as f64 - 1.0)
            } else {
                -0.1 + 0.2 * delta
            }
        })
        .collect()
}

fn playout<R: Rng>(board: &Board, opts: &Opts, rng: &mut R) -> Result<Vec<f64>, RulesError> {
    let start = board.clone();
    let mut current = board.clone();
    let solo = matches!(current.ruleset(), RuleSet::Solo);
    let max_turns = if solo { 100 } else { opts.max_playout };

    for _ in 0..max_turns {
        if current.is_over() {
            break;
        }
        let moves = random_rational_moves(&current, opts, rng);
        current = next_state(&current, &moves)?;
    }

    if current.is_over() {
        Ok((0..current.agents.len())
            .map(|i| if current.agents[i].alive() { 1.0 } else { -1.0 })
            .collect())
    } else {
        Ok(cutoff_rewards(&start, &current, solo))
    }
}

/// Runs `once` until `deadline` elapses, then extracts the root agent's best
/// move: `RobustMoves` for the legacy V1 configuration, `RobustSafeMove`
/// otherwise. Falls back to `Up` if the deadline hit before any expansion.
pub fn select_move<R: Rng>(board: &Board, root_idx: usize, opts: &Opts, deadline: Duration, rng: &mut R) -> Move {
    let t0 = Instant::now();
    let mut tree = Tree::new(board.clone(), root_idx);

    while t0.elapsed() < deadline {
        if let Err(e) = once(&mut tree, opts, rng) {
            log::error!("simulator error during search, returning best move so far: {e}");
            break;
        }
    }

    if tree.node(tree.root).children.is_empty() {
        return Direction::Up;
    }

    if opts.version == 1 {
        tree.robust_moves(tree.root, root_idx)
            .into_iter()
            .next()
            .unwrap_or_default()
    } else {
        tree.robust_safe_move(tree.root, root_idx)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::game::board::{Agent, Point};
    use rand::rngs::SmallRng;
    use rand::SeedableRng;

    fn solo_board() -> Board {
        Board::new(
            11,
            11,
            vec![Agent::new("a", vec![Point::new(5, 5), Point::new(5, 4), Point::new(5, 3)], 100)],
        )
    }

    #[test]
    fn monotonic_visit_count() {
        let mut rng = SmallRng::seed_from_u64(1);
        let mut tree = Tree::new(solo_board(), 0);
        let opts = Opts::production();
        for k in 1..=10 {
            once(&mut tree, &opts, &mut rng).unwrap();
            assert_eq!(tree.node(tree.root).n, (k + 1) as f64);
        }
    }

    #[test]
    fn tree_consistency_child_matches_simulator() {
        let mut rng = SmallRng::seed_from_u64(2);
        let mut tree = Tree::new(solo_board(), 0);
        let opts = Opts::production();
        once(&mut tree, &opts, &mut rng).unwrap();

        let root_board = tree.node(tree.root).board.clone();
        for &(edge, child) in &tree.node(tree.root).children {
            let moves: Vec<Option<Move>> = (0..1).map(|i| edge.get(i)).collect();
            let expected = next_state(&root_board, &moves).unwrap();
            assert_eq!(tree.node(child).board.agents[0].body, expected.agents[0].body);
        }
    }

    #[test]
    fn select_move_returns_a_legal_move_quickly() {
        let mut rng = SmallRng::seed_from_u64(3);
        let board = solo_board();
        let mv = select_move(&board, 0, &Opts::production(), Duration::from_millis(20), &mut rng);
        assert!(is_rational(&board, 0, mv) || mv == Direction::Up);
    }

    #[test]
    fn terminal_root_returns_negative_one() {
        let mut board = solo_board();
        board.agents[0].eliminated = Some(crate::game::board::EliminationCause::WallCollision);
        let totals = check_terminal(&board, 0).unwrap();
        assert_eq!(totals, vec![-1.0]);
    }

    #[test]
    fn mutual_kill_is_all_zero() {
        let mut board = Board::new(
            11,
            11,
            vec![
                Agent::new("a", vec![Point::new(5, 5)], 100),
                Agent::new("b", vec![Point::new(5, 6)], 100),
            ],
        );
        board.agents[0].eliminated = Some(crate::game::board::EliminationCause::HeadCollision);
        board.agents[1].eliminated = Some(crate::game::board::EliminationCause::HeadCollision);
        let totals = check_terminal(&board, 0).unwrap();
        assert_eq!(totals, vec![0.0, 0.0]);
    }
}
