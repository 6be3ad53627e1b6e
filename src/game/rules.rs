//! The deterministic forward simulator: `next_state` advances a [`Board`] by
//! one joint move, plus the move-enumeration helpers the MCTS tree and the
//! playout policy build on.

use std::fmt;

use crate::env::{Direction, HAZARD_DAMAGE};

use super::board::{Agent, Board, EliminationCause, Move, Point};

/// Why [`next_state`] refused to advance the board. Distinct from
/// [`EliminationCause`], which is in-game bookkeeping, not a failure: this
/// enum exists so a caller that fed inconsistent input (a missing move for a
/// living agent) can be told apart from the normal "the agent died" case.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RulesError {
    /// A living agent at this index had no move in the slice passed to
    /// `next_state`.
    MissingMove { agent: usize },
}

impl fmt::Display for RulesError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RulesError::MissingMove { agent } => {
                write!(f, "missing move for living agent {agent}")
            }
        }
    }
}

impl std::error::Error for RulesError {}

/// Advances `board` by one turn given one move per still-living agent.
/// `moves[i]` must be `Some` for every agent with `board.agents[i].alive()`;
/// eliminated slots are ignored and may be `None`.
///
/// Pure function: `board` is never mutated, a new [`Board`] is returned.
pub fn next_state(board: &Board, moves: &[Option<Move>]) -> Result<Board, RulesError> {
    debug_assert_eq!(moves.len(), board.agents.len());

    let mut next = board.clone();

    // 1. Move heads (and tentatively pop the tail; food handling restores it).
    let mut grew = vec![false; board.agents.len()];
    for (i, agent) in next.agents.iter_mut().enumerate() {
        if !agent.alive() || agent.is_empty() {
            continue;
        }
        let mv = moves[i].ok_or(RulesError::MissingMove { agent: i })?;
        let head = agent.head().apply(mv);
        agent.body.insert(0, head);
        agent.body.pop();
    }

    // 2. Food consumption / health decrement, then 3. hazard damage.
    for (i, agent) in next.agents.iter_mut().enumerate() {
        if !board.agents[i].alive() || agent.is_empty() {
            continue;
        }
        let head = agent.head();
        if next.food.remove(&head) {
            agent.health = 100;
            grew[i] = true;
            let restored = agent.body[agent.body.len() - 1];
            agent.body.push(restored);
        } else {
            agent.health = agent.health.saturating_sub(1);
        }

        if next.hazards.contains(&head) {
            agent.health = agent.health.saturating_sub(HAZARD_DAMAGE);
        }

        if agent.health == 0 {
            agent.eliminated = Some(EliminationCause::OutOfHealth);
        }
    }

    // 4. Eliminations, evaluated on the post-move bodies, all simultaneous.
    let heads: Vec<Option<Point>> = next
        .agents
        .iter()
        .map(|a| if a.alive() && !a.is_empty() { Some(a.head()) } else { None })
        .collect();
    let lengths: Vec<usize> = next.agents.iter().map(Agent::len).collect();

    let mut causes = vec![None; next.agents.len()];
    for (i, agent) in next.agents.iter().enumerate() {
        if !agent.alive() {
            continue;
        }
        let Some(head) = heads[i] else { continue };

        if !next.in_bounds(head) {
            causes[i] = Some(EliminationCause::WallCollision);
            continue;
        }
        if agent.occupies_excluding_tail_from(1, head) {
            causes[i] = Some(EliminationCause::SelfCollision);
            continue;
        }
        let mut hit_body = false;
        for (j, other) in next.agents.iter().enumerate() {
            if i == j || !other.alive() {
                continue;
            }
            // Exclude the other agent's head too: a same-cell head overlap
            // is a head-to-head, resolved by length below, not a body hit.
            if other.occupies_excluding_tail_from(1, head) {
                hit_body = true;
                break;
            }
        }
        if hit_body {
            causes[i] = Some(EliminationCause::BodyCollision);
            continue;
        }
        for (j, &other_head) in heads.iter().enumerate() {
            if i == j {
                continue;
            }
            if Some(head) == other_head && next.agents[j].alive() {
                if lengths[i] <= lengths[j] {
                    causes[i] = Some(EliminationCause::HeadCollision);
                }
                break;
            }
        }
    }

    for (agent, cause) in next.agents.iter_mut().zip(causes) {
        if agent.eliminated.is_none() {
            agent.eliminated = cause;
        }
    }

    Ok(next)
}

impl Agent {
    /// Like [`Agent::occupies_excluding_tail`] but skips the first `skip`
    /// body segments: used for self-collision (skip the agent's own head)
    /// and for other-agent body collision (skip the other agent's head too,
    /// so a same-cell head overlap falls through to head-to-head below
    /// instead of being misread as a body hit).
    fn occupies_excluding_tail_from(&self, skip: usize, p: Point) -> bool {
        let end = self.body.len() - 1;
        skip <= end && self.body[skip..end].contains(&p)
    }
}

/// `true` iff moving `i` in `mv` lands in-bounds and not on any currently
/// occupied body segment (own or otherwise), excluding tails about to move.
pub fn is_rational(board: &Board, i: usize, mv: Move) -> bool {
    let agent = &board.agents[i];
    let dest = agent.head().apply(mv);
    board.in_bounds(dest) && !board.occupied(dest)
}

/// `true` iff some living agent at least as long as `i` could reach `dest`
/// (the destination of `mv` for agent `i`) in one move, i.e. a head-to-head
/// there is losing or a tie.
pub fn is_losing_h2h(board: &Board, i: usize, mv: Move) -> bool {
    let agent = &board.agents[i];
    let dest = agent.head().apply(mv);
    board
        .agents
        .iter()
        .enumerate()
        .filter(|&(j, a)| j != i && a.alive() && a.len() >= agent.len())
        .any(|(_, a)| (a.head() - dest).manhattan() == 1)
}

/// Enumerates the joint move vectors considered at a tree node: for every
/// living agent (in index order) expand the partial list of vectors by that
/// agent's rational moves; if none exist, fall back to its first irrational
/// move so it still moves (and dies in the simulator).
pub fn gen_move_set(board: &Board) -> Vec<Vec<Option<Move>>> {
    let mut vectors: Vec<Vec<Option<Move>>> = vec![vec![None; board.agents.len()]];

    for (i, agent) in board.agents.iter().enumerate() {
        if !agent.alive() || agent.is_empty() {
            continue;
        }
        let rational: Vec<Move> = Direction::iter().filter(|&m| is_rational(board, i, m)).collect();
        let choices: Vec<Move> = if !rational.is_empty() {
            rational
        } else {
            vec![Direction::iter().next().unwrap()]
        };

        let mut expanded = Vec::with_capacity(vectors.len() * choices.len());
        for partial in &vectors {
            for &mv in &choices {
                let mut v = partial.clone();
                v[i] = Some(mv);
                expanded.push(v);
            }
        }
        vectors = expanded;
    }

    vectors
}

/// The 24 permutations of the four moves, precomputed once so random
/// playouts draw a uniform index instead of shuffling at every step.
pub fn permutations() -> &'static [[Move; 4]; 24] {
    use std::sync::OnceLock;
    static TABLE: OnceLock<[[Move; 4]; 24]> = OnceLock::new();
    TABLE.get_or_init(|| {
        let base = Direction::ALL;
        let mut perms = Vec::with_capacity(24);
        permute(&mut base.to_vec(), 0, &mut perms);
        perms.try_into().unwrap()
    })
}

fn permute(arr: &mut Vec<Move>, k: usize, out: &mut Vec<[Move; 4]>) {
    if k == arr.len() {
        out.push([arr[0], arr[1], arr[2], arr[3]]);
        return;
    }
    for i in k..arr.len() {
        arr.swap(k, i);
        permute(arr, k + 1, out);
        arr.swap(k, i);
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::game::board::Point;

    fn agent(id: &str, body: &[(i16, i16)], health: u8) -> Agent {
        Agent::new(
            id,
            body.iter().map(|&(x, y)| Point::new(x, y)).collect(),
            health,
        )
    }

    #[test]
    fn determinism() {
        let board = Board::new(
            11,
            11,
            vec![agent("a", &[(5, 5), (5, 4), (5, 3)], 50)],
        );
        let moves = [Some(Direction::Up)];
        let a = next_state(&board, &moves).unwrap();
        let b = next_state(&board, &moves).unwrap();
        assert_eq!(a.agents[0].body, b.agents[0].body);
        assert_eq!(a.agents[0].health, b.agents[0].health);
    }

    #[test]
    fn wall_collision() {
        let board = Board::new(11, 11, vec![agent("a", &[(0, 0), (0, 1), (0, 2)], 100)]);
        let next = next_state(&board, &[Some(Direction::Down)]).unwrap();
        assert_eq!(
            next.agents[0].eliminated,
            Some(EliminationCause::WallCollision)
        );
    }

    #[test]
    fn self_collision() {
        // A snake coiled so moving up runs into its own neck.
        let body = [(5, 5), (5, 6), (6, 6), (6, 5), (5, 5)]
            .iter()
            .map(|&(x, y)| Point::new(x, y))
            .collect();
        let board = Board::new(11, 11, vec![Agent::new("a", body, 100)]);
        let next = next_state(&board, &[Some(Direction::Up)]).unwrap();
        assert_eq!(
            next.agents[0].eliminated,
            Some(EliminationCause::SelfCollision)
        );
    }

    #[test]
    fn food_growth_and_health_reset() {
        let mut board = Board::new(11, 11, vec![agent("a", &[(5, 5), (5, 4), (5, 3)], 50)]);
        board.food.insert(Point::new(5, 6));
        let next = next_state(&board, &[Some(Direction::Up)]).unwrap();
        assert_eq!(next.agents[0].health, 100);
        assert_eq!(next.agents[0].len(), 4);
        assert!(!next.food.contains(&Point::new(5, 6)));
    }

    #[test]
    fn hazard_damage() {
        let mut board = Board::new(11, 11, vec![agent("a", &[(5, 5), (5, 4), (5, 3)], 20)]);
        board.hazards.insert(Point::new(5, 6));
        let next = next_state(&board, &[Some(Direction::Up)]).unwrap();
        // 20 - 1 (turn) - 15 (hazard) = 4
        assert_eq!(next.agents[0].health, 4);
        assert!(next.agents[0].alive());
    }

    #[test]
    fn hazard_starvation() {
        let mut board = Board::new(11, 11, vec![agent("a", &[(5, 5), (5, 4), (5, 3)], 10)]);
        board.hazards.insert(Point::new(5, 6));
        let next = next_state(&board, &[Some(Direction::Up)]).unwrap();
        assert_eq!(
            next.agents[0].eliminated,
            Some(EliminationCause::OutOfHealth)
        );
    }

    #[test]
    fn head_to_head_shorter_dies() {
        let board = Board::new(
            11,
            11,
            vec![
                agent("a", &[(4, 5), (3, 5), (2, 5)], 100),
                agent("b", &[(6, 5), (7, 5)], 100),
            ],
        );
        let next = next_state(&board, &[Some(Direction::Right), Some(Direction::Left)]).unwrap();
        assert!(next.agents[0].alive());
        assert_eq!(
            next.agents[1].eliminated,
            Some(EliminationCause::HeadCollision)
        );
    }

    #[test]
    fn head_to_head_equal_both_die() {
        let board = Board::new(
            11,
            11,
            vec![
                agent("a", &[(4, 5), (3, 5), (2, 5)], 100),
                agent("b", &[(6, 5), (7, 5), (8, 5)], 100),
            ],
        );
        let next = next_state(&board, &[Some(Direction::Right), Some(Direction::Left)]).unwrap();
        assert_eq!(
            next.agents[0].eliminated,
            Some(EliminationCause::HeadCollision)
        );
        assert_eq!(
            next.agents[1].eliminated,
            Some(EliminationCause::HeadCollision)
        );
    }

    #[test]
    fn missing_move_errors() {
        let board = Board::new(11, 11, vec![agent("a", &[(5, 5), (5, 4), (5, 3)], 100)]);
        assert_eq!(
            next_state(&board, &[None]),
            Err(RulesError::MissingMove { agent: 0 })
        );
    }

    #[test]
    fn gen_move_set_covers_rational_moves() {
        let board = Board::new(11, 11, vec![agent("a", &[(5, 5), (5, 4), (5, 3)], 100)]);
        let moves = gen_move_set(&board);
        // Up, Right, Left are rational; Down runs into the neck.
        assert_eq!(moves.len(), 3);
    }

    #[test]
    fn gen_move_set_falls_back_when_trapped() {
        // Both in-bounds neighbours of the corner head are occupied body
        // segments (the duplicated last point means the tail never vacates
        // either of them), so every direction is a wall or self-collision.
        let board = Board::new(
            3,
            3,
            vec![agent("a", &[(0, 0), (0, 1), (1, 1), (1, 0), (1, 0)], 100)],
        );
        let moves = gen_move_set(&board);
        assert_eq!(moves.len(), 1);
    }

    #[test]
    fn is_losing_h2h_detects_longer_neighbor() {
        let board = Board::new(
            11,
            11,
            vec![
                agent("a", &[(5, 5), (5, 4)], 100),
                agent("b", &[(5, 7), (5, 8), (5, 9), (5, 10)], 100),
            ],
        );
        assert!(is_losing_h2h(&board, 0, Direction::Up));
        assert!(!is_losing_h2h(&board, 0, Direction::Down));
    }

    #[test]
    fn permutations_are_24_distinct() {
        let perms = permutations();
        assert_eq!(perms.len(), 24);
        let mut sorted = perms.to_vec();
        sorted.sort_by_key(|p| format!("{p:?}"));
        sorted.dedup();
        assert_eq!(sorted.len(), 24);
    }

    #[test]
    fn edge_encoding_round_trip() {
        use crate::mcts::edge::Edge;
        let moves = [Some(Direction::Up), None, Some(Direction::Left)];
        let edge = Edge::encode(&moves);
        assert!(edge.is(0, Direction::Up));
        assert!(!edge.is(0, Direction::Down));
        assert!(edge.is(2, Direction::Left));
        assert!(!edge.is(1, Direction::Up));
    }
}
