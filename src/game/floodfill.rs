//! Flood-fill board-control heuristic and the aggregate positional scorer
//! (`Calc`) built on top of it.

use std::collections::{HashMap, VecDeque};

use crate::env::HAZARD_DAMAGE;
use crate::util::normalize;

use super::board::{Board, Point};

/// Per-cell occupancy state used while flooding a snake's own body out of
/// the way as its tail vacates it.
#[derive(Clone, Copy)]
enum Mark {
    /// Permanently blocked for the rest of this flood (a snake's own head,
    /// or any cell already claimed by the BFS).
    Blocked,
    /// A body segment that frees up once the frontier reaches `threshold`
    /// turns out (the number of turns until the real snake's tail passes
    /// this segment).
    Vacating(i32),
}

struct Entry {
    idx: usize,
    p: Point,
    health: i32,
    depth: i32,
}

/// Multi-source BFS seeded at every living agent's head (longer snakes
/// seeded first, so they win contested cells on ties). Returns, per agent
/// index, the number of cells it controls and a starve flag:
/// `-1` if some branch of its flood ever reached food, `1` if every branch
/// ran out of health before that, `0` if neither happened.
pub fn flood(board: &Board) -> (Vec<usize>, Vec<i8>) {
    let n = board.agents.len();
    let mut control = vec![0usize; n];
    let mut found_food = vec![false; n];
    let mut hit_starve = vec![false; n];

    let mut visited: HashMap<Point, Mark> = HashMap::with_capacity(board.width * board.height);
    for (_, agent) in board.living() {
        let len = agent.len();
        for (k, &p) in agent.body.iter().enumerate() {
            visited.insert(
                p,
                if k == 0 {
                    Mark::Blocked
                } else {
                    Mark::Vacating((len - k) as i32)
                },
            );
        }
    }

    let mut seed_order: Vec<usize> = board.living().map(|(i, _)| i).collect();
    seed_order.sort_by_key(|&i| std::cmp::Reverse(board.agents[i].len()));

    let mut queue: VecDeque<Entry> = VecDeque::with_capacity(board.width * board.height);
    for i in seed_order {
        let agent = &board.agents[i];
        queue.push_back(Entry {
            idx: i,
            p: agent.head(),
            health: agent.health as i32,
            depth: 0,
        });
    }

    while let Some(e) = queue.pop_front() {
        control[e.idx] += 1;

        for d in crate::env::Direction::iter() {
            let next = e.p.apply(d);
            if !board.in_bounds(next) {
                continue;
            }
            if let Some(mark) = visited.get(&next) {
                let blocked = match mark {
                    Mark::Blocked => true,
                    Mark::Vacating(threshold) => e.depth < *threshold,
                };
                if blocked {
                    continue;
                }
            }

            let mut health = e.health - 1;
            if board.hazards.contains(&next) {
                health -= HAZARD_DAMAGE as i32;
            }
            if board.food.contains(&next) {
                found_food[e.idx] = true;
                health = 100;
            }
            if health <= 0 {
                hit_starve[e.idx] = true;
                continue;
            }

            visited.insert(next, Mark::Blocked);
            queue.push_back(Entry {
                idx: e.idx,
                p: next,
                health,
                depth: e.depth + 1,
            });
        }
    }

    let starve = (0..n)
        .map(|i| {
            if found_food[i] {
                -1
            } else if hit_starve[i] {
                1
            } else {
                0
            }
        })
        .collect();

    (control, starve)
}

/// Weights applied to each normalized factor vector. `starve` is a flat
/// penalty rather than a weight on a normalized vector.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HeurFactors {
    pub control: f64,
    pub boxed: f64,
    pub length: f64,
    pub walls: f64,
    pub hunger: f64,
    pub starve: f64,
}

impl Default for HeurFactors {
    /// The production weighting: board control and avoiding a boxed-in head
    /// dominate, with length, wall proximity and hunger as tie-breakers.
    fn default() -> Self {
        HeurFactors {
            control: 2.0,
            boxed: 1.0,
            length: 1.0,
            walls: 0.5,
            hunger: 0.5,
            starve: -2.0,
        }
    }
}

fn min_food_distance(board: &Board, i: usize) -> Option<f64> {
    let head = board.agents[i].head();
    board
        .food
        .iter()
        .map(|&p| {
            let dist = (p - head).manhattan() as f64;
            if board.hazards.contains(&p) {
                dist * 2.0
            } else {
                dist
            }
        })
        .fold(None, |acc, d| Some(acc.map_or(d, |a: f64| a.min(d))))
}

/// Combines length, hunger, flood-control, boxed-in-ness, wall proximity and
/// starvation into one scalar per agent. Eliminated agents always score
/// `-1`, regardless of the rest of the board.
pub fn calc(factors: &HeurFactors, board: &Board) -> Vec<f64> {
    let n = board.agents.len();
    let mut length = vec![0.0; n];
    let mut hunger = vec![0.0; n];
    let mut control_v = vec![0.0; n];
    let mut boxed = vec![0.0; n];
    let mut walls = vec![0.0; n];

    let (control, starve) = flood(board);

    for (i, agent) in board.agents.iter().enumerate() {
        if !agent.alive() {
            continue;
        }
        length[i] = agent.len() as f64;
        hunger[i] = -min_food_distance(board, i).unwrap_or(0.0);
        control_v[i] = control[i] as f64;
        boxed[i] = -(1.0 - (control[i] as f64 / agent.len().max(1) as f64).min(1.0));

        let head = agent.head();
        let w = board.width as f64;
        let h = board.height as f64;
        let dist_to_wall = [
            w - head.x as f64,
            head.x as f64 + 1.0,
            h - head.y as f64,
            head.y as f64 + 1.0,
        ]
        .into_iter()
        .fold(f64::MAX, f64::min);
        walls[i] = dist_to_wall / h;
    }

    normalize(&mut length);
    normalize(&mut hunger);
    normalize(&mut control_v);
    normalize(&mut boxed);
    normalize(&mut walls);

    let mut result = vec![0.0; n];
    for i in 0..n {
        if !board.agents[i].alive() {
            result[i] = -1.0;
            continue;
        }
        result[i] = factors.control * control_v[i]
            + factors.boxed * boxed[i]
            + factors.length * length[i]
            + factors.walls * walls[i]
            + factors.hunger * hunger[i];
        if starve[i] == 1 {
            result[i] += factors.starve;
        }
    }

    result
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::game::board::Agent;

    fn board_of(width: usize, height: usize, bodies: &[&[(i16, i16)]]) -> Board {
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
        Board::new(width, height, agents)
    }

    #[test]
    fn flood_corridor_golden() {
        let board = board_of(7, 7, &[&[(3, 3), (3, 2), (3, 1)]]);
        let (control, starve) = flood(&board);
        assert_eq!(control[0], 49);
        assert_eq!(starve[0], 0);
    }

    #[test]
    fn flood_count_bound() {
        let board = board_of(
            11,
            11,
            &[&[(1, 1), (1, 0)], &[(9, 9), (9, 10)], &[(5, 5), (5, 4)]],
        );
        let (control, _) = flood(&board);
        let total: usize = control.iter().sum();
        assert!(total <= 11 * 11);
        for &c in &control {
            assert!(c >= 1);
        }
    }

    #[test]
    fn flood_longer_snake_wins_contested_cell() {
        // Two heads three apart on a line; the longer snake should flood
        // further into the contested middle.
        let board = board_of(
            11,
            11,
            &[
                &[(2, 5), (2, 4), (2, 3), (2, 2)],
                &[(8, 5), (8, 4)],
            ],
        );
        let (control, _) = flood(&board);
        assert!(control[0] > control[1]);
    }

    #[test]
    fn eliminated_agent_scores_minus_one() {
        let mut board = board_of(11, 11, &[&[(5, 5), (5, 4)]]);
        board.agents[0].eliminated = Some(super::super::board::EliminationCause::WallCollision);
        let scores = calc(&HeurFactors::default(), &board);
        assert_eq!(scores[0], -1.0);
    }

    #[test]
    fn hunger_prefers_closer_food() {
        let mut near = board_of(11, 11, &[&[(5, 5), (5, 4)]]);
        near.food.insert(Point::new(6, 5));
        let mut far = board_of(11, 11, &[&[(5, 5), (5, 4)]]);
        far.food.insert(Point::new(0, 0));

        let factors = HeurFactors {
            control: 0.0,
            boxed: 0.0,
            length: 0.0,
            walls: 0.0,
            hunger: 1.0,
            starve: 0.0,
        };
        // Single-agent normalization always yields 0; compare the raw
        // distance helper instead of the normalized `calc` output.
        assert!(
            min_food_distance(&near, 0).unwrap() < min_food_distance(&far, 0).unwrap()
        );
        let _ = (calc(&factors, &near), calc(&factors, &far));
    }
}
