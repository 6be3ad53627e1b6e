//! Self-play harness: runs full games between a list of agents on a fresh
//! board, exercising the engine the same way an external grading harness
//! would. Not part of the decision core; it owns food spawning and the
//! Royale-style hazard-border growth the core only ever consumes as an
//! already-given hazard set.

use std::time::{Duration, Instant};

use clap::Parser;
use log::{debug, info, warn};
use owo_colors::OwoColorize;
use rand::rngs::SmallRng;
use rand::seq::{IteratorRandom, SliceRandom};
use rand::{Rng, SeedableRng};

use coilcore::agents::StrategyKind;
use coilcore::game::board::{Agent, Board, Point};
use coilcore::game::rules::next_state;
use coilcore::logging;

#[derive(Parser)]
#[clap(version, author, about = "Simulate a game between agents.")]
struct Opts {
    /// Time each snake has for a turn, in ms.
    #[clap(long, default_value_t = 200)]
    timeout: u64,
    /// Board width.
    #[clap(long, default_value_t = 11)]
    width: usize,
    /// Board height.
    #[clap(long, default_value_t = 11)]
    height: usize,
    /// Chance a new food spawns each turn once the minimum count is met.
    #[clap(long, default_value_t = 0.15)]
    food_rate: f64,
    /// Number of turns between each hazard-border growth step.
    #[clap(short, long, default_value_t = 25)]
    shrink_turns: usize,
    /// Number of games to play.
    #[clap(short, long, default_value_t = 1)]
    game_count: usize,
    /// Seed for the random number generator; 0 seeds from entropy.
    #[clap(long, default_value_t = 0)]
    seed: u64,
    /// Agents to play against each other (2-6).
    #[clap(value_enum)]
    agents: Vec<StrategyKind>,
}

fn main() {
    logging();

    let Opts {
        timeout,
        width,
        height,
        food_rate,
        shrink_turns,
        game_count,
        seed,
        agents,
    } = Opts::parse();

    assert!(
        (2..=6).contains(&agents.len()),
        "simulate needs between 2 and 6 agents"
    );
    info!("agents: {agents:?}");

    let mut rng = if seed == 0 {
        SmallRng::from_entropy()
    } else {
        SmallRng::seed_from_u64(seed)
    };

    let mut wins = vec![0usize; agents.len()];
    let start = Instant::now();

    for i in 0..game_count {
        let mut board = init_game(width, height, agents.len(), &mut rng);
        let deadline = Duration::from_millis(timeout);

        let outcome = play_game(&agents, &mut board, deadline, food_rate, shrink_turns, &mut rng);
        if let Some(winner) = outcome {
            wins[winner] += 1;
        }
        warn!(
            "{}: game {i} after {}ms",
            "finished".bright_green(),
            start.elapsed().as_millis()
        );
    }

    println!("agents: {agents:?}");
    println!("wins:   {wins:?}");
}

/// Plays one game to completion, returning the winning agent's index (`None`
/// on a draw/mutual kill).
fn play_game(
    agents: &[StrategyKind],
    board: &mut Board,
    deadline: Duration,
    food_rate: f64,
    shrink_turns: usize,
    rng: &mut SmallRng,
) -> Option<usize> {
    let mut strategies: Vec<_> = agents.iter().map(|a| a.build()).collect();
    let mut hazard_insets = [0usize; 4];

    for turn in 0.. {
        if board.is_over() {
            break;
        }
        debug!("turn {turn}: {board:?}");

        let moves: Vec<Option<_>> = (0..board.agents.len())
            .map(|i| {
                if board.agents[i].alive() {
                    Some(strategies[i].step(board, i, deadline))
                } else {
                    None
                }
            })
            .collect();

        *board = next_state(board, &moves).expect("gen_move_set-derived moves are always valid");

        spawn_food(board, food_rate, rng);
        grow_hazards(board, turn, shrink_turns, &mut hazard_insets, rng);
    }

    let living: Vec<usize> = board
        .agents
        .iter()
        .enumerate()
        .filter(|(_, a)| a.alive())
        .map(|(i, _)| i)
        .collect();
    match living.as_slice() {
        [winner] => Some(*winner),
        _ => None,
    }
}

fn spawn_food(board: &mut Board, food_rate: f64, rng: &mut SmallRng) {
    if board.food.is_empty() || rng.gen::<f64>() < food_rate {
        let occupied = |p: Point| board.occupied(p) || board.food.contains(&p);
        if let Some(p) = (0..board.width)
            .flat_map(|x| (0..board.height).map(move |y| Point::new(x as i16, y as i16)))
            .filter(|&p| !occupied(p))
            .choose(rng)
        {
            board.food.insert(p);
        }
    }
}

/// Expands the hazard border one ring inward from a random side every
/// `shrink_turns` turns, Royale-style.
fn grow_hazards(
    board: &mut Board,
    turn: usize,
    shrink_turns: usize,
    insets: &mut [usize; 4],
    rng: &mut SmallRng,
) {
    if turn == 0 || turn % shrink_turns != 0 {
        return;
    }
    if insets[0] + insets[2] >= board.height || insets[1] + insets[3] >= board.width {
        return;
    }

    let side = rng.gen_range(0..4);
    insets[side] += 1;
    if side % 2 == 0 {
        let y = if side == 0 { insets[side] - 1 } else { board.height - insets[side] };
        for x in 0..board.width {
            board.hazards.insert(Point::new(x as i16, y as i16));
        }
    } else {
        let x = if side == 1 { insets[side] - 1 } else { board.width - insets[side] };
        for y in 0..board.height {
            board.hazards.insert(Point::new(x as i16, y as i16));
        }
    }
}

/// Places `num_agents` length-3 snakes at the board's corners or edge
/// midpoints (picked at random), each with one food two steps away.
fn init_game(width: usize, height: usize, num_agents: usize, rng: &mut SmallRng) -> Board {
    if width % 2 == 0 || height % 2 == 0 || width != height {
        warn!("non-square odd-sized boards give an unfair starting layout");
    }

    let corners = [
        Point::new(1, 1),
        Point::new(width as i16 - 2, 1),
        Point::new(width as i16 - 2, height as i16 - 2),
        Point::new(1, height as i16 - 2),
    ];
    let edges = [
        Point::new((width / 2) as i16, 1),
        Point::new(width as i16 - 2, (height / 2) as i16),
        Point::new((width / 2) as i16, height as i16 - 2),
        Point::new(1, (height / 2) as i16),
    ];
    let layout = if rng.gen() { corners } else { edges };
    let mut starts: Vec<Point> = layout.into_iter().choose_multiple(rng, num_agents);
    starts.shuffle(rng);

    let agents = starts
        .into_iter()
        .enumerate()
        .map(|(i, p)| Agent::new(format!("s{i}"), vec![p; 3], 100))
        .collect();

    let mut board = Board::new(width, height, agents);
    board.food.insert(Point::new((width / 2) as i16, (height / 2) as i16));
    board
}
