//! Ad-hoc single-position move query: feed it one game-request JSON and it
//! prints the move the chosen agent would make, plus (at `info` level) the
//! flood-fill control/starve state at the root, mirroring what the server
//! would answer on `/move` for the same payload.

use std::time::{Duration, Instant};

use clap::Parser;
use log::info;

use coilcore::agents::StrategyKind;
use coilcore::env::GameRequest;
use coilcore::game::board::Board;
use coilcore::game::floodfill::flood;
use coilcore::logging;

#[derive(Parser)]
#[clap(version, author, about = "Compute a single move for an agent.")]
struct Opts {
    /// Which decision procedure to run.
    #[clap(long, value_enum, default_value = "mcts")]
    agent: StrategyKind,
    /// JSON game-request payload, exactly what the server would receive on
    /// `/move`.
    #[clap(value_parser = parse_request)]
    request: GameRequest,
    /// Time in ms subtracted from the request's declared timeout before the
    /// search deadline is computed.
    #[clap(long, default_value_t = 200)]
    latency: u64,
}

fn parse_request(s: &str) -> Result<GameRequest, serde_json::Error> {
    serde_json::from_str(s)
}

fn main() {
    logging();

    let Opts {
        agent,
        request,
        latency,
    } = Opts::parse();

    let board = Board::from_request(&request);
    info!("board: {board:?}");

    let (control, starve) = flood(&board);
    info!("flood control: {control:?}, starve: {starve:?}");

    let deadline = Duration::from_millis(request.game.timeout.saturating_sub(latency));
    let mut strategy = agent.build();

    let timer = Instant::now();
    let mv = strategy.step(&board, 0, deadline);
    info!("{} chose {mv:?} in {:?}", strategy.name(), timer.elapsed());

    println!("{mv:?}");
}
