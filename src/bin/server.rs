//! Async HTTP front end for the Battlesnake wire protocol: an index route
//! plus `start`/`move`/`end` per snake name, each logged at `info` with the
//! game id and turn. The search itself is synchronous and CPU-bound for up
//! to ~340ms, so `/move` offloads it to a blocking task rather than running
//! it on the async runtime's worker thread.

use std::convert::Infallible;
use std::env;
use std::net::{SocketAddr, TcpListener};
use std::sync::Arc;
use std::time::{Duration, Instant};

use clap::Parser;
use log::{error, info, warn};
use warp::Filter;

use coilcore::agents::StrategyKind;
use coilcore::env::{GameRequest, IndexResponse, MoveResponse, API_VERSION};
use coilcore::game::board::Board;
use coilcore::logging;

pub const PACKAGE_VERSION: &str = env!("CARGO_PKG_VERSION");
pub const AUTHOR: &str = "l4r0x";

/// Runtime server configuration, shared (read-only) across requests.
struct Config {
    latency: u64,
    color: String,
    head: String,
    tail: String,
    agent: StrategyKind,
}

#[derive(Debug, Parser)]
#[clap(version, author, about = "High performant rust snake.")]
struct Opt {
    /// IP and port to listen on. Falls back to the `BIND` environment
    /// variable, then to `127.0.0.1:8080`, read independently of this flag
    /// parser (this codebase's one flag-plus-env exception).
    #[clap(long, value_parser)]
    host: Option<SocketAddr>,
    /// Time in ms reserved for I/O and response transit, subtracted from
    /// the game's declared timeout before the search deadline is computed.
    #[clap(long, default_value_t = 160, value_parser)]
    latency: u64,
    /// Color in hex format. See <https://docs.battlesnake.com/references/personalization>.
    #[clap(long, default_value = "#FF7043", value_parser)]
    color: String,
    /// Head, see <https://docs.battlesnake.com/references/personalization>.
    #[clap(long, default_value = "sand-worm", value_parser)]
    head: String,
    /// Tail, see <https://docs.battlesnake.com/references/personalization>.
    #[clap(long, default_value = "pixel", value_parser)]
    tail: String,
    /// Which decision procedure drives `/move`.
    #[clap(long, value_enum, default_value = "mcts")]
    agent: StrategyKind,
}

#[tokio::main]
async fn main() {
    logging();

    let Opt {
        host,
        latency,
        color,
        head,
        tail,
        agent,
    } = Opt::parse();

    let host = host
        .or_else(|| env::var("BIND").ok().and_then(|s| s.parse().ok()))
        .unwrap_or_else(|| "127.0.0.1:8080".parse().unwrap());

    if let Err(e) = TcpListener::bind(host) {
        error!("failed to bind {host}: {e}");
        std::process::exit(1);
    }

    let config = Arc::new(Config {
        latency,
        color,
        head,
        tail,
        agent,
    });

    let index = warp::get()
        .and(warp::path::param::<String>())
        .and(warp::path::end())
        .and(with_config(config.clone()))
        .map(|snake: String, config: Arc<Config>| {
            warn!("index {snake}");
            warp::reply::json(&IndexResponse::new(
                API_VERSION.to_string(),
                AUTHOR.to_string(),
                config.color.clone(),
                config.head.clone(),
                config.tail.clone(),
                PACKAGE_VERSION.to_string(),
            ))
        });

    let start = warp::path::param::<String>()
        .and(warp::path("start"))
        .and(warp::path::end())
        .and(warp::post())
        .and(warp::body::json::<GameRequest>())
        .map(|snake: String, request: GameRequest| {
            warn!("start {snake} {request}");
            warp::reply()
        });

    let r#move = warp::path::param::<String>()
        .and(warp::path("move"))
        .and(warp::path::end())
        .and(warp::post())
        .and(warp::body::json::<GameRequest>())
        .and(with_config(config.clone()))
        .and_then(handle_move);

    let end = warp::path::param::<String>()
        .and(warp::path("end"))
        .and(warp::path::end())
        .and(warp::post())
        .and(warp::body::json::<GameRequest>())
        .map(|snake: String, request: GameRequest| {
            warn!("end {snake} {request}");
            warp::reply()
        });

    warp::serve(index.or(start).or(r#move).or(end))
        .run(host)
        .await;
}

fn with_config(
    config: Arc<Config>,
) -> impl Filter<Extract = (Arc<Config>,), Error = std::convert::Infallible> + Clone {
    warp::any().map(move || config.clone())
}

async fn handle_move(
    snake: String,
    request: GameRequest,
    config: Arc<Config>,
) -> Result<impl warp::Reply, Infallible> {
    warn!("move {snake} {request}");

    let timer = Instant::now();
    let deadline = Duration::from_millis(request.game.timeout.saturating_sub(config.latency));
    let board = Board::from_request(&request);
    let agent = config.agent;

    let mv = tokio::task::spawn_blocking(move || {
        let mut strategy = agent.build();
        strategy.step(&board, 0, deadline)
    })
    .await
    .unwrap_or_default();

    info!("move {snake} -> {mv:?} in {:?}", timer.elapsed());

    Ok(warp::reply::json(&MoveResponse::new(mv)))
}
