//! Battlesnake decision core: the deterministic rules simulator, the
//! flood-fill positional heuristic, a decoupled-UCT Monte Carlo tree search
//! and a negamax alternative, plus the agent registry the server and CLI
//! binaries share.
//!
//! Exported so it is reachable from integration tests, benchmarks and the
//! `server`/`move`/`simulate` binaries.

use std::io::Write;

use env_logger::fmt::Formatter;
use owo_colors::{AnsiColors, OwoColorize};

pub mod agents;
pub mod env;
pub mod game;
pub mod mcts;
pub mod search;
mod util;

pub use util::{argmax, argmax_f, normalize, OrdFloat};

/// Initializes the process-wide colorized logger. Level is controlled by the
/// standard `RUST_LOG` env var, defaulting to `info`. Safe to call more than
/// once (e.g. once per test); only the first call takes effect.
pub fn logging() {
    #[cfg(not(test))]
    let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format(logging_format)
        .try_init();
    #[cfg(test)]
    let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .is_test(true)
        .format(logging_format)
        .try_init();
}

fn logging_format(buf: &mut Formatter, record: &log::Record) -> std::io::Result<()> {
    let color = match record.level() {
        log::Level::Error => AnsiColors::BrightRed,
        log::Level::Warn => AnsiColors::BrightYellow,
        log::Level::Info => AnsiColors::BrightBlack,
        log::Level::Debug => AnsiColors::BrightBlack,
        log::Level::Trace => AnsiColors::BrightBlack,
    };

    writeln!(
        buf,
        "{}",
        format_args!(
            "[{:5} {}:{}] {}",
            record.level(),
            record.file().unwrap_or_default(),
            record.line().unwrap_or_default(),
            record.args()
        )
        .color(color)
    )
}
