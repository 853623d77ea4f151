#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Command-line adapter for playing Sundial in a terminal.

mod levels;
mod render;
mod session;

use std::{
    io::{self, BufRead, Write},
    path::PathBuf,
    time::Duration,
};

use anyhow::{Context, Result};
use clap::Parser;
use sundial_core::{Direction, Event};
use sundial_system_campaign::{self as campaign, Campaign};
use sundial_system_controls::PlayerInput;
use sundial_world::query;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use crate::session::{Session, SessionConfig};

/// Simulated time that passes per tick while the world settles.
const TICK: Duration = Duration::from_millis(50);

/// Play Sundial in the terminal.
#[derive(Debug, Parser)]
#[command(name = "sundial", version, about)]
struct Args {
    /// Level pack to load, as TOML or JSON.
    #[arg(long, value_name = "PATH", default_value = "levels/sundial.toml")]
    levels: PathBuf,

    /// Index of the level to start on.
    #[arg(long, default_value_t = 0)]
    start: usize,

    /// Milliseconds of simulated time between chant steps.
    #[arg(long, default_value_t = 150)]
    chant_step_ms: u64,

    /// Milliseconds a single step animates before the next move is accepted.
    #[arg(long, default_value_t = 0)]
    move_ms: u64,

    /// Turn towards a new direction before stepping into it.
    #[arg(long)]
    turn_in_place: bool,

    /// Restart the level automatically after a game over.
    #[arg(long)]
    auto_restart: bool,

    /// Tracing filter used when RUST_LOG is not set.
    #[arg(long, value_name = "FILTER", default_value = "warn")]
    log: String,
}

/// Action requested by a single input token.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Action {
    Play(PlayerInput),
    Wait,
    NextLevel,
    Quit,
}

fn parse_token(token: &str) -> Option<Action> {
    let action = match token.to_ascii_lowercase().as_str() {
        "w" => Action::Play(PlayerInput::Move(Direction::Up)),
        "a" => Action::Play(PlayerInput::Move(Direction::Left)),
        "s" => Action::Play(PlayerInput::Move(Direction::Down)),
        "d" => Action::Play(PlayerInput::Move(Direction::Right)),
        "q" => Action::Play(PlayerInput::ChantStart),
        "x" => Action::Play(PlayerInput::ChantStop),
        "e" => Action::Play(PlayerInput::Interact),
        "r" => Action::Play(PlayerInput::Restart),
        "n" => Action::NextLevel,
        "." => Action::Wait,
        "quit" | "exit" => Action::Quit,
        _ => return None,
    };
    Some(action)
}

fn init_tracing(default_filter: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}

fn print_events(out: &mut impl Write, events: &[Event]) -> io::Result<()> {
    for line in events.iter().filter_map(render::describe) {
        writeln!(out, "{line}")?;
    }
    Ok(())
}

fn print_board(out: &mut impl Write, session: &Session) -> io::Result<()> {
    let world = session.world();
    if let Some(name) = query::level_name(world) {
        writeln!(out, "[{name}]")?;
    }
    write!(out, "{}", render::board(world))?;
    out.flush()
}

/// Entry point for the Sundial command-line interface.
fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing(&args.log);

    let levels = levels::load_pack(&args.levels)?;
    info!(path = %args.levels.display(), levels = levels.len(), "loaded level pack");
    let campaign = Campaign::new(levels, campaign::Config::new(args.auto_restart))
        .context("failed to build campaign")?;

    let mut session = Session::new(
        campaign,
        SessionConfig {
            tick: TICK,
            chant_step: Duration::from_millis(args.chant_step_ms),
            move_duration: Duration::from_millis(args.move_ms),
            turn_in_place: args.turn_in_place,
        },
    );

    let stdout = io::stdout();
    let mut out = stdout.lock();
    for (index, (level, unlocked)) in session.campaign().levels().enumerate() {
        let lock = if unlocked { "" } else { " (locked)" };
        writeln!(out, "{index}: {}{lock}", level.name())?;
    }
    writeln!(
        out,
        "w/a/s/d move, q chant, x stop, e interact, r restart, n next level, . wait, quit"
    )?;

    let events = session
        .start(args.start)
        .with_context(|| format!("failed to start level {}", args.start))?;
    print_events(&mut out, &events)?;
    print_board(&mut out, &session)?;

    for line in io::stdin().lock().lines() {
        let line = line.context("failed to read input")?;
        for token in line.split_whitespace() {
            let events = match parse_token(token) {
                Some(Action::Play(input)) => session.input(input),
                Some(Action::Wait) => session.wait(),
                Some(Action::NextLevel) => match session.next_level() {
                    Ok(events) => events,
                    Err(error) => {
                        writeln!(out, "{error}")?;
                        continue;
                    }
                },
                Some(Action::Quit) => return Ok(()),
                None => {
                    debug!(token, "ignoring unknown input");
                    writeln!(out, "unknown input {token:?}")?;
                    continue;
                }
            };
            print_events(&mut out, &events)?;
        }
        print_board(&mut out, &session)?;
    }

    Ok(())
}
