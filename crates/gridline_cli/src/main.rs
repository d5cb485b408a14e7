//! Gridline - replay a recorded race as a live leaderboard
//!
//! Reads a prepared race directory (`race.json`, `timeline.json` and the
//! optional track condition files) and plays it back in the terminal under
//! keyboard control.

mod config;
mod input;
mod render;
mod runner;

use anyhow::{Context, Result};
use clap::Parser;
use config::GridlineConfig;
use gridline_replay::{ReplayEngine, ReplaySession};
use input::TerminalInput;
use runner::{ReplayRunner, RunOptions, RunOutcome};
use std::io::Write;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Replay a recorded race as a live leaderboard
#[derive(Parser, Debug)]
#[command(name = "gridline")]
#[command(about = "Replay a recorded race as a live leaderboard")]
#[command(version)]
struct Args {
    /// Race directory containing race.json and timeline.json
    race_dir: PathBuf,

    /// Configuration file (defaults to ./gridline.toml if present)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Initial playback speed, overriding the config file
    #[arg(short, long)]
    speed: Option<f64>,

    /// Log filter used when RUST_LOG is not set
    #[arg(long, default_value = "warn")]
    log_level: String,

    /// Start playback without holding the starting grid
    #[arg(long)]
    no_intro: bool,

    /// Print the effective configuration as TOML and exit
    #[arg(long)]
    print_config: bool,
}

fn init_tracing(default_filter: &str) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_filter));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing(&args.log_level);

    let mut config = GridlineConfig::load(args.config.as_deref())?;
    if let Some(speed) = args.speed {
        config.replay = config.replay.with_speed(speed);
    }
    if args.print_config {
        print!("{}", config.to_toml()?);
        return Ok(());
    }

    tracing::info!(race_dir = %args.race_dir.display(), "loading race");
    let session = ReplaySession::load(&args.race_dir)
        .with_context(|| format!("Failed to load race from {}", args.race_dir.display()))?;
    let engine = ReplayEngine::new(session, config.replay).context("Invalid replay configuration")?;

    let mut input = TerminalInput::new()?;
    let stdout = std::io::stdout();
    let mut runner = ReplayRunner::new(engine, config.display, stdout.lock());
    let outcome = runner.run(
        &mut input,
        RunOptions {
            intro: !args.no_intro,
        },
    )?;
    // Back to cooked mode before the last line.
    drop(input);

    let (_, mut out) = runner.into_inner();
    let farewell = match outcome {
        RunOutcome::Finished { .. } => "Replay finished.",
        RunOutcome::Quit { .. } => "Quitting replay.",
    };
    writeln!(out, "\n{farewell}")?;
    tracing::debug!(frames = outcome.frames(), "exiting");
    Ok(())
}
