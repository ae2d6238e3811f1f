//! MarblePool Headless Runner
//!
//! Plays a computer-versus-computer match on one stage and logs the outcome.
//! Useful for checking stage files and tuning without a renderer.

use std::path::PathBuf;
use std::time::{Duration, Instant};

use anyhow::Context;
use clap::Parser;
use marblepool_core::{FrameClock, FrameInput, GameMode, MeshLibrary, StageCatalog, Table};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(name = "marblepool-headless", about = "Run a demo match without rendering")]
struct Args {
    /// Stage catalog JSON. Defaults to the catalog compiled into the core.
    #[arg(long)]
    stages: Option<PathBuf>,

    /// Stage to play.
    #[arg(long, default_value = "training")]
    stage: String,

    /// RNG seed for the match.
    #[arg(long, default_value_t = 12345)]
    seed: u64,

    /// Give up after this many ticks.
    #[arg(long, default_value_t = 60 * 60 * 10)]
    max_frames: u64,

    /// Pace ticks against the wall clock instead of running flat out.
    #[arg(long)]
    realtime: bool,

    /// Simulation speed multiplier when running in real time.
    #[arg(long, default_value_t = 1.0)]
    speed: f32,

    /// Print the final summary as JSON.
    #[arg(long)]
    json: bool,
}

fn load_catalog(path: Option<&PathBuf>) -> anyhow::Result<StageCatalog> {
    let Some(path) = path else {
        return Ok(StageCatalog::builtin());
    };
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read stage catalog {}", path.display()))?;
    let catalog = StageCatalog::from_json(&json)
        .with_context(|| format!("failed to parse stage catalog {}", path.display()))?;
    catalog
        .validate(&MeshLibrary::with_builtin_meshes())
        .with_context(|| format!("stage catalog {} needs meshes the runner does not have", path.display()))?;
    Ok(catalog)
}

fn run_flat_out(table: &mut Table, max_frames: u64) {
    let input = FrameInput::default();
    while !table.is_finished() && table.time() < max_frames {
        table.update(&input);
        log_events(table);
    }
}

fn run_realtime(table: &mut Table, max_frames: u64, speed: f32) {
    let input = FrameInput::default();
    let mut clock = FrameClock::default();
    clock.update_speed = speed;
    let mut last = Instant::now();
    while !table.is_finished() && table.time() < max_frames {
        let now = Instant::now();
        let ticks = clock.advance(now.duration_since(last).as_secs_f32());
        last = now;
        for _ in 0..ticks {
            table.update(&input);
            log_events(table);
        }
        std::thread::sleep(Duration::from_millis(4));
    }
}

fn log_events(table: &mut Table) {
    for event in table.drain_events() {
        tracing::trace!("[table] {:?}", event);
    }
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();
    let catalog = load_catalog(args.stages.as_ref())?;
    tracing::info!(
        "Loaded {} stages: {}",
        catalog.len(),
        catalog.names().collect::<Vec<_>>().join(", ")
    );

    let mut table = Table::from_catalog(&catalog, &args.stage, GameMode::Demo, args.seed)
        .with_context(|| format!("failed to set up stage '{}'", args.stage))?;

    if args.realtime {
        run_realtime(&mut table, args.max_frames, args.speed);
    } else {
        run_flat_out(&mut table, args.max_frames);
    }

    let summary = table.summary();
    match summary.winner {
        Some(winner) => tracing::info!(
            "{} won{} in {} ticks",
            winner,
            if summary.win_from_run_out { " by run-out" } else { "" },
            summary.time
        ),
        None => tracing::warn!("No winner after {} ticks", summary.time),
    }
    if args.json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    }
    Ok(())
}
