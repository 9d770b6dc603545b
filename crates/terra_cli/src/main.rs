//! Terra CLI
//!
//! Runs the plate tectonics timeline without a renderer: plays it to the end,
//! inspects a single progress value, or writes a starter terra.toml.

use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

mod config;
mod scene;

use config::{TerraConfig, CONFIG_FILE};
use scene::FrameLoop;

#[derive(Parser)]
#[command(name = "terra")]
#[command(author, version, about = "Plate tectonics timeline driver", long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a default terra.toml
    Init {
        /// Target directory
        #[arg(default_value = ".")]
        path: PathBuf,

        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },

    /// Play the timeline from 0% to 100%
    Simulate {
        /// Config file or directory containing terra.toml
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Frames per second of the synthetic frame loop
        #[arg(long, default_value_t = 60, value_parser = clap::value_parser!(u32).range(1..=1000))]
        fps: u32,

        /// Override the configured speed multiplier
        #[arg(long)]
        speed: Option<f32>,

        /// Sleep between frames and use measured deltas
        #[arg(long)]
        realtime: bool,

        /// Print the final snapshot as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show the scene at one progress value
    Inspect {
        /// Progress in [0, 1]
        #[arg(short, long)]
        progress: f32,

        /// Config file or directory containing terra.toml
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Print the snapshot as JSON
        #[arg(long)]
        json: bool,
    },

    /// List the phase schedule
    Phases {
        /// Config file or directory containing terra.toml
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
}

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Init { path, force } => cmd_init(path, force),
        Commands::Simulate {
            config,
            fps,
            speed,
            realtime,
            json,
        } => cmd_simulate(config, fps, speed, realtime, json),
        Commands::Inspect {
            progress,
            config,
            json,
        } => cmd_inspect(config, progress, json),
        Commands::Phases { config } => cmd_phases(config),
    }
}

fn cmd_init(path: PathBuf, force: bool) -> Result<()> {
    fs::create_dir_all(&path)
        .with_context(|| format!("Failed to create {}", path.display()))?;

    let target = path.join(CONFIG_FILE);
    if target.exists() && !force {
        anyhow::bail!(
            "{} already exists. Use --force to overwrite.",
            target.display()
        );
    }

    fs::write(&target, TerraConfig::default().to_toml()?)
        .with_context(|| format!("Failed to write {}", target.display()))?;

    info!("Wrote {}", target.display());
    Ok(())
}

fn cmd_simulate(
    config: Option<PathBuf>,
    fps: u32,
    speed: Option<f32>,
    realtime: bool,
    json: bool,
) -> Result<()> {
    let config = TerraConfig::load_or_default(config.as_deref())?;
    let mut clock = scene::build_clock(&config)?;

    if let Some(speed) = speed {
        clock.controls().set_speed(speed)?;
    }

    let mut last_percent = None;
    clock.set_observer(move |report| {
        let percent = report.percent();
        if last_percent != Some(percent) && percent % 10 == 0 {
            info!("{}", report);
        }
        last_percent = Some(percent);
    });

    info!(
        entities = clock.registry().len(),
        duration_secs = config.timeline.duration_secs,
        speed = clock.speed(),
        fps,
        realtime,
        "starting simulation"
    );
    let summary = FrameLoop { fps, realtime }.run(&mut clock)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&clock.snapshot())?);
    } else {
        println!(
            "{} frames, {:.2}s simulated, {:.2?} wall\n",
            summary.frames, summary.simulated_secs, summary.wall
        );
        print!("{}", scene::format_snapshot(&clock.snapshot()));
    }
    Ok(())
}

fn cmd_inspect(config: Option<PathBuf>, progress: f32, json: bool) -> Result<()> {
    if !(0.0..=1.0).contains(&progress) {
        anyhow::bail!("progress must be within [0, 1], got {}", progress);
    }

    let config = TerraConfig::load_or_default(config.as_deref())?;
    let scrubbed = scene::scrub(&config, progress)?;

    if json {
        let value = serde_json::json!({
            "progress": progress,
            "phase": scrubbed.phase.name,
            "local_fraction": scrubbed.local_fraction,
            "entities": scrubbed.snapshot,
        });
        println!("{}", serde_json::to_string_pretty(&value)?);
    } else {
        println!(
            "{:.0}% - {} (phase '{}', {:.1}% through)\n",
            progress * 100.0,
            scrubbed.phase.display_label(),
            scrubbed.phase.name,
            scrubbed.local_fraction * 100.0
        );
        print!("{}", scene::format_snapshot(&scrubbed.snapshot));
    }
    Ok(())
}

fn cmd_phases(config: Option<PathBuf>) -> Result<()> {
    let config = TerraConfig::load_or_default(config.as_deref())?;
    let clock = scene::build_clock(&config)?;

    println!(
        "{:.1}s at {}x, easing {:?}\n",
        config.timeline.duration_secs,
        clock.speed(),
        clock.policy().easing()
    );
    for phase in clock.schedule().phases() {
        println!(
            "{:>5.1}% - {:>5.1}%  {:<12} {}",
            phase.start * 100.0,
            phase.end * 100.0,
            phase.name,
            phase.display_label()
        );
    }
    Ok(())
}
