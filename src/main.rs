use chrono::Utc;
use clap::{Parser, Subcommand};
use std::collections::BTreeSet;
use std::path::PathBuf;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use glitchwatch::config::LoggingSettings;
use glitchwatch::intake::{DirectoryFrameSource, MemoryFrameSource};
use glitchwatch::output::{JsonLinesSink, MemorySink};
use glitchwatch::{build_pipeline, synthetic, AppError, CoordinatorBuilder, Settings};

#[derive(Parser)]
#[command(name = "glitchwatch", version, about = "Detect blank, frozen and flickering game frames")]
struct Cli {
    /// Settings file (YAML, TOML or JSON); GLITCHWATCH_* variables override it
    #[arg(long, short, global = true, env = "GLITCHWATCH_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the detectors over a directory of frame images and print events as JSON lines
    Scan {
        /// Directory holding the frames, processed in file name order
        dir: PathBuf,
    },
    /// Run the detectors over generated clips and compare against their labels
    Demo {
        #[arg(long, default_value_t = 60)]
        frames: usize,
        #[arg(long, default_value_t = 128)]
        size: u32,
    },
}

fn init_logging(logging: &LoggingSettings) {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&logging.level));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr);
    if logging.json {
        builder.json().init();
    } else {
        builder.with_target(true).init();
    }
}

async fn scan(settings: &Settings, dir: PathBuf) -> Result<(), AppError> {
    let source = DirectoryFrameSource::open(&dir, settings.fps).await?;
    info!("Scanning {} frames from {:?}", source.len(), dir);

    let coordinator = CoordinatorBuilder::new(settings)
        .pipeline(build_pipeline(&settings.detectors))
        .build()?;

    let cancel_token = coordinator.cancel_token();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupted, stopping scan");
            cancel_token.cancel();
        }
    });

    let summary = coordinator
        .run(source, JsonLinesSink::new(std::io::stdout()))
        .await?;
    for (anomaly_type, count) in &summary.events_by_type {
        info!("{}: {}", anomaly_type, count);
    }
    Ok(())
}

async fn demo(settings: &Settings, frames: usize, size: u32) -> Result<(), AppError> {
    let mut next_id = 0;
    let mut misses = 0;
    for spec in synthetic::standard_specs(frames, size) {
        let clip = synthetic::generate(&spec, next_id, Utc::now());
        next_id += clip.frames.len() as u64;

        // Each clip gets its own pipeline so runs do not leak across clips.
        let sink = MemorySink::new();
        let coordinator = CoordinatorBuilder::new(settings)
            .pipeline(build_pipeline(&settings.detectors))
            .build()?;
        coordinator
            .run(MemoryFrameSource::new(clip.frames.clone()), sink.clone())
            .await?;
        let detected: BTreeSet<_> = sink
            .events()
            .iter()
            .map(|event| event.anomaly_type())
            .collect();

        let hit = detected.contains(&spec.label);
        if !hit {
            misses += 1;
        }
        println!(
            "{:<8} frames={:<4} detected={:?} {}",
            spec.label.as_str(),
            clip.frames.len(),
            detected.iter().map(|t| t.as_str()).collect::<Vec<_>>(),
            if hit { "ok" } else { "MISSED" }
        );
    }

    if misses > 0 {
        return Err(AppError::Pipeline(format!("{misses} labelled clips were not detected")));
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), AppError> {
    let cli = Cli::parse();
    let settings = Settings::load(cli.config.as_deref())?;
    init_logging(&settings.logging);

    match cli.command {
        Command::Scan { dir } => scan(&settings, dir).await,
        Command::Demo { frames, size } => demo(&settings, frames, size).await,
    }
}
