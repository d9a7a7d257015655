//! Run a study against the configured simulator bridge

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Args;
use tracing::info;

use simrl_cli::{Overrides, ProcessSimulator, StudyConfig};
use simrl_rl::{Algorithm, BasePlant};

#[derive(Args)]
pub struct RunArgs {
    /// Update rule (q_learning or sarsa); overrides [learning].algorithm
    #[arg(short, long)]
    algorithm: Option<Algorithm>,

    /// Number of episodes; overrides [learning].episodes_max
    #[arg(short, long)]
    episodes: Option<i64>,

    /// Steps per episode; overrides [learning].steps_max
    #[arg(short, long)]
    steps: Option<i64>,

    /// Exploration seed; overrides [learning].seed
    #[arg(long)]
    seed: Option<u64>,

    /// Write the run report to this file instead of stdout
    #[arg(short, long)]
    output: Option<PathBuf>,
}

pub fn run(args: RunArgs, config_path: Option<&Path>) -> Result<()> {
    let study = StudyConfig::load(config_path)?;
    let overrides = Overrides {
        algorithm: args.algorithm,
        episodes_max: args.episodes,
        steps_max: args.steps,
        seed: args.seed,
    };
    let engine = study.engine(&overrides)?;

    let simulator = ProcessSimulator::spawn(&study.simulator.command, &study.simulator.args)
        .context("Failed to start simulator bridge")?;
    let mut plant = BasePlant::new(
        engine,
        study.controllable.clone(),
        study.observable.clone(),
        study.model.filename.clone(),
        study.model.modelname.clone(),
        simulator,
    )?;

    plant.connect().context("Failed to load model")?;
    let report = plant.process_simulation().context("Run aborted")?;
    let json = serde_json::to_string_pretty(&report)?;

    match args.output {
        Some(path) => {
            std::fs::write(&path, json)
                .with_context(|| format!("Failed to write report to {}", path.display()))?;
            info!("Report written to {}", path.display());
        }
        None => println!("{json}"),
    }

    Ok(())
}
