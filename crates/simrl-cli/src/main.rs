//! SimRL CLI - Command line interface for SimRL
//!
//! Loads a study file, starts the simulator bridge it names, and searches the
//! controllable parameters with Q-learning or SARSA.

// Clippy pedantic allows - these are intentional design choices
#![allow(clippy::doc_markdown)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::needless_pass_by_value)]

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;

use commands::{config, run, space};

#[derive(Parser)]
#[command(name = "simrl")]
#[command(author, version, about = "SimRL - tabular RL over discrete simulator parameters", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Study file (default: $SIMRL_CONFIG, ./simrl.toml, <config dir>/simrl/simrl.toml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a study against the simulator bridge
    Run(run::RunArgs),

    /// Show the size of a study's state and action spaces
    Space,

    /// Study file management
    #[command(subcommand)]
    Config(config::ConfigCommands),
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging based on verbosity
    let log_level = if cli.verbose { "debug" } else { "info" };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                format!("simrl={log_level},simrl_cli={log_level},simrl_rl={log_level},simrl_core={log_level}")
                    .into()
            }),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let config_path = cli.config.as_deref();

    match cli.command {
        Commands::Run(args) => run::run(args, config_path),
        Commands::Space => space::run(config_path),
        Commands::Config(cmd) => config::run(cmd, config_path),
    }
}
