//! Study configuration commands

use std::path::Path;

use anyhow::Result;
use clap::Subcommand;

use simrl_cli::StudyConfig;

const STUDY_TEMPLATE: &str = include_str!("../../../../simrl.toml.example");

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Show the study file in use
    Show,
    /// Write an example study file to ./simrl.toml
    Init {
        /// Force overwrite existing study file
        #[arg(short, long)]
        force: bool,
    },
}

pub fn run(cmd: ConfigCommands, config_path: Option<&Path>) -> Result<()> {
    match cmd {
        ConfigCommands::Show => show(config_path),
        ConfigCommands::Init { force } => init(force),
    }
}

fn show(config_path: Option<&Path>) -> Result<()> {
    println!("Current Study");
    println!("=============\n");

    match StudyConfig::find_config_file(config_path) {
        Some(path) => {
            println!("Study file: {}\n", path.display());
            let content = std::fs::read_to_string(&path)?;
            println!("{content}");
        }
        None => {
            println!("No study file found.");
            println!("\nSearched: --config, $SIMRL_CONFIG, ./simrl.toml, <config dir>/simrl/simrl.toml");
            println!("Run `simrl config init` to create one.");
        }
    }

    Ok(())
}

fn init(force: bool) -> Result<()> {
    let config_path = "simrl.toml";

    if Path::new(config_path).exists() && !force {
        println!("Study file already exists: {config_path}");
        println!("Use --force to overwrite");
        return Ok(());
    }

    std::fs::write(config_path, STUDY_TEMPLATE)?;
    println!("Study file created: {config_path}");

    Ok(())
}
