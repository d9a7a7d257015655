//! Describe the discretized space of a study without running it

use std::path::Path;

use anyhow::Result;

use simrl_cli::{Overrides, StudyConfig};
use simrl_core::SimError;
use simrl_rl::space::{self, MAX_STATES, MAX_VARIABLES};

pub fn run(config_path: Option<&Path>) -> Result<()> {
    let study = StudyConfig::load(config_path)?;
    let v_i = &study.controllable;

    println!("Controllable variables");
    println!("======================\n");
    println!(
        "{:<24} {:>8} {:>8} {:>6} {:>7}  PATH",
        "NAME", "LOWER", "UPPER", "STEP", "VALUES"
    );
    println!("{}", "-".repeat(72));
    for var in v_i {
        println!(
            "{:<24} {:>8} {:>8} {:>6} {:>7}  {}",
            var.name(),
            var.lower_limit(),
            var.upper_limit(),
            var.step(),
            var.value_count(),
            var.path()
        );
    }

    println!("\nObservables: {}", study.observable.len());
    println!("Algorithm: {}", study.algorithm(&Overrides::default())?);

    if let Err(e) = space::check_dimensions(v_i) {
        println!("\n{e}");
        match &e {
            SimError::TooManyVariables { .. } => println!(
                "Reduce the study to at most {MAX_VARIABLES} controllable variables."
            ),
            _ => println!(
                "Use coarser steps or narrower limits to stay within {MAX_STATES} states."
            ),
        }
        return Err(e.into());
    }

    let states = space::state_count(v_i).unwrap_or_default();
    let actions = space::action_count(v_i).unwrap_or_default();
    println!("\n|S| = {states}");
    println!("|A| = {actions}");
    println!("Q shape = ({states}, {actions})");

    Ok(())
}
