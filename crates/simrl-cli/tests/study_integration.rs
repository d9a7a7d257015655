//! End-to-end runs against the toy simulator bridge

use std::path::{Path, PathBuf};
use std::process::Command;

use serde_json::Value;
use simrl_cli::{Overrides, ProcessSimulator, StudyConfig};
use simrl_core::Simulator;
use simrl_rl::{BasePlant, Phase};
use tempfile::TempDir;

const TOY_SIM: &str = env!("CARGO_BIN_EXE_simrl-toy-sim");
const SIMRL: &str = env!("CARGO_BIN_EXE_simrl");

fn write_study(dir: &Path, algorithm: &str) -> PathBuf {
    let study = format!(
        r#"
[learning]
algorithm = "{algorithm}"
episodes_max = 3
steps_max = 8
seed = 11

[model]
filename = "MaterialHandling.spp"
modelname = "Model"

[simulator]
command = "{TOY_SIM}"

[[controllable]]
name = "Stock"
lower_limit = 10
upper_limit = 50
step = 10
path = "Models.Modelo.stock"

[[controllable]]
name = "Numero de viajes"
lower_limit = 1
upper_limit = 5
step = 1
path = "Models.Modelo.numviajes"

[[observable]]
name = "Distancia Transportes"
path = "Models.Modelo.transportes"
column = 2
num_rows = 2
"#
    );
    let path = dir.join("simrl.toml");
    std::fs::write(&path, study).unwrap();
    path
}

#[test]
fn test_toy_simulator_session() {
    let mut sim = ProcessSimulator::spawn(TOY_SIM, &[]).unwrap();
    sim.load_model("MaterialHandling.spp", "Model").unwrap();
    sim.set_value("a", 30).unwrap();
    sim.set_value("b", 45).unwrap();
    sim.start_simulation("Model").unwrap();
    assert_eq!(sim.get_value("out", 1, 1).unwrap(), 15.0);

    // Rows are 1-based
    assert!(sim.get_value("out", 1, 0).is_err());
}

#[test]
fn test_toy_simulator_target_argument() {
    let mut sim = ProcessSimulator::spawn(TOY_SIM, &["--target".to_string(), "0".to_string()])
        .unwrap();
    sim.load_model("m.spp", "Model").unwrap();
    sim.set_value("a", 7).unwrap();
    sim.start_simulation("Model").unwrap();
    assert_eq!(sim.get_value("out", 1, 1).unwrap(), 7.0);
}

#[test]
fn test_start_before_load_fails() {
    let mut sim = ProcessSimulator::spawn(TOY_SIM, &[]).unwrap();
    assert!(sim.start_simulation("Model").is_err());
}

#[test]
fn test_study_runs_against_bridge() {
    let dir = TempDir::new().unwrap();
    let path = write_study(dir.path(), "q_learning");

    let study = StudyConfig::load(Some(&path)).unwrap();
    let engine = study.engine(&Overrides::default()).unwrap();
    let simulator = ProcessSimulator::spawn(&study.simulator.command, &study.simulator.args).unwrap();
    let mut plant = BasePlant::new(
        engine,
        study.controllable.clone(),
        study.observable.clone(),
        study.model.filename.clone(),
        study.model.modelname.clone(),
        simulator,
    )
    .unwrap();

    plant.connect().unwrap();
    let report = plant.process_simulation().unwrap();

    assert_eq!(report.algorithm, "q_learning");
    assert_eq!(report.r_episode.len(), 3);
    assert_eq!(report.evaluations, 3 * 9);
    assert_eq!(plant.method().phase(), Phase::Done);
    assert_eq!(report.best_setting.len(), 2);

    // Episodes start at (10, 1): 2 rows of |10-40| + |1-40|
    let start = 2.0 * 69.0;
    let best = report.best_outcome.unwrap();
    assert!(best <= start);
}

#[test]
fn test_sarsa_study_runs_against_bridge() {
    let dir = TempDir::new().unwrap();
    let path = write_study(dir.path(), "sarsa");

    let study = StudyConfig::load(Some(&path)).unwrap();
    let engine = study.engine(&Overrides::default()).unwrap();
    let simulator = ProcessSimulator::spawn(&study.simulator.command, &study.simulator.args).unwrap();
    let mut plant = BasePlant::new(
        engine,
        study.controllable.clone(),
        study.observable.clone(),
        study.model.filename.clone(),
        study.model.modelname.clone(),
        simulator,
    )
    .unwrap();

    plant.connect().unwrap();
    let report = plant.process_simulation().unwrap();
    assert_eq!(report.algorithm, "sarsa");
    assert_eq!(report.steps_per_episode, 8);
}

#[test]
fn test_missing_explicit_study_file() {
    let dir = TempDir::new().unwrap();
    assert!(StudyConfig::load(Some(&dir.path().join("absent.toml"))).is_err());
}

#[test]
fn test_cli_space() {
    let dir = TempDir::new().unwrap();
    let path = write_study(dir.path(), "q_learning");

    let output = Command::new(SIMRL)
        .arg("space")
        .arg("--config")
        .arg(&path)
        .output()
        .unwrap();
    assert!(output.status.success());

    let stdout = String::from_utf8(output.stdout).unwrap();
    assert!(stdout.contains("|S| = 25"));
    assert!(stdout.contains("|A| = 9"));
}

#[test]
fn test_cli_run_writes_report() {
    let dir = TempDir::new().unwrap();
    let path = write_study(dir.path(), "q_learning");
    let report_path = dir.path().join("report.json");

    let status = Command::new(SIMRL)
        .arg("run")
        .arg("--config")
        .arg(&path)
        .args(["--episodes", "2", "--steps", "4", "--algorithm", "sarsa"])
        .arg("--output")
        .arg(&report_path)
        .status()
        .unwrap();
    assert!(status.success());

    let report: Value =
        serde_json::from_str(&std::fs::read_to_string(&report_path).unwrap()).unwrap();
    assert_eq!(report["algorithm"], "sarsa");
    assert_eq!(report["episodes"], 2);
    assert_eq!(report["steps_per_episode"], 4);
    assert_eq!(report["evaluations"], 2 * 5);
    assert_eq!(report["r_episode"].as_array().unwrap().len(), 2);
}

#[test]
fn test_cli_run_rejects_invalid_study() {
    let dir = TempDir::new().unwrap();
    let path = write_study(dir.path(), "ppo");

    let output = Command::new(SIMRL)
        .arg("run")
        .arg("--config")
        .arg(&path)
        .output()
        .unwrap();
    assert!(!output.status.success());
}
