//! Integration tests for the learning engine
//!
//! These tests drive Q-learning and SARSA end to end through the public API.

#![allow(clippy::float_cmp)]
#![allow(clippy::cast_precision_loss)]

use serde_json::json;
use simrl_core::{DiscreteVariable, Result, SimError};
use simrl_rl::{Algorithm, EngineParams, LearningEngine, Objective, Phase};

fn espera(step: i64) -> DiscreteVariable {
    DiscreteVariable::new("Espera", 60, 300, step, "Models.Modelo.espera").unwrap()
}

fn stock() -> DiscreteVariable {
    DiscreteVariable::new("Stock", 10, 50, 10, "Models.Modelo.stock").unwrap()
}

fn numviajes() -> DiscreteVariable {
    DiscreteVariable::new("Numero de viajes", 1, 5, 1, "Models.Modelo.numviajes").unwrap()
}

fn var_input() -> Vec<DiscreteVariable> {
    vec![espera(10), stock(), numviajes()]
}

fn var_input_json() -> serde_json::Value {
    json!([
        {"name": "Espera", "lower_limit": 60, "upper_limit": 300, "step": 10, "path": "Models.Modelo.espera"},
        {"name": "Stock", "lower_limit": 10, "upper_limit": 50, "step": 10, "path": "Models.Modelo.stock"},
        {"name": "Numero de viajes", "lower_limit": 1, "upper_limit": 5, "step": 1, "path": "Models.Modelo.numviajes"}
    ])
}

/// Test space shapes for growing variable lists, including a repeated variable
#[test]
fn test_ini_saq_shapes() {
    let cases = vec![
        (vec![espera(10)], (25, 3), (25, 1), (3, 1)),
        (vec![espera(10), stock()], (125, 9), (125, 2), (9, 2)),
        (vec![espera(10), stock(), numviajes()], (625, 27), (625, 3), (27, 3)),
        (
            vec![espera(60), stock(), numviajes(), espera(60)],
            (625, 81),
            (625, 4),
            (81, 4),
        ),
    ];

    for (v_i, exp_q, exp_s, exp_a) in cases {
        let mut engine = LearningEngine::q_learning(v_i, 1, 10).unwrap();
        engine.ini_saq().unwrap();

        assert_eq!(engine.q().dim(), exp_q);
        assert_eq!(engine.states().dim(), exp_s);
        assert_eq!(engine.actions().dim(), exp_a);
        assert!(engine.q().iter().all(|&v| v == 0.0));
        assert!(!engine.states().iter().all(|&v| v == 0));
        assert!(!engine.actions().iter().all(|&v| v == 0));
    }
}

/// Repeated variables are not merged
#[test]
fn test_duplicate_variables_are_independent_columns() {
    let mut engine = LearningEngine::q_learning(vec![stock(), stock()], 1, 1).unwrap();
    engine.ini_saq().unwrap();

    assert_eq!(engine.states().dim(), (25, 2));
    assert_eq!(engine.states().row(1).to_vec(), vec![10, 20]);
    assert_eq!(engine.states().row(5).to_vec(), vec![20, 10]);
}

#[test]
fn test_five_variables_fail_at_initialization() {
    let v_i = vec![espera(10), stock(), numviajes(), espera(10), stock()];
    let mut engine = LearningEngine::q_learning(v_i, 1, 10).unwrap();
    let err = engine.ini_saq().unwrap_err();
    assert!(matches!(err, SimError::TooManyVariables { count: 5, .. }));
}

/// Valid but very wide variables are refused with an error, never a panic
#[test]
fn test_wide_variables_fail_at_initialization() {
    let wide = DiscreteVariable::new("Wide", 0, 100_000, 1, "p").unwrap();
    for count in 2..=4 {
        let mut engine = LearningEngine::sarsa(vec![wide.clone(); count], 1, 1).unwrap();
        let stats = engine.stats();
        assert_eq!(stats.variables, count);
        let err = engine.ini_saq().unwrap_err();
        assert!(matches!(err, SimError::SpaceTooLarge { .. }), "{count}: {err}");
        assert_eq!(engine.phase(), Phase::NotInitialized);
    }
}

/// Enumerating twice from the same variables gives identical tables
#[test]
fn test_enumeration_is_deterministic() {
    let mut first = LearningEngine::q_learning(var_input(), 1, 1).unwrap();
    let mut second = LearningEngine::sarsa(var_input(), 1, 1).unwrap();
    first.ini_saq().unwrap();
    second.ini_saq().unwrap();
    assert_eq!(first.states(), second.states());
    assert_eq!(first.actions(), second.actions());

    let before = first.states().clone();
    first.ini_saq().unwrap();
    assert_eq!(first.states(), &before);
}

#[test]
fn test_choose_action_zero_rows() {
    for seed in [24, 20, 12] {
        let params = EngineParams {
            epsilon: 0.0,
            ..EngineParams::default()
        }
        .with_seed(seed);
        let mut engine =
            LearningEngine::new(Algorithm::QLearning, var_input(), 1, 10, params).unwrap();
        engine.ini_saq().unwrap();
        for row in (0..625).step_by(37) {
            assert_eq!(engine.choose_action(row).unwrap(), 0);
        }
    }
}

/// SARSA is the same engine with a different target
#[test]
fn test_q_and_sarsa_share_construction() {
    let q = LearningEngine::q_learning(var_input(), 1, 10).unwrap();
    let s = LearningEngine::sarsa(var_input(), 1, 10).unwrap();

    assert_eq!(q.v_i(), s.v_i());
    assert_eq!(q.episodes_max(), s.episodes_max());
    assert_eq!(q.steps_max(), s.steps_max());
    assert_eq!(q.s(), s.s());
    assert_eq!(q.a(), s.a());
    assert_eq!(q.seed(), s.seed());
    assert_eq!(q.alfa(), s.alfa());
    assert_eq!(q.gamma(), s.gamma());
    assert_eq!(q.epsilon(), s.epsilon());
    assert_eq!(q.r_episode(), s.r_episode());
    assert_ne!(q.algorithm_name(), s.algorithm_name());
}

#[test]
fn test_engine_from_value_type_errors() {
    let base = json!({"v_i": var_input_json(), "episodes_max": 10, "steps_max": 10});
    assert!(LearningEngine::from_value(Algorithm::QLearning, &base).is_ok());

    let cases = vec![
        ("v_i", json!("variable")),
        ("v_i", json!(["espera", "stock", "numviajes", "tiempo", "velocidad"])),
        ("episodes_max", json!(3.0)),
        ("steps_max", json!("nine")),
        ("alfa", json!(2)),
        ("gamma", json!(2)),
        ("epsilon", json!(2)),
        ("seed", json!(1.5)),
        ("objective", json!(1)),
    ];
    for (field, bad) in cases {
        let mut value = base.clone();
        value[field] = bad;
        let err = LearningEngine::from_value(Algorithm::QLearning, &value)
            .err()
            .unwrap();
        assert!(err.is_type_error(), "{field}: {err}");
    }
}

#[test]
fn test_engine_from_value_value_errors() {
    let base = json!({"v_i": var_input_json(), "episodes_max": 10, "steps_max": 10});

    let cases = vec![
        ("episodes_max", json!(-1)),
        ("steps_max", json!(-1)),
        ("alfa", json!(-1.0)),
        ("alfa", json!(3.0)),
        ("gamma", json!(-1.0)),
        ("gamma", json!(3.0)),
        ("epsilon", json!(-1.0)),
        ("epsilon", json!(3.0)),
        ("seed", json!(-4)),
        ("objective", json!("sideways")),
    ];
    for (field, bad) in cases {
        let mut value = base.clone();
        value[field] = bad;
        let err = LearningEngine::from_value(Algorithm::Sarsa, &value)
            .err()
            .unwrap();
        assert!(err.is_value_error(), "{field}: {err}");
    }
}

/// Outcome is the distance from a fixed optimum; smaller is better
fn distance_plant(values: &[i64]) -> Result<f64> {
    let optimum = [150, 30, 3];
    Ok(values
        .iter()
        .zip(optimum)
        .map(|(&v, o)| ((v - o) as f64).abs())
        .sum())
}

fn trained(algorithm: Algorithm, seed: u64) -> LearningEngine {
    let params = EngineParams {
        alfa: 0.5,
        gamma: 0.9,
        epsilon: 0.3,
        seed: Some(seed),
        objective: Objective::Minimize,
    };
    let mut engine = LearningEngine::new(algorithm, var_input(), 30, 40, params).unwrap();
    engine.ini_saq().unwrap();
    let mut plant = distance_plant;
    engine.process(&mut plant).unwrap();
    engine
}

#[test]
fn test_runs_complete_and_are_reproducible() {
    for algorithm in [Algorithm::QLearning, Algorithm::Sarsa] {
        let a = trained(algorithm, 77);
        let b = trained(algorithm, 77);

        assert_eq!(a.phase(), Phase::Done);
        assert_eq!(a.r_episode().len(), 30);
        assert_eq!(a.q(), b.q());
        assert_eq!(a.r_episode(), b.r_episode());
        assert!(a.r_episode().iter().all(|r| r.abs() <= 40.0));
    }
}

#[test]
fn test_q_learning_and_sarsa_diverge() {
    let q = trained(Algorithm::QLearning, 5);
    let s = trained(Algorithm::Sarsa, 5);
    assert_ne!(q.q(), s.q());
}

#[test]
fn test_run_report_serializes() {
    let params = EngineParams::default().with_seed(1);
    let mut engine = LearningEngine::new(Algorithm::QLearning, var_input(), 2, 3, params).unwrap();
    engine.ini_saq().unwrap();
    let mut plant = distance_plant;
    let report = engine.process(&mut plant).unwrap();

    let json = serde_json::to_value(&report).unwrap();
    assert_eq!(json["algorithm"], "q_learning");
    assert_eq!(json["evaluations"], 8);
    assert_eq!(json["r_episode"].as_array().unwrap().len(), 2);
    assert_eq!(json["best_setting"].as_array().unwrap().len(), 3);
    assert!(report.best_outcome.unwrap() <= distance_plant(&[60, 10, 1]).unwrap());
}
