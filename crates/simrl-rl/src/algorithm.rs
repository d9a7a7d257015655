//! Temporal-difference update rules
//!
//! The engine owns one scaffold (spaces, policy, episode loop) and delegates
//! only the bootstrap target to an [`UpdateRule`].

use std::fmt;
use std::str::FromStr;

use ndarray::ArrayView1;
use serde::{Deserialize, Serialize};

use simrl_core::SimError;

/// Trait for TD update rules
pub trait UpdateRule: Send + Sync {
    /// Rule name
    fn name(&self) -> &'static str;

    /// Whether the target bootstraps from the action the policy will actually
    /// take next. On-policy rules need that action chosen before the update.
    fn is_on_policy(&self) -> bool;

    /// Bootstrap target for one transition.
    ///
    /// `next_q` is the row of `Q` for the next state; `next_action` is the
    /// action already chosen for it when the rule is on-policy.
    fn target(
        &self,
        reward: f64,
        gamma: f64,
        next_q: ArrayView1<'_, f64>,
        next_action: Option<usize>,
    ) -> f64;
}

/// Largest value of a Q row (`0.0` for an empty row).
pub fn max_value(row: ArrayView1<'_, f64>) -> f64 {
    row.iter()
        .copied()
        .fold(None, |best: Option<f64>, v| Some(best.map_or(v, |b| b.max(v))))
        .unwrap_or(0.0)
}

/// Index of the largest value of a Q row, lowest index on ties.
pub fn argmax(row: ArrayView1<'_, f64>) -> usize {
    let mut best_idx = 0;
    let mut best = f64::NEG_INFINITY;
    for (idx, &value) in row.iter().enumerate() {
        if value > best {
            best = value;
            best_idx = idx;
        }
    }
    best_idx
}

/// Q-Learning: off-policy, bootstraps from the best next action.
#[derive(Debug, Clone, Copy, Default)]
pub struct QLearning;

impl UpdateRule for QLearning {
    fn name(&self) -> &'static str {
        "q_learning"
    }

    fn is_on_policy(&self) -> bool {
        false
    }

    fn target(
        &self,
        reward: f64,
        gamma: f64,
        next_q: ArrayView1<'_, f64>,
        _next_action: Option<usize>,
    ) -> f64 {
        reward + gamma * max_value(next_q)
    }
}

/// SARSA: on-policy, bootstraps from the action the policy takes next.
#[derive(Debug, Clone, Copy, Default)]
pub struct Sarsa;

impl UpdateRule for Sarsa {
    fn name(&self) -> &'static str {
        "sarsa"
    }

    fn is_on_policy(&self) -> bool {
        true
    }

    fn target(
        &self,
        reward: f64,
        gamma: f64,
        next_q: ArrayView1<'_, f64>,
        next_action: Option<usize>,
    ) -> f64 {
        match next_action.and_then(|a| next_q.get(a).copied()) {
            Some(q) => reward + gamma * q,
            // No follow-up action known: degrade to the greedy estimate
            None => reward + gamma * max_value(next_q),
        }
    }
}

/// Selectable update rule
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Algorithm {
    #[default]
    QLearning,
    Sarsa,
}

impl Algorithm {
    pub fn name(self) -> &'static str {
        match self {
            Algorithm::QLearning => "q_learning",
            Algorithm::Sarsa => "sarsa",
        }
    }

    /// Instantiate the rule this variant names.
    pub fn rule(self) -> Box<dyn UpdateRule> {
        match self {
            Algorithm::QLearning => Box::new(QLearning),
            Algorithm::Sarsa => Box::new(Sarsa),
        }
    }
}

impl fmt::Display for Algorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Algorithm {
    type Err = SimError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "q_learning" | "qlearning" => Ok(Algorithm::QLearning),
            "sarsa" => Ok(Algorithm::Sarsa),
            other => Err(SimError::Value(format!("Unknown algorithm: {other}"))),
        }
    }
}
