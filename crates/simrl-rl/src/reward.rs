//! Reward derivation from plant outcomes

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use simrl_core::SimError;

/// Reward value fed to the update rule
pub type Reward = f64;

/// Direction in which the plant outcome should move.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Objective {
    #[default]
    Minimize,
    Maximize,
}

impl Objective {
    /// `+1` when `current` improves on `previous`, `-1` when it is worse,
    /// `0` when equal.
    pub fn reward(self, previous: f64, current: f64) -> Reward {
        let improvement = match self {
            Objective::Minimize => previous - current,
            Objective::Maximize => current - previous,
        };
        if improvement > 0.0 {
            1.0
        } else if improvement < 0.0 {
            -1.0
        } else {
            0.0
        }
    }

    /// Whether `candidate` beats `incumbent`.
    pub fn is_better(self, candidate: f64, incumbent: f64) -> bool {
        match self {
            Objective::Minimize => candidate < incumbent,
            Objective::Maximize => candidate > incumbent,
        }
    }
}

impl FromStr for Objective {
    type Err = SimError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "minimize" | "min" => Ok(Objective::Minimize),
            "maximize" | "max" => Ok(Objective::Maximize),
            other => Err(SimError::Value(format!("Unknown objective: {other}"))),
        }
    }
}
