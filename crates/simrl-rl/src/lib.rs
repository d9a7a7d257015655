//! SimRL RL - Tabular reinforcement learning over discretized plant parameters
//!
//! This crate enumerates the state and action spaces of a set of controllable
//! variables and searches them with Q-learning or SARSA, driving a plant
//! through the [`simrl_core::Plant`] capability.

// Clippy pedantic allows - these are intentional design choices
#![allow(clippy::doc_markdown)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::return_self_not_must_use)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::cast_lossless)]
#![allow(clippy::float_cmp)]
#![allow(clippy::similar_names)]

pub mod algorithm;
pub mod engine;
pub mod plant;
pub mod reward;
pub mod space;

pub use algorithm::{Algorithm, QLearning, Sarsa, UpdateRule};
pub use engine::{EngineParams, EngineStats, LearningEngine, Phase, RunReport};
pub use plant::BasePlant;
pub use reward::{Objective, Reward};
