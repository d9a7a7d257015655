//! SimRL Core - Variable descriptors, plant traits, and shared error types
//!
//! This crate provides the foundational types used across all SimRL components.

// Clippy pedantic allows - these are intentional design choices
#![allow(clippy::doc_markdown)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::return_self_not_must_use)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::cast_possible_wrap)]

pub mod error;
pub mod plant;
pub mod util;
pub mod variable;

pub use error::{Result, SimError};
pub use plant::{Plant, Simulator};
pub use variable::{DiscreteVariable, OutcomeVariable};
