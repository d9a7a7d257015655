//! SimRL CLI support - study configuration and the simulator bridge adapter

// Clippy pedantic allows - these are intentional design choices
#![allow(clippy::doc_markdown)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::must_use_candidate)]

pub mod config;
pub mod simulator;

pub use config::{Overrides, StudyConfig};
pub use simulator::{LineProtocol, ProcessSimulator};
