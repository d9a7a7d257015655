//! Toy simulator bridge
//!
//! Speaks the simrl line protocol on stdin/stdout without a real simulation
//! package behind it. Every table cell reads back the total distance of the
//! current settings from a target, so a run has a known optimum to find.

// Clippy pedantic allows - these are intentional design choices
#![allow(clippy::doc_markdown)]
#![allow(clippy::cast_precision_loss)]

use std::collections::HashMap;
use std::io::{self, BufRead, Write};

use anyhow::Result;
use clap::Parser;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

/// SimRL toy simulator - line-protocol bridge with a known optimum
#[derive(Parser, Debug)]
#[command(name = "simrl-toy-sim")]
#[command(version, about, long_about = None)]
struct Args {
    /// Value every controllable setting is scored against
    #[arg(long, default_value_t = 40, allow_negative_numbers = true)]
    target: i64,

    /// Enable debug logging (writes to stderr)
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
enum Request {
    Load { filename: String, modelname: String },
    Set { path: String, value: i64 },
    Start { modelname: String },
    Get { path: String, column: usize, row: usize },
}

struct ToyModel {
    loaded: Option<String>,
    target: i64,
    settings: HashMap<String, i64>,
    outcome: f64,
    runs: u64,
}

impl ToyModel {
    fn new(target: i64) -> Self {
        Self {
            loaded: None,
            target,
            settings: HashMap::new(),
            outcome: 0.0,
            runs: 0,
        }
    }

    fn handle(&mut self, request: Request) -> Value {
        match request {
            Request::Load {
                filename,
                modelname,
            } => {
                info!("Loaded {} from {}", modelname, filename);
                self.loaded = Some(modelname);
                json!({ "ok": true })
            }
            Request::Set { path, value } => {
                self.settings.insert(path, value);
                json!({ "ok": true })
            }
            Request::Start { modelname } => {
                if self.loaded.as_deref() != Some(modelname.as_str()) {
                    return json!({ "ok": false, "error": format!("model {modelname} is not loaded") });
                }
                self.outcome = self
                    .settings
                    .values()
                    .map(|v| (v - self.target).abs() as f64)
                    .sum();
                self.runs += 1;
                debug!("Run {} outcome {}", self.runs, self.outcome);
                json!({ "ok": true })
            }
            Request::Get { path, column, row } => {
                if self.runs == 0 {
                    return json!({ "ok": false, "error": "no simulation has run" });
                }
                if column == 0 || row == 0 {
                    return json!({ "ok": false, "error": format!("{path}: rows and columns start at 1") });
                }
                json!({ "ok": true, "value": self.outcome })
            }
        }
    }
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Logging goes to stderr, stdout carries the protocol
    let level = if args.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(level))
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .init();

    info!("Starting toy simulator, target {}", args.target);
    let mut model = ToyModel::new(args.target);

    let stdin = io::stdin();
    let mut stdout = io::stdout().lock();

    for line in stdin.lock().lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let response = match serde_json::from_str::<Request>(&line) {
            Ok(request) => model.handle(request),
            Err(e) => {
                warn!("Bad request: {}", e);
                json!({ "ok": false, "error": format!("bad request: {e}") })
            }
        };
        writeln!(stdout, "{response}")?;
        stdout.flush()?;
    }

    info!("Input closed after {} runs", model.runs);
    Ok(())
}
