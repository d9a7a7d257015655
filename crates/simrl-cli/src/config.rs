//! Study configuration loading

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use config::{ConfigBuilder, Environment, File};
use serde::Deserialize;
use serde_json::{Map, Value};

use simrl_core::{DiscreteVariable, OutcomeVariable};
use simrl_rl::{Algorithm, LearningEngine};

/// One optimisation study: what to vary, what to observe, how to learn
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StudyConfig {
    /// Learning parameters, validated when the engine is built
    pub learning: Value,
    pub model: ModelConfig,
    pub simulator: SimulatorConfig,
    pub controllable: Vec<DiscreteVariable>,
    pub observable: Vec<OutcomeVariable>,
}

impl Default for StudyConfig {
    fn default() -> Self {
        Self {
            learning: Value::Object(Map::new()),
            model: ModelConfig::default(),
            simulator: SimulatorConfig::default(),
            controllable: Vec::new(),
            observable: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    pub filename: String,
    pub modelname: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct SimulatorConfig {
    pub command: String,
    pub args: Vec<String>,
}

/// Command-line overrides applied on top of the `[learning]` section
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub algorithm: Option<Algorithm>,
    pub episodes_max: Option<i64>,
    pub steps_max: Option<i64>,
    pub seed: Option<u64>,
}

impl StudyConfig {
    /// Load configuration from file and environment
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let config_path = Self::find_config_file(explicit);

        let mut builder = ConfigBuilder::<config::builder::DefaultState>::default();

        if let Some(path) = &config_path {
            tracing::info!("Loading study from: {:?}", path);
            builder = builder.add_source(File::from(path.clone()).required(true));
        } else if let Some(path) = explicit {
            bail!("Study file not found: {}", path.display());
        } else {
            tracing::info!("No study file found, using environment only");
        }

        // Add environment variables with SIMRL_ prefix
        builder = builder.add_source(
            Environment::with_prefix("SIMRL")
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true),
        );

        let config = builder.build()?;

        config
            .try_deserialize()
            .context("Failed to deserialize study configuration")
    }

    /// Parse a study from TOML text, without consulting the environment.
    pub fn from_toml(text: &str) -> Result<Self> {
        toml::from_str(text).context("Failed to parse study configuration")
    }

    /// Find the study file
    pub fn find_config_file(explicit: Option<&Path>) -> Option<PathBuf> {
        // Check in order: --config, SIMRL_CONFIG env, ./simrl.toml, ~/.config/simrl/simrl.toml
        if let Some(path) = explicit {
            return path.exists().then(|| path.to_path_buf());
        }

        if let Ok(path) = std::env::var("SIMRL_CONFIG") {
            let path = PathBuf::from(path);
            if path.exists() {
                return Some(path);
            }
        }

        let local = PathBuf::from("simrl.toml");
        if local.exists() {
            return Some(local);
        }

        if let Some(config_dir) = dirs::config_dir() {
            let user_config = config_dir.join("simrl").join("simrl.toml");
            if user_config.exists() {
                return Some(user_config);
            }
        }

        None
    }

    /// Algorithm named in `[learning]`, unless overridden.
    pub fn algorithm(&self, overrides: &Overrides) -> Result<Algorithm> {
        if let Some(algorithm) = overrides.algorithm {
            return Ok(algorithm);
        }
        match self.learning.get("algorithm") {
            None | Some(Value::Null) => Ok(Algorithm::default()),
            Some(Value::String(name)) => Ok(name.parse()?),
            Some(other) => bail!("`learning.algorithm` must be a string, got {other}"),
        }
    }

    /// Build the learning engine described by this study.
    pub fn engine(&self, overrides: &Overrides) -> Result<LearningEngine> {
        if self.controllable.is_empty() {
            bail!("Study declares no [[controllable]] variables");
        }

        let mut learning = match &self.learning {
            Value::Object(map) => map.clone(),
            Value::Null => Map::new(),
            other => bail!("[learning] must be a table, got {other}"),
        };
        learning.remove("algorithm");
        if let Some(episodes) = overrides.episodes_max {
            learning.insert("episodes_max".into(), episodes.into());
        }
        if let Some(steps) = overrides.steps_max {
            learning.insert("steps_max".into(), steps.into());
        }
        if let Some(seed) = overrides.seed {
            learning.insert("seed".into(), seed.into());
        }
        learning.insert("v_i".into(), serde_json::to_value(&self.controllable)?);

        let algorithm = self.algorithm(overrides)?;
        LearningEngine::from_value(algorithm, &Value::Object(learning))
            .context("Invalid [learning] configuration")
    }
}
