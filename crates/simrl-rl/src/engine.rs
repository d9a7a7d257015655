//! Learning Engine - Tabular Q-learning / SARSA over a discretized space

use chrono::{DateTime, Utc};
use ndarray::{Array1, Array2};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info, trace};
use uuid::Uuid;

use simrl_core::util::{as_array, as_object, int_field, opt_float_field, opt_int_field};
use simrl_core::{DiscreteVariable, Plant, Result, SimError};

use crate::algorithm::{argmax, max_value, Algorithm, UpdateRule};
use crate::reward::Objective;
use crate::space;

pub const DEFAULT_ALFA: f64 = 0.10;
pub const DEFAULT_GAMMA: f64 = 0.90;
pub const DEFAULT_EPSILON: f64 = 0.10;

/// Learning hyperparameters
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct EngineParams {
    /// Learning rate, in `[0, 1]`
    pub alfa: f64,
    /// Discount factor, in `[0, 1]`
    pub gamma: f64,
    /// Exploration probability, in `[0, 1]`
    pub epsilon: f64,
    /// Seed for the exploration random source; `None` seeds from entropy
    pub seed: Option<u64>,
    pub objective: Objective,
}

impl Default for EngineParams {
    fn default() -> Self {
        Self {
            alfa: DEFAULT_ALFA,
            gamma: DEFAULT_GAMMA,
            epsilon: DEFAULT_EPSILON,
            seed: None,
            objective: Objective::Minimize,
        }
    }
}

fn check_unit_interval(field: &str, value: f64) -> Result<()> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(SimError::Value(format!(
            "`{field}` must lie in [0, 1], got {value}"
        )))
    }
}

impl EngineParams {
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn with_objective(mut self, objective: Objective) -> Self {
        self.objective = objective;
        self
    }

    /// Check every rate lies in `[0, 1]`.
    pub fn validate(&self) -> Result<()> {
        check_unit_interval("alfa", self.alfa)?;
        check_unit_interval("gamma", self.gamma)?;
        check_unit_interval("epsilon", self.epsilon)
    }

    /// Read optional `alfa`, `gamma`, `epsilon`, `seed`, `objective` fields;
    /// absent fields take their defaults.
    pub fn from_value(value: &Value) -> Result<Self> {
        let map = as_object(value, "engine parameters")?;
        let defaults = Self::default();

        let seed = match opt_int_field(map, "seed")? {
            Some(seed) if seed < 0 => {
                return Err(SimError::Value(format!(
                    "`seed` must be non-negative, got {seed}"
                )))
            }
            Some(seed) => Some(seed as u64),
            None => None,
        };
        let objective = match map.get("objective") {
            None | Some(Value::Null) => defaults.objective,
            Some(Value::String(s)) => s.parse()?,
            Some(other) => {
                return Err(SimError::Type(format!(
                    "`objective` must be a string, got {}",
                    simrl_core::util::kind_of(other)
                )))
            }
        };

        let params = Self {
            alfa: opt_float_field(map, "alfa")?.unwrap_or(defaults.alfa),
            gamma: opt_float_field(map, "gamma")?.unwrap_or(defaults.gamma),
            epsilon: opt_float_field(map, "epsilon")?.unwrap_or(defaults.epsilon),
            seed,
            objective,
        };
        params.validate()?;
        Ok(params)
    }
}

/// Lifecycle of an engine: spaces must be built before a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "phase", rename_all = "snake_case")]
pub enum Phase {
    NotInitialized,
    SpaceBuilt,
    Running { episode: usize, step: usize },
    Done,
}

/// Learning engine over the discretized space of a set of controllable variables.
///
/// Q-learning and SARSA share this type and differ only in the [`UpdateRule`]
/// selected at construction.
pub struct LearningEngine {
    rule: Box<dyn UpdateRule>,
    v_i: Vec<DiscreteVariable>,
    episodes_max: usize,
    steps_max: usize,
    params: EngineParams,
    rng: StdRng,

    /// Per-variable feasible values
    s: Vec<Vec<i64>>,
    /// Per-variable step actions
    a: Vec<[i64; 3]>,

    states: Array2<i64>,
    actions: Array2<i64>,
    q: Array2<f64>,
    r_episode: Array1<f64>,

    phase: Phase,
    evaluations: u64,
    best: Option<(Vec<i64>, f64)>,
}

impl std::fmt::Debug for LearningEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LearningEngine")
            .field("rule", &self.rule.name())
            .field("v_i", &self.v_i)
            .field("episodes_max", &self.episodes_max)
            .field("steps_max", &self.steps_max)
            .field("params", &self.params)
            .field("phase", &self.phase)
            .field("evaluations", &self.evaluations)
            .field("best", &self.best)
            .finish_non_exhaustive()
    }
}

fn positive(field: &str, value: i64) -> Result<usize> {
    if value > 0 {
        Ok(value as usize)
    } else {
        Err(SimError::Value(format!(
            "`{field}` must be positive, got {value}"
        )))
    }
}

impl LearningEngine {
    /// Create an engine for `algorithm`.
    ///
    /// Spaces are not built here; call [`ini_saq`](Self::ini_saq) once the
    /// hyperparameters are final.
    pub fn new(
        algorithm: Algorithm,
        v_i: Vec<DiscreteVariable>,
        episodes_max: i64,
        steps_max: i64,
        params: EngineParams,
    ) -> Result<Self> {
        let episodes_max = positive("episodes_max", episodes_max)?;
        let steps_max = positive("steps_max", steps_max)?;
        params.validate()?;

        let rng = match params.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        Ok(Self {
            rule: algorithm.rule(),
            v_i,
            episodes_max,
            steps_max,
            params,
            rng,
            s: Vec::new(),
            a: Vec::new(),
            states: Array2::zeros((0, 0)),
            actions: Array2::zeros((0, 0)),
            q: Array2::zeros((0, 0)),
            r_episode: Array1::zeros(0),
            phase: Phase::NotInitialized,
            evaluations: 0,
            best: None,
        })
    }

    /// Q-learning engine with default hyperparameters.
    pub fn q_learning(v_i: Vec<DiscreteVariable>, episodes_max: i64, steps_max: i64) -> Result<Self> {
        Self::new(Algorithm::QLearning, v_i, episodes_max, steps_max, EngineParams::default())
    }

    /// SARSA engine with default hyperparameters.
    pub fn sarsa(v_i: Vec<DiscreteVariable>, episodes_max: i64, steps_max: i64) -> Result<Self> {
        Self::new(Algorithm::Sarsa, v_i, episodes_max, steps_max, EngineParams::default())
    }

    /// Build from an untyped object: `v_i` (array of controllable-variable
    /// objects), `episodes_max`, `steps_max`, and the optional fields read by
    /// [`EngineParams::from_value`].
    pub fn from_value(algorithm: Algorithm, value: &Value) -> Result<Self> {
        let map = as_object(value, "engine")?;
        let v_i = map
            .get("v_i")
            .ok_or_else(|| SimError::Type("missing field `v_i`".into()))?;
        let v_i = as_array(v_i, "`v_i`")?
            .iter()
            .map(DiscreteVariable::from_value)
            .collect::<Result<Vec<_>>>()?;
        let episodes_max = int_field(map, "episodes_max")?;
        let steps_max = int_field(map, "steps_max")?;
        let params = EngineParams::from_value(value)?;
        Self::new(algorithm, v_i, episodes_max, steps_max, params)
    }

    pub fn algorithm_name(&self) -> &'static str {
        self.rule.name()
    }

    pub fn v_i(&self) -> &[DiscreteVariable] {
        &self.v_i
    }

    pub fn episodes_max(&self) -> usize {
        self.episodes_max
    }

    pub fn steps_max(&self) -> usize {
        self.steps_max
    }

    pub fn params(&self) -> &EngineParams {
        &self.params
    }

    pub fn alfa(&self) -> f64 {
        self.params.alfa
    }

    pub fn gamma(&self) -> f64 {
        self.params.gamma
    }

    pub fn epsilon(&self) -> f64 {
        self.params.epsilon
    }

    pub fn seed(&self) -> Option<u64> {
        self.params.seed
    }

    pub fn objective(&self) -> Objective {
        self.params.objective
    }

    /// Per-variable feasible values filled by [`arrays`](Self::arrays).
    pub fn s(&self) -> &[Vec<i64>] {
        &self.s
    }

    /// Per-variable step actions filled by [`arrays`](Self::arrays).
    pub fn a(&self) -> &[[i64; 3]] {
        &self.a
    }

    /// State table `S`, one row per combination of variable values.
    pub fn states(&self) -> &Array2<i64> {
        &self.states
    }

    /// Action table `A`, one row per combination of step actions.
    pub fn actions(&self) -> &Array2<i64> {
        &self.actions
    }

    /// Value table `Q`, shape `(|S|, |A|)`.
    pub fn q(&self) -> &Array2<f64> {
        &self.q
    }

    /// Total reward per episode of the last run.
    pub fn r_episode(&self) -> &Array1<f64> {
        &self.r_episode
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn set_alfa(&mut self, alfa: f64) -> Result<()> {
        check_unit_interval("alfa", alfa)?;
        self.params.alfa = alfa;
        Ok(())
    }

    pub fn set_gamma(&mut self, gamma: f64) -> Result<()> {
        check_unit_interval("gamma", gamma)?;
        self.params.gamma = gamma;
        Ok(())
    }

    pub fn set_epsilon(&mut self, epsilon: f64) -> Result<()> {
        check_unit_interval("epsilon", epsilon)?;
        self.params.epsilon = epsilon;
        Ok(())
    }

    pub fn set_objective(&mut self, objective: Objective) {
        self.params.objective = objective;
    }

    /// Fill the per-variable helper slots: feasible values into `s` and step
    /// actions into `a`, one entry per controllable variable. Fails like
    /// [`ini_saq`](Self::ini_saq) when the space is too large to build.
    pub fn arrays(&mut self) -> Result<()> {
        space::check_dimensions(&self.v_i)?;
        self.s = self.v_i.iter().map(|v| v.values().collect()).collect();
        self.a = self.v_i.iter().map(DiscreteVariable::deltas).collect();
        Ok(())
    }

    /// Build `S`, `A` and a zeroed `Q`, discarding any previous run.
    pub fn ini_saq(&mut self) -> Result<()> {
        self.arrays()?;

        self.states = space::enumerate_states(&self.v_i)?;
        self.actions = space::enumerate_actions(&self.v_i)?;
        self.q = Array2::zeros((self.states.nrows(), self.actions.nrows()));
        self.r_episode = Array1::zeros(0);
        self.evaluations = 0;
        self.best = None;
        self.phase = Phase::SpaceBuilt;

        info!(
            "Space built for {}: {} states x {} actions over {} variables",
            self.rule.name(),
            self.states.nrows(),
            self.actions.nrows(),
            self.v_i.len()
        );
        Ok(())
    }

    fn check_row(&self, state: usize) -> Result<()> {
        if self.phase == Phase::NotInitialized {
            return Err(SimError::Phase(
                "state and action spaces have not been built; call ini_saq first".into(),
            ));
        }
        if state >= self.q.nrows() {
            return Err(SimError::Value(format!(
                "state index {state} out of range (0..{})",
                self.q.nrows()
            )));
        }
        Ok(())
    }

    /// Epsilon-greedy action for row `state` of `Q`.
    ///
    /// With probability `1 - epsilon` the highest-valued action (lowest index
    /// on ties); otherwise a uniformly random action. Both draws come from the
    /// engine's seeded random source.
    pub fn choose_action(&mut self, state: usize) -> Result<usize> {
        self.check_row(state)?;
        let p: f64 = self.rng.gen();
        if p < 1.0 - self.params.epsilon {
            Ok(argmax(self.q.row(state)))
        } else {
            Ok(self.rng.gen_range(0..self.q.ncols()))
        }
    }

    /// Highest-valued action for row `state`, without exploration.
    pub fn greedy_action(&self, state: usize) -> Result<usize> {
        self.check_row(state)?;
        Ok(argmax(self.q.row(state)))
    }

    /// Setting whose best action value is highest under the current `Q`.
    pub fn best_setting(&self) -> Result<Vec<i64>> {
        self.check_row(0)?;
        let best_row = argmax(
            self.q
                .rows()
                .into_iter()
                .map(max_value)
                .collect::<Array1<f64>>()
                .view(),
        );
        Ok(self.states.row(best_row).to_vec())
    }

    fn evaluate<P: Plant + ?Sized>(&mut self, plant: &mut P, setting: &[i64]) -> Result<f64> {
        let outcome = plant.update(setting)?;
        self.evaluations += 1;

        let improved = match &self.best {
            Some((_, incumbent)) => self.params.objective.is_better(outcome, *incumbent),
            None => true,
        };
        if improved {
            self.best = Some((setting.to_vec(), outcome));
        }
        Ok(outcome)
    }

    /// Run `episodes_max` episodes of `steps_max` steps against `plant`.
    ///
    /// Each episode starts at state row 0. A move that would take a variable
    /// outside its limits leaves that variable unchanged. Requires the
    /// [`Phase::SpaceBuilt`] phase; a failed plant call aborts the run and
    /// a new run needs [`ini_saq`](Self::ini_saq) again.
    pub fn process<P: Plant + ?Sized>(&mut self, plant: &mut P) -> Result<RunReport> {
        if self.phase != Phase::SpaceBuilt {
            return Err(SimError::Phase(format!(
                "process requires a freshly built space, engine is {:?}",
                self.phase
            )));
        }

        let run_id = Uuid::new_v4();
        let started_at = Utc::now();
        let on_policy = self.rule.is_on_policy();
        self.r_episode = Array1::zeros(self.episodes_max);

        info!(
            "Run {} started: {} with {} episodes x {} steps",
            run_id,
            self.rule.name(),
            self.episodes_max,
            self.steps_max
        );

        for episode in 0..self.episodes_max {
            self.phase = Phase::Running { episode, step: 0 };

            let mut state = 0;
            let mut setting = self.states.row(state).to_vec();
            let mut previous = self.evaluate(plant, &setting)?;
            let mut pending = if on_policy {
                Some(self.choose_action(state)?)
            } else {
                None
            };

            for step in 0..self.steps_max {
                self.phase = Phase::Running { episode, step };

                let action = match pending.take() {
                    Some(action) => action,
                    None => self.choose_action(state)?,
                };
                let deltas = self.actions.row(action).to_vec();
                let (next_setting, rejected) = space::apply_action(&self.v_i, &setting, &deltas);
                if rejected > 0 {
                    debug!(
                        "Rejected {} out-of-range move(s) from {:?} with {:?}",
                        rejected, setting, deltas
                    );
                }
                let next_state = space::state_index(&self.v_i, &next_setting).ok_or_else(|| {
                    SimError::Value(format!("setting {next_setting:?} is not in the state space"))
                })?;

                let outcome = self.evaluate(plant, &next_setting)?;
                let reward = self.params.objective.reward(previous, outcome);

                let next_action = if on_policy {
                    Some(self.choose_action(next_state)?)
                } else {
                    None
                };
                let target = self.rule.target(
                    reward,
                    self.params.gamma,
                    self.q.row(next_state),
                    next_action,
                );
                let current = self.q[[state, action]];
                self.q[[state, action]] = current + self.params.alfa * (target - current);

                trace!(
                    "episode={} step={} state={} action={} setting={:?} outcome={} reward={}",
                    episode, step, state, action, next_setting, outcome, reward
                );

                self.r_episode[episode] += reward;
                state = next_state;
                setting = next_setting;
                previous = outcome;
                pending = next_action;
            }

            debug!(
                "Episode {} complete, reward: {:.1}",
                episode, self.r_episode[episode]
            );
        }

        self.phase = Phase::Done;
        let finished_at = Utc::now();
        let (best_setting, best_outcome) = match &self.best {
            Some((setting, outcome)) => (setting.clone(), Some(*outcome)),
            None => (Vec::new(), None),
        };

        info!(
            "Run {} finished after {} plant evaluations, best outcome: {:?}",
            run_id, self.evaluations, best_outcome
        );

        Ok(RunReport {
            run_id,
            algorithm: self.rule.name().to_string(),
            started_at,
            finished_at,
            episodes: self.episodes_max,
            steps_per_episode: self.steps_max,
            evaluations: self.evaluations,
            r_episode: self.r_episode.to_vec(),
            best_setting,
            best_outcome,
        })
    }

    /// Get statistics
    pub fn stats(&self) -> EngineStats {
        EngineStats {
            algorithm: self.rule.name().to_string(),
            phase: self.phase,
            variables: self.v_i.len(),
            state_count: space::state_count(&self.v_i),
            action_count: space::action_count(&self.v_i),
            evaluations: self.evaluations,
            total_reward: self.r_episode.sum(),
        }
    }
}

/// Summary of one call to [`LearningEngine::process`]
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub run_id: Uuid,
    pub algorithm: String,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub episodes: usize,
    pub steps_per_episode: usize,
    pub evaluations: u64,
    pub r_episode: Vec<f64>,
    /// Best setting observed at the plant during the run
    pub best_setting: Vec<i64>,
    pub best_outcome: Option<f64>,
}

/// Engine statistics
#[derive(Debug, Clone, Serialize)]
pub struct EngineStats {
    pub algorithm: String,
    pub phase: Phase,
    pub variables: usize,
    /// `None` when the space is too large to count
    pub state_count: Option<usize>,
    pub action_count: Option<usize>,
    pub evaluations: u64,
    pub total_reward: f64,
}
