//! Controllable and observable variable descriptors

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{Result, SimError};
use crate::util::{as_object, int_field, opt_float_field, str_field};

/// A discrete, bounded, stepped parameter the engine may set on the plant.
///
/// Feasible values run from `lower_limit` upwards in increments of `step`,
/// stopping at or before `upper_limit`. Fields are fixed at construction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Value")]
pub struct DiscreteVariable {
    name: String,
    lower_limit: i64,
    upper_limit: i64,
    step: i64,
    path: String,
}

impl DiscreteVariable {
    /// Create a new controllable variable.
    ///
    /// Fails with a value error when a limit or the step is negative, the
    /// step is zero, the lower limit exceeds the upper limit, or the name is
    /// empty.
    pub fn new(
        name: impl Into<String>,
        lower_limit: i64,
        upper_limit: i64,
        step: i64,
        path: impl Into<String>,
    ) -> Result<Self> {
        let name = name.into();
        if name.is_empty() {
            return Err(SimError::Value("variable name must not be empty".into()));
        }
        for (field, value) in [
            ("lower_limit", lower_limit),
            ("upper_limit", upper_limit),
            ("step", step),
        ] {
            if value < 0 {
                return Err(SimError::Value(format!(
                    "`{field}` of `{name}` must be non-negative, got {value}"
                )));
            }
        }
        if step == 0 {
            return Err(SimError::Value(format!("`step` of `{name}` must be positive")));
        }
        if lower_limit > upper_limit {
            return Err(SimError::Value(format!(
                "`lower_limit` of `{name}` ({lower_limit}) exceeds `upper_limit` ({upper_limit})"
            )));
        }

        Ok(Self {
            name,
            lower_limit,
            upper_limit,
            step,
            path: path.into(),
        })
    }

    /// Build from an untyped object with the fields
    /// `name`, `lower_limit`, `upper_limit`, `step`, `path`.
    pub fn from_value(value: &Value) -> Result<Self> {
        let map = as_object(value, "controllable variable")?;
        let name = str_field(map, "name")?;
        let lower_limit = int_field(map, "lower_limit")?;
        let upper_limit = int_field(map, "upper_limit")?;
        let step = int_field(map, "step")?;
        let path = str_field(map, "path")?;
        Self::new(name, lower_limit, upper_limit, step, path)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn lower_limit(&self) -> i64 {
        self.lower_limit
    }

    pub fn upper_limit(&self) -> i64 {
        self.upper_limit
    }

    pub fn step(&self) -> i64 {
        self.step
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    /// Number of feasible values: `floor((upper - lower) / step) + 1`.
    pub fn value_count(&self) -> usize {
        ((self.upper_limit - self.lower_limit) / self.step) as usize + 1
    }

    /// Feasible values in ascending order.
    pub fn values(&self) -> impl Iterator<Item = i64> + '_ {
        (0..self.value_count()).map(move |k| self.lower_limit + k as i64 * self.step)
    }

    /// Per-variable action set, in the order used by the action space.
    pub fn deltas(&self) -> [i64; 3] {
        [-self.step, 0, self.step]
    }

    /// Whether `value` lies within `[lower_limit, upper_limit]`.
    pub fn contains(&self, value: i64) -> bool {
        (self.lower_limit..=self.upper_limit).contains(&value)
    }

    /// Position of `value` among the feasible values, if it is one of them.
    pub fn position(&self, value: i64) -> Option<usize> {
        if !self.contains(value) || (value - self.lower_limit) % self.step != 0 {
            return None;
        }
        let k = ((value - self.lower_limit) / self.step) as usize;
        (k < self.value_count()).then_some(k)
    }
}

impl TryFrom<Value> for DiscreteVariable {
    type Error = SimError;

    fn try_from(value: Value) -> Result<Self> {
        Self::from_value(&value)
    }
}

/// A quantity read back from the plant after a trial.
///
/// Readings live in `column` of the table at `path`, rows `1..=num_rows`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Value")]
pub struct OutcomeVariable {
    name: String,
    path: String,
    column: usize,
    num_rows: usize,
    weight: f64,
}

impl OutcomeVariable {
    /// Create a new observable variable with weight `1.0`.
    ///
    /// Fails with a value error when `column` or `num_rows` is not positive.
    pub fn new(
        name: impl Into<String>,
        path: impl Into<String>,
        column: i64,
        num_rows: i64,
    ) -> Result<Self> {
        let name = name.into();
        for (field, value) in [("column", column), ("num_rows", num_rows)] {
            if value <= 0 {
                return Err(SimError::Value(format!(
                    "`{field}` of `{name}` must be positive, got {value}"
                )));
            }
        }

        Ok(Self {
            name,
            path: path.into(),
            column: column as usize,
            num_rows: num_rows as usize,
            weight: 1.0,
        })
    }

    /// Scale this observable's contribution to the combined outcome.
    pub fn with_weight(mut self, weight: f64) -> Result<Self> {
        if !weight.is_finite() {
            return Err(SimError::Value(format!(
                "`weight` of `{}` must be finite, got {weight}",
                self.name
            )));
        }
        self.weight = weight;
        Ok(self)
    }

    /// Build from an untyped object with the fields
    /// `name`, `path`, `column`, `num_rows` and optional `weight`.
    pub fn from_value(value: &Value) -> Result<Self> {
        let map = as_object(value, "observable variable")?;
        let name = str_field(map, "name")?;
        let path = str_field(map, "path")?;
        let column = int_field(map, "column")?;
        let num_rows = int_field(map, "num_rows")?;
        let variable = Self::new(name, path, column, num_rows)?;
        match opt_float_field(map, "weight")? {
            Some(weight) => variable.with_weight(weight),
            None => Ok(variable),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn column(&self) -> usize {
        self.column
    }

    pub fn num_rows(&self) -> usize {
        self.num_rows
    }

    pub fn weight(&self) -> f64 {
        self.weight
    }
}

impl TryFrom<Value> for OutcomeVariable {
    type Error = SimError;

    fn try_from(value: Value) -> Result<Self> {
        Self::from_value(&value)
    }
}
