//! Base plant binding - connects a learning engine to a simulator

use serde_json::Value;
use tracing::{debug, info};

use simrl_core::util::{as_array, as_object, str_field};
use simrl_core::{DiscreteVariable, OutcomeVariable, Plant, Result, SimError, Simulator};

use crate::engine::{LearningEngine, RunReport};

/// Plant bound to a concrete [`Simulator`].
///
/// `update` writes one value per controllable variable to its path, runs the
/// model, and combines the observable readings into a single outcome.
pub struct BasePlant<S: Simulator> {
    method: LearningEngine,
    v_i: Vec<DiscreteVariable>,
    v_o: Vec<OutcomeVariable>,
    filename: String,
    modelname: String,
    simulator: S,
}

/// Borrowed view used while the engine runs against the plant.
struct Channel<'a, S: Simulator> {
    v_i: &'a [DiscreteVariable],
    v_o: &'a [OutcomeVariable],
    modelname: &'a str,
    simulator: &'a mut S,
}

impl<S: Simulator> Plant for Channel<'_, S> {
    fn update(&mut self, values: &[i64]) -> Result<f64> {
        if values.len() != self.v_i.len() {
            return Err(SimError::Value(format!(
                "expected {} values, one per controllable variable, got {}",
                self.v_i.len(),
                values.len()
            )));
        }

        for (var, &value) in self.v_i.iter().zip(values) {
            self.simulator.set_value(var.path(), value)?;
        }
        self.simulator.start_simulation(self.modelname)?;

        let mut outcome = 0.0;
        for var in self.v_o {
            let mut total = 0.0;
            for row in 1..=var.num_rows() {
                total += self.simulator.get_value(var.path(), var.column(), row)?;
            }
            outcome += var.weight() * total;
        }

        debug!("Plant update {:?} -> {}", values, outcome);
        Ok(outcome)
    }
}

impl<S: Simulator> BasePlant<S> {
    pub fn new(
        method: LearningEngine,
        v_i: Vec<DiscreteVariable>,
        v_o: Vec<OutcomeVariable>,
        filename: impl Into<String>,
        modelname: impl Into<String>,
        simulator: S,
    ) -> Result<Self> {
        if v_i.as_slice() != method.v_i() {
            return Err(SimError::Value(
                "controllable variables differ from the ones the method was built with".into(),
            ));
        }

        Ok(Self {
            method,
            v_i,
            v_o,
            filename: filename.into(),
            modelname: modelname.into(),
            simulator,
        })
    }

    /// Build from an untyped object with `v_o` (array of observable-variable
    /// objects), `filename` and `modelname`. An optional `v_i` array of
    /// controllable-variable objects must match the method's; when absent the
    /// method's variables are used.
    pub fn from_value(method: LearningEngine, value: &Value, simulator: S) -> Result<Self> {
        let map = as_object(value, "plant")?;
        let v_i = match map.get("v_i") {
            None | Some(Value::Null) => method.v_i().to_vec(),
            Some(v_i) => as_array(v_i, "`v_i`")?
                .iter()
                .map(DiscreteVariable::from_value)
                .collect::<Result<Vec<_>>>()?,
        };
        let v_o = map
            .get("v_o")
            .ok_or_else(|| SimError::Type("missing field `v_o`".into()))?;
        let v_o = as_array(v_o, "`v_o`")?
            .iter()
            .map(OutcomeVariable::from_value)
            .collect::<Result<Vec<_>>>()?;
        let filename = str_field(map, "filename")?;
        let modelname = str_field(map, "modelname")?;
        Self::new(method, v_i, v_o, filename, modelname, simulator)
    }

    /// Model file name, verbatim.
    pub fn get_file_name_plant(&self) -> &str {
        &self.filename
    }

    pub fn modelname(&self) -> &str {
        &self.modelname
    }

    pub fn v_i(&self) -> &[DiscreteVariable] {
        &self.v_i
    }

    pub fn v_o(&self) -> &[OutcomeVariable] {
        &self.v_o
    }

    pub fn method(&self) -> &LearningEngine {
        &self.method
    }

    pub fn method_mut(&mut self) -> &mut LearningEngine {
        &mut self.method
    }

    pub fn simulator(&self) -> &S {
        &self.simulator
    }

    /// Load the model into the simulator.
    pub fn connect(&mut self) -> Result<()> {
        info!("Loading model {} from {}", self.modelname, self.filename);
        self.simulator.load_model(&self.filename, &self.modelname)
    }

    /// Build the method's spaces and run it against this plant.
    pub fn process_simulation(&mut self) -> Result<RunReport> {
        self.method.ini_saq()?;
        let mut channel = Channel {
            v_i: &self.v_i,
            v_o: &self.v_o,
            modelname: &self.modelname,
            simulator: &mut self.simulator,
        };
        self.method.process(&mut channel)
    }

    /// Consume the binding, returning the method and the simulator.
    pub fn into_parts(self) -> (LearningEngine, S) {
        (self.method, self.simulator)
    }
}

impl<S: Simulator> Plant for BasePlant<S> {
    fn update(&mut self, values: &[i64]) -> Result<f64> {
        Channel {
            v_i: &self.v_i,
            v_o: &self.v_o,
            modelname: &self.modelname,
            simulator: &mut self.simulator,
        }
        .update(values)
    }
}
