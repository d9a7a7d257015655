//! Plant capability and simulator collaborator traits
//!
//! A [`Plant`] is anything that can be driven with one concrete setting per
//! controllable variable and observed as a single scalar outcome. A
//! [`Simulator`] is the lower-level collaborator a plant binding talks to:
//! it addresses parameters and readings by opaque path strings.

use crate::error::Result;

/// A system that can be driven and observed.
///
/// `values` holds one setting per controllable variable, in declared order.
/// The returned scalar is the outcome the reward is derived from.
pub trait Plant {
    fn update(&mut self, values: &[i64]) -> Result<f64>;
}

impl<F> Plant for F
where
    F: FnMut(&[i64]) -> Result<f64>,
{
    fn update(&mut self, values: &[i64]) -> Result<f64> {
        self(values)
    }
}

/// External simulator reached through path identifiers.
///
/// Paths are passed through verbatim; implementations decide what they mean.
pub trait Simulator {
    /// Open the model file and select the model to run.
    fn load_model(&mut self, filename: &str, modelname: &str) -> Result<()>;

    /// Write a parameter value.
    fn set_value(&mut self, path: &str, value: i64) -> Result<()>;

    /// Run one trial of the model to completion.
    fn start_simulation(&mut self, modelname: &str) -> Result<()>;

    /// Read one cell of a result table (1-based column and row).
    fn get_value(&mut self, path: &str, column: usize, row: usize) -> Result<f64>;
}

impl<S: Simulator + ?Sized> Simulator for &mut S {
    fn load_model(&mut self, filename: &str, modelname: &str) -> Result<()> {
        (**self).load_model(filename, modelname)
    }

    fn set_value(&mut self, path: &str, value: i64) -> Result<()> {
        (**self).set_value(path, value)
    }

    fn start_simulation(&mut self, modelname: &str) -> Result<()> {
        (**self).start_simulation(modelname)
    }

    fn get_value(&mut self, path: &str, column: usize, row: usize) -> Result<f64> {
        (**self).get_value(path, column, row)
    }
}

impl<S: Simulator + ?Sized> Simulator for Box<S> {
    fn load_model(&mut self, filename: &str, modelname: &str) -> Result<()> {
        (**self).load_model(filename, modelname)
    }

    fn set_value(&mut self, path: &str, value: i64) -> Result<()> {
        (**self).set_value(path, value)
    }

    fn start_simulation(&mut self, modelname: &str) -> Result<()> {
        (**self).start_simulation(modelname)
    }

    fn get_value(&mut self, path: &str, column: usize, row: usize) -> Result<f64> {
        (**self).get_value(path, column, row)
    }
}
