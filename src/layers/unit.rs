use rand::Rng;
use serde::{Serialize, Deserialize, Deserializer};
use std::fmt;

use crate::activation::{ActivationFunction, DerivativeMode};
use crate::error::{check_len, NetError, Result};
use crate::math::WeightInit;

/// A single perceptron: a weighted sum over `bias_count` constant inputs of 1
/// followed by `input_count` real inputs, passed through an activation.
///
/// `weights` and `weight_deltas` are laid out bias positions first, then one
/// position per input. Forward and backward state is transient and is not
/// persisted. Deserialization checks the weight layout.
#[derive(Debug, Clone, Serialize)]
pub struct Unit {
    name: String,
    activation: ActivationFunction,
    derivative_mode: DerivativeMode,
    input_count: usize,
    bias_count: usize,
    weights: Vec<f64>,
    weight_deltas: Vec<f64>,
    #[serde(skip)]
    last_inputs: Vec<f64>,
    #[serde(skip)]
    last_output: f64,
    #[serde(skip)]
    last_error: f64,
}

/// Persisted form of a `Unit`, unchecked.
#[derive(Deserialize)]
pub(crate) struct RawUnit {
    name: String,
    activation: ActivationFunction,
    #[serde(default)]
    derivative_mode: DerivativeMode,
    input_count: usize,
    bias_count: usize,
    weights: Vec<f64>,
    weight_deltas: Vec<f64>,
}

impl<'de> Deserialize<'de> for Unit {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Unit, D::Error> {
        let raw = RawUnit::deserialize(deserializer)?;
        Unit::from_raw(raw).map_err(serde::de::Error::custom)
    }
}

impl Unit {
    pub fn new<R: Rng + ?Sized>(
        name: impl Into<String>,
        activation: ActivationFunction,
        input_count: usize,
        bias_count: usize,
        init: WeightInit,
        rng: &mut R,
    ) -> Unit {
        let len = input_count + bias_count;
        Unit {
            name: name.into(),
            activation,
            derivative_mode: DerivativeMode::default(),
            input_count,
            bias_count,
            weights: init.weights(len, len, rng),
            weight_deltas: vec![0.0; len],
            last_inputs: Vec::new(),
            last_output: 0.0,
            last_error: 0.0,
        }
    }

    /// Builds a unit with explicit weights (bias weights first).
    pub fn from_weights(
        name: impl Into<String>,
        activation: ActivationFunction,
        input_count: usize,
        bias_count: usize,
        weights: Vec<f64>,
    ) -> Result<Unit> {
        check_len(input_count + bias_count, weights.len())?;
        let weight_deltas = vec![0.0; weights.len()];
        Ok(Unit {
            name: name.into(),
            activation,
            derivative_mode: DerivativeMode::default(),
            input_count,
            bias_count,
            weights,
            weight_deltas,
            last_inputs: Vec::new(),
            last_output: 0.0,
            last_error: 0.0,
        })
    }

    /// Stores `inputs`, then sets and returns `last_output`.
    pub fn compute_output(&mut self, inputs: &[f64]) -> Result<f64> {
        check_len(self.input_count, inputs.len())?;
        self.last_inputs.clear();
        self.last_inputs.extend_from_slice(inputs);
        Ok(self.update_output())
    }

    /// Re-evaluates `last_output` from the stored inputs and current weights.
    pub fn recompute_output(&mut self) -> Result<f64> {
        check_len(self.input_count, self.last_inputs.len())?;
        Ok(self.update_output())
    }

    /// One gradient-descent-with-momentum step driven by `error_signal`, the
    /// error at this unit's output. Sets `last_error` to the local delta.
    ///
    /// `delta_j = (1 - momentum) * lr * last_error * x_j + momentum * delta_j`,
    /// where `x_j` is 1 for bias positions.
    pub fn update_weights(&mut self, error_signal: f64, learning_rate: f64, momentum: f64) -> Result<()> {
        check_len(self.input_count, self.last_inputs.len())?;

        let net = self.weighted_sum();
        self.last_error = error_signal * self.activation.derivative(net, self.derivative_mode);

        let step = (1.0 - momentum) * learning_rate * self.last_error;
        let bias_inputs = std::iter::repeat(1.0).take(self.bias_count);
        let inputs = bias_inputs.chain(self.last_inputs.iter().copied());

        for ((weight, delta), x) in self.weights.iter_mut().zip(self.weight_deltas.iter_mut()).zip(inputs) {
            let new_delta = step * x + momentum * *delta;
            *weight += new_delta;
            *delta = new_delta;
        }
        Ok(())
    }

    /// Weight at `index` in the bias-first layout.
    pub fn weight_of_input(&self, index: usize) -> Result<f64> {
        self.weights
            .get(index)
            .copied()
            .ok_or(NetError::IndexOutOfRange { index, len: self.weights.len() })
    }

    pub fn activation_derivative(&self, x: f64) -> f64 {
        self.activation.derivative(x, self.derivative_mode)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn activation(&self) -> &ActivationFunction {
        &self.activation
    }

    pub fn derivative_mode(&self) -> DerivativeMode {
        self.derivative_mode
    }

    pub fn set_derivative_mode(&mut self, mode: DerivativeMode) {
        self.derivative_mode = mode;
    }

    pub fn input_count(&self) -> usize {
        self.input_count
    }

    pub fn bias_count(&self) -> usize {
        self.bias_count
    }

    pub fn weights(&self) -> &[f64] {
        &self.weights
    }

    pub fn weight_deltas(&self) -> &[f64] {
        &self.weight_deltas
    }

    pub fn last_inputs(&self) -> &[f64] {
        &self.last_inputs
    }

    pub fn last_output(&self) -> f64 {
        self.last_output
    }

    /// Local error signal ("small delta") from the latest backward pass.
    pub fn last_error(&self) -> f64 {
        self.last_error
    }

    /// Rebuilds a unit from its persisted form; transient state starts empty.
    pub(crate) fn from_raw(raw: RawUnit) -> Result<Unit> {
        let len = raw.input_count + raw.bias_count;
        check_len(len, raw.weights.len())?;
        check_len(len, raw.weight_deltas.len())?;
        Ok(Unit {
            name: raw.name,
            activation: raw.activation,
            derivative_mode: raw.derivative_mode,
            input_count: raw.input_count,
            bias_count: raw.bias_count,
            weights: raw.weights,
            weight_deltas: raw.weight_deltas,
            last_inputs: Vec::new(),
            last_output: 0.0,
            last_error: 0.0,
        })
    }

    fn weighted_sum(&self) -> f64 {
        let (bias, input_weights) = self.weights.split_at(self.bias_count);
        let bias_sum: f64 = bias.iter().sum();
        let input_sum: f64 = input_weights
            .iter()
            .zip(self.last_inputs.iter())
            .map(|(w, x)| w * x)
            .sum();
        bias_sum + input_sum
    }

    fn update_output(&mut self) -> f64 {
        self.last_output = self.activation.function(self.weighted_sum());
        self.last_output
    }
}

impl fmt::Display for Unit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} with {} input nodes and {} bias node(s)",
            self.name, self.input_count, self.bias_count
        )
    }
}
