use rand::Rng;
use serde::{Serialize, Deserialize, Deserializer};
use std::fmt;

use crate::activation::{ActivationFunction, DerivativeMode};
use crate::error::{check_len, NetError, Result};
use crate::layers::unit::{RawUnit, Unit};
use crate::math::WeightInit;

/// A fully connected layer: every unit sees the same input vector.
#[derive(Debug, Clone, Serialize)]
pub struct Layer {
    name: String,
    input_count: usize,
    bias_count: usize,
    units: Vec<Unit>,
    #[serde(skip)]
    current_inputs: Vec<f64>,
}

/// Persisted form of a `Layer`, unchecked.
#[derive(Deserialize)]
pub(crate) struct RawLayer {
    name: String,
    input_count: usize,
    bias_count: usize,
    units: Vec<RawUnit>,
}

impl<'de> Deserialize<'de> for Layer {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Layer, D::Error> {
        let raw = RawLayer::deserialize(deserializer)?;
        Layer::from_raw(raw).map_err(serde::de::Error::custom)
    }
}

impl Layer {
    /// Units are named `<name>_1 .. <name>_<node_count>`.
    pub fn new<R: Rng + ?Sized>(
        name: impl Into<String>,
        node_count: usize,
        input_count: usize,
        bias_count: usize,
        activation: ActivationFunction,
        init: WeightInit,
        rng: &mut R,
    ) -> Layer {
        let name = name.into();
        let units = (1..=node_count)
            .map(|i| Unit::new(format!("{name}_{i}"), activation.clone(), input_count, bias_count, init, &mut *rng))
            .collect();
        Layer {
            name,
            input_count,
            bias_count,
            units,
            current_inputs: Vec::new(),
        }
    }

    /// Feeds `inputs` to every unit and returns their outputs in unit order.
    pub fn forward(&mut self, inputs: &[f64]) -> Result<Vec<f64>> {
        check_len(self.input_count, inputs.len())?;
        self.current_inputs.clear();
        self.current_inputs.extend_from_slice(inputs);
        self.units
            .iter_mut()
            .map(|unit| unit.compute_output(inputs))
            .collect()
    }

    /// Applies one weight update per unit from its output error, then refreshes
    /// each unit's output against the new weights.
    pub fn backward(&mut self, errors: &[f64], learning_rate: f64, momentum: f64) -> Result<()> {
        check_len(self.units.len(), errors.len())?;
        check_len(self.input_count, self.current_inputs.len())?;
        for (unit, &error) in self.units.iter_mut().zip(errors) {
            unit.update_weights(error, learning_rate, momentum)?;
            unit.recompute_output()?;
        }
        Ok(())
    }

    /// `outputs()[i] == units()[i].last_output()` for every unit.
    pub fn outputs(&self) -> Vec<f64> {
        self.units.iter().map(Unit::last_output).collect()
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn units(&self) -> &[Unit] {
        &self.units
    }

    pub fn unit(&self, index: usize) -> Result<&Unit> {
        self.units
            .get(index)
            .ok_or(NetError::IndexOutOfRange { index, len: self.units.len() })
    }

    pub fn node_count(&self) -> usize {
        self.units.len()
    }

    pub fn input_count(&self) -> usize {
        self.input_count
    }

    pub fn bias_count(&self) -> usize {
        self.bias_count
    }

    pub fn current_inputs(&self) -> &[f64] {
        &self.current_inputs
    }

    pub fn parameter_count(&self) -> usize {
        self.units.len() * (self.input_count + self.bias_count)
    }

    pub(crate) fn set_derivative_mode(&mut self, mode: DerivativeMode) {
        for unit in &mut self.units {
            unit.set_derivative_mode(mode);
        }
    }

    /// Rebuilds a layer from its persisted form. Every unit must share the
    /// layer's shape.
    pub(crate) fn from_raw(raw: RawLayer) -> Result<Layer> {
        let units = raw
            .units
            .into_iter()
            .map(Unit::from_raw)
            .collect::<Result<Vec<Unit>>>()?;
        for unit in &units {
            check_len(raw.input_count, unit.input_count())?;
            check_len(raw.bias_count, unit.bias_count())?;
        }
        Ok(Layer {
            name: raw.name,
            input_count: raw.input_count,
            bias_count: raw.bias_count,
            units,
            current_inputs: Vec::new(),
        })
    }
}

impl fmt::Display for Layer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Layer {} with Perceptrons having:", self.name)?;
        for unit in &self.units {
            writeln!(f, "{unit}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn layer(seed: u64) -> Layer {
        let mut rng = StdRng::seed_from_u64(seed);
        Layer::new("h1", 3, 2, 1, ActivationFunction::Sigmoid, WeightInit::Uniform, &mut rng)
    }

    #[test]
    fn names_units_from_one() {
        let layer = layer(0);
        let names: Vec<&str> = layer.units().iter().map(Unit::name).collect();
        assert_eq!(names, vec!["h1_1", "h1_2", "h1_3"]);
    }

    #[test]
    fn outputs_match_units_position_by_position() {
        let mut layer = layer(1);
        let forward = layer.forward(&[0.3, -0.8]).unwrap();
        let outputs = layer.outputs();
        assert_eq!(forward, outputs);
        assert_eq!(outputs.len(), 3);
        for (i, unit) in layer.units().iter().enumerate() {
            assert_eq!(outputs[i], unit.last_output());
        }
        // Distinct random weights give distinct outputs, so no slot was overwritten.
        assert!(outputs[0] != outputs[1] || outputs[1] != outputs[2]);
    }

    #[test]
    fn every_unit_receives_the_full_input() {
        let mut layer = layer(2);
        layer.forward(&[1.0, 2.0]).unwrap();
        assert_eq!(layer.current_inputs(), &[1.0, 2.0]);
        for unit in layer.units() {
            assert_eq!(unit.last_inputs(), &[1.0, 2.0]);
        }
    }

    #[test]
    fn backward_rejects_wrong_error_count_without_mutation() {
        let mut layer = layer(3);
        layer.forward(&[1.0, 2.0]).unwrap();
        let before: Vec<Vec<f64>> = layer.units().iter().map(|u| u.weights().to_vec()).collect();
        assert!(matches!(
            layer.backward(&[0.1, 0.2], 0.5, 0.9),
            Err(NetError::DimensionMismatch { expected: 3, got: 2 })
        ));
        let after: Vec<Vec<f64>> = layer.units().iter().map(|u| u.weights().to_vec()).collect();
        assert_eq!(before, after);
    }

    #[test]
    fn backward_refreshes_outputs() {
        let mut layer = layer(4);
        layer.forward(&[1.0, 1.0]).unwrap();
        let before = layer.outputs();
        layer.backward(&[1.0, 1.0, 1.0], 0.5, 0.0).unwrap();
        let after = layer.outputs();
        for (b, a) in before.iter().zip(after.iter()) {
            assert!(a > b);
        }
        for unit in layer.units() {
            assert!(unit.last_error() > 0.0);
        }
    }

    #[test]
    fn unit_lookup_is_bounds_checked() {
        let layer = layer(5);
        assert!(layer.unit(2).is_ok());
        assert!(matches!(layer.unit(3), Err(NetError::IndexOutOfRange { index: 3, len: 3 })));
    }

    #[test]
    fn deserializing_rejects_units_of_another_shape() {
        let mut value = serde_json::to_value(layer(7)).unwrap();
        value["input_count"] = serde_json::json!(3);
        let err = serde_json::from_value::<Layer>(value).unwrap_err();
        assert!(err.to_string().contains("dimension mismatch: expected 3, got 2"));
    }

    #[test]
    fn deserialized_layer_runs_forward() {
        let original = layer(8);
        let mut restored: Layer = serde_json::from_str(&serde_json::to_string(&original).unwrap()).unwrap();
        assert!(restored.current_inputs().is_empty());
        assert_eq!(restored.forward(&[0.5, -0.5]).unwrap().len(), 3);
    }

    #[test]
    fn display_lists_every_unit() {
        let text = layer(6).to_string();
        assert!(text.starts_with("Layer h1 with Perceptrons having:"));
        assert_eq!(text.lines().count(), 4);
    }
}
