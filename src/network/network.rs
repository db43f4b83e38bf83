use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Serialize, Deserialize, Deserializer};
use std::fmt;
use std::path::Path;
use tracing::trace;

use crate::activation::{ActivationFunction, DerivativeMode};
use crate::error::{check_len, NetError, Result};
use crate::layers::layer::{Layer, RawLayer};
use crate::math::WeightInit;
use crate::network::spec::NetworkSpec;
use crate::train::{train_loop, TrainConfig};

/// A layered feedforward network trained online by backpropagation with
/// momentum. Owns its layers, which own their units.
///
/// Deserialization re-checks the same shape rules as construction.
#[derive(Debug, Clone, Serialize)]
pub struct Network {
    layers: Vec<Layer>,
    bias_count: usize,
    activation: ActivationFunction,
}

/// Persisted form of a `Network`, unchecked.
#[derive(Deserialize)]
struct RawNetwork {
    layers: Vec<RawLayer>,
    bias_count: usize,
    activation: ActivationFunction,
}

impl<'de> Deserialize<'de> for Network {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Network, D::Error> {
        let raw = RawNetwork::deserialize(deserializer)?;
        Network::from_raw(raw).map_err(serde::de::Error::custom)
    }
}

impl Network {
    /// One bias per unit, sigmoid units, uniform weights from an
    /// entropy-seeded generator owned by this call.
    pub fn new(architecture: &[usize]) -> Result<Network> {
        let mut rng = StdRng::from_entropy();
        Network::with_options(architecture, 1, ActivationFunction::Sigmoid, WeightInit::Uniform, &mut rng)
    }

    /// Like `new`, but reproducible.
    pub fn seeded(architecture: &[usize], seed: u64) -> Result<Network> {
        let mut rng = StdRng::seed_from_u64(seed);
        Network::with_options(architecture, 1, ActivationFunction::Sigmoid, WeightInit::Uniform, &mut rng)
    }

    /// `architecture` lists layer widths, input first and output last.
    /// Hidden layers are named `h1`, `h2`, ...; the output layer is `o`.
    pub fn with_options<R: Rng + ?Sized>(
        architecture: &[usize],
        bias_count: usize,
        activation: ActivationFunction,
        init: WeightInit,
        rng: &mut R,
    ) -> Result<Network> {
        validate_architecture(architecture)?;

        let last = architecture.len() - 1;
        let layers = architecture
            .windows(2)
            .enumerate()
            .map(|(k, pair)| {
                let name = if k + 1 < last { format!("h{}", k + 1) } else { "o".to_string() };
                Layer::new(name, pair[1], pair[0], bias_count, activation.clone(), init, &mut *rng)
            })
            .collect();

        Ok(Network { layers, bias_count, activation })
    }

    pub fn from_spec(spec: &NetworkSpec) -> Result<Network> {
        let mut network = match spec.seed {
            Some(seed) => {
                let mut rng = StdRng::seed_from_u64(seed);
                Network::with_options(&spec.architecture, spec.bias_count, spec.activation.clone(), spec.init, &mut rng)?
            }
            None => {
                let mut rng = StdRng::from_entropy();
                Network::with_options(&spec.architecture, spec.bias_count, spec.activation.clone(), spec.init, &mut rng)?
            }
        };
        network.set_derivative_mode(spec.derivative);
        Ok(network)
    }

    /// Runs `inputs` through every layer in order and returns the output
    /// layer's outputs.
    pub fn forward(&mut self, inputs: &[f64]) -> Result<Vec<f64>> {
        check_len(self.input_width(), inputs.len())?;
        let mut current = inputs.to_vec();
        for layer in &mut self.layers {
            layer.forward(&current)?;
            current = layer.outputs();
        }
        Ok(current)
    }

    /// Forward pass thresholded at 0.5 per output.
    pub fn classify(&mut self, inputs: &[f64]) -> Result<Vec<u8>> {
        let outputs = self.forward(inputs)?;
        Ok(outputs.iter().map(|&y| if y > 0.5 { 1 } else { 0 }).collect())
    }

    /// Backpropagates `targets` against the latest forward pass and updates
    /// every weight, output layer first.
    ///
    /// Each hidden unit's error is read from the layer after it once that
    /// layer has finished updating: `sum_i w_i[j + bias_count] * delta_i`.
    pub fn backward(&mut self, targets: &[f64], learning_rate: f64, momentum: f64) -> Result<()> {
        check_len(self.output_width(), targets.len())?;

        let output_layer = self.layers.len() - 1;
        let errors: Vec<f64> = self.layers[output_layer]
            .units()
            .iter()
            .zip(targets)
            .map(|(unit, target)| target - unit.last_output())
            .collect();
        trace!(layer = self.layers[output_layer].name(), ?errors, "output error");
        self.layers[output_layer].backward(&errors, learning_rate, momentum)?;

        for k in (0..output_layer).rev() {
            let errors = self.hidden_errors(k)?;
            trace!(layer = self.layers[k].name(), ?errors, "hidden error");
            self.layers[k].backward(&errors, learning_rate, momentum)?;
        }
        Ok(())
    }

    /// Online training: `epochs` passes over the samples in order, one
    /// forward and one backward per sample.
    pub fn train(
        &mut self,
        inputs: &[Vec<f64>],
        targets: &[Vec<f64>],
        epochs: usize,
        learning_rate: f64,
        momentum: f64,
    ) -> Result<&mut Network> {
        let config = TrainConfig::new(epochs, learning_rate, momentum);
        train_loop(self, inputs, targets, &config)?;
        Ok(self)
    }

    pub fn set_derivative_mode(&mut self, mode: DerivativeMode) {
        for layer in &mut self.layers {
            layer.set_derivative_mode(mode);
        }
    }

    pub fn layers(&self) -> &[Layer] {
        &self.layers
    }

    pub fn layer(&self, index: usize) -> Result<&Layer> {
        self.layers
            .get(index)
            .ok_or(NetError::IndexOutOfRange { index, len: self.layers.len() })
    }

    pub fn bias_count(&self) -> usize {
        self.bias_count
    }

    pub fn activation(&self) -> &ActivationFunction {
        &self.activation
    }

    /// Layer widths, input first.
    pub fn architecture(&self) -> Vec<usize> {
        std::iter::once(self.input_width())
            .chain(self.layers.iter().map(Layer::node_count))
            .collect()
    }

    pub fn input_width(&self) -> usize {
        self.layers.first().map_or(0, Layer::input_count)
    }

    pub fn output_width(&self) -> usize {
        self.layers.last().map_or(0, Layer::node_count)
    }

    pub fn parameter_count(&self) -> usize {
        self.layers.iter().map(Layer::parameter_count).sum()
    }

    pub fn to_json_string(&self) -> Result<String> {
        self.ensure_serializable()?;
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Parses a network written by `to_json_string`. Shape violations are
    /// reported as their own `NetError` variants.
    pub fn from_json_str(json: &str) -> Result<Network> {
        let raw: RawNetwork = serde_json::from_str(json)?;
        Network::from_raw(raw)
    }

    /// Writes weights and weight deltas, per layer and per unit, as JSON.
    pub fn save_json<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        self.ensure_serializable()?;
        let file = std::fs::File::create(path)?;
        let writer = std::io::BufWriter::new(file);
        serde_json::to_writer_pretty(writer, self)?;
        Ok(())
    }

    /// Reads a network written by `save_json` and re-checks its shape.
    pub fn load_json<P: AsRef<Path>>(path: P) -> Result<Network> {
        let file = std::fs::File::open(path)?;
        let reader = std::io::BufReader::new(file);
        let raw: RawNetwork = serde_json::from_reader(reader)?;
        Network::from_raw(raw)
    }

    fn hidden_errors(&self, k: usize) -> Result<Vec<f64>> {
        let next = &self.layers[k + 1];
        (0..self.layers[k].node_count())
            .map(|j| {
                next.units().iter().try_fold(0.0, |acc, unit| {
                    Ok::<f64, NetError>(acc + unit.weight_of_input(j + self.bias_count)? * unit.last_error())
                })
            })
            .collect()
    }

    fn ensure_serializable(&self) -> Result<()> {
        let custom = self
            .layers
            .iter()
            .flat_map(Layer::units)
            .map(|unit| unit.activation())
            .chain(std::iter::once(&self.activation))
            .find(|activation| !activation.is_serializable());
        match custom {
            Some(activation) => Err(NetError::Unserializable(format!(
                "custom activation `{activation}` has no persistent form"
            ))),
            None => Ok(()),
        }
    }

    fn from_raw(raw: RawNetwork) -> Result<Network> {
        if raw.layers.is_empty() {
            return Err(NetError::InvalidArchitecture("network has no layers".into()));
        }
        let layers = raw
            .layers
            .into_iter()
            .map(Layer::from_raw)
            .collect::<Result<Vec<Layer>>>()?;
        let network = Network {
            layers,
            bias_count: raw.bias_count,
            activation: raw.activation,
        };

        validate_architecture(&network.architecture())?;
        for layer in &network.layers {
            check_len(network.bias_count, layer.bias_count())?;
        }
        for pair in network.layers.windows(2) {
            check_len(pair[0].node_count(), pair[1].input_count())?;
        }
        Ok(network)
    }
}

fn validate_architecture(architecture: &[usize]) -> Result<()> {
    if architecture.len() < 2 {
        return Err(NetError::InvalidArchitecture(format!(
            "need at least an input and an output width, got {architecture:?}"
        )));
    }
    if let Some(k) = architecture.iter().position(|&width| width == 0) {
        return Err(NetError::InvalidArchitecture(format!("layer {k} has width 0")));
    }
    Ok(())
}

impl fmt::Display for Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Network {:?} ({} activation, {} bias node(s), {} parameters)",
            self.architecture(),
            self.activation,
            self.bias_count,
            self.parameter_count()
        )?;
        for layer in &self.layers {
            write!(f, "{layer}")?;
        }
        Ok(())
    }
}
