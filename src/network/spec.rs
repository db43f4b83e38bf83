use serde::{Serialize, Deserialize};
use std::path::Path;

use crate::activation::{ActivationFunction, DerivativeMode};
use crate::error::Result;
use crate::math::WeightInit;
use crate::network::network::Network;

fn default_bias_count() -> usize {
    1
}

/// A serializable description of a network to build, kept apart from trained
/// weights so architectures can be stored before training starts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NetworkSpec {
    /// Human-readable name.
    pub name: String,
    /// Layer widths, input first and output last.
    pub architecture: Vec<usize>,
    #[serde(default = "default_bias_count")]
    pub bias_count: usize,
    #[serde(default)]
    pub activation: ActivationFunction,
    #[serde(default)]
    pub derivative: DerivativeMode,
    #[serde(default)]
    pub init: WeightInit,
    /// Seed for weight initialisation; fresh entropy when absent.
    #[serde(default)]
    pub seed: Option<u64>,
}

impl NetworkSpec {
    /// Defaults: one bias, sigmoid, numeric derivative, uniform weights, unseeded.
    pub fn new(name: impl Into<String>, architecture: Vec<usize>) -> NetworkSpec {
        NetworkSpec {
            name: name.into(),
            architecture,
            bias_count: default_bias_count(),
            activation: ActivationFunction::default(),
            derivative: DerivativeMode::default(),
            init: WeightInit::default(),
            seed: None,
        }
    }

    pub fn with_seed(mut self, seed: u64) -> NetworkSpec {
        self.seed = Some(seed);
        self
    }

    pub fn build(&self) -> Result<Network> {
        Network::from_spec(self)
    }

    /// Serializes the spec to a pretty-printed JSON file.
    pub fn save_json<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let file = std::fs::File::create(path)?;
        let writer = std::io::BufWriter::new(file);
        serde_json::to_writer_pretty(writer, self)?;
        Ok(())
    }

    /// Deserializes a `NetworkSpec` from a JSON file.
    pub fn load_json<P: AsRef<Path>>(path: P) -> Result<NetworkSpec> {
        let file = std::fs::File::open(path)?;
        let reader = std::io::BufReader::new(file);
        Ok(serde_json::from_reader(reader)?)
    }
}
