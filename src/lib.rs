//! A small multilayer perceptron trained online by backpropagation with
//! gradient descent and momentum.
//!
//! ```
//! use backprop_nn::Network;
//!
//! let mut network = Network::seeded(&[2, 2, 1], 7).unwrap();
//! let inputs = vec![vec![0.0, 0.0], vec![0.0, 1.0], vec![1.0, 0.0], vec![1.0, 1.0]];
//! let targets = vec![vec![0.0], vec![1.0], vec![1.0], vec![0.0]];
//! network.train(&inputs, &targets, 100, 0.5, 0.9).unwrap();
//! assert_eq!(network.classify(&[1.0, 0.0]).unwrap().len(), 1);
//! ```

pub mod error;
pub mod math;
pub mod activation;
pub mod layers;
pub mod network;
pub mod loss;
pub mod train;

// Convenience re-exports
pub use error::{NetError, Result};
pub use math::init::WeightInit;
pub use activation::activation::{ActivationFunction, CustomActivation, DerivativeMode};
pub use layers::{layer::Layer, unit::Unit};
pub use network::{network::Network, spec::NetworkSpec};
pub use loss::mse::MseLoss;
pub use train::{train_loop, EpochStats, TrainConfig};
