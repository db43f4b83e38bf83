pub mod activation;

pub use activation::{ActivationFunction, CustomActivation, DerivativeMode, DERIVATIVE_STEP};
