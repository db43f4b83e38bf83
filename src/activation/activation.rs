use serde::{Serialize, Deserialize};
use std::f64::consts::E;
use std::fmt;

/// Step of the central finite difference used to estimate derivatives.
pub const DERIVATIVE_STEP: f64 = 1e-6;

/// A user-supplied activation. Identified (compared, printed) by its name;
/// the function pointer itself is never persisted.
#[derive(Clone)]
pub struct CustomActivation {
    pub name: String,
    pub function: fn(f64) -> f64,
}

impl CustomActivation {
    pub fn new(name: impl Into<String>, function: fn(f64) -> f64) -> CustomActivation {
        CustomActivation { name: name.into(), function }
    }
}

impl PartialEq for CustomActivation {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

impl fmt::Debug for CustomActivation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Custom({})", self.name)
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivationFunction {
    /// Logistic sigmoid `1 / (1 + e^-x)`.
    #[default]
    Sigmoid,
    Tanh,
    Identity,
    #[serde(rename = "relu")]
    ReLU,
    #[serde(rename = "leaky_relu")]
    LeakyReLU { alpha: f64 },
    /// Never serialized; networks using it cannot be saved.
    #[serde(skip)]
    Custom(CustomActivation),
}

/// How a unit obtains `f'(x)` during backpropagation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DerivativeMode {
    /// Central finite difference over `function`; works for every variant.
    #[default]
    Numeric,
    /// Closed form where one exists, numeric otherwise.
    Analytic,
}

impl ActivationFunction {
    pub fn custom(name: impl Into<String>, function: fn(f64) -> f64) -> ActivationFunction {
        ActivationFunction::Custom(CustomActivation::new(name, function))
    }

    pub fn function(&self, x: f64) -> f64 {
        match self {
            ActivationFunction::Sigmoid => 1.0 / (1.0 + E.powf(-x)),
            ActivationFunction::Tanh => x.tanh(),
            ActivationFunction::Identity => x,
            ActivationFunction::ReLU => if x > 0.0 { x } else { 0.0 },
            ActivationFunction::LeakyReLU { alpha } => if x > 0.0 { x } else { alpha * x },
            ActivationFunction::Custom(custom) => (custom.function)(x),
        }
    }

    /// `(f(x + h/2) - f(x - h/2)) / h` with `h = DERIVATIVE_STEP`.
    pub fn numeric_derivative(&self, x: f64) -> f64 {
        let h = DERIVATIVE_STEP;
        (self.function(x + h / 2.0) - self.function(x - h / 2.0)) / h
    }

    /// Closed-form derivative, `None` for `Custom`.
    pub fn analytic_derivative(&self, x: f64) -> Option<f64> {
        let d = match self {
            ActivationFunction::Sigmoid => {
                let fx = self.function(x);
                fx * (1.0 - fx)
            }
            ActivationFunction::Tanh => {
                let t = x.tanh();
                1.0 - t * t
            }
            ActivationFunction::Identity => 1.0,
            ActivationFunction::ReLU => if x > 0.0 { 1.0 } else { 0.0 },
            ActivationFunction::LeakyReLU { alpha } => if x > 0.0 { 1.0 } else { *alpha },
            ActivationFunction::Custom(_) => return None,
        };
        Some(d)
    }

    pub fn derivative(&self, x: f64, mode: DerivativeMode) -> f64 {
        match mode {
            DerivativeMode::Numeric => self.numeric_derivative(x),
            DerivativeMode::Analytic => self
                .analytic_derivative(x)
                .unwrap_or_else(|| self.numeric_derivative(x)),
        }
    }

    pub fn is_serializable(&self) -> bool {
        !matches!(self, ActivationFunction::Custom(_))
    }
}

impl fmt::Display for ActivationFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ActivationFunction::Sigmoid => write!(f, "sigmoid"),
            ActivationFunction::Tanh => write!(f, "tanh"),
            ActivationFunction::Identity => write!(f, "identity"),
            ActivationFunction::ReLU => write!(f, "relu"),
            ActivationFunction::LeakyReLU { alpha } => write!(f, "leaky_relu({alpha})"),
            ActivationFunction::Custom(custom) => write!(f, "{}", custom.name),
        }
    }
}
