use thiserror::Error;

/// Errors raised by network construction, inference, training and persistence.
///
/// Shape errors are caller errors: they are reported before any weight is
/// touched, so a failed call never leaves a half-applied training step behind.
#[derive(Debug, Error)]
pub enum NetError {
    /// An input, target or weight vector has the wrong length.
    #[error("dimension mismatch: expected {expected}, got {got}")]
    DimensionMismatch { expected: usize, got: usize },

    /// A weight, unit or layer index is outside its container.
    #[error("index {index} out of range for length {len}")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("invalid architecture: {0}")]
    InvalidArchitecture(String),

    /// The value cannot be persisted (e.g. a `Custom` activation function).
    #[error("cannot serialize: {0}")]
    Unserializable(String),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, NetError>;

/// Fails with `DimensionMismatch` unless `got == expected`.
pub(crate) fn check_len(expected: usize, got: usize) -> Result<()> {
    if expected == got {
        Ok(())
    } else {
        Err(NetError::DimensionMismatch { expected, got })
    }
}
