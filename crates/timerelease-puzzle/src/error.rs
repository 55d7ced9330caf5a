use std::fmt;

use thiserror::Error;
use timerelease_types::TypesError;

/// Which half of the two-layer cipher rejected its padding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Layer {
    /// The one-time key sealed under the puzzle-derived key. Failing here
    /// means the puzzle solution is wrong for this package.
    Key,
    /// The secret sealed under the one-time key.
    Secret,
}

impl fmt::Display for Layer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Layer::Key => f.write_str("key"),
            Layer::Secret => f.write_str("secret"),
        }
    }
}

#[derive(Error, Debug)]
pub enum PuzzleError {
    #[error("Secure random source unavailable: {0}")]
    RandomnessUnavailable(String),

    #[error("Iterations must be positive")]
    NonPositiveIterations,

    #[error("Padding validation failed in the {0} layer")]
    PaddingValidation(Layer),

    #[error("Solve cancelled before completion")]
    Cancelled,

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("Invalid package: {0}")]
    InvalidPackage(#[from] TypesError),
}

pub type Result<T> = std::result::Result<T, PuzzleError>;
