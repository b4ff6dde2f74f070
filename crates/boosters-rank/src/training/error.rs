//! Errors raised by ranking targets.

use crate::data::DataError;

use super::config::{BootstrapType, ConfigError, LossKind};

/// Target function error.
///
/// Every variant is raised before any output buffer is produced.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum TargetError {
    /// The bootstrap type cannot be used with this objective.
    #[error("{bootstrap:?} bootstrap is not supported for {objective}")]
    UnsupportedBootstrap {
        bootstrap: BootstrapType,
        objective: &'static str,
    },

    /// The loss configuration describes a different objective.
    #[error("loss configuration is for {actual:?}, expected {expected:?}")]
    LossMismatch { expected: LossKind, actual: LossKind },

    /// A loss parameter could not be parsed or is out of range.
    #[error("invalid loss parameter {name}={value}")]
    InvalidParam { name: String, value: String },

    /// Observation weights must sum to a positive value.
    #[error("observation weights should be >= 0 and total weight should be > 0, got {0}")]
    NonPositiveTotalWeight(f64),

    /// An input buffer does not match the target's document count.
    #[error("{what}: expected length {expected}, got {actual}")]
    ShapeMismatch {
        what: &'static str,
        expected: usize,
        actual: usize,
    },

    /// An index buffer refers past the end of the buffer it indexes.
    #[error("{what}: index {index} out of range for length {len}")]
    IndexOutOfRange {
        what: &'static str,
        index: usize,
        len: usize,
    },

    /// The operation is deliberately not provided by this target.
    #[error("{0} is not implemented for this target")]
    Unimplemented(&'static str),

    /// The evaluation strategy does not offer this capability.
    #[error("{0} evaluation is not available for this target category")]
    UnsupportedEvaluation(&'static str),

    /// Invalid bootstrap configuration.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Invalid data layout.
    #[error(transparent)]
    Data(#[from] DataError),
}

impl TargetError {
    /// Shorthand for a length check.
    pub(crate) fn check_len(what: &'static str, expected: usize, actual: usize) -> Result<(), Self> {
        if expected == actual {
            Ok(())
        } else {
            Err(Self::ShapeMismatch { what, expected, actual })
        }
    }
}
