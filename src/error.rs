use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::util::Damage;

/// Everything the engine can refuse to do, in one taxonomy.
///
/// These are deterministic functions of their inputs; none of them is
/// retriable without changing the inputs, so no variant carries retry hints.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CalcError {
    #[error("invalid damage range: min {min} > max {max}")]
    InvalidRange { min: Damage, max: Damage },

    #[error("unsupported configuration: {0}")]
    UnsupportedConfiguration(String),

    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("computation failed for loadout {loadout_index}: {message}")]
    ComputationFailed {
        loadout_index: usize,
        message: String,
    },
}

pub type CalcResult<T> = Result<T, CalcError>;

/// Wire-safe error representation for responses crossing the worker
/// boundary. Live error values never cross it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorInfo {
    pub kind: ErrorKind,
    pub message: String,
    pub loadout_index: Option<usize>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorKind {
    InvalidRange,
    UnsupportedConfiguration,
    InvalidRequest,
    ComputationFailed,
}

impl From<&CalcError> for ErrorInfo {
    fn from(err: &CalcError) -> Self {
        let (kind, loadout_index) = match err {
            CalcError::InvalidRange { .. } => (ErrorKind::InvalidRange, None),
            CalcError::UnsupportedConfiguration(_) => (ErrorKind::UnsupportedConfiguration, None),
            CalcError::InvalidRequest(_) => (ErrorKind::InvalidRequest, None),
            CalcError::ComputationFailed { loadout_index, .. } => {
                (ErrorKind::ComputationFailed, Some(*loadout_index))
            }
        };
        Self {
            kind,
            message: err.to_string(),
            loadout_index,
        }
    }
}

impl From<CalcError> for ErrorInfo {
    fn from(err: CalcError) -> Self {
        Self::from(&err)
    }
}
