//! Error types for the PhaseNet simulation engines.

use thiserror::Error;

use crate::lifecycle::RunState;

/// Failures raised by a dynamics object inside `init`, `step` or
/// `derivative`.
///
/// The engine catches these exactly once at the loop boundary, logs them
/// and ends the run in [`RunState::Error`].
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DynamicsError {
    /// Generic failure with a message
    #[error("Dynamics failed: {0}")]
    Failed(String),
    
    /// A state component became NaN or infinite
    #[error("Non-finite value in state component {index} at t={time}")]
    NonFinite { index: usize, time: f64 },
    
    /// A derivative had a different length than the state
    #[error("Dimension mismatch: state has {expected} components, derivative {found}")]
    DimensionMismatch { expected: usize, found: usize },
}

impl DynamicsError {
    /// Creates a generic failure.
    pub fn failed(msg: impl Into<String>) -> Self {
        Self::Failed(msg.into())
    }
    
    /// Wraps a foreign error as a generic failure.
    pub fn from_error(err: impl std::error::Error) -> Self {
        Self::Failed(err.to_string())
    }
}

/// Errors surfaced by engine operations outside the run loop.
#[derive(Debug, Error)]
pub enum EngineError {
    /// The engine configuration cannot drive a run
    #[error("Invalid engine config: {0}")]
    InvalidConfig(String),
    
    /// `run()` was called on an engine that is not idle
    #[error("Engine cannot start from state {0:?}")]
    NotIdle(RunState),
    
    /// Background thread could not be spawned
    #[error("Failed to spawn engine thread: {0}")]
    Spawn(std::io::Error),
    
    /// Writing the time series failed
    #[error("Time series I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result alias for dynamics callbacks.
pub type DynamicsResult<T> = Result<T, DynamicsError>;
