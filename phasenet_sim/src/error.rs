//! Error types for scenarios, dynamics setup and export.

use phasenet_core::GraphError;
use phasenet_engine::EngineError;
use thiserror::Error;

/// Errors raised while setting up or driving a simulation.
#[derive(Debug, Error)]
pub enum SimError {
    /// Graph construction or mutation failed
    #[error("Graph error: {0}")]
    Graph(#[from] GraphError),
    
    /// Engine could not start or write its output
    #[error("Engine error: {0}")]
    Engine(#[from] EngineError),
    
    /// A configuration value is out of range
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
    
    /// Export serialization failed
    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),
    
    /// File I/O failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl SimError {
    /// Creates a configuration error.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::InvalidConfig(msg.into())
    }
}

pub type SimResult<T> = Result<T, SimError>;
