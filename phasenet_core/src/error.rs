//! Error types for the PhaseNet graph core.

use thiserror::Error;

use crate::ids::{EdgeId, VertexId};

/// Errors that can occur while mutating a [`Network`](crate::Network).
///
/// Lookups never produce these: searching for a missing label or id
/// returns `None` instead.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GraphError {
    /// A structural mutation was attempted by a thread that still holds a
    /// read guard on the same network.
    #[error("Reentrant mutation: thread holds {held} read guard(s) on network {network}")]
    ReentrantMutation {
        /// Instance id of the network
        network: u64,
        /// Number of read guards the calling thread holds
        held: usize,
    },
    
    /// Vertex is not (or no longer) part of the network
    #[error("Vertex not found: {0}")]
    VertexNotFound(VertexId),
    
    /// Edge is not (or no longer) part of the network
    #[error("Edge not found: {0}")]
    EdgeNotFound(EdgeId),
    
    /// A generator was given parameters it cannot satisfy
    #[error("Invalid generator parameters: {0}")]
    InvalidParameters(String),
}

impl GraphError {
    /// Creates an invalid-parameters error.
    pub fn invalid(msg: impl Into<String>) -> Self {
        Self::InvalidParameters(msg.into())
    }
}

/// Result alias for graph operations.
pub type GraphResult<T> = Result<T, GraphError>;
