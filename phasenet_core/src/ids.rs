//! Identifier types for vertices and edges.
//!
//! Ids are dense indices into the network's arenas. They are handed out
//! monotonically per network and never reused, so an id that outlives its
//! entity simply stops resolving.

use serde::{Deserialize, Serialize};

/// Unique identifier of a vertex within one network.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct VertexId(pub u32);

impl VertexId {
    /// Returns the arena slot index.
    pub fn index(&self) -> usize {
        self.0 as usize
    }
}

impl std::fmt::Display for VertexId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "v{}", self.0)
    }
}

/// Unique identifier of an edge within one network.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EdgeId(pub u32);

impl EdgeId {
    /// Returns the arena slot index.
    pub fn index(&self) -> usize {
        self.0 as usize
    }
}

impl std::fmt::Display for EdgeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "e{}", self.0)
    }
}

/// Internal conversion between ids and arena slots.
pub(crate) trait ArenaId: Copy + Eq + std::hash::Hash {
    fn from_slot(slot: usize) -> Self;
    fn slot(self) -> usize;
}

impl ArenaId for VertexId {
    fn from_slot(slot: usize) -> Self {
        VertexId(slot as u32)
    }
    
    fn slot(self) -> usize {
        self.index()
    }
}

impl ArenaId for EdgeId {
    fn from_slot(slot: usize) -> Self {
        EdgeId(slot as u32)
    }
    
    fn slot(self) -> usize {
        self.index()
    }
}
