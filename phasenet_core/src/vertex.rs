//! Vertices and their local adjacency views.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::edge::{Edge, EdgeDirection};
use crate::ids::{EdgeId, VertexId};

/// A vertex stored in a network.
///
/// Adjacency is keyed by the neighbouring vertex, which is possible because
/// at most one edge object ever joins a pair of vertices. Ordered maps keep
/// neighbour iteration deterministic for seeded runs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Vertex {
    pub(crate) id: VertexId,
    pub(crate) label: String,
    pub(crate) tag: Option<String>,
    /// source -> edge, for directed edges pointing here
    pub(crate) incoming: BTreeMap<VertexId, EdgeId>,
    /// target -> edge, for directed edges leaving here
    pub(crate) outgoing: BTreeMap<VertexId, EdgeId>,
    /// neighbour -> edge, for undirected edges
    pub(crate) undirected: BTreeMap<VertexId, EdgeId>,
}

impl Vertex {
    pub(crate) fn new(id: VertexId, label: Option<String>) -> Self {
        Self {
            id,
            label: label.unwrap_or_else(|| id.to_string()),
            tag: None,
            incoming: BTreeMap::new(),
            outgoing: BTreeMap::new(),
            undirected: BTreeMap::new(),
        }
    }
    
    pub fn id(&self) -> VertexId {
        self.id
    }
    
    pub fn label(&self) -> &str {
        &self.label
    }
    
    pub fn tag(&self) -> Option<&str> {
        self.tag.as_deref()
    }
    
    /// Vertices reachable over one edge (outgoing or undirected).
    pub fn successors(&self) -> impl Iterator<Item = VertexId> + '_ {
        self.outgoing.keys().chain(self.undirected.keys()).copied()
    }
    
    /// Vertices that reach this one over one edge (incoming or undirected).
    pub fn predecessors(&self) -> impl Iterator<Item = VertexId> + '_ {
        self.incoming.keys().chain(self.undirected.keys()).copied()
    }
    
    /// All adjacent vertices regardless of direction, each once.
    pub fn neighbors(&self) -> impl Iterator<Item = VertexId> + '_ {
        self.incoming
            .keys()
            .chain(self.outgoing.keys())
            .chain(self.undirected.keys())
            .copied()
    }
    
    pub fn incoming_edges(&self) -> impl Iterator<Item = EdgeId> + '_ {
        self.incoming.values().copied()
    }
    
    pub fn outgoing_edges(&self) -> impl Iterator<Item = EdgeId> + '_ {
        self.outgoing.values().copied()
    }
    
    pub fn undirected_edges(&self) -> impl Iterator<Item = EdgeId> + '_ {
        self.undirected.values().copied()
    }
    
    /// Every edge touching this vertex, each once.
    pub fn incident_edges(&self) -> impl Iterator<Item = EdgeId> + '_ {
        self.incoming_edges()
            .chain(self.outgoing_edges())
            .chain(self.undirected_edges())
    }
    
    pub fn in_degree(&self) -> usize {
        self.incoming.len() + self.undirected.len()
    }
    
    pub fn out_degree(&self) -> usize {
        self.outgoing.len() + self.undirected.len()
    }
    
    /// Number of incident edges.
    pub fn degree(&self) -> usize {
        self.incoming.len() + self.outgoing.len() + self.undirected.len()
    }
    
    /// The edge joining this vertex to `other`, in any direction.
    pub fn edge_to(&self, other: VertexId) -> Option<EdgeId> {
        self.undirected
            .get(&other)
            .or_else(|| self.outgoing.get(&other))
            .or_else(|| self.incoming.get(&other))
            .copied()
    }
    
    pub fn is_successor(&self, other: VertexId) -> bool {
        self.outgoing.contains_key(&other) || self.undirected.contains_key(&other)
    }
    
    pub fn is_predecessor(&self, other: VertexId) -> bool {
        self.incoming.contains_key(&other) || self.undirected.contains_key(&other)
    }
    
    /// Adds `edge` to the local adjacency maps according to its direction.
    pub(crate) fn register(&mut self, edge: &Edge) {
        let Some(other) = edge.other(self.id) else {
            return;
        };
        match edge.direction {
            EdgeDirection::Undirected => {
                self.undirected.insert(other, edge.id);
            }
            _ if edge.source() == self.id => {
                self.outgoing.insert(other, edge.id);
            }
            _ => {
                self.incoming.insert(other, edge.id);
            }
        }
        self.check_invariant();
    }
    
    /// Removes every local reference to the edge joining this vertex and
    /// `other`, whatever its current direction.
    pub(crate) fn unregister(&mut self, other: VertexId) {
        self.undirected.remove(&other);
        self.outgoing.remove(&other);
        self.incoming.remove(&other);
    }
    
    /// Counts successors as a set and compares against the two maps they
    /// derive from; a neighbour present in both would double count.
    pub(crate) fn successor_invariant_holds(&self) -> bool {
        let successors: BTreeSet<VertexId> = self.successors().collect();
        successors.len() == self.undirected.len() + self.outgoing.len()
    }
    
    fn check_invariant(&self) {
        debug_assert!(
            self.successor_invariant_holds(),
            "adjacency invariant violated at {}: {} successors vs {} undirected + {} outgoing",
            self.id,
            self.successors().collect::<BTreeSet<_>>().len(),
            self.undirected.len(),
            self.outgoing.len(),
        );
    }
}
