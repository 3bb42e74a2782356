//! Mutation notifications.
//!
//! Mutations queue [`GraphEvent`]s while the write lock is held and the
//! network dispatches them to its observers once the lock is released, so
//! observers may read (or even mutate) the network from inside a callback.

use std::collections::BTreeSet;

use parking_lot::Mutex;

use crate::edge::EdgeDirection;
use crate::ids::{EdgeId, VertexId};

/// A committed structural change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GraphEvent {
    VertexAdded(VertexId),
    VertexRemoved(VertexId),
    EdgeAdded(EdgeId),
    EdgeRemoved {
        edge: EdgeId,
        a: VertexId,
        b: VertexId,
    },
    /// An existing edge changed its direction tag (promotion, demotion or
    /// an explicit redirect)
    EdgeRedirected {
        edge: EdgeId,
        from: EdgeDirection,
        to: EdgeDirection,
    },
}

/// Callback surface for consumers that track topology changes.
///
/// All methods default to no-ops. Callbacks run after the corresponding
/// mutation has committed and the graph lock has been released.
pub trait GraphObserver: Send + Sync {
    fn on_vertex_added(&self, _vertex: VertexId) {}
    
    fn on_vertex_removed(&self, _vertex: VertexId) {}
    
    fn on_edge_added(&self, _edge: EdgeId) {}
    
    /// Endpoints are passed along since the edge no longer resolves.
    fn on_edge_removed(&self, _edge: EdgeId, _a: VertexId, _b: VertexId) {}
    
    fn on_edge_redirected(&self, _edge: EdgeId, _from: EdgeDirection, _to: EdgeDirection) {}
}

/// Routes one event to the matching observer method.
pub(crate) fn dispatch(observer: &dyn GraphObserver, event: &GraphEvent) {
    match *event {
        GraphEvent::VertexAdded(v) => observer.on_vertex_added(v),
        GraphEvent::VertexRemoved(v) => observer.on_vertex_removed(v),
        GraphEvent::EdgeAdded(e) => observer.on_edge_added(e),
        GraphEvent::EdgeRemoved { edge, a, b } => observer.on_edge_removed(edge, a, b),
        GraphEvent::EdgeRedirected { edge, from, to } => observer.on_edge_redirected(edge, from, to),
    }
}

/// Accumulated changes since the last [`ChangeTracker::drain`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Changes {
    pub added_vertices: BTreeSet<VertexId>,
    pub removed_vertices: BTreeSet<VertexId>,
    pub added_edges: BTreeSet<EdgeId>,
    /// Removed edges with the endpoints they had
    pub removed_edges: BTreeSet<(EdgeId, VertexId, VertexId)>,
}

impl Changes {
    pub fn is_empty(&self) -> bool {
        self.added_vertices.is_empty()
            && self.removed_vertices.is_empty()
            && self.added_edges.is_empty()
            && self.removed_edges.is_empty()
    }
}

/// Observer that records changes for later, sequential consumption.
///
/// Dynamics and layout objects register one of these and drain it at the
/// start of a step, which is where auxiliary per-vertex maps may be resized
/// safely. A vertex added and removed between two drains is reported in
/// neither set.
#[derive(Debug, Default)]
pub struct ChangeTracker {
    changes: Mutex<Changes>,
}

impl ChangeTracker {
    pub fn new() -> Self {
        Self::default()
    }
    
    /// Takes the accumulated changes, leaving the tracker empty.
    pub fn drain(&self) -> Changes {
        std::mem::take(&mut *self.changes.lock())
    }
    
    pub fn has_changes(&self) -> bool {
        !self.changes.lock().is_empty()
    }
}

impl GraphObserver for ChangeTracker {
    fn on_vertex_added(&self, vertex: VertexId) {
        self.changes.lock().added_vertices.insert(vertex);
    }
    
    fn on_vertex_removed(&self, vertex: VertexId) {
        let mut changes = self.changes.lock();
        if !changes.added_vertices.remove(&vertex) {
            changes.removed_vertices.insert(vertex);
        }
    }
    
    fn on_edge_added(&self, edge: EdgeId) {
        self.changes.lock().added_edges.insert(edge);
    }
    
    fn on_edge_removed(&self, edge: EdgeId, a: VertexId, b: VertexId) {
        let mut changes = self.changes.lock();
        if !changes.added_edges.remove(&edge) {
            changes.removed_edges.insert((edge, a, b));
        }
    }
}
