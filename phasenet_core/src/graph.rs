//! Adjacency state of a network.
//!
//! [`Graph`] is what a [`NetworkReadGuard`](crate::NetworkReadGuard) or a
//! [`GraphMut`](crate::GraphMut) dereferences to. It only exposes reads;
//! every structural change goes through the mutation protocol in
//! [`crate::mutation`].

use std::collections::{BTreeMap, HashMap};

use crate::arena::Arena;
use crate::edge::Edge;
use crate::ids::{EdgeId, VertexId};
use crate::vertex::Vertex;

/// Vertices, edges and the label index of one network.
pub struct Graph {
    pub(crate) vertices: Arena<VertexId, Vertex>,
    pub(crate) edges: Arena<EdgeId, Edge>,
    /// label -> vertices carrying it, in registration order
    pub(crate) labels: HashMap<String, Vec<VertexId>>,
}

impl Graph {
    pub(crate) fn new() -> Self {
        Self {
            vertices: Arena::new(),
            edges: Arena::new(),
            labels: HashMap::new(),
        }
    }
    
    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }
    
    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }
    
    pub fn contains_vertex(&self, id: VertexId) -> bool {
        self.vertices.contains(id)
    }
    
    pub fn contains_edge(&self, id: EdgeId) -> bool {
        self.edges.contains(id)
    }
    
    pub fn vertex(&self, id: VertexId) -> Option<&Vertex> {
        self.vertices.get(id)
    }
    
    pub fn edge(&self, id: EdgeId) -> Option<&Edge> {
        self.edges.get(id)
    }
    
    /// Vertices in creation order.
    pub fn vertices(&self) -> impl Iterator<Item = &Vertex> + '_ {
        self.vertices.iter().map(|(_, v)| v)
    }
    
    /// Edges in creation order.
    pub fn edges(&self) -> impl Iterator<Item = &Edge> + '_ {
        self.edges.iter().map(|(_, e)| e)
    }
    
    /// Only undirected edges; filters lazily, nothing is copied.
    pub fn undirected_edges(&self) -> impl Iterator<Item = &Edge> + '_ {
        self.edges().filter(|e| !e.is_directed())
    }
    
    /// Only directed edges; filters lazily, nothing is copied.
    pub fn directed_edges(&self) -> impl Iterator<Item = &Edge> + '_ {
        self.edges().filter(|e| e.is_directed())
    }
    
    /// Snapshot of all vertex ids in creation order.
    pub fn vertex_ids(&self) -> Vec<VertexId> {
        self.vertices.iter().map(|(id, _)| id).collect()
    }
    
    /// Snapshot of all edge ids in creation order.
    pub fn edge_ids(&self) -> Vec<EdgeId> {
        self.edges.iter().map(|(id, _)| id).collect()
    }
    
    /// First vertex registered under `label`.
    ///
    /// Labels are not required to be unique; when several vertices share
    /// one, the earliest still-present registrant wins.
    pub fn search_vertex(&self, label: &str) -> Option<VertexId> {
        self.labels.get(label).and_then(|ids| ids.first()).copied()
    }
    
    /// The edge joining `a` and `b`, in any direction.
    pub fn edge_between(&self, a: VertexId, b: VertexId) -> Option<EdgeId> {
        self.vertex(a)?.edge_to(b)
    }
    
    /// Degree of `v` (incident edges), 0 if absent.
    pub fn degree(&self, v: VertexId) -> usize {
        self.vertex(v).map_or(0, Vertex::degree)
    }
    
    pub fn mean_degree(&self) -> f64 {
        let n = self.vertex_count();
        if n == 0 {
            return 0.0;
        }
        let total: usize = self.vertices().map(Vertex::degree).sum();
        total as f64 / n as f64
    }
    
    /// degree -> number of vertices with that degree.
    pub fn degree_distribution(&self) -> BTreeMap<usize, usize> {
        let mut dist = BTreeMap::new();
        for v in self.vertices() {
            *dist.entry(v.degree()).or_insert(0) += 1;
        }
        dist
    }
    
    /// Verifies the structural invariants of the whole graph.
    ///
    /// - every edge's endpoints are present and reference the edge
    /// - every adjacency entry resolves to an edge joining the right pair
    /// - `|successors| == |undirected| + |outgoing|` for every vertex
    pub fn check_invariants(&self) -> bool {
        for edge in self.edges() {
            let (Some(a), Some(b)) = (self.vertex(edge.a), self.vertex(edge.b)) else {
                return false;
            };
            if a.edge_to(edge.b) != Some(edge.id) || b.edge_to(edge.a) != Some(edge.id) {
                return false;
            }
        }
        
        for vertex in self.vertices() {
            if !vertex.successor_invariant_holds() {
                return false;
            }
            let adjacency = vertex
                .incoming
                .iter()
                .map(|(n, e)| (n, e, Some((*n, vertex.id))))
                .chain(vertex.outgoing.iter().map(|(n, e)| (n, e, Some((vertex.id, *n)))))
                .chain(vertex.undirected.iter().map(|(n, e)| (n, e, None)));
            for (neighbor, edge_id, direction) in adjacency {
                let Some(edge) = self.edge(*edge_id) else {
                    return false;
                };
                if !edge.joins(vertex.id, *neighbor) {
                    return false;
                }
                match direction {
                    Some((s, t)) if !edge.is_directed() || edge.source() != s || edge.target() != t => {
                        return false;
                    }
                    None if edge.is_directed() => return false,
                    _ => {}
                }
            }
        }
        
        self.labels
            .values()
            .flatten()
            .all(|id| self.vertices.contains(*id))
    }
}
