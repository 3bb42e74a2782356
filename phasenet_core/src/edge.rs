//! Edges and their direction tags.

use serde::{Deserialize, Serialize};

use crate::ids::{EdgeId, VertexId};

/// Direction tag of a stored edge, relative to its endpoints `a` and `b`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EdgeDirection {
    /// Traversable both ways
    Undirected,
    /// Directed from `a` to `b`
    AtoB,
    /// Directed from `b` to `a`
    BtoA,
}

/// Requested kind of a new connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EdgeType {
    /// Undirected connection
    Undirected,
    /// Directed connection from source to target
    Directed,
}

/// A standalone description of a connection, not yet part of any network.
///
/// Registering it through [`Network::add_edge`](crate::Network::add_edge)
/// runs the merge rules and yields the id of the edge that ends up
/// representing the connection.
#[derive(Debug, Clone, PartialEq)]
pub struct EdgeSpec {
    pub source: VertexId,
    pub target: VertexId,
    pub edge_type: EdgeType,
    pub weight: Option<f64>,
    pub label: Option<String>,
}

impl EdgeSpec {
    /// Creates a spec with no weight and no label.
    pub fn new(source: VertexId, target: VertexId, edge_type: EdgeType) -> Self {
        Self {
            source,
            target,
            edge_type,
            weight: None,
            label: None,
        }
    }
    
    /// Creates an undirected spec.
    pub fn undirected(a: VertexId, b: VertexId) -> Self {
        Self::new(a, b, EdgeType::Undirected)
    }
    
    /// Creates a directed spec.
    pub fn directed(source: VertexId, target: VertexId) -> Self {
        Self::new(source, target, EdgeType::Directed)
    }
    
    /// Sets the weight.
    pub fn with_weight(mut self, weight: f64) -> Self {
        self.weight = Some(weight);
        self
    }
    
    /// Sets the label.
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }
}

/// An edge stored in a network.
///
/// `source` and `target` are projections of `a`/`b` through the direction
/// tag; for undirected edges they are simply `a` and `b`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Edge {
    pub(crate) id: EdgeId,
    pub(crate) a: VertexId,
    pub(crate) b: VertexId,
    pub(crate) direction: EdgeDirection,
    pub(crate) weight: Option<f64>,
    pub(crate) label: Option<String>,
}

impl Edge {
    pub(crate) fn from_spec(id: EdgeId, spec: &EdgeSpec) -> Self {
        let direction = match spec.edge_type {
            EdgeType::Undirected => EdgeDirection::Undirected,
            EdgeType::Directed => EdgeDirection::AtoB,
        };
        Self {
            id,
            a: spec.source,
            b: spec.target,
            direction,
            weight: spec.weight,
            label: spec.label.clone(),
        }
    }
    
    pub fn id(&self) -> EdgeId {
        self.id
    }
    
    pub fn a(&self) -> VertexId {
        self.a
    }
    
    pub fn b(&self) -> VertexId {
        self.b
    }
    
    pub fn direction(&self) -> EdgeDirection {
        self.direction
    }
    
    pub fn weight(&self) -> Option<f64> {
        self.weight
    }
    
    pub fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }
    
    pub fn is_directed(&self) -> bool {
        self.direction != EdgeDirection::Undirected
    }
    
    /// Source endpoint under the current direction.
    pub fn source(&self) -> VertexId {
        match self.direction {
            EdgeDirection::BtoA => self.b,
            _ => self.a,
        }
    }
    
    /// Target endpoint under the current direction.
    pub fn target(&self) -> VertexId {
        match self.direction {
            EdgeDirection::BtoA => self.a,
            _ => self.b,
        }
    }
    
    /// The endpoint opposite to `v`, if `v` is an endpoint at all.
    pub fn other(&self, v: VertexId) -> Option<VertexId> {
        if v == self.a {
            Some(self.b)
        } else if v == self.b {
            Some(self.a)
        } else {
            None
        }
    }
    
    /// True when the edge joins `x` and `y` in either order.
    pub fn joins(&self, x: VertexId, y: VertexId) -> bool {
        (self.a == x && self.b == y) || (self.a == y && self.b == x)
    }
    
    /// True when this edge can be traversed from `from` to `to`.
    pub fn leads(&self, from: VertexId, to: VertexId) -> bool {
        match self.direction {
            EdgeDirection::Undirected => self.joins(from, to),
            _ => self.source() == from && self.target() == to,
        }
    }
    
    /// Direction tag that makes the edge point from `source` to `target`.
    ///
    /// Returns `None` if the pair does not match the endpoints.
    pub(crate) fn direction_for(&self, source: VertexId, target: VertexId) -> Option<EdgeDirection> {
        if self.a == source && self.b == target {
            Some(EdgeDirection::AtoB)
        } else if self.b == source && self.a == target {
            Some(EdgeDirection::BtoA)
        } else {
            None
        }
    }
}

/// Direction-aware structural equality.
///
/// Two undirected edges are equal regardless of endpoint order; directed
/// edges need the same source and target, so `(a, b, AtoB)` equals
/// `(b, a, BtoA)`. Ids, weights and labels are ignored.
impl PartialEq for Edge {
    fn eq(&self, other: &Self) -> bool {
        match (self.is_directed(), other.is_directed()) {
            (false, false) => self.joins(other.a, other.b),
            (true, true) => self.source() == other.source() && self.target() == other.target(),
            _ => false,
        }
    }
}
