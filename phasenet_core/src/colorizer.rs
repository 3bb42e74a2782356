//! Per-entity display values.
//!
//! Renderers query a [`Colorizer`] for a value per vertex or edge. The
//! core only depends on the lookup capability; what the value means
//! (an RGB triple, a phase, a community index) is up to the caller.

use std::collections::HashMap;

use parking_lot::RwLock;

use crate::ids::{EdgeId, VertexId};

/// Lookup of a display value by entity.
pub trait Colorizer<T>: Send + Sync {
    /// Value for a vertex, `None` if the colorizer has nothing to say.
    fn vertex_value(&self, vertex: VertexId) -> Option<T>;
    
    /// Value for an edge.
    fn edge_value(&self, _edge: EdgeId) -> Option<T> {
        None
    }
}

/// Colorizer backed by explicit per-entity assignments with defaults.
#[derive(Debug)]
pub struct MapColorizer<T> {
    default_vertex: T,
    default_edge: T,
    vertices: RwLock<HashMap<VertexId, T>>,
    edges: RwLock<HashMap<EdgeId, T>>,
}

impl<T: Clone> MapColorizer<T> {
    pub fn new(default_vertex: T, default_edge: T) -> Self {
        Self {
            default_vertex,
            default_edge,
            vertices: RwLock::new(HashMap::new()),
            edges: RwLock::new(HashMap::new()),
        }
    }
    
    pub fn set_vertex(&self, vertex: VertexId, value: T) {
        self.vertices.write().insert(vertex, value);
    }
    
    pub fn set_edge(&self, edge: EdgeId, value: T) {
        self.edges.write().insert(edge, value);
    }
    
    /// Drops all explicit assignments.
    pub fn recolor(&self) {
        self.vertices.write().clear();
        self.edges.write().clear();
    }
}

impl<T: Clone + Send + Sync> Colorizer<T> for MapColorizer<T> {
    fn vertex_value(&self, vertex: VertexId) -> Option<T> {
        Some(
            self.vertices
                .read()
                .get(&vertex)
                .cloned()
                .unwrap_or_else(|| self.default_vertex.clone()),
        )
    }
    
    fn edge_value(&self, edge: EdgeId) -> Option<T> {
        Some(
            self.edges
                .read()
                .get(&edge)
                .cloned()
                .unwrap_or_else(|| self.default_edge.clone()),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    
    #[test]
    fn test_map_colorizer_defaults_and_overrides() {
        let colors = MapColorizer::new("black", "gray");
        colors.set_vertex(VertexId(1), "red");
        
        assert_eq!(colors.vertex_value(VertexId(1)), Some("red"));
        assert_eq!(colors.vertex_value(VertexId(2)), Some("black"));
        assert_eq!(colors.edge_value(EdgeId(0)), Some("gray"));
        
        colors.recolor();
        assert_eq!(colors.vertex_value(VertexId(1)), Some("black"));
    }
    
    #[test]
    fn test_colorizer_as_trait_object() {
        let colors: Box<dyn Colorizer<u8>> = Box::new(MapColorizer::new(1, 2));
        assert_eq!(colors.vertex_value(VertexId(0)), Some(1));
    }
}
