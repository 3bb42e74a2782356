//! Connectivity queries.
//!
//! Components are weak: edge direction is ignored. All traversals run on a
//! [`Graph`] borrowed from a single guard, so the whole search sees one
//! consistent topology.

use std::collections::{HashSet, VecDeque};

use crate::graph::Graph;
use crate::ids::VertexId;

impl Graph {
    /// Vertices reachable from `start`, ignoring direction, in BFS order.
    pub fn component_of(&self, start: VertexId) -> Vec<VertexId> {
        let mut seen = HashSet::new();
        self.bfs(start, &mut seen)
    }
    
    /// Whether `a` and `b` are joined by some undirected path.
    pub fn in_same_component(&self, a: VertexId, b: VertexId) -> bool {
        self.contains_vertex(b) && self.component_of(a).contains(&b)
    }
    
    /// All weak components, each sorted, largest first.
    pub fn connected_components(&self) -> Vec<Vec<VertexId>> {
        let mut seen = HashSet::new();
        let mut components = Vec::new();
        for v in self.vertex_ids() {
            if seen.contains(&v) {
                continue;
            }
            let mut component = self.bfs(v, &mut seen);
            component.sort();
            components.push(component);
        }
        // stable: equal sizes keep discovery order
        components.sort_by(|x, y| y.len().cmp(&x.len()));
        components
    }
    
    /// The largest weak component, sorted by id. Ties go to the component
    /// containing the oldest vertex.
    pub fn largest_connected_component(&self) -> Vec<VertexId> {
        self.connected_components().into_iter().next().unwrap_or_default()
    }
    
    fn bfs(&self, start: VertexId, seen: &mut HashSet<VertexId>) -> Vec<VertexId> {
        if !self.contains_vertex(start) || !seen.insert(start) {
            return Vec::new();
        }
        let mut order = vec![start];
        let mut queue = VecDeque::from([start]);
        while let Some(v) = queue.pop_front() {
            let Some(vertex) = self.vertex(v) else {
                continue;
            };
            for n in vertex.neighbors() {
                if seen.insert(n) {
                    order.push(n);
                    queue.push_back(n);
                }
            }
        }
        order
    }
}
