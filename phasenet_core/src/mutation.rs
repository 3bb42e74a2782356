//! The mutation protocol.
//!
//! At most one edge object exists between any pair of vertices. Adding an
//! edge that overlaps an existing one either leaves it untouched or
//! promotes it to undirected in place; removing one direction of an
//! undirected edge demotes it rather than deleting it.

use std::collections::HashSet;
use std::ops::Deref;

use parking_lot::Mutex;
use rand_chacha::ChaCha8Rng;
use tracing::trace;

use crate::edge::{Edge, EdgeDirection, EdgeSpec, EdgeType};
use crate::error::{GraphError, GraphResult};
use crate::events::GraphEvent;
use crate::graph::Graph;
use crate::ids::{EdgeId, VertexId};
use crate::vertex::Vertex;

/// Exclusive access to a network's topology for the duration of one
/// [`Network::mutate`](crate::Network::mutate) call.
///
/// Helpers that take `&mut GraphMut` can call each other freely; this is
/// the re-entrant write path. Reads are available through `Deref<Target =
/// Graph>`.
pub struct GraphMut<'a> {
    graph: &'a mut Graph,
    events: &'a mut Vec<GraphEvent>,
    rng: &'a Mutex<ChaCha8Rng>,
}

impl<'a> GraphMut<'a> {
    pub(crate) fn new(
        graph: &'a mut Graph,
        events: &'a mut Vec<GraphEvent>,
        rng: &'a Mutex<ChaCha8Rng>,
    ) -> Self {
        Self { graph, events, rng }
    }
    
    /// Runs `f` with the network's random source.
    pub fn with_rng<R>(&self, f: impl FnOnce(&mut ChaCha8Rng) -> R) -> R {
        f(&mut self.rng.lock())
    }
    
    // ========================================================================
    // VERTICES
    // ========================================================================
    
    /// Adds a vertex; the label defaults to the id's display form.
    pub fn add_vertex(&mut self, label: Option<&str>) -> VertexId {
        let id = self.graph.vertices.next_id();
        let vertex = Vertex::new(id, label.map(str::to_string));
        self.graph
            .labels
            .entry(vertex.label.clone())
            .or_default()
            .push(id);
        self.graph.vertices.insert(vertex);
        self.events.push(GraphEvent::VertexAdded(id));
        id
    }
    
    /// Removes a vertex and all incident edges.
    ///
    /// Edge removals are reported before the vertex removal. Returns
    /// `false` if the vertex is not present.
    pub fn remove_vertex(&mut self, id: VertexId) -> bool {
        let Some(vertex) = self.graph.vertices.get(id) else {
            return false;
        };
        let incident: Vec<EdgeId> = vertex.incident_edges().collect();
        for edge in incident {
            self.delete_edge(edge);
        }
        
        if let Some(vertex) = self.graph.vertices.remove(id) {
            self.unindex_label(&vertex.label, id);
        }
        self.events.push(GraphEvent::VertexRemoved(id));
        true
    }
    
    /// Changes a vertex's label, keeping the label index in sync.
    pub fn set_label(&mut self, id: VertexId, label: &str) -> GraphResult<()> {
        let vertex = self
            .graph
            .vertices
            .get_mut(id)
            .ok_or(GraphError::VertexNotFound(id))?;
        let old = std::mem::replace(&mut vertex.label, label.to_string());
        self.unindex_label(&old, id);
        self.graph.labels.entry(label.to_string()).or_default().push(id);
        Ok(())
    }
    
    /// Attaches an opaque user tag to a vertex.
    pub fn set_tag(&mut self, id: VertexId, tag: Option<String>) -> GraphResult<()> {
        let vertex = self
            .graph
            .vertices
            .get_mut(id)
            .ok_or(GraphError::VertexNotFound(id))?;
        vertex.tag = tag;
        Ok(())
    }
    
    fn unindex_label(&mut self, label: &str, id: VertexId) {
        if let Some(ids) = self.graph.labels.get_mut(label) {
            ids.retain(|v| *v != id);
            if ids.is_empty() {
                self.graph.labels.remove(label);
            }
        }
    }
    
    // ========================================================================
    // EDGES
    // ========================================================================
    
    /// Shorthand for [`GraphMut::add_edge`] without weight or label.
    pub fn connect(
        &mut self,
        source: VertexId,
        target: VertexId,
        edge_type: EdgeType,
    ) -> GraphResult<Option<EdgeId>> {
        self.add_edge(EdgeSpec::new(source, target, edge_type))
    }
    
    /// Registers a connection, applying the merge rules in order:
    ///
    /// 1. self loop: nothing is added
    /// 2. an undirected edge already joins the pair: it is returned as is
    /// 3. a directed request matches an existing edge exactly: returned as is
    /// 4. the reverse directed edge exists: promoted to undirected in place
    /// 5. an undirected request meets a same-direction edge: promoted in place
    /// 6. otherwise a new edge is created
    ///
    /// Returns the edge now representing the connection, `None` for loops.
    pub fn add_edge(&mut self, spec: EdgeSpec) -> GraphResult<Option<EdgeId>> {
        let (source, target) = (spec.source, spec.target);
        for v in [source, target] {
            if !self.graph.contains_vertex(v) {
                return Err(GraphError::VertexNotFound(v));
            }
        }
        if source == target {
            return Ok(None);
        }
        
        if let Some(existing) = self.graph.edge_between(source, target) {
            let edge = self
                .graph
                .edges
                .get(existing)
                .ok_or(GraphError::EdgeNotFound(existing))?;
            let same_direction = edge.source() == source && edge.target() == target;
            let keep = !edge.is_directed() || (spec.edge_type == EdgeType::Directed && same_direction);
            if !keep {
                self.redirect(existing, EdgeDirection::Undirected);
            }
            return Ok(Some(existing));
        }
        
        let id = self.graph.edges.next_id();
        let edge = Edge::from_spec(id, &spec);
        for endpoint in [source, target] {
            if let Some(vertex) = self.graph.vertices.get_mut(endpoint) {
                vertex.register(&edge);
            }
        }
        self.graph.edges.insert(edge);
        self.events.push(GraphEvent::EdgeAdded(id));
        trace!("edge {} added: {} -> {} ({:?})", id, source, target, spec.edge_type);
        Ok(Some(id))
    }
    
    /// Deletes an edge object whatever its direction.
    pub fn remove_edge(&mut self, id: EdgeId) -> bool {
        self.delete_edge(id)
    }
    
    /// Deletes the edge joining `a` and `b`, direction-agnostic.
    pub fn remove_edge_between(&mut self, a: VertexId, b: VertexId) -> bool {
        match self.graph.edge_between(a, b) {
            Some(id) => self.delete_edge(id),
            None => false,
        }
    }
    
    /// Removes only the `source -> target` direction of a connection.
    ///
    /// An undirected edge is demoted so that `target -> source` survives;
    /// a directed edge with exactly this direction is deleted; an edge
    /// pointing the other way is left alone. Returns whether anything
    /// changed.
    pub fn remove_directed_edge(&mut self, source: VertexId, target: VertexId) -> bool {
        let Some(id) = self.graph.edge_between(source, target) else {
            return false;
        };
        let Some(edge) = self.graph.edges.get(id) else {
            return false;
        };
        if !edge.is_directed() {
            match edge.direction_for(target, source) {
                Some(surviving) => {
                    self.redirect(id, surviving);
                    true
                }
                None => false,
            }
        } else if edge.source() == source && edge.target() == target {
            self.delete_edge(id)
        } else {
            false
        }
    }
    
    /// Changes an edge's direction tag in place, re-registering it in both
    /// endpoints' adjacency maps.
    pub fn set_edge_direction(&mut self, id: EdgeId, direction: EdgeDirection) -> GraphResult<()> {
        if !self.graph.contains_edge(id) {
            return Err(GraphError::EdgeNotFound(id));
        }
        self.redirect(id, direction);
        Ok(())
    }
    
    pub fn set_edge_weight(&mut self, id: EdgeId, weight: Option<f64>) -> GraphResult<()> {
        let edge = self.graph.edges.get_mut(id).ok_or(GraphError::EdgeNotFound(id))?;
        edge.weight = weight;
        Ok(())
    }
    
    pub fn set_edge_label(&mut self, id: EdgeId, label: Option<String>) -> GraphResult<()> {
        let edge = self.graph.edges.get_mut(id).ok_or(GraphError::EdgeNotFound(id))?;
        edge.label = label;
        Ok(())
    }
    
    fn redirect(&mut self, id: EdgeId, direction: EdgeDirection) {
        let Some(edge) = self.graph.edges.get_mut(id) else {
            return;
        };
        let from = edge.direction;
        if from == direction {
            return;
        }
        edge.direction = direction;
        let edge = edge.clone();
        
        if let Some(a) = self.graph.vertices.get_mut(edge.a) {
            a.unregister(edge.b);
            a.register(&edge);
        }
        if let Some(b) = self.graph.vertices.get_mut(edge.b) {
            b.unregister(edge.a);
            b.register(&edge);
        }
        self.events.push(GraphEvent::EdgeRedirected {
            edge: id,
            from,
            to: direction,
        });
        trace!("edge {} redirected {:?} -> {:?}", id, from, direction);
    }
    
    fn delete_edge(&mut self, id: EdgeId) -> bool {
        let Some(edge) = self.graph.edges.remove(id) else {
            return false;
        };
        if let Some(a) = self.graph.vertices.get_mut(edge.a) {
            a.unregister(edge.b);
        }
        if let Some(b) = self.graph.vertices.get_mut(edge.b) {
            b.unregister(edge.a);
        }
        self.events.push(GraphEvent::EdgeRemoved {
            edge: id,
            a: edge.a,
            b: edge.b,
        });
        true
    }
    
    // ========================================================================
    // BULK
    // ========================================================================
    
    /// Removes every vertex outside the largest connected component.
    ///
    /// Returns the number of vertices removed.
    pub fn reduce_to_largest_component(&mut self) -> usize {
        let keep: HashSet<VertexId> = self.graph.largest_connected_component().into_iter().collect();
        let doomed: Vec<VertexId> = self
            .graph
            .vertex_ids()
            .into_iter()
            .filter(|v| !keep.contains(v))
            .collect();
        for v in &doomed {
            self.remove_vertex(*v);
        }
        doomed.len()
    }
    
    /// Removes all vertices and edges, reporting each removal.
    pub fn clear(&mut self) {
        for v in self.graph.vertex_ids() {
            self.remove_vertex(v);
        }
    }
}

impl Deref for GraphMut<'_> {
    type Target = Graph;
    
    fn deref(&self) -> &Graph {
        self.graph
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    
    fn with_graph<R>(f: impl FnOnce(&mut GraphMut<'_>) -> R) -> (R, Vec<GraphEvent>) {
        let mut graph = Graph::new();
        let mut events = Vec::new();
        let rng = Mutex::new(ChaCha8Rng::seed_from_u64(1));
        let result = f(&mut GraphMut::new(&mut graph, &mut events, &rng));
        (result, events)
    }
    
    #[test]
    fn test_self_loop_ignored() {
        let (result, _) = with_graph(|g| {
            let a = g.add_vertex(None);
            let e = g.connect(a, a, EdgeType::Undirected).unwrap();
            (e, g.edge_count())
        });
        assert_eq!(result, (None, 0));
    }
    
    #[test]
    fn test_missing_endpoint_rejected() {
        let (result, _) = with_graph(|g| {
            let a = g.add_vertex(None);
            g.connect(a, VertexId(99), EdgeType::Directed)
        });
        assert_eq!(result, Err(GraphError::VertexNotFound(VertexId(99))));
    }
    
    #[test]
    fn test_undirected_add_is_idempotent() {
        let ((first, second, count), _) = with_graph(|g| {
            let a = g.add_vertex(None);
            let b = g.add_vertex(None);
            let first = g.connect(a, b, EdgeType::Undirected).unwrap();
            let second = g.connect(b, a, EdgeType::Undirected).unwrap();
            (first, second, g.edge_count())
        });
        assert_eq!(first, second);
        assert_eq!(count, 1);
    }
    
    #[test]
    fn test_reverse_directed_promotes() {
        let ((first, second), events) = with_graph(|g| {
            let a = g.add_vertex(None);
            let b = g.add_vertex(None);
            let first = g.connect(a, b, EdgeType::Directed).unwrap().unwrap();
            let second = g.connect(b, a, EdgeType::Directed).unwrap().unwrap();
            
            assert_eq!(g.edge_count(), 1);
            let edge = g.edge(first).unwrap();
            assert!(!edge.is_directed());
            for (x, y) in [(a, b), (b, a)] {
                let v = g.vertex(x).unwrap();
                assert!(v.is_successor(y));
                assert!(v.is_predecessor(y));
            }
            assert!(g.check_invariants());
            (first, second)
        });
        assert_eq!(first, second);
        assert!(matches!(
            events.last(),
            Some(GraphEvent::EdgeRedirected { to: EdgeDirection::Undirected, .. })
        ));
    }
    
    #[test]
    fn test_undirected_over_same_direction_promotes() {
        with_graph(|g| {
            let a = g.add_vertex(None);
            let b = g.add_vertex(None);
            let e = g.connect(a, b, EdgeType::Directed).unwrap();
            assert_eq!(g.connect(a, b, EdgeType::Undirected).unwrap(), e);
            assert!(!g.edge(e.unwrap()).unwrap().is_directed());
        });
    }
    
    #[test]
    fn test_directed_duplicate_is_noop() {
        let (_, events) = with_graph(|g| {
            let a = g.add_vertex(None);
            let b = g.add_vertex(None);
            g.connect(a, b, EdgeType::Directed).unwrap();
            g.connect(a, b, EdgeType::Directed).unwrap();
            assert_eq!(g.edge_count(), 1);
            assert!(g.edge(EdgeId(0)).unwrap().is_directed());
        });
        assert_eq!(events.len(), 3);
    }
    
    #[test]
    fn test_demotion_then_removal() {
        with_graph(|g| {
            let a = g.add_vertex(None);
            let b = g.add_vertex(None);
            let e = g.connect(a, b, EdgeType::Undirected).unwrap().unwrap();
            
            assert!(g.remove_directed_edge(a, b));
            let edge = g.edge(e).unwrap();
            assert_eq!(g.edge_count(), 1);
            assert_eq!((edge.source(), edge.target()), (b, a));
            assert!(g.check_invariants());
            
            // the wrong direction does nothing
            assert!(!g.remove_directed_edge(a, b));
            assert!(g.remove_directed_edge(b, a));
            assert_eq!(g.edge_count(), 0);
            assert_eq!(g.vertex(a).unwrap().degree(), 0);
        });
    }
    
    #[test]
    fn test_remove_edge_between_is_direction_agnostic() {
        with_graph(|g| {
            let a = g.add_vertex(None);
            let b = g.add_vertex(None);
            g.connect(a, b, EdgeType::Directed).unwrap();
            assert!(g.remove_edge_between(b, a));
            assert_eq!(g.edge_count(), 0);
        });
    }
    
    #[test]
    fn test_remove_vertex_event_order() {
        let (_, events) = with_graph(|g| {
            let a = g.add_vertex(None);
            let b = g.add_vertex(None);
            let c = g.add_vertex(None);
            g.connect(a, b, EdgeType::Undirected).unwrap();
            g.connect(c, a, EdgeType::Directed).unwrap();
            assert!(g.remove_vertex(a));
            assert_eq!(g.edge_count(), 0);
            assert!(g.check_invariants());
        });
        let tail = &events[events.len() - 3..];
        assert!(matches!(tail[0], GraphEvent::EdgeRemoved { .. }));
        assert!(matches!(tail[1], GraphEvent::EdgeRemoved { .. }));
        assert_eq!(tail[2], GraphEvent::VertexRemoved(VertexId(0)));
    }
    
    #[test]
    fn test_label_index_first_registrant_wins() {
        with_graph(|g| {
            let a = g.add_vertex(Some("x"));
            let b = g.add_vertex(Some("x"));
            assert_eq!(g.search_vertex("x"), Some(a));
            g.remove_vertex(a);
            assert_eq!(g.search_vertex("x"), Some(b));
            g.set_label(b, "y").unwrap();
            assert_eq!(g.search_vertex("x"), None);
            assert_eq!(g.search_vertex("y"), Some(b));
        });
    }
    
    #[test]
    fn test_set_edge_direction_reregisters() {
        with_graph(|g| {
            let a = g.add_vertex(None);
            let b = g.add_vertex(None);
            let e = g.connect(a, b, EdgeType::Directed).unwrap().unwrap();
            g.set_edge_direction(e, EdgeDirection::BtoA).unwrap();
            assert!(g.vertex(b).unwrap().is_successor(a));
            assert!(!g.vertex(a).unwrap().is_successor(b));
            assert!(g.check_invariants());
        });
    }
    
    #[test]
    fn test_edge_metadata() {
        with_graph(|g| {
            let a = g.add_vertex(None);
            let b = g.add_vertex(None);
            let e = g
                .add_edge(EdgeSpec::directed(a, b).with_weight(2.5).with_label("road"))
                .unwrap()
                .unwrap();
            assert_eq!(g.edge(e).unwrap().weight(), Some(2.5));
            assert_eq!(g.edge(e).unwrap().label(), Some("road"));
            
            g.set_edge_weight(e, None).unwrap();
            g.set_edge_label(e, Some("rail".to_string())).unwrap();
            assert_eq!(g.edge(e).unwrap().weight(), None);
            assert_eq!(g.edge(e).unwrap().label(), Some("rail"));
            
            let missing = EdgeId(42);
            assert_eq!(g.set_edge_weight(missing, Some(1.0)), Err(GraphError::EdgeNotFound(missing)));
            assert_eq!(g.set_edge_label(missing, None), Err(GraphError::EdgeNotFound(missing)));
        });
    }
    
    #[test]
    fn test_set_tag() {
        with_graph(|g| {
            let a = g.add_vertex(Some("a"));
            assert_eq!(g.vertex(a).unwrap().tag(), None);
            g.set_tag(a, Some("hub".to_string())).unwrap();
            assert_eq!(g.vertex(a).unwrap().tag(), Some("hub"));
            g.set_tag(a, None).unwrap();
            assert_eq!(g.vertex(a).unwrap().tag(), None);
            assert_eq!(g.set_tag(VertexId(9), None), Err(GraphError::VertexNotFound(VertexId(9))));
        });
    }
}
