//! The shared, thread-safe network.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use tracing::{debug, trace};

use crate::edge::{Edge, EdgeDirection, EdgeSpec, EdgeType};
use crate::error::{GraphError, GraphResult};
use crate::events::{dispatch, GraphEvent, GraphObserver};
use crate::graph::Graph;
use crate::guard::{self, NetworkReadGuard, WriteMarker};
use crate::ids::{EdgeId, VertexId};
use crate::mutation::GraphMut;
use crate::vertex::Vertex;

static NEXT_INSTANCE: AtomicU64 = AtomicU64::new(1);

/// Configuration for a network.
#[derive(Debug, Clone)]
pub struct NetworkConfig {
    /// Seed of the network's random source
    pub seed: u64,
    
    /// Name used in log output
    pub name: String,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            seed: 42,
            name: "network".to_string(),
        }
    }
}

impl NetworkConfig {
    /// Sets the seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }
    
    /// Sets the name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }
}

/// A mutable directed/undirected graph shared between worker threads.
///
/// # Locking
///
/// - Topology sits behind a writer-preferring reader/writer lock. Any
///   number of [`NetworkReadGuard`]s may coexist; a mutation waits for them
///   to drain and blocks new readers while it runs.
/// - A thread that holds a read guard and then tries to mutate the same
///   network gets [`GraphError::ReentrantMutation`] instead of deadlocking.
/// - The random source has its own mutex so it can be drawn from inside
///   read sections.
/// - Observers are notified after the write lock has been released.
pub struct Network {
    instance: u64,
    config: NetworkConfig,
    graph: RwLock<Graph>,
    rng: Mutex<ChaCha8Rng>,
    observers: RwLock<Vec<Arc<dyn GraphObserver>>>,
}

impl Network {
    /// Creates an empty network with the default configuration.
    pub fn new() -> Self {
        Self::with_config(NetworkConfig::default())
    }
    
    /// Creates an empty network whose random source is seeded with `seed`.
    pub fn with_seed(seed: u64) -> Self {
        Self::with_config(NetworkConfig::default().with_seed(seed))
    }
    
    pub fn with_config(config: NetworkConfig) -> Self {
        let instance = NEXT_INSTANCE.fetch_add(1, Ordering::Relaxed);
        debug!("Creating network '{}' (instance={}, seed={})", config.name, instance, config.seed);
        Self {
            instance,
            rng: Mutex::new(ChaCha8Rng::seed_from_u64(config.seed)),
            config,
            graph: RwLock::new(Graph::new()),
            observers: RwLock::new(Vec::new()),
        }
    }
    
    /// Creates an Arc-wrapped network for sharing.
    pub fn shared(seed: u64) -> Arc<Self> {
        Arc::new(Self::with_seed(seed))
    }
    
    /// Process-unique id of this network instance.
    pub fn instance(&self) -> u64 {
        self.instance
    }
    
    pub fn seed(&self) -> u64 {
        self.config.seed
    }
    
    pub fn name(&self) -> &str {
        &self.config.name
    }
    
    // ========================================================================
    // LOCKING
    // ========================================================================
    
    /// Acquires a read guard.
    ///
    /// Nested guards on the same thread are taken recursively so they never
    /// queue behind a waiting writer.
    ///
    /// # Panics
    ///
    /// When called from inside [`Network::mutate`] on the same network; the
    /// [`GraphMut`] handed to the closure already reads the graph.
    pub fn read(&self) -> NetworkReadGuard<'_> {
        assert!(
            !guard::writing(self.instance),
            "Network::read() called inside mutate() on network {}; read through GraphMut instead",
            self.instance
        );
        let before = guard::enter_read(self.instance);
        let graph = if before > 0 {
            self.graph.read_recursive()
        } else {
            self.graph.read()
        };
        NetworkReadGuard::new(self, graph)
    }
    
    /// Runs `f` with exclusive access to the topology.
    ///
    /// Everything `f` does is one write section; events are dispatched in
    /// commit order once it returns and the lock has been released.
    pub fn mutate<R>(&self, f: impl FnOnce(&mut GraphMut<'_>) -> R) -> GraphResult<R> {
        let held = guard::reads_held(self.instance);
        if held > 0 || guard::writing(self.instance) {
            return Err(GraphError::ReentrantMutation {
                network: self.instance,
                held,
            });
        }
        
        let mut events = Vec::new();
        let result = {
            let _marker = WriteMarker::enter(self.instance);
            let mut graph = self.graph.write();
            let mut view = GraphMut::new(&mut graph, &mut events, &self.rng);
            f(&mut view)
        };
        self.publish(&events);
        Ok(result)
    }
    
    /// Runs `f` with the network's random source.
    ///
    /// Every random choice about this network goes through here; worker
    /// threads must not keep private generators seeded from it.
    pub fn with_rng<R>(&self, f: impl FnOnce(&mut ChaCha8Rng) -> R) -> R {
        f(&mut self.rng.lock())
    }
    
    // ========================================================================
    // OBSERVERS
    // ========================================================================
    
    /// Registers an observer for vertex/edge notifications.
    pub fn subscribe(&self, observer: Arc<dyn GraphObserver>) {
        self.observers.write().push(observer);
    }
    
    /// Removes a previously registered observer (compared by pointer).
    pub fn unsubscribe(&self, observer: &Arc<dyn GraphObserver>) -> bool {
        let mut observers = self.observers.write();
        let before = observers.len();
        observers.retain(|o| !Arc::ptr_eq(o, observer));
        observers.len() != before
    }
    
    fn publish(&self, events: &[GraphEvent]) {
        if events.is_empty() {
            return;
        }
        let observers: Vec<Arc<dyn GraphObserver>> = self.observers.read().clone();
        trace!("network {}: dispatching {} events to {} observers", self.instance, events.len(), observers.len());
        for event in events {
            for observer in &observers {
                dispatch(observer.as_ref(), event);
            }
        }
    }
    
    // ========================================================================
    // MUTATION SHORTHANDS
    // ========================================================================
    
    /// Adds a vertex, labelled with its id unless a label is given.
    pub fn create_vertex(&self, label: Option<&str>) -> GraphResult<VertexId> {
        self.mutate(|g| g.add_vertex(label))
    }
    
    /// Connects two vertices under the merge rules.
    pub fn create_edge(
        &self,
        source: VertexId,
        target: VertexId,
        edge_type: EdgeType,
    ) -> GraphResult<Option<EdgeId>> {
        self.mutate(|g| g.connect(source, target, edge_type))?
    }
    
    pub fn add_edge(&self, spec: EdgeSpec) -> GraphResult<Option<EdgeId>> {
        self.mutate(|g| g.add_edge(spec))?
    }
    
    pub fn remove_vertex(&self, id: VertexId) -> GraphResult<bool> {
        self.mutate(|g| g.remove_vertex(id))
    }
    
    pub fn remove_edge(&self, id: EdgeId) -> GraphResult<bool> {
        self.mutate(|g| g.remove_edge(id))
    }
    
    pub fn remove_edge_between(&self, a: VertexId, b: VertexId) -> GraphResult<bool> {
        self.mutate(|g| g.remove_edge_between(a, b))
    }
    
    pub fn remove_directed_edge(&self, source: VertexId, target: VertexId) -> GraphResult<bool> {
        self.mutate(|g| g.remove_directed_edge(source, target))
    }
    
    pub fn set_label(&self, id: VertexId, label: &str) -> GraphResult<()> {
        self.mutate(|g| g.set_label(id, label))?
    }
    
    pub fn set_edge_direction(&self, id: EdgeId, direction: EdgeDirection) -> GraphResult<()> {
        self.mutate(|g| g.set_edge_direction(id, direction))?
    }
    
    pub fn reduce_to_largest_component(&self) -> GraphResult<usize> {
        self.mutate(|g| g.reduce_to_largest_component())
    }
    
    pub fn clear(&self) -> GraphResult<()> {
        self.mutate(|g| g.clear())
    }
    
    // ========================================================================
    // QUERY SHORTHANDS
    // ========================================================================
    
    pub fn vertex_count(&self) -> usize {
        self.read().vertex_count()
    }
    
    pub fn edge_count(&self) -> usize {
        self.read().edge_count()
    }
    
    pub fn vertex_ids(&self) -> Vec<VertexId> {
        self.read().vertex_ids()
    }
    
    pub fn edge_ids(&self) -> Vec<EdgeId> {
        self.read().edge_ids()
    }
    
    /// Snapshot of a vertex.
    pub fn vertex(&self, id: VertexId) -> Option<Vertex> {
        self.read().vertex(id).cloned()
    }
    
    /// Snapshot of an edge.
    pub fn edge(&self, id: EdgeId) -> Option<Edge> {
        self.read().edge(id).cloned()
    }
    
    pub fn search_vertex(&self, label: &str) -> Option<VertexId> {
        self.read().search_vertex(label)
    }
    
    pub fn random_vertex(&self) -> Option<VertexId> {
        self.read().random_vertex()
    }
    
    pub fn random_vertex_other_than(&self, v: VertexId) -> Option<VertexId> {
        self.read().random_vertex_other_than(v)
    }
    
    pub fn random_edge(&self) -> Option<EdgeId> {
        self.read().random_edge()
    }
    
    pub fn in_same_component(&self, a: VertexId, b: VertexId) -> bool {
        self.read().in_same_component(a, b)
    }
    
    pub fn largest_connected_component(&self) -> Vec<VertexId> {
        self.read().largest_connected_component()
    }
}

impl Default for Network {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Network {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let graph = self.graph.read_recursive();
        f.debug_struct("Network")
            .field("name", &self.config.name)
            .field("instance", &self.instance)
            .field("vertices", &graph.vertex_count())
            .field("edges", &graph.edge_count())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::ChangeTracker;
    
    fn triangle(net: &Network) -> [VertexId; 3] {
        net.mutate(|g| {
            let a = g.add_vertex(Some("a"));
            let b = g.add_vertex(Some("b"));
            let c = g.add_vertex(Some("c"));
            g.connect(a, b, EdgeType::Undirected).unwrap();
            g.connect(b, c, EdgeType::Undirected).unwrap();
            g.connect(c, a, EdgeType::Directed).unwrap();
            [a, b, c]
        })
        .unwrap()
    }
    
    #[test]
    fn test_network_creation() {
        let net = Network::with_seed(7);
        assert_eq!(net.seed(), 7);
        assert_eq!(net.vertex_count(), 0);
        assert_eq!(net.random_vertex(), None);
    }
    
    #[test]
    fn test_mutation_during_read_fails_fast() {
        let net = Network::new();
        let a = net.create_vertex(None).unwrap();
        
        let guard = net.read();
        assert!(guard.contains_vertex(a));
        let err = net.create_vertex(None).unwrap_err();
        assert!(matches!(err, GraphError::ReentrantMutation { held: 1, .. }));
        drop(guard);
        
        assert!(net.create_vertex(None).is_ok());
    }
    
    #[test]
    fn test_nested_mutate_rejected() {
        let net = Network::new();
        let inner = net.mutate(|_| net.create_vertex(None)).unwrap();
        assert!(matches!(inner, Err(GraphError::ReentrantMutation { .. })));
    }
    
    #[test]
    fn test_nested_reads_allowed() {
        let net = Network::new();
        triangle(&net);
        let outer = net.read();
        let inner = net.read();
        assert_eq!(outer.vertex_count(), inner.vertex_count());
    }
    
    #[test]
    fn test_search_vertex() {
        let net = Network::new();
        let [a, _, c] = triangle(&net);
        assert_eq!(net.search_vertex("a"), Some(a));
        assert_eq!(net.search_vertex("c"), Some(c));
        assert_eq!(net.search_vertex("zzz"), None);
    }
    
    #[test]
    fn test_random_vertex_other_than() {
        let net = Network::with_seed(3);
        let [a, _, _] = triangle(&net);
        for _ in 0..100 {
            let v = net.random_vertex_other_than(a).unwrap();
            assert_ne!(v, a);
        }
        
        let lonely = Network::new();
        let only = lonely.create_vertex(None).unwrap();
        assert_eq!(lonely.random_vertex_other_than(only), None);
    }
    
    #[test]
    fn test_random_edge() {
        let empty = Network::with_seed(5);
        assert_eq!(empty.random_edge(), None);
        empty.create_vertex(None).unwrap();
        assert_eq!(empty.random_edge(), None);
        
        let draws = |seed| {
            let net = Network::with_seed(seed);
            triangle(&net);
            let edges = net.edge_ids();
            let picked: Vec<EdgeId> = (0..50).map(|_| net.random_edge().unwrap()).collect();
            assert!(picked.iter().all(|e| edges.contains(e)));
            picked
        };
        let picked = draws(21);
        assert_eq!(picked, draws(21));
        assert!(picked.iter().collect::<std::collections::BTreeSet<_>>().len() > 1);
    }
    
        #[test]
    fn test_random_draws_are_seeded() {
        let draws = |seed| {
            let net = Network::with_seed(seed);
            triangle(&net);
            (0..20).map(|_| net.random_vertex().unwrap()).collect::<Vec<_>>()
        };
        assert_eq!(draws(11), draws(11));
    }
    
    #[test]
    fn test_observers_see_committed_changes() {
        let net = Network::new();
        let tracker = Arc::new(ChangeTracker::new());
        net.subscribe(tracker.clone());
        
        let [a, _, _] = triangle(&net);
        let changes = tracker.drain();
        assert_eq!(changes.added_vertices.len(), 3);
        assert_eq!(changes.added_edges.len(), 3);
        
        net.remove_vertex(a).unwrap();
        let changes = tracker.drain();
        assert_eq!(changes.removed_vertices.len(), 1);
        assert_eq!(changes.removed_edges.len(), 2);
    }
    
    #[test]
    fn test_observer_may_read_during_callback() {
        struct Reader {
            net: Arc<Network>,
            seen: Mutex<Vec<usize>>,
        }
        impl GraphObserver for Reader {
            fn on_vertex_added(&self, _vertex: VertexId) {
                self.seen.lock().push(self.net.vertex_count());
            }
        }
        
        let net = Network::shared(1);
        let reader = Arc::new(Reader {
            net: net.clone(),
            seen: Mutex::new(Vec::new()),
        });
        net.subscribe(reader.clone());
        net.create_vertex(None).unwrap();
        net.create_vertex(None).unwrap();
        assert_eq!(*reader.seen.lock(), vec![1, 2]);
    }
    
    #[test]
    fn test_components() {
        let net = Network::new();
        let [a, _, c] = triangle(&net);
        let (d, e) = net
            .mutate(|g| {
                let d = g.add_vertex(None);
                let e = g.add_vertex(None);
                g.connect(d, e, EdgeType::Directed).unwrap();
                (d, e)
            })
            .unwrap();
        let lonely = net.create_vertex(None).unwrap();
        
        assert!(net.in_same_component(a, c));
        assert!(net.in_same_component(e, d));
        assert!(!net.in_same_component(a, d));
        assert!(!net.in_same_component(a, lonely));
        assert_eq!(net.read().component_of(lonely), vec![lonely]);
        let mut around_a = net.read().component_of(a);
        around_a.sort();
        assert_eq!(around_a.len(), 3);
        assert_eq!(around_a[0], a);
        assert_eq!(net.largest_connected_component().len(), 3);
        assert_eq!(net.read().connected_components().len(), 3);
        
        assert_eq!(net.reduce_to_largest_component().unwrap(), 3);
        assert_eq!(net.vertex_count(), 3);
        assert!(net.read().check_invariants());
    }
    
    #[test]
    fn test_filtered_edge_views() {
        let net = Network::new();
        triangle(&net);
        let guard = net.read();
        assert_eq!(guard.undirected_edges().count(), 2);
        assert_eq!(guard.directed_edges().count(), 1);
        assert_eq!(guard.edges().count(), 3);
    }
    
    #[test]
    fn test_degree_statistics() {
        let net = Network::new();
        triangle(&net);
        let guard = net.read();
        assert!((guard.mean_degree() - 2.0).abs() < 1e-12);
        assert_eq!(guard.degree_distribution().get(&2), Some(&3));
    }
}
