//! Per-thread bookkeeping of held graph locks.
//!
//! `parking_lot::RwLock` is neither re-entrant nor aware of who holds it.
//! Each thread therefore keeps a small registry, keyed by network instance,
//! of how many read guards it holds and whether it is inside a write
//! section. Mutations consult it to fail fast instead of deadlocking.

use std::cell::RefCell;
use std::collections::HashMap;
use std::ops::Deref;

use parking_lot::RwLockReadGuard;
use rand::Rng;

use crate::graph::Graph;
use crate::ids::{EdgeId, VertexId};
use crate::network::Network;

#[derive(Debug, Default, Clone, Copy)]
struct Held {
    reads: usize,
    writing: bool,
}

thread_local! {
    static HELD: RefCell<HashMap<u64, Held>> = RefCell::new(HashMap::new());
}

fn with_held<R>(instance: u64, f: impl FnOnce(&mut Held) -> R) -> R {
    HELD.with(|held| {
        let mut map = held.borrow_mut();
        let entry = map.entry(instance).or_default();
        let result = f(entry);
        if entry.reads == 0 && !entry.writing {
            map.remove(&instance);
        }
        result
    })
}

/// Number of read guards the current thread holds on `instance`.
pub(crate) fn reads_held(instance: u64) -> usize {
    HELD.with(|held| held.borrow().get(&instance).map_or(0, |h| h.reads))
}

/// Whether the current thread is inside a write section of `instance`.
pub(crate) fn writing(instance: u64) -> bool {
    HELD.with(|held| held.borrow().get(&instance).is_some_and(|h| h.writing))
}

/// Registers a read guard and returns how many were held before.
pub(crate) fn enter_read(instance: u64) -> usize {
    with_held(instance, |h| {
        let before = h.reads;
        h.reads += 1;
        before
    })
}

pub(crate) fn exit_read(instance: u64) {
    with_held(instance, |h| h.reads = h.reads.saturating_sub(1));
}

/// Marks the current thread as writing until dropped.
pub(crate) struct WriteMarker {
    instance: u64,
}

impl WriteMarker {
    pub(crate) fn enter(instance: u64) -> Self {
        with_held(instance, |h| h.writing = true);
        Self { instance }
    }
}

impl Drop for WriteMarker {
    fn drop(&mut self) {
        with_held(self.instance, |h| h.writing = false);
    }
}

/// Shared, read-only access to a network's topology.
///
/// While any guard is alive, mutations are blocked for other threads and
/// rejected with [`GraphError::ReentrantMutation`](crate::GraphError) for
/// the owning thread. The guard is `!Send`: it must be dropped on the
/// thread that acquired it, but it may be shared by reference with scoped
/// worker threads for a parallel traversal.
pub struct NetworkReadGuard<'a> {
    network: &'a Network,
    graph: RwLockReadGuard<'a, Graph>,
}

impl<'a> NetworkReadGuard<'a> {
    pub(crate) fn new(network: &'a Network, graph: RwLockReadGuard<'a, Graph>) -> Self {
        Self { network, graph }
    }
    
    /// The network this guard reads.
    pub fn network(&self) -> &'a Network {
        self.network
    }
    
    /// Uniformly random vertex, drawn from the network's random source.
    pub fn random_vertex(&self) -> Option<VertexId> {
        let n = self.graph.vertex_count();
        if n == 0 {
            return None;
        }
        let pos = self.network.with_rng(|rng| rng.gen_range(0..n));
        self.graph.vertices.nth(pos)
    }
    
    /// Uniformly random vertex different from `v`.
    pub fn random_vertex_other_than(&self, v: VertexId) -> Option<VertexId> {
        let n = self.graph.vertex_count();
        if !self.graph.contains_vertex(v) {
            return self.random_vertex();
        }
        if n < 2 {
            return None;
        }
        let pos = self.network.with_rng(|rng| rng.gen_range(0..n - 1));
        let candidate = self.graph.vertices.nth(pos)?;
        if candidate == v {
            self.graph.vertices.nth(n - 1)
        } else {
            Some(candidate)
        }
    }
    
    /// Uniformly random edge, drawn from the network's random source.
    pub fn random_edge(&self) -> Option<EdgeId> {
        let n = self.graph.edge_count();
        if n == 0 {
            return None;
        }
        let pos = self.network.with_rng(|rng| rng.gen_range(0..n));
        self.graph.edges.nth(pos)
    }
    
    /// Uniformly random successor of `v`.
    pub fn random_successor(&self, v: VertexId) -> Option<VertexId> {
        let vertex = self.graph.vertex(v)?;
        let n = vertex.out_degree();
        if n == 0 {
            return None;
        }
        let pos = self.network.with_rng(|rng| rng.gen_range(0..n));
        vertex.successors().nth(pos)
    }
}

impl Deref for NetworkReadGuard<'_> {
    type Target = Graph;
    
    fn deref(&self) -> &Graph {
        &self.graph
    }
}

impl Drop for NetworkReadGuard<'_> {
    fn drop(&mut self) {
        exit_read(self.network.instance());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    
    #[test]
    fn test_registry_counts_reads() {
        let instance = u64::MAX - 7;
        assert_eq!(reads_held(instance), 0);
        assert_eq!(enter_read(instance), 0);
        assert_eq!(enter_read(instance), 1);
        assert_eq!(reads_held(instance), 2);
        exit_read(instance);
        exit_read(instance);
        assert_eq!(reads_held(instance), 0);
    }
    
    #[test]
    fn test_write_marker_scoped() {
        let instance = u64::MAX - 8;
        {
            let _marker = WriteMarker::enter(instance);
            assert!(writing(instance));
        }
        assert!(!writing(instance));
    }
    
    #[test]
    fn test_registry_is_per_thread() {
        let instance = u64::MAX - 9;
        enter_read(instance);
        let other = std::thread::spawn(move || reads_held(instance)).join().unwrap();
        assert_eq!(other, 0);
        exit_read(instance);
    }
}
