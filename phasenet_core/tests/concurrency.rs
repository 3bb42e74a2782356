//! Readers and a writer sharing one network across threads.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;

use phasenet_core::{EdgeType, Network, VertexId};

#[test]
fn test_concurrent_readers_single_writer() {
    let net = Network::shared(17);
    let vertices: Vec<VertexId> = net
        .mutate(|g| (0..100).map(|_| g.add_vertex(None)).collect())
        .unwrap();
    
    let done = Arc::new(AtomicBool::new(false));
    let mut readers = Vec::new();
    for _ in 0..8 {
        let net = net.clone();
        let done = done.clone();
        readers.push(thread::spawn(move || {
            let mut passes = 0u64;
            while !done.load(Ordering::Acquire) {
                let guard = net.read();
                let degree_sum: usize = guard.vertices().map(|v| v.degree()).sum();
                assert_eq!(degree_sum, 2 * guard.edge_count());
                assert!(guard.check_invariants());
                passes += 1;
            }
            passes
        }));
    }
    
    // the writer draws from the network's own source, outside any read
    let mut accepted = std::collections::HashSet::new();
    for _ in 0..1000 {
        let a = vertices[net.with_rng(|rng| rand::Rng::gen_range(rng, 0..vertices.len()))];
        let b = vertices[net.with_rng(|rng| rand::Rng::gen_range(rng, 0..vertices.len()))];
        if let Some(edge) = net.create_edge(a, b, EdgeType::Undirected).unwrap() {
            accepted.insert(edge);
        }
    }
    done.store(true, Ordering::Release);
    
    for reader in readers {
        reader.join().expect("reader panicked");
    }
    assert_eq!(net.edge_count(), accepted.len());
    assert!(net.read().check_invariants());
}

#[test]
fn test_reader_threads_cannot_trip_writer_check() {
    let net = Network::shared(3);
    let a = net.create_vertex(None).unwrap();
    
    let guard = net.read();
    // another thread holds no read guard, so its mutation only waits
    let other = {
        let net = net.clone();
        thread::spawn(move || net.create_vertex(None).map(|_| ()))
    };
    assert!(guard.contains_vertex(a));
    drop(guard);
    assert!(other.join().unwrap().is_ok());
    assert_eq!(net.vertex_count(), 2);
}
