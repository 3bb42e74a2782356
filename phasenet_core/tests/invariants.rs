//! Property tests for the adjacency invariants under random mutation
//! sequences.

use phasenet_core::{EdgeType, Network, VertexId};
use proptest::prelude::*;

#[derive(Debug, Clone)]
enum Op {
    AddUndirected(usize, usize),
    AddDirected(usize, usize),
    RemoveDirected(usize, usize),
    RemoveBetween(usize, usize),
    RemoveVertex(usize),
    AddVertex,
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        (0..12usize, 0..12usize).prop_map(|(a, b)| Op::AddUndirected(a, b)),
        (0..12usize, 0..12usize).prop_map(|(a, b)| Op::AddDirected(a, b)),
        (0..12usize, 0..12usize).prop_map(|(a, b)| Op::RemoveDirected(a, b)),
        (0..12usize, 0..12usize).prop_map(|(a, b)| Op::RemoveBetween(a, b)),
        (0..12usize).prop_map(Op::RemoveVertex),
        Just(Op::AddVertex),
    ]
}

proptest! {
    #[test]
    fn prop_invariants_hold(ops in proptest::collection::vec(op(), 1..80)) {
        let net = Network::with_seed(1);
        let mut ids: Vec<VertexId> = net
            .mutate(|g| (0..12).map(|_| g.add_vertex(None)).collect())
            .unwrap();
        
        for op in ops {
            let pick = |i: usize| ids[i % ids.len()];
            match op {
                Op::AddUndirected(a, b) if !ids.is_empty() => {
                    let _ = net.create_edge(pick(a), pick(b), EdgeType::Undirected);
                }
                Op::AddDirected(a, b) if !ids.is_empty() => {
                    let _ = net.create_edge(pick(a), pick(b), EdgeType::Directed);
                }
                Op::RemoveDirected(a, b) if !ids.is_empty() => {
                    net.remove_directed_edge(pick(a), pick(b)).unwrap();
                }
                Op::RemoveBetween(a, b) if !ids.is_empty() => {
                    net.remove_edge_between(pick(a), pick(b)).unwrap();
                }
                Op::RemoveVertex(a) if !ids.is_empty() => {
                    let v = pick(a);
                    net.remove_vertex(v).unwrap();
                    ids.retain(|x| *x != v);
                }
                Op::AddVertex => ids.push(net.create_vertex(None).unwrap()),
                _ => {}
            }
            
            let guard = net.read();
            prop_assert!(guard.check_invariants());
            for v in guard.vertices() {
                prop_assert_eq!(
                    v.successors().count(),
                    v.undirected_edges().count() + v.outgoing_edges().count()
                );
            }
            // at most one edge per unordered pair
            let mut pairs = std::collections::HashSet::new();
            for e in guard.edges() {
                let key = if e.a() < e.b() { (e.a(), e.b()) } else { (e.b(), e.a()) };
                prop_assert!(pairs.insert(key));
            }
        }
    }
}
