//! Standard topologies.
//!
//! Generators are write-path helpers: they take the [`GraphMut`] of an
//! ongoing [`Network::mutate`](crate::Network::mutate) call, so several of
//! them can be combined into one write section. Random choices come from
//! the network's own random source.

use rand::Rng;

use crate::edge::EdgeSpec;
use crate::error::{GraphError, GraphResult};
use crate::ids::VertexId;
use crate::mutation::GraphMut;

/// Adds `n` isolated vertices.
pub fn empty(g: &mut GraphMut<'_>, n: usize) -> Vec<VertexId> {
    (0..n).map(|_| g.add_vertex(None)).collect()
}

/// Adds a complete undirected graph on `n` new vertices.
pub fn complete(g: &mut GraphMut<'_>, n: usize) -> GraphResult<Vec<VertexId>> {
    let vertices = empty(g, n);
    for (i, &a) in vertices.iter().enumerate() {
        for &b in &vertices[i + 1..] {
            g.add_edge(EdgeSpec::undirected(a, b))?;
        }
    }
    Ok(vertices)
}

/// Adds a ring where every vertex is joined to its `k` nearest neighbours
/// on each side.
pub fn ring_lattice(g: &mut GraphMut<'_>, n: usize, k: usize) -> GraphResult<Vec<VertexId>> {
    if n > 0 && 2 * k >= n {
        return Err(GraphError::invalid(format!(
            "ring lattice needs n > 2k (n={n}, k={k})"
        )));
    }
    let vertices = empty(g, n);
    for i in 0..n {
        for offset in 1..=k {
            g.add_edge(EdgeSpec::undirected(vertices[i], vertices[(i + offset) % n]))?;
        }
    }
    Ok(vertices)
}

/// Adds a G(n, p) random graph: every unordered pair is joined
/// independently with probability `p`.
pub fn erdos_renyi(g: &mut GraphMut<'_>, n: usize, p: f64) -> GraphResult<Vec<VertexId>> {
    if !(0.0..=1.0).contains(&p) {
        return Err(GraphError::invalid(format!("edge probability {p} outside [0, 1]")));
    }
    let vertices = empty(g, n);
    for (i, &a) in vertices.iter().enumerate() {
        for &b in &vertices[i + 1..] {
            if g.with_rng(|rng| rng.gen_bool(p)) {
                g.add_edge(EdgeSpec::undirected(a, b))?;
            }
        }
    }
    Ok(vertices)
}

/// Adds a preferential-attachment graph.
///
/// Starts from a complete core of `m + 1` vertices; each further vertex
/// attaches to `m` distinct existing vertices chosen with probability
/// proportional to their degree.
pub fn barabasi_albert(g: &mut GraphMut<'_>, n: usize, m: usize) -> GraphResult<Vec<VertexId>> {
    if m == 0 || n <= m {
        return Err(GraphError::invalid(format!(
            "preferential attachment needs 0 < m < n (n={n}, m={m})"
        )));
    }
    let mut vertices = complete(g, m + 1)?;
    
    // every vertex appears once per incident edge
    let mut stubs: Vec<VertexId> = Vec::new();
    for &v in &vertices {
        stubs.extend(std::iter::repeat(v).take(g.degree(v)));
    }
    
    while vertices.len() < n {
        let mut targets: Vec<VertexId> = Vec::with_capacity(m);
        while targets.len() < m {
            let pick = stubs[g.with_rng(|rng| rng.gen_range(0..stubs.len()))];
            if !targets.contains(&pick) {
                targets.push(pick);
            }
        }
        
        let v = g.add_vertex(None);
        for &t in &targets {
            g.add_edge(EdgeSpec::undirected(v, t))?;
            stubs.push(v);
            stubs.push(t);
        }
        vertices.push(v);
    }
    Ok(vertices)
}

/// Adds a `rows x cols` lattice with 4-neighbourhood, row-major order.
pub fn grid(g: &mut GraphMut<'_>, rows: usize, cols: usize) -> GraphResult<Vec<VertexId>> {
    let vertices = empty(g, rows * cols);
    for r in 0..rows {
        for c in 0..cols {
            let v = vertices[r * cols + c];
            if c + 1 < cols {
                g.add_edge(EdgeSpec::undirected(v, vertices[r * cols + c + 1]))?;
            }
            if r + 1 < rows {
                g.add_edge(EdgeSpec::undirected(v, vertices[(r + 1) * cols + c]))?;
            }
        }
    }
    Ok(vertices)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Network;
    
    #[test]
    fn test_complete_edge_count() {
        let net = Network::new();
        net.mutate(|g| complete(g, 6)).unwrap().unwrap();
        assert_eq!(net.edge_count(), 15);
    }
    
    #[test]
    fn test_ring_lattice_regular() {
        let net = Network::new();
        net.mutate(|g| ring_lattice(g, 10, 2)).unwrap().unwrap();
        let guard = net.read();
        assert_eq!(guard.edge_count(), 20);
        assert!(guard.vertices().all(|v| v.degree() == 4));
    }
    
    #[test]
    fn test_ring_lattice_rejects_dense() {
        let net = Network::new();
        let result = net.mutate(|g| ring_lattice(g, 4, 2)).unwrap();
        assert!(matches!(result, Err(GraphError::InvalidParameters(_))));
    }
    
    #[test]
    fn test_erdos_renyi_extremes() {
        let net = Network::with_seed(5);
        net.mutate(|g| erdos_renyi(g, 8, 1.0)).unwrap().unwrap();
        assert_eq!(net.edge_count(), 28);
        
        let net = Network::with_seed(5);
        net.mutate(|g| erdos_renyi(g, 8, 0.0)).unwrap().unwrap();
        assert_eq!(net.edge_count(), 0);
    }
    
    #[test]
    fn test_barabasi_albert_counts() {
        let net = Network::with_seed(9);
        net.mutate(|g| barabasi_albert(g, 50, 2)).unwrap().unwrap();
        let guard = net.read();
        assert_eq!(guard.vertex_count(), 50);
        // core triangle plus two edges per added vertex
        assert_eq!(guard.edge_count(), 3 + 2 * 47);
        assert!(guard.check_invariants());
        assert_eq!(guard.largest_connected_component().len(), 50);
    }
    
    #[test]
    fn test_grid() {
        let net = Network::new();
        net.mutate(|g| grid(g, 3, 4)).unwrap().unwrap();
        assert_eq!(net.edge_count(), 3 * 3 + 2 * 4);
    }
}
