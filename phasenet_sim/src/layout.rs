//! Fruchterman–Reingold force-directed layout.
//!
//! One iteration runs three phases, each parallel and each finished before
//! the next starts:
//!
//! 1. repulsion `k²/d` from every other vertex onto each movable vertex
//! 2. attraction `d²/k` along every edge, accumulated onto both endpoints
//! 3. displacement capped by a temperature that cools linearly to zero,
//!    then clamped into the frame
//!
//! with `k = 0.75 · sqrt(area / n)`. Only "dirty" vertices move: those added
//! since the last call, endpoints of added or removed edges, or everything
//! after [`ForceLayout::invalidate`]. All vertices still repel.

use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use nalgebra::Vector3;
use phasenet_core::{Network, VertexId};
use rand::Rng;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{SimError, SimResult};
use crate::tracking::TrackedNetwork;

/// Distances below this count as coincident.
const MIN_DISTANCE: f64 = 1e-3;

/// Golden angle, spreads coincident vertices in distinct directions.
const GOLDEN_ANGLE: f64 = 2.399_963_229_728_653;

/// Frame and iteration budget of a layout.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LayoutConfig {
    pub width: f64,
    pub height: f64,
    /// 0 for a flat layout
    pub depth: f64,
    /// Iterations per `layout()` call
    pub iterations: usize,
    /// Minimum distance from the frame border
    pub margin: f64,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            width: 1000.0,
            height: 1000.0,
            depth: 0.0,
            iterations: 50,
            margin: 10.0,
        }
    }
}

impl LayoutConfig {
    pub fn with_frame(mut self, width: f64, height: f64) -> Self {
        self.width = width;
        self.height = height;
        self
    }
    
    pub fn with_depth(mut self, depth: f64) -> Self {
        self.depth = depth;
        self
    }
    
    pub fn with_iterations(mut self, iterations: usize) -> Self {
        self.iterations = iterations;
        self
    }
    
    pub fn with_margin(mut self, margin: f64) -> Self {
        self.margin = margin;
        self
    }
    
    pub fn is_flat(&self) -> bool {
        self.depth == 0.0
    }
    
    pub fn area(&self) -> f64 {
        self.width * self.height
    }
    
    /// Longest distance inside the frame.
    pub fn diagonal(&self) -> f64 {
        Vector3::new(self.width, self.height, self.depth).norm()
    }
    
    pub fn validate(&self) -> SimResult<()> {
        if !(self.margin >= 0.0 && self.margin.is_finite()) {
            return Err(SimError::config(format!("margin {} must be non-negative", self.margin)));
        }
        let inner = 2.0 * self.margin;
        if !(self.width > inner && self.height > inner && self.width.is_finite() && self.height.is_finite()) {
            return Err(SimError::config(format!(
                "frame {}x{} leaves no room inside margin {}",
                self.width, self.height, self.margin
            )));
        }
        if !self.is_flat() && !(self.depth > inner && self.depth.is_finite()) {
            return Err(SimError::config(format!(
                "depth {} leaves no room inside margin {}",
                self.depth, self.margin
            )));
        }
        Ok(())
    }
    
    fn lower(&self) -> Vector3<f64> {
        let z = if self.is_flat() { 0.0 } else { self.margin };
        Vector3::new(self.margin, self.margin, z)
    }
    
    fn upper(&self) -> Vector3<f64> {
        let z = if self.is_flat() { 0.0 } else { self.depth - self.margin };
        Vector3::new(self.width - self.margin, self.height - self.margin, z)
    }
    
    fn clamp(&self, p: Vector3<f64>) -> Vector3<f64> {
        p.sup(&self.lower()).inf(&self.upper())
    }
    
    /// Starting temperature, a tenth of the frame.
    fn initial_temperature(&self) -> f64 {
        self.width.max(self.height) / 10.0
    }
}

/// Outcome of one `layout()` call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct LayoutStats {
    /// Vertices that were allowed to move
    pub updated: usize,
    pub iterations: usize,
    /// Ideal edge length used
    pub k: f64,
}

/// Incremental force-directed layout of a shared [`Network`].
pub struct ForceLayout {
    tracked: TrackedNetwork,
    config: LayoutConfig,
    positions: HashMap<VertexId, Vector3<f64>>,
    dirty: BTreeSet<VertexId>,
}

impl ForceLayout {
    pub fn new(network: Arc<Network>, config: LayoutConfig) -> SimResult<Self> {
        config.validate()?;
        Ok(Self {
            tracked: TrackedNetwork::new(network),
            config,
            positions: HashMap::new(),
            dirty: BTreeSet::new(),
        })
    }
    
    pub fn config(&self) -> &LayoutConfig {
        &self.config
    }
    
    pub fn network(&self) -> &Arc<Network> {
        self.tracked.network()
    }
    
    pub fn position(&self, vertex: VertexId) -> Option<Vector3<f64>> {
        self.positions.get(&vertex).copied()
    }
    
    pub fn positions(&self) -> &HashMap<VertexId, Vector3<f64>> {
        &self.positions
    }
    
    /// Places a vertex by hand (clamped into the frame). It stays there
    /// until it is next marked dirty.
    pub fn set_position(&mut self, vertex: VertexId, position: Vector3<f64>) {
        self.positions.insert(vertex, self.config.clamp(position));
        self.dirty.remove(&vertex);
    }
    
    /// Vertices waiting to be moved by the next call.
    pub fn dirty_count(&self) -> usize {
        self.dirty.len()
    }
    
    /// Marks every placed vertex for a full re-layout.
    pub fn invalidate(&mut self) {
        self.dirty.extend(self.positions.keys().copied());
    }
    
    /// Runs `config.iterations` iterations over the dirty vertices.
    pub fn layout(&mut self) -> LayoutStats {
        self.sync_topology();
        
        let network = self.tracked.network().clone();
        let (ids, mut pos, movable, edges) = {
            let graph = network.read();
            let ids = graph.vertex_ids();
            
            // First sight of a vertex: random spot inside the frame.
            let unplaced: Vec<VertexId> = ids.iter().copied().filter(|v| !self.positions.contains_key(v)).collect();
            if !unplaced.is_empty() {
                let (lower, upper) = (self.config.lower(), self.config.upper());
                network.with_rng(|rng| {
                    for &v in &unplaced {
                        let p = Vector3::from_fn(|axis, _| {
                            if upper[axis] > lower[axis] {
                                rng.gen_range(lower[axis]..upper[axis])
                            } else {
                                lower[axis]
                            }
                        });
                        self.positions.insert(v, p);
                    }
                });
                self.dirty.extend(unplaced);
            }
            
            let slots: HashMap<VertexId, usize> = ids.iter().enumerate().map(|(i, &v)| (v, i)).collect();
            let pos: Vec<Vector3<f64>> = ids.iter().map(|v| self.positions[v]).collect();
            let movable: Vec<bool> = ids.iter().map(|v| self.dirty.contains(v)).collect();
            let edges: Vec<(usize, usize)> = graph
                .edges()
                .filter_map(|e| Some((*slots.get(&e.a())?, *slots.get(&e.b())?)))
                .collect();
            (ids, pos, movable, edges)
        };
        
        let n = ids.len();
        let updated = movable.iter().filter(|&&m| m).count();
        if updated == 0 || self.config.iterations == 0 {
            self.dirty.clear();
            return LayoutStats {
                updated: 0,
                iterations: 0,
                k: 0.0,
            };
        }
        
        let k = 0.75 * (self.config.area() / n as f64).sqrt();
        let t0 = self.config.initial_temperature();
        let iterations = self.config.iterations;
        
        for iteration in 0..iterations {
            let temperature = t0 * (1.0 - iteration as f64 / iterations as f64);
            
            let mut disp = repulsion(&pos, &movable, k);
            let pull = attraction(&pos, &edges, k);
            disp.par_iter_mut().zip(pull.par_iter()).for_each(|(d, p)| *d += p);
            
            let config = &self.config;
            pos.par_iter_mut()
                .zip(disp.par_iter())
                .zip(movable.par_iter())
                .for_each(|((p, d), &m)| {
                    if !m {
                        return;
                    }
                    let len = d.norm();
                    if len > 0.0 {
                        *p += d * (len.min(temperature) / len);
                    }
                    *p = config.clamp(*p);
                });
        }
        
        for ((v, p), m) in ids.iter().zip(pos).zip(movable) {
            if m {
                self.positions.insert(*v, p);
            }
        }
        self.dirty.clear();
        
        debug!("layout: k={:.3}, {} of {} vertices moved", k, updated, n);
        info!("layout finished: {} vertices updated over {} iterations", updated, iterations);
        LayoutStats {
            updated,
            iterations,
            k,
        }
    }
    
    /// Applies changes committed since the last call to the dirty set.
    fn sync_topology(&mut self) {
        let changes = self.tracked.drain();
        if changes.is_empty() {
            return;
        }
        for v in &changes.removed_vertices {
            self.positions.remove(v);
            self.dirty.remove(v);
        }
        self.dirty.extend(changes.added_vertices.iter().copied());
        for &(_, a, b) in &changes.removed_edges {
            for v in [a, b] {
                if self.positions.contains_key(&v) {
                    self.dirty.insert(v);
                }
            }
        }
        
        let graph = self.tracked.network().read();
        for e in &changes.added_edges {
            if let Some(edge) = graph.edge(*e) {
                self.dirty.insert(edge.a());
                self.dirty.insert(edge.b());
            }
        }
    }
}

/// Phase 1: repulsive displacement of every movable vertex.
fn repulsion(pos: &[Vector3<f64>], movable: &[bool], k: f64) -> Vec<Vector3<f64>> {
    let k2 = k * k;
    (0..pos.len())
        .into_par_iter()
        .map(|i| {
            if !movable[i] {
                return Vector3::zeros();
            }
            let mut force = Vector3::zeros();
            for (j, other) in pos.iter().enumerate() {
                if i == j {
                    continue;
                }
                let delta = pos[i] - other;
                let d = delta.norm();
                let direction = if d < MIN_DISTANCE {
                    let angle = GOLDEN_ANGLE * (i as f64 + 1.0);
                    Vector3::new(angle.cos(), angle.sin(), 0.0)
                } else {
                    delta / d
                };
                force += direction * (k2 / d.max(MIN_DISTANCE));
            }
            force
        })
        .collect()
}

/// Phase 2: attractive displacement along edges, summed per vertex.
fn attraction(pos: &[Vector3<f64>], edges: &[(usize, usize)], k: f64) -> Vec<Vector3<f64>> {
    let n = pos.len();
    edges
        .par_iter()
        .fold(
            || vec![Vector3::zeros(); n],
            |mut acc, &(a, b)| {
                let delta = pos[a] - pos[b];
                let d = delta.norm();
                if d >= MIN_DISTANCE {
                    let force = delta * (d / k);
                    acc[a] -= force;
                    acc[b] += force;
                }
                acc
            },
        )
        .reduce(
            || vec![Vector3::zeros(); n],
            |mut left, right| {
                for (l, r) in left.iter_mut().zip(right) {
                    *l += r;
                }
                left
            },
        )
}

#[cfg(test)]
mod tests {
    use super::*;
    use phasenet_core::{generators, EdgeType};
    
    fn connected_pair() -> (Arc<Network>, VertexId, VertexId) {
        let net = Network::shared(17);
        let (a, b) = net
            .mutate(|g| {
                let a = g.add_vertex(None);
                let b = g.add_vertex(None);
                g.connect(a, b, EdgeType::Undirected).unwrap();
                (a, b)
            })
            .unwrap();
        (net, a, b)
    }
    
    fn distance(layout: &ForceLayout, a: VertexId, b: VertexId) -> f64 {
        (layout.position(a).unwrap() - layout.position(b).unwrap()).norm()
    }
    
    #[test]
    fn test_pair_settles_near_ideal_length() {
        let (net, a, b) = connected_pair();
        let config = LayoutConfig::default().with_iterations(300);
        let mut layout = ForceLayout::new(net, config.clone()).unwrap();
        
        let stats = layout.layout();
        assert_eq!(stats.updated, 2);
        let d = distance(&layout, a, b);
        assert!(d > 0.0 && d <= config.diagonal());
        assert!((d - stats.k).abs() < 0.1 * stats.k, "distance {} vs k {}", d, stats.k);
        
        layout.invalidate();
        layout.layout();
        let again = distance(&layout, a, b);
        assert!(again > 0.0 && again <= config.diagonal());
        assert!((again - d).abs() < 0.1 * stats.k);
    }
    
    #[test]
    fn test_positions_stay_inside_frame() {
        let net = Network::shared(4);
        net.mutate(|g| generators::barabasi_albert(g, 60, 2)).unwrap().unwrap();
        let config = LayoutConfig::default()
            .with_frame(400.0, 300.0)
            .with_margin(5.0)
            .with_iterations(40);
        let mut layout = ForceLayout::new(net, config).unwrap();
        layout.layout();
        
        assert_eq!(layout.positions().len(), 60);
        for p in layout.positions().values() {
            assert!(p.x >= 5.0 && p.x <= 395.0);
            assert!(p.y >= 5.0 && p.y <= 295.0);
            assert_eq!(p.z, 0.0);
        }
    }
    
    #[test]
    fn test_three_dimensional_frame() {
        let net = Network::shared(6);
        net.mutate(|g| generators::complete(g, 8)).unwrap().unwrap();
        let config = LayoutConfig::default().with_depth(500.0).with_iterations(20);
        let mut layout = ForceLayout::new(net, config).unwrap();
        layout.layout();
        
        let zs: Vec<f64> = layout.positions().values().map(|p| p.z).collect();
        assert!(zs.iter().all(|&z| (10.0..=490.0).contains(&z)));
        let spread = zs.iter().cloned().fold(f64::MIN, f64::max) - zs.iter().cloned().fold(f64::MAX, f64::min);
        assert!(spread > 0.0);
    }
    
    #[test]
    fn test_incremental_layout_moves_only_new_vertices() {
        let net = Network::shared(12);
        let ids = net.mutate(|g| generators::ring_lattice(g, 10, 1)).unwrap().unwrap();
        let mut layout = ForceLayout::new(net.clone(), LayoutConfig::default()).unwrap();
        assert_eq!(layout.layout().updated, 10);
        assert_eq!(layout.layout().updated, 0);
        
        let before = layout.positions().clone();
        let late = net.create_vertex(None).unwrap();
        assert_eq!(layout.layout().updated, 1);
        for (v, p) in &before {
            assert_eq!(layout.position(*v), Some(*p));
        }
        assert!(layout.position(late).is_some());
        
        net.create_edge(late, ids[0], EdgeType::Undirected).unwrap();
        let stats = layout.layout();
        assert_eq!(stats.updated, 2);
        assert_eq!(layout.position(ids[5]), before.get(&ids[5]).copied());
    }
    
    #[test]
    fn test_removed_vertices_are_forgotten() {
        let net = Network::shared(2);
        let ids = net.mutate(|g| generators::complete(g, 4)).unwrap().unwrap();
        let mut layout = ForceLayout::new(net.clone(), LayoutConfig::default()).unwrap();
        layout.layout();
        
        net.remove_vertex(ids[2]).unwrap();
        let stats = layout.layout();
        assert!(layout.position(ids[2]).is_none());
        assert_eq!(layout.positions().len(), 3);
        // the other three lost an edge each
        assert_eq!(stats.updated, 3);
    }
    
    #[test]
    fn test_coincident_vertices_separate() {
        let net = Network::shared(8);
        let (a, b) = net
            .mutate(|g| (g.add_vertex(None), g.add_vertex(None)))
            .unwrap();
        let mut layout = ForceLayout::new(net, LayoutConfig::default().with_iterations(10)).unwrap();
        let centre = Vector3::new(500.0, 500.0, 0.0);
        layout.set_position(a, centre);
        layout.set_position(b, centre);
        layout.invalidate();
        layout.layout();
        assert!(distance(&layout, a, b) > 1.0);
    }
    
    #[test]
    fn test_invalid_frame_rejected() {
        let net = Network::shared(1);
        let config = LayoutConfig::default().with_frame(15.0, 100.0);
        assert!(ForceLayout::new(net.clone(), config).is_err());
        let config = LayoutConfig::default().with_depth(5.0);
        assert!(ForceLayout::new(net, config).is_err());
    }
}
