//! Epidemic phase gossip.
//!
//! Each vertex counts integer clock ticks against its own oscillation
//! period, `phase = 2π · (clock mod period) / period`. Every step, each
//! vertex (with the coupling probability) gossips with the partners its
//! [`NeighborSelector`] picks, one random successor by default. A contact
//! between `i` and `j` nudges both periods by
//! `d = k · sin(θᵢ − θⱼ)`: `i`'s period grows by `d` while `j`'s shrinks by
//! `d`, so the leader slows down and the laggard catches up.
//!
//! A step runs in phases: topology sync, partner planning (sequential, so
//! random draws are reproducible), nudge computation (parallel), nudge
//! application (sequential), clock advance and phase refresh (parallel).

use std::collections::{BTreeMap, HashMap};
use std::f64::consts::TAU;
use std::sync::Arc;

use phasenet_core::{Colorizer, Network, VertexId};
use phasenet_engine::{DiscreteDynamics, DynamicsError, DynamicsResult, StepContext};
use rand::Rng;
use rand_distr::{Distribution, Normal};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{SimError, SimResult};
use crate::phase::{order_parameter, ORDER_COLUMN};
use crate::selection::{CouplingConfig, NeighborSelector, RandomNeighbor};
use crate::tracking::TrackedNetwork;

/// Time-series column holding the mean period.
pub const MEAN_PERIOD_COLUMN: &str = "mean_period";

/// Gossip model configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GossipConfig {
    pub coupling: CouplingConfig,
    
    /// Default period distribution, in steps
    pub period_mean: f64,
    pub period_std: f64,
    
    /// Periods never drop below this
    pub min_period: f64,
}

impl Default for GossipConfig {
    fn default() -> Self {
        Self {
            coupling: CouplingConfig::default().with_strength(0.5),
            period_mean: 100.0,
            period_std: 10.0,
            min_period: 1.0,
        }
    }
}

impl GossipConfig {
    pub fn with_coupling(mut self, coupling: CouplingConfig) -> Self {
        self.coupling = coupling;
        self
    }
    
    pub fn with_periods(mut self, mean: f64, std: f64) -> Self {
        self.period_mean = mean;
        self.period_std = std;
        self
    }
    
    pub fn with_min_period(mut self, min_period: f64) -> Self {
        self.min_period = min_period;
        self
    }
    
    pub fn validate(&self) -> SimResult<()> {
        self.coupling.validate()?;
        check_distribution(self.period_mean, self.period_std)?;
        if !(self.min_period > 0.0 && self.min_period.is_finite()) {
            return Err(SimError::config(format!("min period {} must be positive", self.min_period)));
        }
        Ok(())
    }
}

fn check_distribution(mean: f64, std: f64) -> SimResult<()> {
    if mean > 0.0 && mean.is_finite() && std >= 0.0 && std.is_finite() {
        Ok(())
    } else {
        Err(SimError::config(format!("invalid period distribution N({}, {})", mean, std)))
    }
}

/// Per-vertex oscillator state.
#[derive(Debug, Clone, Copy)]
struct Oscillator {
    clock: u64,
    period: f64,
    phase: f64,
    signal: f64,
}

impl Oscillator {
    fn new(clock: u64, period: f64) -> Self {
        let mut osc = Self {
            clock,
            period,
            phase: 0.0,
            signal: 0.0,
        };
        osc.refresh();
        osc
    }
    
    fn refresh(&mut self) {
        self.phase = TAU * ((self.clock as f64 % self.period) / self.period);
        self.signal = self.phase.sin();
    }
}

/// Final state of a gossip run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GossipSummary {
    pub order: f64,
    pub mean_period: f64,
    pub oscillators: usize,
    pub periods: BTreeMap<VertexId, f64>,
}

/// Epidemic gossip dynamics over a shared [`Network`].
///
/// Vertices added while running are seeded at the start of the next step;
/// removed ones are dropped there too.
pub struct EpidemicGossip {
    tracked: TrackedNetwork,
    config: GossipConfig,
    selector: Box<dyn NeighborSelector>,
    /// Per-vertex (mean, std) overriding the default period distribution
    distributions: HashMap<VertexId, (f64, f64)>,
    
    vertices: Vec<VertexId>,
    slots: HashMap<VertexId, usize>,
    oscillators: Vec<Oscillator>,
}

impl EpidemicGossip {
    pub fn new(network: Arc<Network>, config: GossipConfig) -> SimResult<Self> {
        config.validate()?;
        Ok(Self {
            tracked: TrackedNetwork::new(network),
            config,
            selector: Box::new(RandomNeighbor),
            distributions: HashMap::new(),
            vertices: Vec::new(),
            slots: HashMap::new(),
            oscillators: Vec::new(),
        })
    }
    
    pub fn with_selector(mut self, selector: impl NeighborSelector + 'static) -> Self {
        self.selector = Box::new(selector);
        self
    }
    
    pub fn config(&self) -> &GossipConfig {
        &self.config
    }
    
    /// Overrides the period distribution of one vertex. Takes effect when
    /// the vertex is next seeded.
    pub fn set_period_distribution(&mut self, vertex: VertexId, mean: f64, std: f64) -> SimResult<()> {
        check_distribution(mean, std)?;
        self.distributions.insert(vertex, (mean, std));
        Ok(())
    }
    
    fn oscillator(&self, vertex: VertexId) -> Option<&Oscillator> {
        self.slots.get(&vertex).map(|&slot| &self.oscillators[slot])
    }
    
    pub fn period(&self, vertex: VertexId) -> Option<f64> {
        self.oscillator(vertex).map(|o| o.period)
    }
    
    pub fn phase(&self, vertex: VertexId) -> Option<f64> {
        self.oscillator(vertex).map(|o| o.phase)
    }
    
    /// `sin(phase)`
    pub fn signal(&self, vertex: VertexId) -> Option<f64> {
        self.oscillator(vertex).map(|o| o.signal)
    }
    
    pub fn clock(&self, vertex: VertexId) -> Option<u64> {
        self.oscillator(vertex).map(|o| o.clock)
    }
    
    pub fn oscillator_count(&self) -> usize {
        self.oscillators.len()
    }
    
    pub fn order(&self) -> f64 {
        order_parameter(self.oscillators.iter().map(|o| o.phase))
    }
    
    pub fn mean_period(&self) -> f64 {
        if self.oscillators.is_empty() {
            return 0.0;
        }
        self.oscillators.iter().map(|o| o.period).sum::<f64>() / self.oscillators.len() as f64
    }
    
    // ========================================================================
    // SEEDING AND PRUNING
    // ========================================================================
    
    /// Samples periods and starting clocks for vertices not seen yet.
    fn seed(&mut self, vertices: &[VertexId]) -> DynamicsResult<()> {
        let fresh: Vec<VertexId> = vertices
            .iter()
            .copied()
            .filter(|v| !self.slots.contains_key(v))
            .collect();
        if fresh.is_empty() {
            return Ok(());
        }
        
        let default = (self.config.period_mean, self.config.period_std);
        let min_period = self.config.min_period;
        let network = self.tracked.network().clone();
        let seeded: Vec<Oscillator> = network.with_rng(|rng| {
            fresh
                .iter()
                .map(|v| {
                    let (mean, std) = self.distributions.get(v).copied().unwrap_or(default);
                    let normal = Normal::new(mean, std).map_err(DynamicsError::from_error)?;
                    let period = normal.sample(rng).max(min_period);
                    let clock = rng.gen_range(0..period.ceil() as u64);
                    Ok(Oscillator::new(clock, period))
                })
                .collect::<DynamicsResult<_>>()
        })?;
        
        for (v, osc) in fresh.into_iter().zip(seeded) {
            self.slots.insert(v, self.vertices.len());
            self.vertices.push(v);
            self.oscillators.push(osc);
        }
        Ok(())
    }
    
    fn prune(&mut self, vertex: VertexId) {
        self.distributions.remove(&vertex);
        let Some(slot) = self.slots.remove(&vertex) else {
            return;
        };
        self.vertices.swap_remove(slot);
        self.oscillators.swap_remove(slot);
        if let Some(&moved) = self.vertices.get(slot) {
            self.slots.insert(moved, slot);
        }
    }
    
    fn sync_topology(&mut self) -> DynamicsResult<()> {
        let changes = self.tracked.drain();
        if changes.is_empty() {
            return Ok(());
        }
        for &v in &changes.removed_vertices {
            self.prune(v);
        }
        let added: Vec<VertexId> = changes.added_vertices.into_iter().collect();
        self.seed(&added)?;
        debug!(
            "gossip: {} vertices seeded, {} pruned",
            added.len(),
            changes.removed_vertices.len()
        );
        Ok(())
    }
    
    /// (slot, partner slot, effective strength) for every contact of this
    /// step.
    fn plan_contacts(&self) -> Vec<(usize, usize, f64)> {
        let network = self.tracked.network();
        let coupling = &self.config.coupling;
        let n = self.vertices.len();
        let graph = network.read();
        let mean_degree = graph.mean_degree();
        
        let gates: Vec<bool> = if coupling.is_gated() {
            let p = coupling.probability;
            network.with_rng(|rng| (0..n).map(|_| rng.gen::<f64>() < p).collect())
        } else {
            vec![true; n]
        };
        
        let mut contacts = Vec::new();
        for (i, &v) in self.vertices.iter().enumerate() {
            if !gates[i] {
                continue;
            }
            for partner in self.selector.select(&graph, v) {
                // Partners added after the sync are seeded next step.
                let Some(&j) = self.slots.get(&partner) else {
                    continue;
                };
                if j != i {
                    let k = coupling.effective_strength(coupling.strength, &graph, v, partner, mean_degree);
                    contacts.push((i, j, k));
                }
            }
        }
        contacts
    }
}

impl DiscreteDynamics for EpidemicGossip {
    type Summary = GossipSummary;
    
    fn init(&mut self, _ctx: &mut StepContext<'_>) -> DynamicsResult<()> {
        for v in self.tracked.drain().removed_vertices {
            self.distributions.remove(&v);
        }
        self.vertices.clear();
        self.slots.clear();
        self.oscillators.clear();
        let vertices = self.tracked.network().vertex_ids();
        self.seed(&vertices)?;
        info!(
            "gossip initialized: {} oscillators, mean period {:.2}",
            self.oscillators.len(),
            self.mean_period()
        );
        Ok(())
    }
    
    fn step(&mut self, ctx: &mut StepContext<'_>) -> DynamicsResult<()> {
        self.sync_topology()?;
        let contacts = self.plan_contacts();
        
        let nudges: Vec<(usize, usize, f64)> = contacts
            .par_iter()
            .map(|&(i, j, k)| {
                let d = k * (self.oscillators[i].phase - self.oscillators[j].phase).sin();
                (i, j, d)
            })
            .collect();
        
        let min_period = self.config.min_period;
        for (i, j, d) in nudges {
            let a = &mut self.oscillators[i];
            a.period = (a.period + d).max(min_period);
            let b = &mut self.oscillators[j];
            b.period = (b.period - d).max(min_period);
        }
        
        self.oscillators.par_iter_mut().for_each(|osc| {
            osc.clock += 1;
            osc.refresh();
        });
        
        ctx.add_data_point(ORDER_COLUMN, self.order());
        ctx.add_data_point(MEAN_PERIOD_COLUMN, self.mean_period());
        Ok(())
    }
    
    fn finish(&mut self, _ctx: &mut StepContext<'_>) {
        info!(
            "gossip finished: {} oscillators, order={:.4}",
            self.oscillators.len(),
            self.order()
        );
    }
    
    fn collect(&self) -> GossipSummary {
        GossipSummary {
            order: self.order(),
            mean_period: self.mean_period(),
            oscillators: self.oscillators.len(),
            periods: self
                .vertices
                .iter()
                .zip(&self.oscillators)
                .map(|(&v, o)| (v, o.period))
                .collect(),
        }
    }
}

impl Colorizer<f64> for EpidemicGossip {
    /// The oscillator signal, in `[-1, 1]`.
    fn vertex_value(&self, vertex: VertexId) -> Option<f64> {
        self.signal(vertex)
    }
}
