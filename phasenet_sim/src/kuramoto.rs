//! Kuramoto oscillators on a network.
//!
//! Every vertex carries a phase `θ` and a natural frequency `ω`:
//!
//! ```text
//! dθᵢ/dt = ωᵢ + Σⱼ kᵢⱼ · sin(θⱼ − θᵢ)
//! ```
//!
//! where `j` ranges over the partners chosen by a [`NeighborSelector`]
//! (successors by default) and `kᵢⱼ` is the pull of `j` on `i` after degree
//! weighting. Partners are chosen once per RK4 step in `prepare`. The
//! coupling gate is drawn again on every derivative evaluation, sequentially
//! from the network's random source, before the per-vertex sums run in
//! parallel.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::f64::consts::TAU;
use std::sync::Arc;

use nalgebra::DVector;
use phasenet_core::{Colorizer, Network, VertexId};
use phasenet_engine::{ContinuousDynamics, DynamicsError, DynamicsResult, StepContext};
use rand::Rng;
use rand_distr::{Distribution, Normal};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{SimError, SimResult};
use crate::phase::{order_parameter, wrap_phase, ORDER_COLUMN};
use crate::selection::{CouplingConfig, NeighborSelector, Successors};
use crate::tracking::TrackedNetwork;

/// Kuramoto model configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KuramotoConfig {
    pub coupling: CouplingConfig,
    
    /// Mean natural frequency for vertices without an explicit one
    pub frequency_mean: f64,
    
    /// Standard deviation of natural frequencies
    pub frequency_std: f64,
}

impl Default for KuramotoConfig {
    fn default() -> Self {
        Self {
            coupling: CouplingConfig::default(),
            frequency_mean: 1.0,
            frequency_std: 0.1,
        }
    }
}

impl KuramotoConfig {
    pub fn with_coupling(mut self, coupling: CouplingConfig) -> Self {
        self.coupling = coupling;
        self
    }
    
    pub fn with_frequencies(mut self, mean: f64, std: f64) -> Self {
        self.frequency_mean = mean;
        self.frequency_std = std;
        self
    }
    
    pub fn validate(&self) -> SimResult<()> {
        self.coupling.validate()?;
        if !self.frequency_mean.is_finite() || !(self.frequency_std >= 0.0 && self.frequency_std.is_finite()) {
            return Err(SimError::config(format!(
                "invalid frequency distribution N({}, {})",
                self.frequency_mean, self.frequency_std
            )));
        }
        Ok(())
    }
}

/// Final state of a Kuramoto run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KuramotoSummary {
    pub order: f64,
    pub oscillators: usize,
    /// Phases wrapped into `[0, 2π)`
    pub phases: BTreeMap<VertexId, f64>,
}

/// Kuramoto dynamics over a shared [`Network`].
///
/// The state vector is laid out once in `init`, one slot per vertex in
/// creation order. Vertices removed during a run freeze (their slot stops
/// evolving and no longer couples); vertices added during a run are
/// ignored until the next `init`.
pub struct Kuramoto {
    tracked: TrackedNetwork,
    config: KuramotoConfig,
    selector: Box<dyn NeighborSelector>,
    
    /// Explicit pulls, keyed by (vertex, partner)
    strengths: HashMap<(VertexId, VertexId), f64>,
    initial_phases: HashMap<VertexId, f64>,
    frequencies: HashMap<VertexId, f64>,
    
    vertices: Vec<VertexId>,
    slots: HashMap<VertexId, usize>,
    active: Vec<bool>,
    natural: Vec<f64>,
    /// Last accepted phases
    phases: Vec<f64>,
    /// Slots edited through `set_phase` since the last step
    pending: Vec<usize>,
    /// Per slot: (partner slot, effective strength) for the current step
    plan: Vec<Vec<(usize, f64)>>,
}

impl Kuramoto {
    pub fn new(network: Arc<Network>, config: KuramotoConfig) -> SimResult<Self> {
        config.validate()?;
        Ok(Self {
            tracked: TrackedNetwork::new(network),
            config,
            selector: Box::new(Successors),
            strengths: HashMap::new(),
            initial_phases: HashMap::new(),
            frequencies: HashMap::new(),
            vertices: Vec::new(),
            slots: HashMap::new(),
            active: Vec::new(),
            natural: Vec::new(),
            phases: Vec::new(),
            pending: Vec::new(),
            plan: Vec::new(),
        })
    }
    
    /// Replaces the coupling partner strategy.
    pub fn with_selector(mut self, selector: impl NeighborSelector + 'static) -> Self {
        self.selector = Box::new(selector);
        self
    }
    
    pub fn config(&self) -> &KuramotoConfig {
        &self.config
    }
    
    pub fn network(&self) -> &Arc<Network> {
        self.tracked.network()
    }
    
    // ========================================================================
    // PER-VERTEX PARAMETERS
    // ========================================================================
    
    /// Sets a phase. Before `init` it becomes the initial phase; during a
    /// run it is written into the state before the next step.
    pub fn set_phase(&mut self, vertex: VertexId, phase: f64) {
        match self.slots.get(&vertex) {
            Some(&slot) if !self.active[slot] => {}
            Some(&slot) => {
                self.phases[slot] = phase;
                self.pending.push(slot);
            }
            None => {
                self.initial_phases.insert(vertex, phase);
            }
        }
    }
    
    /// Current phase (unwrapped), if the vertex is known.
    pub fn phase(&self, vertex: VertexId) -> Option<f64> {
        match self.slots.get(&vertex) {
            Some(&slot) if self.active[slot] => Some(self.phases[slot]),
            Some(_) => None,
            None => self.initial_phases.get(&vertex).copied(),
        }
    }
    
    /// Sets a natural frequency. Ignored for vertices removed during the
    /// current run.
    pub fn set_natural_frequency(&mut self, vertex: VertexId, omega: f64) {
        match self.slots.get(&vertex) {
            Some(&slot) if !self.active[slot] => return,
            Some(&slot) => self.natural[slot] = omega,
            None => {}
        }
        self.frequencies.insert(vertex, omega);
    }
    
    pub fn natural_frequency(&self, vertex: VertexId) -> Option<f64> {
        match self.slots.get(&vertex) {
            Some(&slot) if self.active[slot] => Some(self.natural[slot]),
            Some(_) => None,
            None => self.frequencies.get(&vertex).copied(),
        }
    }
    
    /// Sets the pull `partner` exerts on `vertex`. The reverse pull is
    /// unaffected.
    pub fn set_coupling_strength(&mut self, vertex: VertexId, partner: VertexId, strength: f64) {
        self.strengths.insert((vertex, partner), strength);
    }
    
    /// Base pull of `partner` on `vertex`, before degree weighting.
    pub fn coupling_strength(&self, vertex: VertexId, partner: VertexId) -> f64 {
        self.strengths
            .get(&(vertex, partner))
            .copied()
            .unwrap_or(self.config.coupling.strength)
    }
    
    // ========================================================================
    // ORDER
    // ========================================================================
    
    /// Order parameter of the given vertices; unknown ids are skipped.
    pub fn get_order(&self, vertices: &[VertexId]) -> f64 {
        order_parameter(vertices.iter().filter_map(|&v| self.phase(v)))
    }
    
    /// Order parameter of every live oscillator.
    pub fn global_order(&self) -> f64 {
        if self.vertices.is_empty() {
            return order_parameter(self.initial_phases.values().copied());
        }
        order_parameter(
            self.phases
                .iter()
                .zip(&self.active)
                .filter_map(|(&phase, &active)| active.then_some(phase)),
        )
    }
    
    /// Number of live oscillators.
    pub fn oscillator_count(&self) -> usize {
        self.active.iter().filter(|&&a| a).count()
    }
    
    // ========================================================================
    // STEP PLANNING
    // ========================================================================
    
    fn sync_topology(&mut self) {
        let changes = self.tracked.drain();
        for v in &changes.removed_vertices {
            if let Some(&slot) = self.slots.get(v) {
                if self.active[slot] {
                    self.active[slot] = false;
                    debug!("Kuramoto: vertex {} removed, oscillator frozen", v);
                }
            }
        }
        self.forget(&changes.removed_vertices);
        if !changes.added_vertices.is_empty() {
            debug!(
                "Kuramoto: {} vertices added mid-run, ignored until next init",
                changes.added_vertices.len()
            );
        }
    }
    
    /// Drops per-vertex parameters of removed vertices.
    fn forget(&mut self, removed: &BTreeSet<VertexId>) {
        if removed.is_empty() {
            return;
        }
        for v in removed {
            self.frequencies.remove(v);
            self.initial_phases.remove(v);
        }
        self.strengths
            .retain(|(vertex, partner), _| !removed.contains(vertex) && !removed.contains(partner));
    }
    
    fn plan_couplings(&mut self) {
        let network = self.tracked.network();
        let coupling = &self.config.coupling;
        let mut plan = vec![Vec::new(); self.vertices.len()];
        
        {
            let graph = network.read();
            let mean_degree = graph.mean_degree();
            for (i, &v) in self.vertices.iter().enumerate() {
                if !self.active[i] {
                    continue;
                }
                for partner in self.selector.select(&graph, v) {
                    let Some(&j) = self.slots.get(&partner) else {
                        continue;
                    };
                    if j == i || !self.active[j] {
                        continue;
                    }
                    let base = self.coupling_strength(v, partner);
                    plan[i].push((j, coupling.effective_strength(base, &graph, v, partner, mean_degree)));
                }
            }
        }
        self.plan = plan;
    }
    
    /// One open/closed flag per planned coupling, or `None` when every
    /// coupling is always open.
    fn draw_gates(&self) -> Option<Vec<Vec<bool>>> {
        let coupling = &self.config.coupling;
        if !coupling.is_gated() {
            return None;
        }
        let p = coupling.probability;
        Some(self.tracked.network().with_rng(|rng| {
            self.plan
                .iter()
                .map(|couplings| couplings.iter().map(|_| rng.gen::<f64>() < p).collect())
                .collect()
        }))
    }
}

impl ContinuousDynamics for Kuramoto {
    type Summary = KuramotoSummary;
    
    fn init(&mut self, ctx: &mut StepContext<'_>) -> DynamicsResult<DVector<f64>> {
        // Additions before init are already reflected in the vertex list.
        let changes = self.tracked.drain();
        self.forget(&changes.removed_vertices);
        
        let frequency = Normal::new(self.config.frequency_mean, self.config.frequency_std)
            .map_err(DynamicsError::from_error)?;
        let network = self.tracked.network().clone();
        let vertices = network.vertex_ids();
        
        let (phases, natural): (Vec<f64>, Vec<f64>) = network.with_rng(|rng| {
            vertices
                .iter()
                .map(|v| {
                    let phase = match self.initial_phases.get(v) {
                        Some(&phase) => phase,
                        None => rng.gen_range(0.0..TAU),
                    };
                    let omega = match self.frequencies.get(v) {
                        Some(&omega) => omega,
                        None => frequency.sample(rng),
                    };
                    (phase, omega)
                })
                .unzip()
        });
        
        self.slots = vertices.iter().enumerate().map(|(slot, &v)| (v, slot)).collect();
        self.active = vec![true; vertices.len()];
        self.plan = vec![Vec::new(); vertices.len()];
        self.pending.clear();
        self.vertices = vertices;
        self.natural = natural;
        self.phases = phases;
        
        info!("Kuramoto initialized: {} oscillators", self.vertices.len());
        ctx.add_data_point(ORDER_COLUMN, self.global_order());
        Ok(DVector::from_column_slice(&self.phases))
    }
    
    fn prepare(&mut self, _time: f64, state: &mut DVector<f64>) -> DynamicsResult<()> {
        if state.len() != self.vertices.len() {
            return Err(DynamicsError::DimensionMismatch {
                expected: self.vertices.len(),
                found: state.len(),
            });
        }
        self.sync_topology();
        for slot in self.pending.drain(..) {
            state[slot] = self.phases[slot];
        }
        self.plan_couplings();
        Ok(())
    }
    
    fn derivative(&self, _time: f64, state: &DVector<f64>) -> DynamicsResult<DVector<f64>> {
        if state.len() != self.vertices.len() {
            return Err(DynamicsError::DimensionMismatch {
                expected: self.vertices.len(),
                found: state.len(),
            });
        }
        
        let gates = self.draw_gates();
        let deltas: Vec<f64> = (0..state.len())
            .into_par_iter()
            .map(|i| {
                if !self.active[i] {
                    return 0.0;
                }
                let theta = state[i];
                let open = gates.as_ref().map(|g| &g[i]);
                let pull: f64 = self.plan[i]
                    .iter()
                    .enumerate()
                    .filter(|&(n, _)| open.map_or(true, |g| g[n]))
                    .map(|(_, &(j, k))| k * (state[j] - theta).sin())
                    .sum();
                self.natural[i] + pull
            })
            .collect();
        Ok(DVector::from_vec(deltas))
    }
    
    fn observe(&mut self, state: &DVector<f64>, ctx: &mut StepContext<'_>) {
        self.phases.copy_from_slice(state.as_slice());
        ctx.add_data_point(ORDER_COLUMN, self.global_order());
    }
    
    fn finish(&mut self, _state: &DVector<f64>, _ctx: &mut StepContext<'_>) {
        info!(
            "Kuramoto finished: {} oscillators, order={:.4}",
            self.oscillator_count(),
            self.global_order()
        );
    }
    
    fn collect(&self, _state: &DVector<f64>) -> KuramotoSummary {
        let phases = self
            .vertices
            .iter()
            .filter_map(|&v| self.phase(v).map(|phase| (v, wrap_phase(phase))))
            .collect();
        KuramotoSummary {
            order: self.global_order(),
            oscillators: self.oscillator_count(),
            phases,
        }
    }
}

impl Colorizer<f64> for Kuramoto {
    /// Phase in `[0, 2π)`.
    fn vertex_value(&self, vertex: VertexId) -> Option<f64> {
        self.phase(vertex).map(wrap_phase)
    }
}
