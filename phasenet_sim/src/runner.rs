//! Scenario runner - builds a network, drives one model, reports.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use phasenet_core::{generators, Colorizer, Network, NetworkConfig};
use phasenet_engine::{ContinuousEngine, DiscreteEngine, EngineConfig, RunState};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::{SimError, SimResult};
use crate::exporter::LayoutExport;
use crate::gossip::{EpidemicGossip, GossipConfig};
use crate::kuramoto::{Kuramoto, KuramotoConfig};
use crate::layout::{ForceLayout, LayoutConfig};
use crate::scenarios::ScenarioId;
use crate::selection::{CouplingConfig, DegreeWeighting};

/// Parameters shared by all scenarios.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioConfig {
    /// Network seed; every random choice derives from it
    pub seed: u64,
    
    /// Vertices in the generated network
    pub vertices: usize,
    
    /// Edges added per vertex by preferential attachment
    pub attachment: usize,
    
    /// Engine steps for the oscillator scenarios
    pub steps: u64,
    
    /// Integration step of the Kuramoto scenario
    pub dt: f64,
    
    /// Base coupling strength
    pub coupling: f64,
    
    /// Iterations of the layout scenario (and of layouts made for export)
    pub layout_iterations: usize,
    
    /// Time series destination
    pub output: Option<PathBuf>,
    
    /// Layout JSON destination
    pub export: Option<PathBuf>,
}

impl Default for ScenarioConfig {
    fn default() -> Self {
        Self {
            seed: 42,
            vertices: 100,
            attachment: 3,
            steps: 1000,
            dt: 0.01,
            coupling: 1.0,
            layout_iterations: 100,
            output: None,
            export: None,
        }
    }
}

impl ScenarioConfig {
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }
    
    pub fn with_vertices(mut self, vertices: usize) -> Self {
        self.vertices = vertices;
        self
    }
    
    pub fn with_steps(mut self, steps: u64) -> Self {
        self.steps = steps;
        self
    }
    
    pub fn with_dt(mut self, dt: f64) -> Self {
        self.dt = dt;
        self
    }
    
    pub fn with_coupling(mut self, coupling: f64) -> Self {
        self.coupling = coupling;
        self
    }
    
    pub fn with_layout_iterations(mut self, iterations: usize) -> Self {
        self.layout_iterations = iterations;
        self
    }
    
    pub fn with_output(mut self, path: impl Into<PathBuf>) -> Self {
        self.output = Some(path.into());
        self
    }
    
    pub fn with_export(mut self, path: impl Into<PathBuf>) -> Self {
        self.export = Some(path.into());
        self
    }
    
    pub fn validate(&self) -> SimResult<()> {
        if self.vertices < 2 {
            return Err(SimError::config("at least 2 vertices are needed"));
        }
        if self.attachment == 0 {
            return Err(SimError::config("attachment must be positive"));
        }
        if !(self.dt > 0.0 && self.dt.is_finite()) {
            return Err(SimError::config(format!("dt {} must be positive", self.dt)));
        }
        if !self.coupling.is_finite() {
            return Err(SimError::config(format!("coupling {} is not finite", self.coupling)));
        }
        Ok(())
    }
}

/// Results from running a scenario.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioResult {
    /// Scenario that was run
    pub scenario: ScenarioId,
    
    /// Seed used
    pub seed: u64,
    
    /// Whether the run completed and its outputs were written
    pub passed: bool,
    
    /// Steps (or layout iterations) executed
    pub steps: u64,
    
    /// Final simulation time
    pub final_time: f64,
    
    pub vertex_count: usize,
    pub edge_count: usize,
    
    /// Final order parameter of the oscillator scenarios
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order: Option<f64>,
    
    /// Failure message if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure_reason: Option<String>,
}

impl ScenarioResult {
    fn new(scenario: ScenarioId, seed: u64, network: &Network) -> Self {
        Self {
            scenario,
            seed,
            passed: true,
            steps: 0,
            final_time: 0.0,
            vertex_count: network.vertex_count(),
            edge_count: network.edge_count(),
            order: None,
            failure_reason: None,
        }
    }
    
    fn fail(&mut self, reason: impl Into<String>) {
        self.passed = false;
        self.failure_reason.get_or_insert_with(|| reason.into());
    }
}

/// `out.tsv` -> `out_kuramoto.tsv`, for runs writing one file per scenario.
pub fn tagged_path(base: &Path, scenario: ScenarioId) -> PathBuf {
    let stem = base
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let name = match base.extension() {
        Some(ext) => format!("{}_{}.{}", stem, scenario.name(), ext.to_string_lossy()),
        None => format!("{}_{}", stem, scenario.name()),
    };
    base.with_file_name(name)
}

/// Runs scenarios.
pub struct ScenarioRunner {
    config: ScenarioConfig,
}

impl ScenarioRunner {
    /// Creates a new scenario runner.
    pub fn new(config: ScenarioConfig) -> Self {
        Self { config }
    }
    
    pub fn config(&self) -> &ScenarioConfig {
        &self.config
    }
    
    /// Runs a scenario and returns the result.
    pub fn run(&self, scenario: ScenarioId) -> SimResult<ScenarioResult> {
        self.config.validate()?;
        info!("Starting scenario: {} (seed={})", scenario.name(), self.config.seed);
        
        let network = self.build_network(scenario)?;
        info!(
            "  Network: {} vertices, {} edges, mean degree {:.2}",
            network.vertex_count(),
            network.edge_count(),
            network.read().mean_degree()
        );
        
        match scenario {
            ScenarioId::Kuramoto => self.run_kuramoto(network),
            ScenarioId::Gossip => self.run_gossip(network),
            ScenarioId::Layout => self.run_layout(network),
        }
    }
    
    /// Scale-free network named after the scenario.
    fn build_network(&self, scenario: ScenarioId) -> SimResult<Arc<Network>> {
        let config = NetworkConfig::default()
            .with_seed(self.config.seed)
            .with_name(scenario.name());
        let network = Arc::new(Network::with_config(config));
        let m = self.config.attachment.min(self.config.vertices - 1);
        network.mutate(|g| generators::barabasi_albert(g, self.config.vertices, m))??;
        Ok(network)
    }
    
    fn engine_config(&self, scenario: ScenarioId) -> EngineConfig {
        EngineConfig::default()
            .with_name(scenario.name())
            .with_dt(self.config.dt)
            .with_max_steps(self.config.steps)
    }
    
    /// Kuramoto: degree-normalized coupling so hubs do not dominate.
    fn run_kuramoto(&self, network: Arc<Network>) -> SimResult<ScenarioResult> {
        let coupling = CouplingConfig::default()
            .with_strength(self.config.coupling)
            .with_weighting(DegreeWeighting::Degree);
        let model = Kuramoto::new(network.clone(), KuramotoConfig::default().with_coupling(coupling))?;
        let engine = ContinuousEngine::new(model, self.engine_config(ScenarioId::Kuramoto));
        
        let state = engine.run()?;
        let summary = engine.collect();
        info!("  Kuramoto: order={:.4} after t={:.2}", summary.order, engine.time());
        
        let mut result = ScenarioResult::new(ScenarioId::Kuramoto, self.config.seed, &network);
        result.steps = engine.step_count();
        result.final_time = engine.time();
        result.order = Some(summary.order);
        check_state(&mut result, state);
        
        if let Some(path) = &self.config.output {
            if let Err(e) = engine.write_time_series(path) {
                result.fail(format!("time series not written: {}", e));
            }
        }
        if let Some(path) = &self.config.export {
            engine.with_dynamics(|model| self.export_layout(&network, Some(&*model), path, &mut result));
        }
        Ok(result)
    }
    
    fn run_gossip(&self, network: Arc<Network>) -> SimResult<ScenarioResult> {
        let coupling = CouplingConfig::default().with_strength(self.config.coupling);
        let model = EpidemicGossip::new(network.clone(), GossipConfig::default().with_coupling(coupling))?;
        let engine = DiscreteEngine::new(model, self.engine_config(ScenarioId::Gossip));
        
        let state = engine.run()?;
        let summary = engine.collect();
        info!(
            "  Gossip: order={:.4}, mean period {:.2}",
            summary.order, summary.mean_period
        );
        
        let mut result = ScenarioResult::new(ScenarioId::Gossip, self.config.seed, &network);
        result.steps = engine.step_count();
        result.final_time = engine.step_count() as f64;
        result.order = Some(summary.order);
        check_state(&mut result, state);
        
        if let Some(path) = &self.config.output {
            if let Err(e) = engine.write_time_series(path) {
                result.fail(format!("time series not written: {}", e));
            }
        }
        if let Some(path) = &self.config.export {
            engine.with_dynamics(|model| self.export_layout(&network, Some(&*model), path, &mut result));
        }
        Ok(result)
    }
    
    fn run_layout(&self, network: Arc<Network>) -> SimResult<ScenarioResult> {
        let config = LayoutConfig::default().with_iterations(self.config.layout_iterations);
        let mut layout = ForceLayout::new(network.clone(), config.clone())?;
        let stats = layout.layout();
        
        let mut result = ScenarioResult::new(ScenarioId::Layout, self.config.seed, &network);
        result.steps = stats.iterations as u64;
        
        let outside = layout
            .positions()
            .values()
            .filter(|p| p.x < 0.0 || p.x > config.width || p.y < 0.0 || p.y > config.height)
            .count();
        if outside > 0 {
            result.fail(format!("{} vertices outside the frame", outside));
        }
        if layout.positions().len() != network.vertex_count() {
            result.fail("not every vertex was placed");
        }
        
        if let Some(path) = &self.config.export {
            if let Err(e) = LayoutExport::capture(&layout, None).write_to_file(path) {
                result.fail(format!("export not written: {}", e));
            }
        }
        Ok(result)
    }
    
    /// Lays out `network` and writes it with the model's values.
    fn export_layout(
        &self,
        network: &Arc<Network>,
        colorizer: Option<&dyn Colorizer<f64>>,
        path: &Path,
        result: &mut ScenarioResult,
    ) {
        let config = LayoutConfig::default().with_iterations(self.config.layout_iterations);
        let written = ForceLayout::new(network.clone(), config).and_then(|mut layout| {
            layout.layout();
            LayoutExport::capture(&layout, colorizer).write_to_file(path)
        });
        if let Err(e) = written {
            warn!("layout export failed: {}", e);
            result.fail(format!("export not written: {}", e));
        }
    }
}

fn check_state(result: &mut ScenarioResult, state: RunState) {
    if state != RunState::Stopped {
        result.fail(format!("run ended in {:?}", state));
    }
}
