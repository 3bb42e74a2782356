//! Coupling partner selection and strength weighting.
//!
//! Both oscillator models ask a [`NeighborSelector`] whom a vertex couples
//! to, then scale the base strength with a [`CouplingConfig`].

use phasenet_core::{Graph, NetworkReadGuard, VertexId};
use serde::{Deserialize, Serialize};

use crate::error::{SimError, SimResult};

/// Strategy choosing the coupling partners of a vertex.
///
/// Called with the network's read guard held; random choices go through
/// the guard's random source.
pub trait NeighborSelector: Send + Sync {
    fn select(&self, graph: &NetworkReadGuard<'_>, vertex: VertexId) -> Vec<VertexId>;
}

/// Every successor of the vertex (both directions for undirected edges).
#[derive(Debug, Clone, Copy, Default)]
pub struct Successors;

impl NeighborSelector for Successors {
    fn select(&self, graph: &NetworkReadGuard<'_>, vertex: VertexId) -> Vec<VertexId> {
        graph
            .vertex(vertex)
            .map(|v| v.successors().collect())
            .unwrap_or_default()
    }
}

/// One uniformly random successor, or none for a sink.
#[derive(Debug, Clone, Copy, Default)]
pub struct RandomNeighbor;

impl NeighborSelector for RandomNeighbor {
    fn select(&self, graph: &NetworkReadGuard<'_>, vertex: VertexId) -> Vec<VertexId> {
        graph.random_successor(vertex).into_iter().collect()
    }
}

/// How coupling strength is normalized by connectivity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum DegreeWeighting {
    /// Strength is used as given
    #[default]
    None,
    
    /// Strength divided by the degree of the coupled vertex
    Degree,
    
    /// Strength scaled by the partner's degree relative to the mean degree
    DoubleDegree,
}

/// Coupling parameters shared by the oscillator models.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CouplingConfig {
    /// Base strength for ordered pairs without an explicit override
    pub strength: f64,
    
    /// Probability that a selected coupling takes effect
    pub probability: f64,
    
    /// Divide strength by `probability` to keep the expected coupling
    pub compensate: bool,
    
    pub weighting: DegreeWeighting,
}

impl Default for CouplingConfig {
    fn default() -> Self {
        Self {
            strength: 1.0,
            probability: 1.0,
            compensate: false,
            weighting: DegreeWeighting::None,
        }
    }
}

impl CouplingConfig {
    pub fn with_strength(mut self, strength: f64) -> Self {
        self.strength = strength;
        self
    }
    
    pub fn with_probability(mut self, probability: f64) -> Self {
        self.probability = probability;
        self
    }
    
    pub fn with_compensation(mut self, compensate: bool) -> Self {
        self.compensate = compensate;
        self
    }
    
    pub fn with_weighting(mut self, weighting: DegreeWeighting) -> Self {
        self.weighting = weighting;
        self
    }
    
    /// Checks that the values are usable.
    pub fn validate(&self) -> SimResult<()> {
        if !self.strength.is_finite() {
            return Err(SimError::config(format!("coupling strength {} is not finite", self.strength)));
        }
        if !(0.0..=1.0).contains(&self.probability) {
            return Err(SimError::config(format!(
                "coupling probability {} outside [0, 1]",
                self.probability
            )));
        }
        Ok(())
    }
    
    /// Whether a coupling may be skipped at random.
    pub fn is_gated(&self) -> bool {
        self.probability < 1.0
    }
    
    /// Strength of the coupling `vertex <- partner` given a base strength.
    ///
    /// `mean_degree` is the network average, passed in so a caller planning
    /// many couplings computes it once.
    pub fn effective_strength(
        &self,
        base: f64,
        graph: &Graph,
        vertex: VertexId,
        partner: VertexId,
        mean_degree: f64,
    ) -> f64 {
        let weighted = match self.weighting {
            DegreeWeighting::None => base,
            DegreeWeighting::Degree => match graph.degree(vertex) {
                0 => base,
                d => base / d as f64,
            },
            DegreeWeighting::DoubleDegree => {
                if mean_degree > 0.0 {
                    base * graph.degree(partner) as f64 / mean_degree
                } else {
                    base
                }
            }
        };
        
        if self.compensate && self.probability > 0.0 && self.probability < 1.0 {
            weighted / self.probability
        } else {
            weighted
        }
    }
}
