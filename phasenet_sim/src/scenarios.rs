//! Built-in simulation scenarios.

use serde::{Deserialize, Serialize};

/// Scenario identifiers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScenarioId {
    /// Continuous Kuramoto synchronization on a scale-free network
    Kuramoto,
    
    /// Discrete epidemic phase gossip on a scale-free network
    Gossip,
    
    /// Fruchterman–Reingold layout of a scale-free network
    Layout,
}

impl ScenarioId {
    /// Returns a list of all scenarios.
    pub fn all() -> Vec<ScenarioId> {
        vec![ScenarioId::Kuramoto, ScenarioId::Gossip, ScenarioId::Layout]
    }
    
    /// Returns the scenario name.
    pub fn name(&self) -> &'static str {
        match self {
            ScenarioId::Kuramoto => "kuramoto",
            ScenarioId::Gossip => "gossip",
            ScenarioId::Layout => "layout",
        }
    }
    
    /// Returns a description of the scenario.
    pub fn description(&self) -> &'static str {
        match self {
            ScenarioId::Kuramoto => "RK4-integrated Kuramoto oscillators, degree-weighted coupling",
            ScenarioId::Gossip => "Integer-clock oscillators nudging periods via random neighbors",
            ScenarioId::Layout => "Parallel force-directed layout inside a bounded frame",
        }
    }
    
    /// Whether the scenario produces a time series.
    pub fn has_time_series(&self) -> bool {
        !matches!(self, ScenarioId::Layout)
    }
}

impl std::fmt::Display for ScenarioId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl std::str::FromStr for ScenarioId {
    type Err = String;
    
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "kuramoto" | "sync" => Ok(ScenarioId::Kuramoto),
            "gossip" | "epidemic" => Ok(ScenarioId::Gossip),
            "layout" | "fr" => Ok(ScenarioId::Layout),
            _ => Err(format!("Unknown scenario: {}", s)),
        }
    }
}
