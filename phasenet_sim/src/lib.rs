//! PhaseNet Sim - oscillator dynamics and layout on live networks
//!
//! Models that run on top of a shared [`phasenet_core::Network`] while the
//! graph may still change underneath them:
//!
//! - **Kuramoto**: continuous phases integrated with RK4
//! - **Epidemic gossip**: integer clocks whose periods are nudged by
//!   random neighbor contacts
//! - **Force layout**: parallel Fruchterman–Reingold with incremental
//!   re-layout of changed vertices
//!
//! # Architecture
//!
//! ```text
//! ┌────────────────────────────────────────────────────────┐
//! │                    ScenarioRunner                      │
//! │                                                        │
//! │  ┌──────────────┐  ┌──────────────┐  ┌──────────────┐  │
//! │  │   Kuramoto   │  │EpidemicGossip│  │ ForceLayout  │  │
//! │  │ (Continuous) │  │  (Discrete)  │  │   (rayon)    │  │
//! │  └──────┬───────┘  └──────┬───────┘  └──────┬───────┘  │
//! │         │   ChangeTracker │ per model       │          │
//! │  ┌──────▼─────────────────▼─────────────────▼───────┐  │
//! │  │          Network (RwLock + seeded RNG)           │  │
//! │  └──────────────────────────────────────────────────┘  │
//! └────────────────────────────────────────────────────────┘
//! ```
//!
//! # Usage
//!
//! ```
//! use phasenet_core::{generators, Network};
//! use phasenet_engine::{ContinuousEngine, EngineConfig, RunState};
//! use phasenet_sim::{Kuramoto, KuramotoConfig};
//!
//! let network = Network::shared(7);
//! network.mutate(|g| generators::complete(g, 5)).unwrap().unwrap();
//!
//! let model = Kuramoto::new(network, KuramotoConfig::default()).unwrap();
//! let engine = ContinuousEngine::new(model, EngineConfig::default().with_max_steps(10));
//! assert_eq!(engine.run().unwrap(), RunState::Stopped);
//! assert!(engine.collect().order <= 1.0);
//! ```

mod error;
mod exporter;
mod gossip;
mod kuramoto;
mod layout;
mod phase;
mod runner;
mod selection;
mod tracking;
pub mod scenarios;

pub use error::{SimError, SimResult};
pub use exporter::{EdgeLink, LayoutExport, VertexPosition};
pub use gossip::{EpidemicGossip, GossipConfig, GossipSummary, MEAN_PERIOD_COLUMN};
pub use kuramoto::{Kuramoto, KuramotoConfig, KuramotoSummary};
pub use layout::{ForceLayout, LayoutConfig, LayoutStats};
pub use phase::{order_parameter, wrap_phase, ORDER_COLUMN};
pub use runner::{tagged_path, ScenarioConfig, ScenarioResult, ScenarioRunner};
pub use selection::{CouplingConfig, DegreeWeighting, NeighborSelector, RandomNeighbor, Successors};
