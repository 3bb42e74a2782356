//! PhaseNet Core - Thread-Safe Mutable Multigraph
//!
//! The graph that oscillator dynamics and layout engines read while other
//! workers keep changing it:
//! 1. **Storage**: arenas of vertices and edges with dense, never-reused ids
//! 2. **Mutation protocol**: at most one edge object per vertex pair;
//!    directions are promoted and demoted in place instead of duplicated
//! 3. **Locking**: reader/writer discipline with fail-fast detection of
//!    mutations attempted while the same thread still reads
//! 4. **Notifications**: observers hear about committed changes after the
//!    write lock has been released
//!
//! # Example
//!
//! ```
//! use phasenet_core::{EdgeType, Network};
//!
//! let net = Network::with_seed(42);
//! let (a, b) = net
//!     .mutate(|g| {
//!         let a = g.add_vertex(Some("a"));
//!         let b = g.add_vertex(Some("b"));
//!         g.connect(a, b, EdgeType::Directed).unwrap();
//!         (a, b)
//!     })
//!     .unwrap();
//!
//! // the reverse direction promotes the existing edge
//! net.create_edge(b, a, EdgeType::Directed).unwrap();
//! assert_eq!(net.edge_count(), 1);
//! ```

mod arena;
mod algorithms;
mod colorizer;
mod edge;
mod error;
mod events;
mod graph;
mod guard;
mod ids;
mod mutation;
mod network;
mod vertex;
pub mod generators;

pub use colorizer::{Colorizer, MapColorizer};
pub use edge::{Edge, EdgeDirection, EdgeSpec, EdgeType};
pub use error::{GraphError, GraphResult};
pub use events::{ChangeTracker, Changes, GraphEvent, GraphObserver};
pub use graph::Graph;
pub use guard::NetworkReadGuard;
pub use ids::{EdgeId, VertexId};
pub use mutation::GraphMut;
pub use network::{Network, NetworkConfig};
pub use vertex::Vertex;
