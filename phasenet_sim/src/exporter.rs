//! JSON export of a laid-out network for external renderers.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use phasenet_core::{Colorizer, VertexId};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::SimResult;
use crate::layout::ForceLayout;

/// A placed vertex.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VertexPosition {
    pub id: u32,
    pub label: String,
    pub x: f64,
    pub y: f64,
    pub z: f64,
    /// Display value from a colorizer (phase, signal, ...)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<f64>,
}

/// An edge between two exported vertices.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EdgeLink {
    pub id: u32,
    pub source: u32,
    pub target: u32,
    pub directed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub weight: Option<f64>,
}

/// Complete layout export.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LayoutExport {
    /// Scenario or network name
    pub name: String,
    pub seed: u64,
    pub width: f64,
    pub height: f64,
    pub depth: f64,
    pub vertices: Vec<VertexPosition>,
    pub edges: Vec<EdgeLink>,
}

impl LayoutExport {
    /// Creates an empty export for the given frame.
    pub fn new(name: &str, seed: u64, width: f64, height: f64, depth: f64) -> Self {
        Self {
            name: name.to_string(),
            seed,
            width,
            height,
            depth,
            vertices: Vec::new(),
            edges: Vec::new(),
        }
    }
    
    /// Snapshots the placed vertices of `layout` and the edges between
    /// them, optionally tagging vertices with a colorizer value.
    pub fn capture(layout: &ForceLayout, colorizer: Option<&dyn Colorizer<f64>>) -> Self {
        let network = layout.network();
        let config = layout.config();
        let mut export = Self::new(network.name(), network.seed(), config.width, config.height, config.depth);
        
        let graph = network.read();
        for vertex in graph.vertices() {
            let Some(p) = layout.position(vertex.id()) else {
                continue;
            };
            export.vertices.push(VertexPosition {
                id: vertex.id().0,
                label: vertex.label().to_string(),
                x: p.x,
                y: p.y,
                z: p.z,
                value: colorizer.and_then(|c| c.vertex_value(vertex.id())),
            });
        }
        
        let placed = |v: VertexId| layout.position(v).is_some();
        for edge in graph.edges() {
            if placed(edge.source()) && placed(edge.target()) {
                export.edges.push(EdgeLink {
                    id: edge.id().0,
                    source: edge.source().0,
                    target: edge.target().0,
                    directed: edge.is_directed(),
                    weight: edge.weight(),
                });
            }
        }
        export
    }
    
    /// Writes pretty-printed JSON.
    pub fn write_to_file(&self, path: impl AsRef<Path>) -> SimResult<()> {
        let path = path.as_ref();
        let mut writer = BufWriter::new(File::create(path)?);
        serde_json::to_writer_pretty(&mut writer, self)?;
        writer.flush()?;
        info!(
            "exported {} vertices and {} edges to {}",
            self.vertices.len(),
            self.edges.len(),
            path.display()
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::LayoutConfig;
    use phasenet_core::{EdgeType, MapColorizer, Network, NetworkConfig};
    use std::sync::Arc;
    
    #[test]
    fn test_capture_and_write() {
        let net = Arc::new(Network::with_config(NetworkConfig::default().with_seed(9).with_name("demo")));
        let (a, b) = net
            .mutate(|g| {
                let a = g.add_vertex(Some("a"));
                let b = g.add_vertex(Some("b"));
                let c = g.add_vertex(Some("c"));
                g.connect(a, b, EdgeType::Directed).unwrap();
                g.connect(b, c, EdgeType::Undirected).unwrap();
                (a, b)
            })
            .unwrap();
        let mut layout = ForceLayout::new(net.clone(), LayoutConfig::default().with_iterations(5)).unwrap();
        layout.layout();
        
        let colors = MapColorizer::new(0.0, 0.0);
        colors.set_vertex(b, 0.5);
        let export = LayoutExport::capture(&layout, Some(&colors));
        
        assert_eq!(export.name, "demo");
        assert_eq!(export.seed, 9);
        assert_eq!(export.vertices.len(), 3);
        assert_eq!(export.vertices[1].label, "b");
        assert_eq!(export.vertices[1].value, Some(0.5));
        assert_eq!(export.vertices[0].value, Some(0.0));
        assert_eq!(export.edges.len(), 2);
        let directed = export.edges.iter().find(|e| e.directed).unwrap();
        assert_eq!((directed.source, directed.target), (a.0, b.0));
        
        let path = std::env::temp_dir().join(format!("phasenet-export-{}.json", std::process::id()));
        export.write_to_file(&path).unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        let back: LayoutExport = serde_json::from_str(&text).unwrap();
        assert_eq!(back.vertices, export.vertices);
        std::fs::remove_file(&path).ok();
    }
}
