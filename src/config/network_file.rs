//! Saved network files
//!
//! A network file is JSON of the form
//!
//! ```json
//! {
//!   "nodes": [{"id": 1, "x": 0.0, "y": 0.0, "frequency": 1.0, "color": "#6464FF"}],
//!   "edges": [{"start_node": 1, "end_node": 2, "bidirectional": true}]
//! }
//! ```
//!
//! Colors are stored without alpha and load as opaque.

use crate::error::{EditRejection, OscNetError, Result};
use crate::graph::{GraphStore, IdAllocator};
use crate::types::{validate_frequency, Color, Edge, Node, NodeId, Position};
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeRecord {
    pub id: u32,
    pub x: f64,
    pub y: f64,
    pub frequency: f64,
    pub color: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EdgeRecord {
    pub start_node: u32,
    pub end_node: u32,
    pub bidirectional: bool,
}

/// On-disk representation of a network
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct NetworkFile {
    #[serde(default)]
    pub nodes: Vec<NodeRecord>,
    #[serde(default)]
    pub edges: Vec<EdgeRecord>,
}

impl NetworkFile {
    /// Snapshot a store, nodes in id order
    pub fn from_store(store: &GraphStore) -> Self {
        Self {
            nodes: store
                .nodes()
                .map(|node| NodeRecord {
                    id: node.id.get(),
                    x: node.position.x,
                    y: node.position.y,
                    frequency: node.frequency,
                    color: node.color.to_rgb_hex(),
                })
                .collect(),
            edges: store
                .edges()
                .map(|edge| EdgeRecord {
                    start_node: edge.start.get(),
                    end_node: edge.end.get(),
                    bidirectional: edge.bidirectional,
                })
                .collect(),
        }
    }

    /// Build a validated store and id allocator from the records
    ///
    /// Fails on zero ids, out-of-range frequencies, bad colors, duplicate
    /// nodes, self-loops, duplicate edges and edges to missing nodes. Nothing
    /// is returned unless the whole file is valid.
    pub fn to_network(&self) -> Result<(GraphStore, IdAllocator)> {
        let mut store = GraphStore::new();

        for record in &self.nodes {
            let id = NodeId(record.id);
            if !id.is_positive() {
                return Err(OscNetError::Serialization(
                    "node ids must be positive".to_string(),
                ));
            }
            let frequency = validate_frequency(record.frequency)
                .map_err(|e| OscNetError::from(e).with_context(format!("node {}", id)))?;
            let color = Color::from_hex(&record.color).ok_or_else(|| {
                OscNetError::Serialization(format!(
                    "node {} has invalid color '{}'",
                    id, record.color
                ))
            })?;
            let node = Node::new(id, frequency)
                .with_position(Position::new(record.x, record.y))
                .with_color(color);
            store.add_node(node)?;
        }

        for record in &self.edges {
            let edge = Edge::new(record.start_node, record.end_node, record.bidirectional);
            store.insert_edge(edge).map_err(|e: EditRejection| {
                OscNetError::from(e).with_context(format!("edge {}", edge.key()))
            })?;
        }

        let ids = IdAllocator::from_ids(store.node_ids());
        Ok((store, ids))
    }

    pub fn from_json(text: &str) -> Result<Self> {
        serde_json::from_str(text)
            .map_err(|e| OscNetError::Serialization(format!("Invalid network file: {}", e)))
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self)
            .map_err(|e| OscNetError::Serialization(format!("Failed to serialize network: {}", e)))
    }

    /// Load a network file from disk
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| OscNetError::from(e).with_context(format!("Failed to read {:?}", path)))?;
        Self::from_json(&content).map_err(|e| e.with_context(format!("{:?}", path)))
    }

    /// Save to disk, creating the parent directory if needed
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let content = self.to_json()?;
        std::fs::write(path, content)
            .map_err(|e| OscNetError::from(e).with_context(format!("Failed to write {:?}", path)))
    }
}
