//! Test data builders for creating networks

use oscnet_rs::{Edge, NetworkEditor, NetworkFile, Node, NodeId, Position};

/// Builder for a network edited through [`NetworkEditor`]
///
/// Nodes get ids 1..=N in the order they are added.
#[derive(Default)]
pub struct NetworkBuilder {
    frequencies: Vec<f64>,
    edges: Vec<(u32, u32, bool)>,
}

impl NetworkBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// `count` nodes at 1 Hz
    pub fn nodes(mut self, count: usize) -> Self {
        self.frequencies.extend(std::iter::repeat(1.0).take(count));
        self
    }

    pub fn node(mut self, frequency: f64) -> Self {
        self.frequencies.push(frequency);
        self
    }

    pub fn edge(mut self, start: u32, end: u32, bidirectional: bool) -> Self {
        self.edges.push((start, end, bidirectional));
        self
    }

    /// Apply the additions as recorded edits
    pub fn build(self) -> NetworkEditor {
        let mut editor = NetworkEditor::default();
        for (i, &frequency) in self.frequencies.iter().enumerate() {
            let position = Position::new(40.0 * i as f64, 0.0);
            editor
                .add_node(Some(frequency), Some(position))
                .expect("builder node rejected");
        }
        for &(start, end, bidirectional) in &self.edges {
            editor
                .add_edge(NodeId(start), NodeId(end), Some(bidirectional))
                .expect("builder edge rejected");
        }
        editor
    }

    /// Same network as a persisted file
    pub fn build_file(self) -> NetworkFile {
        let nodes: Vec<Node> = self
            .frequencies
            .iter()
            .enumerate()
            .map(|(i, &f)| Node::new(i as u32 + 1, f))
            .collect();
        let edges: Vec<Edge> = self
            .edges
            .iter()
            .map(|&(s, e, b)| Edge::new(s, e, b))
            .collect();
        let mut editor = NetworkEditor::default();
        editor
            .replace_network(nodes, edges)
            .expect("builder network rejected");
        NetworkFile::from_store(editor.store())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_network_builder() {
        let editor = NetworkBuilder::new().nodes(3).edge(1, 2, true).build();
        assert_eq!(editor.store().node_count(), 3);
        assert_eq!(editor.store().edge_count(), 1);
        assert_eq!(editor.history().undo_len(), 4);
    }
}
