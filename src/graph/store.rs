//! Canonical storage of the oscillator network.
//!
//! [`GraphStore`] owns every [`Node`] and [`Edge`] and enforces the
//! structural invariants:
//!
//! - no self-loops
//! - at most one edge per unordered pair of nodes
//! - every edge references live nodes
//!
//! The store never records history; callers wrap successful mutations into
//! [`Command`](crate::editor::Command)s themselves.

use crate::error::EditRejection;
use crate::types::{validate_frequency, Color, Edge, EdgeKey, Node, NodeId, Position};
use std::collections::BTreeMap;

/// Nodes keyed by id and edges keyed by their unordered endpoint pair.
///
/// Both maps are ordered, so two stores holding the same network compare
/// equal regardless of the order edits were applied in.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GraphStore {
    nodes: BTreeMap<NodeId, Node>,
    edges: BTreeMap<EdgeKey, Edge>,
}

impl GraphStore {
    pub fn new() -> Self {
        Self::default()
    }

    // ==================== Nodes ====================

    pub fn add_node(&mut self, node: Node) -> Result<(), EditRejection> {
        if self.nodes.contains_key(&node.id) {
            return Err(EditRejection::DuplicateNode(node.id));
        }
        self.nodes.insert(node.id, node);
        Ok(())
    }

    /// Remove a node together with every incident edge.
    ///
    /// Returns the node and the removed edges so the caller can build a
    /// composite undo command.
    pub fn remove_node(&mut self, id: NodeId) -> Option<(Node, Vec<Edge>)> {
        let node = self.nodes.remove(&id)?;
        let keys: Vec<EdgeKey> = self
            .edges
            .keys()
            .filter(|key| key.contains(id))
            .copied()
            .collect();
        let edges = keys
            .into_iter()
            .filter_map(|key| self.edges.remove(&key))
            .collect();
        Some((node, edges))
    }

    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(&id)
    }

    pub fn contains_node(&self, id: NodeId) -> bool {
        self.nodes.contains_key(&id)
    }

    /// Nodes in ascending id order
    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.values()
    }

    /// Node ids in ascending order
    pub fn node_ids(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.nodes.keys().copied()
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Move a node, returning its previous position
    pub fn set_position(&mut self, id: NodeId, position: Position) -> Result<Position, EditRejection> {
        let node = self.node_mut(id)?;
        Ok(std::mem::replace(&mut node.position, position))
    }

    /// Change a node's frequency, returning the previous one
    pub fn set_frequency(&mut self, id: NodeId, frequency: f64) -> Result<f64, EditRejection> {
        let frequency = validate_frequency(frequency)?;
        let node = self.node_mut(id)?;
        Ok(std::mem::replace(&mut node.frequency, frequency))
    }

    /// Recolor a node, returning the previous color
    pub fn set_color(&mut self, id: NodeId, color: Color) -> Result<Color, EditRejection> {
        let node = self.node_mut(id)?;
        Ok(std::mem::replace(&mut node.color, color))
    }

    /// Give a node a new, unused id. Incident edges follow the node.
    pub fn rename_node(&mut self, from: NodeId, to: NodeId) -> Result<(), EditRejection> {
        if from == to {
            return Ok(());
        }
        if self.nodes.contains_key(&to) {
            return Err(EditRejection::DuplicateNode(to));
        }
        let mut node = self
            .nodes
            .remove(&from)
            .ok_or(EditRejection::UnknownNode(from))?;
        node.id = to;
        self.nodes.insert(to, node);
        let edges = std::mem::take(&mut self.edges);
        self.edges = edges
            .into_values()
            .map(|mut edge| {
                edge.rename_endpoint(from, to);
                (edge.key(), edge)
            })
            .collect();
        Ok(())
    }

    /// Exchange the ids of two existing nodes. Edges follow their nodes.
    pub fn swap_node_ids(&mut self, a: NodeId, b: NodeId) -> Result<(), EditRejection> {
        if a == b {
            return Ok(());
        }
        if !self.nodes.contains_key(&b) {
            return Err(EditRejection::UnknownNode(b));
        }
        let mut first = self.nodes.remove(&a).ok_or(EditRejection::UnknownNode(a))?;
        let mut second = self.nodes.remove(&b).ok_or(EditRejection::UnknownNode(b))?;
        first.id = b;
        second.id = a;
        self.nodes.insert(b, first);
        self.nodes.insert(a, second);
        self.remap_edges(|id| {
            if id == a {
                b
            } else if id == b {
                a
            } else {
                id
            }
        });
        Ok(())
    }

    fn node_mut(&mut self, id: NodeId) -> Result<&mut Node, EditRejection> {
        self.nodes.get_mut(&id).ok_or(EditRejection::UnknownNode(id))
    }

    fn remap_edges(&mut self, map: impl Fn(NodeId) -> NodeId) {
        let edges = std::mem::take(&mut self.edges);
        self.edges = edges
            .into_values()
            .map(|mut edge| {
                edge.start = map(edge.start);
                edge.end = map(edge.end);
                (edge.key(), edge)
            })
            .collect();
    }

    // ==================== Edges ====================

    /// Connect two nodes.
    ///
    /// Rejected for self-loops, unknown endpoints, or when the pair is
    /// already connected in either orientation.
    pub fn add_edge(
        &mut self,
        start: NodeId,
        end: NodeId,
        bidirectional: bool,
    ) -> Result<Edge, EditRejection> {
        self.insert_edge(Edge {
            start,
            end,
            bidirectional,
        })
    }

    /// Insert a fully specified edge, with the same checks as [`add_edge`](Self::add_edge)
    pub fn insert_edge(&mut self, edge: Edge) -> Result<Edge, EditRejection> {
        if edge.start == edge.end {
            return Err(EditRejection::SelfLoop(edge.start));
        }
        for id in [edge.start, edge.end] {
            if !self.nodes.contains_key(&id) {
                return Err(EditRejection::UnknownNode(id));
            }
        }
        if self.edges.contains_key(&edge.key()) {
            return Err(EditRejection::DuplicateEdge(edge.start, edge.end));
        }
        self.edges.insert(edge.key(), edge);
        Ok(edge)
    }

    /// Remove the edge between `a` and `b` (either orientation)
    pub fn remove_edge(&mut self, a: NodeId, b: NodeId) -> Option<Edge> {
        self.edges.remove(&EdgeKey::new(a, b))
    }

    /// Swap the direction of a directed edge
    pub fn invert(&mut self, a: NodeId, b: NodeId) -> Result<Edge, EditRejection> {
        let edge = self.edge_mut(a, b)?;
        if edge.bidirectional {
            return Err(EditRejection::BidirectionalInvert(edge.start, edge.end));
        }
        *edge = edge.inverted();
        Ok(*edge)
    }

    /// Flip an edge between directed and bidirectional
    pub fn toggle_bidirectional(&mut self, a: NodeId, b: NodeId) -> Result<Edge, EditRejection> {
        let edge = self.edge_mut(a, b)?;
        edge.bidirectional = !edge.bidirectional;
        Ok(*edge)
    }

    pub fn edge(&self, a: NodeId, b: NodeId) -> Option<&Edge> {
        self.edges.get(&EdgeKey::new(a, b))
    }

    pub fn edges(&self) -> impl Iterator<Item = &Edge> {
        self.edges.values()
    }

    /// Edges with `id` as either endpoint
    pub fn incident_edges(&self, id: NodeId) -> impl Iterator<Item = &Edge> {
        self.edges.values().filter(move |edge| edge.touches(id))
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    fn edge_mut(&mut self, a: NodeId, b: NodeId) -> Result<&mut Edge, EditRejection> {
        self.edges
            .get_mut(&EdgeKey::new(a, b))
            .ok_or(EditRejection::UnknownEdge(a, b))
    }

    // ==================== Whole graph ====================

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn clear(&mut self) {
        self.nodes.clear();
        self.edges.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store_with(ids: &[u32]) -> GraphStore {
        let mut store = GraphStore::new();
        for &id in ids {
            store.add_node(Node::new(id, 1.0)).unwrap();
        }
        store
    }

    #[test]
    fn test_add_duplicate_node() {
        let mut store = store_with(&[1]);
        assert_eq!(
            store.add_node(Node::new(1, 2.0)),
            Err(EditRejection::DuplicateNode(NodeId(1)))
        );
        assert_eq!(store.node(NodeId(1)).unwrap().frequency, 1.0);
    }

    #[test]
    fn test_duplicate_edge_either_direction() {
        let mut store = store_with(&[1, 2]);
        store.add_edge(NodeId(1), NodeId(2), false).unwrap();

        assert!(matches!(
            store.add_edge(NodeId(2), NodeId(1), false),
            Err(EditRejection::DuplicateEdge(_, _))
        ));
        assert!(matches!(
            store.add_edge(NodeId(1), NodeId(2), true),
            Err(EditRejection::DuplicateEdge(_, _))
        ));
        assert_eq!(store.edge_count(), 1);
    }

    #[test]
    fn test_self_loop_rejected() {
        let mut store = store_with(&[1]);
        assert_eq!(
            store.add_edge(NodeId(1), NodeId(1), true),
            Err(EditRejection::SelfLoop(NodeId(1)))
        );
    }

    #[test]
    fn test_edge_to_missing_node_rejected() {
        let mut store = store_with(&[1]);
        assert_eq!(
            store.add_edge(NodeId(1), NodeId(7), true),
            Err(EditRejection::UnknownNode(NodeId(7)))
        );
    }

    #[test]
    fn test_remove_node_reports_incident_edges() {
        let mut store = store_with(&[1, 2, 3]);
        store.add_edge(NodeId(1), NodeId(2), true).unwrap();
        store.add_edge(NodeId(3), NodeId(2), false).unwrap();
        store.add_edge(NodeId(1), NodeId(3), false).unwrap();

        let (node, edges) = store.remove_node(NodeId(2)).unwrap();
        assert_eq!(node.id, NodeId(2));
        assert_eq!(edges.len(), 2);
        assert!(edges.iter().all(|e| e.touches(NodeId(2))));
        assert_eq!(store.edge_count(), 1);
        assert!(store.remove_node(NodeId(2)).is_none());
    }

    #[test]
    fn test_invert_directed_edge() {
        let mut store = store_with(&[1, 2]);
        store.add_edge(NodeId(1), NodeId(2), false).unwrap();

        let edge = store.invert(NodeId(2), NodeId(1)).unwrap();
        assert_eq!((edge.start, edge.end), (NodeId(2), NodeId(1)));
    }

    #[test]
    fn test_invert_bidirectional_rejected() {
        let mut store = store_with(&[1, 2]);
        store.add_edge(NodeId(1), NodeId(2), true).unwrap();
        assert!(matches!(
            store.invert(NodeId(1), NodeId(2)),
            Err(EditRejection::BidirectionalInvert(_, _))
        ));
        assert_eq!(store.edge(NodeId(1), NodeId(2)).unwrap().start, NodeId(1));
    }

    #[test]
    fn test_toggle_bidirectional() {
        let mut store = store_with(&[1, 2]);
        store.add_edge(NodeId(1), NodeId(2), true).unwrap();
        assert!(!store.toggle_bidirectional(NodeId(1), NodeId(2)).unwrap().bidirectional);
        assert!(store.toggle_bidirectional(NodeId(2), NodeId(1)).unwrap().bidirectional);
    }

    #[test]
    fn test_rename_moves_edges() {
        let mut store = store_with(&[1, 2]);
        store.add_edge(NodeId(1), NodeId(2), false).unwrap();

        store.rename_node(NodeId(2), NodeId(3)).unwrap();
        assert!(store.contains_node(NodeId(3)));
        assert!(!store.contains_node(NodeId(2)));
        let edge = store.edge(NodeId(1), NodeId(3)).unwrap();
        assert_eq!((edge.start, edge.end), (NodeId(1), NodeId(3)));

        assert_eq!(
            store.rename_node(NodeId(3), NodeId(1)),
            Err(EditRejection::DuplicateNode(NodeId(1)))
        );
    }

    #[test]
    fn test_swap_ids_keeps_direction_with_nodes() {
        let mut store = store_with(&[1, 2, 3]);
        store.set_frequency(NodeId(1), 5.0).unwrap();
        store.add_edge(NodeId(1), NodeId(2), false).unwrap();
        store.add_edge(NodeId(3), NodeId(1), false).unwrap();

        store.swap_node_ids(NodeId(1), NodeId(2)).unwrap();

        assert_eq!(store.node(NodeId(2)).unwrap().frequency, 5.0);
        let edge = store.edge(NodeId(1), NodeId(2)).unwrap();
        assert_eq!((edge.start, edge.end), (NodeId(2), NodeId(1)));
        let edge = store.edge(NodeId(3), NodeId(2)).unwrap();
        assert_eq!((edge.start, edge.end), (NodeId(3), NodeId(2)));
    }

    #[test]
    fn test_set_frequency_validates() {
        let mut store = store_with(&[1]);
        assert_eq!(store.set_frequency(NodeId(1), 2.5), Ok(1.0));
        assert!(store.set_frequency(NodeId(1), 250.0).is_err());
        assert_eq!(store.node(NodeId(1)).unwrap().frequency, 2.5);
    }

    #[test]
    fn test_equality_ignores_edit_order() {
        let mut a = store_with(&[1, 2, 3]);
        a.add_edge(NodeId(1), NodeId(2), true).unwrap();
        a.add_edge(NodeId(2), NodeId(3), false).unwrap();

        let mut b = store_with(&[3, 2, 1]);
        b.add_edge(NodeId(2), NodeId(3), false).unwrap();
        b.add_edge(NodeId(1), NodeId(2), true).unwrap();

        assert_eq!(a, b);
    }
}
