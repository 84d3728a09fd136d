//! Network editor
//!
//! [`NetworkEditor`] is the controller the user interface talks to. Each
//! user action is validated, applied to the [`NetworkModel`] and recorded in
//! the [`CommandHistory`] as a [`Command`], so every edit can be undone and
//! redone. Rejected edits leave the network and the history untouched.
//!
//! # Example
//!
//! ```ignore
//! use oscnet_rs::editor::NetworkEditor;
//!
//! let mut editor = NetworkEditor::default();
//! let a = editor.add_node(Some(1.0), None)?;
//! let b = editor.add_node(Some(2.0), None)?;
//! editor.add_edge(a, b, Some(false))?;
//!
//! editor.undo();
//! assert_eq!(editor.store().edge_count(), 0);
//!
//! let frame = editor.coupling_matrix().encode();
//! ```

pub mod command;
pub mod model;

pub use command::Command;
pub use model::{ChannelObserver, GraphEvent, GraphObserver, NetworkModel};

use crate::config::{AppConfig, EditorConfig, HistoryConfig, NetworkFile};
use crate::error::{EditRejection, OscNetError, Result};
use crate::graph::{GraphStore, IdAllocator};
use crate::history::{CommandHistory, Reversible};
use crate::protocol::matrix::CouplingMatrix;
use crate::types::{validate_frequency, Color, Edge, Node, NodeId, Position};
use std::path::Path;

/// Controller over the network model and its undo history
#[derive(Debug)]
pub struct NetworkEditor {
    model: NetworkModel,
    history: CommandHistory<Command>,
    defaults: EditorConfig,
}

impl Default for NetworkEditor {
    fn default() -> Self {
        Self::new(EditorConfig::default(), &HistoryConfig::default())
    }
}

impl NetworkEditor {
    pub fn new(defaults: EditorConfig, history: &HistoryConfig) -> Self {
        Self {
            model: NetworkModel::new(),
            history: CommandHistory::with_max_depth(history.max_depth),
            defaults,
        }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(config.editor.clone(), &config.history)
    }

    pub fn model(&self) -> &NetworkModel {
        &self.model
    }

    pub fn store(&self) -> &GraphStore {
        self.model.store()
    }

    pub fn ids(&self) -> &IdAllocator {
        self.model.ids()
    }

    pub fn history(&self) -> &CommandHistory<Command> {
        &self.history
    }

    pub fn defaults(&self) -> &EditorConfig {
        &self.defaults
    }

    /// Register an observer for model changes, including undo/redo replays
    pub fn subscribe(&mut self, observer: Box<dyn GraphObserver>) {
        self.model.subscribe(observer);
    }

    fn record(&mut self, command: Command) {
        tracing::debug!("{}", command.label());
        self.history.record(command);
    }

    fn reject<T>(rejection: EditRejection) -> Result<T> {
        tracing::warn!("Edit rejected: {}", rejection);
        Err(rejection.into())
    }

    // ==================== Nodes ====================

    /// Add a node with the next free id
    ///
    /// Missing arguments fall back to the configured defaults.
    pub fn add_node(&mut self, frequency: Option<f64>, position: Option<Position>) -> Result<NodeId> {
        let frequency = match validate_frequency(frequency.unwrap_or(self.defaults.default_frequency)) {
            Ok(f) => f,
            Err(rejection) => return Self::reject(rejection),
        };
        let id = self.model.ids().next_id();
        let node = Node::new(id, frequency)
            .with_position(position.unwrap_or(self.defaults.canvas_center))
            .with_color(self.defaults.default_color);

        if let Err(rejection) = self.model.insert_node(node.clone()) {
            return Self::reject(rejection);
        }
        self.record(Command::AddNode(node));
        Ok(id)
    }

    /// Delete a node together with its incident edges, as one undo step
    pub fn delete_node(&mut self, id: NodeId) -> Result<Node> {
        let Some((node, edges)) = self.model.remove_node(id) else {
            return Self::reject(EditRejection::UnknownNode(id));
        };

        let command = if edges.is_empty() {
            Command::RemoveNode(node.clone())
        } else {
            let mut steps: Vec<Command> = edges.into_iter().map(Command::RemoveEdge).collect();
            steps.push(Command::RemoveNode(node.clone()));
            Command::Composite(steps)
        };
        self.record(command);
        Ok(node)
    }

    /// Move a node. Moving to the current position records nothing.
    pub fn move_node(&mut self, id: NodeId, to: Position) -> Result<()> {
        let from = match self.model.set_position(id, to) {
            Ok(from) => from,
            Err(rejection) => return Self::reject(rejection),
        };
        if from != to {
            self.record(Command::MoveNode { id, from, to });
        }
        Ok(())
    }

    pub fn edit_frequency(&mut self, id: NodeId, frequency: f64) -> Result<()> {
        let from = match self.model.set_frequency(id, frequency) {
            Ok(from) => from,
            Err(rejection) => return Self::reject(rejection),
        };
        if from != frequency {
            self.record(Command::SetFrequency { id, from, to: frequency });
        }
        Ok(())
    }

    pub fn edit_color(&mut self, id: NodeId, color: Color) -> Result<()> {
        let from = match self.model.set_color(id, color) {
            Ok(from) => from,
            Err(rejection) => return Self::reject(rejection),
        };
        if from != color {
            self.record(Command::SetColor { id, from, to: color });
        }
        Ok(())
    }

    /// Give a node a different id
    ///
    /// The new id must lie in `1..=max_id + 1`. If another node already
    /// uses it, the two nodes exchange ids. Edges follow their nodes.
    pub fn edit_node_id(&mut self, id: NodeId, new_id: u32) -> Result<()> {
        if !self.model.store().contains_node(id) {
            return Self::reject(EditRejection::UnknownNode(id));
        }
        let to = NodeId(new_id);
        if !self.model.ids().is_valid(to) {
            let max = self.model.ids().max_valid();
            tracing::warn!("Id {} rejected for node {}: valid range is 1-{}", new_id, id, max);
            return Err(OscNetError::InvalidId { id: new_id, max });
        }
        if to == id {
            return Ok(());
        }

        let swapped = self.model.ids().is_used(to);
        let applied = if swapped {
            self.model.swap_node_ids(id, to)
        } else {
            self.model.rename_node(id, to)
        };
        if let Err(rejection) = applied {
            return Self::reject(rejection);
        }
        self.record(Command::ChangeId { from: id, to, swapped });
        Ok(())
    }

    // ==================== Edges ====================

    /// Connect two nodes. `bidirectional` defaults to the configured default.
    pub fn add_edge(&mut self, start: NodeId, end: NodeId, bidirectional: Option<bool>) -> Result<Edge> {
        let bidirectional = bidirectional.unwrap_or(self.defaults.default_bidirectional);
        match self.model.insert_edge(Edge { start, end, bidirectional }) {
            Ok(edge) => {
                self.record(Command::AddEdge(edge));
                Ok(edge)
            }
            Err(rejection) => Self::reject(rejection),
        }
    }

    /// Remove the edge between two nodes (either orientation)
    pub fn delete_edge(&mut self, a: NodeId, b: NodeId) -> Result<Edge> {
        match self.model.remove_edge(a, b) {
            Some(edge) => {
                self.record(Command::RemoveEdge(edge));
                Ok(edge)
            }
            None => Self::reject(EditRejection::UnknownEdge(a, b)),
        }
    }

    /// Switch an edge between directed and bidirectional
    pub fn toggle_edge_direction(&mut self, a: NodeId, b: NodeId) -> Result<Edge> {
        match self.model.toggle_bidirectional(a, b) {
            Ok(edge) => {
                self.record(Command::ToggleBidirectional(edge.key()));
                Ok(edge)
            }
            Err(rejection) => Self::reject(rejection),
        }
    }

    /// Reverse a directed edge. Bidirectional edges are rejected.
    pub fn invert_edge(&mut self, a: NodeId, b: NodeId) -> Result<Edge> {
        match self.model.invert(a, b) {
            Ok(edge) => {
                self.record(Command::InvertEdge(edge.key()));
                Ok(edge)
            }
            Err(rejection) => Self::reject(rejection),
        }
    }

    // ==================== History ====================

    /// Undo the last edit. Returns false when there is nothing to undo.
    pub fn undo(&mut self) -> bool {
        self.history.undo(&mut self.model)
    }

    /// Redo the last undone edit. Returns false when there is nothing to redo.
    pub fn redo(&mut self) -> bool {
        self.history.redo(&mut self.model)
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    // ==================== Whole network ====================

    /// Coupling matrix of the current network, rows in ascending id order
    pub fn coupling_matrix(&self) -> CouplingMatrix {
        CouplingMatrix::from_store(self.model.store())
    }

    /// Replace the whole network. Either every node and edge is accepted or
    /// nothing changes. Clears the undo history.
    pub fn replace_network(&mut self, nodes: Vec<Node>, edges: Vec<Edge>) -> Result<()> {
        let mut store = GraphStore::new();
        for node in nodes {
            if !node.id.is_positive() {
                return Err(OscNetError::InvalidId {
                    id: node.id.get(),
                    max: u32::MAX,
                });
            }
            validate_frequency(node.frequency)?;
            store.add_node(node)?;
        }
        for edge in edges {
            store.insert_edge(edge)?;
        }
        let ids = IdAllocator::from_ids(store.node_ids());
        self.install(store, ids);
        Ok(())
    }

    fn install(&mut self, store: GraphStore, ids: IdAllocator) {
        tracing::info!(
            "Loaded network with {} nodes and {} edges",
            store.node_count(),
            store.edge_count()
        );
        self.model.replace(store, ids);
        self.history.clear();
    }

    /// Load a network file, replacing the current network
    pub fn load_file(&mut self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let (store, ids) = NetworkFile::load(path)?
            .to_network()
            .map_err(|e| e.with_context(format!("Invalid network in {:?}", path)))?;
        self.install(store, ids);
        Ok(())
    }

    /// Save the current network
    pub fn save_file(&self, path: impl AsRef<Path>) -> Result<()> {
        NetworkFile::from_store(self.model.store()).save(path.as_ref())?;
        tracing::info!("Saved network to {:?}", path.as_ref());
        Ok(())
    }

    /// Remove every node and edge and forget the history
    pub fn clear(&mut self) {
        self.model.clear();
        self.history.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn editor_with_nodes(count: usize) -> (NetworkEditor, Vec<NodeId>) {
        let mut editor = NetworkEditor::default();
        let ids = (0..count)
            .map(|i| editor.add_node(Some(1.0 + i as f64), None).unwrap())
            .collect();
        (editor, ids)
    }

    #[test]
    fn test_add_node_uses_next_id_and_defaults() {
        let (mut editor, ids) = editor_with_nodes(2);
        assert_eq!(ids, vec![NodeId(1), NodeId(2)]);

        let id = editor.add_node(None, None).unwrap();
        let node = editor.store().node(id).unwrap();
        assert_eq!(node.frequency, 1.0);
        assert_eq!(node.color, Color::DEFAULT_NODE);
    }

    #[test]
    fn test_add_node_rejects_bad_frequency() {
        let mut editor = NetworkEditor::default();
        assert!(editor.add_node(Some(0.0), None).is_err());
        assert!(editor.store().is_empty());
        assert!(!editor.can_undo());
    }

    #[test]
    fn test_delete_node_undo_restores_edges() {
        let (mut editor, ids) = editor_with_nodes(3);
        editor.add_edge(ids[0], ids[1], Some(true)).unwrap();
        editor.add_edge(ids[1], ids[2], Some(false)).unwrap();
        let before = editor.store().clone();

        editor.delete_node(ids[1]).unwrap();
        assert_eq!(editor.store().edge_count(), 0);
        assert_eq!(editor.ids().next_id(), NodeId(2));

        assert!(editor.undo());
        assert_eq!(editor.store(), &before);
        assert!(editor.ids().is_used(NodeId(2)));

        assert!(editor.redo());
        assert_eq!(editor.store().node_count(), 2);
        assert_eq!(editor.store().edge_count(), 0);
    }

    #[test]
    fn test_deleted_id_is_reused() {
        let (mut editor, ids) = editor_with_nodes(3);
        editor.delete_node(ids[0]).unwrap();
        assert_eq!(editor.add_node(None, None).unwrap(), NodeId(1));
    }

    #[test]
    fn test_rejected_edges_are_not_recorded() {
        let (mut editor, ids) = editor_with_nodes(2);
        editor.add_edge(ids[0], ids[1], Some(false)).unwrap();
        let depth = editor.history().undo_len();

        assert!(editor.add_edge(ids[1], ids[0], Some(false)).is_err());
        assert!(editor.add_edge(ids[0], ids[0], None).is_err());
        assert!(editor.add_edge(ids[0], NodeId(9), None).is_err());
        assert_eq!(editor.history().undo_len(), depth);
    }

    #[test]
    fn test_invert_and_toggle_undo() {
        let (mut editor, ids) = editor_with_nodes(2);
        editor.add_edge(ids[0], ids[1], Some(false)).unwrap();

        let inverted = editor.invert_edge(ids[0], ids[1]).unwrap();
        assert_eq!(inverted.start, ids[1]);
        editor.undo();
        assert_eq!(editor.store().edge(ids[0], ids[1]).unwrap().start, ids[0]);

        editor.toggle_edge_direction(ids[0], ids[1]).unwrap();
        assert!(matches!(
            editor.invert_edge(ids[0], ids[1]),
            Err(OscNetError::Rejected(EditRejection::BidirectionalInvert(_, _)))
        ));
        editor.undo();
        assert!(!editor.store().edge(ids[0], ids[1]).unwrap().bidirectional);
    }

    #[test]
    fn test_edit_node_id_rename_and_swap() {
        let (mut editor, ids) = editor_with_nodes(3);
        editor.add_edge(ids[0], ids[2], Some(false)).unwrap();
        let f1 = editor.store().node(NodeId(1)).unwrap().frequency;

        // swap 1 <-> 3
        editor.edit_node_id(NodeId(1), 3).unwrap();
        assert_eq!(editor.store().node(NodeId(3)).unwrap().frequency, f1);
        let edge = editor.store().edge(NodeId(1), NodeId(3)).unwrap();
        assert_eq!((edge.start, edge.end), (NodeId(3), NodeId(1)));

        // rename 2 -> 4 leaves 2 free
        editor.edit_node_id(NodeId(2), 4).unwrap();
        assert_eq!(editor.ids().next_id(), NodeId(2));

        editor.undo();
        editor.undo();
        assert_eq!(editor.store().node(NodeId(1)).unwrap().frequency, f1);
        assert_eq!(editor.ids().next_id(), NodeId(4));
    }

    #[test]
    fn test_edit_node_id_rejects_gap() {
        let (mut editor, _) = editor_with_nodes(3);
        let depth = editor.history().undo_len();

        let err = editor.edit_node_id(NodeId(1), 5).unwrap_err();
        assert!(matches!(err, OscNetError::InvalidId { id: 5, max: 4 }));
        assert!(editor.edit_node_id(NodeId(1), 0).is_err());
        assert!(editor.store().contains_node(NodeId(1)));
        assert_eq!(editor.history().undo_len(), depth);
    }

    #[test]
    fn test_attribute_edits_undo() {
        let (mut editor, ids) = editor_with_nodes(1);
        editor.move_node(ids[0], Position::new(5.0, 6.0)).unwrap();
        editor.edit_frequency(ids[0], 42.0).unwrap();
        editor.edit_color(ids[0], Color::rgb(1, 2, 3)).unwrap();
        assert!(editor.edit_frequency(ids[0], 101.0).is_err());

        editor.undo();
        editor.undo();
        editor.undo();
        let node = editor.store().node(ids[0]).unwrap();
        assert_eq!(node.position, Position::default());
        assert_eq!(node.frequency, 1.0);
        assert_eq!(node.color, Color::DEFAULT_NODE);
    }

    #[test]
    fn test_unchanged_edits_are_not_recorded() {
        let (mut editor, ids) = editor_with_nodes(1);
        let depth = editor.history().undo_len();
        editor.move_node(ids[0], Position::default()).unwrap();
        editor.edit_frequency(ids[0], 1.0).unwrap();
        editor.edit_node_id(ids[0], 1).unwrap();
        assert_eq!(editor.history().undo_len(), depth);
    }

    #[test]
    fn test_record_after_undo_clears_redo() {
        let (mut editor, ids) = editor_with_nodes(3);
        editor.add_edge(ids[0], ids[1], None).unwrap();
        editor.undo();
        editor.undo();
        editor.add_edge(ids[0], ids[1], None).unwrap();
        assert!(!editor.redo());
    }

    #[test]
    fn test_coupling_matrix() {
        let (mut editor, ids) = editor_with_nodes(3);
        editor.add_edge(ids[0], ids[1], Some(true)).unwrap();
        editor.add_edge(ids[1], ids[2], Some(false)).unwrap();
        assert_eq!(editor.coupling_matrix().encode(), b"<0,1,0;1,0,1;0,0,0>".to_vec());
    }

    #[test]
    fn test_replace_network_is_atomic() {
        let (mut editor, _) = editor_with_nodes(2);
        let before = editor.store().clone();

        let result = editor.replace_network(
            vec![Node::new(1, 1.0), Node::new(2, 1.0)],
            vec![Edge::new(1, 2, true), Edge::new(2, 1, false)],
        );
        assert!(result.is_err());
        assert_eq!(editor.store(), &before);
        assert!(editor.can_undo());

        editor
            .replace_network(vec![Node::new(1, 1.0), Node::new(3, 1.0)], vec![Edge::new(3, 1, false)])
            .unwrap();
        assert_eq!(editor.store().node_count(), 2);
        assert!(!editor.can_undo());
        assert_eq!(editor.ids().next_id(), NodeId(2));
    }

    #[test]
    fn test_clear() {
        let (mut editor, _) = editor_with_nodes(2);
        editor.clear();
        assert!(editor.store().is_empty());
        assert!(!editor.can_undo());
        assert_eq!(editor.ids().next_id(), NodeId(1));
    }

    #[derive(Debug, Clone)]
    enum Action {
        AddNode(f64),
        DeleteNode(u32),
        AddEdge(u32, u32, bool),
        DeleteEdge(u32, u32),
        Toggle(u32, u32),
        Invert(u32, u32),
        Move(u32, f64),
        Frequency(u32, f64),
        ChangeId(u32, u32),
        Undo,
        Redo,
    }

    fn action() -> impl Strategy<Value = Action> {
        let id = 1u32..7;
        prop_oneof![
            (0.01f64..100.0).prop_map(Action::AddNode),
            id.clone().prop_map(Action::DeleteNode),
            (id.clone(), id.clone(), any::<bool>()).prop_map(|(a, b, bi)| Action::AddEdge(a, b, bi)),
            (id.clone(), id.clone()).prop_map(|(a, b)| Action::DeleteEdge(a, b)),
            (id.clone(), id.clone()).prop_map(|(a, b)| Action::Toggle(a, b)),
            (id.clone(), id.clone()).prop_map(|(a, b)| Action::Invert(a, b)),
            (id.clone(), -50.0f64..50.0).prop_map(|(a, x)| Action::Move(a, x)),
            (id.clone(), 0.01f64..100.0).prop_map(|(a, f)| Action::Frequency(a, f)),
            (id.clone(), id).prop_map(|(a, b)| Action::ChangeId(a, b)),
            any::<bool>().prop_map(|undo| if undo { Action::Undo } else { Action::Redo }),
        ]
    }

    fn perform(editor: &mut NetworkEditor, action: &Action) {
        // Rejections are expected for many random actions
        let _ = match *action {
            Action::AddNode(f) => editor.add_node(Some(f), None).map(|_| ()),
            Action::DeleteNode(id) => editor.delete_node(NodeId(id)).map(|_| ()),
            Action::AddEdge(a, b, bi) => editor.add_edge(NodeId(a), NodeId(b), Some(bi)).map(|_| ()),
            Action::DeleteEdge(a, b) => editor.delete_edge(NodeId(a), NodeId(b)).map(|_| ()),
            Action::Toggle(a, b) => editor.toggle_edge_direction(NodeId(a), NodeId(b)).map(|_| ()),
            Action::Invert(a, b) => editor.invert_edge(NodeId(a), NodeId(b)).map(|_| ()),
            Action::Move(id, x) => editor.move_node(NodeId(id), Position::new(x, -x)),
            Action::Frequency(id, f) => editor.edit_frequency(NodeId(id), f),
            Action::ChangeId(id, to) => editor.edit_node_id(NodeId(id), to),
            Action::Undo => {
                editor.undo();
                Ok(())
            }
            Action::Redo => {
                editor.redo();
                Ok(())
            }
        };
    }

    proptest! {
        #[test]
        fn prop_undo_then_redo_restores_state(actions in prop::collection::vec(action(), 1..60)) {
            let mut editor = NetworkEditor::default();
            for action in &actions {
                perform(&mut editor, action);

                let store = editor.store().clone();
                let ids = editor.ids().clone();
                if editor.undo() {
                    prop_assert!(editor.redo());
                    prop_assert_eq!(editor.store(), &store);
                    prop_assert_eq!(editor.ids(), &ids);
                }
            }
        }

        #[test]
        fn prop_undo_everything_empties_network(actions in prop::collection::vec(action(), 1..60)) {
            let mut editor = NetworkEditor::new(EditorConfig::default(), &HistoryConfig { max_depth: 0 });
            for action in &actions {
                perform(&mut editor, action);
            }
            while editor.undo() {}
            prop_assert!(editor.store().is_empty());
            prop_assert!(editor.ids().is_empty());
        }
    }
}
