//! Reversible edit commands
//!
//! Each [`Command`] describes an edit that has already been applied to a
//! [`NetworkModel`] and carries enough state to revert and re-apply it.
//! Nodes and edges are referenced by id, never by pointer, so a command
//! stays meaningful while the history replays around it.

use crate::editor::model::NetworkModel;
use crate::error::EditRejection;
use crate::history::Reversible;
use crate::types::{Color, Edge, EdgeKey, Node, NodeId, Position};

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    AddNode(Node),
    /// Removal of a node with no remaining edges; holds the node as it was
    RemoveNode(Node),
    AddEdge(Edge),
    RemoveEdge(Edge),
    MoveNode {
        id: NodeId,
        from: Position,
        to: Position,
    },
    SetFrequency {
        id: NodeId,
        from: f64,
        to: f64,
    },
    SetColor {
        id: NodeId,
        from: Color,
        to: Color,
    },
    /// Manual id edit. `swapped` is set when `to` belonged to another node
    /// and the two nodes exchanged ids.
    ChangeId {
        from: NodeId,
        to: NodeId,
        swapped: bool,
    },
    ToggleBidirectional(EdgeKey),
    InvertEdge(EdgeKey),
    /// Children are redone in order and undone in reverse order
    Composite(Vec<Command>),
}

impl Command {
    /// Undo/redo of a recorded command cannot fail while the history is
    /// linear; a failure here means the model was edited behind its back.
    fn replay<T>(&self, result: Result<T, EditRejection>) {
        if let Err(rejection) = result {
            tracing::warn!("Replaying {} failed: {}", self.label(), rejection);
        }
    }

    fn replay_found<T>(&self, result: Option<T>) {
        if result.is_none() {
            tracing::warn!("Replaying {} found nothing to remove", self.label());
        }
    }
}

impl Reversible for Command {
    type Target = NetworkModel;

    fn undo(&self, model: &mut NetworkModel) {
        match self {
            Command::AddNode(node) => self.replay_found(model.remove_node(node.id)),
            Command::RemoveNode(node) => self.replay(model.insert_node(node.clone())),
            Command::AddEdge(edge) => self.replay_found(model.remove_edge(edge.start, edge.end)),
            Command::RemoveEdge(edge) => self.replay(model.insert_edge(*edge)),
            Command::MoveNode { id, from, .. } => self.replay(model.set_position(*id, *from)),
            Command::SetFrequency { id, from, .. } => self.replay(model.set_frequency(*id, *from)),
            Command::SetColor { id, from, .. } => self.replay(model.set_color(*id, *from)),
            Command::ChangeId { from, to, swapped } => {
                if *swapped {
                    self.replay(model.swap_node_ids(*from, *to))
                } else {
                    self.replay(model.rename_node(*to, *from))
                }
            }
            Command::ToggleBidirectional(key) => {
                self.replay(model.toggle_bidirectional(key.low(), key.high()))
            }
            Command::InvertEdge(key) => self.replay(model.invert(key.low(), key.high())),
            Command::Composite(children) => {
                for child in children.iter().rev() {
                    child.undo(model);
                }
            }
        }
    }

    fn redo(&self, model: &mut NetworkModel) {
        match self {
            Command::AddNode(node) => self.replay(model.insert_node(node.clone())),
            Command::RemoveNode(node) => self.replay_found(model.remove_node(node.id)),
            Command::AddEdge(edge) => self.replay(model.insert_edge(*edge)),
            Command::RemoveEdge(edge) => self.replay_found(model.remove_edge(edge.start, edge.end)),
            Command::MoveNode { id, to, .. } => self.replay(model.set_position(*id, *to)),
            Command::SetFrequency { id, to, .. } => self.replay(model.set_frequency(*id, *to)),
            Command::SetColor { id, to, .. } => self.replay(model.set_color(*id, *to)),
            Command::ChangeId { from, to, swapped } => {
                if *swapped {
                    self.replay(model.swap_node_ids(*from, *to))
                } else {
                    self.replay(model.rename_node(*from, *to))
                }
            }
            Command::ToggleBidirectional(key) => {
                self.replay(model.toggle_bidirectional(key.low(), key.high()))
            }
            Command::InvertEdge(key) => self.replay(model.invert(key.low(), key.high())),
            Command::Composite(children) => {
                for child in children {
                    child.redo(model);
                }
            }
        }
    }

    fn label(&self) -> String {
        match self {
            Command::AddNode(node) => format!("add node {}", node.id),
            Command::RemoveNode(node) => format!("remove node {}", node.id),
            Command::AddEdge(edge) => format!("add edge {}", edge.key()),
            Command::RemoveEdge(edge) => format!("remove edge {}", edge.key()),
            Command::MoveNode { id, .. } => format!("move node {}", id),
            Command::SetFrequency { id, .. } => format!("set frequency of node {}", id),
            Command::SetColor { id, .. } => format!("set color of node {}", id),
            Command::ChangeId { from, to, .. } => format!("change id {} to {}", from, to),
            Command::ToggleBidirectional(key) => format!("toggle direction of edge {}", key),
            Command::InvertEdge(key) => format!("invert edge {}", key),
            Command::Composite(children) => match children.last() {
                Some(last) => format!("{} ({} steps)", last.label(), children.len()),
                None => String::from("empty edit"),
            },
        }
    }
}
