//! Network model: graph store, id space and change observers
//!
//! [`NetworkModel`] is the single mutation point for the graph. Every
//! primitive mutation keeps the [`GraphStore`] and the [`IdAllocator`] in
//! step and publishes a [`GraphEvent`] to the registered observers, so
//! presentation code reacts to model changes without the model knowing
//! anything about it.

use crate::error::EditRejection;
use crate::graph::{GraphStore, IdAllocator};
use crate::types::{Color, Edge, Node, NodeId, Position};
use crossbeam_channel::Sender;

/// A primitive change to the network
#[derive(Debug, Clone, PartialEq)]
pub enum GraphEvent {
    NodeAdded(NodeId),
    NodeRemoved(NodeId),
    NodeMoved { id: NodeId, position: Position },
    FrequencyChanged { id: NodeId, frequency: f64 },
    ColorChanged { id: NodeId, color: Color },
    /// A node was given a previously unused id
    NodeRenamed { from: NodeId, to: NodeId },
    /// Two nodes exchanged ids
    NodesSwapped(NodeId, NodeId),
    EdgeAdded(Edge),
    EdgeRemoved(Edge),
    /// Direction or bidirectional flag of an edge changed
    EdgeChanged(Edge),
    /// The whole network was replaced or cleared
    Reset,
}

/// Receives every change applied to a [`NetworkModel`]
pub trait GraphObserver: Send {
    fn on_event(&mut self, event: &GraphEvent);
}

/// Forwards events over a crossbeam channel, e.g. to a UI thread
///
/// Events are dropped (and counted) when the channel is full or closed, so a
/// stalled consumer never blocks editing.
pub struct ChannelObserver {
    sender: Sender<GraphEvent>,
    dropped: u64,
}

impl ChannelObserver {
    pub fn new(sender: Sender<GraphEvent>) -> Self {
        Self { sender, dropped: 0 }
    }

    /// Number of events that could not be delivered
    pub fn dropped(&self) -> u64 {
        self.dropped
    }
}

impl GraphObserver for ChannelObserver {
    fn on_event(&mut self, event: &GraphEvent) {
        if self.sender.try_send(event.clone()).is_err() {
            self.dropped += 1;
        }
    }
}

/// The editable network: nodes, edges and the ids they use
#[derive(Default)]
pub struct NetworkModel {
    store: GraphStore,
    ids: IdAllocator,
    observers: Vec<Box<dyn GraphObserver>>,
}

impl std::fmt::Debug for NetworkModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NetworkModel")
            .field("store", &self.store)
            .field("ids", &self.ids)
            .field("observers", &self.observers.len())
            .finish()
    }
}

impl NetworkModel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn store(&self) -> &GraphStore {
        &self.store
    }

    pub fn ids(&self) -> &IdAllocator {
        &self.ids
    }

    /// Register an observer for all future events
    pub fn subscribe(&mut self, observer: Box<dyn GraphObserver>) {
        self.observers.push(observer);
    }

    fn notify(&mut self, event: GraphEvent) {
        for observer in &mut self.observers {
            observer.on_event(&event);
        }
    }

    // ==================== Nodes ====================

    pub fn insert_node(&mut self, node: Node) -> Result<(), EditRejection> {
        let id = node.id;
        self.store.add_node(node)?;
        self.ids.add(id);
        self.notify(GraphEvent::NodeAdded(id));
        Ok(())
    }

    /// Remove a node and its incident edges, releasing its id
    pub fn remove_node(&mut self, id: NodeId) -> Option<(Node, Vec<Edge>)> {
        let (node, edges) = self.store.remove_node(id)?;
        self.ids.release(id);
        for edge in &edges {
            self.notify(GraphEvent::EdgeRemoved(*edge));
        }
        self.notify(GraphEvent::NodeRemoved(id));
        Some((node, edges))
    }

    pub fn set_position(&mut self, id: NodeId, position: Position) -> Result<Position, EditRejection> {
        let previous = self.store.set_position(id, position)?;
        self.notify(GraphEvent::NodeMoved { id, position });
        Ok(previous)
    }

    pub fn set_frequency(&mut self, id: NodeId, frequency: f64) -> Result<f64, EditRejection> {
        let previous = self.store.set_frequency(id, frequency)?;
        self.notify(GraphEvent::FrequencyChanged { id, frequency });
        Ok(previous)
    }

    pub fn set_color(&mut self, id: NodeId, color: Color) -> Result<Color, EditRejection> {
        let previous = self.store.set_color(id, color)?;
        self.notify(GraphEvent::ColorChanged { id, color });
        Ok(previous)
    }

    /// Move a node to an unused id
    pub fn rename_node(&mut self, from: NodeId, to: NodeId) -> Result<(), EditRejection> {
        self.store.rename_node(from, to)?;
        self.ids.release(from);
        self.ids.add(to);
        self.notify(GraphEvent::NodeRenamed { from, to });
        Ok(())
    }

    /// Exchange the ids of two live nodes. The set of used ids is unchanged.
    pub fn swap_node_ids(&mut self, a: NodeId, b: NodeId) -> Result<(), EditRejection> {
        if !self.ids.swap(a, b) {
            let missing = if self.ids.is_used(a) { b } else { a };
            return Err(EditRejection::UnknownNode(missing));
        }
        self.store.swap_node_ids(a, b)?;
        self.notify(GraphEvent::NodesSwapped(a, b));
        Ok(())
    }

    // ==================== Edges ====================

    pub fn insert_edge(&mut self, edge: Edge) -> Result<Edge, EditRejection> {
        let edge = self.store.insert_edge(edge)?;
        self.notify(GraphEvent::EdgeAdded(edge));
        Ok(edge)
    }

    pub fn remove_edge(&mut self, a: NodeId, b: NodeId) -> Option<Edge> {
        let edge = self.store.remove_edge(a, b)?;
        self.notify(GraphEvent::EdgeRemoved(edge));
        Some(edge)
    }

    pub fn toggle_bidirectional(&mut self, a: NodeId, b: NodeId) -> Result<Edge, EditRejection> {
        let edge = self.store.toggle_bidirectional(a, b)?;
        self.notify(GraphEvent::EdgeChanged(edge));
        Ok(edge)
    }

    pub fn invert(&mut self, a: NodeId, b: NodeId) -> Result<Edge, EditRejection> {
        let edge = self.store.invert(a, b)?;
        self.notify(GraphEvent::EdgeChanged(edge));
        Ok(edge)
    }

    // ==================== Whole network ====================

    /// Swap in a fully built network. Observers are kept.
    pub fn replace(&mut self, store: GraphStore, ids: IdAllocator) {
        self.store = store;
        self.ids = ids;
        self.notify(GraphEvent::Reset);
    }

    pub fn clear(&mut self) {
        self.store.clear();
        self.ids.clear();
        self.notify(GraphEvent::Reset);
    }
}
