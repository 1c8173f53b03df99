//! registry.rs
//! The owning structure for nodes and connections.
//!
//! Nodes live in a dense `Vec` whose order is the sweep order used by the
//! engine. An id -> slot index sits beside it and is rebuilt whenever a
//! removal shifts slots.

use super::error::GraphError;
use super::types::*;
use smallvec::SmallVec;
use std::collections::HashMap;

/// Incoming signals for one node. Most nodes have a handful of fan-in edges,
/// so these stay on the stack.
pub type Incoming = SmallVec<[f64; 4]>;

#[derive(Debug, Clone, Default)]
pub struct Graph {
    pub(crate) nodes: Vec<Node>,
    pub(crate) connections: Vec<Connection>,

    // Ephemeral lookup state (rebuilt on removal and load)
    slots: HashMap<NodeId, usize>,
    next_id: u64,
}

impl PartialEq for Graph {
    fn eq(&self, other: &Self) -> bool {
        self.nodes == other.nodes && self.connections == other.connections
    }
}

impl Graph {
    pub fn new() -> Self { Self::default() }
    pub fn len(&self) -> usize { self.nodes.len() }
    pub fn is_empty(&self) -> bool { self.nodes.is_empty() }

    pub fn nodes(&self) -> &[Node] { &self.nodes }
    pub fn connections(&self) -> &[Connection] { &self.connections }

    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.slots.get(&id).map(|&slot| &self.nodes[slot])
    }

    pub fn contains(&self, id: NodeId) -> bool { self.slots.contains_key(&id) }

    #[inline(always)]
    pub(crate) fn slot_of(&self, id: NodeId) -> Option<usize> {
        self.slots.get(&id).copied()
    }

    pub fn value_of(&self, id: NodeId) -> Option<Signal> {
        self.node(id).map(|n| n.value)
    }

    fn allocate_id(&mut self) -> NodeId {
        // Never hand out an id that is still in use, even after a load
        // that brought in arbitrary ids. Past u64::MAX the search wraps to 1.
        let mut candidate = self.next_id.max(1);
        while self.slots.contains_key(&NodeId(candidate)) {
            candidate = candidate.checked_add(1).unwrap_or(1);
        }
        self.next_id = candidate.saturating_add(1);
        NodeId(candidate)
    }

    fn rebuild_slots(&mut self) {
        self.slots = self.nodes.iter().enumerate().map(|(i, n)| (n.id, i)).collect();
    }

    /// Creates a node with its kind defaults and returns the new id.
    pub fn add_node(&mut self, kind: NodeKind, position: Position) -> NodeId {
        let id = self.allocate_id();
        self.slots.insert(id, self.nodes.len());
        self.nodes.push(Node::new(id, kind, position));
        id
    }

    /// Inserts a fully-formed node, keeping its id. Used when loading documents.
    pub fn insert_node(&mut self, node: Node) -> Result<NodeId, GraphError> {
        let id = node.id;
        if self.slots.contains_key(&id) {
            return Err(GraphError::DuplicateNodeId(id));
        }
        self.next_id = self.next_id.max(id.0.saturating_add(1));
        self.slots.insert(id, self.nodes.len());
        self.nodes.push(node);
        Ok(id)
    }

    /// Removes the node and every connection that touches it.
    pub fn remove_node(&mut self, id: NodeId) -> Result<Node, GraphError> {
        let slot = self.slot_of(id).ok_or(GraphError::NodeNotFound(id))?;
        let node = self.nodes.remove(slot);
        self.connections.retain(|c| !c.touches(id));
        self.rebuild_slots();
        Ok(node)
    }

    /// Appends a connection. Parallel duplicates and self-loops are accepted;
    /// both endpoints must exist.
    pub fn add_connection(&mut self, from: NodeId, to: NodeId) -> Result<(), GraphError> {
        for id in [from, to] {
            if !self.contains(id) {
                return Err(GraphError::NodeNotFound(id));
            }
        }
        self.connections.push(Connection::new(from, to));
        Ok(())
    }

    /// Appends a connection without checking its endpoints. Hand-edited
    /// documents can carry dangling references; they read as OFF sources.
    pub(crate) fn push_connection_unchecked(&mut self, connection: Connection) {
        self.connections.push(connection);
    }

    /// Removes every connection matching the predicate. Returns how many went.
    pub fn remove_connections<F>(&mut self, mut predicate: F) -> usize
    where
        F: FnMut(&Connection) -> bool,
    {
        let before = self.connections.len();
        self.connections.retain(|c| !predicate(c));
        before - self.connections.len()
    }

    /// Live source values feeding `id`, in connection order.
    ///
    /// OFF sources and sources that no longer exist are skipped. Duplicate
    /// connections contribute once per connection.
    pub fn incoming_values(&self, id: NodeId) -> Incoming {
        self.connections
            .iter()
            .filter(|c| c.to == id)
            .filter_map(|c| self.node(c.from).and_then(|n| n.value.value()))
            .collect()
    }

    /// Applies a validated partial update. Nothing is written if any field
    /// is rejected.
    pub fn update_node(&mut self, id: NodeId, patch: NodePatch) -> Result<(), GraphError> {
        let slot = self.slot_of(id).ok_or(GraphError::NodeNotFound(id))?;
        let kind = self.nodes[slot].kind;

        if let Some(signal) = patch.value {
            if kind != NodeKind::Input {
                return Err(GraphError::NotAnInput { id, kind });
            }
            if let Some(v) = signal.value() {
                if !v.is_finite() {
                    return Err(GraphError::NonFinite { field: "value" });
                }
                if v < 0.0 {
                    return Err(GraphError::InvalidValue { id, value: v });
                }
            }
        }
        if let Some(t) = patch.threshold {
            if !t.is_finite() {
                return Err(GraphError::NonFinite { field: "threshold" });
            }
        }
        if let Some(tol) = patch.tolerance {
            if !tol.is_finite() {
                return Err(GraphError::NonFinite { field: "tolerance" });
            }
            if tol < 0.0 {
                return Err(GraphError::NegativeTolerance(tol));
            }
        }

        let node = &mut self.nodes[slot];
        if let Some(signal) = patch.value { node.value = signal; }
        if let Some(t) = patch.threshold { node.threshold = t; }
        if let Some(mode) = patch.compare_mode { node.compare_mode = mode; }
        if let Some(tol) = patch.tolerance { node.tolerance = tol; }
        if let Some(op) = patch.aggregate_op { node.aggregate_op = op; }
        Ok(())
    }

    #[inline(always)]
    pub(crate) fn set_value_at(&mut self, slot: usize, value: Signal) {
        self.nodes[slot].value = value;
    }

    /// Drops every node and connection.
    pub fn clear(&mut self) {
        self.nodes.clear();
        self.connections.clear();
        self.slots.clear();
    }

    /// Turns every non-INPUT node OFF. Inputs keep their values.
    pub fn reset_values(&mut self) {
        for node in self.nodes.iter_mut().filter(|n| n.kind != NodeKind::Input) {
            node.value = Signal::OFF;
        }
    }

    /// First node (in node order) within `radius` of `point`.
    pub fn node_at(&self, point: Position, radius: f64) -> Option<NodeId> {
        self.nodes
            .iter()
            .find(|n| n.position.distance_to(point) < radius)
            .map(|n| n.id)
    }

    pub fn is_occupied(&self, position: Position) -> bool {
        self.nodes.iter().any(|n| n.position == position)
    }
}
