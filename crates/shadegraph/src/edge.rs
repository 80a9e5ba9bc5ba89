// SPDX-License-Identifier: MIT OR Apache-2.0
//! Edge definitions connecting node slots.

use crate::node::NodeId;
use crate::slot::SlotRef;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for an edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EdgeId(pub Uuid);

impl EdgeId {
    /// Create a new random edge ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for EdgeId {
    fn default() -> Self {
        Self::new()
    }
}

/// A directed connection from an output slot to an input slot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Edge {
    /// Unique edge ID.
    pub id: EdgeId,
    /// Source (output) slot.
    pub from: SlotRef,
    /// Destination (input) slot.
    pub to: SlotRef,
}

impl Edge {
    /// Create a new edge.
    pub fn new(from: SlotRef, to: SlotRef) -> Self {
        Self {
            id: EdgeId::new(),
            from,
            to,
        }
    }

    /// Whether this edge touches a specific node.
    pub fn involves_node(&self, node_id: NodeId) -> bool {
        self.from.node == node_id || self.to.node == node_id
    }

    /// Whether this edge touches a specific slot.
    pub fn involves_slot(&self, slot_ref: SlotRef) -> bool {
        self.from == slot_ref || self.to == slot_ref
    }
}
