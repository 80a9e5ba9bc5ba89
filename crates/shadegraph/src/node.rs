// SPDX-License-Identifier: MIT OR Apache-2.0
//! Node definitions for the graph.

use crate::nodes::NodeKind;
use crate::slot::{Slot, SlotDirection, SlotId, SlotRef};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NodeId(pub Uuid);

impl NodeId {
    /// Create a new random node ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for NodeId {
    fn default() -> Self {
        Self::new()
    }
}

/// Invalidation granularity for pending changes.
///
/// Kept as a two-level enum rather than ad hoc booleans: a topological change
/// forces re-traversal, a graph-level change only forces a re-render.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ModificationScope {
    /// Values changed; emitted code must be refreshed but slot structure is intact.
    Graph,
    /// Slot structure changed; dependents must re-traverse.
    Topological,
}

/// Error looking up a slot on a node.
#[derive(Debug, thiserror::Error)]
pub enum SlotError {
    /// No slot with the given ID exists on the node.
    #[error("slot not found: {0:?}")]
    NotFound(SlotId),
}

/// A node instance in the graph.
///
/// A node owns its slots exclusively; edges referencing them are owned by the
/// graph and addressed through [`SlotRef`] handles.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Node {
    /// Unique instance ID.
    pub id: NodeId,
    /// Display name.
    pub name: String,
    /// Kind-specific configuration and behavior.
    pub kind: NodeKind,
    /// Slots keyed by ID, in declaration order.
    slots: IndexMap<SlotId, Slot>,
    /// Pending invalidation, if any.
    dirty: Option<ModificationScope>,
}

impl Node {
    /// Create a new node; its slot set is derived from the kind.
    pub fn new(name: impl Into<String>, kind: NodeKind) -> Self {
        let mut node = Self {
            id: NodeId::new(),
            name: name.into(),
            kind,
            slots: IndexMap::new(),
            dirty: None,
        };
        node.rebuild_slots();
        node
    }

    /// Insert a slot, or refresh an existing slot's metadata in place.
    ///
    /// Refreshing keeps the slot's declaration position; edges reference slots
    /// by ID so they survive a refresh untouched.
    pub fn add_slot(&mut self, slot: Slot) {
        if let Some(existing) = self.slots.get_mut(&slot.id) {
            *existing = slot;
        } else {
            self.slots.insert(slot.id, slot);
        }
    }

    /// Delete every slot whose ID is not in `keep`, returning the removed IDs.
    ///
    /// The caller (the graph) is responsible for dropping edges attached to
    /// the removed slots; slots cannot exist disconnected from their node.
    pub fn remove_slots_not_matching(&mut self, keep: &[SlotId]) -> Vec<SlotId> {
        let removed: Vec<SlotId> = self
            .slots
            .keys()
            .filter(|id| !keep.contains(id))
            .copied()
            .collect();
        self.slots.retain(|id, _| keep.contains(id));
        removed
    }

    /// Re-derive the slot set from the node kind, returning pruned slot IDs.
    ///
    /// Deterministic: called after construction, deserialization, and any
    /// kind-configuration change that reshapes the node.
    pub fn rebuild_slots(&mut self) -> Vec<SlotId> {
        let required = self.kind.required_slots();
        let keep: Vec<SlotId> = required.iter().map(|s| s.id).collect();
        for slot in required {
            self.add_slot(slot);
        }
        self.remove_slots_not_matching(&keep)
    }

    /// Look up a slot by ID.
    pub fn find_slot(&self, id: SlotId) -> Result<&Slot, SlotError> {
        self.slots.get(&id).ok_or(SlotError::NotFound(id))
    }

    /// Look up a slot by ID, `None` if absent.
    pub fn slot(&self, id: SlotId) -> Option<&Slot> {
        self.slots.get(&id)
    }

    /// All slots in declaration order.
    pub fn slots(&self) -> impl Iterator<Item = &Slot> {
        self.slots.values()
    }

    /// Input slots in declaration order.
    pub fn input_slots(&self) -> impl Iterator<Item = &Slot> {
        self.slots
            .values()
            .filter(|s| s.direction == SlotDirection::Input)
    }

    /// Output slots in declaration order.
    pub fn output_slots(&self) -> impl Iterator<Item = &Slot> {
        self.slots
            .values()
            .filter(|s| s.direction == SlotDirection::Output)
    }

    /// Reference to one of this node's slots.
    pub fn slot_ref(&self, slot: SlotId) -> SlotRef {
        SlotRef::new(self.id, slot)
    }

    /// Record a pending invalidation, merging with any existing one.
    ///
    /// `Topological` dominates `Graph`.
    pub fn mark_dirty(&mut self, scope: ModificationScope) {
        self.dirty = Some(match self.dirty {
            Some(existing) => existing.max(scope),
            None => scope,
        });
    }

    /// Clear and return the pending invalidation.
    pub fn take_dirty(&mut self) -> Option<ModificationScope> {
        self.dirty.take()
    }

    /// Whether an invalidation is pending.
    pub fn is_dirty(&self) -> bool {
        self.dirty.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::nodes::math::MathOp;
    use crate::slot::{SlotValue, SlotValueType};

    #[test]
    fn test_add_slot_refresh_keeps_position() {
        let mut node = Node::new("Add", NodeKind::Math(MathOp::Add));
        let order_before: Vec<SlotId> = node.slots().map(|s| s.id).collect();

        // Refresh the first slot with a new default.
        let refreshed = Slot::input(order_before[0], "A", SlotValueType::Dynamic)
            .with_default(SlotValue::Scalar(2.0));
        node.add_slot(refreshed);

        let order_after: Vec<SlotId> = node.slots().map(|s| s.id).collect();
        assert_eq!(order_before, order_after);
        assert_eq!(
            node.slot(order_before[0]).unwrap().default_value,
            SlotValue::Scalar(2.0)
        );
    }

    #[test]
    fn test_remove_slots_not_matching() {
        let mut node = Node::new("Add", NodeKind::Math(MathOp::Add));
        let ids: Vec<SlotId> = node.slots().map(|s| s.id).collect();
        assert_eq!(ids.len(), 3);

        let removed = node.remove_slots_not_matching(&[ids[0]]);
        assert_eq!(removed, vec![ids[1], ids[2]]);
        assert!(node.slot(ids[1]).is_none());
        assert!(node.find_slot(ids[0]).is_ok());
    }

    #[test]
    fn test_dirty_merge() {
        let mut node = Node::new("Add", NodeKind::Math(MathOp::Add));
        assert!(!node.is_dirty());

        node.mark_dirty(ModificationScope::Topological);
        node.mark_dirty(ModificationScope::Graph);
        assert_eq!(node.take_dirty(), Some(ModificationScope::Topological));
        assert!(!node.is_dirty());

        node.mark_dirty(ModificationScope::Graph);
        assert_eq!(node.take_dirty(), Some(ModificationScope::Graph));
    }
}
