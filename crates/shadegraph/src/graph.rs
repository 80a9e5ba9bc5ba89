// SPDX-License-Identifier: MIT OR Apache-2.0
//! Graph data structure owning all nodes and edges.

use crate::edge::{Edge, EdgeId};
use crate::node::{ModificationScope, Node, NodeId};
use crate::properties::ShaderProperty;
use crate::slot::{SlotDirection, SlotId, SlotRef, SlotValueType};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// A material node graph.
///
/// The graph is the single owner of its nodes and edges; everything else
/// addresses them through [`NodeId`]/[`SlotRef`] handles. Mutation takes
/// `&mut self` while a generation pass takes `&self`, so a pass always
/// observes one consistent snapshot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Graph {
    /// Graph name.
    pub name: String,
    /// Nodes in insertion order.
    nodes: IndexMap<NodeId, Node>,
    /// Edges in insertion order.
    edges: IndexMap<EdgeId, Edge>,
    /// Graph-global shader properties, declared independently of any node.
    properties: Vec<ShaderProperty>,
}

impl Graph {
    /// Create a new empty graph.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            nodes: IndexMap::new(),
            edges: IndexMap::new(),
            properties: Vec::new(),
        }
    }

    /// Add a node to the graph.
    pub fn add_node(&mut self, node: Node) -> NodeId {
        let id = node.id;
        self.nodes.insert(id, node);
        id
    }

    /// Remove a node and every edge touching it.
    pub fn remove_node(&mut self, node_id: NodeId) -> Option<Node> {
        self.edges.retain(|_, e| !e.involves_node(node_id));
        self.nodes.shift_remove(&node_id)
    }

    /// Get a node by ID.
    pub fn node(&self, node_id: NodeId) -> Option<&Node> {
        self.nodes.get(&node_id)
    }

    /// Get a mutable node by ID.
    pub fn node_mut(&mut self, node_id: NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(&node_id)
    }

    /// All nodes in insertion order.
    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.values()
    }

    /// All node IDs in insertion order.
    pub fn node_ids(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.nodes.keys().copied()
    }

    /// Number of nodes.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Declare a graph-global shader property.
    pub fn add_property(&mut self, property: ShaderProperty) {
        self.properties.push(property);
    }

    /// Graph-global shader properties in declaration order.
    pub fn properties(&self) -> &[ShaderProperty] {
        &self.properties
    }

    /// Look up a slot through a reference.
    fn slot(&self, slot_ref: SlotRef) -> Option<(SlotDirection, SlotValueType)> {
        let node = self.nodes.get(&slot_ref.node)?;
        let slot = node.slot(slot_ref.slot)?;
        Some((slot.direction, slot.value_type))
    }

    /// Connect an output slot to an input slot.
    ///
    /// If the destination input already has an edge, the old edge is silently
    /// replaced; the at-most-one-incoming invariant is enforced by
    /// replacement, not rejection. The graph is unchanged on failure.
    pub fn connect(&mut self, from: SlotRef, to: SlotRef) -> Result<EdgeId, ConnectError> {
        let (from_dir, from_type) = self.slot(from).ok_or(ConnectError::SlotNotFound(from))?;
        let (to_dir, to_type) = self.slot(to).ok_or(ConnectError::SlotNotFound(to))?;

        if from_dir != SlotDirection::Output || to_dir != SlotDirection::Input {
            return Err(ConnectError::InvalidDirection);
        }
        if !from_type.can_convert_to(to_type) {
            return Err(ConnectError::TypeMismatch {
                from: from_type,
                to: to_type,
            });
        }

        // Drop any previous edge into the destination input.
        let before = self.edges.len();
        self.edges.retain(|_, e| e.to != to);
        if self.edges.len() != before {
            tracing::debug!("replaced existing edge into {to:?}");
        }

        let edge = Edge::new(from, to);
        let id = edge.id;
        self.edges.insert(id, edge);
        Ok(id)
    }

    /// Remove an edge. Idempotent if the edge is already absent.
    ///
    /// Uses `shift_remove` so remaining edges keep insertion order.
    pub fn disconnect(&mut self, edge_id: EdgeId) -> Option<Edge> {
        self.edges.shift_remove(&edge_id)
    }

    /// Get an edge by ID.
    pub fn edge(&self, edge_id: EdgeId) -> Option<&Edge> {
        self.edges.get(&edge_id)
    }

    /// Edges touching a slot, in insertion order.
    pub fn edges(&self, slot_ref: SlotRef) -> impl Iterator<Item = &Edge> {
        self.edges.values().filter(move |e| e.involves_slot(slot_ref))
    }

    /// The single edge into an input slot, if connected.
    pub fn edge_to(&self, input: SlotRef) -> Option<&Edge> {
        self.edges.values().find(|e| e.to == input)
    }

    /// All edges in insertion order.
    pub fn all_edges(&self) -> impl Iterator<Item = &Edge> {
        self.edges.values()
    }

    /// Number of edges.
    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// Delete every slot on `node_id` whose ID is not in `keep`.
    ///
    /// Edges attached to removed slots are always dropped; `notify` controls
    /// whether the removal records a topological dirty mark or stays silent.
    /// Returns the removed slot IDs (empty if the node is absent).
    pub fn remove_slots_not_matching(
        &mut self,
        node_id: NodeId,
        keep: &[SlotId],
        notify: bool,
    ) -> Vec<SlotId> {
        let Some(node) = self.nodes.get_mut(&node_id) else {
            return Vec::new();
        };
        let removed = node.remove_slots_not_matching(keep);
        if removed.is_empty() {
            return removed;
        }
        let dropped = self.drop_edges_on_slots(node_id, &removed);
        if notify && dropped > 0 {
            if let Some(node) = self.nodes.get_mut(&node_id) {
                node.mark_dirty(ModificationScope::Topological);
            }
        }
        removed
    }

    /// Drop every edge touching one of the given slots on `node_id`,
    /// returning how many were removed.
    pub(crate) fn drop_edges_on_slots(&mut self, node_id: NodeId, slots: &[SlotId]) -> usize {
        let before = self.edges.len();
        self.edges.retain(|_, e| {
            !slots
                .iter()
                .any(|s| e.involves_slot(SlotRef::new(node_id, *s)))
        });
        before - self.edges.len()
    }
}

impl Default for Graph {
    fn default() -> Self {
        Self::new("Untitled")
    }
}

/// Error when creating a connection.
#[derive(Debug, thiserror::Error)]
pub enum ConnectError {
    /// A slot reference did not resolve to a live node and slot.
    #[error("slot not found: {0:?}")]
    SlotNotFound(SlotRef),

    /// The source was not an output or the destination not an input.
    #[error("connections must run from an output slot to an input slot")]
    InvalidDirection,

    /// The slots' value types are incompatible per the widening table.
    #[error("type mismatch: {from:?} cannot convert to {to:?}")]
    TypeMismatch {
        /// Source slot value type.
        from: SlotValueType,
        /// Destination slot value type.
        to: SlotValueType,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::Node;
    use crate::nodes::math::MathOp;
    use crate::nodes::NodeKind;
    use crate::slot::SlotValue;

    fn constant(graph: &mut Graph, value: SlotValue) -> NodeId {
        graph.add_node(Node::new("Constant", NodeKind::Constant(value)))
    }

    fn add_node(graph: &mut Graph) -> NodeId {
        graph.add_node(Node::new("Add", NodeKind::Math(MathOp::Add)))
    }

    fn first_output(graph: &Graph, node: NodeId) -> SlotRef {
        let n = graph.node(node).unwrap();
        n.slot_ref(n.output_slots().next().unwrap().id)
    }

    fn first_input(graph: &Graph, node: NodeId) -> SlotRef {
        let n = graph.node(node).unwrap();
        n.slot_ref(n.input_slots().next().unwrap().id)
    }

    #[test]
    fn test_connect_scalar_broadcast() {
        let mut graph = Graph::new("test");
        let c = constant(&mut graph, SlotValue::Scalar(1.0));
        let m = add_node(&mut graph);

        // Scalar output into a Dynamic (vector-capable) input.
        let result = graph.connect(first_output(&graph, c), first_input(&graph, m));
        assert!(result.is_ok());
        assert_eq!(graph.edge_count(), 1);
    }

    #[test]
    fn test_connect_type_mismatch_leaves_graph_unchanged() {
        let mut graph = Graph::new("test");
        let v3 = constant(&mut graph, SlotValue::Vector3([0.0; 3]));
        let v2_consumer = graph.add_node(Node::new(
            "TexSample",
            NodeKind::TextureSample {
                texture: "_MainTex".to_string(),
                filter: crate::properties::FilterMode::Bilinear,
            },
        ));

        // TextureSample's UV input is Vector2; Vector3 must not narrow.
        let result = graph.connect(first_output(&graph, v3), first_input(&graph, v2_consumer));
        assert!(matches!(result, Err(ConnectError::TypeMismatch { .. })));
        assert_eq!(graph.edge_count(), 0);
    }

    #[test]
    fn test_connect_slot_not_found() {
        let mut graph = Graph::new("test");
        let c = constant(&mut graph, SlotValue::Scalar(1.0));
        let bogus = SlotRef::new(NodeId::new(), SlotId(0));
        let result = graph.connect(first_output(&graph, c), bogus);
        assert!(matches!(result, Err(ConnectError::SlotNotFound(_))));
    }

    #[test]
    fn test_connect_replaces_existing_input_edge() {
        let mut graph = Graph::new("test");
        let a = constant(&mut graph, SlotValue::Scalar(1.0));
        let b = constant(&mut graph, SlotValue::Scalar(2.0));
        let m = add_node(&mut graph);

        let input = first_input(&graph, m);
        let first = graph.connect(first_output(&graph, a), input).unwrap();
        let second = graph.connect(first_output(&graph, b), input).unwrap();

        assert_eq!(graph.edge_count(), 1);
        assert!(graph.edge(first).is_none());
        assert_eq!(graph.edge_to(input).unwrap().id, second);
        assert_eq!(graph.edge_to(input).unwrap().from.node, b);
    }

    #[test]
    fn test_disconnect_idempotent() {
        let mut graph = Graph::new("test");
        let a = constant(&mut graph, SlotValue::Scalar(1.0));
        let m = add_node(&mut graph);
        let id = graph
            .connect(first_output(&graph, a), first_input(&graph, m))
            .unwrap();

        assert!(graph.disconnect(id).is_some());
        assert!(graph.disconnect(id).is_none());
        assert_eq!(graph.edge_count(), 0);
    }

    #[test]
    fn test_remove_node_drops_edges() {
        let mut graph = Graph::new("test");
        let a = constant(&mut graph, SlotValue::Scalar(1.0));
        let m = add_node(&mut graph);
        graph
            .connect(first_output(&graph, a), first_input(&graph, m))
            .unwrap();

        graph.remove_node(a);
        assert_eq!(graph.edge_count(), 0);
        assert_eq!(graph.node_count(), 1);
    }

    #[test]
    fn test_serde_round_trip() {
        let mut graph = Graph::new("test");
        let a = constant(&mut graph, SlotValue::Scalar(1.0));
        let m = add_node(&mut graph);
        graph
            .connect(first_output(&graph, a), first_input(&graph, m))
            .unwrap();

        let text = ron::to_string(&graph).unwrap();
        let loaded: Graph = ron::from_str(&text).unwrap();
        assert_eq!(loaded.node_count(), 2);
        assert_eq!(loaded.edge_count(), 1);
        assert_eq!(loaded.name, "test");
    }
}
