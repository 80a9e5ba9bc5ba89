// SPDX-License-Identifier: MIT OR Apache-2.0
//! Dependency-ordered traversal of active nodes.

use crate::graph::Graph;
use crate::node::NodeId;
use std::collections::HashSet;

/// Error when the graph reachable from the root contains a cycle.
#[derive(Debug, thiserror::Error)]
#[error("graph contains a cycle")]
pub struct CycleError;

/// Collect every node reachable from `root`, dependencies first.
///
/// Depth-first post-order: for each node, the producer connected to each
/// occupied input slot is visited (in slot declaration order) before the node
/// itself, so every node appears strictly after all of its dependencies. A
/// node already fully visited is not revisited, so a diamond dependency
/// appears exactly once. Nodes unreachable from the root are excluded. The
/// root itself is the final element.
pub fn collect_active_nodes(graph: &Graph, root: NodeId) -> Result<Vec<NodeId>, CycleError> {
    let mut visited = HashSet::new();
    let mut on_stack = HashSet::new();
    let mut order = Vec::new();
    visit(graph, root, &mut visited, &mut on_stack, &mut order)?;
    Ok(order)
}

fn visit(
    graph: &Graph,
    node_id: NodeId,
    visited: &mut HashSet<NodeId>,
    on_stack: &mut HashSet<NodeId>,
    order: &mut Vec<NodeId>,
) -> Result<(), CycleError> {
    if on_stack.contains(&node_id) {
        return Err(CycleError);
    }
    if visited.contains(&node_id) {
        return Ok(());
    }
    let Some(node) = graph.node(node_id) else {
        return Ok(());
    };

    on_stack.insert(node_id);
    for slot in node.input_slots() {
        if let Some(edge) = graph.edge_to(node.slot_ref(slot.id)) {
            visit(graph, edge.from.node, visited, on_stack, order)?;
        }
    }
    on_stack.remove(&node_id);

    visited.insert(node_id);
    order.push(node_id);
    Ok(())
}
