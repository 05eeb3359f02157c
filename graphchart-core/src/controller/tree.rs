//! Tree queries for layout algorithms.
//!
//! Root finding is a heuristic. A graph with several roots yields the first
//! one, and a graph where every node has an incoming edge yields none.
//! Neither cycles nor forests are reported.

use indexmap::IndexSet;

use super::GraphController;
use crate::data::{EdgeRef, NodeIndex};

/// A parsed node annotated with its index.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TreeNode {
    pub index: NodeIndex,
    pub x: Option<f64>,
    pub y: Option<f64>,
}

impl From<&TreeNode> for EdgeRef {
    fn from(node: &TreeNode) -> Self {
        EdgeRef::Indexed { index: node.index }
    }
}

impl From<TreeNode> for EdgeRef {
    fn from(node: TreeNode) -> Self {
        EdgeRef::Indexed { index: node.index }
    }
}

impl GraphController {
    /// Index of the tree root.
    ///
    /// With parent-derived edges, the first node without a parent.
    /// Otherwise the first node that is no edge's target.
    pub fn tree_root_index(&self) -> Option<NodeIndex> {
        if self.derived_edges {
            return self.nodes.iter().position(|node| node.parent.is_none());
        }
        let mut candidates: IndexSet<NodeIndex> = (0..self.nodes.len()).collect();
        for edge in &self.state.parsed_edges {
            if let Some(target) = edge.target {
                candidates.shift_remove(&target);
            }
        }
        candidates.first().copied()
    }

    pub fn tree_root(&self) -> Option<TreeNode> {
        self.tree_root_index().map(|index| self.tree_node(index))
    }

    /// Targets of every edge leaving `node`, in edge order.
    pub fn tree_children(&self, node: &TreeNode) -> Vec<TreeNode> {
        self.state
            .parsed_edges
            .iter()
            .filter(|edge| edge.source == Some(node.index))
            .filter_map(|edge| edge.target)
            .map(|target| self.tree_node(target))
            .collect()
    }

    fn tree_node(&self, index: NodeIndex) -> TreeNode {
        let parsed = self.parsed_nodes().get(index).copied().unwrap_or_default();
        TreeNode {
            index,
            x: parsed.x,
            y: parsed.y,
        }
    }
}
