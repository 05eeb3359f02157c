//! Edge Parsing
//!
//! Turns the dataset's raw edges into [`ParsedEdge`] records. A dataset either
//! lists its edges explicitly, or leaves them out and lets every node with a
//! `parent` contribute one edge from the parent to itself. Nodes without a
//! parent contribute nothing, which is how tree roots show up.

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use super::{NodeHandle, NodeIndex, RawEdge, ReferenceResolver};

/// An intermediate point an edge is bent through, in data space.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct BendPoint {
    pub x: f64,
    pub y: f64,
    /// Direction hint for curve rendering, passed through untouched.
    #[serde(default)]
    pub angle: Option<f64>,
}

impl BendPoint {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y, angle: None }
    }
}

/// An edge with both endpoints resolved to node indices.
///
/// `None` marks an endpoint that could not be resolved.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ParsedEdge {
    pub source: Option<NodeIndex>,
    pub target: Option<NodeIndex>,
    /// Bend points, filled in by the layout. Empty after parsing.
    pub points: SmallVec<[BendPoint; 4]>,
}

impl ParsedEdge {
    /// An edge between two resolved nodes.
    pub fn between(source: NodeIndex, target: NodeIndex) -> Self {
        Self {
            source: Some(source),
            target: Some(target),
            points: SmallVec::new(),
        }
    }

    /// Whether both endpoints resolved.
    pub fn is_resolved(&self) -> bool {
        self.source.is_some() && self.target.is_some()
    }

    /// Take over `previous`'s bend points if it connects the same nodes.
    pub(crate) fn inherit_points(&mut self, previous: &ParsedEdge) {
        if self.source == previous.source && self.target == previous.target {
            self.points.clone_from(&previous.points);
        }
    }
}

/// Parses raw edges against a node array.
#[derive(Debug, Clone, Copy)]
pub struct EdgeParser<'a> {
    resolver: ReferenceResolver<'a>,
    nodes: &'a [NodeHandle],
}

impl<'a> EdgeParser<'a> {
    pub fn new(resolver: ReferenceResolver<'a>, nodes: &'a [NodeHandle]) -> Self {
        Self { resolver, nodes }
    }

    /// Parse one explicit edge.
    pub fn parse_edge(&self, edge: &RawEdge) -> ParsedEdge {
        ParsedEdge {
            source: self.resolver.resolve(self.nodes, &edge.source),
            target: self.resolver.resolve(self.nodes, &edge.target),
            points: SmallVec::new(),
        }
    }

    /// Parse a run of explicit edges.
    pub fn parse_edges(&self, edges: &[RawEdge]) -> Vec<ParsedEdge> {
        edges.iter().map(|edge| self.parse_edge(edge)).collect()
    }

    /// Parse the whole dataset: the explicit list when there is one,
    /// otherwise one edge per node with a parent.
    pub fn parse_all(&self, edges: Option<&[RawEdge]>) -> Vec<ParsedEdge> {
        if let Some(edges) = edges {
            return self.parse_edges(edges);
        }

        self.nodes
            .iter()
            .enumerate()
            .filter_map(|(i, node)| {
                let parent = node.parent.as_ref()?;
                Some(ParsedEdge {
                    source: self.resolver.resolve(self.nodes, parent),
                    target: Some(i),
                    points: SmallVec::new(),
                })
            })
            .collect()
    }
}
