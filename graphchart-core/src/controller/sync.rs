//! Cache synchronization.
//!
//! The parsed edge cache and the edge element cache are positional mirrors
//! of the edge list; the node series mirrors the node array. The listeners
//! here translate each structural mutation into the matching splice on the
//! mirrors, so both stay aligned without a full rebuild.

use std::sync::Arc;

use super::GraphState;
use crate::data::{EdgeParser, NodeHandle, ParsedEdge, RawEdge, ReferenceResolver};
use crate::element::{EdgeElement, UpdateMode};
use crate::observe::ArrayListener;
use crate::series::NodeUpdate;

fn parser<'a>(labels: &'a [String], nodes: &'a [NodeHandle]) -> EdgeParser<'a> {
    EdgeParser::new(ReferenceResolver::new(labels, nodes), nodes)
}

impl GraphState {
    pub(crate) fn invalidate_scales(&mut self) {
        self.x_scale.invalidate_caches();
        self.y_scale.invalidate_caches();
    }

    /// Replace the parsed edge cache with a full parse. Edges that keep
    /// their position and endpoints keep their bend points.
    pub(crate) fn parse_edges(&mut self, labels: &[String], nodes: &[NodeHandle], edges: Option<&[RawEdge]>) {
        let mut parsed = parser(labels, nodes).parse_all(edges);
        for (edge, previous) in parsed.iter_mut().zip(&self.parsed_edges) {
            edge.inherit_points(previous);
        }
        self.parsed_edges = parsed;
    }

    fn new_edge_elements(&self, count: usize) -> Vec<Box<dyn EdgeElement>> {
        let factory = Arc::clone(&self.edge_factory);
        (0..count).map(|_| factory()).collect()
    }

    /// Insert `count` fresh edge elements at `start`, put them in reset
    /// state and mark the layout stale.
    pub(crate) fn insert_edge_elements(&mut self, start: usize, count: usize) {
        let start = start.min(self.edge_elements.len());
        let fresh = self.new_edge_elements(count);
        self.edge_elements.splice(start..start, fresh);
        self.update_edge_elements(start, count, UpdateMode::Reset);
        self.scheduler.schedule();
    }

    /// Reparse the edges and pad or trim the element cache to match.
    /// Padded elements get no geometry until the next update.
    pub(crate) fn resync_edge_elements(&mut self, labels: &[String], nodes: &[NodeHandle], edges: Option<&[RawEdge]>) {
        self.parse_edges(labels, nodes, edges);
        let (parsed, elements) = (self.parsed_edges.len(), self.edge_elements.len());
        if parsed > elements {
            let fresh = self.new_edge_elements(parsed - elements);
            self.edge_elements.extend(fresh);
        } else {
            self.edge_elements.truncate(parsed);
        }
    }

    /// Match the element count to the parsed edge count after a rebuild.
    pub(crate) fn reconcile_edge_elements(&mut self) {
        let (parsed, elements) = (self.parsed_edges.len(), self.edge_elements.len());
        if parsed < elements {
            tracing::debug!(parsed, elements, "trimming edge elements");
            self.edge_elements.truncate(parsed);
            self.scheduler.schedule();
        } else if parsed > elements {
            tracing::debug!(parsed, elements, "adding edge elements");
            self.insert_edge_elements(elements, parsed - elements);
        }
    }

    /// Match the node series to `nodes`. Returns whether the count changed.
    pub(crate) fn resync_nodes(&mut self, nodes: &[NodeHandle]) -> bool {
        let mut update = NodeUpdate {
            x_scale: &*self.x_scale,
            y_scale: &*self.y_scale,
            resolver: &*self.resolver,
            config: &mut self.element_config,
        };
        let changed = self.series.resync_elements(nodes, &mut update);
        self.invalidate_scales();
        changed
    }

    fn insert_nodes(
        &mut self,
        labels: &[String],
        nodes: &[NodeHandle],
        edges: Option<&[RawEdge]>,
        start: usize,
        count: usize,
    ) {
        if count == 0 {
            return;
        }
        let mut update = NodeUpdate {
            x_scale: &*self.x_scale,
            y_scale: &*self.y_scale,
            resolver: &*self.resolver,
            config: &mut self.element_config,
        };
        self.series.insert_elements(nodes, start, count, &mut update);
        self.invalidate_scales();
        self.resync_edge_elements(labels, nodes, edges);
    }

    fn remove_nodes(
        &mut self,
        labels: &[String],
        nodes: &[NodeHandle],
        edges: Option<&[RawEdge]>,
        start: usize,
        count: usize,
    ) {
        if count == 0 {
            return;
        }
        self.series.remove_elements(start, count);
        self.invalidate_scales();
        self.resync_edge_elements(labels, nodes, edges);
    }
}

/// Listener on the node array.
pub struct NodeSync<'a> {
    labels: &'a [String],
    edges: Option<&'a [RawEdge]>,
    state: &'a mut GraphState,
}

impl<'a> NodeSync<'a> {
    pub(crate) fn new(labels: &'a [String], edges: Option<&'a [RawEdge]>, state: &'a mut GraphState) -> Self {
        Self { labels, edges, state }
    }
}

impl ArrayListener<NodeHandle> for NodeSync<'_> {
    fn on_push(&mut self, array: &[NodeHandle], start: usize, count: usize) {
        self.state.insert_nodes(self.labels, array, self.edges, start, count);
        self.state.scheduler.schedule();
    }

    fn on_pop(&mut self, array: &[NodeHandle]) {
        self.state.remove_nodes(self.labels, array, self.edges, array.len(), 1);
        self.state.scheduler.schedule();
    }

    fn on_shift(&mut self, array: &[NodeHandle]) {
        self.state.remove_nodes(self.labels, array, self.edges, 0, 1);
        self.state.scheduler.schedule();
    }

    fn on_splice(&mut self, array: &[NodeHandle], start: usize, removed: usize, inserted: usize) {
        self.state.remove_nodes(self.labels, array, self.edges, start, removed);
        self.state.insert_nodes(self.labels, array, self.edges, start, inserted);
        self.state.scheduler.schedule();
    }

    fn on_unshift(&mut self, array: &[NodeHandle], count: usize) {
        self.state.insert_nodes(self.labels, array, self.edges, 0, count);
        self.state.scheduler.schedule();
    }
}

/// Listener on the edge list.
pub struct EdgeSync<'a> {
    labels: &'a [String],
    nodes: &'a [NodeHandle],
    state: &'a mut GraphState,
}

impl<'a> EdgeSync<'a> {
    pub(crate) fn new(labels: &'a [String], nodes: &'a [NodeHandle], state: &'a mut GraphState) -> Self {
        Self { labels, nodes, state }
    }

    fn parse(&self, edges: &[RawEdge]) -> Vec<ParsedEdge> {
        parser(self.labels, self.nodes).parse_edges(edges)
    }

    /// Drop `count` cached edges at `start` from both caches.
    fn remove(&mut self, start: usize, count: usize) {
        let end = start.saturating_add(count).min(self.state.parsed_edges.len());
        if start < end {
            self.state.parsed_edges.drain(start..end);
        }
        let end = start.saturating_add(count).min(self.state.edge_elements.len());
        if start < end {
            self.state.edge_elements.drain(start..end);
        }
    }
}

impl ArrayListener<RawEdge> for EdgeSync<'_> {
    fn on_push(&mut self, array: &[RawEdge], start: usize, count: usize) {
        let parsed = self.parse(&array[start..start + count]);
        self.state.parsed_edges.extend(parsed);
        self.state.insert_edge_elements(start, count);
    }

    fn on_pop(&mut self, _array: &[RawEdge]) {
        self.state.edge_elements.pop();
        self.state.parsed_edges.pop();
        self.state.scheduler.schedule();
    }

    fn on_shift(&mut self, _array: &[RawEdge]) {
        self.remove(0, 1);
        self.state.scheduler.schedule();
    }

    fn on_splice(&mut self, array: &[RawEdge], start: usize, removed: usize, inserted: usize) {
        self.remove(start, removed);
        if inserted > 0 {
            let parsed = self.parse(&array[start..start + inserted]);
            let at = start.min(self.state.parsed_edges.len());
            self.state.parsed_edges.splice(at..at, parsed);
            self.state.insert_edge_elements(start, inserted);
        } else {
            self.state.scheduler.schedule();
        }
    }

    fn on_unshift(&mut self, array: &[RawEdge], count: usize) {
        let parsed = self.parse(&array[..count]);
        self.state.parsed_edges.splice(0..0, parsed);
        self.state.insert_edge_elements(0, count);
    }
}
