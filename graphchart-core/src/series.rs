//! Node Series
//!
//! Positional node storage: one [`ParsedNode`] and one node element per
//! entry of the node array, kept in lockstep with it. This is the scatter
//! part of a graph chart. Edges are layered on top by the controller.
//!
//! Parsed coordinates double as the layout's working storage: a layout
//! writes positions into [`NodeSeries::parsed_mut`], and a later parse keeps
//! them for every node whose record has no coordinate of its own.

use std::fmt;

use crate::data::NodeHandle;
use crate::element::{ElementConfig, NodeElement, NodeFactory, NodeGeometry, OptionsBatch, OptionsResolver, UpdateMode};
use crate::render::{ChartArea, DrawContext, PixelPoint};
use crate::scale::Scale;

/// Data-space coordinates of a node.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ParsedNode {
    pub x: Option<f64>,
    pub y: Option<f64>,
}

/// What a node geometry update reads from the controller.
pub struct NodeUpdate<'a> {
    pub x_scale: &'a dyn Scale,
    pub y_scale: &'a dyn Scale,
    pub resolver: &'a dyn OptionsResolver,
    pub config: &'a mut ElementConfig,
}

pub struct NodeSeries {
    parsed: Vec<ParsedNode>,
    elements: Vec<Box<dyn NodeElement>>,
    factory: NodeFactory,
}

impl NodeSeries {
    pub fn new(factory: NodeFactory) -> Self {
        Self {
            parsed: Vec::new(),
            elements: Vec::new(),
            factory,
        }
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    pub fn parsed(&self) -> &[ParsedNode] {
        &self.parsed
    }

    pub fn parsed_mut(&mut self, index: usize) -> Option<&mut ParsedNode> {
        self.parsed.get_mut(index)
    }

    pub fn elements(&self) -> &[Box<dyn NodeElement>] {
        &self.elements
    }

    /// Pixel position of node element `index`, if it exists and is placed.
    pub fn position(&self, index: usize) -> Option<PixelPoint> {
        self.elements.get(index).and_then(|element| element.position())
    }

    /// Parse records `start..start + count` of `nodes`.
    ///
    /// A record without a coordinate keeps the previously parsed one.
    /// Parsed entries beyond the end of `nodes` are dropped.
    pub fn parse(&mut self, nodes: &[NodeHandle], start: usize, count: usize) {
        let end = start.saturating_add(count).min(nodes.len());
        for index in start..end {
            let node = &nodes[index];
            if index >= self.parsed.len() {
                self.parsed.resize(index + 1, ParsedNode::default());
            }
            let parsed = &mut self.parsed[index];
            if let Some(x) = node.x {
                parsed.x = Some(x);
            }
            if let Some(y) = node.y {
                parsed.y = Some(y);
            }
        }
        self.parsed.truncate(nodes.len());
    }

    /// Drop everything and create one fresh element per node.
    pub fn add_elements(&mut self, nodes: &[NodeHandle]) {
        self.parsed.clear();
        self.elements = (0..nodes.len()).map(|_| (self.factory)()).collect();
        self.parse(nodes, 0, nodes.len());
    }

    /// Insert `count` fresh entries at `start` and put their elements in
    /// reset state.
    pub fn insert_elements(&mut self, nodes: &[NodeHandle], start: usize, count: usize, update: &mut NodeUpdate<'_>) {
        let start = start.min(self.elements.len());
        let fresh: Vec<Box<dyn NodeElement>> = (0..count).map(|_| (self.factory)()).collect();
        self.elements.splice(start..start, fresh);
        let at = start.min(self.parsed.len());
        self.parsed.splice(at..at, std::iter::repeat(ParsedNode::default()).take(count));
        self.parse(nodes, start, count);
        self.update_elements(start, count, UpdateMode::Reset, update);
    }

    /// Remove `count` entries at `start`.
    pub fn remove_elements(&mut self, start: usize, count: usize) {
        let end = start.saturating_add(count).min(self.elements.len());
        if start < end {
            self.elements.drain(start..end);
        }
        let end = start.saturating_add(count).min(self.parsed.len());
        if start < end {
            self.parsed.drain(start..end);
        }
    }

    /// Match the element count to `nodes`, reparsing what is kept.
    ///
    /// Returns whether the count changed.
    pub fn resync_elements(&mut self, nodes: &[NodeHandle], update: &mut NodeUpdate<'_>) -> bool {
        let (num_meta, num_data) = (self.elements.len(), nodes.len());
        let kept = num_meta.min(num_data);
        if kept > 0 {
            self.parse(nodes, 0, kept);
        }
        if num_data > num_meta {
            self.insert_elements(nodes, num_meta, num_data - num_meta, update);
        } else if num_data < num_meta {
            self.remove_elements(num_data, num_meta - num_data);
            self.parsed.truncate(num_data);
        }
        num_data != num_meta
    }

    /// Compute pixel geometry for elements `start..start + count`.
    pub fn update_elements(&mut self, start: usize, count: usize, mode: UpdateMode, update: &mut NodeUpdate<'_>) {
        let end = start.saturating_add(count).min(self.elements.len());
        if start >= end {
            return;
        }
        let batch = OptionsBatch::begin(update.config, update.resolver, start, mode);
        let base = PixelPoint::new(update.x_scale.base_pixel(), update.y_scale.base_pixel());

        for index in start..end {
            let parsed = self.parsed.get(index).copied().unwrap_or_default();
            let position = if mode == UpdateMode::Reset {
                Some(base)
            } else {
                match (parsed.x, parsed.y) {
                    (Some(x), Some(y)) => Some(PixelPoint::new(
                        update.x_scale.pixel_for_value(x, index),
                        update.y_scale.pixel_for_value(y, index),
                    )),
                    _ => None,
                }
            };
            let options = batch.options_for(update.config, update.resolver, index);
            self.elements[index].update(NodeGeometry { position }, Some(options), mode);
        }
    }

    pub fn draw(&self, ctx: &mut dyn DrawContext, area: &ChartArea) {
        for element in &self.elements {
            element.draw(ctx, area);
        }
    }
}

impl fmt::Debug for NodeSeries {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NodeSeries")
            .field("parsed", &self.parsed)
            .field("elements", &self.elements)
            .finish()
    }
}
