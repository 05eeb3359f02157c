//! Renderable Elements
//!
//! Every parsed edge and every parsed node is backed by an element: a small
//! object holding pixel geometry and resolved options that knows how to draw
//! itself. Elements are created by factories registered by type name in an
//! [`ElementRegistry`], so a chart can swap in its own edge or point
//! rendering without touching the controller.
//!
//! Two reference elements ship with the crate:
//!
//! - [`EdgeLine`] (`"edgeLine"`): a polyline from source through the bend
//!   points to target, with an arrow head when the `directed` option is set.
//! - [`PointElement`] (`"point"`): a point marker.

mod options;

pub use options::{
    include_options, DatasetOptions, ElementConfig, OptionsBatch, OptionsResolver, ResolvedOptions,
    ScopedElementConfig,
};

use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;
use smallvec::SmallVec;

use crate::error::{GraphError, Result};
use crate::render::{ChartArea, DrawContext, PixelPoint};

/// Why elements are being updated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum UpdateMode {
    #[default]
    Default,
    /// Elements go to their animate-from state at the axis baselines.
    Reset,
    /// Apply without animation.
    None,
    Active,
    Hide,
    Show,
    Resize,
}

impl UpdateMode {
    /// Whether geometry is applied directly, so every element must carry its
    /// own options.
    pub fn is_direct(self) -> bool {
        matches!(self, Self::Reset | Self::None)
    }
}

/// Which element collection a configuration belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ElementKind {
    Node,
    Edge,
}

/// A bend point in pixel space.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PixelBendPoint {
    pub x: f64,
    pub y: f64,
    pub angle: Option<f64>,
}

/// Pixel geometry of an edge.
///
/// A missing endpoint means the edge references a node that does not exist;
/// such an edge is degenerate and draws nothing.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct EdgeGeometry {
    pub source: Option<PixelPoint>,
    pub target: Option<PixelPoint>,
    pub points: SmallVec<[PixelBendPoint; 4]>,
}

impl EdgeGeometry {
    pub fn is_degenerate(&self) -> bool {
        self.source.is_none() || self.target.is_none()
    }

    /// Source, bend points and target in drawing order. Empty when degenerate.
    pub fn path(&self) -> Vec<PixelPoint> {
        let (Some(source), Some(target)) = (self.source, self.target) else {
            return Vec::new();
        };
        let mut path = Vec::with_capacity(self.points.len() + 2);
        path.push(source);
        path.extend(self.points.iter().map(|p| PixelPoint::new(p.x, p.y)));
        path.push(target);
        path
    }
}

/// Pixel geometry of a node. `None` skips the node.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct NodeGeometry {
    pub position: Option<PixelPoint>,
}

/// A renderable edge.
pub trait EdgeElement: fmt::Debug {
    /// Take new geometry and options. Every element of a shared batch gets
    /// the same `Arc`. `None` keeps the options the element already has.
    fn update(&mut self, geometry: EdgeGeometry, options: Option<Arc<ResolvedOptions>>, mode: UpdateMode);

    fn geometry(&self) -> &EdgeGeometry;

    fn options(&self) -> Option<&Arc<ResolvedOptions>>;

    fn draw(&self, ctx: &mut dyn DrawContext, area: &ChartArea);
}

/// A renderable node.
pub trait NodeElement: fmt::Debug {
    fn update(&mut self, geometry: NodeGeometry, options: Option<Arc<ResolvedOptions>>, mode: UpdateMode);

    fn position(&self) -> Option<PixelPoint>;

    fn options(&self) -> Option<&Arc<ResolvedOptions>>;

    fn draw(&self, ctx: &mut dyn DrawContext, area: &ChartArea);
}

/// Creates edge elements.
pub type EdgeFactory = Arc<dyn Fn() -> Box<dyn EdgeElement> + Send + Sync>;

/// Creates node elements.
pub type NodeFactory = Arc<dyn Fn() -> Box<dyn NodeElement> + Send + Sync>;

const DEFAULT_ARROW_HEAD_SIZE: f64 = 15.0;
const DEFAULT_POINT_RADIUS: f64 = 3.0;

/// Straight or bent line between two nodes.
#[derive(Debug, Default)]
pub struct EdgeLine {
    geometry: EdgeGeometry,
    options: Option<Arc<ResolvedOptions>>,
}

impl EdgeLine {
    pub const ID: &'static str = "edgeLine";

    pub fn new() -> Self {
        Self::default()
    }

    /// Triangle pointing at the end of the last segment of `path`, pulled
    /// back by `offset` so it sits on the node's rim.
    fn arrow_head(path: &[PixelPoint], size: f64, offset: f64) -> Option<[PixelPoint; 3]> {
        let [.., from, to] = path else {
            return None;
        };
        let (dx, dy) = (to.x - from.x, to.y - from.y);
        let dist = (dx * dx + dy * dy).sqrt();
        if dist < 0.001 {
            return None;
        }
        let (ux, uy) = (dx / dist, dy / dist);
        let tip = PixelPoint::new(to.x - ux * offset, to.y - uy * offset);
        let back = PixelPoint::new(tip.x - ux * size, tip.y - uy * size);
        let (px, py) = (-uy * size * 0.5, ux * size * 0.5);
        Some([
            tip,
            PixelPoint::new(back.x + px, back.y + py),
            PixelPoint::new(back.x - px, back.y - py),
        ])
    }
}

impl EdgeElement for EdgeLine {
    fn update(&mut self, geometry: EdgeGeometry, options: Option<Arc<ResolvedOptions>>, _mode: UpdateMode) {
        self.geometry = geometry;
        if options.is_some() {
            self.options = options;
        }
    }

    fn geometry(&self) -> &EdgeGeometry {
        &self.geometry
    }

    fn options(&self) -> Option<&Arc<ResolvedOptions>> {
        self.options.as_ref()
    }

    fn draw(&self, ctx: &mut dyn DrawContext, _area: &ChartArea) {
        let path = self.geometry.path();
        if path.is_empty() {
            return;
        }
        let fallback = ResolvedOptions::default();
        let options = self.options.as_deref().unwrap_or(&fallback);

        ctx.polyline(&path, options);

        if options.bool_or("directed", false) {
            let size = options.f64_or("arrowHeadSize", DEFAULT_ARROW_HEAD_SIZE);
            let offset = options.f64_or("arrowHeadOffset", 0.0);
            if let Some(head) = Self::arrow_head(&path, size, offset) {
                ctx.polygon(&head, options);
            }
        }
    }
}

/// Point marker for a node.
#[derive(Debug, Default)]
pub struct PointElement {
    position: Option<PixelPoint>,
    options: Option<Arc<ResolvedOptions>>,
}

impl PointElement {
    pub const ID: &'static str = "point";

    pub fn new() -> Self {
        Self::default()
    }
}

impl NodeElement for PointElement {
    fn update(&mut self, geometry: NodeGeometry, options: Option<Arc<ResolvedOptions>>, _mode: UpdateMode) {
        self.position = geometry.position;
        if options.is_some() {
            self.options = options;
        }
    }

    fn position(&self) -> Option<PixelPoint> {
        self.position
    }

    fn options(&self) -> Option<&Arc<ResolvedOptions>> {
        self.options.as_ref()
    }

    fn draw(&self, ctx: &mut dyn DrawContext, _area: &ChartArea) {
        let Some(position) = self.position else {
            return;
        };
        let fallback = ResolvedOptions::default();
        let options = self.options.as_deref().unwrap_or(&fallback);
        ctx.point(position, options.f64_or("radius", DEFAULT_POINT_RADIUS), options);
    }
}

/// Element factories by type name.
#[derive(Clone)]
pub struct ElementRegistry {
    edges: IndexMap<String, EdgeFactory>,
    nodes: IndexMap<String, NodeFactory>,
}

impl ElementRegistry {
    /// A registry with no element types at all.
    pub fn empty() -> Self {
        Self {
            edges: IndexMap::new(),
            nodes: IndexMap::new(),
        }
    }

    pub fn register_edge<F>(&mut self, id: impl Into<String>, factory: F) -> &mut Self
    where
        F: Fn() -> Box<dyn EdgeElement> + Send + Sync + 'static,
    {
        self.edges.insert(id.into(), Arc::new(factory));
        self
    }

    pub fn register_node<F>(&mut self, id: impl Into<String>, factory: F) -> &mut Self
    where
        F: Fn() -> Box<dyn NodeElement> + Send + Sync + 'static,
    {
        self.nodes.insert(id.into(), Arc::new(factory));
        self
    }

    pub fn edge_factory(&self, id: &str) -> Result<EdgeFactory> {
        self.edges.get(id).cloned().ok_or_else(|| GraphError::UnknownElementType {
            kind: "edge",
            name: id.to_owned(),
        })
    }

    pub fn node_factory(&self, id: &str) -> Result<NodeFactory> {
        self.nodes.get(id).cloned().ok_or_else(|| GraphError::UnknownElementType {
            kind: "node",
            name: id.to_owned(),
        })
    }
}

impl Default for ElementRegistry {
    /// The registry with [`EdgeLine`] and [`PointElement`].
    fn default() -> Self {
        let mut registry = Self::empty();
        registry
            .register_edge(EdgeLine::ID, || Box::new(EdgeLine::new()))
            .register_node(PointElement::ID, || Box::new(PointElement::new()));
        registry
    }
}

impl fmt::Debug for ElementRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ElementRegistry")
            .field("edges", &self.edges.keys().collect::<Vec<_>>())
            .field("nodes", &self.nodes.keys().collect::<Vec<_>>())
            .finish()
    }
}
