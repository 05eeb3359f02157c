//! Graph Controller
//!
//! The controller owns a graph dataset and everything derived from it:
//!
//! - parsed nodes and node elements (through [`NodeSeries`]);
//! - parsed edges and edge elements, positionally aligned;
//! - the resync scheduler that tells the layout when it is stale.
//!
//! # Lifecycle
//!
//! 1. [`GraphControllerBuilder::build`] parses the dataset, creates one
//!    element per node and per edge, attaches to both arrays and schedules
//!    an initial layout resync.
//!
//! 2. The user mutates the arrays through [`GraphController::nodes_mut`] and
//!    [`GraphController::edges_mut`]. Every mutation updates the caches before
//!    it returns and schedules a resync.
//!
//! 3. The host drives frames. A delivered frame goes to
//!    [`GraphController::on_animation_frame`], which runs the layout's
//!    [`GraphLayout::resync_layout`] hook at most once.
//!
//! 4. The host calls [`GraphController::update`] and then
//!    [`GraphController::draw`].
//!
//! 5. [`GraphController::destroy`] detaches from the arrays and cancels the
//!    pending resync. Later frames and mutations leave the caches alone.
//!
//! # Re-entrancy
//!
//! Layout hooks get `&mut GraphController`. The hook object is taken out of
//! the controller for the duration of the call, so a hook may mutate nodes or
//! edges like any other caller.

mod geometry;
mod sync;
mod tree;

pub use sync::{EdgeSync, NodeSync};
pub use tree::TreeNode;

use std::fmt;
use std::sync::Arc;

use crate::config::ControllerConfig;
use crate::data::{BendPoint, GraphDataset, NodeHandle, NodeIndex, ParsedEdge, RawEdge};
use crate::element::{
    DatasetOptions, EdgeElement, EdgeFactory, ElementConfig, ElementRegistry, NodeElement, OptionsResolver,
    UpdateMode,
};
use crate::error::Result;
use crate::observe::{ListenerId, ObservableVec, Observed};
use crate::render::{ChartArea, DrawContext};
use crate::scale::{LinearScale, Scale};
use crate::schedule::{FrameQueue, FrameRequest, FrameScheduler, OwnerId, ResyncScheduler};
use crate::series::{NodeSeries, ParsedNode};

/// Layout algorithm hooks.
///
/// Every hook defaults to doing nothing, and a controller without a layout
/// skips them altogether.
pub trait GraphLayout {
    /// Called by [`GraphController::reset`] before elements go to their
    /// reset state.
    fn reset_layout(&mut self, _chart: &mut GraphController) {}

    /// Called by [`GraphController::relayout`].
    fn re_layout(&mut self, _chart: &mut GraphController) {}

    /// Called once by [`GraphController::destroy`].
    fn stop_layout(&mut self, _chart: &mut GraphController) {}

    /// Called on the frame after the nodes or edges changed.
    fn resync_layout(&mut self, _chart: &mut GraphController) {}
}

/// Everything the listeners and geometry updates touch, apart from the
/// arrays themselves.
pub(crate) struct GraphState {
    x_scale: Box<dyn Scale>,
    y_scale: Box<dyn Scale>,
    area: ChartArea,
    resolver: Box<dyn OptionsResolver>,
    /// The configuration element updates run under; the node one outside
    /// of edge batches.
    element_config: ElementConfig,
    /// The edge configuration, swapped in for edge batches.
    edge_config: ElementConfig,
    series: NodeSeries,
    parsed_edges: Vec<ParsedEdge>,
    edge_elements: Vec<Box<dyn EdgeElement>>,
    edge_factory: EdgeFactory,
    scheduler: ResyncScheduler,
}

/// Builds a [`GraphController`].
pub struct GraphControllerBuilder {
    dataset: GraphDataset,
    scales: Option<(Box<dyn Scale>, Box<dyn Scale>)>,
    area: ChartArea,
    frames: Option<Arc<dyn FrameScheduler>>,
    resolver: Option<Box<dyn OptionsResolver>>,
    registry: ElementRegistry,
    config: ControllerConfig,
    layout: Option<Box<dyn GraphLayout>>,
}

impl GraphControllerBuilder {
    pub fn new(dataset: GraphDataset) -> Self {
        Self {
            dataset,
            scales: None,
            area: ChartArea::new(0.0, 0.0, 300.0, 150.0),
            frames: None,
            resolver: None,
            registry: ElementRegistry::default(),
            config: ControllerConfig::default(),
            layout: None,
        }
    }

    /// Use these scales instead of linear scales fitted to the data.
    pub fn scales(mut self, x: impl Scale + 'static, y: impl Scale + 'static) -> Self {
        self.scales = Some((Box::new(x) as Box<dyn Scale>, Box::new(y) as Box<dyn Scale>));
        self
    }

    pub fn area(mut self, area: ChartArea) -> Self {
        self.area = area;
        self
    }

    /// Request frames from `frames`. Defaults to a private [`FrameQueue`].
    pub fn frames(mut self, frames: Arc<dyn FrameScheduler>) -> Self {
        self.frames = Some(frames);
        self
    }

    /// Resolve element options with `resolver` instead of the dataset's
    /// style values.
    pub fn options(mut self, resolver: impl OptionsResolver + 'static) -> Self {
        self.resolver = Some(Box::new(resolver));
        self
    }

    pub fn registry(mut self, registry: ElementRegistry) -> Self {
        self.registry = registry;
        self
    }

    pub fn config(mut self, config: ControllerConfig) -> Self {
        self.config = config;
        self
    }

    pub fn layout(mut self, layout: impl GraphLayout + 'static) -> Self {
        self.layout = Some(Box::new(layout));
        self
    }

    /// Parse the dataset, create elements and attach to the arrays.
    ///
    /// Fails if the configuration names an element type the registry does
    /// not have.
    pub fn build(self) -> Result<GraphController> {
        let node_factory = self.registry.node_factory(&self.config.data_element_type)?;
        let edge_factory = self.registry.edge_factory(&self.config.edge_element_type)?;

        let GraphDataset {
            labels,
            data: mut nodes,
            edges: mut raw_edges,
            derived_edges,
            options,
        } = self.dataset;

        let area = self.area;
        let (x_scale, y_scale) = self.scales.unwrap_or_else(|| {
            let x = LinearScale::fit(nodes.iter().filter_map(|n| n.x), area.left, area.right);
            let y = LinearScale::fit(nodes.iter().filter_map(|n| n.y), area.bottom, area.top);
            (Box::new(x) as Box<dyn Scale>, Box::new(y) as Box<dyn Scale>)
        });
        let resolver = self
            .resolver
            .unwrap_or_else(|| Box::new(DatasetOptions::new(options)) as Box<dyn OptionsResolver>);
        let frames = self
            .frames
            .unwrap_or_else(|| Arc::new(FrameQueue::new()) as Arc<dyn FrameScheduler>);

        let id = OwnerId::new();
        let node_listener = nodes.listen();
        let edge_listener = raw_edges.as_mut().map(ObservableVec::listen);

        let mut controller = GraphController {
            id,
            labels,
            nodes,
            edges: raw_edges,
            derived_edges,
            node_listener,
            edge_listener,
            state: GraphState {
                x_scale,
                y_scale,
                area,
                resolver,
                element_config: self.config.node_config(),
                edge_config: self.config.edge_config(),
                series: NodeSeries::new(node_factory),
                parsed_edges: Vec::new(),
                edge_elements: Vec::new(),
                edge_factory,
                scheduler: ResyncScheduler::new(id, frames),
            },
            config: self.config,
            layout: self.layout,
            in_hook: false,
            stop_pending: false,
            destroyed: false,
        };
        controller.add_elements();
        controller.state.scheduler.schedule();

        tracing::debug!(
            owner = ?id,
            nodes = controller.nodes.len(),
            edges = controller.state.parsed_edges.len(),
            "built graph controller"
        );
        Ok(controller)
    }
}

/// Keeps a graph dataset, its parsed form and its elements in sync.
pub struct GraphController {
    id: OwnerId,
    labels: Vec<String>,
    nodes: ObservableVec<NodeHandle>,
    edges: Option<ObservableVec<RawEdge>>,
    derived_edges: bool,
    node_listener: ListenerId,
    edge_listener: Option<ListenerId>,
    state: GraphState,
    config: ControllerConfig,
    layout: Option<Box<dyn GraphLayout>>,
    /// Set while a layout hook runs, when the layout is out of `layout`.
    in_hook: bool,
    /// `destroy` ran inside a hook; `stop_layout` is owed once it returns.
    stop_pending: bool,
    destroyed: bool,
}

impl GraphController {
    pub fn builder(dataset: GraphDataset) -> GraphControllerBuilder {
        GraphControllerBuilder::new(dataset)
    }

    /// The id frame requests of this controller carry.
    pub fn id(&self) -> OwnerId {
        self.id
    }

    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    pub fn nodes(&self) -> &[NodeHandle] {
        &self.nodes
    }

    /// The explicit edge list, if the dataset has one.
    pub fn edges(&self) -> Option<&[RawEdge]> {
        self.edges.as_deref()
    }

    pub fn derived_edges(&self) -> bool {
        self.derived_edges
    }

    pub fn config(&self) -> &ControllerConfig {
        &self.config
    }

    pub fn parsed_nodes(&self) -> &[ParsedNode] {
        self.state.series.parsed()
    }

    pub fn parsed_edges(&self) -> &[ParsedEdge] {
        &self.state.parsed_edges
    }

    pub fn node_elements(&self) -> &[Box<dyn NodeElement>] {
        self.state.series.elements()
    }

    pub fn edge_elements(&self) -> &[Box<dyn EdgeElement>] {
        &self.state.edge_elements
    }

    /// The configuration element updates currently run under.
    pub fn active_element_config(&self) -> &ElementConfig {
        &self.state.element_config
    }

    pub fn scheduler(&self) -> &ResyncScheduler {
        &self.state.scheduler
    }

    pub fn area(&self) -> ChartArea {
        self.state.area
    }

    pub fn set_area(&mut self, area: ChartArea) {
        self.state.area = area;
    }

    pub fn set_scales(&mut self, x: impl Scale + 'static, y: impl Scale + 'static) {
        self.state.x_scale = Box::new(x);
        self.state.y_scale = Box::new(y);
    }

    pub fn set_layout(&mut self, layout: impl GraphLayout + 'static) {
        self.layout = Some(Box::new(layout));
    }

    pub fn is_destroyed(&self) -> bool {
        self.destroyed
    }

    /// Mutate the node array. Caches follow every mutation.
    pub fn nodes_mut(&mut self) -> Observed<'_, NodeHandle, NodeSync<'_>> {
        let listener = NodeSync::new(&self.labels, self.edges.as_deref(), &mut self.state);
        self.nodes.observe(self.node_listener, listener)
    }

    /// Mutate the explicit edge list; `None` when edges are derived from
    /// parents.
    pub fn edges_mut(&mut self) -> Option<Observed<'_, RawEdge, EdgeSync<'_>>> {
        let edges = self.edges.as_mut()?;
        // Detached or never attached: mutations go through unobserved.
        let id = self.edge_listener.unwrap_or_default();
        let listener = EdgeSync::new(&self.labels, self.nodes.as_slice(), &mut self.state);
        Some(edges.observe(id, listener))
    }

    /// Replace the node array.
    pub fn set_nodes(&mut self, nodes: impl IntoIterator<Item = NodeHandle>) {
        self.nodes.unlisten(self.node_listener);
        self.nodes = nodes.into_iter().collect();
        if !self.destroyed {
            self.node_listener = self.nodes.listen();
        }
        self.replaced();
    }

    /// Replace the edge list. `None` derives edges from parents.
    pub fn set_edges(&mut self, edges: Option<Vec<RawEdge>>) {
        if let (Some(old), Some(id)) = (self.edges.as_mut(), self.edge_listener.take()) {
            old.unlisten(id);
        }
        self.edges = edges.map(ObservableVec::from);
        if !self.destroyed {
            self.edge_listener = self.edges.as_mut().map(ObservableVec::listen);
        }
        self.replaced();
    }

    fn replaced(&mut self) {
        if self.destroyed {
            return;
        }
        self.build_or_update_elements();
        self.state.scheduler.schedule();
    }

    /// Write a layout-computed position for node `index`.
    pub fn set_node_position(&mut self, index: NodeIndex, x: f64, y: f64) -> bool {
        match self.state.series.parsed_mut(index) {
            Some(parsed) => {
                parsed.x = Some(x);
                parsed.y = Some(y);
                true
            }
            None => false,
        }
    }

    /// Write layout-computed bend points for edge `index`.
    pub fn set_edge_points(&mut self, index: usize, points: impl IntoIterator<Item = BendPoint>) -> bool {
        match self.state.parsed_edges.get_mut(index) {
            Some(edge) => {
                edge.points = points.into_iter().collect();
                true
            }
            None => false,
        }
    }

    /// Default tooltip text for node `index`: its chart label.
    pub fn tooltip_label(&self, index: NodeIndex) -> Option<&str> {
        self.labels.get(index).map(String::as_str)
    }

    fn add_elements(&mut self) {
        let state = &mut self.state;
        state.series.add_elements(&self.nodes);
        state.invalidate_scales();
        state.parsed_edges.clear();
        state.parse_edges(&self.labels, &self.nodes, self.edges.as_deref());
        let factory = Arc::clone(&state.edge_factory);
        state.edge_elements = (0..state.parsed_edges.len()).map(|_| factory()).collect();
    }

    /// Bring every cache in line with the arrays: node elements first, then
    /// a full edge parse, then the edge element count.
    pub fn build_or_update_elements(&mut self) {
        if self.destroyed {
            return;
        }
        let labels = &self.labels;
        let nodes = self.nodes.as_slice();
        let edges = self.edges.as_deref();
        let state = &mut self.state;

        if state.resync_nodes(nodes) {
            state.resync_edge_elements(labels, nodes, edges);
        } else {
            state.parse_edges(labels, nodes, edges);
        }
        state.reconcile_edge_elements();
    }

    /// Rebuild caches and compute geometry for every element.
    pub fn update(&mut self, mode: UpdateMode) {
        if self.destroyed {
            tracing::debug!(owner = ?self.id, "update on destroyed controller");
            return;
        }
        self.build_or_update_elements();
        self.state.update_node_elements(mode);
        let count = self.state.edge_elements.len();
        self.state.update_edge_elements(0, count, mode);
    }

    /// Put the layout and every element back into their initial state.
    pub fn reset(&mut self) {
        self.with_layout(|layout, chart| layout.reset_layout(chart));
        self.update(UpdateMode::Reset);
    }

    /// Ask the layout to lay the graph out again.
    pub fn relayout(&mut self) {
        self.with_layout(|layout, chart| layout.re_layout(chart));
    }

    /// Detach from the arrays, cancel the pending resync and stop the
    /// layout. Idempotent.
    pub fn destroy(&mut self) {
        if self.destroyed {
            return;
        }
        self.nodes.unlisten(self.node_listener);
        if let (Some(edges), Some(id)) = (self.edges.as_mut(), self.edge_listener) {
            edges.unlisten(id);
        }
        self.state.scheduler.cancel();
        self.destroyed = true;
        tracing::debug!(owner = ?self.id, "destroyed graph controller");
        if self.in_hook {
            self.stop_pending = true;
        } else {
            self.run_stop_hook();
        }
    }

    /// Deliver a frame. Runs the layout resync if `request` is the one this
    /// controller is waiting for; returns whether it did.
    pub fn on_animation_frame(&mut self, request: FrameRequest) -> bool {
        if self.destroyed || !self.state.scheduler.acknowledge(request) {
            return false;
        }
        tracing::debug!(owner = ?self.id, frame = ?request.id, "resyncing layout");
        self.with_layout(|layout, chart| layout.resync_layout(chart));
        true
    }

    /// Clip to the chart area, draw edges, unclip, then draw nodes.
    pub fn draw(&self, ctx: &mut dyn DrawContext) {
        let area = self.state.area;
        if !self.state.edge_elements.is_empty() {
            ctx.clip(&area);
            for edge in &self.state.edge_elements {
                edge.draw(ctx, &area);
            }
            ctx.unclip();
        }
        self.state.series.draw(ctx, &area);
    }

    fn with_layout<F>(&mut self, hook: F)
    where
        F: FnOnce(&mut dyn GraphLayout, &mut GraphController),
    {
        let Some(mut layout) = self.layout.take() else {
            return;
        };
        let outer = std::mem::replace(&mut self.in_hook, true);
        hook(layout.as_mut(), self);
        self.in_hook = outer;
        // A hook may have installed a replacement.
        if self.layout.is_none() {
            self.layout = Some(layout);
        }
        if !self.in_hook && std::mem::take(&mut self.stop_pending) {
            self.run_stop_hook();
        }
    }

    fn run_stop_hook(&mut self) {
        self.with_layout(|layout, chart| layout.stop_layout(chart));
    }
}

impl fmt::Debug for GraphController {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GraphController")
            .field("id", &self.id)
            .field("nodes", &self.nodes.len())
            .field("edges", &self.state.parsed_edges.len())
            .field("derived_edges", &self.derived_edges)
            .field("scheduler", &self.state.scheduler)
            .field("destroyed", &self.destroyed)
            .finish()
    }
}
