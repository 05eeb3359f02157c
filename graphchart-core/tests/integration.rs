//! Integration Tests for the Graph Controller
//!
//! These tests drive a controller the way a chart host does: mutate the
//! arrays, deliver frames, update and draw.

use std::sync::Arc;

use parking_lot::Mutex;

use graphchart_core::element::{ElementKind, ResolvedOptions};
use graphchart_core::{
    BendPoint, ChartArea, DrawContext, FrameQueue, GraphController, GraphDataset, GraphLayout, LinearScale,
    NodeHandle, NodeRecord, PixelPoint, RawEdge, UpdateMode,
};

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Hook calls, shared between a layout and the test body.
#[derive(Clone, Default)]
struct HookLog(Arc<Mutex<Vec<&'static str>>>);

impl HookLog {
    fn count(&self, hook: &str) -> usize {
        self.0.lock().iter().filter(|&&h| h == hook).count()
    }
}

struct RecordingLayout {
    log: HookLog,
}

impl GraphLayout for RecordingLayout {
    fn reset_layout(&mut self, _chart: &mut GraphController) {
        self.log.0.lock().push("reset");
    }

    fn re_layout(&mut self, _chart: &mut GraphController) {
        self.log.0.lock().push("relayout");
    }

    fn stop_layout(&mut self, _chart: &mut GraphController) {
        self.log.0.lock().push("stop");
    }

    fn resync_layout(&mut self, _chart: &mut GraphController) {
        self.log.0.lock().push("resync");
    }
}

#[derive(Debug, PartialEq)]
enum Draw {
    Clip,
    Unclip,
    Line(usize),
    Arrow,
    Point,
}

#[derive(Default)]
struct Canvas {
    calls: Vec<Draw>,
}

impl DrawContext for Canvas {
    fn clip(&mut self, _area: &ChartArea) {
        self.calls.push(Draw::Clip);
    }

    fn unclip(&mut self) {
        self.calls.push(Draw::Unclip);
    }

    fn polyline(&mut self, points: &[PixelPoint], _options: &ResolvedOptions) {
        self.calls.push(Draw::Line(points.len()));
    }

    fn polygon(&mut self, _points: &[PixelPoint], _options: &ResolvedOptions) {
        self.calls.push(Draw::Arrow);
    }

    fn point(&mut self, _center: PixelPoint, _radius: f64, _options: &ResolvedOptions) {
        self.calls.push(Draw::Point);
    }
}

/// Nodes at (1, 1), (2, 2), ... on scales mapping 0..10 to 0..100 pixels.
fn graph(nodes: usize, edges: &[(usize, usize)], queue: &FrameQueue, log: &HookLog) -> GraphController {
    let dataset = GraphDataset::from_nodes((1..=nodes).map(|i| NodeRecord::at(i as f64, i as f64)))
        .with_edges(edges.iter().map(|&(s, t)| RawEdge::new(s, t)));
    GraphController::builder(dataset)
        .scales(LinearScale::new(0.0, 10.0, 0.0, 100.0), LinearScale::new(0.0, 10.0, 0.0, 100.0))
        .frames(Arc::new(queue.clone()))
        .layout(RecordingLayout { log: log.clone() })
        .build()
        .unwrap()
}

fn run_frame(queue: &FrameQueue, chart: &mut GraphController) -> usize {
    let mut resynced = 0;
    queue.run_frame(|request| {
        if chart.on_animation_frame(request) {
            resynced += 1;
        }
    });
    resynced
}

fn assert_aligned(chart: &GraphController) {
    assert_eq!(chart.parsed_edges().len(), chart.edge_elements().len());
    assert_eq!(chart.parsed_nodes().len(), chart.nodes().len());
    assert_eq!(chart.node_elements().len(), chart.nodes().len());
}

#[test]
fn edge_push_updates_caches_synchronously() {
    init_tracing();
    let (queue, log) = (FrameQueue::new(), HookLog::default());
    let mut chart = graph(4, &[(0, 1), (1, 2), (2, 3)], &queue, &log);
    chart.update(UpdateMode::Default);

    chart.edges_mut().unwrap().push(RawEdge::new(0usize, 3usize));

    assert_eq!(chart.parsed_edges().len(), 4);
    assert_eq!(chart.edge_elements().len(), 4);
    assert_eq!(chart.parsed_edges()[3].source, Some(0));
    assert_eq!(chart.parsed_edges()[3].target, Some(3));

    // The new element starts in reset state between the current node positions.
    let geometry = chart.edge_elements()[3].geometry();
    assert_eq!(geometry.source, Some(PixelPoint::new(10.0, 10.0)));
    assert_eq!(geometry.target, Some(PixelPoint::new(40.0, 40.0)));
    assert!(geometry.points.is_empty());
}

#[test]
fn edge_pop_triggers_one_resync() {
    init_tracing();
    let (queue, log) = (FrameQueue::new(), HookLog::default());
    let mut chart = graph(4, &[(0, 1), (1, 2), (2, 3)], &queue, &log);
    assert_eq!(run_frame(&queue, &mut chart), 1);

    chart.edges_mut().unwrap().pop();

    assert_eq!(chart.parsed_edges().len(), 2);
    assert_eq!(chart.edge_elements().len(), 2);
    assert_eq!(run_frame(&queue, &mut chart), 1);
    assert_eq!(run_frame(&queue, &mut chart), 0);
    assert_eq!(log.count("resync"), 2);
}

#[test]
fn edge_removals_keep_alignment() {
    init_tracing();
    let (queue, log) = (FrameQueue::new(), HookLog::default());
    let mut chart = graph(4, &[(0, 1), (1, 2), (2, 3), (3, 0)], &queue, &log);

    {
        let mut edges = chart.edges_mut().unwrap();
        edges.shift();
        edges.splice(1, 1, []);
    }

    assert_aligned(&chart);
    let remaining: Vec<_> = chart.parsed_edges().iter().map(|e| (e.source, e.target)).collect();
    assert_eq!(remaining, vec![(Some(1), Some(2)), (Some(3), Some(0))]);
}

#[test]
fn edge_splice_and_unshift_insert_in_place() {
    init_tracing();
    let (queue, log) = (FrameQueue::new(), HookLog::default());
    let mut chart = graph(4, &[(0, 1), (2, 3)], &queue, &log);

    {
        let mut edges = chart.edges_mut().unwrap();
        edges.splice(1, 0, [RawEdge::new(1usize, 2usize)]);
        edges.unshift([RawEdge::new(3usize, 0usize)]);
    }

    assert_aligned(&chart);
    let order: Vec<_> = chart.parsed_edges().iter().map(|e| (e.source, e.target)).collect();
    assert_eq!(
        order,
        vec![
            (Some(3), Some(0)),
            (Some(0), Some(1)),
            (Some(1), Some(2)),
            (Some(2), Some(3)),
        ]
    );
}

#[test]
fn burst_of_mutations_resyncs_once() {
    init_tracing();
    let (queue, log) = (FrameQueue::new(), HookLog::default());
    let mut chart = graph(3, &[], &queue, &log);

    for _ in 0..100 {
        chart.edges_mut().unwrap().push(RawEdge::new(0usize, 1usize));
    }
    chart.nodes_mut().push(NodeRecord::at(5.0, 5.0).into());

    assert_eq!(queue.len(), 1);
    assert_eq!(run_frame(&queue, &mut chart), 1);
    assert_eq!(log.count("resync"), 1);
    assert_eq!(chart.edge_elements().len(), 100);
}

#[test]
fn reset_puts_everything_at_base() {
    init_tracing();
    let (queue, log) = (FrameQueue::new(), HookLog::default());
    let mut chart = graph(3, &[(0, 1), (1, 2)], &queue, &log);
    chart.set_edge_points(0, [BendPoint::new(4.0, 6.0)]);
    chart.update(UpdateMode::Default);

    chart.reset();

    let base = PixelPoint::new(0.0, 0.0);
    assert_eq!(log.count("reset"), 1);
    for node in chart.node_elements() {
        assert_eq!(node.position(), Some(base));
    }
    let geometry = chart.edge_elements()[0].geometry();
    assert_eq!(geometry.source, Some(base));
    assert_eq!((geometry.points[0].x, geometry.points[0].y), (base.x, base.y));
}

#[test]
fn relayout_calls_the_hook() {
    let (queue, log) = (FrameQueue::new(), HookLog::default());
    let mut chart = graph(2, &[(0, 1)], &queue, &log);

    chart.relayout();

    assert_eq!(log.count("relayout"), 1);
}

#[test]
fn tree_from_json() {
    init_tracing();
    let dataset = GraphDataset::from_json(
        r#"{
            "labels": ["root", "a", "b", "c"],
            "data": [{}, {"parent": 0}, {"parent": "root"}, {"parent": 1}],
            "derivedEdges": true
        }"#,
    )
    .unwrap();
    let chart = GraphController::builder(dataset).build().unwrap();

    let root = chart.tree_root().unwrap();
    assert_eq!(root.index, 0);
    let children: Vec<_> = chart.tree_children(&root).iter().map(|c| c.index).collect();
    assert_eq!(children, vec![1, 2]);
    assert_eq!(chart.tooltip_label(3), Some("c"));
}

#[test]
fn draw_order_clips_edges_only() {
    init_tracing();
    let (queue, log) = (FrameQueue::new(), HookLog::default());
    let mut chart = graph(2, &[(0, 1)], &queue, &log);
    chart.update(UpdateMode::Default);

    let mut canvas = Canvas::default();
    chart.draw(&mut canvas);

    assert_eq!(
        canvas.calls,
        vec![Draw::Clip, Draw::Line(2), Draw::Unclip, Draw::Point, Draw::Point]
    );
}

#[test]
fn draw_without_edges_skips_clip() {
    let (queue, log) = (FrameQueue::new(), HookLog::default());
    let mut chart = graph(2, &[], &queue, &log);
    chart.update(UpdateMode::Default);

    let mut canvas = Canvas::default();
    chart.draw(&mut canvas);

    assert_eq!(canvas.calls, vec![Draw::Point, Draw::Point]);
}

#[test]
fn directed_edges_draw_arrow_heads() {
    let dataset = GraphDataset::from_json(
        r#"{
            "data": [{"x": 1, "y": 1}, {"x": 5, "y": 5}],
            "edges": [{"source": 0, "target": 1}],
            "directed": true
        }"#,
    )
    .unwrap();
    let mut chart = GraphController::builder(dataset).build().unwrap();
    chart.update(UpdateMode::Default);

    let mut canvas = Canvas::default();
    chart.draw(&mut canvas);

    assert_eq!(canvas.calls[..4], [Draw::Clip, Draw::Line(2), Draw::Arrow, Draw::Unclip]);
}

#[test]
fn destroy_detaches_and_cancels() {
    init_tracing();
    let (queue, log) = (FrameQueue::new(), HookLog::default());
    let mut chart = graph(3, &[(0, 1)], &queue, &log);
    let stale = queue.take_frame();
    assert_eq!(stale.len(), 1);

    chart.destroy();
    chart.destroy();

    assert_eq!(log.count("stop"), 1);
    assert!(!chart.on_animation_frame(stale[0]));
    assert_eq!(log.count("resync"), 0);

    chart.nodes_mut().push(NodeRecord::at(1.0, 1.0).into());
    chart.edges_mut().unwrap().push(RawEdge::new(0usize, 2usize));

    assert_eq!(chart.nodes().len(), 4);
    assert_eq!(chart.parsed_nodes().len(), 3);
    assert_eq!(chart.parsed_edges().len(), 1);
    assert!(queue.is_empty());
}

#[test]
fn resync_hook_may_destroy_the_chart() {
    init_tracing();

    struct DestroyingLayout {
        log: HookLog,
    }

    impl GraphLayout for DestroyingLayout {
        fn re_layout(&mut self, _chart: &mut GraphController) {
            self.log.0.lock().push("relayout");
        }

        fn stop_layout(&mut self, chart: &mut GraphController) {
            assert!(chart.is_destroyed());
            self.log.0.lock().push("stop");
        }

        fn resync_layout(&mut self, chart: &mut GraphController) {
            self.log.0.lock().push("resync");
            chart.destroy();
            // The layout is busy, so nested hooks are skipped.
            chart.relayout();
        }
    }

    let (queue, log) = (FrameQueue::new(), HookLog::default());
    let mut chart = graph(3, &[(0, 1)], &queue, &log);
    chart.set_layout(DestroyingLayout { log: log.clone() });

    assert_eq!(run_frame(&queue, &mut chart), 1);

    assert!(chart.is_destroyed());
    assert_eq!(log.count("resync"), 1);
    assert_eq!(log.count("stop"), 1);
    assert_eq!(log.count("relayout"), 0);

    chart.destroy();
    assert_eq!(log.count("stop"), 1);
    assert!(queue.is_empty());
}

#[test]
fn new_scales_and_area_apply_on_update() {
    init_tracing();
    let (queue, log) = (FrameQueue::new(), HookLog::default());
    let mut chart = graph(2, &[(0, 1)], &queue, &log);
    chart.update(UpdateMode::Default);
    assert_eq!(chart.node_elements()[0].position(), Some(PixelPoint::new(10.0, 10.0)));

    chart.set_scales(LinearScale::new(0.0, 10.0, 0.0, 200.0), LinearScale::new(0.0, 10.0, 0.0, 50.0));
    chart.set_area(ChartArea::new(0.0, 0.0, 200.0, 50.0));
    chart.update(UpdateMode::Default);

    assert_eq!(chart.area(), ChartArea::new(0.0, 0.0, 200.0, 50.0));
    assert_eq!(chart.node_elements()[1].position(), Some(PixelPoint::new(40.0, 10.0)));
    let geometry = chart.edge_elements()[0].geometry();
    assert_eq!(geometry.source, Some(PixelPoint::new(20.0, 5.0)));
    assert_eq!(geometry.target, Some(PixelPoint::new(40.0, 10.0)));
}

#[test]
fn resync_hook_may_mutate_edges() {
    init_tracing();

    struct GrowingLayout {
        grown: bool,
    }

    impl GraphLayout for GrowingLayout {
        fn resync_layout(&mut self, chart: &mut GraphController) {
            if !self.grown {
                self.grown = true;
                chart.edges_mut().unwrap().push(RawEdge::new(0usize, 2usize));
            }
        }
    }

    let queue = FrameQueue::new();
    let dataset = GraphDataset::from_nodes([NodeRecord::at(1.0, 1.0), NodeRecord::at(2.0, 2.0), NodeRecord::at(3.0, 3.0)])
        .with_edges([RawEdge::new(0usize, 1usize)]);
    let mut chart = GraphController::builder(dataset)
        .frames(Arc::new(queue.clone()))
        .layout(GrowingLayout { grown: false })
        .build()
        .unwrap();

    assert_eq!(run_frame(&queue, &mut chart), 1);

    assert_eq!(chart.parsed_edges().len(), 2);
    assert_eq!(chart.edge_elements().len(), 2);
    // The hook's own mutation asks for the following frame.
    assert_eq!(queue.len(), 1);
    assert_eq!(run_frame(&queue, &mut chart), 1);
    assert_eq!(queue.len(), 0);
}

#[test]
fn node_mutations_rederive_edges() {
    init_tracing();
    let dataset = GraphDataset::from_nodes([
        NodeRecord::at(1.0, 1.0),
        NodeRecord { x: Some(2.0), y: Some(2.0), ..NodeRecord::child_of(0usize) },
    ]);
    let mut chart = GraphController::builder(dataset).build().unwrap();
    assert_eq!(chart.parsed_edges().len(), 1);

    let leaf: NodeHandle = NodeRecord { x: Some(3.0), y: Some(3.0), ..NodeRecord::child_of(1usize) }.into();
    chart.nodes_mut().push(leaf);

    assert_eq!(chart.parsed_edges().len(), 2);
    assert_aligned(&chart);

    chart.nodes_mut().pop();
    assert_eq!(chart.parsed_edges().len(), 1);
    assert_aligned(&chart);

    chart.nodes_mut().splice(0, 1, [NodeRecord::at(4.0, 4.0).into(), NodeRecord::at(5.0, 5.0).into()]);
    assert_eq!(chart.nodes().len(), 3);
    assert_eq!(chart.parsed_nodes()[0].x, Some(4.0));
    assert_aligned(&chart);

    chart.nodes_mut().shift();
    chart.nodes_mut().unshift([NodeRecord::default().into()]);
    assert_aligned(&chart);
}

#[test]
fn replacing_arrays_rebuilds() {
    init_tracing();
    let (queue, log) = (FrameQueue::new(), HookLog::default());
    let mut chart = graph(3, &[(0, 1)], &queue, &log);

    chart.set_edges(Some(vec![RawEdge::new(0usize, 1usize), RawEdge::new(1usize, 2usize)]));
    assert_eq!(chart.edge_elements().len(), 2);

    chart.set_nodes((0..5).map(|i| NodeHandle::new(NodeRecord::at(i as f64, 0.0))));
    assert_eq!(chart.node_elements().len(), 5);
    assert_aligned(&chart);

    chart.edges_mut().unwrap().push(RawEdge::new(3usize, 4usize));
    assert_eq!(chart.edge_elements().len(), 3);
}

#[test]
fn edge_config_is_only_active_during_edge_batches() {
    let (queue, log) = (FrameQueue::new(), HookLog::default());
    let mut chart = graph(3, &[(0, 1), (1, 2)], &queue, &log);

    chart.update(UpdateMode::Default);
    chart.edges_mut().unwrap().push(RawEdge::new(2usize, 0usize));

    assert_eq!(chart.active_element_config().kind(), ElementKind::Node);
}
