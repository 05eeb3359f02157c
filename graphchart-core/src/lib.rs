//! Graphchart Core
//!
//! This crate renders node-link graphs (trees and general graphs) on top of a
//! scatter chart: nodes are points placed by two numeric scales, edges are
//! lines between node pairs, optionally bent through intermediate points.
//! It implements:
//!
//! - Edge derivation from explicit edge lists or parent links
//! - Symbolic reference resolution (index, label, node identity, index-carrying objects)
//! - Incremental synchronization of parsed data and elements under array mutation
//! - Coalesced, frame-deferred layout resync
//! - Pixel geometry for edges and nodes, with reset state and shared options
//!
//! # Architecture
//!
//! The crate is organized into several modules:
//!
//! - `data`: Dataset model, reference resolution and edge parsing
//! - `observe`: Arrays that report structural mutations to a listener
//! - `schedule`: Frame requests and the single-flight resync scheduler
//! - `element`: Renderable elements, their registry and option resolution
//! - `series`: Positional node storage
//! - `controller`: The graph controller tying it all together
//! - `scale`, `render`: The host's scales and drawing surface
//!
//! # Example
//!
//! ```rust,ignore
//! use graphchart_core::{GraphController, GraphDataset, NodeRecord, UpdateMode};
//!
//! let dataset = GraphDataset::from_nodes([
//!     NodeRecord::at(0.0, 0.0),
//!     NodeRecord::child_of(0usize),
//! ]);
//! let mut chart = GraphController::builder(dataset).build()?;
//!
//! // Appending a node updates every cache before returning.
//! chart.nodes_mut().push(NodeRecord::child_of(0usize).into());
//!
//! chart.update(UpdateMode::Default);
//! chart.draw(&mut canvas);
//! ```

pub mod config;
pub mod controller;
pub mod data;
pub mod element;
pub mod error;
pub mod observe;
pub mod render;
pub mod scale;
pub mod schedule;
pub mod series;

pub use config::ControllerConfig;
pub use controller::{GraphController, GraphControllerBuilder, GraphLayout, TreeNode};
pub use data::{BendPoint, EdgeRef, GraphDataset, NodeHandle, NodeIndex, NodeRecord, ParsedEdge, RawEdge};
pub use element::{ElementRegistry, UpdateMode};
pub use error::{GraphError, Result};
pub use render::{ChartArea, DrawContext, PixelPoint};
pub use scale::{LinearScale, Scale};
pub use schedule::{FrameQueue, FrameRequest, FrameScheduler};
