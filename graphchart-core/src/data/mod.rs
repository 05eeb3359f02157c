//! Graph Data
//!
//! The user-facing data model: node records, edge endpoint references, raw
//! edges, and the dataset that owns the observable node and edge arrays.
//!
//! # Identity
//!
//! Nodes are identified by their position in the node array. That position
//! shifts on every splice, so nothing in the controller is keyed by node
//! identity. The one place identity matters is reference resolution, where an
//! edge may point at a node by handing over the node itself; [`NodeHandle`]
//! provides that identity through pointer equality.

mod edges;
mod reference;

pub use edges::{BendPoint, EdgeParser, ParsedEdge};
pub use reference::ReferenceResolver;

use std::fmt;
use std::ops::Deref;
use std::sync::Arc;

use indexmap::IndexMap;
use serde::{Deserialize, Deserializer};
use serde_json::{Map, Value};

use crate::error::Result;
use crate::observe::ObservableVec;

/// Position of a node in the node array.
pub type NodeIndex = usize;

/// A user node record.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NodeRecord {
    /// Data-space x coordinate, if the user supplied one.
    #[serde(default)]
    pub x: Option<f64>,

    /// Data-space y coordinate, if the user supplied one.
    #[serde(default)]
    pub y: Option<f64>,

    /// Parent node, for datasets whose edges are derived from a tree.
    #[serde(default)]
    pub parent: Option<EdgeRef>,

    /// Explicit index annotation, honored when the record is used as a
    /// reference but is not found among the nodes.
    #[serde(default)]
    pub index: Option<NodeIndex>,

    /// Everything else the user put on the record.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl NodeRecord {
    /// A record at the given data-space position.
    pub fn at(x: f64, y: f64) -> Self {
        Self {
            x: Some(x),
            y: Some(y),
            ..Self::default()
        }
    }

    /// A record whose parent is `parent`.
    pub fn child_of(parent: impl Into<EdgeRef>) -> Self {
        Self {
            parent: Some(parent.into()),
            ..Self::default()
        }
    }
}

/// Shared handle to a [`NodeRecord`].
///
/// Cloning a handle is cheap and the clone refers to the same node:
/// [`ptr_eq`](Self::ptr_eq) is how edge references match nodes by identity.
#[derive(Clone, Default)]
pub struct NodeHandle(Arc<NodeRecord>);

impl NodeHandle {
    /// Wrap a record in a new handle.
    pub fn new(record: NodeRecord) -> Self {
        Self(Arc::new(record))
    }

    /// Whether both handles refer to the same node.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl Deref for NodeHandle {
    type Target = NodeRecord;

    fn deref(&self) -> &NodeRecord {
        &self.0
    }
}

impl From<NodeRecord> for NodeHandle {
    fn from(record: NodeRecord) -> Self {
        Self::new(record)
    }
}

impl fmt::Debug for NodeHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("NodeHandle").field(&*self.0).finish()
    }
}

impl<'de> Deserialize<'de> for NodeHandle {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        NodeRecord::deserialize(deserializer).map(Self::new)
    }
}

/// A reference from an edge (or a `parent` field) to a node.
#[derive(Debug, Clone)]
pub enum EdgeRef {
    /// A literal node index.
    Index(NodeIndex),

    /// A chart label; resolves to the label's position.
    Label(String),

    /// The node itself.
    Node(NodeHandle),

    /// Any object carrying a node index, such as a tree accessor result.
    Indexed {
        /// The node index the object carries.
        index: NodeIndex,
    },

    /// A loaded value of any other shape, such as a negative number or an
    /// object without an index. It never resolves.
    Unresolvable(Value),
}

/// JSON shapes an [`EdgeRef`] can take. Node identity has no JSON form.
#[derive(Deserialize)]
#[serde(untagged)]
enum RefRepr {
    Index(NodeIndex),
    Label(String),
    Indexed { index: NodeIndex },
    Other(Value),
}

impl<'de> Deserialize<'de> for EdgeRef {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        Ok(match RefRepr::deserialize(deserializer)? {
            RefRepr::Index(index) => Self::Index(index),
            RefRepr::Label(label) => Self::Label(label),
            RefRepr::Indexed { index } => Self::Indexed { index },
            RefRepr::Other(value) => Self::Unresolvable(value),
        })
    }
}

impl From<NodeIndex> for EdgeRef {
    fn from(index: NodeIndex) -> Self {
        Self::Index(index)
    }
}

impl From<&str> for EdgeRef {
    fn from(label: &str) -> Self {
        Self::Label(label.to_owned())
    }
}

impl From<String> for EdgeRef {
    fn from(label: String) -> Self {
        Self::Label(label)
    }
}

impl From<NodeHandle> for EdgeRef {
    fn from(node: NodeHandle) -> Self {
        Self::Node(node)
    }
}

impl From<&NodeHandle> for EdgeRef {
    fn from(node: &NodeHandle) -> Self {
        Self::Node(node.clone())
    }
}

/// An edge as supplied by the user.
#[derive(Debug, Clone, Deserialize)]
pub struct RawEdge {
    /// Where the edge starts.
    pub source: EdgeRef,

    /// Where the edge ends.
    pub target: EdgeRef,

    /// Everything else the user put on the edge.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl RawEdge {
    /// An edge between two references.
    pub fn new(source: impl Into<EdgeRef>, target: impl Into<EdgeRef>) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
            extra: Map::new(),
        }
    }
}

/// A graph dataset: chart labels, nodes, optional explicit edges and style
/// values.
///
/// Deserializes from the chart.js-style JSON shape:
///
/// ```json
/// {
///   "labels": ["A", "B", "C"],
///   "data": [{}, {"parent": "A"}, {"parent": 0}],
///   "derivedEdges": true,
///   "lineBorderColor": "steelblue"
/// }
/// ```
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphDataset {
    /// Chart labels; label references resolve against these.
    #[serde(default)]
    pub labels: Vec<String>,

    /// Node records.
    #[serde(default)]
    pub data: ObservableVec<NodeHandle>,

    /// Explicit edges. When absent, edges are derived from `parent` fields.
    #[serde(default)]
    pub edges: Option<ObservableVec<RawEdge>>,

    /// Hint that edges come from `parent` fields; changes how the tree root
    /// is found.
    #[serde(default)]
    pub derived_edges: bool,

    /// Dataset-level style values (`lineBorderColor`, `pointRadius`, ...).
    #[serde(flatten)]
    pub options: IndexMap<String, Value>,
}

impl GraphDataset {
    /// A dataset over the given nodes with edges derived from parents.
    pub fn from_nodes<I>(nodes: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<NodeHandle>,
    {
        Self {
            data: nodes.into_iter().map(Into::into).collect(),
            derived_edges: true,
            ..Self::default()
        }
    }

    /// Attach an explicit edge list.
    pub fn with_edges(mut self, edges: impl IntoIterator<Item = RawEdge>) -> Self {
        self.edges = Some(edges.into_iter().collect());
        self.derived_edges = false;
        self
    }

    /// Set the chart labels.
    pub fn with_labels<I, S>(mut self, labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.labels = labels.into_iter().map(Into::into).collect();
        self
    }

    /// Parse a dataset from JSON.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}
