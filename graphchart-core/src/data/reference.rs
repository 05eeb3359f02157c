//! Edge Reference Resolution
//!
//! Maps an [`EdgeRef`] to a node index. The rules are tried in order and the
//! first match wins:
//!
//! 1. a literal index is taken as is;
//! 2. a label resolves to its position among the chart labels;
//! 3. a node handle found among `nodes` resolves to its position;
//! 4. an object carrying an index (or a node record with an `index` field)
//!    resolves to that index;
//! 5. a node handle found among the dataset's raw values resolves to its
//!    position there.
//!
//! Anything else cannot be resolved. That is reported through `tracing` and
//! yields `None`; callers render such an edge as absent and never fall back
//! to node 0.

use super::{EdgeRef, NodeHandle, NodeIndex};
use crate::error::{GraphError, Result};

/// Resolves edge references against chart labels and dataset values.
#[derive(Debug, Clone, Copy)]
pub struct ReferenceResolver<'a> {
    labels: &'a [String],
    values: &'a [NodeHandle],
}

impl<'a> ReferenceResolver<'a> {
    /// Create a resolver over the chart labels and the dataset's raw values.
    pub fn new(labels: &'a [String], values: &'a [NodeHandle]) -> Self {
        Self { labels, values }
    }

    /// Resolve `reference` against `nodes`, reporting failures as errors.
    pub fn try_resolve(&self, nodes: &[NodeHandle], reference: &EdgeRef) -> Result<NodeIndex> {
        match reference {
            EdgeRef::Index(index) => Ok(*index),
            EdgeRef::Label(label) => self
                .labels
                .iter()
                .position(|l| l == label)
                .ok_or_else(|| GraphError::UnknownLabel(label.clone())),
            EdgeRef::Indexed { index } => Ok(*index),
            EdgeRef::Unresolvable(value) => Err(GraphError::UnresolvedReference {
                reference: value.to_string(),
            }),
            EdgeRef::Node(node) => {
                if let Some(position) = position_of(nodes, node) {
                    return Ok(position);
                }
                if let Some(index) = node.index {
                    return Ok(index);
                }
                position_of(self.values, node).ok_or_else(|| GraphError::UnresolvedReference {
                    reference: format!("{reference:?}"),
                })
            }
        }
    }

    /// Resolve `reference` against `nodes`.
    ///
    /// Returns `None`, after logging a warning, when no rule matches.
    pub fn resolve(&self, nodes: &[NodeHandle], reference: &EdgeRef) -> Option<NodeIndex> {
        match self.try_resolve(nodes, reference) {
            Ok(index) => Some(index),
            Err(GraphError::UnknownLabel(label)) => {
                tracing::debug!(%label, "edge references an unknown label");
                None
            }
            Err(err) => {
                tracing::warn!(error = %err, "cannot resolve edge reference");
                None
            }
        }
    }
}

fn position_of(nodes: &[NodeHandle], node: &NodeHandle) -> Option<NodeIndex> {
    nodes.iter().position(|n| n.ptr_eq(node))
}

#[cfg(test)]
mod tests {
    use std::io;
    use std::sync::Arc;

    use parking_lot::Mutex;
    use tracing_subscriber::fmt::MakeWriter;

    use super::*;
    use crate::data::NodeRecord;

    /// Collects formatted log output.
    #[derive(Clone, Default)]
    struct Captured(Arc<Mutex<Vec<u8>>>);

    impl Captured {
        fn text(&self) -> String {
            String::from_utf8_lossy(&self.0.lock()).into_owned()
        }
    }

    impl io::Write for Captured {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl<'a> MakeWriter<'a> for Captured {
        type Writer = Captured;

        fn make_writer(&'a self) -> Self::Writer {
            self.clone()
        }
    }

    fn capture_warnings<T>(f: impl FnOnce() -> T) -> (T, String) {
        let captured = Captured::default();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(captured.clone())
            .with_ansi(false)
            .with_max_level(tracing::Level::WARN)
            .finish();
        let out = tracing::subscriber::with_default(subscriber, f);
        (out, captured.text())
    }

    fn nodes(n: usize) -> Vec<NodeHandle> {
        (0..n).map(|_| NodeHandle::new(NodeRecord::default())).collect()
    }

    fn labels() -> Vec<String> {
        vec!["A".into(), "B".into(), "C".into()]
    }

    #[test]
    fn literal_index() {
        let nodes = nodes(3);
        let labels = labels();
        let resolver = ReferenceResolver::new(&labels, &nodes);
        assert_eq!(resolver.resolve(&nodes, &EdgeRef::Index(2)), Some(2));
    }

    #[test]
    fn label_position() {
        let nodes = nodes(3);
        let labels = labels();
        let resolver = ReferenceResolver::new(&labels, &nodes);
        assert_eq!(resolver.resolve(&nodes, &"B".into()), Some(1));
        assert_eq!(resolver.resolve(&nodes, &"Z".into()), None);
        assert!(matches!(
            resolver.try_resolve(&nodes, &"Z".into()),
            Err(GraphError::UnknownLabel(_))
        ));
    }

    #[test]
    fn node_identity() {
        let nodes = nodes(3);
        let labels = labels();
        let resolver = ReferenceResolver::new(&labels, &nodes);
        assert_eq!(resolver.resolve(&nodes, &EdgeRef::from(&nodes[1])), Some(1));
    }

    #[test]
    fn object_with_index() {
        let nodes = nodes(3);
        let labels = labels();
        let resolver = ReferenceResolver::new(&labels, &nodes);
        assert_eq!(resolver.resolve(&nodes, &EdgeRef::Indexed { index: 5 }), Some(5));

        let annotated = NodeHandle::new(NodeRecord {
            index: Some(4),
            ..NodeRecord::default()
        });
        assert_eq!(resolver.resolve(&nodes, &annotated.into()), Some(4));
    }

    #[test]
    fn falls_back_to_dataset_values() {
        let values = nodes(4);
        let subset = values[..2].to_vec();
        let labels = labels();
        let resolver = ReferenceResolver::new(&labels, &values);
        assert_eq!(resolver.resolve(&subset, &EdgeRef::from(&values[3])), Some(3));
    }

    #[test]
    fn unknown_node_is_unresolvable() {
        let nodes = nodes(3);
        let labels = labels();
        let resolver = ReferenceResolver::new(&labels, &nodes);
        let stranger = NodeHandle::new(NodeRecord::default());

        assert_eq!(resolver.resolve(&nodes, &stranger.clone().into()), None);
        assert!(matches!(
            resolver.try_resolve(&nodes, &stranger.into()),
            Err(GraphError::UnresolvedReference { .. })
        ));
    }

    #[test]
    fn unresolvable_reference_logs_a_warning() {
        let nodes = nodes(3);
        let labels = labels();
        let resolver = ReferenceResolver::new(&labels, &nodes);
        let stranger = NodeHandle::new(NodeRecord::default());

        let (resolved, log) = capture_warnings(|| resolver.resolve(&nodes, &stranger.into()));
        assert_eq!(resolved, None);
        assert!(log.contains("cannot resolve edge reference"), "log was {log:?}");

        let odd = EdgeRef::Unresolvable(serde_json::json!({"id": "x"}));
        let (resolved, log) = capture_warnings(|| resolver.resolve(&nodes, &odd));
        assert_eq!(resolved, None);
        assert!(log.contains("cannot resolve edge reference"), "log was {log:?}");
    }

    #[test]
    fn resolvable_reference_logs_nothing() {
        let nodes = nodes(3);
        let labels = labels();
        let resolver = ReferenceResolver::new(&labels, &nodes);

        let (resolved, log) = capture_warnings(|| resolver.resolve(&nodes, &EdgeRef::Index(1)));
        assert_eq!(resolved, Some(1));
        assert!(log.is_empty(), "log was {log:?}");
    }
}
