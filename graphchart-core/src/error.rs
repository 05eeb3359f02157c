//! Error types for the graph controller.

use thiserror::Error;

/// Errors produced while configuring or feeding a [`GraphController`].
///
/// Most data problems are not errors: an edge that points at a node that
/// does not exist is logged and rendered as absent. The variants here cover
/// the cases a caller can act on.
///
/// [`GraphController`]: crate::controller::GraphController
#[derive(Error, Debug)]
pub enum GraphError {
    /// An edge endpoint matched none of the resolution rules.
    #[error("cannot resolve edge reference {reference}")]
    UnresolvedReference {
        /// Debug rendering of the offending reference.
        reference: String,
    },

    /// A label reference named a label the chart does not have.
    #[error("unknown label {0:?}")]
    UnknownLabel(String),

    /// The configuration named an element type that is not registered.
    #[error("no {kind} element registered as {name:?}")]
    UnknownElementType {
        /// Either `"edge"` or `"node"`.
        kind: &'static str,
        /// The type name from the configuration.
        name: String,
    },

    /// Configuration or dataset JSON could not be parsed.
    #[error("invalid configuration: {0}")]
    Config(#[from] serde_json::Error),
}

/// Result alias used across the crate.
pub type Result<T> = std::result::Result<T, GraphError>;
