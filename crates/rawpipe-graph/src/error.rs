//! Error types for graph construction and configuration.

use crate::NodeId;
use thiserror::Error;

/// Errors raised by the filter graph.
#[derive(Debug, Error)]
pub enum GraphError {
    /// No constructor is registered under this name.
    #[error("unknown filter type: {0}")]
    UnknownFilterType(String),

    /// Linking would make a node its own ancestor.
    #[error("linking {node} after {previous} would create a cycle")]
    Cycle {
        /// Node being linked
        node: NodeId,
        /// Requested upstream node
        previous: NodeId,
    },

    /// A node cannot be its own upstream.
    #[error("{0} cannot be its own previous node")]
    SelfReference(NodeId),

    /// Color engine error.
    #[error(transparent)]
    Color(#[from] rawpipe_color::ColorError),

    /// Image buffer error.
    #[error(transparent)]
    Core(#[from] rawpipe_core::Error),
}

/// Result type for graph operations.
pub type GraphResult<T> = Result<T, GraphError>;
