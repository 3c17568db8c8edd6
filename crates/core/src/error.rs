//! Error types for hydronet

use crate::graph::{EdgeId, NodeId};
use thiserror::Error;

/// Main error type for flow network operations
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    #[error("Structural error at node {node}: {reason}")]
    Structural { node: NodeId, reason: String },

    #[error("Edge {edge} references missing node {node}")]
    MissingNode { edge: EdgeId, node: NodeId },

    #[error("Duplicate node id {0}")]
    DuplicateNode(NodeId),

    #[error("Duplicate edge id {0}")]
    DuplicateEdge(EdgeId),

    #[error("Invalid edge {edge}: {reason}")]
    InvalidEdge { edge: EdgeId, reason: String },

    #[error("Cycle detected through node {node}")]
    Cycle { node: NodeId },

    #[error("{} node(s) unreachable from any sink", nodes.len())]
    Unreachable { nodes: Vec<NodeId> },

    #[error("Invalid parameter: {name} = {value} ({reason})")]
    InvalidParameter {
        name: &'static str,
        value: String,
        reason: String,
    },
}

impl Error {
    /// True for the errors that make a graph unusable for ordering.
    pub fn is_structural(&self) -> bool {
        matches!(
            self,
            Error::Structural { .. }
                | Error::MissingNode { .. }
                | Error::DuplicateNode(_)
                | Error::DuplicateEdge(_)
                | Error::InvalidEdge { .. }
        )
    }
}

/// Result type alias for flow network operations
pub type Result<T> = std::result::Result<T, Error>;
