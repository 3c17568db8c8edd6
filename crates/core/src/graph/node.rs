//! Network nodes (confluence / divergence points)

use serde::{Deserialize, Serialize};
use std::fmt;

use super::EdgeIndex;

/// Stable external identity of a node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(pub u64);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "N-{}", self.0)
    }
}

impl From<u64> for NodeId {
    fn from(v: u64) -> Self {
        NodeId(v)
    }
}

/// A nexus in the flow network.
///
/// Incoming and outgoing edges are kept in insertion order, which is the
/// order every traversal visits them in.
#[derive(Debug, Clone)]
pub struct Node {
    id: NodeId,
    pub(crate) incoming: Vec<EdgeIndex>,
    pub(crate) outgoing: Vec<EdgeIndex>,
}

impl Node {
    pub(crate) fn new(id: NodeId) -> Self {
        Self {
            id,
            incoming: Vec::new(),
            outgoing: Vec::new(),
        }
    }

    pub fn id(&self) -> NodeId {
        self.id
    }

    /// Edges ending at this node
    pub fn incoming(&self) -> &[EdgeIndex] {
        &self.incoming
    }

    /// Edges starting at this node
    pub fn outgoing(&self) -> &[EdgeIndex] {
        &self.outgoing
    }

    pub fn in_degree(&self) -> usize {
        self.incoming.len()
    }

    pub fn out_degree(&self) -> usize {
        self.outgoing.len()
    }

    /// More than one outgoing edge
    pub fn is_divergence(&self) -> bool {
        self.outgoing.len() > 1
    }

    /// More than one incoming edge
    pub fn is_confluence(&self) -> bool {
        self.incoming.len() > 1
    }

    /// No outgoing edges
    pub fn is_sink(&self) -> bool {
        self.outgoing.is_empty()
    }
}
