//! Flow segments and their computed attributes

use geo_types::LineString;
use serde::{Deserialize, Serialize};
use std::fmt;

use super::{NodeId, WaterbodyId};

/// Stable external identity of an edge
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EdgeId(pub u64);

impl fmt::Display for EdgeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "E-{}", self.0)
    }
}

impl From<u64> for EdgeId {
    fn from(v: u64) -> Self {
        EdgeId(v)
    }
}

/// Origin of a flow segment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EdgeType {
    /// Observed channel
    #[default]
    Normal,
    /// Synthetic connector from a waterbody bank to its skeleton
    Bank,
    /// Synthetic centerline through a waterbody
    Skeleton,
}

/// Relative importance of a segment at a divergence
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Rank {
    #[default]
    Primary,
    Secondary,
}

/// Stream classification attributes of a qualifying edge.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StreamOrders {
    /// Length of the longest qualifying path ending at the edge's from-node
    pub upstream_length: f64,
    /// `upstream_length` plus the edge's own length
    pub total_length: f64,
    pub strahler: u32,
    pub horton: u32,
    pub hack: u32,
    pub shreve: u64,
    pub mainstem_id: u64,
    /// 1 at the most upstream member of the mainstem, growing toward the mouth
    pub mainstem_sequence: u32,
}

/// A directed flow segment between two nodes.
///
/// Edges refer to their endpoints by [`NodeId`]; the owning
/// [`Graph`](super::Graph) keeps the adjacency. Identity and endpoints are
/// fixed at construction, only the attributes below them are public.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Edge {
    id: EdgeId,
    from: NodeId,
    to: NodeId,
    pub geometry: LineString<f64>,
    #[serde(default)]
    pub edge_type: EdgeType,
    pub length: f64,
    #[serde(default)]
    pub rank: Rank,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Waterbody a synthetic segment was generated across
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub waterbody: Option<WaterbodyId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub orders: Option<StreamOrders>,
}

impl Edge {
    /// Create a normal, primary edge whose length is the planar length of
    /// its geometry.
    pub fn new(id: EdgeId, from: NodeId, to: NodeId, geometry: LineString<f64>) -> Self {
        let length = planar_length(&geometry);
        Self {
            id,
            from,
            to,
            geometry,
            edge_type: EdgeType::Normal,
            length,
            rank: Rank::Primary,
            name: None,
            waterbody: None,
            orders: None,
        }
    }

    pub fn id(&self) -> EdgeId {
        self.id
    }

    /// Node the edge leaves
    pub fn from(&self) -> NodeId {
        self.from
    }

    /// Node the edge enters
    pub fn to(&self) -> NodeId {
        self.to
    }

    /// Override the length taken from the geometry
    pub fn with_length(mut self, length: f64) -> Self {
        self.length = length;
        self
    }

    pub fn with_type(mut self, edge_type: EdgeType) -> Self {
        self.edge_type = edge_type;
        self
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn in_waterbody(mut self, waterbody: WaterbodyId) -> Self {
        self.waterbody = Some(waterbody);
        self
    }

    pub fn is_bank(&self) -> bool {
        self.edge_type == EdgeType::Bank
    }

    pub fn is_skeleton(&self) -> bool {
        self.edge_type == EdgeType::Skeleton
    }

    /// Whether the edge takes part in stream ordering (primary and not a bank).
    pub fn qualifies_for_ordering(&self) -> bool {
        self.rank == Rank::Primary && self.edge_type != EdgeType::Bank
    }
}

fn planar_length(line: &LineString<f64>) -> f64 {
    line.lines()
        .map(|l| {
            let dx = l.end.x - l.start.x;
            let dy = l.end.y - l.start.y;
            (dx * dx + dy * dy).sqrt()
        })
        .sum()
}
