//! Flow network graph model
//!
//! A [`Graph`] owns its nodes, edges and waterbodies. Nodes and edges are
//! stored in dense vectors and addressed internally by [`NodeIndex`] /
//! [`EdgeIndex`]; the stable external keys are [`NodeId`] / [`EdgeId`].
//!
//! The structure is fixed once built. Algorithms only mutate edge
//! attributes (`rank`, `orders`).

mod edge;
mod node;
mod waterbody;

pub use edge::{Edge, EdgeId, EdgeType, Rank, StreamOrders};
pub use node::{Node, NodeId};
pub use waterbody::{Waterbody, WaterbodyId};

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// Dense position of a node inside one [`Graph`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeIndex(usize);

/// Dense position of an edge inside one [`Graph`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EdgeIndex(usize);

impl NodeIndex {
    pub fn index(self) -> usize {
        self.0
    }
}

impl EdgeIndex {
    pub fn index(self) -> usize {
        self.0
    }
}

/// A directed flow network.
///
/// # Example
///
/// ```ignore
/// use hydronet_core::graph::{Edge, EdgeId, Graph, NodeId};
/// use geo_types::LineString;
///
/// let mut graph = Graph::new();
/// graph.add_node(NodeId(1))?;
/// graph.add_node(NodeId(2))?;
/// let line = LineString::from(vec![(0.0, 0.0), (1.0, 0.0)]);
/// graph.add_edge(Edge::new(EdgeId(10), NodeId(1), NodeId(2), line))?;
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(try_from = "GraphRecord", into = "GraphRecord")]
pub struct Graph {
    nodes: Vec<Node>,
    edges: Vec<Edge>,
    endpoints: Vec<(NodeIndex, NodeIndex)>,
    node_lookup: HashMap<NodeId, NodeIndex>,
    edge_lookup: HashMap<EdgeId, EdgeIndex>,
    waterbodies: BTreeMap<WaterbodyId, Waterbody>,
}

impl Graph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(nodes: usize, edges: usize) -> Self {
        Self {
            nodes: Vec::with_capacity(nodes),
            edges: Vec::with_capacity(edges),
            endpoints: Vec::with_capacity(edges),
            node_lookup: HashMap::with_capacity(nodes),
            edge_lookup: HashMap::with_capacity(edges),
            waterbodies: BTreeMap::new(),
        }
    }

    /// Add a node. Fails if the id is already present.
    pub fn add_node(&mut self, id: NodeId) -> Result<NodeIndex> {
        if self.node_lookup.contains_key(&id) {
            return Err(Error::DuplicateNode(id));
        }
        Ok(self.push_node(id))
    }

    /// Return the index of `id`, adding the node first if needed.
    pub fn ensure_node(&mut self, id: NodeId) -> NodeIndex {
        match self.node_lookup.get(&id) {
            Some(&ix) => ix,
            None => self.push_node(id),
        }
    }

    fn push_node(&mut self, id: NodeId) -> NodeIndex {
        let ix = NodeIndex(self.nodes.len());
        self.nodes.push(Node::new(id));
        self.node_lookup.insert(id, ix);
        ix
    }

    /// Add an edge between two existing nodes.
    ///
    /// # Errors
    /// - [`Error::DuplicateEdge`] if the edge id is taken
    /// - [`Error::MissingNode`] if either endpoint was never added
    /// - [`Error::InvalidEdge`] if the length is negative or not finite
    pub fn add_edge(&mut self, edge: Edge) -> Result<EdgeIndex> {
        if self.edge_lookup.contains_key(&edge.id()) {
            return Err(Error::DuplicateEdge(edge.id()));
        }
        if !edge.length.is_finite() || edge.length < 0.0 {
            return Err(Error::InvalidEdge {
                edge: edge.id(),
                reason: format!("length must be finite and >= 0, got {}", edge.length),
            });
        }
        let from = *self.node_lookup.get(&edge.from()).ok_or(Error::MissingNode {
            edge: edge.id(),
            node: edge.from(),
        })?;
        let to = *self.node_lookup.get(&edge.to()).ok_or(Error::MissingNode {
            edge: edge.id(),
            node: edge.to(),
        })?;

        let ix = EdgeIndex(self.edges.len());
        self.edge_lookup.insert(edge.id(), ix);
        self.edges.push(edge);
        self.endpoints.push((from, to));
        self.nodes[from.0].outgoing.push(ix);
        self.nodes[to.0].incoming.push(ix);
        Ok(ix)
    }

    /// Register (or replace) a waterbody outline.
    pub fn add_waterbody(&mut self, waterbody: Waterbody) {
        self.waterbodies.insert(waterbody.id, waterbody);
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn node_index(&self, id: NodeId) -> Option<NodeIndex> {
        self.node_lookup.get(&id).copied()
    }

    pub fn edge_index(&self, id: EdgeId) -> Option<EdgeIndex> {
        self.edge_lookup.get(&id).copied()
    }

    /// Node at `ix`. Panics if `ix` came from another graph.
    pub fn node(&self, ix: NodeIndex) -> &Node {
        &self.nodes[ix.0]
    }

    /// Edge at `ix`. Panics if `ix` came from another graph.
    pub fn edge(&self, ix: EdgeIndex) -> &Edge {
        &self.edges[ix.0]
    }

    pub fn edge_mut(&mut self, ix: EdgeIndex) -> &mut Edge {
        &mut self.edges[ix.0]
    }

    pub fn edge_by_id(&self, id: EdgeId) -> Option<&Edge> {
        self.edge_index(id).map(|ix| self.edge(ix))
    }

    pub fn edge_by_id_mut(&mut self, id: EdgeId) -> Option<&mut Edge> {
        let ix = self.edge_index(id)?;
        Some(&mut self.edges[ix.0])
    }

    pub fn node_indices(&self) -> impl Iterator<Item = NodeIndex> {
        (0..self.nodes.len()).map(NodeIndex)
    }

    pub fn edge_indices(&self) -> impl Iterator<Item = EdgeIndex> {
        (0..self.edges.len()).map(EdgeIndex)
    }

    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.iter()
    }

    pub fn edges(&self) -> impl Iterator<Item = &Edge> {
        self.edges.iter()
    }

    /// Tail node of an edge
    pub fn source(&self, e: EdgeIndex) -> NodeIndex {
        self.endpoints[e.0].0
    }

    /// Head node of an edge
    pub fn target(&self, e: EdgeIndex) -> NodeIndex {
        self.endpoints[e.0].1
    }

    pub fn incoming(&self, n: NodeIndex) -> &[EdgeIndex] {
        self.nodes[n.0].incoming()
    }

    pub fn outgoing(&self, n: NodeIndex) -> &[EdgeIndex] {
        self.nodes[n.0].outgoing()
    }

    pub fn in_degree(&self, n: NodeIndex) -> usize {
        self.nodes[n.0].in_degree()
    }

    pub fn out_degree(&self, n: NodeIndex) -> usize {
        self.nodes[n.0].out_degree()
    }

    /// Nodes with no outgoing edges
    pub fn sinks(&self) -> impl Iterator<Item = NodeIndex> + '_ {
        self.node_indices().filter(|&n| self.nodes[n.0].is_sink())
    }

    /// Nodes with more than one outgoing edge
    pub fn divergences(&self) -> impl Iterator<Item = NodeIndex> + '_ {
        self.node_indices().filter(|&n| self.nodes[n.0].is_divergence())
    }

    pub fn waterbody(&self, id: WaterbodyId) -> Option<&Waterbody> {
        self.waterbodies.get(&id)
    }

    pub fn waterbodies(&self) -> impl Iterator<Item = &Waterbody> {
        self.waterbodies.values()
    }

    /// Set every edge back to [`Rank::Primary`].
    pub fn reset_ranks(&mut self) {
        for e in &mut self.edges {
            e.rank = Rank::Primary;
        }
    }

    /// Clear every computed stream-order attribute.
    pub fn reset_orders(&mut self) {
        for e in &mut self.edges {
            e.orders = None;
        }
    }
}

/// Flat serialized form of a [`Graph`]. Adjacency is rebuilt on load.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct GraphRecord {
    nodes: Vec<NodeId>,
    edges: Vec<Edge>,
    #[serde(default)]
    waterbodies: Vec<Waterbody>,
}

impl TryFrom<GraphRecord> for Graph {
    type Error = Error;

    fn try_from(record: GraphRecord) -> Result<Self> {
        let mut graph = Graph::with_capacity(record.nodes.len(), record.edges.len());
        for id in record.nodes {
            graph.add_node(id)?;
        }
        for edge in record.edges {
            graph.add_edge(edge)?;
        }
        for wb in record.waterbodies {
            graph.add_waterbody(wb);
        }
        Ok(graph)
    }
}

impl From<Graph> for GraphRecord {
    fn from(graph: Graph) -> Self {
        GraphRecord {
            nodes: graph.nodes.iter().map(Node::id).collect(),
            edges: graph.edges,
            waterbodies: graph.waterbodies.into_values().collect(),
        }
    }
}
