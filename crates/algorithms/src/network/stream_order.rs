//! Stream ordering
//!
//! Computes, for every PRIMARY non-bank edge:
//! - Shreve magnitude: number of headwater edges upstream
//! - Strahler order: increments where two branches of equal order meet
//! - Upstream length: longest qualifying path ending at the edge's tail
//! - Mainstem id / sequence, Horton order and Hack order (see [`mainstem`])
//!
//! Edges that do not qualify (SECONDARY or BANK) neither receive attributes
//! nor count as inflows. An edge whose only predecessors are excluded is a
//! headwater for ordering purposes.
//!
//! Ordering is refused unless the graph passes the cycle check.
//!
//! [`mainstem`]: super::mainstem

use hydronet_core::graph::{EdgeIndex, Graph, NodeId, NodeIndex, StreamOrders};
use hydronet_core::{Algorithm, Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::fmt;
use std::str::FromStr;
use tracing::debug;

use super::cycle::find_cycle;
use super::mainstem::{decompose_mainstems, Mainstem};

/// How a mainstem picks its continuation at a confluence
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MainstemPolicy {
    /// Follow the inflow with the longest upstream path
    #[default]
    Basic,
    /// Follow the inflow carrying the same name, falling back to `Basic`
    Named,
}

impl fmt::Display for MainstemPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MainstemPolicy::Basic => write!(f, "basic"),
            MainstemPolicy::Named => write!(f, "named"),
        }
    }
}

impl FromStr for MainstemPolicy {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "basic" => Ok(MainstemPolicy::Basic),
            "named" => Ok(MainstemPolicy::Named),
            _ => Err(Error::InvalidParameter {
                name: "mainstem_policy",
                value: s.to_string(),
                reason: "expected 'basic' or 'named'".into(),
            }),
        }
    }
}

/// Parameters for stream ordering
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct OrderParams {
    pub policy: MainstemPolicy,
    /// Proceed even when some nodes cannot be reached from a sink.
    /// Edges touching those nodes are left without attributes and do not
    /// feed the edges below them.
    pub accept_unreachable: bool,
}

/// Outcome of a stream ordering run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OrderSummary {
    /// Edges that received attributes
    pub ordered_edges: usize,
    pub mainstems: usize,
    /// Mainstems with Hack order 1
    pub outlets: usize,
}

/// Stream ordering engine
#[derive(Debug, Clone, Default)]
pub struct StreamOrdering;

impl Algorithm for StreamOrdering {
    type Input = Graph;
    type Output = Graph;
    type Params = OrderParams;
    type Error = Error;

    fn name(&self) -> &'static str {
        "Stream Ordering"
    }

    fn description(&self) -> &'static str {
        "Compute Shreve, Strahler, Horton and Hack orders with mainstem decomposition"
    }

    fn execute(&self, mut input: Self::Input, params: Self::Params) -> Result<Self::Output> {
        compute_orders(&mut input, &params)?;
        Ok(input)
    }
}

/// Per-edge values gathered walking downstream
#[derive(Debug, Clone, Copy)]
pub(crate) struct Accumulated {
    pub upstream_length: f64,
    pub total_length: f64,
    pub strahler: u32,
    pub shreve: u64,
}

/// Compute stream orders for every qualifying edge.
///
/// Previously computed attributes are cleared first, so repeated runs give
/// identical results.
///
/// # Errors
/// - [`Error::Cycle`] if the graph contains a cycle
/// - [`Error::Unreachable`] if nodes cannot reach a sink and
///   `accept_unreachable` is false
pub fn compute_orders(graph: &mut Graph, params: &OrderParams) -> Result<OrderSummary> {
    let report = find_cycle(graph);
    report.check(params.accept_unreachable)?;
    Ok(order_checked(graph, params, &report.unreachable))
}

/// Ordering on a graph that already passed the cycle gate.
///
/// `unreachable` lists the nodes the gate found cut off from every sink.
pub(crate) fn order_checked(
    graph: &mut Graph,
    params: &OrderParams,
    unreachable: &[NodeId],
) -> OrderSummary {
    graph.reset_orders();

    let mut drains = vec![true; graph.node_count()];
    for &id in unreachable {
        if let Some(n) = graph.node_index(id) {
            drains[n.index()] = false;
        }
    }

    let topo = topological_nodes(graph);
    let inflows = qualifying_inflows(graph);
    let acc = accumulate(graph, &topo, &inflows, &drains);
    let mainstems = decompose_mainstems(graph, &acc, &inflows, params.policy);

    let summary = OrderSummary {
        ordered_edges: acc.iter().filter(|a| a.is_some()).count(),
        mainstems: mainstems.len(),
        outlets: mainstems.iter().filter(|m| m.hack == 1).count(),
    };
    write_orders(graph, &acc, &mainstems);

    debug!(
        edges = summary.ordered_edges,
        mainstems = summary.mainstems,
        policy = %params.policy,
        "stream orders computed"
    );
    summary
}

/// Nodes in upstream-to-downstream order (Kahn's algorithm).
///
/// Nodes on a cycle never reach in-degree zero and are left out.
pub(crate) fn topological_nodes(graph: &Graph) -> Vec<NodeIndex> {
    let mut remaining: Vec<usize> = graph.node_indices().map(|n| graph.in_degree(n)).collect();
    let mut queue: VecDeque<NodeIndex> = graph
        .node_indices()
        .filter(|n| remaining[n.index()] == 0)
        .collect();
    let mut order = Vec::with_capacity(graph.node_count());

    while let Some(n) = queue.pop_front() {
        order.push(n);
        for &e in graph.outgoing(n) {
            let t = graph.target(e);
            remaining[t.index()] -= 1;
            if remaining[t.index()] == 0 {
                queue.push_back(t);
            }
        }
    }

    order
}

/// For every node, the qualifying edges flowing into it.
pub(crate) fn qualifying_inflows(graph: &Graph) -> Vec<Vec<EdgeIndex>> {
    graph
        .node_indices()
        .map(|n| {
            graph
                .incoming(n)
                .iter()
                .copied()
                .filter(|&e| graph.edge(e).qualifies_for_ordering())
                .collect()
        })
        .collect()
}

/// Bottom-up pass: Shreve, Strahler and upstream length.
///
/// Edges leaving or entering a node with `drains == false` are skipped.
fn accumulate(
    graph: &Graph,
    topo: &[NodeIndex],
    inflows: &[Vec<EdgeIndex>],
    drains: &[bool],
) -> Vec<Option<Accumulated>> {
    let mut acc: Vec<Option<Accumulated>> = vec![None; graph.edge_count()];

    for &n in topo {
        if !drains[n.index()] {
            continue;
        }
        let upstream: Vec<Accumulated> = inflows[n.index()]
            .iter()
            .filter_map(|e| acc[e.index()])
            .collect();

        let (upstream_length, strahler, shreve) = if upstream.is_empty() {
            (0.0, 1, 1)
        } else {
            let longest = upstream
                .iter()
                .map(|a| a.total_length)
                .fold(f64::NEG_INFINITY, f64::max);
            (longest, strahler_of(&upstream), upstream.iter().map(|a| a.shreve).sum())
        };

        for &e in graph.outgoing(n) {
            let edge = graph.edge(e);
            if !edge.qualifies_for_ordering() || !drains[graph.target(e).index()] {
                continue;
            }
            acc[e.index()] = Some(Accumulated {
                upstream_length,
                total_length: upstream_length + edge.length,
                strahler,
                shreve,
            });
        }
    }

    acc
}

/// Highest inflow order, plus one if at least two inflows share it
fn strahler_of(upstream: &[Accumulated]) -> u32 {
    let top = upstream.iter().map(|a| a.strahler).max().unwrap_or(0);
    let count = upstream.iter().filter(|a| a.strahler == top).count();
    if count >= 2 {
        top + 1
    } else {
        top
    }
}

fn write_orders(graph: &mut Graph, acc: &[Option<Accumulated>], mainstems: &[Mainstem]) {
    for m in mainstems {
        let len = m.edges.len() as u32;
        for (i, &e) in m.edges.iter().enumerate() {
            let Some(a) = acc[e.index()] else { continue };
            graph.edge_mut(e).orders = Some(StreamOrders {
                upstream_length: a.upstream_length,
                total_length: a.total_length,
                strahler: a.strahler,
                horton: m.horton,
                hack: m.hack,
                shreve: a.shreve,
                mainstem_id: m.id,
                // `edges` runs mouth first
                mainstem_sequence: len - i as u32,
            });
        }
    }
}
