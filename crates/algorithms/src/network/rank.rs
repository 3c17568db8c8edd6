//! Primary / secondary rank assignment at divergences
//!
//! At every node with more than one outgoing edge, the outflow that turns
//! least relative to the inflows is the natural continuation and becomes
//! PRIMARY; the others become SECONDARY. When the divergence sits inside a
//! waterbody (all outflows are skeleton segments) and a width can be
//! measured for every branch, channel width is blended into the score.
//!
//! SECONDARY rank is then carried downstream along simple chains so that a
//! side branch stays secondary until it reaches a real junction.

use geo::LineString;
use hydronet_core::graph::{EdgeIndex, EdgeType, Graph, NodeIndex, Rank, WaterbodyId};
use hydronet_core::{Algorithm, CoordinateUnits, Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::{debug, warn};

use super::channel_width::{centerline, channel_width, midpoint, trimmed_boundary};
use super::direction::deflection;

/// Parameters for rank assignment
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RankParams {
    /// Weight of the channel-width share against the deflection angle,
    /// in [0, 1]. 0 ranks by angle alone.
    pub channel_weight: f64,
    /// Distance under which a waterbody outline counts as lying on a shared
    /// boundary, in coordinate units.
    pub snap_tolerance: f64,
    /// Largest fraction of a cross-section allowed outside the waterbody.
    /// Default: 0.1
    pub max_outside_fraction: f64,
}

impl RankParams {
    /// Defaults for the given coordinate unit system
    pub fn for_units(units: CoordinateUnits) -> Self {
        match units {
            CoordinateUnits::Meters => Self {
                channel_weight: 0.5,
                snap_tolerance: 0.01,
                max_outside_fraction: 0.1,
            },
            CoordinateUnits::Degrees => Self {
                channel_weight: 0.5,
                snap_tolerance: 1e-7,
                max_outside_fraction: 0.1,
            },
        }
    }

    pub fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.channel_weight) {
            return Err(Error::InvalidParameter {
                name: "channel_weight",
                value: self.channel_weight.to_string(),
                reason: "must be within [0, 1]".into(),
            });
        }
        if !self.snap_tolerance.is_finite() || self.snap_tolerance < 0.0 {
            return Err(Error::InvalidParameter {
                name: "snap_tolerance",
                value: self.snap_tolerance.to_string(),
                reason: "must be finite and >= 0".into(),
            });
        }
        if !(0.0..=1.0).contains(&self.max_outside_fraction) {
            return Err(Error::InvalidParameter {
                name: "max_outside_fraction",
                value: self.max_outside_fraction.to_string(),
                reason: "must be within [0, 1]".into(),
            });
        }
        Ok(())
    }
}

impl Default for RankParams {
    fn default() -> Self {
        Self::for_units(CoordinateUnits::Meters)
    }
}

/// Outcome of a rank assignment run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RankSummary {
    /// Divergence nodes that received a decision
    pub divergences: usize,
    /// Divergences decided with the channel-width blend
    pub width_refined: usize,
    /// Edges left SECONDARY, including propagated ones
    pub secondary_edges: usize,
}

/// Rank assignment engine
#[derive(Debug, Clone, Default)]
pub struct RankAssignment;

impl Algorithm for RankAssignment {
    type Input = Graph;
    type Output = Graph;
    type Params = RankParams;
    type Error = Error;

    fn name(&self) -> &'static str {
        "Rank Assignment"
    }

    fn description(&self) -> &'static str {
        "Mark the natural continuation at each divergence PRIMARY and side branches SECONDARY"
    }

    fn execute(&self, mut input: Self::Input, params: Self::Params) -> Result<Self::Output> {
        assign_ranks(&mut input, &params)?;
        Ok(input)
    }
}

/// Assign PRIMARY/SECONDARY rank to every edge.
///
/// All ranks are reset to PRIMARY first. Decisions for every divergence
/// are computed before any edge is modified, so a structural error leaves
/// the graph with all edges PRIMARY.
///
/// # Errors
/// - [`Error::InvalidParameter`] for out-of-range parameters
/// - [`Error::Structural`] when no outflow of a divergence can be scored
pub fn assign_ranks(graph: &mut Graph, params: &RankParams) -> Result<RankSummary> {
    params.validate()?;
    graph.reset_ranks();

    let mut summary = RankSummary::default();
    let mut boundaries: HashMap<WaterbodyId, Vec<LineString<f64>>> = HashMap::new();
    let mut secondary: Vec<EdgeIndex> = Vec::new();

    let divergences: Vec<NodeIndex> = graph.divergences().collect();
    for node in divergences {
        let decision = decide(graph, node, params, &mut boundaries)?;
        summary.divergences += 1;
        if decision.width_refined {
            summary.width_refined += 1;
        }
        debug!(
            node = %graph.node(node).id(),
            primary = %graph.edge(decision.primary).id(),
            width_refined = decision.width_refined,
            "divergence ranked"
        );
        secondary.extend(
            graph
                .outgoing(node)
                .iter()
                .copied()
                .filter(|&e| e != decision.primary),
        );
    }

    let mut marked = vec![false; graph.edge_count()];
    for &e in &secondary {
        marked[e.index()] = true;
    }
    propagate_secondary(graph, &secondary, &mut marked);

    let demoted: Vec<EdgeIndex> = graph
        .edge_indices()
        .filter(|e| marked[e.index()])
        .collect();
    summary.secondary_edges = demoted.len();
    for e in demoted {
        graph.edge_mut(e).rank = Rank::Secondary;
    }

    Ok(summary)
}

struct Decision {
    primary: EdgeIndex,
    width_refined: bool,
}

fn decide(
    graph: &Graph,
    node: NodeIndex,
    params: &RankParams,
    boundaries: &mut HashMap<WaterbodyId, Vec<LineString<f64>>>,
) -> Result<Decision> {
    let outflows = graph.outgoing(node);
    let inflows: Vec<&LineString<f64>> = graph
        .incoming(node)
        .iter()
        .map(|&i| &graph.edge(i).geometry)
        .collect();

    let deflections: Vec<Option<f64>> = outflows
        .iter()
        .map(|&e| deflection(inflows.iter().copied(), &graph.edge(e).geometry))
        .collect();

    if deflections.iter().all(Option::is_none) {
        return Err(Error::Structural {
            node: graph.node(node).id(),
            reason: if inflows.is_empty() {
                "divergence has no incoming edges to measure deflection against".into()
            } else {
                "no outgoing edge has a computable deflection".into()
            },
        });
    }

    let all_skeleton = outflows
        .iter()
        .all(|&e| graph.edge(e).edge_type == EdgeType::Skeleton);
    let widths = if all_skeleton && params.channel_weight > 0.0 {
        width_shares(graph, outflows, params, boundaries)
    } else {
        None
    };

    let p = params.channel_weight;
    let scores: Vec<Option<f64>> = match &widths {
        // Narrowness share keeps "lowest score wins" for both terms.
        Some(shares) => deflections
            .iter()
            .zip(shares)
            .map(|(d, s)| d.map(|d| d * (1.0 - p) + (1.0 - s) * p))
            .collect(),
        None => deflections,
    };

    let primary = outflows
        .iter()
        .zip(&scores)
        .filter_map(|(&e, s)| s.map(|s| (e, s)))
        .min_by(|a, b| {
            a.1.total_cmp(&b.1)
                .then_with(|| graph.edge(a.0).id().cmp(&graph.edge(b.0).id()))
        })
        .map(|(e, _)| e)
        .ok_or_else(|| Error::Structural {
            node: graph.node(node).id(),
            reason: "no outgoing edge has a computable score".into(),
        })?;

    Ok(Decision {
        primary,
        width_refined: widths.is_some(),
    })
}

/// Width of each outflow's channel as a share of the total, or `None`
/// unless every outflow yields a valid width.
fn width_shares(
    graph: &Graph,
    outflows: &[EdgeIndex],
    params: &RankParams,
    boundaries: &mut HashMap<WaterbodyId, Vec<LineString<f64>>>,
) -> Option<Vec<f64>> {
    let mut widths = Vec::with_capacity(outflows.len());
    for &e in outflows {
        let edge = graph.edge(e);
        let waterbody = edge.waterbody.and_then(|id| graph.waterbody(id))?;
        let boundary = boundaries
            .entry(waterbody.id)
            .or_insert_with(|| trimmed_boundary(waterbody, params.snap_tolerance));
        let at = midpoint(&centerline(graph, e))?;
        match channel_width(waterbody, boundary, at, params.max_outside_fraction) {
            Some(w) => widths.push(w),
            None => {
                warn!(edge = %edge.id(), waterbody = %waterbody.id, "channel width discarded");
                return None;
            }
        }
    }

    let total: f64 = widths.iter().sum();
    if total <= 0.0 {
        return None;
    }
    Some(widths.into_iter().map(|w| w / total).collect())
}

/// Carry SECONDARY rank down simple chains.
///
/// From each secondary edge's head the single outflow is marked while the
/// node has one outflow and either one inflow, or exactly two inflows of
/// which one is a bank segment (a bank-merge junction).
fn propagate_secondary(graph: &Graph, seeds: &[EdgeIndex], marked: &mut [bool]) {
    let mut frontier: Vec<EdgeIndex> = seeds.to_vec();

    while let Some(e) = frontier.pop() {
        let node = graph.target(e);
        if graph.out_degree(node) != 1 || !passes_rank_through(graph, node) {
            continue;
        }
        let next = graph.outgoing(node)[0];
        if marked[next.index()] {
            continue;
        }
        marked[next.index()] = true;
        frontier.push(next);
    }
}

fn passes_rank_through(graph: &Graph, node: NodeIndex) -> bool {
    let incoming = graph.incoming(node);
    match incoming.len() {
        1 => true,
        0 => false,
        _ => {
            let banks = incoming.iter().filter(|&&i| graph.edge(i).is_bank()).count();
            banks == 1 && incoming.len() - banks == 1
        }
    }
}
