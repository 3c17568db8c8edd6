//! Three-stage network pipeline
//!
//! Rank assignment, then cycle validation, then stream ordering. Each stage
//! completes before the next starts; a failing stage stops the run.

use hydronet_core::graph::Graph;
use hydronet_core::{Algorithm, Error, Result};
use serde::{Deserialize, Serialize};
use tracing::{debug, info_span};

use super::cycle::{find_cycle, CycleReport};
use super::rank::{assign_ranks, RankParams, RankSummary};
use super::stream_order::{order_checked, OrderParams, OrderSummary};

/// Parameters for the full pipeline
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct PipelineParams {
    pub rank: RankParams,
    pub order: OrderParams,
}

impl PipelineParams {
    pub fn validate(&self) -> Result<()> {
        self.rank.validate()
    }
}

/// What each stage reported
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PipelineReport {
    pub rank: RankSummary,
    pub cycle: CycleReport,
    pub order: OrderSummary,
}

/// Full pipeline as an engine
#[derive(Debug, Clone, Default)]
pub struct Pipeline;

impl Algorithm for Pipeline {
    type Input = Graph;
    type Output = Graph;
    type Params = PipelineParams;
    type Error = Error;

    fn name(&self) -> &'static str {
        "Network Pipeline"
    }

    fn description(&self) -> &'static str {
        "Assign ranks, validate acyclicity and compute stream orders"
    }

    fn execute(&self, mut input: Self::Input, params: Self::Params) -> Result<Self::Output> {
        run_pipeline(&mut input, &params)?;
        Ok(input)
    }
}

/// Run rank assignment, cycle validation and stream ordering in order.
///
/// Parameters are validated before anything is touched. Ranks assigned
/// before a later failure are left in place.
pub fn run_pipeline(graph: &mut Graph, params: &PipelineParams) -> Result<PipelineReport> {
    params.validate()?;
    let _span = info_span!(
        "pipeline",
        nodes = graph.node_count(),
        edges = graph.edge_count()
    )
    .entered();

    let rank = assign_ranks(graph, &params.rank)?;
    debug!(divergences = rank.divergences, secondary = rank.secondary_edges, "ranks assigned");

    let cycle = find_cycle(graph);
    cycle.check(params.order.accept_unreachable)?;
    debug!(unreachable = cycle.unreachable.len(), "graph validated");

    let order = order_checked(graph, &params.order, &cycle.unreachable);

    Ok(PipelineReport { rank, cycle, order })
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::LineString;
    use hydronet_core::graph::{Edge, EdgeId, NodeId, Rank};

    fn add(g: &mut Graph, id: u64, from: u64, to: u64, pts: &[(f64, f64)]) {
        g.ensure_node(NodeId(from));
        g.ensure_node(NodeId(to));
        g.add_edge(Edge::new(EdgeId(id), NodeId(from), NodeId(to), LineString::from(pts.to_vec())))
            .unwrap();
    }

    /// Braided reach: splits at node 2 and rejoins at node 4.
    fn braid() -> Graph {
        let mut g = Graph::new();
        add(&mut g, 1, 1, 2, &[(0.0, 0.0), (10.0, 0.0)]);
        add(&mut g, 2, 2, 4, &[(10.0, 0.0), (20.0, 1.0), (30.0, 0.0)]);
        add(&mut g, 3, 2, 3, &[(10.0, 0.0), (15.0, -8.0)]);
        add(&mut g, 4, 3, 4, &[(15.0, -8.0), (30.0, 0.0)]);
        add(&mut g, 5, 4, 5, &[(30.0, 0.0), (40.0, 0.0)]);
        g
    }

    #[test]
    fn test_braid_side_channel_excluded() {
        let mut g = braid();
        let report = run_pipeline(&mut g, &PipelineParams::default()).unwrap();

        assert_eq!(report.rank.divergences, 1);
        assert_eq!(report.rank.secondary_edges, 2);
        assert!(report.cycle.is_clean());

        assert_eq!(g.edge_by_id(EdgeId(3)).unwrap().rank, Rank::Secondary);
        assert_eq!(g.edge_by_id(EdgeId(4)).unwrap().rank, Rank::Secondary);
        assert!(g.edge_by_id(EdgeId(3)).unwrap().orders.is_none());

        // The braid does not inflate magnitude below the rejoin.
        let outlet = g.edge_by_id(EdgeId(5)).unwrap().orders.unwrap();
        assert_eq!(outlet.shreve, 1);
        assert_eq!(outlet.strahler, 1);
        assert_eq!(report.order.mainstems, 1);
    }

    #[test]
    fn test_cycle_stops_before_ordering() {
        let mut g = braid();
        add(&mut g, 6, 5, 1, &[(40.0, 0.0), (0.0, 0.0)]);
        add(&mut g, 7, 5, 6, &[(40.0, 0.0), (50.0, 0.0)]);
        let err = run_pipeline(&mut g, &PipelineParams::default()).unwrap_err();
        assert!(matches!(err, Error::Cycle { .. }));
        assert!(g.edges().all(|e| e.orders.is_none()));
    }

    #[test]
    fn test_engines_through_algorithm_trait() {
        use crate::network::{CycleCheck, RankAssignment, StreamOrdering};

        let ranked = RankAssignment.execute_default(braid()).unwrap();
        assert_eq!(ranked.edge_by_id(EdgeId(3)).unwrap().rank, Rank::Secondary);

        let report = CycleCheck.execute_default(ranked.clone()).unwrap();
        assert!(report.is_clean());

        let ordered = StreamOrdering.execute_default(ranked).unwrap();
        let piped = Pipeline.execute_default(braid()).unwrap();
        for (a, b) in ordered.edges().zip(piped.edges()) {
            assert_eq!(a.orders, b.orders);
        }
        assert_eq!(Pipeline.name(), "Network Pipeline");
    }

    #[test]
    fn test_bad_params_touch_nothing() {
        let mut g = braid();
        g.edge_by_id_mut(EdgeId(3)).unwrap().rank = Rank::Secondary;
        let mut params = PipelineParams::default();
        params.rank.channel_weight = -0.1;
        assert!(run_pipeline(&mut g, &params).is_err());
        assert_eq!(g.edge_by_id(EdgeId(3)).unwrap().rank, Rank::Secondary);
    }
}
