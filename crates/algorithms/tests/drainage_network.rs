//! End-to-end tests on an 18-node drainage network draining to N-18.
//!
//! ```text
//!  N1  N2   N3  N4          N6  N7   N8  N9
//!   \  /     \  /            \  /     \  /
//!   N10       N11             N13      N14
//!     \       /                 \      /
//!       N12        N5             N15
//!         \       /               /
//!           N16                  /
//!             \                 /
//!               N17 -----------
//!                |
//!               N18
//! ```

use geo::LineString;
use hydronet_algorithms::network::{
    compute_orders, find_cycle, run_by_basin, run_pipeline, MainstemPolicy, OrderParams,
    PipelineParams,
};
use hydronet_core::graph::{Edge, EdgeId, Graph, NodeId, StreamOrders};
use hydronet_core::Error;
use std::collections::BTreeSet;

/// (edge, from, to, length)
const EDGES: [(u64, u64, u64, f64); 17] = [
    (4, 1, 10, 5.0),
    (5, 2, 10, 6.0),
    (6, 10, 12, 8.0),
    (1, 3, 11, 2.0),
    (2, 4, 11, 3.0),
    (3, 11, 12, 9.0),
    (7, 12, 16, 1.0),
    (8, 5, 16, 6.0),
    (9, 16, 17, 2.0),
    (10, 6, 13, 8.0),
    (11, 7, 13, 7.0),
    (12, 13, 15, 5.0),
    (13, 8, 14, 1.0),
    (14, 9, 14, 2.0),
    (15, 14, 15, 2.0),
    (16, 15, 17, 3.0),
    (17, 17, 18, 3.0),
];

fn drainage() -> Graph {
    let mut g = Graph::with_capacity(18, EDGES.len());
    for id in 1..=18 {
        g.add_node(NodeId(id)).unwrap();
    }
    for (id, from, to, len) in EDGES {
        let edge = Edge::new(EdgeId(id), NodeId(from), NodeId(to), LineString::new(vec![]));
        g.add_edge(edge.with_length(len)).unwrap();
    }
    g
}

fn orders(g: &Graph, id: u64) -> StreamOrders {
    g.edge_by_id(EdgeId(id))
        .and_then(|e| e.orders)
        .unwrap_or_else(|| panic!("E-{id} has no orders"))
}

/// Edge ids sharing the mainstem of `id`
fn mainstem_of(g: &Graph, id: u64) -> BTreeSet<u64> {
    let target = orders(g, id).mainstem_id;
    g.edges()
        .filter(|e| e.orders.map(|o| o.mainstem_id) == Some(target))
        .map(|e| e.id().0)
        .collect()
}

#[test]
fn test_strahler_orders() {
    let mut g = drainage();
    compute_orders(&mut g, &OrderParams::default()).unwrap();

    for (id, expected) in [(9, 3), (16, 3), (17, 4), (6, 2), (3, 2), (12, 2), (15, 2), (7, 3)] {
        assert_eq!(orders(&g, id).strahler, expected, "strahler of E-{id}");
    }
    for id in [1, 2, 4, 5, 8, 10, 11, 13, 14] {
        assert_eq!(orders(&g, id).strahler, 1, "headwater E-{id}");
    }
}

#[test]
fn test_shreve_magnitudes() {
    let mut g = drainage();
    compute_orders(&mut g, &OrderParams::default()).unwrap();

    for (id, expected) in [(17, 9), (9, 5), (16, 4), (7, 4)] {
        assert_eq!(orders(&g, id).shreve, expected, "shreve of E-{id}");
    }
}

#[test]
fn test_upstream_lengths() {
    let mut g = drainage();
    compute_orders(&mut g, &OrderParams::default()).unwrap();

    for (id, expected) in [(6, 6.0), (7, 14.0), (9, 15.0), (12, 8.0), (16, 13.0), (17, 17.0)] {
        let o = orders(&g, id);
        assert!((o.upstream_length - expected).abs() < 1e-9, "upstream length of E-{id}");
        let len = g.edge_by_id(EdgeId(id)).unwrap().length;
        assert!((o.total_length - (expected + len)).abs() < 1e-9);
    }
}

#[test]
fn test_basic_mainstem() {
    let mut g = drainage();
    compute_orders(&mut g, &OrderParams::default()).unwrap();

    let mainstem = mainstem_of(&g, 17);
    assert_eq!(mainstem, BTreeSet::from([5, 6, 7, 9, 17]));

    // Sequence counts from the head.
    assert_eq!(orders(&g, 5).mainstem_sequence, 1);
    assert_eq!(orders(&g, 17).mainstem_sequence, 5);

    // One outlet, Horton constant along the trunk.
    for id in mainstem {
        let o = orders(&g, id);
        assert_eq!(o.hack, 1);
        assert_eq!(o.horton, 4);
    }
    assert_eq!(orders(&g, 16).hack, 2);
    assert_eq!(orders(&g, 16).horton, 3);
}

#[test]
fn test_named_mainstem() {
    let mut g = drainage();
    for id in [17, 16, 12, 11] {
        g.edge_by_id_mut(EdgeId(id)).unwrap().name = Some("Rio Claro".into());
    }
    let params = OrderParams { policy: MainstemPolicy::Named, ..OrderParams::default() };
    compute_orders(&mut g, &params).unwrap();

    let mainstem = mainstem_of(&g, 17);
    assert_eq!(mainstem, BTreeSet::from([11, 12, 16, 17]));
    assert_eq!(orders(&g, 9).hack, 2);
}

#[test]
fn test_shreve_counts_headwaters() {
    let mut g = drainage();
    compute_orders(&mut g, &OrderParams::default()).unwrap();

    // Walk upstream from every edge and count edges with no inflow.
    for edge in g.edges() {
        let mut stack = vec![g.node_index(edge.from()).unwrap()];
        let mut heads = 0;
        if g.incoming(stack[0]).is_empty() {
            heads = 1;
        }
        while let Some(n) = stack.pop() {
            for &e in g.incoming(n) {
                let src = g.source(e);
                if g.incoming(src).is_empty() {
                    heads += 1;
                } else {
                    stack.push(src);
                }
            }
        }
        assert_eq!(edge.orders.unwrap().shreve, heads, "shreve of {}", edge.id());
    }
}

#[test]
fn test_rerun_is_identical() {
    let mut g = drainage();
    run_pipeline(&mut g, &PipelineParams::default()).unwrap();
    let first: Vec<_> = g.edges().map(|e| (e.rank, e.orders)).collect();

    run_pipeline(&mut g, &PipelineParams::default()).unwrap();
    let second: Vec<_> = g.edges().map(|e| (e.rank, e.orders)).collect();
    assert_eq!(first, second);
}

#[test]
fn test_by_basin_matches_single_run() {
    let mut whole = drainage();
    run_pipeline(&mut whole, &PipelineParams::default()).unwrap();

    let mut split = drainage();
    let reports = run_by_basin(&mut split, &PipelineParams::default()).unwrap();
    assert_eq!(reports.len(), 1);

    let a: Vec<_> = whole.edges().map(|e| e.orders).collect();
    let b: Vec<_> = split.edges().map(|e| e.orders).collect();
    assert_eq!(a, b);
}

#[test]
fn test_json_round_trip_keeps_verdict() {
    let mut g = drainage();
    run_pipeline(&mut g, &PipelineParams::default()).unwrap();

    let json = serde_json::to_string(&g).unwrap();
    let restored: Graph = serde_json::from_str(&json).unwrap();

    assert_eq!(restored.node_count(), g.node_count());
    assert_eq!(restored.edge_count(), g.edge_count());
    assert_eq!(find_cycle(&restored), find_cycle(&g));

    let a: Vec<_> = g.edges().map(|e| e.orders).collect();
    let b: Vec<_> = restored.edges().map(|e| e.orders).collect();
    assert_eq!(a, b);
}

#[test]
fn test_json_with_cycle_is_rejected() {
    let mut g = drainage();
    g.add_edge(
        Edge::new(EdgeId(18), NodeId(17), NodeId(12), LineString::new(vec![])).with_length(1.0),
    )
    .unwrap();

    let json = serde_json::to_string(&g).unwrap();
    let mut restored: Graph = serde_json::from_str(&json).unwrap();
    assert!(find_cycle(&restored).cycle.is_some());
    assert!(matches!(
        compute_orders(&mut restored, &OrderParams::default()),
        Err(Error::Cycle { .. })
    ));
}
