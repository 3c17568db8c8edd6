//! Benchmarks for flow network algorithms

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use geo::LineString;
use hydronet_algorithms::network::{
    assign_ranks, compute_orders, find_cycle, run_by_basin, OrderParams, PipelineParams, RankParams,
};
use hydronet_core::graph::{Edge, EdgeId, Graph, NodeId};

/// Full binary drainage tree of the given depth, heads at the top and a
/// single outlet at the bottom. Node `k` drains into node `k / 2`; node 1
/// drains into the sink node 0.
fn create_tree(depth: u32) -> Graph {
    let leaves = 1u64 << depth;
    let mut g = Graph::with_capacity(2 * leaves as usize, 2 * leaves as usize);
    for id in 0..2 * leaves {
        g.add_node(NodeId(id)).unwrap();
    }
    for k in 1..2 * leaves {
        let level = 63 - k.leading_zeros() as u64;
        let x = (k - (1 << level)) as f64;
        let from = (x, level as f64 + 1.0);
        let to = (x / 2.0, level as f64);
        let line = LineString::from(vec![from, to]);
        g.add_edge(Edge::new(EdgeId(k), NodeId(k), NodeId(k / 2), line)).unwrap();
    }
    g
}

/// Binary delta: one inflow splitting repeatedly into distributaries.
fn create_delta(depth: u32) -> Graph {
    let leaves = 1u64 << depth;
    let mut g = Graph::with_capacity(2 * leaves as usize, 2 * leaves as usize);
    for id in 0..2 * leaves {
        g.add_node(NodeId(id)).unwrap();
    }
    for k in 1..2 * leaves {
        let level = 63 - k.leading_zeros() as u64;
        // Even children continue straight, odd children bend away.
        let bend = if k % 2 == 0 { 0.0 } else { 0.8 };
        let from = (level as f64, 0.0);
        let to = (level as f64 + 1.0, bend);
        let line = LineString::from(vec![from, to]);
        g.add_edge(Edge::new(EdgeId(k), NodeId(k / 2), NodeId(k), line)).unwrap();
    }
    g
}

/// Many small independent basins
fn create_forest(basins: u64, depth: u32) -> Graph {
    let tree = create_tree(depth);
    let stride = tree.node_count() as u64;
    let mut g = Graph::with_capacity(
        tree.node_count() * basins as usize,
        tree.edge_count() * basins as usize,
    );
    for b in 0..basins {
        for n in tree.nodes() {
            g.add_node(NodeId(n.id().0 + b * stride)).unwrap();
        }
        for e in tree.edges() {
            let edge = Edge::new(
                EdgeId(e.id().0 + b * stride),
                NodeId(e.from().0 + b * stride),
                NodeId(e.to().0 + b * stride),
                e.geometry.clone(),
            );
            g.add_edge(edge).unwrap();
        }
    }
    g
}

fn bench_assign_ranks(c: &mut Criterion) {
    let mut group = c.benchmark_group("network/assign_ranks");
    for depth in [10, 14, 16] {
        let delta = create_delta(depth);
        group.bench_with_input(BenchmarkId::from_parameter(depth), &depth, |b, _| {
            b.iter_batched(
                || delta.clone(),
                |mut g| assign_ranks(black_box(&mut g), &RankParams::default()).unwrap(),
                criterion::BatchSize::LargeInput,
            )
        });
    }
    group.finish();
}

fn bench_find_cycle(c: &mut Criterion) {
    let mut group = c.benchmark_group("network/find_cycle");
    for depth in [10, 14, 18] {
        let tree = create_tree(depth);
        group.bench_with_input(BenchmarkId::from_parameter(depth), &depth, |b, _| {
            b.iter(|| find_cycle(black_box(&tree)))
        });
    }
    group.finish();
}

fn bench_compute_orders(c: &mut Criterion) {
    let mut group = c.benchmark_group("network/compute_orders");
    for depth in [10, 14, 16] {
        let tree = create_tree(depth);
        group.bench_with_input(BenchmarkId::from_parameter(depth), &depth, |b, _| {
            b.iter_batched(
                || tree.clone(),
                |mut g| compute_orders(black_box(&mut g), &OrderParams::default()).unwrap(),
                criterion::BatchSize::LargeInput,
            )
        });
    }
    group.finish();
}

fn bench_run_by_basin(c: &mut Criterion) {
    let mut group = c.benchmark_group("network/run_by_basin");
    group.sample_size(20);
    for basins in [8, 64] {
        let forest = create_forest(basins, 10);
        group.bench_with_input(BenchmarkId::from_parameter(basins), &basins, |b, _| {
            b.iter_batched(
                || forest.clone(),
                |mut g| run_by_basin(black_box(&mut g), &PipelineParams::default()).unwrap(),
                criterion::BatchSize::LargeInput,
            )
        });
    }
    group.finish();
}

criterion_group!(
    benches,
    bench_assign_ranks,
    bench_find_cycle,
    bench_compute_orders,
    bench_run_by_basin,
);
criterion_main!(benches);
