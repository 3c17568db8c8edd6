//! Drainage basin decomposition
//!
//! Independent basins (weakly connected components) share no edges, so the
//! pipeline can run on each one separately and in parallel. Results are
//! written back into the original graph; mainstem ids are renumbered so
//! they stay unique across basins.

use hydronet_core::graph::{Graph, NodeIndex};
use hydronet_core::Result;
use std::collections::BTreeSet;
use tracing::debug;

use super::pipeline::{run_pipeline, PipelineParams, PipelineReport};
use crate::maybe_rayon::*;

/// Split a graph into its weakly connected components.
///
/// Basins are ordered by their first node in the original graph. Each
/// basin keeps the original node and edge order, edge attributes, and the
/// waterbodies its edges reference.
pub fn split_basins(graph: &Graph) -> Result<Vec<Graph>> {
    let labels = component_labels(graph);
    let count = labels.iter().copied().max().map_or(0, |m| m + 1);

    let mut members: Vec<Vec<NodeIndex>> = vec![Vec::new(); count];
    for n in graph.node_indices() {
        members[labels[n.index()]].push(n);
    }
    let mut edges_of: Vec<Vec<_>> = vec![Vec::new(); count];
    for e in graph.edge_indices() {
        edges_of[labels[graph.source(e).index()]].push(e);
    }

    members
        .into_iter()
        .zip(edges_of)
        .map(|(nodes, edges)| {
            let mut basin = Graph::with_capacity(nodes.len(), edges.len());
            for n in nodes {
                basin.ensure_node(graph.node(n).id());
            }
            let mut waterbodies = BTreeSet::new();
            for e in edges {
                let edge = graph.edge(e).clone();
                if let Some(wb) = edge.waterbody {
                    waterbodies.insert(wb);
                }
                basin.add_edge(edge)?;
            }
            for wb in waterbodies {
                if let Some(w) = graph.waterbody(wb) {
                    basin.add_waterbody(w.clone());
                }
            }
            Ok(basin)
        })
        .collect()
}

/// Label each node with its component number, numbered in order of each
/// component's first node.
fn component_labels(graph: &Graph) -> Vec<usize> {
    let mut parent: Vec<usize> = (0..graph.node_count()).collect();

    fn find(parent: &mut [usize], mut x: usize) -> usize {
        while parent[x] != x {
            parent[x] = parent[parent[x]];
            x = parent[x];
        }
        x
    }

    for e in graph.edge_indices() {
        let a = find(&mut parent, graph.source(e).index());
        let b = find(&mut parent, graph.target(e).index());
        if a != b {
            parent[a.max(b)] = a.min(b);
        }
    }

    let mut label_of_root = vec![usize::MAX; parent.len()];
    let mut next = 0;
    (0..parent.len())
        .map(|n| {
            let root = find(&mut parent, n);
            if label_of_root[root] == usize::MAX {
                label_of_root[root] = next;
                next += 1;
            }
            label_of_root[root]
        })
        .collect()
}

/// Run the pipeline on each basin independently and merge the results.
///
/// Fails with the first error in basin order. Nothing is written back
/// unless every basin succeeds.
pub fn run_by_basin(graph: &mut Graph, params: &PipelineParams) -> Result<Vec<PipelineReport>> {
    params.validate()?;
    let basins = split_basins(graph)?;
    debug!(basins = basins.len(), "running pipeline per basin");

    let results: Vec<Result<(Graph, PipelineReport)>> = basins
        .into_par_iter()
        .map(|mut basin| -> Result<(Graph, PipelineReport)> {
            let report = run_pipeline(&mut basin, params)?;
            Ok((basin, report))
        })
        .collect();

    let done = results.into_iter().collect::<Result<Vec<_>>>()?;

    let mut offset = 0u64;
    let mut reports = Vec::with_capacity(done.len());
    for (basin, report) in done {
        for edge in basin.edges() {
            let Some(ix) = graph.edge_index(edge.id()) else { continue };
            let target = graph.edge_mut(ix);
            target.rank = edge.rank;
            target.orders = edge.orders.map(|mut o| {
                o.mainstem_id += offset;
                o
            });
        }
        offset += report.order.mainstems as u64;
        reports.push(report);
    }

    Ok(reports)
}
