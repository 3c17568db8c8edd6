//! Mainstem decomposition, Horton and Hack orders
//!
//! Mainstems are traced from the mouth upwards. At each confluence the
//! continuing branch is picked by [`MainstemPolicy`]; every other inflow
//! becomes the mouth of a tributary mainstem one Hack order higher.
//! Outlets are processed first, then tributaries breadth-first, so
//! mainstem ids grow with Hack order.
//!
//! Ties between equally long branches go to the smaller edge id.

use hydronet_core::graph::{EdgeIndex, Graph};
use std::cmp::Ordering;
use std::collections::VecDeque;

use super::stream_order::{Accumulated, MainstemPolicy};

/// One traced mainstem
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Mainstem {
    pub id: u64,
    /// Member edges, mouth first
    pub edges: Vec<EdgeIndex>,
    /// Strahler order of the mouth edge
    pub horton: u32,
    pub hack: u32,
}

pub(crate) fn decompose_mainstems(
    graph: &Graph,
    acc: &[Option<Accumulated>],
    inflows: &[Vec<EdgeIndex>],
    policy: MainstemPolicy,
) -> Vec<Mainstem> {
    let computed = |e: EdgeIndex| acc[e.index()].is_some();
    let total = |e: EdgeIndex| acc[e.index()].map_or(0.0, |a| a.total_length);

    // Outlets: computed edges with no computed qualifying edge downstream.
    let mut outlets: Vec<EdgeIndex> = graph
        .edge_indices()
        .filter(|&e| computed(e))
        .filter(|&e| {
            !graph
                .outgoing(graph.target(e))
                .iter()
                .any(|&d| computed(d))
        })
        .collect();
    outlets.sort_by(|&a, &b| longer_first(graph, total(a), total(b), a, b));

    let mut assigned = vec![false; graph.edge_count()];
    let mut queue: VecDeque<(EdgeIndex, u32)> = outlets.into_iter().map(|e| (e, 1)).collect();
    let mut mainstems = Vec::new();

    while let Some((mouth, hack)) = queue.pop_front() {
        if assigned[mouth.index()] {
            continue;
        }
        assigned[mouth.index()] = true;

        let mut edges = vec![mouth];
        let mut current = mouth;
        loop {
            let candidates: Vec<EdgeIndex> = inflows[graph.source(current).index()]
                .iter()
                .copied()
                .filter(|&i| computed(i) && !assigned[i.index()])
                .collect();
            let Some(next) = choose_continuation(graph, current, &candidates, &total, policy) else {
                break;
            };
            for &i in &candidates {
                if i != next {
                    queue.push_back((i, hack + 1));
                }
            }
            assigned[next.index()] = true;
            edges.push(next);
            current = next;
        }

        let horton = acc[mouth.index()].map_or(0, |a| a.strahler);
        mainstems.push(Mainstem {
            id: mainstems.len() as u64 + 1,
            edges,
            horton,
            hack,
        });
    }

    mainstems
}

fn choose_continuation(
    graph: &Graph,
    current: EdgeIndex,
    candidates: &[EdgeIndex],
    total: &impl Fn(EdgeIndex) -> f64,
    policy: MainstemPolicy,
) -> Option<EdgeIndex> {
    if policy == MainstemPolicy::Named {
        if let Some(name) = graph.edge(current).name.as_deref() {
            let same_name = candidates
                .iter()
                .copied()
                .filter(|&i| graph.edge(i).name.as_deref() == Some(name));
            if let Some(e) = longest(graph, total, same_name) {
                return Some(e);
            }
        }
    }

    longest(graph, total, candidates.iter().copied())
}

fn longest(
    graph: &Graph,
    total: &impl Fn(EdgeIndex) -> f64,
    pool: impl Iterator<Item = EdgeIndex>,
) -> Option<EdgeIndex> {
    pool.min_by(|&a, &b| longer_first(graph, total(a), total(b), a, b))
}

/// Longer total length sorts first; equal lengths fall back to edge id.
fn longer_first(graph: &Graph, ta: f64, tb: f64, a: EdgeIndex, b: EdgeIndex) -> Ordering {
    tb.total_cmp(&ta)
        .then_with(|| graph.edge(a).id().cmp(&graph.edge(b).id()))
}
