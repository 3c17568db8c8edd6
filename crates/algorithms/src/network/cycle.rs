//! Cycle validation
//!
//! Iterative depth-first search walking edges backwards from every sink.
//! A predecessor that is still on the current search path closes a cycle.
//! Nodes never reached from a sink are reported separately: they belong to
//! a sink-less cycle or to a subgraph disconnected from every outlet.
//!
//! Traversal state lives in a side table owned by each run, so concurrent
//! or repeated runs never interfere.

use hydronet_core::graph::{Graph, NodeId, NodeIndex};
use hydronet_core::{Algorithm, Error, Result};
use tracing::warn;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum VisitState {
    Open,
    Working,
    Closed,
}

#[derive(Debug, Clone, Copy)]
enum Step {
    Enter(NodeIndex),
    Exit(NodeIndex),
}

/// Result of a cycle check
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CycleReport {
    /// Node found on a back-edge, if any
    pub cycle: Option<NodeId>,
    /// Nodes not reachable backwards from any sink. Empty when a cycle was
    /// found, since the search stops there.
    pub unreachable: Vec<NodeId>,
}

impl CycleReport {
    /// No back-edge found. Unreachable nodes may still be present.
    pub fn is_acyclic(&self) -> bool {
        self.cycle.is_none()
    }

    /// No cycle and every node reached
    pub fn is_clean(&self) -> bool {
        self.cycle.is_none() && self.unreachable.is_empty()
    }

    /// Turn the report into a gate.
    ///
    /// A cycle is always an error. Unreachable nodes are an error unless the
    /// caller explicitly accepts them, in which case they are logged.
    pub fn check(&self, accept_unreachable: bool) -> Result<()> {
        if let Some(node) = self.cycle {
            return Err(Error::Cycle { node });
        }
        if !self.unreachable.is_empty() {
            if !accept_unreachable {
                return Err(Error::Unreachable {
                    nodes: self.unreachable.clone(),
                });
            }
            warn!(count = self.unreachable.len(), "nodes unreachable from any sink accepted");
        }
        Ok(())
    }
}

/// Cycle check engine
#[derive(Debug, Clone, Default)]
pub struct CycleCheck;

impl Algorithm for CycleCheck {
    type Input = Graph;
    type Output = CycleReport;
    type Params = ();
    type Error = Error;

    fn name(&self) -> &'static str {
        "Cycle Check"
    }

    fn description(&self) -> &'static str {
        "Detect back-edges and nodes unreachable from any sink"
    }

    fn execute(&self, input: Self::Input, _params: Self::Params) -> Result<Self::Output> {
        Ok(find_cycle(&input))
    }
}

/// Search the graph for a cycle.
///
/// Runs in O(nodes + edges) time and O(nodes) space without recursion.
pub fn find_cycle(graph: &Graph) -> CycleReport {
    let mut state = vec![VisitState::Open; graph.node_count()];
    let mut stack: Vec<Step> = graph.sinks().map(Step::Enter).collect();
    // Pop order is the reverse of push order; keep sinks in index order.
    stack.reverse();

    while let Some(step) = stack.pop() {
        match step {
            Step::Enter(n) => {
                if state[n.index()] != VisitState::Open {
                    continue;
                }
                state[n.index()] = VisitState::Working;
                stack.push(Step::Exit(n));
                for &e in graph.incoming(n) {
                    let p = graph.source(e);
                    match state[p.index()] {
                        VisitState::Working => {
                            return CycleReport {
                                cycle: Some(graph.node(p).id()),
                                unreachable: Vec::new(),
                            };
                        }
                        VisitState::Open => stack.push(Step::Enter(p)),
                        VisitState::Closed => {}
                    }
                }
            }
            Step::Exit(n) => state[n.index()] = VisitState::Closed,
        }
    }

    let unreachable = graph
        .node_indices()
        .filter(|n| state[n.index()] != VisitState::Closed)
        .map(|n| graph.node(n).id())
        .collect();

    CycleReport {
        cycle: None,
        unreachable,
    }
}
