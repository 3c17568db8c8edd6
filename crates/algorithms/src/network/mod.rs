//! Flow network analysis
//!
//! Algorithms over a directed hydrographic network:
//! - Rank assignment: PRIMARY/SECONDARY flow at divergences, optionally
//!   refined by channel width inside waterbodies
//! - Cycle check: back-edge and reachability validation from the sinks
//! - Stream orders: Shreve, Strahler, upstream length, mainstems, Horton, Hack
//! - Pipeline: the three stages above in sequence, per graph or per basin

mod basins;
pub mod channel_width;
mod cycle;
mod direction;
mod mainstem;
mod pipeline;
mod rank;
mod stream_order;

pub use basins::{run_by_basin, split_basins};
pub use channel_width::{channel_width, trimmed_boundary};
pub use cycle::{find_cycle, CycleCheck, CycleReport};
pub use pipeline::{run_pipeline, Pipeline, PipelineParams, PipelineReport};
pub use rank::{assign_ranks, RankAssignment, RankParams, RankSummary};
pub use stream_order::{compute_orders, MainstemPolicy, OrderParams, OrderSummary, StreamOrdering};
