//! # Hydronet Algorithms
//!
//! Flow network algorithms for Hydronet.
//!
//! ## Available Algorithm Categories
//!
//! - **network**: Rank assignment, cycle validation, stream ordering and
//!   the combined pipeline

pub(crate) mod maybe_rayon;
pub mod network;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::network::{
        assign_ranks, compute_orders, find_cycle, run_by_basin, run_pipeline, split_basins,
        CycleCheck, CycleReport, MainstemPolicy, OrderParams, OrderSummary, Pipeline,
        PipelineParams, PipelineReport, RankAssignment, RankParams, RankSummary,
        StreamOrdering,
    };
    pub use hydronet_core::prelude::*;
}
