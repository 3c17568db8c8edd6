//! # Hydronet Core
//!
//! Core types, traits and errors for the hydronet flow-network library.
//!
//! This crate provides:
//! - `Graph`: the directed flow network (nodes, edges, waterbodies)
//! - `Edge` attributes: type, rank and computed stream orders
//! - `CoordinateUnits`: unit system used to pick default tolerances
//! - Algorithm trait for a consistent engine API

pub mod error;
pub mod graph;
pub mod units;

pub use error::{Error, Result};
pub use graph::{
    Edge, EdgeId, EdgeIndex, EdgeType, Graph, Node, NodeId, NodeIndex, Rank, StreamOrders,
    Waterbody, WaterbodyId,
};
pub use units::CoordinateUnits;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::error::{Error, Result};
    pub use crate::graph::{Edge, EdgeId, EdgeType, Graph, NodeId, Rank, StreamOrders};
    pub use crate::units::CoordinateUnits;
    pub use crate::Algorithm;
}

/// Core trait for all network engines.
///
/// Engines consume a graph, annotate it in place and hand it back.
pub trait Algorithm {
    /// Input type for the algorithm
    type Input;
    /// Output type for the algorithm
    type Output;
    /// Parameters controlling algorithm behavior
    type Params: Default;
    /// Error type for algorithm execution
    type Error: std::error::Error;

    /// Returns the algorithm name
    fn name(&self) -> &'static str;

    /// Returns a description of what the algorithm does
    fn description(&self) -> &'static str;

    /// Execute the algorithm
    fn execute(
        &self,
        input: Self::Input,
        params: Self::Params,
    ) -> std::result::Result<Self::Output, Self::Error>;

    /// Execute with default parameters
    fn execute_default(
        &self,
        input: Self::Input,
    ) -> std::result::Result<Self::Output, Self::Error> {
        self.execute(input, Self::Params::default())
    }
}
