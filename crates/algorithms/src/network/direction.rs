//! Segment directions and deflection angles
//!
//! Edge geometry runs from the edge's from-node to its to-node. The
//! direction at each end is taken from the first (or last) segment of
//! non-zero length.

use geo::{Coord, LineString};
use std::f64::consts::PI;

/// Below this squared length a segment is treated as degenerate
const MIN_SEGMENT_SQ: f64 = 1e-24;

/// Direction in which the line leaves its first vertex
pub(crate) fn initial_direction(line: &LineString<f64>) -> Option<Coord<f64>> {
    line.0
        .windows(2)
        .map(|w| w[1] - w[0])
        .find(|d| d.x * d.x + d.y * d.y > MIN_SEGMENT_SQ)
}

/// Direction in which the line arrives at its last vertex
pub(crate) fn final_direction(line: &LineString<f64>) -> Option<Coord<f64>> {
    line.0
        .windows(2)
        .rev()
        .map(|w| w[1] - w[0])
        .find(|d| d.x * d.x + d.y * d.y > MIN_SEGMENT_SQ)
}

/// Turning angle between two directions as a fraction of π.
///
/// 0 means the second direction continues the first exactly, 1 means a
/// full reversal.
pub(crate) fn turn_fraction(from: Coord<f64>, to: Coord<f64>) -> f64 {
    let cross = from.x * to.y - from.y * to.x;
    let dot = from.x * to.x + from.y * to.y;
    cross.atan2(dot).abs() / PI
}

/// Largest turn from any inflow into `outflow`.
///
/// Inflows without a usable direction are ignored. Returns `None` when the
/// outflow is degenerate or no inflow has a direction.
pub(crate) fn deflection<'a>(
    inflows: impl IntoIterator<Item = &'a LineString<f64>>,
    outflow: &LineString<f64>,
) -> Option<f64> {
    let out_dir = initial_direction(outflow)?;
    inflows
        .into_iter()
        .filter_map(final_direction)
        .map(|in_dir| turn_fraction(in_dir, out_dir))
        .fold(None, |acc: Option<f64>, t| Some(acc.map_or(t, |a| a.max(t))))
}
