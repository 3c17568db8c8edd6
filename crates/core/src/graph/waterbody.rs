//! Waterbody polygons crossed by synthetic skeleton/bank segments

use geo_types::{MultiLineString, Polygon};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WaterbodyId(pub u64);

impl fmt::Display for WaterbodyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "W-{}", self.0)
    }
}

impl From<u64> for WaterbodyId {
    fn from(v: u64) -> Self {
        WaterbodyId(v)
    }
}

/// A waterbody outline.
///
/// `shared_boundary` holds the parts of the outline that coincide with a
/// neighbouring waterbody or a coastline. Those parts are not real banks
/// and are trimmed away before channel widths are measured.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Waterbody {
    pub id: WaterbodyId,
    pub polygon: Polygon<f64>,
    #[serde(default = "empty_lines")]
    pub shared_boundary: MultiLineString<f64>,
}

fn empty_lines() -> MultiLineString<f64> {
    MultiLineString::new(vec![])
}

impl Waterbody {
    pub fn new(id: WaterbodyId, polygon: Polygon<f64>) -> Self {
        Self {
            id,
            polygon,
            shared_boundary: empty_lines(),
        }
    }

    pub fn with_shared_boundary(mut self, shared: MultiLineString<f64>) -> Self {
        self.shared_boundary = shared;
        self
    }
}
