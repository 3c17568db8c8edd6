//! Coordinate unit systems
//!
//! Tolerances and default weights used by the rank engine depend on whether
//! the network geometry is projected (meters) or geographic (degrees).

use crate::error::Error;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Unit system of the network's coordinates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CoordinateUnits {
    #[default]
    Meters,
    Degrees,
}

impl fmt::Display for CoordinateUnits {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CoordinateUnits::Meters => write!(f, "meters"),
            CoordinateUnits::Degrees => write!(f, "degrees"),
        }
    }
}

impl FromStr for CoordinateUnits {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "m" | "meter" | "meters" | "metre" | "metres" => Ok(CoordinateUnits::Meters),
            "deg" | "degree" | "degrees" => Ok(CoordinateUnits::Degrees),
            _ => Err(Error::InvalidParameter {
                name: "units",
                value: s.to_string(),
                reason: "expected 'meters' or 'degrees'".into(),
            }),
        }
    }
}
