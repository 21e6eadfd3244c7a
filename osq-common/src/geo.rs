//! Geographic and map-element value types

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::Error;

/// A WGS84 position. Always latitude first.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatLon {
    pub lat: f64,
    pub lon: f64,
}

impl LatLon {
    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }
}

/// Axis-aligned bounding box in degrees
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub min_lat: f64,
    pub min_lon: f64,
    pub max_lat: f64,
    pub max_lon: f64,
}

impl BoundingBox {
    pub fn new(min_lat: f64, min_lon: f64, max_lat: f64, max_lon: f64) -> Self {
        Self {
            min_lat,
            min_lon,
            max_lat,
            max_lon,
        }
    }

    /// Box of `radius` degrees around `center` in every direction.
    /// A radius of 0 yields the degenerate box containing only `center`.
    pub fn around(center: LatLon, radius: f64) -> Self {
        Self::new(
            center.lat - radius,
            center.lon - radius,
            center.lat + radius,
            center.lon + radius,
        )
    }

    /// `left,bottom,right,top` as used by the OSM API and the segment service
    pub fn to_query_param(&self) -> String {
        format!(
            "{},{},{},{}",
            self.min_lon, self.min_lat, self.max_lon, self.max_lat
        )
    }

    pub fn contains(&self, pos: LatLon) -> bool {
        pos.lat >= self.min_lat
            && pos.lat <= self.max_lat
            && pos.lon >= self.min_lon
            && pos.lon <= self.max_lon
    }
}

impl FromStr for BoundingBox {
    type Err = Error;

    /// Parses `min_lat,min_lon,max_lat,max_lon`
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts = s
            .split(',')
            .map(|p| p.trim().parse::<f64>())
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| Error::InvalidInput(format!("bounding box '{}': {}", s, e)))?;

        match parts.as_slice() {
            [min_lat, min_lon, max_lat, max_lon] => {
                if min_lat > max_lat || min_lon > max_lon {
                    return Err(Error::InvalidInput(format!(
                        "bounding box '{}': min must not exceed max",
                        s
                    )));
                }
                Ok(Self::new(*min_lat, *min_lon, *max_lat, *max_lon))
            }
            _ => Err(Error::InvalidInput(format!(
                "bounding box '{}': expected 4 comma separated values",
                s
            ))),
        }
    }
}

/// Kind of OSM map element
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ElementType {
    Node,
    Way,
    Relation,
}

impl ElementType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ElementType::Node => "node",
            ElementType::Way => "way",
            ElementType::Relation => "relation",
        }
    }
}

impl fmt::Display for ElementType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ElementType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "node" => Ok(ElementType::Node),
            "way" => Ok(ElementType::Way),
            "relation" => Ok(ElementType::Relation),
            other => Err(Error::InvalidInput(format!("unknown element type '{}'", other))),
        }
    }
}

/// Reference to a remote map element
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ElementKey {
    pub element_type: ElementType,
    pub id: i64,
}

impl ElementKey {
    pub fn new(element_type: ElementType, id: i64) -> Self {
        Self { element_type, id }
    }
}

impl fmt::Display for ElementKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.element_type, self.id)
    }
}
