//! Directed traffic-flow segments of one-way roads

use osq_common::LatLon;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// One permitted direction of travel along part of a way
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrafficFlowSegment {
    pub from: LatLon,
    pub to: LatLon,
}

impl TrafficFlowSegment {
    pub fn new(from: LatLon, to: LatLon) -> Self {
        Self { from, to }
    }
}

/// Segments grouped by owning way id, each list in arrival order
pub type WaySegments = HashMap<i64, Vec<TrafficFlowSegment>>;
