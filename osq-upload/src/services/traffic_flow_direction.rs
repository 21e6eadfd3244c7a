//! Direction of traffic flow along a way
//!
//! Segments describe one permitted travel direction each. Matching their end
//! points to the vertices of the way tells whether traffic flows in the
//! direction of the way's nodes or against it.

use osq_common::LatLon;

use crate::models::TrafficFlowSegment;

/// Maximum Manhattan distance, in degrees, for a segment end to snap to a vertex
pub const MAX_VERTEX_DISTANCE: f64 = 0.00002;

/// Whether traffic along the way with vertices `way_geometry` flows forward.
///
/// `None` when undecidable: no segments, a segment end that matches no vertex,
/// a segment whose ends match the same vertex, or segments that disagree.
pub fn direction_of(way_geometry: &[LatLon], segments: &[TrafficFlowSegment]) -> Option<bool> {
    let mut result: Option<bool> = None;

    for segment in segments {
        let from = closest_vertex(way_geometry, segment.from)?;
        let to = closest_vertex(way_geometry, segment.to)?;
        if from == to {
            return None;
        }

        let forward = from < to;
        match result {
            Some(previous) if previous != forward => return None,
            _ => result = Some(forward),
        }
    }

    result
}

fn closest_vertex(way_geometry: &[LatLon], pos: LatLon) -> Option<usize> {
    way_geometry
        .iter()
        .enumerate()
        .map(|(i, vertex)| (i, manhattan_distance(*vertex, pos)))
        .filter(|(_, distance)| *distance < MAX_VERTEX_DISTANCE)
        .min_by(|a, b| a.1.total_cmp(&b.1))
        .map(|(i, _)| i)
}

fn manhattan_distance(a: LatLon, b: LatLon) -> f64 {
    (a.lat - b.lat).abs() + (a.lon - b.lon).abs()
}
