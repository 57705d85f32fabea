//! Route request/response types and the straight-line fallback.

use serde::{Deserialize, Serialize};

use sr_core::{GeoPoint, PlannerConfig};

pub const START_INSTRUCTION: &str = "Start your journey";
pub const HEAD_INSTRUCTION: &str = "Head towards destination";
pub const ARRIVAL_INSTRUCTION: &str = "You have arrived at your destination";

/// Name of the final waypoint of every route.
pub const DESTINATION_WAYPOINT: &str = "Destination";

/// A route query between two arbitrary coordinates.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RouteRequest {
    pub start: GeoPoint,
    pub end: GeoPoint,
    /// Informational.  Routing always uses current traffic weights.
    #[serde(default = "default_avoid_traffic")]
    pub avoid_traffic: bool,
}

fn default_avoid_traffic() -> bool {
    true
}

impl RouteRequest {
    pub fn new(start: GeoPoint, end: GeoPoint) -> Self {
        Self { start, end, avoid_traffic: true }
    }
}

/// A named point along a route, used for arrival detection.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Waypoint {
    pub position: GeoPoint,
    pub name: String,
}

/// A computed route.  Always has at least two path points.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RouteResponse {
    /// Ordered path points from start to end.
    pub path: Vec<GeoPoint>,
    /// Physical length in metres.
    pub total_distance_m: f64,
    /// Travel time in minutes, inflated by traffic.
    pub estimated_time_min: f64,
    pub instructions: Vec<String>,
    /// `true` if any traversed edge carries congestion above the detour
    /// threshold, or if the route was steered around such congestion.
    pub has_traffic_detours: bool,
    /// Start, every change of road, and the destination.
    pub waypoints: Vec<Waypoint>,
    /// `true` for the straight-line degraded route.
    pub is_fallback: bool,
}

impl RouteResponse {
    /// Total distance in kilometres, for API layers that report km.
    #[inline]
    pub fn total_distance_km(&self) -> f64 {
        self.total_distance_m / 1_000.0
    }

    pub fn start(&self) -> Option<GeoPoint> {
        self.path.first().copied()
    }

    pub fn end(&self) -> Option<GeoPoint> {
        self.path.last().copied()
    }
}

/// The degraded-mode route: `config.fallback_segments + 1` points evenly
/// interpolated from `start` to `end`, with great-circle length and the
/// fixed three-line instruction set.
pub fn straight_line_route(start: GeoPoint, end: GeoPoint, config: &PlannerConfig) -> RouteResponse {
    let steps = config.fallback_segments.max(1);
    let path = (0..=steps)
        .map(|i| {
            if i == steps {
                end
            } else {
                start.lerp(end, f64::from(i) / f64::from(steps))
            }
        })
        .collect();

    let distance_m = start.distance_m(end);

    RouteResponse {
        path,
        total_distance_m: distance_m,
        estimated_time_min: config.routing_minutes(distance_m),
        instructions: vec![
            START_INSTRUCTION.to_owned(),
            HEAD_INSTRUCTION.to_owned(),
            ARRIVAL_INSTRUCTION.to_owned(),
        ],
        has_traffic_detours: false,
        waypoints: vec![
            Waypoint { position: start, name: START_INSTRUCTION.to_owned() },
            Waypoint { position: end, name: DESTINATION_WAYPOINT.to_owned() },
        ],
        is_fallback: true,
    }
}
