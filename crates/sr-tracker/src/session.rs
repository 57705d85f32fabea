//! Per-user route session state and progress records.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use sr_core::{GeoPoint, RouteId, UserId, eta};
use sr_planner::{RouteResponse, Waypoint};

// ── ActiveRoute ───────────────────────────────────────────────────────────────

/// The route a user is currently following.
///
/// Mutated in place as position updates arrive and replaced wholesale when a
/// recalculation is accepted.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ActiveRoute {
    pub route_id: RouteId,
    pub start: GeoPoint,
    pub destination: GeoPoint,
    /// Length of the route in metres when it was adopted.
    pub total_distance_m: f64,
    /// Metres left as of the last position update.
    pub remaining_distance_m: f64,
    /// Index into `waypoints`; never decreases while this route is active.
    pub current_waypoint_index: usize,
    pub waypoints: Vec<Waypoint>,
    pub last_position: Option<GeoPoint>,
    /// Incremented on every replacement.
    pub revision: u64,
    #[serde(skip)]
    announced_waypoint: Option<usize>,
}

impl ActiveRoute {
    /// Start following `route` from `start` towards `destination`.
    pub fn new(route_id: RouteId, start: GeoPoint, destination: GeoPoint, route: &RouteResponse) -> Self {
        Self {
            route_id,
            start,
            destination,
            total_distance_m:       route.total_distance_m,
            remaining_distance_m:   route.total_distance_m,
            current_waypoint_index: 0,
            waypoints:              route.waypoints.clone(),
            last_position:          None,
            revision:               0,
            announced_waypoint:     None,
        }
    }

    /// Adopt `route` as a replacement starting at `position`.  The route id
    /// and destination are kept.
    pub fn replace(&mut self, position: GeoPoint, route: &RouteResponse) {
        let revision = self.revision + 1;
        *self = Self::new(self.route_id.clone(), position, self.destination, route);
        self.last_position = Some(position);
        self.revision = revision;
    }

    /// The first waypoint at or after the current index within `radius_m` of
    /// `position`.
    ///
    /// Moves the current index forward when one is found and returns it if
    /// it has not been reported yet.  A position back near an earlier
    /// waypoint leaves the index where it is.
    pub fn advance_waypoint(&mut self, position: GeoPoint, radius_m: f64) -> Option<usize> {
        let start = self.current_waypoint_index;
        let found = self
            .waypoints
            .iter()
            .enumerate()
            .skip(start)
            .find(|(_, w)| w.position.distance_m(position) <= radius_m)
            .map(|(i, _)| i)?;

        self.current_waypoint_index = found;
        if self.announced_waypoint == Some(found) {
            return None;
        }
        self.announced_waypoint = Some(found);
        Some(found)
    }
}

// ── PositionUpdate ────────────────────────────────────────────────────────────

/// A live position report from a user's device.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PositionUpdate {
    pub user: UserId,
    pub position: GeoPoint,
    /// Reported ground speed; absent or non-positive means "use the cruising
    /// speed".
    #[serde(default)]
    pub speed_kmh: Option<f64>,
}

impl PositionUpdate {
    pub fn new(user: impl Into<UserId>, position: GeoPoint) -> Self {
        Self { user: user.into(), position, speed_kmh: None }
    }

    pub fn with_speed(mut self, speed_kmh: f64) -> Self {
        self.speed_kmh = Some(speed_kmh);
        self
    }
}

// ── RouteProgress ─────────────────────────────────────────────────────────────

/// Progress of a user along their active route.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RouteProgress {
    pub route_id: RouteId,
    pub user: UserId,
    /// Great-circle metres from the route start to the current position.
    pub distance_covered_m: f64,
    /// `total - covered`, never below zero.
    pub distance_remaining_m: f64,
    /// Within `[0, 100]`; a zero-length route counts as complete.
    pub percent_complete: f64,
    pub current_waypoint_index: usize,
    pub eta_remaining: Duration,
}

impl RouteProgress {
    /// Progress at `position`, with the ETA taken at `speed_kmh`.
    pub fn compute(user: &UserId, route: &ActiveRoute, position: GeoPoint, speed_kmh: f64) -> Self {
        let total = route.total_distance_m;
        let covered = route.start.distance_m(position);
        let remaining = (total - covered).max(0.0);
        let percent = if total > 0.0 {
            (covered / total * 100.0).clamp(0.0, 100.0)
        } else {
            100.0
        };

        Self {
            route_id:               route.route_id.clone(),
            user:                   user.clone(),
            distance_covered_m:     covered,
            distance_remaining_m:   remaining,
            percent_complete:       percent,
            current_waypoint_index: route.current_waypoint_index,
            eta_remaining:          eta(remaining, speed_kmh),
        }
    }
}
