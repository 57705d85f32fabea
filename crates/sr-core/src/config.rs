//! Planner and tracker configuration.

use crate::geo::DEFAULT_CRUISING_SPEED_KMH;
use crate::{CoreError, CoreResult};

/// Tunables shared by the planner and the tracker.
///
/// Typically loaded from a JSON file by the application crate (requires the
/// `serde` feature) and passed to `RoutePlanner::with_config`.  Missing
/// fields fall back to [`Default`].
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct PlannerConfig {
    /// Average speed used for a route's `estimated_time_min`.  Default: 40.
    pub routing_speed_kmh: f64,

    /// Speed substituted in progress ETAs when the client reports none.
    /// Default: 50.
    pub cruising_speed_kmh: f64,

    /// An edge whose multiplier exceeds this value marks the route as
    /// carrying a traffic detour.  Default: 1.2.
    pub detour_multiplier_threshold: f64,

    /// Interpolation steps of the straight-line fallback route; the route
    /// has `fallback_segments + 1` points.  Default: 10.
    pub fallback_segments: u32,

    /// Distance within which a waypoint counts as reached.  Default: 50 m.
    pub waypoint_radius_m: f64,

    /// Trailing window for "current" traffic samples.  Default: 30 min.
    pub traffic_window_secs: i64,

    /// Tracked users within this distance of a new traffic report are
    /// alerted.  Default: 5 km.
    pub traffic_alert_radius_m: f64,
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            routing_speed_kmh:           40.0,
            cruising_speed_kmh:          DEFAULT_CRUISING_SPEED_KMH,
            detour_multiplier_threshold: 1.2,
            fallback_segments:           10,
            waypoint_radius_m:           50.0,
            traffic_window_secs:         30 * 60,
            traffic_alert_radius_m:      5_000.0,
        }
    }
}

impl PlannerConfig {
    /// Reject values that would make routing arithmetic meaningless.
    pub fn validate(&self) -> CoreResult<()> {
        fn positive(name: &str, v: f64) -> CoreResult<()> {
            if v.is_finite() && v > 0.0 {
                Ok(())
            } else {
                Err(CoreError::Config(format!("{name} must be positive, got {v}")))
            }
        }

        positive("routing_speed_kmh", self.routing_speed_kmh)?;
        positive("cruising_speed_kmh", self.cruising_speed_kmh)?;
        positive("waypoint_radius_m", self.waypoint_radius_m)?;
        positive("traffic_alert_radius_m", self.traffic_alert_radius_m)?;

        if !(self.detour_multiplier_threshold.is_finite() && self.detour_multiplier_threshold >= 0.0) {
            return Err(CoreError::Config(format!(
                "detour_multiplier_threshold must be non-negative, got {}",
                self.detour_multiplier_threshold
            )));
        }
        if self.fallback_segments == 0 {
            return Err(CoreError::Config("fallback_segments must be at least 1".into()));
        }
        if self.traffic_window_secs <= 0 {
            return Err(CoreError::Config(format!(
                "traffic_window_secs must be positive, got {}",
                self.traffic_window_secs
            )));
        }
        Ok(())
    }

    /// Minutes needed to cover `distance_m` at the routing speed.
    #[inline]
    pub fn routing_minutes(&self, distance_m: f64) -> f64 {
        distance_m / 1_000.0 / self.routing_speed_kmh * 60.0
    }
}
