//! Traffic severity levels and the samples reported by the traffic store.

use crate::GeoPoint;

/// Reported congestion severity.
///
/// The set is closed: the multiplier mapping in [`multiplier`](Self::multiplier)
/// is total and there is no extension point.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum TrafficLevel {
    Light,
    Moderate,
    Heavy,
    /// Effectively impassable.
    Blocked,
}

impl TrafficLevel {
    /// Edge-weight multiplier for this level.
    pub fn multiplier(self) -> f64 {
        match self {
            TrafficLevel::Light    => 1.2,
            TrafficLevel::Moderate => 1.8,
            TrafficLevel::Heavy    => 2.5,
            TrafficLevel::Blocked  => 10.0,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            TrafficLevel::Light    => "light",
            TrafficLevel::Moderate => "moderate",
            TrafficLevel::Heavy    => "heavy",
            TrafficLevel::Blocked  => "blocked",
        }
    }

    /// Parse a level name (case-insensitive) or its numeric code 1–4.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "light"    | "1" => Some(TrafficLevel::Light),
            "moderate" | "2" => Some(TrafficLevel::Moderate),
            "heavy"    | "3" => Some(TrafficLevel::Heavy),
            "blocked"  | "4" => Some(TrafficLevel::Blocked),
            _ => None,
        }
    }
}

impl std::fmt::Display for TrafficLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One traffic report, owned by the traffic collaborator and consumed
/// read-only by the planner.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TrafficSample {
    pub road_name: String,
    pub level: TrafficLevel,
    /// Weight multiplier applied to every edge named `road_name`.
    pub multiplier: f64,
    /// Unix timestamp (seconds) of the report.
    pub reported_at: i64,
    pub position: GeoPoint,
}

impl TrafficSample {
    /// Build a sample whose multiplier follows from `level`.
    pub fn from_level(
        road_name: impl Into<String>,
        level: TrafficLevel,
        reported_at: i64,
        position: GeoPoint,
    ) -> Self {
        Self {
            road_name: road_name.into(),
            level,
            multiplier: level.multiplier(),
            reported_at,
            position,
        }
    }

    /// `true` if the sample was reported strictly after `now - window_secs`.
    #[inline]
    pub fn is_current(&self, now: i64, window_secs: i64) -> bool {
        self.reported_at > now - window_secs
    }
}
