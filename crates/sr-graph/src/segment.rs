//! Road-segment input records.

use sr_core::GeoPoint;

/// Name given to segments that arrive without one.
pub const UNKNOWN_ROAD: &str = "Unknown Road";

/// One named polyline from the road store.
///
/// Consecutive points become a bidirectional edge pair.  Source data is
/// treated as two-way regardless of `highway` class.
#[derive(Clone, Debug, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RoadSegment {
    pub polyline: Vec<GeoPoint>,
    pub name: Option<String>,
    /// OSM `highway` class, e.g. `"primary"`.
    pub highway: Option<String>,
    pub max_speed_kmh: Option<f64>,
    pub lanes: Option<u32>,
}

impl RoadSegment {
    /// A segment with only geometry and a name.
    pub fn new(name: impl Into<String>, polyline: Vec<GeoPoint>) -> Self {
        Self {
            polyline,
            name: Some(name.into()),
            ..Self::default()
        }
    }

    /// The name edges built from this segment carry.
    pub fn road_name(&self) -> &str {
        match self.name.as_deref() {
            Some(n) if !n.trim().is_empty() => n,
            _ => UNKNOWN_ROAD,
        }
    }

    /// `true` if every point is a usable coordinate.
    pub fn is_valid(&self) -> bool {
        self.polyline.iter().all(|p| p.is_valid())
    }
}
