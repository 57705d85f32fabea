//! Geographic coordinate type and geodesic helpers.
//!
//! `GeoPoint` uses `f64` latitude/longitude.  Node deduplication rounds to
//! six decimal digits (~0.1 m), which single precision cannot represent at
//! longitudes above ~16°.
//!
//! Every distance in the workspace is in **metres**.  [`distance_km`] exists
//! only for response boundaries that report kilometres.

use std::fmt;
use std::time::Duration;

use crate::{CoreError, CoreResult};

/// Mean Earth radius used by the haversine formula, metres.
pub const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// Cruising speed substituted when no usable speed is reported.
pub const DEFAULT_CRUISING_SPEED_KMH: f64 = 50.0;

/// Number of decimal digits kept by [`NodeKey`].
pub const NODE_KEY_DECIMALS: u32 = 6;

const NODE_KEY_SCALE: f64 = 1_000_000.0;

/// A WGS-84 geographic coordinate.
#[derive(Copy, Clone, Debug, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GeoPoint {
    pub lat: f64,
    pub lon: f64,
}

impl GeoPoint {
    #[inline]
    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }

    /// Build a point from a GeoJSON-ordered `[lon, lat]` position.
    #[inline]
    pub fn from_lon_lat(lon: f64, lat: f64) -> Self {
        Self { lat, lon }
    }

    /// Like [`new`](Self::new) but rejects non-finite or out-of-range input.
    pub fn checked(lat: f64, lon: f64) -> CoreResult<Self> {
        let p = Self { lat, lon };
        if p.is_valid() {
            Ok(p)
        } else {
            Err(CoreError::InvalidCoordinate { lat, lon })
        }
    }

    /// `true` if both components are finite and inside WGS-84 bounds.
    #[inline]
    pub fn is_valid(self) -> bool {
        self.lat.is_finite()
            && self.lon.is_finite()
            && (-90.0..=90.0).contains(&self.lat)
            && (-180.0..=180.0).contains(&self.lon)
    }

    /// Haversine great-circle distance in metres.
    ///
    /// Identical points return exactly `0.0`.  Antipodal inputs are not
    /// special-cased.
    pub fn distance_m(self, other: GeoPoint) -> f64 {
        if self == other {
            return 0.0;
        }

        let d_lat = (other.lat - self.lat).to_radians();
        let d_lon = (other.lon - self.lon).to_radians();

        let lat1 = self.lat.to_radians();
        let lat2 = other.lat.to_radians();

        let a = (d_lat * 0.5).sin().powi(2)
            + lat1.cos() * lat2.cos() * (d_lon * 0.5).sin().powi(2);

        let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());
        EARTH_RADIUS_M * c
    }

    /// Linear interpolation in coordinate space; `ratio` 0 → `self`,
    /// 1 → `other`.
    #[inline]
    pub fn lerp(self, other: GeoPoint, ratio: f64) -> GeoPoint {
        GeoPoint {
            lat: self.lat + (other.lat - self.lat) * ratio,
            lon: self.lon + (other.lon - self.lon) * ratio,
        }
    }

    /// Canonical deduplication key for this coordinate.
    #[inline]
    pub fn node_key(self) -> NodeKey {
        NodeKey::from_point(self)
    }

    /// Position on the unit sphere.  Euclidean (chord) distance between two
    /// such vectors is monotonic in great-circle distance, so a 3-D
    /// nearest-neighbour search returns the haversine-nearest point.
    pub fn to_unit_vector(self) -> [f64; 3] {
        let lat = self.lat.to_radians();
        let lon = self.lon.to_radians();
        [lat.cos() * lon.cos(), lat.cos() * lon.sin(), lat.sin()]
    }
}

impl fmt::Display for GeoPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({:.6}, {:.6})", self.lat, self.lon)
    }
}

/// Haversine distance in kilometres.
#[inline]
pub fn distance_km(a: GeoPoint, b: GeoPoint) -> f64 {
    a.distance_m(b) / 1_000.0
}

/// Time needed to cover `distance_m` at `speed_kmh`.
///
/// Non-positive or non-finite speeds fall back to
/// [`DEFAULT_CRUISING_SPEED_KMH`]; negative distances yield zero.  A time
/// too large for `Duration` saturates at [`Duration::MAX`].
pub fn eta(distance_m: f64, speed_kmh: f64) -> Duration {
    let speed_kmh = if speed_kmh.is_finite() && speed_kmh > 0.0 {
        speed_kmh
    } else {
        DEFAULT_CRUISING_SPEED_KMH
    };
    let speed_mps = speed_kmh / 3.6;
    let secs = distance_m.max(0.0) / speed_mps;
    // Crawling speeds can exceed the representable range.
    Duration::try_from_secs_f64(secs).unwrap_or(Duration::MAX)
}

// ── NodeKey ───────────────────────────────────────────────────────────────────

/// Coordinate rounded to [`NODE_KEY_DECIMALS`] digits, stored as integer
/// micro-degrees so `-0.0000001` and `0.0000001` share a key.
///
/// `Display` renders the canonical `"lat,lon"` string form.
#[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct NodeKey {
    pub lat_e6: i64,
    pub lon_e6: i64,
}

impl NodeKey {
    pub fn from_point(p: GeoPoint) -> Self {
        Self {
            lat_e6: (p.lat * NODE_KEY_SCALE).round() as i64,
            lon_e6: (p.lon * NODE_KEY_SCALE).round() as i64,
        }
    }

    /// The rounded coordinate this key stands for.
    pub fn to_point(self) -> GeoPoint {
        GeoPoint {
            lat: self.lat_e6 as f64 / NODE_KEY_SCALE,
            lon: self.lon_e6 as f64 / NODE_KEY_SCALE,
        }
    }
}

impl fmt::Display for NodeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn part(f: &mut fmt::Formatter<'_>, v: i64) -> fmt::Result {
            let sign = if v < 0 { "-" } else { "" };
            let abs = v.unsigned_abs();
            write!(f, "{sign}{}.{:06}", abs / 1_000_000, abs % 1_000_000)
        }
        part(f, self.lat_e6)?;
        f.write_str(",")?;
        part(f, self.lon_e6)
    }
}
