//! File loaders for road geometry and traffic reports.
//!
//! # Road GeoJSON
//!
//! A `FeatureCollection` (or a bare array of features).  Only `LineString`
//! and `MultiLineString` geometries are read; positions are `[lon, lat]`.
//!
//! ```json
//! { "type": "FeatureCollection", "features": [
//!   { "type": "Feature",
//!     "geometry": { "type": "LineString",
//!                   "coordinates": [[70.8022, 22.3039], [70.8050, 22.3050]] },
//!     "properties": { "name": "Kalawad Road", "highway": "primary",
//!                     "maxspeed": "50", "lanes": "4" } } ] }
//! ```
//!
//! A `MultiLineString` yields one [`RoadSegment`] per line, all sharing the
//! feature's properties.  A position with fewer than two numbers poisons its
//! line, which the graph builder then drops whole.
//!
//! # Traffic CSV
//!
//! ```csv
//! road_name,level,reported_at,lat,lon
//! Kalawad Road,heavy,1700000000,22.3050,70.8050
//! ```
//!
//! `level` is a [`TrafficLevel`] name or code 1–4; `reported_at` is Unix
//! seconds.  The multiplier follows from the level.

use std::io::Read;
use std::path::{Path, PathBuf};

use log::debug;
use serde::Deserialize;

use sr_core::{GeoPoint, TrafficLevel, TrafficSample};
use sr_graph::RoadSegment;

use crate::source::{RoadSource, TrafficSource, unix_now};
use crate::{SourceError, SourceResult};

// ── GeoJSON records ───────────────────────────────────────────────────────────

#[derive(Deserialize)]
#[serde(untagged)]
enum Document {
    Collection { features: Vec<Feature> },
    Features(Vec<Feature>),
}

#[derive(Deserialize)]
struct Feature {
    geometry:   Option<Geometry>,
    #[serde(default)]
    properties: Option<Properties>,
}

#[derive(Deserialize)]
#[serde(tag = "type")]
enum Geometry {
    LineString { coordinates: Vec<Vec<f64>> },
    MultiLineString { coordinates: Vec<Vec<Vec<f64>>> },
    #[serde(other)]
    Other,
}

#[derive(Deserialize, Default)]
struct Properties {
    name:     Option<String>,
    highway:  Option<String>,
    maxspeed: Option<serde_json::Value>,
    lanes:    Option<serde_json::Value>,
}

/// Read a number that OSM may store as `50`, `"50"` or `"50 mph"`.
fn loose_number(v: &serde_json::Value) -> Option<f64> {
    match v {
        serde_json::Value::Number(n) => n.as_f64(),
        serde_json::Value::String(s) => s.split_whitespace().next()?.parse().ok(),
        _ => None,
    }
}

fn to_point(position: &[f64]) -> GeoPoint {
    match position {
        [lon, lat, ..] => GeoPoint::from_lon_lat(*lon, *lat),
        _ => GeoPoint::new(f64::NAN, f64::NAN),
    }
}

fn to_segment(line: &[Vec<f64>], props: &Properties) -> RoadSegment {
    RoadSegment {
        polyline:      line.iter().map(|p| to_point(p)).collect(),
        name:          props.name.clone(),
        highway:       props.highway.clone(),
        max_speed_kmh: props.maxspeed.as_ref().and_then(loose_number),
        lanes:         props.lanes.as_ref().and_then(loose_number).map(|n| n as u32),
    }
}

// ── Public API: roads ─────────────────────────────────────────────────────────

/// Load road segments from a GeoJSON file.
pub fn load_roads_geojson(path: &Path) -> SourceResult<Vec<RoadSegment>> {
    let file = std::fs::File::open(path)?;
    load_roads_reader(std::io::BufReader::new(file))
}

/// Like [`load_roads_geojson`] but accepts any `Read` source.
pub fn load_roads_reader<R: Read>(reader: R) -> SourceResult<Vec<RoadSegment>> {
    let doc: Document = serde_json::from_reader(reader)?;
    let features = match doc {
        Document::Collection { features } | Document::Features(features) => features,
    };

    let mut segments = Vec::with_capacity(features.len());
    let mut skipped = 0usize;
    for feature in features {
        let props = feature.properties.unwrap_or_default();
        match feature.geometry {
            Some(Geometry::LineString { coordinates }) => {
                segments.push(to_segment(&coordinates, &props));
            }
            Some(Geometry::MultiLineString { coordinates }) => {
                segments.extend(coordinates.iter().map(|line| to_segment(line, &props)));
            }
            Some(Geometry::Other) | None => skipped += 1,
        }
    }
    if skipped > 0 {
        debug!("skipped {skipped} non-line features");
    }
    Ok(segments)
}

/// A [`RoadSource`] that re-reads a GeoJSON file on every request.
#[derive(Clone, Debug)]
pub struct GeoJsonRoads {
    path: PathBuf,
}

impl GeoJsonRoads {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl RoadSource for GeoJsonRoads {
    fn list_road_segments(&self) -> SourceResult<Vec<RoadSegment>> {
        load_roads_geojson(&self.path)
    }
}

// ── Public API: traffic ───────────────────────────────────────────────────────

#[derive(Deserialize)]
struct TrafficRecord {
    road_name:   String,
    level:       String,
    reported_at: i64,
    lat:         f64,
    lon:         f64,
}

/// Load every traffic sample in a CSV file, regardless of age.
pub fn load_traffic_csv(path: &Path) -> SourceResult<Vec<TrafficSample>> {
    let file = std::fs::File::open(path)?;
    load_traffic_reader(file)
}

/// Like [`load_traffic_csv`] but accepts any `Read` source.
pub fn load_traffic_reader<R: Read>(reader: R) -> SourceResult<Vec<TrafficSample>> {
    let mut csv_reader = csv::Reader::from_reader(reader);
    let mut samples = Vec::new();
    for result in csv_reader.deserialize() {
        let rec: TrafficRecord = result?;
        let level = TrafficLevel::parse(&rec.level).ok_or_else(|| {
            SourceError::InvalidRecord(format!(
                "unknown traffic level {:?} for {:?}",
                rec.level, rec.road_name
            ))
        })?;
        samples.push(TrafficSample::from_level(
            rec.road_name,
            level,
            rec.reported_at,
            GeoPoint::new(rec.lat, rec.lon),
        ));
    }
    Ok(samples)
}

/// A [`TrafficSource`] backed by a CSV file, filtered to a trailing window
/// against the system clock.
#[derive(Clone, Debug)]
pub struct CsvTraffic {
    path:        PathBuf,
    window_secs: i64,
}

impl CsvTraffic {
    pub fn new(path: impl Into<PathBuf>, window_secs: i64) -> Self {
        Self { path: path.into(), window_secs }
    }
}

impl TrafficSource for CsvTraffic {
    fn list_current_traffic(&self) -> SourceResult<Vec<TrafficSample>> {
        let now = unix_now();
        let mut samples = load_traffic_csv(&self.path)?;
        samples.retain(|s| s.is_current(now, self.window_secs));
        Ok(samples)
    }
}
