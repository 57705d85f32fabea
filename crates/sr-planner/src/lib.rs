//! `sr-planner` — route planning over a lazily built, traffic-weighted road
//! graph.
//!
//! # Crate layout
//!
//! | Module       | Contents                                                   |
//! |--------------|------------------------------------------------------------|
//! | [`source`]   | `RoadSource`, `TrafficSource`, in-memory implementations   |
//! | [`loader`]   | GeoJSON road and CSV traffic file loaders and sources      |
//! | [`response`] | `RouteRequest`, `RouteResponse`, `Waypoint`, fallback route |
//! | [`planner`]  | `RoutePlanner`, `PathFinder`                               |
//! | [`error`]    | `SourceError`, `SourceResult<T>`                           |
//!
//! # Degraded mode
//!
//! [`RoutePlanner::find_path`] never fails.  An empty graph, a coordinate
//! that cannot be snapped, or a disconnected destination all produce the
//! straight-line route from [`response::straight_line_route`].  Collaborator
//! failures are logged and treated as "no data".

pub mod error;
pub mod loader;
pub mod planner;
pub mod response;
pub mod source;


pub use error::{SourceError, SourceResult};
pub use loader::{CsvTraffic, GeoJsonRoads, load_roads_geojson, load_traffic_csv};
pub use planner::{PathFinder, RoutePlanner};
pub use response::{RouteRequest, RouteResponse, Waypoint};
pub use source::{InMemoryRoads, InMemoryTraffic, NoTraffic, RoadSource, TrafficSource};
