//! Sample road network around Rajkot, Gujarat.
//!
//! Eight named roads in OSM style.  Shared coordinates become junctions when
//! the graph is built.

use sr_core::GeoPoint;
use sr_graph::RoadSegment;

fn road(name: &str, highway: &str, max_speed_kmh: f64, lanes: u32, lon_lat: &[(f64, f64)]) -> RoadSegment {
    RoadSegment {
        polyline:      lon_lat.iter().map(|&(lon, lat)| GeoPoint::from_lon_lat(lon, lat)).collect(),
        name:          Some(name.to_owned()),
        highway:       Some(highway.to_owned()),
        max_speed_kmh: Some(max_speed_kmh),
        lanes:         Some(lanes),
    }
}

/// The full sample road list, positions in GeoJSON `(lon, lat)` order.
pub fn rajkot_roads() -> Vec<RoadSegment> {
    vec![
        road("Kalawad Road", "primary", 60.0, 4, &[
            (70.8022, 22.3039), (70.8050, 22.3050), (70.8080, 22.3065),
            (70.8110, 22.3080), (70.8140, 22.3095), (70.8170, 22.3110),
        ]),
        road("150 Feet Ring Road", "primary", 60.0, 6, &[
            (70.8022, 22.3039), (70.8000, 22.3060), (70.7980, 22.3080),
            (70.7960, 22.3100), (70.7940, 22.3120), (70.7920, 22.3140),
        ]),
        road("Connector Road 1", "secondary", 40.0, 2, &[
            (70.8110, 22.3080), (70.8090, 22.3100), (70.8070, 22.3120), (70.8050, 22.3140),
        ]),
        road("Connector Road 2", "secondary", 40.0, 2, &[
            (70.8050, 22.3050), (70.8040, 22.3070), (70.8030, 22.3090),
            (70.8020, 22.3110), (70.8010, 22.3130),
        ]),
        road("University Road", "tertiary", 50.0, 2, &[
            (70.8140, 22.3095), (70.8160, 22.3105), (70.8180, 22.3115), (70.8200, 22.3125),
        ]),
        road("Yagnik Road", "secondary", 50.0, 2, &[
            (70.7940, 22.3120), (70.7970, 22.3130), (70.8000, 22.3140), (70.8030, 22.3150),
        ]),
        road("Cross Road", "tertiary", 40.0, 2, &[
            (70.7960, 22.3100), (70.8000, 22.3100), (70.8040, 22.3100),
            (70.8080, 22.3100), (70.8120, 22.3100),
        ]),
        road("North-South Road", "tertiary", 40.0, 2, &[
            (70.8080, 22.3065), (70.8080, 22.3085), (70.8080, 22.3105), (70.8080, 22.3125),
        ]),
    ]
}
