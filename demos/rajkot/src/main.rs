//! rajkot — smallest end-to-end run of the smart_route workspace.
//!
//! Plans a trip across a sample road network around Rajkot, tracks a rider
//! along it, reports a blockage ahead of them, and prints the route as JSON.
//!
//! ```text
//! rajkot [CONFIG.json] [ROADS.geojson]
//! ```
//!
//! Without arguments the default configuration and the built-in road list
//! are used.  Set `RUST_LOG=debug` for routing details.

mod network;

use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use anyhow::{Context, Result};
use log::info;
use tracing_subscriber::EnvFilter;

use sr_core::{GeoPoint, PlannerConfig, RouteId, TrafficLevel, TrafficSample, UserId};
use sr_planner::source::unix_now;
use sr_planner::{
    GeoJsonRoads, InMemoryRoads, InMemoryTraffic, RoadSource, RouteRequest, RouteResponse,
    RoutePlanner, Waypoint,
};
use sr_tracker::{ActiveRouteTracker, PositionUpdate, RouteObserver, RouteProgress};

use network::rajkot_roads;

// ── Constants ─────────────────────────────────────────────────────────────────

/// Kalawad Road, western end.
const TRIP_START: GeoPoint = GeoPoint { lat: 22.3039, lon: 70.8022 };
/// University Road, eastern end.
const TRIP_END:   GeoPoint = GeoPoint { lat: 22.3125, lon: 70.8200 };

const RIDER_SPEED_KMH: f64 = 30.0;
/// Path point at which the blockage is reported.
const REPORT_AT_STEP:  usize = 2;

// ── Console observer ──────────────────────────────────────────────────────────

struct ConsoleObserver;

impl RouteObserver for ConsoleObserver {
    fn on_tracking_started(&self, user: &UserId, route_id: &RouteId) {
        println!("[{user}] tracking started on {route_id}");
    }

    fn on_tracking_stopped(&self, user: &UserId) {
        println!("[{user}] tracking stopped");
    }

    fn on_route_recalculated(&self, user: &UserId, reason: &str, route: &RouteResponse) {
        println!(
            "[{user}] route recalculated ({reason}): {:.2} km, {:.1} min",
            route.total_distance_km(),
            route.estimated_time_min
        );
    }

    fn on_route_progress(&self, user: &UserId, p: &RouteProgress) {
        println!(
            "[{user}] {:>5.1}%  covered {:>6.0} m  left {:>6.0} m  eta {:>4} s  waypoint {}",
            p.percent_complete,
            p.distance_covered_m,
            p.distance_remaining_m,
            p.eta_remaining.as_secs(),
            p.current_waypoint_index
        );
    }

    fn on_waypoint_reached(&self, user: &UserId, index: usize, waypoint: &Waypoint, next: Option<&Waypoint>) {
        let next = next.map_or("-", |w| w.name.as_str());
        println!("[{user}] reached waypoint {index} ({}), next: {next}", waypoint.name);
    }

    fn on_traffic_alert(&self, user: &UserId, sample: &TrafficSample) {
        println!("[{user}] traffic alert: {} on {}", sample.level, sample.road_name);
    }
}

// ── Setup ─────────────────────────────────────────────────────────────────────

fn load_config(path: Option<&str>) -> Result<PlannerConfig> {
    let Some(path) = path else {
        return Ok(PlannerConfig::default());
    };
    let text = std::fs::read_to_string(path).with_context(|| format!("reading {path}"))?;
    let config: PlannerConfig = serde_json::from_str(&text).with_context(|| format!("parsing {path}"))?;
    config.validate()?;
    Ok(config)
}

fn road_source(path: Option<&str>) -> Arc<dyn RoadSource> {
    match path {
        Some(p) => Arc::new(GeoJsonRoads::new(Path::new(p))),
        None => Arc::new(InMemoryRoads::new(rajkot_roads())),
    }
}

fn print_route(route: &RouteResponse) {
    println!(
        "Route: {:.2} km, {:.1} min, {} points{}{}",
        route.total_distance_km(),
        route.estimated_time_min,
        route.path.len(),
        if route.has_traffic_detours { ", traffic detour" } else { "" },
        if route.is_fallback { ", straight line" } else { "" },
    );
    for (i, line) in route.instructions.iter().enumerate() {
        println!("  {:>2}. {line}", i + 1);
    }
}

// ── main ──────────────────────────────────────────────────────────────────────

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let config = load_config(args.first().map(String::as_str))?;

    println!("=== rajkot — smart_route demo ===");
    println!();

    // 1. Planner over roads and an in-memory traffic store.
    let traffic = Arc::new(InMemoryTraffic::new(config.traffic_window_secs));
    let planner = Arc::new(
        RoutePlanner::new(road_source(args.get(1).map(String::as_str)), Arc::clone(&traffic))
            .with_config(config.clone())?,
    );

    let t0 = Instant::now();
    let graph = planner.ensure_graph();
    println!(
        "Road graph: {} nodes, {} edges, {} roads ({:.1} ms)",
        graph.node_count(),
        graph.edge_count(),
        graph.road_count(),
        t0.elapsed().as_secs_f64() * 1e3
    );

    // 2. Plan the trip.
    let route = planner.find_path(&RouteRequest::new(TRIP_START, TRIP_END));
    print_route(&route);
    println!();

    // 3. Track a rider along the planned path.
    let tracker = ActiveRouteTracker::with_observer(Arc::clone(&planner), ConsoleObserver, config);
    let rider = UserId::new("rider-1");
    let route_id = RouteId::new("trip-1");
    tracker.start_tracking(rider.clone(), route_id.clone(), TRIP_START, TRIP_END, &route);

    let mut traffic_ahead = false;
    for (step, &position) in route.path.iter().enumerate() {
        let update = PositionUpdate::new(rider.clone(), position).with_speed(RIDER_SPEED_KMH);
        tracker.handle_position_update(&update, traffic_ahead)?;
        traffic_ahead = false;

        if step == REPORT_AT_STEP {
            // Block the road the rider is on.
            let active = tracker.active_route(&rider)?;
            let blocked = active
                .waypoints
                .get(active.current_waypoint_index)
                .map_or_else(|| "Kalawad Road".to_owned(), |w| w.name.clone());
            let sample = TrafficSample::from_level(blocked, TrafficLevel::Blocked, unix_now(), position);
            traffic.report(sample.clone());
            let alerted = tracker.report_traffic(&sample);
            info!("blockage reported, {} riders alerted", alerted.len());
            traffic_ahead = true;
        }
    }
    println!();

    // 4. Final state.
    let active = tracker.stop_tracking(&rider)?;
    println!("Final route revision: {}", active.revision);
    println!("Waypoints of {route_id}:");
    println!("{}", serde_json::to_string_pretty(&tracker.route_waypoints(&route_id)?)?);

    Ok(())
}
