//! The route planner: lazy graph lifecycle, traffic refresh, snapping, and
//! response assembly.
//!
//! # Graph lifecycle
//!
//! ```text
//! Unbuilt ──ensure_graph──▶ Building ──build done──▶ Ready(Arc<RoadGraph>)
//!    ▲                         │                           │
//!    └──── source error ◀──────┘                           │
//!    └──────────────────── invalidate_graph ◀──────────────┘
//! ```
//!
//! The state sits behind one `Mutex`.  The first caller to find `Unbuilt`
//! flips it to `Building` and builds with the lock released; every other
//! caller waits on a `Condvar` until `Ready`.  At most one build runs at a
//! time.  `ensure_graph` is the only way to trigger a build.  A graph
//! invalidated while `Building` goes back to `Unbuilt` when the build ends.

use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};

use log::{debug, info, trace, warn};

use sr_core::{CoreResult, GeoPoint, NodeId, PlannerConfig};
use sr_graph::{DijkstraRouter, GraphPath, RoadGraph, Router, Weighting};

use crate::response::{
    ARRIVAL_INSTRUCTION, DESTINATION_WAYPOINT, START_INSTRUCTION, straight_line_route,
};
use crate::source::{RoadSource, TrafficSource};
use crate::{RouteRequest, RouteResponse, Waypoint};

// ── PathFinder ────────────────────────────────────────────────────────────────

/// Anything that turns a [`RouteRequest`] into a usable [`RouteResponse`].
///
/// The tracker depends on this seam rather than on [`RoutePlanner`] itself.
pub trait PathFinder: Send + Sync {
    /// Must always return a route with at least two path points.
    fn find_path(&self, request: &RouteRequest) -> RouteResponse;
}

impl<P: PathFinder + ?Sized> PathFinder for Arc<P> {
    fn find_path(&self, request: &RouteRequest) -> RouteResponse {
        (**self).find_path(request)
    }
}

// ── Graph state ───────────────────────────────────────────────────────────────

enum GraphState {
    Unbuilt,
    /// `invalidated` is set when a refresh is requested mid-build.
    Building { invalidated: bool },
    Ready(Arc<RoadGraph>),
}

/// Returns the state to `Unbuilt` if a build unwinds, so waiters retry
/// instead of blocking forever.
struct BuildGuard<'a> {
    state: &'a Mutex<GraphState>,
    ready: &'a Condvar,
    armed: bool,
}

impl Drop for BuildGuard<'_> {
    fn drop(&mut self) {
        if self.armed {
            *self.state.lock().unwrap_or_else(PoisonError::into_inner) = GraphState::Unbuilt;
            self.ready.notify_all();
        }
    }
}

// ── RoutePlanner ──────────────────────────────────────────────────────────────

/// Computes traffic-aware routes over a road graph built on first use.
///
/// `S` supplies road segments, `T` supplies current traffic, and `R` is the
/// shortest-path engine.
///
/// # Example
///
/// ```rust,ignore
/// let planner = RoutePlanner::new(InMemoryRoads::new(segments), NoTraffic);
/// let route = planner.find_path(&RouteRequest::new(start, end));
/// assert!(route.path.len() >= 2);
/// ```
pub struct RoutePlanner<S, T, R = DijkstraRouter> {
    roads:   S,
    traffic: T,
    router:  R,
    config:  PlannerConfig,
    state:   Mutex<GraphState>,
    ready:   Condvar,
}

impl<S: RoadSource, T: TrafficSource> RoutePlanner<S, T, DijkstraRouter> {
    /// A planner with the default Dijkstra router and configuration.
    pub fn new(roads: S, traffic: T) -> Self {
        Self::with_router(roads, traffic, DijkstraRouter)
    }
}

impl<S: RoadSource, T: TrafficSource, R: Router> RoutePlanner<S, T, R> {
    pub fn with_router(roads: S, traffic: T, router: R) -> Self {
        Self {
            roads,
            traffic,
            router,
            config: PlannerConfig::default(),
            state: Mutex::new(GraphState::Unbuilt),
            ready: Condvar::new(),
        }
    }

    /// Replace the configuration after validating it.
    pub fn with_config(mut self, config: PlannerConfig) -> CoreResult<Self> {
        config.validate()?;
        self.config = config;
        Ok(self)
    }

    pub fn config(&self) -> &PlannerConfig {
        &self.config
    }

    pub fn road_source(&self) -> &S {
        &self.roads
    }

    pub fn traffic_source(&self) -> &T {
        &self.traffic
    }

    // ── Graph lifecycle ───────────────────────────────────────────────────

    fn lock_state(&self) -> MutexGuard<'_, GraphState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Return the shared graph, building it on first use.
    ///
    /// Concurrent first calls block until the single builder finishes.  If
    /// the road source fails, this call gets an empty graph and the state
    /// returns to `Unbuilt` so a later call retries.
    pub fn ensure_graph(&self) -> Arc<RoadGraph> {
        let mut state = self.lock_state();
        loop {
            if let GraphState::Ready(graph) = &*state {
                return Arc::clone(graph);
            }
            if matches!(*state, GraphState::Building { .. }) {
                state = self.ready.wait(state).unwrap_or_else(PoisonError::into_inner);
                continue;
            }
            break;
        }

        *state = GraphState::Building { invalidated: false };
        drop(state);

        let mut guard = BuildGuard { state: &self.state, ready: &self.ready, armed: true };
        let built = self.build_graph();
        guard.armed = false;

        let mut state = self.lock_state();
        let invalidated = matches!(*state, GraphState::Building { invalidated: true });
        let graph = match built {
            Some(graph) if invalidated => {
                // Answers this call only; the next caller rebuilds.
                debug!("road graph invalidated during build; will rebuild");
                *state = GraphState::Unbuilt;
                Arc::new(graph)
            }
            Some(graph) => {
                let graph = Arc::new(graph);
                *state = GraphState::Ready(Arc::clone(&graph));
                graph
            }
            None => {
                *state = GraphState::Unbuilt;
                Arc::new(RoadGraph::empty())
            }
        };
        self.ready.notify_all();
        graph
    }

    /// `None` when the road source failed.
    fn build_graph(&self) -> Option<RoadGraph> {
        match self.roads.list_road_segments() {
            Ok(segments) => {
                if segments.is_empty() {
                    warn!("road source returned no segments; routes will be straight-line");
                } else {
                    info!("building road graph from {} segments", segments.len());
                }
                Some(RoadGraph::from_segments(&segments))
            }
            Err(e) => {
                warn!("road source failed: {e}; routing without a graph");
                None
            }
        }
    }

    /// Discard the built graph; the next [`ensure_graph`](Self::ensure_graph)
    /// rebuilds it from the road source.  Routes already holding the old
    /// graph finish against it.
    ///
    /// Called during a build, the graph being built still answers the call
    /// that started it but is not kept; callers waiting on it build afresh.
    pub fn invalidate_graph(&self) {
        let mut state = self.lock_state();
        match *state {
            GraphState::Ready(_) => {
                *state = GraphState::Unbuilt;
                debug!("road graph invalidated");
            }
            GraphState::Building { ref mut invalidated } => {
                *invalidated = true;
                debug!("road graph invalidated during build");
            }
            GraphState::Unbuilt => {}
        }
    }

    /// `true` once a graph has been built and not invalidated.
    pub fn is_graph_ready(&self) -> bool {
        matches!(*self.lock_state(), GraphState::Ready(_))
    }

    // ── Traffic ───────────────────────────────────────────────────────────

    /// Pull current traffic and apply it to the graph.  Roads without a
    /// current sample return to free flow.
    ///
    /// Returns the number of samples that matched a road.  A collaborator
    /// failure is logged, counts as 0, and leaves the previous weights.
    pub fn refresh_traffic(&self) -> usize {
        let graph = self.ensure_graph();
        self.apply_traffic(&graph)
    }

    fn apply_traffic(&self, graph: &RoadGraph) -> usize {
        let mut samples = match self.traffic.list_current_traffic() {
            Ok(samples) => samples,
            Err(e) => {
                warn!("traffic refresh failed: {e}; keeping previous weights");
                return 0;
            }
        };
        // Oldest first so the newest report for a road wins.
        samples.sort_by_key(|s| s.reported_at);
        for s in &samples {
            trace!("traffic {} ×{} on {:?} at {}", s.level, s.multiplier, s.road_name, s.reported_at);
        }
        graph.replace_traffic(samples.iter().map(|s| (s.road_name.as_str(), s.multiplier)))
    }

    // ── Snapping ──────────────────────────────────────────────────────────

    /// The graph node nearest to `pos`, or `None` for an empty graph.
    pub fn find_nearest_node(&self, pos: GeoPoint) -> Option<NodeId> {
        self.ensure_graph().nearest_node(pos)
    }

    // ── Routing ───────────────────────────────────────────────────────────

    /// Compute a route for `request`.  Never fails: every degraded case
    /// yields the straight-line route.
    pub fn find_path(&self, request: &RouteRequest) -> RouteResponse {
        let graph = self.ensure_graph();
        self.apply_traffic(&graph);

        debug!(
            "routing {} → {} over {} nodes",
            request.start,
            request.end,
            graph.node_count()
        );

        if !request.start.is_valid() || !request.end.is_valid() {
            warn!("invalid route endpoint {} / {}; using straight-line route", request.start, request.end);
            return self.fallback(request);
        }
        if graph.is_empty() {
            warn!("road graph is empty; using straight-line route");
            return self.fallback(request);
        }

        let (Some(from), Some(to)) = (graph.nearest_node(request.start), graph.nearest_node(request.end)) else {
            warn!("could not snap route endpoints; using straight-line route");
            return self.fallback(request);
        };

        match self.router.route(&graph, from, to, Weighting::Traffic) {
            Ok(path) if path.nodes.len() >= 2 => {
                let mut response = self.assemble(&graph, &path);
                if !response.has_traffic_detours {
                    response.has_traffic_detours = self.avoided_congestion(&graph, &path);
                }
                debug!(
                    "route found: {:.2} km, {:.0} min, {} points",
                    response.total_distance_km(),
                    response.estimated_time_min,
                    response.path.len()
                );
                response
            }
            Ok(_) => {
                debug!("endpoints snap to the same node; using straight-line route");
                self.fallback(request)
            }
            Err(e) => {
                warn!("{e}; using straight-line route");
                self.fallback(request)
            }
        }
    }

    /// Route from `from` to `to`; used when replacing an active route.
    pub fn calculate_alternative(&self, from: GeoPoint, to: GeoPoint) -> RouteResponse {
        self.find_path(&RouteRequest::new(from, to))
    }

    fn fallback(&self, request: &RouteRequest) -> RouteResponse {
        straight_line_route(request.start, request.end, &self.config)
    }

    fn is_congested(&self, graph: &RoadGraph, path: &GraphPath) -> bool {
        let threshold = self.config.detour_multiplier_threshold;
        path.edges.iter().any(|&e| graph.traffic_multiplier(e) > threshold)
    }

    /// `true` if the free-flow shortest path differs from `path` and runs
    /// through congestion, meaning traffic pushed the route elsewhere.
    fn avoided_congestion(&self, graph: &RoadGraph, path: &GraphPath) -> bool {
        if !graph.has_congestion(self.config.detour_multiplier_threshold) {
            return false;
        }
        let (Some(&from), Some(&to)) = (path.nodes.first(), path.nodes.last()) else {
            return false;
        };
        match self.router.route(graph, from, to, Weighting::FreeFlow) {
            Ok(free) => free.edges != path.edges && self.is_congested(graph, &free),
            Err(_) => false,
        }
    }

    fn assemble(&self, graph: &RoadGraph, path: &GraphPath) -> RouteResponse {
        let mut total_distance_m = 0.0;
        let mut estimated_time_min = 0.0;

        for &e in &path.edges {
            let edge = graph.edge(e);
            total_distance_m += edge.distance_m;
            estimated_time_min += self.config.routing_minutes(edge.distance_m) * edge.traffic_multiplier;
        }

        RouteResponse {
            path: path.nodes.iter().map(|&n| graph.node_pos(n)).collect(),
            total_distance_m,
            estimated_time_min,
            instructions: instructions(graph, path),
            has_traffic_detours: self.is_congested(graph, path),
            waypoints: waypoints(graph, path),
            is_fallback: false,
        }
    }
}

impl<S: RoadSource, T: TrafficSource, R: Router> PathFinder for RoutePlanner<S, T, R> {
    fn find_path(&self, request: &RouteRequest) -> RouteResponse {
        RoutePlanner::find_path(self, request)
    }
}

/// One "Continue on" line per intermediate node whose outgoing edge is named,
/// between the fixed start and arrival lines.
fn instructions(graph: &RoadGraph, path: &GraphPath) -> Vec<String> {
    let mut out = Vec::with_capacity(path.nodes.len() + 1);
    out.push(START_INSTRUCTION.to_owned());
    for &e in path.edges.iter().skip(1) {
        let name = graph.road_name(e);
        if !name.is_empty() {
            out.push(format!("Continue on {name}"));
        }
    }
    out.push(ARRIVAL_INSTRUCTION.to_owned());
    out
}

/// Start node, each node where the road name changes, and the destination.
fn waypoints(graph: &RoadGraph, path: &GraphPath) -> Vec<Waypoint> {
    let mut out = Vec::new();
    let mut prev_road = None;
    for (i, &e) in path.edges.iter().enumerate() {
        let road = graph.road_name(e);
        if prev_road != Some(road) {
            out.push(Waypoint {
                position: graph.node_pos(path.nodes[i]),
                name: road.to_owned(),
            });
            prev_road = Some(road);
        }
    }
    if let Some(&last) = path.nodes.last() {
        out.push(Waypoint {
            position: graph.node_pos(last),
            name: DESTINATION_WAYPOINT.to_owned(),
        });
    }
    out
}
