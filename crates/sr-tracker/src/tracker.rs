//! The active route tracker.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock};

use log::{debug, info, trace};
use rustc_hash::FxHashMap;

use sr_core::{GeoPoint, PlannerConfig, RouteId, TrafficSample, UserId};
use sr_planner::{PathFinder, RouteRequest, RouteResponse, Waypoint};

use crate::{
    ActiveRoute, NoopObserver, PositionUpdate, RouteObserver, RouteProgress, TrackerError,
    TrackerResult,
};

/// Reason attached to every traffic-driven route replacement.
pub const RECALCULATION_REASON: &str = "Traffic detected ahead";

type Session = Arc<Mutex<ActiveRoute>>;

fn lock(session: &Mutex<ActiveRoute>) -> MutexGuard<'_, ActiveRoute> {
    session.lock().unwrap_or_else(PoisonError::into_inner)
}

/// A waypoint arrival to report once the session lock is released.
struct Reached {
    index:    usize,
    waypoint: Waypoint,
    next:     Option<Waypoint>,
}

/// Tracks users along their active routes.
///
/// `P` computes replacement routes and `O` receives notifications.  Each
/// session has its own lock; the session table lock is held only to look up
/// or insert sessions.
pub struct ActiveRouteTracker<P, O = NoopObserver> {
    planner:  P,
    observer: O,
    config:   PlannerConfig,
    sessions: RwLock<FxHashMap<UserId, Session>>,
    routes:   RwLock<FxHashMap<RouteId, Arc<[Waypoint]>>>,
}

impl<P: PathFinder> ActiveRouteTracker<P, NoopObserver> {
    pub fn new(planner: P, config: PlannerConfig) -> Self {
        Self::with_observer(planner, NoopObserver, config)
    }
}

impl<P: PathFinder, O: RouteObserver> ActiveRouteTracker<P, O> {
    pub fn with_observer(planner: P, observer: O, config: PlannerConfig) -> Self {
        Self {
            planner,
            observer,
            config,
            sessions: RwLock::new(FxHashMap::default()),
            routes:   RwLock::new(FxHashMap::default()),
        }
    }

    pub fn planner(&self) -> &P {
        &self.planner
    }

    pub fn observer(&self) -> &O {
        &self.observer
    }

    pub fn config(&self) -> &PlannerConfig {
        &self.config
    }

    // ── Sessions ──────────────────────────────────────────────────────────

    fn session(&self, user: &UserId) -> TrackerResult<Session> {
        self.sessions
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(user)
            .cloned()
            .ok_or_else(|| TrackerError::NoActiveSession(user.clone()))
    }

    /// Remember the waypoints of `route` under `route_id`.
    pub fn register_route(&self, route_id: RouteId, route: &RouteResponse) {
        self.routes
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(route_id, route.waypoints.clone().into());
    }

    /// Waypoints of a registered route, in travel order.
    pub fn route_waypoints(&self, route_id: &RouteId) -> TrackerResult<Vec<Waypoint>> {
        self.routes
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(route_id)
            .map(|w| w.to_vec())
            .ok_or_else(|| TrackerError::UnknownRoute(route_id.clone()))
    }

    /// Make `route` the active route of `user`, replacing any previous one.
    pub fn start_tracking(
        &self,
        user:        UserId,
        route_id:    RouteId,
        start:       GeoPoint,
        destination: GeoPoint,
        route:       &RouteResponse,
    ) {
        self.register_route(route_id.clone(), route);
        let active = ActiveRoute::new(route_id.clone(), start, destination, route);
        self.sessions
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(user.clone(), Arc::new(Mutex::new(active)));

        info!("tracking {user} on route {route_id} ({:.0} m)", route.total_distance_m);
        self.observer.on_tracking_started(&user, &route_id);
    }

    /// End the session of `user`, returning its final state.
    pub fn stop_tracking(&self, user: &UserId) -> TrackerResult<ActiveRoute> {
        let session = self
            .sessions
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(user)
            .ok_or_else(|| TrackerError::NoActiveSession(user.clone()))?;

        let last = lock(&session).clone();
        info!("stopped tracking {user}");
        self.observer.on_tracking_stopped(user);
        Ok(last)
    }

    /// A snapshot of the active route of `user`.
    pub fn active_route(&self, user: &UserId) -> TrackerResult<ActiveRoute> {
        let session = self.session(user)?;
        Ok(lock(&session).clone())
    }

    pub fn active_count(&self) -> usize {
        self.sessions.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    // ── Waypoints and progress ────────────────────────────────────────────

    fn advance(&self, route: &mut ActiveRoute, position: GeoPoint) -> Option<Reached> {
        let index = route.advance_waypoint(position, self.config.waypoint_radius_m)?;
        Some(Reached {
            index,
            waypoint: route.waypoints[index].clone(),
            next:     route.waypoints.get(index + 1).cloned(),
        })
    }

    fn announce(&self, user: &UserId, reached: Option<Reached>) {
        if let Some(r) = reached {
            debug!("{user} reached waypoint {} ({})", r.index, r.waypoint.name);
            self.observer.on_waypoint_reached(user, r.index, &r.waypoint, r.next.as_ref());
        }
    }

    /// Index of the waypoint `user` has reached at `position`.
    ///
    /// Returns the first waypoint within the arrival radius, searching from
    /// the current index onward, or the current index if none is in range.
    pub fn check_waypoint(&self, user: &UserId, position: GeoPoint) -> TrackerResult<usize> {
        let session = self.session(user)?;
        let (index, reached) = {
            let mut route = lock(&session);
            let reached = self.advance(&mut route, position);
            (route.current_waypoint_index, reached)
        };
        self.announce(user, reached);
        Ok(index)
    }

    /// Progress of `user` at `position`.
    ///
    /// Advances the waypoint index, records the remaining distance on the
    /// session, and notifies the observer.  `speed_kmh` outside `(0, ∞)`
    /// falls back to the configured cruising speed.
    pub fn progress(
        &self,
        user:      &UserId,
        position:  GeoPoint,
        speed_kmh: Option<f64>,
    ) -> TrackerResult<RouteProgress> {
        let speed = speed_kmh
            .filter(|s| s.is_finite() && *s > 0.0)
            .unwrap_or(self.config.cruising_speed_kmh);

        let session = self.session(user)?;
        let (progress, reached) = {
            let mut route = lock(&session);
            let reached = self.advance(&mut route, position);
            let progress = RouteProgress::compute(user, &route, position, speed);
            route.remaining_distance_m = progress.distance_remaining_m;
            route.last_position = Some(position);
            (progress, reached)
        };

        self.announce(user, reached);
        trace!(
            "{user}: {:.0} m covered, {:.0} m left, {:.1}%",
            progress.distance_covered_m,
            progress.distance_remaining_m,
            progress.percent_complete
        );
        self.observer.on_route_progress(user, &progress);
        Ok(progress)
    }

    // ── Recalculation ─────────────────────────────────────────────────────

    /// Try to replace the active route of `user` with one from `position`.
    ///
    /// The alternative is adopted only if it is strictly shorter than the
    /// current remaining distance, and only if the session was not replaced
    /// or restarted while it was being computed.
    ///
    /// A straight-line fallback is never adopted, however short: it means
    /// the planner found no road route, and swapping a road route for one
    /// would drop every waypoint the user is following.
    pub fn maybe_recalculate(
        &self,
        user:     &UserId,
        position: GeoPoint,
    ) -> TrackerResult<Option<RouteResponse>> {
        let session = self.session(user)?;
        let (route_id, destination, remaining, revision) = {
            let route = lock(&session);
            (route.route_id.clone(), route.destination, route.remaining_distance_m, route.revision)
        };

        let alternative = self.planner.find_path(&RouteRequest::new(position, destination));

        if alternative.is_fallback {
            debug!("{user}: no road alternative to route {route_id}");
            return Ok(None);
        }
        if alternative.total_distance_m >= remaining {
            debug!(
                "{user}: alternative {:.0} m is not shorter than {:.0} m remaining",
                alternative.total_distance_m, remaining
            );
            return Ok(None);
        }

        // A stop or restart swaps the session Arc; a concurrent replacement
        // bumps the revision.
        if !self.is_current(user, &session) {
            debug!("{user}: session ended during recalculation");
            return Ok(None);
        }
        {
            let mut route = lock(&session);
            if route.revision != revision {
                debug!("{user}: route {route_id} changed during recalculation");
                return Ok(None);
            }
            route.replace(position, &alternative);
        }

        self.register_route(route_id.clone(), &alternative);
        info!(
            "{user}: route {route_id} recalculated, {:.0} m → {:.0} m",
            remaining, alternative.total_distance_m
        );
        self.observer.on_route_recalculated(user, RECALCULATION_REASON, &alternative);
        Ok(Some(alternative))
    }

    fn is_current(&self, user: &UserId, session: &Session) -> bool {
        self.sessions
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(user)
            .is_some_and(|s| Arc::ptr_eq(s, session))
    }

    // ── Transport entry points ────────────────────────────────────────────

    /// Handle one live position report.
    ///
    /// When `traffic_ahead` is set the route is recalculated first; progress
    /// is then computed against whichever route is active.
    pub fn handle_position_update(
        &self,
        update:        &PositionUpdate,
        traffic_ahead: bool,
    ) -> TrackerResult<RouteProgress> {
        if traffic_ahead {
            self.maybe_recalculate(&update.user, update.position)?;
        }
        self.progress(&update.user, update.position, update.speed_kmh)
    }

    /// Alert every tracked user last seen within the alert radius of
    /// `sample` and try to route them around it.  Returns the users alerted.
    ///
    /// The sample must already be visible to the planner's traffic source.
    pub fn report_traffic(&self, sample: &TrafficSample) -> Vec<UserId> {
        let snapshot: Vec<(UserId, Session)> = self
            .sessions
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .map(|(u, s)| (u.clone(), Arc::clone(s)))
            .collect();

        let mut alerted = Vec::new();
        for (user, session) in snapshot {
            let Some(position) = lock(&session).last_position else {
                continue;
            };
            if position.distance_m(sample.position) > self.config.traffic_alert_radius_m {
                continue;
            }
            self.observer.on_traffic_alert(&user, sample);
            if let Err(e) = self.maybe_recalculate(&user, position) {
                debug!("{user}: not recalculated after traffic alert: {e}");
            }
            alerted.push(user);
        }

        debug!("traffic on {:?} alerted {} users", sample.road_name, alerted.len());
        alerted
    }
}
