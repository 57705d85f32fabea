//! Unit tests for sr-tracker.

#[cfg(test)]
mod helpers {
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use sr_core::{GeoPoint, PlannerConfig, RouteId, TrafficSample, UserId};
    use sr_planner::{PathFinder, RouteRequest, RouteResponse, Waypoint};

    use crate::{ActiveRouteTracker, RouteObserver, RouteProgress};

    pub const A: GeoPoint = GeoPoint { lat: 22.3000, lon: 70.8000 };
    /// ~556 m north of A.
    pub const B: GeoPoint = GeoPoint { lat: 22.3050, lon: 70.8000 };
    /// ~1112 m north of A.
    pub const C: GeoPoint = GeoPoint { lat: 22.3100, lon: 70.8000 };

    pub fn waypoint(position: GeoPoint, name: &str) -> Waypoint {
        Waypoint { position, name: name.to_owned() }
    }

    /// A→B→C route of `distance_m` with a waypoint at each point.
    pub fn route(distance_m: f64) -> RouteResponse {
        RouteResponse {
            path:                vec![A, B, C],
            total_distance_m:    distance_m,
            estimated_time_min:  distance_m / 1_000.0 / 40.0 * 60.0,
            instructions:        vec!["Start your journey".into()],
            has_traffic_detours: false,
            waypoints:           vec![
                waypoint(A, "Race Course Road"),
                waypoint(B, "Yagnik Road"),
                waypoint(C, "Destination"),
            ],
            is_fallback:         false,
        }
    }

    /// Returns a straight two-point route of a settable length.
    pub struct FixedFinder {
        pub distance_m:  Mutex<f64>,
        pub is_fallback: bool,
        pub calls:       AtomicUsize,
    }

    impl FixedFinder {
        pub fn new(distance_m: f64) -> Self {
            Self { distance_m: Mutex::new(distance_m), is_fallback: false, calls: AtomicUsize::new(0) }
        }

        pub fn set(&self, distance_m: f64) {
            *self.distance_m.lock().unwrap() = distance_m;
        }

        pub fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    impl PathFinder for FixedFinder {
        fn find_path(&self, request: &RouteRequest) -> RouteResponse {
            self.calls.fetch_add(1, Ordering::SeqCst);
            RouteResponse {
                path:                vec![request.start, request.end],
                total_distance_m:    *self.distance_m.lock().unwrap(),
                estimated_time_min:  1.0,
                instructions:        Vec::new(),
                has_traffic_detours: true,
                waypoints:           vec![
                    waypoint(request.start, "Detour Road"),
                    waypoint(request.end, "Destination"),
                ],
                is_fallback:         self.is_fallback,
            }
        }
    }

    #[derive(Clone, Debug, PartialEq)]
    pub enum Event {
        Started(UserId, RouteId),
        Stopped(UserId),
        Recalculated(UserId, String, f64),
        Progress(UserId, usize),
        Waypoint(UserId, usize, String, Option<String>),
        Alert(UserId, String),
    }

    #[derive(Default)]
    pub struct Recorder {
        pub events: Mutex<Vec<Event>>,
    }

    impl Recorder {
        pub fn take(&self) -> Vec<Event> {
            std::mem::take(&mut *self.events.lock().unwrap())
        }

        fn push(&self, e: Event) {
            self.events.lock().unwrap().push(e);
        }
    }

    impl RouteObserver for Recorder {
        fn on_tracking_started(&self, user: &UserId, route_id: &RouteId) {
            self.push(Event::Started(user.clone(), route_id.clone()));
        }

        fn on_tracking_stopped(&self, user: &UserId) {
            self.push(Event::Stopped(user.clone()));
        }

        fn on_route_recalculated(&self, user: &UserId, reason: &str, route: &RouteResponse) {
            self.push(Event::Recalculated(user.clone(), reason.to_owned(), route.total_distance_m));
        }

        fn on_route_progress(&self, user: &UserId, progress: &RouteProgress) {
            self.push(Event::Progress(user.clone(), progress.current_waypoint_index));
        }

        fn on_waypoint_reached(
            &self,
            user:     &UserId,
            index:    usize,
            waypoint: &Waypoint,
            next:     Option<&Waypoint>,
        ) {
            self.push(Event::Waypoint(
                user.clone(),
                index,
                waypoint.name.clone(),
                next.map(|w| w.name.clone()),
            ));
        }

        fn on_traffic_alert(&self, user: &UserId, sample: &TrafficSample) {
            self.push(Event::Alert(user.clone(), sample.road_name.clone()));
        }
    }

    pub type TestTracker = ActiveRouteTracker<FixedFinder, Recorder>;

    /// A tracker with one session for "alice" on a 1000 m A→C route.
    pub fn tracker_with_alice(alternative_m: f64) -> TestTracker {
        let t = ActiveRouteTracker::with_observer(
            FixedFinder::new(alternative_m),
            Recorder::default(),
            PlannerConfig::default(),
        );
        t.start_tracking("alice".into(), "route-1".into(), A, C, &route(1_000.0));
        t.observer().take();
        t
    }

    pub fn alice() -> UserId {
        UserId::new("alice")
    }
}

// ── Session lifecycle ─────────────────────────────────────────────────────────

#[cfg(test)]
mod lifecycle {
    use sr_core::{PlannerConfig, RouteId, UserId};

    use super::helpers::{A, C, Event, FixedFinder, alice, route, tracker_with_alice};
    use crate::{ActiveRouteTracker, TrackerError};

    #[test]
    fn start_and_stop() {
        let t = tracker_with_alice(500.0);
        assert_eq!(t.active_count(), 1);
        let active = t.active_route(&alice()).unwrap();
        assert_eq!(active.route_id, RouteId::new("route-1"));
        assert_eq!(active.total_distance_m, 1_000.0);
        assert_eq!(active.remaining_distance_m, 1_000.0);
        assert_eq!(active.current_waypoint_index, 0);

        let last = t.stop_tracking(&alice()).unwrap();
        assert_eq!(last.destination, C);
        assert_eq!(t.active_count(), 0);
        assert_eq!(t.observer().take(), vec![Event::Stopped(alice())]);
    }

    #[test]
    fn start_notifies_observer() {
        let t = ActiveRouteTracker::with_observer(
            FixedFinder::new(0.0),
            super::helpers::Recorder::default(),
            PlannerConfig::default(),
        );
        t.start_tracking("bob".into(), "r".into(), A, C, &route(10.0));
        assert_eq!(
            t.observer().take(),
            vec![Event::Started(UserId::new("bob"), RouteId::new("r"))]
        );
    }

    #[test]
    fn missing_session_is_an_error() {
        let t = ActiveRouteTracker::new(FixedFinder::new(0.0), PlannerConfig::default());
        let bob = UserId::new("bob");
        let err = TrackerError::NoActiveSession(bob.clone());
        assert_eq!(t.progress(&bob, A, None).unwrap_err(), err);
        assert_eq!(t.check_waypoint(&bob, A).unwrap_err(), err);
        assert_eq!(t.maybe_recalculate(&bob, A).unwrap_err(), err);
        assert_eq!(t.stop_tracking(&bob).unwrap_err(), err);
        assert_eq!(t.active_route(&bob).unwrap_err(), err);
    }

    #[test]
    fn route_waypoints_by_id() {
        let t = tracker_with_alice(500.0);
        let names: Vec<_> = t
            .route_waypoints(&RouteId::new("route-1"))
            .unwrap()
            .into_iter()
            .map(|w| w.name)
            .collect();
        assert_eq!(names, vec!["Race Course Road", "Yagnik Road", "Destination"]);

        let unknown = RouteId::new("nope");
        assert_eq!(
            t.route_waypoints(&unknown).unwrap_err(),
            TrackerError::UnknownRoute(unknown)
        );
    }

    #[test]
    fn restart_replaces_session() {
        let t = tracker_with_alice(500.0);
        t.start_tracking(alice(), "route-2".into(), C, A, &route(2_000.0));
        assert_eq!(t.active_count(), 1);
        assert_eq!(t.active_route(&alice()).unwrap().route_id, RouteId::new("route-2"));
    }
}

// ── Progress ──────────────────────────────────────────────────────────────────

#[cfg(test)]
mod progress {
    use std::time::Duration;

    use sr_core::{GeoPoint, PlannerConfig, RouteId};

    use super::helpers::{A, B, C, Event, FixedFinder, alice, route, tracker_with_alice};
    use crate::{ActiveRoute, ActiveRouteTracker, PositionUpdate, RouteProgress};

    fn secs(d: Duration) -> f64 {
        d.as_secs_f64()
    }

    #[test]
    fn at_start() {
        let t = tracker_with_alice(500.0);
        let p = t.progress(&alice(), A, Some(36.0)).unwrap();
        assert_eq!(p.distance_covered_m, 0.0);
        assert_eq!(p.distance_remaining_m, 1_000.0);
        assert_eq!(p.percent_complete, 0.0);
        assert!((secs(p.eta_remaining) - 100.0).abs() < 1e-6);
    }

    #[test]
    fn covered_is_straight_line_from_start() {
        let t = tracker_with_alice(500.0);
        let p = t.progress(&alice(), B, None).unwrap();
        let covered = A.distance_m(B);
        assert_eq!(p.distance_covered_m, covered);
        assert!((p.distance_remaining_m - (1_000.0 - covered)).abs() < 1e-9);
        assert!((p.percent_complete - covered / 10.0).abs() < 1e-9);
        assert_eq!(t.active_route(&alice()).unwrap().remaining_distance_m, p.distance_remaining_m);
    }

    #[test]
    fn missing_or_bad_speed_uses_cruising_speed() {
        let t = tracker_with_alice(500.0);
        let expected = 1_000.0 / (50.0 / 3.6);
        for speed in [None, Some(0.0), Some(-5.0), Some(f64::NAN)] {
            let p = t.progress(&alice(), A, speed).unwrap();
            assert!((secs(p.eta_remaining) - expected).abs() < 1e-6, "speed {speed:?}");
        }
    }

    #[test]
    fn crawling_speed_saturates_eta() {
        let t = tracker_with_alice(500.0);
        let p = t.progress(&alice(), A, Some(1e-18)).unwrap();
        assert_eq!(p.eta_remaining, Duration::MAX);
    }

    #[test]
    fn overshoot_clamps() {
        let t = tracker_with_alice(500.0);
        // C is ~1112 m from A, beyond the 1000 m route length.
        let p = t.progress(&alice(), C, None).unwrap();
        assert_eq!(p.distance_remaining_m, 0.0);
        assert_eq!(p.percent_complete, 100.0);
        assert_eq!(p.eta_remaining, Duration::ZERO);
    }

    #[test]
    fn zero_length_route_is_complete() {
        let active = ActiveRoute::new(RouteId::new("r"), A, A, &route(0.0));
        let p = RouteProgress::compute(&alice(), &active, A, 40.0);
        assert_eq!(p.percent_complete, 100.0);
        assert_eq!(p.distance_remaining_m, 0.0);
    }

    #[test]
    fn position_update_reports_progress() {
        let t = tracker_with_alice(500.0);
        let update = PositionUpdate::new("alice", GeoPoint::new(22.3010, 70.8000)).with_speed(30.0);
        let p = t.handle_position_update(&update, false).unwrap();
        assert_eq!(p.route_id, RouteId::new("route-1"));
        assert_eq!(p.user, alice());
        assert_eq!(t.observer().take(), vec![Event::Progress(alice(), 0)]);
        assert_eq!(t.active_route(&alice()).unwrap().last_position, Some(update.position));
    }

    #[test]
    fn untracked_update_is_an_error() {
        let t = ActiveRouteTracker::new(FixedFinder::new(0.0), PlannerConfig::default());
        assert!(t.handle_position_update(&PositionUpdate::new("ghost", A), true).is_err());
    }
}

// ── Waypoints ─────────────────────────────────────────────────────────────────

#[cfg(test)]
mod waypoints {
    use sr_core::GeoPoint;

    use super::helpers::{A, B, C, Event, alice, tracker_with_alice};

    fn reached(events: Vec<Event>) -> Vec<(usize, String, Option<String>)> {
        events
            .into_iter()
            .filter_map(|e| match e {
                Event::Waypoint(_, i, name, next) => Some((i, name, next)),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn index_never_regresses() {
        let t = tracker_with_alice(500.0);
        assert_eq!(t.check_waypoint(&alice(), A).unwrap(), 0);
        assert_eq!(t.check_waypoint(&alice(), B).unwrap(), 1);
        // Back at the start.
        assert_eq!(t.check_waypoint(&alice(), A).unwrap(), 1);
        assert_eq!(t.progress(&alice(), A, None).unwrap().current_waypoint_index, 1);
        assert_eq!(t.check_waypoint(&alice(), C).unwrap(), 2);
        assert_eq!(t.check_waypoint(&alice(), B).unwrap(), 2);
    }

    #[test]
    fn out_of_range_keeps_index() {
        let t = tracker_with_alice(500.0);
        t.check_waypoint(&alice(), B).unwrap();
        let between = GeoPoint::new(22.3075, 70.8000);
        assert_eq!(t.check_waypoint(&alice(), between).unwrap(), 1);
    }

    #[test]
    fn radius_is_inclusive_at_fifty_metres() {
        let t = tracker_with_alice(500.0);
        // ~44 m south of B.
        let near_b = GeoPoint::new(22.3046, 70.8000);
        assert!(near_b.distance_m(B) <= 50.0);
        assert_eq!(t.check_waypoint(&alice(), near_b).unwrap(), 1);
    }

    #[test]
    fn each_waypoint_announced_once() {
        let t = tracker_with_alice(500.0);
        t.check_waypoint(&alice(), A).unwrap();
        t.check_waypoint(&alice(), B).unwrap();
        t.check_waypoint(&alice(), B).unwrap();
        t.check_waypoint(&alice(), A).unwrap();
        t.check_waypoint(&alice(), C).unwrap();
        assert_eq!(
            reached(t.observer().take()),
            vec![
                (0, "Race Course Road".to_owned(), Some("Yagnik Road".to_owned())),
                (1, "Yagnik Road".to_owned(), Some("Destination".to_owned())),
                (2, "Destination".to_owned(), None),
            ]
        );
    }
}

// ── Recalculation ─────────────────────────────────────────────────────────────

#[cfg(test)]
mod recalculation {
    use sr_core::{GeoPoint, PlannerConfig, RouteId, TrafficLevel, TrafficSample, UserId};

    use super::helpers::{A, B, C, Event, FixedFinder, Recorder, alice, route, tracker_with_alice};
    use crate::{ActiveRouteTracker, PositionUpdate, RECALCULATION_REASON};

    #[test]
    fn equal_alternative_is_rejected() {
        let t = tracker_with_alice(1_000.0);
        assert!(t.maybe_recalculate(&alice(), B).unwrap().is_none());
        let active = t.active_route(&alice()).unwrap();
        assert_eq!(active.total_distance_m, 1_000.0);
        assert_eq!(active.start, A);
        assert_eq!(active.revision, 0);
        assert!(t.observer().take().is_empty());
    }

    #[test]
    fn longer_alternative_is_rejected() {
        let t = tracker_with_alice(1_500.0);
        assert!(t.maybe_recalculate(&alice(), B).unwrap().is_none());
        assert_eq!(t.active_route(&alice()).unwrap().revision, 0);
    }

    #[test]
    fn shorter_alternative_replaces_route() {
        let t = tracker_with_alice(999.0);
        let new_route = t.maybe_recalculate(&alice(), B).unwrap().unwrap();
        assert_eq!(new_route.total_distance_m, 999.0);

        let active = t.active_route(&alice()).unwrap();
        assert_eq!(active.route_id, RouteId::new("route-1"));
        assert_eq!(active.start, B);
        assert_eq!(active.destination, C);
        assert_eq!(active.total_distance_m, 999.0);
        assert_eq!(active.remaining_distance_m, 999.0);
        assert_eq!(active.current_waypoint_index, 0);
        assert_eq!(active.revision, 1);

        assert_eq!(
            t.observer().take(),
            vec![Event::Recalculated(alice(), RECALCULATION_REASON.to_owned(), 999.0)]
        );
        let names: Vec<_> = t
            .route_waypoints(&RouteId::new("route-1"))
            .unwrap()
            .into_iter()
            .map(|w| w.name)
            .collect();
        assert_eq!(names, vec!["Detour Road", "Destination"]);
    }

    #[test]
    fn compares_against_remaining_not_total() {
        let t = tracker_with_alice(600.0);
        // Remaining drops to ~444 m once alice is at B.
        t.progress(&alice(), B, None).unwrap();
        assert!(t.maybe_recalculate(&alice(), B).unwrap().is_none());
        t.planner().set(400.0);
        assert!(t.maybe_recalculate(&alice(), B).unwrap().is_some());
    }

    #[test]
    fn straight_line_alternative_is_rejected() {
        let mut finder = FixedFinder::new(10.0);
        finder.is_fallback = true;
        let t = ActiveRouteTracker::new(finder, PlannerConfig::default());
        t.start_tracking(alice(), "r".into(), A, C, &route(1_000.0));
        assert!(t.maybe_recalculate(&alice(), B).unwrap().is_none());
    }

    #[test]
    fn recalculates_only_when_traffic_ahead() {
        let t = tracker_with_alice(999.0);
        let update = PositionUpdate::new("alice", A);
        t.handle_position_update(&update, false).unwrap();
        assert_eq!(t.planner().calls(), 0);
        t.observer().take();

        let p = t.handle_position_update(&update, true).unwrap();
        assert_eq!(t.planner().calls(), 1);
        assert_eq!(p.distance_covered_m, 0.0);
        assert_eq!(p.distance_remaining_m, 999.0);
        let events = t.observer().take();
        assert!(matches!(events[0], Event::Recalculated(..)));
    }

    #[test]
    fn traffic_report_alerts_nearby_users() {
        let t = ActiveRouteTracker::with_observer(
            FixedFinder::new(900.0),
            Recorder::default(),
            PlannerConfig::default(),
        );
        for user in ["near", "far", "silent"] {
            t.start_tracking(user.into(), format!("route-{user}").into(), A, C, &route(1_000.0));
        }
        t.progress(&UserId::new("near"), B, None).unwrap();
        // ~11 km away.
        t.progress(&UserId::new("far"), GeoPoint::new(22.40, 70.80), None).unwrap();
        t.observer().take();

        let sample = TrafficSample::from_level("Yagnik Road", TrafficLevel::Heavy, 0, C);
        let alerted = t.report_traffic(&sample);

        assert_eq!(alerted, vec![UserId::new("near")]);
        assert_eq!(t.planner().calls(), 1);
        let events = t.observer().take();
        assert_eq!(events[0], Event::Alert(UserId::new("near"), "Yagnik Road".into()));
        // 900 m is not shorter than the ~444 m left.
        assert_eq!(events.len(), 1);
    }
}

// ── Sessions ending mid-alert ─────────────────────────────────────────────────

#[cfg(test)]
mod stopped_during_alert {
    use std::sync::{Arc, OnceLock, Weak};

    use sr_core::{PlannerConfig, TrafficLevel, TrafficSample, UserId};

    use super::helpers::{A, B, C, FixedFinder, alice, route};
    use crate::{ActiveRouteTracker, RouteObserver};

    type Tracker = ActiveRouteTracker<FixedFinder, StopOnAlert>;

    /// Ends the alerted user's session from inside the alert callback.
    #[derive(Default)]
    struct StopOnAlert {
        tracker: OnceLock<Weak<Tracker>>,
    }

    impl RouteObserver for StopOnAlert {
        fn on_traffic_alert(&self, user: &UserId, _sample: &TrafficSample) {
            if let Some(t) = self.tracker.get().and_then(Weak::upgrade) {
                t.stop_tracking(user).unwrap();
            }
        }
    }

    #[test]
    fn alert_still_reported_when_session_ends() {
        let t: Arc<Tracker> = Arc::new(ActiveRouteTracker::with_observer(
            FixedFinder::new(100.0),
            StopOnAlert::default(),
            PlannerConfig::default(),
        ));
        t.observer().tracker.set(Arc::downgrade(&t)).unwrap();
        t.start_tracking(alice(), "route-1".into(), A, C, &route(1_000.0));
        t.progress(&alice(), B, None).unwrap();

        let sample = TrafficSample::from_level("Yagnik Road", TrafficLevel::Blocked, 0, B);
        assert_eq!(t.report_traffic(&sample), vec![alice()]);
        assert_eq!(t.planner().calls(), 0);
        assert_eq!(t.active_count(), 0);
    }
}

// ── Against a real planner ────────────────────────────────────────────────────

#[cfg(test)]
mod planned {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicI64, Ordering};

    use sr_core::{GeoPoint, PlannerConfig, TrafficLevel, TrafficSample};
    use sr_graph::RoadSegment;
    use sr_planner::{InMemoryRoads, InMemoryTraffic, PathFinder, RouteRequest, RoutePlanner};

    use super::helpers::alice;
    use crate::{ActiveRouteTracker, PositionUpdate};

    const WEST: GeoPoint = GeoPoint { lat: 22.30, lon: 70.80 };
    const EAST: GeoPoint = GeoPoint { lat: 22.30, lon: 70.84 };

    #[test]
    fn cleared_congestion_shortens_route() {
        let clock = Arc::new(AtomicI64::new(10_000));
        let traffic = {
            let clock = Arc::clone(&clock);
            Arc::new(InMemoryTraffic::with_clock(1_800, move || clock.load(Ordering::SeqCst)))
        };
        let roads = InMemoryRoads::new(vec![
            RoadSegment::new("Short Road", vec![WEST, GeoPoint::new(22.305, 70.82), EAST]),
            RoadSegment::new("Long Road", vec![WEST, GeoPoint::new(22.29, 70.82), EAST]),
        ]);
        let planner = Arc::new(RoutePlanner::new(roads, Arc::clone(&traffic)));

        traffic.report(TrafficSample::from_level("Short Road", TrafficLevel::Blocked, 10_000, WEST));
        let detour = planner.find_path(&RouteRequest::new(WEST, EAST));
        assert!(detour.has_traffic_detours);

        let tracker = ActiveRouteTracker::new(Arc::clone(&planner), PlannerConfig::default());
        tracker.start_tracking(alice(), "commute".into(), WEST, EAST, &detour);

        // The blockage report ages out of the window.
        clock.store(12_000, Ordering::SeqCst);
        let p = tracker.handle_position_update(&PositionUpdate::new("alice", WEST), true).unwrap();

        let active = tracker.active_route(&alice()).unwrap();
        assert_eq!(active.revision, 1);
        assert!(active.total_distance_m < detour.total_distance_m);
        assert_eq!(active.waypoints[0].name, "Short Road");
        assert_eq!(p.distance_remaining_m, active.total_distance_m);
    }
}
