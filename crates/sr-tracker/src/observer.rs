//! Outbound notifications for the transport layer.

use std::sync::Arc;

use sr_core::{RouteId, TrafficSample, UserId};
use sr_planner::{RouteResponse, Waypoint};

use crate::RouteProgress;

/// Fire-and-forget callbacks invoked by
/// [`ActiveRouteTracker`][crate::ActiveRouteTracker].
///
/// All methods have default no-op implementations so implementors only need
/// to override what they care about.  Callbacks run on the caller's thread
/// after the session lock has been released.
///
/// # Example — push to a websocket hub
///
/// ```rust,ignore
/// struct HubObserver { hub: Hub }
///
/// impl RouteObserver for HubObserver {
///     fn on_route_progress(&self, user: &UserId, progress: &RouteProgress) {
///         self.hub.send(user, "RouteProgress", progress);
///     }
/// }
/// ```
pub trait RouteObserver: Send + Sync {
    fn on_tracking_started(&self, _user: &UserId, _route_id: &RouteId) {}

    fn on_tracking_stopped(&self, _user: &UserId) {}

    /// A shorter route replaced the user's active route.
    fn on_route_recalculated(&self, _user: &UserId, _reason: &str, _route: &RouteResponse) {}

    fn on_route_progress(&self, _user: &UserId, _progress: &RouteProgress) {}

    /// The user came within the arrival radius of waypoint `index`.  `next`
    /// is `None` at the final waypoint.
    fn on_waypoint_reached(
        &self,
        _user:     &UserId,
        _index:    usize,
        _waypoint: &Waypoint,
        _next:     Option<&Waypoint>,
    ) {}

    /// A traffic report landed within the alert radius of the user.
    fn on_traffic_alert(&self, _user: &UserId, _sample: &TrafficSample) {}
}

impl<O: RouteObserver + ?Sized> RouteObserver for Arc<O> {
    fn on_tracking_started(&self, user: &UserId, route_id: &RouteId) {
        (**self).on_tracking_started(user, route_id)
    }

    fn on_tracking_stopped(&self, user: &UserId) {
        (**self).on_tracking_stopped(user)
    }

    fn on_route_recalculated(&self, user: &UserId, reason: &str, route: &RouteResponse) {
        (**self).on_route_recalculated(user, reason, route)
    }

    fn on_route_progress(&self, user: &UserId, progress: &RouteProgress) {
        (**self).on_route_progress(user, progress)
    }

    fn on_waypoint_reached(
        &self,
        user:     &UserId,
        index:    usize,
        waypoint: &Waypoint,
        next:     Option<&Waypoint>,
    ) {
        (**self).on_waypoint_reached(user, index, waypoint, next)
    }

    fn on_traffic_alert(&self, user: &UserId, sample: &TrafficSample) {
        (**self).on_traffic_alert(user, sample)
    }
}

/// A [`RouteObserver`] that does nothing.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopObserver;

impl RouteObserver for NoopObserver {}
