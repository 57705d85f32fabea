//! `sr-tracker` — live tracking of users along their active routes.
//!
//! # Crate layout
//!
//! | Module       | Contents                                                   |
//! |--------------|------------------------------------------------------------|
//! | [`session`]  | `ActiveRoute`, `PositionUpdate`, `RouteProgress`           |
//! | [`observer`] | `RouteObserver` notification trait, `NoopObserver`         |
//! | [`tracker`]  | `ActiveRouteTracker<P, O>`                                 |
//! | [`error`]    | `TrackerError`, `TrackerResult<T>`                         |
//!
//! # Update flow
//!
//! 1. The transport layer calls
//!    [`handle_position_update`](ActiveRouteTracker::handle_position_update)
//!    with the reported position and whether traffic lies ahead.
//! 2. If traffic lies ahead, the tracker asks its [`PathFinder`] for a route
//!    from the current position to the destination and adopts it only when
//!    it is strictly shorter than the remaining distance.
//! 3. Waypoint arrival is checked, progress is computed, and the observer is
//!    notified.
//!
//! Sessions are independent: each user's route sits behind its own lock.
//!
//! [`PathFinder`]: sr_planner::PathFinder

pub mod error;
pub mod observer;
pub mod session;
pub mod tracker;

#[cfg(test)]
mod tests;

pub use error::{TrackerError, TrackerResult};
pub use observer::{NoopObserver, RouteObserver};
pub use session::{ActiveRoute, PositionUpdate, RouteProgress};
pub use tracker::{ActiveRouteTracker, RECALCULATION_REASON};
