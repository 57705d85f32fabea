//! `sr-core` — foundational types for the `smart_route` routing workspace.
//!
//! Every other `sr-*` crate depends on this one.  It has no `sr-*`
//! dependencies and a single required external one (`thiserror`, plus
//! optional `serde`).
//!
//! # What lives here
//!
//! | Module       | Contents                                                  |
//! |--------------|-----------------------------------------------------------|
//! | [`geo`]      | `GeoPoint`, `NodeKey`, haversine distance, `eta`          |
//! | [`ids`]      | `NodeId`, `EdgeId`, `RoadId`, `UserId`, `RouteId`         |
//! | [`traffic`]  | `TrafficLevel`, `TrafficSample`                           |
//! | [`config`]   | `PlannerConfig`                                           |
//! | [`error`]    | `CoreError`, `CoreResult`                                 |
//!
//! # Units
//!
//! Distances are metres, speeds are km/h.  Conversions to kilometres happen
//! only at response boundaries (see [`geo::distance_km`]).
//!
//! # Feature flags
//!
//! | Flag    | Effect                                                     |
//! |---------|------------------------------------------------------------|
//! | `serde` | Adds `Serialize`/`Deserialize` to all public types.        |

pub mod config;
pub mod error;
pub mod geo;
pub mod ids;
pub mod traffic;

#[cfg(test)]
mod tests;

// ── Re-exports ────────────────────────────────────────────────────────────────

pub use config::PlannerConfig;
pub use error::{CoreError, CoreResult};
pub use geo::{GeoPoint, NodeKey, eta};
pub use ids::{EdgeId, NodeId, RoadId, RouteId, UserId};
pub use traffic::{TrafficLevel, TrafficSample};
