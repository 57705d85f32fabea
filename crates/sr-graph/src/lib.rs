//! `sr-graph` — the in-memory road graph and shortest-path search.
//!
//! # Crate layout
//!
//! | Module      | Contents                                                    |
//! |-------------|-------------------------------------------------------------|
//! | [`segment`] | `RoadSegment` — one named polyline from the road store      |
//! | [`graph`]   | `RoadGraph` (CSR + R-tree + per-road traffic), `RoadGraphBuilder` |
//! | [`router`]  | `Router` trait, `Weighting`, `GraphPath`, `DijkstraRouter` |
//! | [`error`]   | `GraphError`, `GraphResult<T>`                             |
//!
//! # Concurrency
//!
//! A built [`RoadGraph`] is shared behind an `Arc`.  Topology never changes
//! after [`RoadGraphBuilder::build`]; traffic multipliers are stored per road
//! name in atomics and may be updated while searches run.  A search can see
//! one road's new multiplier and another road's old one.  Within a single
//! edge, length and multiplier are always consistent because the weight is
//! derived on read.
//!
//! # Feature flags
//!
//! | Flag    | Effect                                                       |
//! |---------|--------------------------------------------------------------|
//! | `serde` | Derives `Serialize`/`Deserialize` on public types.           |

pub mod error;
pub mod graph;
pub mod router;
pub mod segment;


pub use error::{GraphError, GraphResult};
pub use graph::{EdgeView, RoadGraph, RoadGraphBuilder};
pub use router::{DijkstraRouter, GraphPath, Router, Weighting};
pub use segment::{RoadSegment, UNKNOWN_ROAD};
