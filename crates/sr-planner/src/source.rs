//! Collaborator contracts for road and traffic data.
//!
//! The planner owns no storage.  It asks a [`RoadSource`] for the full road
//! list once per graph build and a [`TrafficSource`] for current samples
//! before every path computation.  Implementations must be `Send + Sync` and
//! must bound their own latency; the planner has no internal timeouts.

use std::sync::{Arc, Mutex, PoisonError};
use std::time::{SystemTime, UNIX_EPOCH};

use sr_core::TrafficSample;
use sr_graph::RoadSegment;

use crate::SourceResult;

/// Provides the complete list of road segments.
pub trait RoadSource: Send + Sync {
    /// An empty list is a valid answer ("no graph available").
    fn list_road_segments(&self) -> SourceResult<Vec<RoadSegment>>;
}

/// Provides the traffic samples considered current.
pub trait TrafficSource: Send + Sync {
    /// Samples already filtered to the trailing window.  The planner applies
    /// whatever is returned.
    fn list_current_traffic(&self) -> SourceResult<Vec<TrafficSample>>;
}

impl<S: RoadSource + ?Sized> RoadSource for Arc<S> {
    fn list_road_segments(&self) -> SourceResult<Vec<RoadSegment>> {
        (**self).list_road_segments()
    }
}

impl<T: TrafficSource + ?Sized> TrafficSource for Arc<T> {
    fn list_current_traffic(&self) -> SourceResult<Vec<TrafficSample>> {
        (**self).list_current_traffic()
    }
}

/// Seconds since the Unix epoch, per the system clock.
pub fn unix_now() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or(0)
}

// ── In-memory roads ───────────────────────────────────────────────────────────

/// A fixed road list held in memory.
#[derive(Clone, Debug, Default)]
pub struct InMemoryRoads {
    segments: Vec<RoadSegment>,
}

impl InMemoryRoads {
    pub fn new(segments: Vec<RoadSegment>) -> Self {
        Self { segments }
    }
}

impl RoadSource for InMemoryRoads {
    fn list_road_segments(&self) -> SourceResult<Vec<RoadSegment>> {
        Ok(self.segments.clone())
    }
}

// ── In-memory traffic ─────────────────────────────────────────────────────────

type Clock = Box<dyn Fn() -> i64 + Send + Sync>;

/// Accumulates reported samples and returns those inside the trailing window.
pub struct InMemoryTraffic {
    samples:     Mutex<Vec<TrafficSample>>,
    window_secs: i64,
    clock:       Clock,
}

impl InMemoryTraffic {
    /// A store using the system clock.
    pub fn new(window_secs: i64) -> Self {
        Self::with_clock(window_secs, unix_now)
    }

    /// A store whose notion of "now" comes from `clock`.
    pub fn with_clock(window_secs: i64, clock: impl Fn() -> i64 + Send + Sync + 'static) -> Self {
        Self {
            samples: Mutex::new(Vec::new()),
            window_secs,
            clock: Box::new(clock),
        }
    }

    pub fn report(&self, sample: TrafficSample) {
        self.samples
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(sample);
    }

    /// Drop samples that have left the window.  Returns how many remain.
    pub fn prune(&self) -> usize {
        let now = (self.clock)();
        let mut samples = self.samples.lock().unwrap_or_else(PoisonError::into_inner);
        samples.retain(|s| s.is_current(now, self.window_secs));
        samples.len()
    }
}

impl TrafficSource for InMemoryTraffic {
    fn list_current_traffic(&self) -> SourceResult<Vec<TrafficSample>> {
        let now = (self.clock)();
        let samples = self.samples.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(samples
            .iter()
            .filter(|s| s.is_current(now, self.window_secs))
            .cloned()
            .collect())
    }
}

/// A traffic source that never reports anything.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoTraffic;

impl TrafficSource for NoTraffic {
    fn list_current_traffic(&self) -> SourceResult<Vec<TrafficSample>> {
        Ok(Vec::new())
    }
}
