//! Road graph representation and builder.
//!
//! # Data layout
//!
//! Outgoing edges use **Compressed Sparse Row (CSR)** format.  Given a
//! `NodeId n`, its outgoing edges occupy the `EdgeId` range
//!
//! ```text
//! node_out_start[n] .. node_out_start[n+1]
//! ```
//!
//! All edge arrays (`edge_from`, `edge_to`, `edge_length_m`, `edge_road`) are
//! sorted by source node and indexed by `EdgeId`.  Within one node, edges
//! keep the order in which they were added.
//!
//! # Traffic
//!
//! Road names are interned to `RoadId`s.  Each road owns one multiplier,
//! stored as `f64` bits in an `AtomicU64`, so a traffic update is a single
//! store per road name and never touches topology.  An edge's weight is
//! computed on read as `length × multiplier` and is never stored.
//!
//! # Spatial index
//!
//! An R-tree (via `rstar`) over unit-sphere vectors answers nearest-node
//! queries.  Chord length is monotonic in great-circle distance, so the
//! R-tree's nearest neighbour is the haversine-nearest node.

use std::sync::atomic::{AtomicU64, Ordering};

use log::{debug, info, trace, warn};
use rstar::{PointDistance, RTree, RTreeObject, AABB};
use rustc_hash::FxHashMap;

use sr_core::{EdgeId, GeoPoint, NodeId, NodeKey, RoadId};

use crate::RoadSegment;

// ── R-tree node entry ─────────────────────────────────────────────────────────

#[derive(Clone)]
struct NodeEntry {
    point: [f64; 3],
    id: NodeId,
}

impl RTreeObject for NodeEntry {
    type Envelope = AABB<[f64; 3]>;
    fn envelope(&self) -> Self::Envelope {
        AABB::from_point(self.point)
    }
}

impl PointDistance for NodeEntry {
    fn distance_2(&self, point: &[f64; 3]) -> f64 {
        let dx = self.point[0] - point[0];
        let dy = self.point[1] - point[1];
        let dz = self.point[2] - point[2];
        dx * dx + dy * dy + dz * dz
    }
}

// ── EdgeView ──────────────────────────────────────────────────────────────────

/// Snapshot of one directed edge, read in a single pass so `weight` always
/// equals `distance_m × traffic_multiplier`.
#[derive(Clone, Debug, PartialEq)]
pub struct EdgeView<'a> {
    pub id: EdgeId,
    pub from: NodeId,
    pub to: NodeId,
    pub distance_m: f64,
    pub road_name: &'a str,
    pub traffic_multiplier: f64,
    pub weight: f64,
}

// ── RoadGraph ─────────────────────────────────────────────────────────────────

/// Directed road graph in CSR format with per-road traffic multipliers and a
/// spatial index for coordinate snapping.
///
/// Topology fields are `pub` for direct indexed access on hot paths.  Do not
/// construct directly; use [`RoadGraphBuilder`].
pub struct RoadGraph {
    // ── Node data ─────────────────────────────────────────────────────────
    /// Position of each node (the first coordinate seen for its key).
    pub node_pos: Vec<GeoPoint>,

    /// Canonical deduplication key of each node.
    pub node_keys: Vec<NodeKey>,

    // ── CSR edge adjacency ────────────────────────────────────────────────
    /// CSR row pointer, length `node_count + 1`.
    pub node_out_start: Vec<u32>,

    // ── Edge data (indexed by EdgeId) ─────────────────────────────────────
    pub edge_from: Vec<NodeId>,
    pub edge_to: Vec<NodeId>,
    /// Geodesic length of each edge in metres.
    pub edge_length_m: Vec<f64>,
    /// Interned road name of each edge.
    pub edge_road: Vec<RoadId>,

    // ── Roads ─────────────────────────────────────────────────────────────
    road_names: Vec<String>,
    road_index: FxHashMap<String, RoadId>,
    road_edge_count: Vec<u32>,
    road_multiplier: Vec<AtomicU64>,

    // ── Lookup ────────────────────────────────────────────────────────────
    key_index: FxHashMap<NodeKey, NodeId>,
    spatial_idx: RTree<NodeEntry>,
}

impl RoadGraph {
    /// A graph with no nodes.  Routing against it always degrades to the
    /// straight-line fallback.
    pub fn empty() -> Self {
        RoadGraphBuilder::new().build()
    }

    /// Build a graph from a full list of road segments.
    pub fn from_segments(segments: &[RoadSegment]) -> Self {
        let mut b = RoadGraphBuilder::new();
        for seg in segments {
            b.add_segment(seg);
        }
        b.build()
    }

    // ── Graph dimensions ──────────────────────────────────────────────────

    pub fn node_count(&self) -> usize {
        self.node_pos.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edge_to.len()
    }

    pub fn road_count(&self) -> usize {
        self.road_names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.node_pos.is_empty()
    }

    // ── Nodes ─────────────────────────────────────────────────────────────

    #[inline]
    pub fn node_pos(&self, node: NodeId) -> GeoPoint {
        self.node_pos[node.index()]
    }

    #[inline]
    pub fn node_key(&self, node: NodeId) -> NodeKey {
        self.node_keys[node.index()]
    }

    /// Resolve a canonical key to its node.
    pub fn find_node(&self, key: NodeKey) -> Option<NodeId> {
        self.key_index.get(&key).copied()
    }

    // ── Graph traversal ───────────────────────────────────────────────────

    /// Iterator over the `EdgeId`s of all outgoing edges from `node`.
    #[inline]
    pub fn out_edges(&self, node: NodeId) -> impl Iterator<Item = EdgeId> + '_ {
        let start = self.node_out_start[node.index()] as usize;
        let end   = self.node_out_start[node.index() + 1] as usize;
        (start..end).map(|i| EdgeId(i as u32))
    }

    #[inline]
    pub fn out_degree(&self, node: NodeId) -> usize {
        let start = self.node_out_start[node.index()] as usize;
        let end   = self.node_out_start[node.index() + 1] as usize;
        end - start
    }

    /// Iterator over every `EdgeId` in the graph.
    pub fn edges(&self) -> impl Iterator<Item = EdgeId> + '_ {
        (0..self.edge_count()).map(|i| EdgeId(i as u32))
    }

    // ── Edge attributes ───────────────────────────────────────────────────

    #[inline]
    pub fn road_name(&self, edge: EdgeId) -> &str {
        &self.road_names[self.edge_road[edge.index()].index()]
    }

    /// Current traffic multiplier of `edge` (≥ 1.0).
    #[inline]
    pub fn traffic_multiplier(&self, edge: EdgeId) -> f64 {
        self.road_multiplier(self.edge_road[edge.index()])
    }

    /// Traversal cost of `edge`: length × current multiplier.
    #[inline]
    pub fn weight(&self, edge: EdgeId) -> f64 {
        self.edge_length_m[edge.index()] * self.traffic_multiplier(edge)
    }

    pub fn edge(&self, edge: EdgeId) -> EdgeView<'_> {
        let i = edge.index();
        let distance_m = self.edge_length_m[i];
        let traffic_multiplier = self.traffic_multiplier(edge);
        EdgeView {
            id: edge,
            from: self.edge_from[i],
            to: self.edge_to[i],
            distance_m,
            road_name: self.road_name(edge),
            traffic_multiplier,
            weight: distance_m * traffic_multiplier,
        }
    }

    /// First edge from `from` to `to`, if any.
    pub fn edge_between(&self, from: NodeId, to: NodeId) -> Option<EdgeId> {
        self.out_edges(from).find(|e| self.edge_to[e.index()] == to)
    }

    // ── Traffic ───────────────────────────────────────────────────────────

    /// Look up the interned id of a road name.
    pub fn road_id(&self, road_name: &str) -> Option<RoadId> {
        self.road_index.get(road_name).copied()
    }

    #[inline]
    fn road_multiplier(&self, road: RoadId) -> f64 {
        f64::from_bits(self.road_multiplier[road.index()].load(Ordering::Relaxed))
    }

    /// Set the traffic multiplier of every edge named exactly `road_name`.
    ///
    /// Matching is by name, not location: two physically distinct roads
    /// sharing a name receive the same multiplier.  Multipliers below 1.0
    /// are raised to 1.0; non-finite ones are ignored.
    ///
    /// Returns the number of edges affected (0 for an unknown name).
    pub fn update_traffic(&self, road_name: &str, multiplier: f64) -> usize {
        let Some(road) = self.road_id(road_name) else {
            trace!("traffic for unknown road {road_name:?} ignored");
            return 0;
        };
        if !multiplier.is_finite() {
            warn!("non-finite traffic multiplier for {road_name:?} ignored");
            return 0;
        }
        let multiplier = if multiplier < 1.0 {
            debug!("traffic multiplier {multiplier} for {road_name:?} raised to 1.0");
            1.0
        } else {
            multiplier
        };

        self.road_multiplier[road.index()].store(multiplier.to_bits(), Ordering::Relaxed);
        self.road_edge_count[road.index()] as usize
    }

    /// Replace the whole traffic picture in one pass.
    ///
    /// Each road named in `updates` takes the last multiplier listed for it;
    /// every other road returns to 1.0.  Clamping and non-finite handling
    /// match [`update_traffic`](Self::update_traffic).  Each road is stored
    /// atomically on its own, so a concurrent search may see some roads from
    /// the old picture and some from the new.
    ///
    /// Returns the number of updates that named a known road.
    pub fn replace_traffic<'a>(&self, updates: impl IntoIterator<Item = (&'a str, f64)>) -> usize {
        let mut target = vec![1.0f64; self.road_names.len()];
        let mut applied = 0;
        for (road_name, multiplier) in updates {
            let Some(road) = self.road_id(road_name) else {
                trace!("traffic for unknown road {road_name:?} ignored");
                continue;
            };
            if !multiplier.is_finite() {
                warn!("non-finite traffic multiplier for {road_name:?} ignored");
                continue;
            }
            target[road.index()] = multiplier.max(1.0);
            applied += 1;
        }
        for (slot, m) in self.road_multiplier.iter().zip(target) {
            slot.store(m.to_bits(), Ordering::Relaxed);
        }
        applied
    }

    /// `true` if any road's multiplier exceeds `threshold`.
    pub fn has_congestion(&self, threshold: f64) -> bool {
        self.road_multiplier
            .iter()
            .any(|m| f64::from_bits(m.load(Ordering::Relaxed)) > threshold)
    }

    /// Return every road to a multiplier of 1.0.
    pub fn reset_traffic(&self) {
        for m in &self.road_multiplier {
            m.store(1.0f64.to_bits(), Ordering::Relaxed);
        }
    }

    // ── Spatial queries ───────────────────────────────────────────────────

    /// The node closest to `pos` by great-circle distance.
    ///
    /// Returns `None` only if the graph has no nodes.
    pub fn nearest_node(&self, pos: GeoPoint) -> Option<NodeId> {
        self.spatial_idx
            .nearest_neighbor(&pos.to_unit_vector())
            .map(|e| e.id)
    }
}

// ── RoadGraphBuilder ──────────────────────────────────────────────────────────

/// Construct a [`RoadGraph`] incrementally, then call [`build`](Self::build).
///
/// Nodes are deduplicated by [`NodeKey`]: adding a coordinate that rounds to
/// an existing key returns the existing `NodeId`.
///
/// # Example
///
/// ```
/// use sr_core::GeoPoint;
/// use sr_graph::{RoadGraphBuilder, RoadSegment};
///
/// let mut b = RoadGraphBuilder::new();
/// b.add_segment(&RoadSegment::new(
///     "Kalawad Road",
///     vec![GeoPoint::new(22.3039, 70.8022), GeoPoint::new(22.3050, 70.8050)],
/// ));
/// let graph = b.build();
/// assert_eq!(graph.node_count(), 2);
/// assert_eq!(graph.edge_count(), 2); // bidirectional
/// ```
pub struct RoadGraphBuilder {
    nodes:      Vec<GeoPoint>,
    keys:       Vec<NodeKey>,
    key_index:  FxHashMap<NodeKey, NodeId>,
    road_names: Vec<String>,
    road_index: FxHashMap<String, RoadId>,
    raw_edges:  Vec<RawEdge>,
}

struct RawEdge {
    from:     NodeId,
    to:       NodeId,
    length_m: f64,
    road:     RoadId,
}

impl RoadGraphBuilder {
    pub fn new() -> Self {
        Self {
            nodes:      Vec::new(),
            keys:       Vec::new(),
            key_index:  FxHashMap::default(),
            road_names: Vec::new(),
            road_index: FxHashMap::default(),
            raw_edges:  Vec::new(),
        }
    }

    /// Resolve `pos` to its node, creating one on first sight of its key.
    pub fn add_node(&mut self, pos: GeoPoint) -> NodeId {
        let key = pos.node_key();
        if let Some(&id) = self.key_index.get(&key) {
            return id;
        }
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(pos);
        self.keys.push(key);
        self.key_index.insert(key, id);
        id
    }

    fn intern_road(&mut self, name: &str) -> RoadId {
        if let Some(&id) = self.road_index.get(name) {
            return id;
        }
        let id = RoadId(self.road_names.len() as u32);
        self.road_names.push(name.to_owned());
        self.road_index.insert(name.to_owned(), id);
        id
    }

    /// Add a **directed** edge from `from` to `to`.
    ///
    /// Both ends must come from [`add_node`](Self::add_node); an edge with
    /// any other endpoint is dropped by [`build`](Self::build).
    pub fn add_directed_edge(&mut self, from: NodeId, to: NodeId, length_m: f64, road_name: &str) {
        let road = self.intern_road(road_name);
        self.raw_edges.push(RawEdge { from, to, length_m, road });
    }

    /// Add edges in **both directions** between `a` and `b`.
    pub fn add_road(&mut self, a: NodeId, b: NodeId, length_m: f64, road_name: &str) {
        self.add_directed_edge(a, b, length_m, road_name);
        self.add_directed_edge(b, a, length_m, road_name);
    }

    /// Add every consecutive coordinate pair of `segment` as a bidirectional
    /// edge pair with geodesic length.
    ///
    /// A segment with any unusable coordinate is dropped whole and `false`
    /// is returned.  Consecutive points collapsing to the same node add no
    /// edge.
    pub fn add_segment(&mut self, segment: &RoadSegment) -> bool {
        if !segment.is_valid() {
            warn!(
                "dropping road segment {:?}: invalid coordinate in polyline",
                segment.road_name()
            );
            return false;
        }
        if segment.polyline.len() < 2 {
            debug!("road segment {:?} has fewer than 2 points", segment.road_name());
            return false;
        }

        let name = segment.road_name().to_owned();
        for pair in segment.polyline.windows(2) {
            let a = self.add_node(pair[0]);
            let b = self.add_node(pair[1]);
            if a == b {
                continue;
            }
            let length_m = self.nodes[a.index()].distance_m(self.nodes[b.index()]);
            self.add_road(a, b, length_m, &name);
        }
        true
    }

    pub fn node_pos(&self, id: NodeId) -> GeoPoint {
        self.nodes[id.index()]
    }

    pub fn node_count(&self) -> usize { self.nodes.len() }
    pub fn edge_count(&self) -> usize { self.raw_edges.len() }

    /// Consume the builder and produce a [`RoadGraph`].
    ///
    /// Time complexity: O(E log E) for the edge sort + O(N log N) for the
    /// R-tree bulk load.
    pub fn build(self) -> RoadGraph {
        let node_count = self.nodes.len();

        // Edges naming a node the builder never created have no target.
        let mut raw = self.raw_edges;
        let added = raw.len();
        raw.retain(|e| e.from.index() < node_count && e.to.index() < node_count);
        if raw.len() < added {
            warn!("dropped {} edges with an unknown endpoint", added - raw.len());
        }
        let edge_count = raw.len();

        // Stable sort keeps per-node insertion order.
        raw.sort_by_key(|e| e.from.0);

        let edge_from:     Vec<NodeId> = raw.iter().map(|e| e.from).collect();
        let edge_to:       Vec<NodeId> = raw.iter().map(|e| e.to).collect();
        let edge_length_m: Vec<f64>    = raw.iter().map(|e| e.length_m).collect();
        let edge_road:     Vec<RoadId> = raw.iter().map(|e| e.road).collect();

        let mut node_out_start = vec![0u32; node_count + 1];
        for e in &raw {
            node_out_start[e.from.index() + 1] += 1;
        }
        for i in 1..=node_count {
            node_out_start[i] += node_out_start[i - 1];
        }
        debug_assert_eq!(node_out_start[node_count] as usize, edge_count);

        let mut road_edge_count = vec![0u32; self.road_names.len()];
        for e in &raw {
            road_edge_count[e.road.index()] += 1;
        }
        let road_multiplier = (0..self.road_names.len())
            .map(|_| AtomicU64::new(1.0f64.to_bits()))
            .collect();

        let entries: Vec<NodeEntry> = self
            .nodes
            .iter()
            .enumerate()
            .map(|(i, &pos)| NodeEntry {
                point: pos.to_unit_vector(),
                id: NodeId(i as u32),
            })
            .collect();
        let spatial_idx = RTree::bulk_load(entries);

        info!(
            "road graph built: {} nodes, {} edges, {} named roads",
            node_count,
            edge_count,
            self.road_names.len()
        );

        RoadGraph {
            node_pos: self.nodes,
            node_keys: self.keys,
            node_out_start,
            edge_from,
            edge_to,
            edge_length_m,
            edge_road,
            road_names: self.road_names,
            road_index: self.road_index,
            road_edge_count,
            road_multiplier,
            key_index: self.key_index,
            spatial_idx,
        }
    }
}

impl Default for RoadGraphBuilder {
    fn default() -> Self {
        Self::new()
    }
}
