//! Routing trait and default Dijkstra implementation.
//!
//! # Pluggability
//!
//! The planner calls routing through the [`Router`] trait, so an A* or
//! contraction-hierarchy engine can replace [`DijkstraRouter`] without
//! touching the planner.
//!
//! # Cost units
//!
//! Costs are chosen by [`Weighting`]: live weights (metres × traffic
//! multiplier) or free-flow lengths (metres).  A live path's `total_weight`
//! is therefore "effective metres", not physical length.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use sr_core::{EdgeId, NodeId};

use crate::graph::RoadGraph;
use crate::{GraphError, GraphResult};

// ── Weighting ─────────────────────────────────────────────────────────────────

/// Which edge cost a search minimises.
#[derive(Copy, Clone, PartialEq, Eq, Debug, Default)]
pub enum Weighting {
    /// Length × current traffic multiplier.
    #[default]
    Traffic,
    /// Length only, as if every road were clear.
    FreeFlow,
}

// ── GraphPath ─────────────────────────────────────────────────────────────────

/// Result of a routing query.
#[derive(Debug, Clone, PartialEq)]
pub struct GraphPath {
    /// Nodes in travel order, `from` first and `to` last.
    pub nodes: Vec<NodeId>,
    /// Edges traversed, `nodes.len() - 1` of them.
    pub edges: Vec<EdgeId>,
    /// Sum of edge weights at search time.
    pub total_weight: f64,
}

impl GraphPath {
    /// `true` if the source and destination are the same node.
    pub fn is_trivial(&self) -> bool {
        self.edges.is_empty()
    }

    /// Sum of physical edge lengths in metres.
    pub fn length_m(&self, graph: &RoadGraph) -> f64 {
        self.edges.iter().map(|e| graph.edge_length_m[e.index()]).sum()
    }
}

// ── Router trait ──────────────────────────────────────────────────────────────

/// Pluggable shortest-path engine.
///
/// Implementations must be `Send + Sync`: one router serves every concurrent
/// route request.
pub trait Router: Send + Sync {
    /// Compute a least-weight path from `from` to `to`.
    ///
    /// `from == to` yields a trivial single-node path rather than an error.
    fn route(
        &self,
        graph: &RoadGraph,
        from: NodeId,
        to: NodeId,
        weighting: Weighting,
    ) -> GraphResult<GraphPath>;
}

// ── DijkstraRouter ────────────────────────────────────────────────────────────

/// Dijkstra's algorithm with lazy deletion.
///
/// Stale heap entries are skipped through the visited set instead of a
/// decrease-key.  Ties between equal-cost candidates resolve in heap order,
/// which is not guaranteed stable.
#[derive(Clone, Copy, Debug, Default)]
pub struct DijkstraRouter;

impl Router for DijkstraRouter {
    fn route(
        &self,
        graph: &RoadGraph,
        from: NodeId,
        to: NodeId,
        weighting: Weighting,
    ) -> GraphResult<GraphPath> {
        dijkstra(graph, from, to, weighting)
    }
}

// ── Dijkstra internals ────────────────────────────────────────────────────────

#[inline]
fn edge_cost(graph: &RoadGraph, edge: EdgeId, weighting: Weighting) -> f64 {
    match weighting {
        Weighting::Traffic  => graph.weight(edge),
        Weighting::FreeFlow => graph.edge_length_m[edge.index()],
    }
}

#[derive(Copy, Clone, PartialEq)]
struct State {
    cost: f64,
    node: NodeId,
}

impl Eq for State {}

impl Ord for State {
    fn cmp(&self, other: &Self) -> Ordering {
        // Min-heap by cost.
        other.cost.total_cmp(&self.cost)
    }
}

impl PartialOrd for State {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

fn dijkstra(
    graph: &RoadGraph,
    from: NodeId,
    to: NodeId,
    weighting: Weighting,
) -> GraphResult<GraphPath> {
    let n = graph.node_count();
    for id in [from, to] {
        if id.index() >= n {
            return Err(GraphError::NodeNotFound(id));
        }
    }

    if from == to {
        return Ok(GraphPath { nodes: vec![from], edges: vec![], total_weight: 0.0 });
    }

    let mut dist      = vec![f64::INFINITY; n];
    let mut prev_edge = vec![EdgeId::INVALID; n];
    let mut visited   = vec![false; n];

    dist[from.index()] = 0.0;

    let mut heap = BinaryHeap::new();
    heap.push(State { cost: 0.0, node: from });

    while let Some(State { cost, node }) = heap.pop() {
        if visited[node.index()] {
            continue;
        }
        visited[node.index()] = true;

        if node == to {
            return Ok(reconstruct(graph, &prev_edge, from, to, cost));
        }

        for edge in graph.out_edges(node) {
            let neighbor = graph.edge_to[edge.index()];
            if visited[neighbor.index()] {
                continue;
            }
            let new_cost = cost + edge_cost(graph, edge, weighting);
            if new_cost < dist[neighbor.index()] {
                dist[neighbor.index()] = new_cost;
                prev_edge[neighbor.index()] = edge;
                heap.push(State { cost: new_cost, node: neighbor });
            }
        }
    }

    Err(GraphError::NoRoute { from, to })
}

fn reconstruct(
    graph: &RoadGraph,
    prev_edge: &[EdgeId],
    from: NodeId,
    to: NodeId,
    total_weight: f64,
) -> GraphPath {
    let mut edges = Vec::new();
    let mut nodes = vec![to];
    let mut cur = to;
    while cur != from {
        let e = prev_edge[cur.index()];
        if e == EdgeId::INVALID {
            break;
        }
        edges.push(e);
        cur = graph.edge_from[e.index()];
        nodes.push(cur);
    }
    edges.reverse();
    nodes.reverse();
    GraphPath { nodes, edges, total_weight }
}
