//! Betweenness centrality via Brandes' algorithm with Dijkstra sources.
//!
//! # Overview
//!
//! Betweenness measures how often a country lies on the weighted shortest
//! paths between other country pairs. High-betweenness countries are the
//! brokers of the sanction network: much of the indirect pressure between
//! other pairs routes through them.
//!
//! # Algorithm
//!
//! Brandes (2001), generalized to weighted graphs:
//!
//! 1. For each source `s`, run Dijkstra under the inverse-weight cost
//!    convention, recording shortest-path counts (`sigma`) and predecessor
//!    lists.
//! 2. Accumulate dependency scores over nodes in reverse settlement order.
//! 3. Sum dependencies across all sources.
//!
//! Complexity: O(V · (E + V log V)).
//!
//! Scores are normalized by (n−1)(n−2), the number of ordered pairs a node
//! could mediate in a directed graph, so results are fractions in [0, 1].
//! Graphs with fewer than three nodes have no possible intermediaries and
//! every score is 0.

use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashMap};

use petgraph::Direction;
use petgraph::graph::NodeIndex;
use petgraph::visit::EdgeRef;
use tracing::instrument;

use crate::build::CountryGraph;
use crate::metrics::cost::traversal_cost;

/// Tolerance for recognizing two path costs as equal when counting
/// shortest paths.
const PATH_COST_EPSILON: f64 = 1e-12;

#[derive(Debug, Clone, Copy)]
struct QueueEntry {
    cost: f64,
    node: NodeIndex,
}

impl PartialEq for QueueEntry {
    fn eq(&self, other: &Self) -> bool {
        self.cost == other.cost && self.node == other.node
    }
}

impl Eq for QueueEntry {}

impl PartialOrd for QueueEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for QueueEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .cost
            .total_cmp(&self.cost)
            .then_with(|| other.node.index().cmp(&self.node.index()))
    }
}

/// Compute normalized betweenness centrality for every country.
#[must_use]
#[instrument(skip(g))]
pub fn betweenness_centrality(g: &CountryGraph) -> HashMap<String, f64> {
    let n = g.node_count();
    let mut cb = vec![0.0_f64; n];

    for s in g.graph.node_indices() {
        let si = s.index();

        // Dijkstra with shortest-path counting.
        let mut dist = vec![f64::INFINITY; n];
        let mut sigma = vec![0.0_f64; n];
        let mut predecessors: Vec<Vec<NodeIndex>> = vec![Vec::new(); n];
        let mut settled: Vec<NodeIndex> = Vec::with_capacity(n);
        let mut done = vec![false; n];

        dist[si] = 0.0;
        sigma[si] = 1.0;

        let mut heap = BinaryHeap::new();
        heap.push(QueueEntry { cost: 0.0, node: s });

        while let Some(QueueEntry { cost, node }) = heap.pop() {
            let vi = node.index();
            if done[vi] {
                continue;
            }
            done[vi] = true;
            settled.push(node);

            for edge in g.graph.edges_directed(node, Direction::Outgoing) {
                let next = edge.target();
                let wi = next.index();
                let alt = cost + traversal_cost(*edge.weight());

                if alt < dist[wi] - PATH_COST_EPSILON {
                    dist[wi] = alt;
                    sigma[wi] = sigma[vi];
                    predecessors[wi].clear();
                    predecessors[wi].push(node);
                    heap.push(QueueEntry {
                        cost: alt,
                        node: next,
                    });
                } else if (alt - dist[wi]).abs() <= PATH_COST_EPSILON {
                    // Another shortest path to `next` via `node`.
                    sigma[wi] += sigma[vi];
                    predecessors[wi].push(node);
                }
            }
        }

        // Dependency accumulation in reverse settlement order.
        let mut delta = vec![0.0_f64; n];
        while let Some(w) = settled.pop() {
            let wi = w.index();
            for &v in &predecessors[wi] {
                let vi = v.index();
                if sigma[wi] > 0.0 {
                    delta[vi] += (sigma[vi] / sigma[wi]) * (1.0 + delta[wi]);
                }
            }
            if wi != si {
                cb[wi] += delta[wi];
            }
        }
    }

    // Normalize to the fraction of ordered pairs mediated.
    let scale = if n > 2 {
        1.0 / ((n as f64 - 1.0) * (n as f64 - 2.0))
    } else {
        0.0
    };

    g.graph
        .node_indices()
        .map(|idx| (g.graph[idx].clone(), cb[idx.index()] * scale))
        .collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
