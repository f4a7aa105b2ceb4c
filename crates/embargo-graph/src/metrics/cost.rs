//! The edge cost convention and weighted shortest-path primitive.
//!
//! # Cost convention
//!
//! Edge weights count sanctioned entities, so a heavier edge means a
//! *stronger* tie. Distance-based metrics (closeness, betweenness, layout)
//! therefore price an edge as the **inverse** of its weight:
//!
//! ```text
//! cost(edge) = 1 / weight
//! ```
//!
//! More sanctioned entities ⇒ shorter distance. Feeding raw weights into a
//! shortest-path search would silently invert the meaning of every
//! distance-based metric (heavily-linked countries would read as far apart),
//! so this is the one place the conversion happens and every traversal goes
//! through it.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use petgraph::Direction;
use petgraph::graph::NodeIndex;
use petgraph::visit::EdgeRef;

use crate::build::CountryGraph;

/// Traversal cost of an edge with the given entity-count weight.
///
/// Weights in a built graph are always ≥ 1, so the result is finite.
#[must_use]
pub fn traversal_cost(weight: u32) -> f64 {
    1.0 / f64::from(weight)
}

/// Min-heap entry for Dijkstra: ordered by cost ascending, with the node
/// index as a deterministic tiebreaker.
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
        // Reversed so the std max-heap pops the cheapest entry first.
        other
            .cost
            .total_cmp(&self.cost)
            .then_with(|| other.node.index().cmp(&self.node.index()))
    }
}

/// Single-source weighted shortest-path costs from `source` to every node.
///
/// Returns a vector indexed by `NodeIndex::index()`; unreachable nodes hold
/// `f64::INFINITY` and the source itself holds `0.0`.
pub(crate) fn shortest_path_costs(g: &CountryGraph, source: NodeIndex) -> Vec<f64> {
    let n = g.node_count();
    let mut dist = vec![f64::INFINITY; n];
    dist[source.index()] = 0.0;

    let mut heap = BinaryHeap::new();
    heap.push(QueueEntry {
        cost: 0.0,
        node: source,
    });

    while let Some(QueueEntry { cost, node }) = heap.pop() {
        if cost > dist[node.index()] {
            continue; // stale entry
        }

        for edge in g.graph.edges_directed(node, Direction::Outgoing) {
            let next = edge.target();
            let next_cost = cost + traversal_cost(*edge.weight());
            if next_cost < dist[next.index()] {
                dist[next.index()] = next_cost;
                heap.push(QueueEntry {
                    cost: next_cost,
                    node: next,
                });
            }
        }
    }

    dist
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn heavier_edges_are_cheaper() {
        assert!(traversal_cost(10) < traversal_cost(1));
        assert!((traversal_cost(1) - 1.0).abs() < f64::EPSILON);
        assert!((traversal_cost(4) - 0.25).abs() < f64::EPSILON);
    }

    #[test]
    fn shortest_paths_respect_edge_direction() {
        let g = CountryGraph::from_edges(&[("us", "ru", 1)]);
        let us = g.node_index("us").expect("us node");
        let ru = g.node_index("ru").expect("ru node");

        let from_us = shortest_path_costs(&g, us);
        assert!((from_us[ru.index()] - 1.0).abs() < 1e-12);

        let from_ru = shortest_path_costs(&g, ru);
        assert!(from_ru[us.index()].is_infinite(), "no reverse edge");
    }

    #[test]
    fn heavy_detour_beats_light_direct_edge() {
        // Direct us→cn weight 1 (cost 1.0); detour via ru with weight-4
        // edges (cost 0.25 + 0.25 = 0.5) must win.
        let g = CountryGraph::from_edges(&[("us", "cn", 1), ("us", "ru", 4), ("ru", "cn", 4)]);
        let us = g.node_index("us").expect("us node");
        let cn = g.node_index("cn").expect("cn node");

        let dist = shortest_path_costs(&g, us);
        assert!((dist[cn.index()] - 0.5).abs() < 1e-12);
    }

    #[test]
    fn source_distance_is_zero() {
        let g = CountryGraph::from_edges(&[("us", "ru", 2)]);
        let us = g.node_index("us").expect("us node");
        let dist = shortest_path_costs(&g, us);
        assert!((dist[us.index()]).abs() < f64::EPSILON);
    }
}
