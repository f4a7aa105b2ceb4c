//! Weighted directed clustering coefficient (Fagiolo, 2007).
//!
//! # Overview
//!
//! The clustering coefficient measures how densely a country's neighborhood
//! is interconnected: do the countries it exchanges sanctions with also
//! sanction each other? The directed weighted variant follows Fagiolo:
//!
//! ```text
//! Ŵ = W / max(W)                       (weights scaled into [0, 1])
//! S = Ŵ^(1/3) + (Ŵᵀ)^(1/3)
//! C_i = (S³)_ii / 2 / (d_i(d_i − 1) − 2 d_i↔)
//! ```
//!
//! where `d_i` is the total (in + out) degree and `d_i↔` counts reciprocal
//! neighbor pairs. The numerator counts weighted directed triangles through
//! `i` in all orientations; the denominator is the number of triangles the
//! node could possibly form. Nodes that cannot form any triangle
//! (denominator ≤ 0) score 0.

use std::collections::HashMap;

use petgraph::Direction;
use petgraph::visit::EdgeRef;
use tracing::instrument;

use crate::build::CountryGraph;

/// Compute the weighted directed clustering coefficient for every country.
#[must_use]
#[instrument(skip(g))]
pub fn clustering_coefficient(g: &CountryGraph) -> HashMap<String, f64> {
    let n = g.node_count();
    let mut scores = HashMap::with_capacity(n);
    if n == 0 {
        return scores;
    }

    let max_weight = g
        .graph
        .edge_references()
        .map(|edge| f64::from(*edge.weight()))
        .fold(0.0_f64, f64::max);

    if max_weight == 0.0 {
        for idx in g.graph.node_indices() {
            scores.insert(g.graph[idx].clone(), 0.0);
        }
        return scores;
    }

    // Dense symmetric matrix of cube-rooted scaled weights:
    // s[i][j] = (w_ij / max)^(1/3) + (w_ji / max)^(1/3).
    // Country graphs are small (one node per country), so O(n²) space and
    // the O(n³) triangle scan below are fine.
    let mut s = vec![vec![0.0_f64; n]; n];
    for edge in g.graph.edge_references() {
        let i = edge.source().index();
        let j = edge.target().index();
        let hat = (f64::from(*edge.weight()) / max_weight).cbrt();
        s[i][j] += hat;
        s[j][i] += hat;
    }

    for idx in g.graph.node_indices() {
        let i = idx.index();

        let out_neighbors: Vec<usize> = g
            .graph
            .neighbors_directed(idx, Direction::Outgoing)
            .map(petgraph::graph::NodeIndex::index)
            .collect();
        let in_neighbors: Vec<usize> = g
            .graph
            .neighbors_directed(idx, Direction::Incoming)
            .map(petgraph::graph::NodeIndex::index)
            .collect();

        let d_total = out_neighbors.len() + in_neighbors.len();
        let d_bidirectional = out_neighbors
            .iter()
            .filter(|j| in_neighbors.contains(j))
            .count();

        let possible =
            d_total as f64 * (d_total as f64 - 1.0) - 2.0 * d_bidirectional as f64;
        if possible <= 0.0 {
            scores.insert(g.graph[idx].clone(), 0.0);
            continue;
        }

        let mut triangles = 0.0;
        for j in 0..n {
            if j == i || s[i][j] == 0.0 {
                continue;
            }
            for k in 0..n {
                if k == i || k == j {
                    continue;
                }
                triangles += s[i][j] * s[j][k] * s[k][i];
            }
        }

        scores.insert(g.graph[idx].clone(), triangles / 2.0 / possible);
    }

    scores
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
