//! Degree centrality: in-, out-, and total degree normalized by (n−1).
//!
//! Degrees count edges, not weights: a country sanctioning three others has
//! out-degree 3 whether it sanctions three entities or three thousand.
//! Total degree is in + out, so its normalized value can exceed 1.0 on
//! dense graphs — the same convention the reference tooling uses.

use std::collections::HashMap;

use petgraph::Direction;

use crate::build::CountryGraph;

/// Per-country degree centrality scores.
#[derive(Debug, Clone, PartialEq)]
pub struct DegreeCentrality {
    /// Total degree (in + out) / (n−1).
    pub degree: HashMap<String, f64>,
    /// In-degree / (n−1): how many countries sanction this one.
    pub in_degree: HashMap<String, f64>,
    /// Out-degree / (n−1): how many countries this one sanctions.
    pub out_degree: HashMap<String, f64>,
}

/// Compute degree centrality for every country.
///
/// Graphs with fewer than two nodes have no meaningful normalization; every
/// score is 0.0 there.
#[must_use]
pub fn degree_centrality(g: &CountryGraph) -> DegreeCentrality {
    let n = g.node_count();
    let scale = if n > 1 { 1.0 / (n as f64 - 1.0) } else { 0.0 };

    let mut degree = HashMap::with_capacity(n);
    let mut in_degree = HashMap::with_capacity(n);
    let mut out_degree = HashMap::with_capacity(n);

    for idx in g.graph.node_indices() {
        let country = g.graph[idx].clone();
        let in_d = g
            .graph
            .neighbors_directed(idx, Direction::Incoming)
            .count();
        let out_d = g
            .graph
            .neighbors_directed(idx, Direction::Outgoing)
            .count();

        in_degree.insert(country.clone(), in_d as f64 * scale);
        out_degree.insert(country.clone(), out_d as f64 * scale);
        degree.insert(country, (in_d + out_d) as f64 * scale);
    }

    DegreeCentrality {
        degree,
        in_degree,
        out_degree,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
