//! Closeness centrality over weighted shortest paths.
//!
//! # Definition
//!
//! For a node `u` with at least one reachable other node:
//!
//! ```text
//! closeness(u) = (n − 1) / Σ_v d(u, v)
//! ```
//!
//! where the sum ranges over the nodes reachable from `u` (outward along
//! sanction edges) and `d` uses the inverse-weight cost convention from
//! [`crate::metrics::cost`] — so a country whose sanction ties are heavier
//! reads as *closer* to the rest of the network, not further away.
//!
//! Nodes that reach nothing have no defined score and are simply absent
//! from the result map: absence is meaningful and must not be collapsed
//! to zero.

use std::collections::HashMap;

use tracing::instrument;

use crate::build::CountryGraph;
use crate::metrics::cost::shortest_path_costs;

/// Compute closeness centrality for every country that reaches at least one
/// other country. Countries with no outgoing reach are absent from the map.
#[must_use]
#[instrument(skip(g))]
pub fn closeness_centrality(g: &CountryGraph) -> HashMap<String, f64> {
    let n = g.node_count();
    let mut scores = HashMap::new();
    if n < 2 {
        return scores;
    }

    for idx in g.graph.node_indices() {
        let dist = shortest_path_costs(g, idx);

        let mut total = 0.0;
        let mut reachable = 0_usize;
        for (i, d) in dist.iter().enumerate() {
            if i == idx.index() || !d.is_finite() {
                continue;
            }
            total += d;
            reachable += 1;
        }

        if reachable == 0 {
            continue;
        }

        scores.insert(g.graph[idx].clone(), (n as f64 - 1.0) / total);
    }

    scores
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
