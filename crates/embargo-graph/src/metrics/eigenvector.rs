//! Weighted eigenvector centrality via power iteration.
//!
//! # Overview
//!
//! Eigenvector centrality scores a country by the scores of the countries
//! sanctioning it: incoming edges from high-scoring countries contribute
//! more, proportionally to edge weight. It is the dominant eigenvector of
//! the weighted adjacency matrix, accumulated along in-edges.
//!
//! # Convergence
//!
//! Power iteration is not guaranteed to converge on every directed graph —
//! acyclic graphs drain to zero and near-symmetric spectra oscillate. The
//! iteration is therefore capped (default 1000), and a run that does not
//! converge reports `converged = false`; the presentation layer omits the
//! whole metric for that request instead of failing the computation.
//! Partial centrality tables are a valid, expected outcome.
//!
//! An isolated country keeps score 0 in a convergent run — absence of
//! incident edges is represented as a defined zero, not a missing entry.

use std::collections::HashMap;

use petgraph::Direction;
use petgraph::visit::EdgeRef;
use tracing::instrument;

use crate::build::CountryGraph;

/// Iteration cap used by the analysis pipeline.
pub const DEFAULT_MAX_ITER: usize = 1000;

/// Convergence tolerance used by the analysis pipeline.
pub const DEFAULT_TOLERANCE: f64 = 1e-6;

/// Result of eigenvector centrality computation.
#[derive(Debug, Clone)]
pub struct EigenvectorResult {
    /// Eigenvector centrality scores: country code → score.
    pub scores: HashMap<String, f64>,
    /// Number of iterations performed.
    pub iterations: usize,
    /// Whether the iteration converged within the cap. When `false`, the
    /// scores are not meaningful and callers should omit the metric.
    pub converged: bool,
}

/// Compute weighted eigenvector centrality for every country.
#[must_use]
#[instrument(skip(g))]
pub fn eigenvector_centrality(
    g: &CountryGraph,
    max_iter: usize,
    tolerance: f64,
) -> EigenvectorResult {
    let n = g.node_count();

    if n == 0 {
        return EigenvectorResult {
            scores: HashMap::new(),
            iterations: 0,
            converged: true,
        };
    }

    let init = 1.0 / (n as f64).sqrt();
    let mut scores = vec![init; n];

    let mut iterations = 0;
    let mut converged = false;

    for _ in 0..max_iter {
        iterations += 1;

        let mut next = vec![0.0_f64; n];
        for node in g.graph.node_indices() {
            let vi = node.index();
            for edge in g.graph.edges_directed(node, Direction::Incoming) {
                next[vi] += f64::from(*edge.weight()) * scores[edge.source().index()];
            }
        }

        let norm: f64 = next.iter().map(|x| x * x).sum::<f64>().sqrt();
        if norm < 1e-12 {
            // The vector drained to zero (acyclic graph): no dominant
            // eigenvector to find.
            scores = next;
            break;
        }
        for x in &mut next {
            *x /= norm;
        }

        let diff: f64 = scores
            .iter()
            .zip(next.iter())
            .map(|(a, b)| (a - b).powi(2))
            .sum::<f64>()
            .sqrt();

        scores = next;

        if diff < tolerance {
            converged = true;
            break;
        }
    }

    let scores = g
        .graph
        .node_indices()
        .map(|idx| (g.graph[idx].clone(), scores[idx.index()]))
        .collect();

    EigenvectorResult {
        scores,
        iterations,
        converged,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_graph_converges() {
        let g = CountryGraph::from_edges(&[]);
        let result = eigenvector_centrality(&g, DEFAULT_MAX_ITER, DEFAULT_TOLERANCE);
        assert!(result.scores.is_empty());
        assert!(result.converged);
    }

    #[test]
    fn reciprocal_pair_scores_equally() {
        let g = CountryGraph::from_edges(&[("us", "ru", 3), ("ru", "us", 3)]);
        let result = eigenvector_centrality(&g, DEFAULT_MAX_ITER, DEFAULT_TOLERANCE);

        assert!(result.converged);
        assert!((result.scores["us"] - result.scores["ru"]).abs() < 1e-9);
        assert!(result.scores["us"] > 0.0);
    }

    #[test]
    fn equal_weight_cycle_scores_equally() {
        let g = CountryGraph::from_edges(&[("us", "ru", 2), ("ru", "cn", 2), ("cn", "us", 2)]);
        let result = eigenvector_centrality(&g, DEFAULT_MAX_ITER, DEFAULT_TOLERANCE);

        assert!(result.converged);
        for pair in [("us", "ru"), ("ru", "cn")] {
            assert!((result.scores[pair.0] - result.scores[pair.1]).abs() < 1e-6);
        }
    }

    #[test]
    fn isolated_node_scores_zero_in_convergent_run() {
        // A convergent core (reciprocal pair) plus an isolated country:
        // the isolated node gets a defined 0 rather than being dropped.
        let g = CountryGraph::from_parts(&["cn"], &[("us", "ru", 1), ("ru", "us", 1)]);
        assert_eq!(g.node_count(), 3);

        let result = eigenvector_centrality(&g, DEFAULT_MAX_ITER, DEFAULT_TOLERANCE);
        assert!(result.converged);
        assert!((result.scores["cn"]).abs() < 1e-12);
        assert!(result.scores["us"] > 0.0);
    }

    #[test]
    fn acyclic_graph_fails_to_converge() {
        // A pure chain drains the score vector to zero: the metric has no
        // fixed point and must report non-convergence instead of hanging.
        let g = CountryGraph::from_edges(&[("us", "ru", 1), ("ru", "cn", 1)]);
        let result = eigenvector_centrality(&g, DEFAULT_MAX_ITER, DEFAULT_TOLERANCE);
        assert!(!result.converged);
    }

    #[test]
    fn iteration_cap_is_respected() {
        let g = CountryGraph::from_edges(&[("us", "ru", 4), ("ru", "us", 1)]);
        let result = eigenvector_centrality(&g, 5, 0.0);
        assert!(result.iterations <= 5);
        assert!(!result.converged);
    }

    #[test]
    fn heavier_inbound_weight_raises_score() {
        // Reciprocal triangle with one country drawing double-weight
        // sanctions from both others.
        let g = CountryGraph::from_edges(&[
            ("us", "ru", 4),
            ("ru", "us", 1),
            ("cn", "ru", 4),
            ("ru", "cn", 1),
            ("us", "cn", 1),
            ("cn", "us", 1),
        ]);
        let result = eigenvector_centrality(&g, DEFAULT_MAX_ITER, DEFAULT_TOLERANCE);

        assert!(result.converged);
        assert!(result.scores["ru"] > result.scores["us"]);
        assert!(result.scores["ru"] > result.scores["cn"]);
    }
}
