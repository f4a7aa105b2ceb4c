//! Weighted PageRank via the iterative power method.
//!
//! # Overview
//!
//! PageRank scores a country by the importance of the countries sanctioning
//! it: rank flows along edges in proportion to edge weight. A country
//! sanctioned heavily by otherwise-important countries ranks high.
//!
//! # Algorithm
//!
//! ```text
//! PR(v) = (1 − d) / N + d · Σ PR(u) · w(u→v) / out_weight(u)
//! ```
//!
//! with damping factor `d` (default 0.85). Countries with no outgoing edges
//! (dangling nodes) distribute their rank uniformly.
//!
//! The iteration always terminates: if the tolerance is not reached within
//! the iteration cap, the best iterate so far is returned with
//! `converged = false` rather than looping or failing.

use std::collections::HashMap;

use petgraph::Direction;
use petgraph::visit::EdgeRef;
use tracing::instrument;

use crate::build::CountryGraph;

/// Configuration for PageRank computation.
#[derive(Debug, Clone)]
pub struct PageRankConfig {
    /// Damping factor (probability of following an edge vs teleporting).
    /// Default: 0.85.
    pub damping: f64,
    /// Convergence threshold: stop when the L1 norm of the rank delta is
    /// below this. Default: 1e-6.
    pub tolerance: f64,
    /// Maximum number of iterations. Default: 100.
    pub max_iter: usize,
}

impl Default for PageRankConfig {
    fn default() -> Self {
        Self {
            damping: 0.85,
            tolerance: 1e-6,
            max_iter: 100,
        }
    }
}

/// Result of a PageRank computation.
#[derive(Debug, Clone)]
pub struct PageRankResult {
    /// PageRank scores: country code → score.
    pub scores: HashMap<String, f64>,
    /// Number of iterations performed.
    pub iterations: usize,
    /// Whether the algorithm converged within `max_iter`. When `false`,
    /// `scores` holds the best iterate reached at the cap.
    pub converged: bool,
}

/// Compute weighted PageRank for every country.
#[must_use]
#[instrument(skip(g, config))]
pub fn pagerank(g: &CountryGraph, config: &PageRankConfig) -> PageRankResult {
    let n = g.node_count();

    if n == 0 {
        return PageRankResult {
            scores: HashMap::new(),
            iterations: 0,
            converged: true,
        };
    }

    let n_f64 = n as f64;
    let base = (1.0 - config.damping) / n_f64;

    let out_weight: Vec<f64> = g
        .graph
        .node_indices()
        .map(|idx| {
            g.graph
                .edges_directed(idx, Direction::Outgoing)
                .map(|edge| f64::from(*edge.weight()))
                .sum()
        })
        .collect();

    let mut ranks = vec![1.0 / n_f64; n];
    let mut new_ranks = vec![0.0_f64; n];

    let mut iterations = 0;
    let mut converged = false;

    for _ in 0..config.max_iter {
        iterations += 1;

        for r in &mut new_ranks {
            *r = base;
        }

        for node in g.graph.node_indices() {
            let idx = node.index();

            if out_weight[idx] == 0.0 {
                // Dangling node: spread its rank across the whole graph.
                let share = config.damping * ranks[idx] / n_f64;
                for r in &mut new_ranks {
                    *r += share;
                }
                continue;
            }

            let budget = config.damping * ranks[idx] / out_weight[idx];
            for edge in g.graph.edges_directed(node, Direction::Outgoing) {
                new_ranks[edge.target().index()] += budget * f64::from(*edge.weight());
            }
        }

        let delta: f64 = ranks
            .iter()
            .zip(new_ranks.iter())
            .map(|(old, new)| (old - new).abs())
            .sum();

        std::mem::swap(&mut ranks, &mut new_ranks);

        if delta < config.tolerance {
            converged = true;
            break;
        }
    }

    let scores = g
        .graph
        .node_indices()
        .map(|idx| (g.graph[idx].clone(), ranks[idx.index()]))
        .collect();

    PageRankResult {
        scores,
        iterations,
        converged,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
