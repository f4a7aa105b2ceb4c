//! Deterministic 2D graph layout and edge render weights.
//!
//! # Overview
//!
//! Node positions come from stress majorization over the all-pairs weighted
//! shortest-path distances (the Kamada–Kawai objective): the embedding is
//! iteratively pulled toward a state where Euclidean gaps match graph
//! distances, under the same inverse-weight cost convention as the
//! centrality metrics — strongly linked countries land close together.
//!
//! Everything is deterministic: nodes start on a circle in sorted country
//! order and the majorization update has no random component, so the same
//! graph always yields the same picture.
//!
//! Edge render weights are normalized into [0, 1] via
//! `(w − min) / (max − min)`; when every edge carries the same weight the
//! normalized value is defined as 0 rather than dividing by zero.
//!
//! The output is render-agnostic: coordinates plus per-edge visual weights,
//! for whatever drawing layer consumes them.

use serde::Serialize;
use std::f64::consts::TAU;
use tracing::{debug, instrument};

use crate::build::CountryGraph;
use crate::metrics::cost::shortest_path_costs;

/// Layout iteration knobs.
#[derive(Debug, Clone)]
pub struct LayoutConfig {
    /// Maximum majorization iterations. Default: 500.
    pub max_iter: usize,
    /// Stop once the largest node displacement in an iteration falls below
    /// this fraction of the layout scale. Default: 1e-4.
    pub tolerance: f64,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            max_iter: 500,
            tolerance: 1e-4,
        }
    }
}

/// A positioned node.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NodePosition {
    pub country: String,
    pub x: f64,
    pub y: f64,
}

/// An edge with its normalized render weight.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RenderEdge {
    pub source: String,
    pub target: String,
    pub weight: u32,
    /// `(weight − min) / (max − min)` over the graph's edges; 0 when the
    /// range is degenerate.
    pub visual_weight: f64,
}

/// Node coordinates plus per-edge render weights.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct LayoutResult {
    pub positions: Vec<NodePosition>,
    pub edges: Vec<RenderEdge>,
}

/// Compute the layout for a graph. An empty graph yields an empty result.
#[must_use]
#[instrument(skip(g, config))]
pub fn layout(g: &CountryGraph, config: &LayoutConfig) -> LayoutResult {
    let n = g.node_count();
    if n == 0 {
        return LayoutResult::default();
    }

    let edges = render_edges(g);

    // Countries in sorted order fix both the circle placement and the
    // output ordering.
    let countries = g.countries();
    let index_of: Vec<usize> = countries
        .iter()
        .map(|country| {
            g.node_index(country)
                .map(petgraph::graph::NodeIndex::index)
                .unwrap_or_default()
        })
        .collect();

    if n == 1 {
        return LayoutResult {
            positions: vec![NodePosition {
                country: countries[0].clone(),
                x: 0.0,
                y: 0.0,
            }],
            edges,
        };
    }

    let dist = distance_matrix(g, &index_of);

    // Deterministic start: unit circle in sorted country order.
    let mut xs: Vec<f64> = Vec::with_capacity(n);
    let mut ys: Vec<f64> = Vec::with_capacity(n);
    for i in 0..n {
        let angle = TAU * i as f64 / n as f64;
        xs.push(angle.cos());
        ys.push(angle.sin());
    }

    for iteration in 0..config.max_iter {
        let mut next_xs = xs.clone();
        let mut next_ys = ys.clone();
        let mut max_move = 0.0_f64;

        for i in 0..n {
            let mut numer_x = 0.0;
            let mut numer_y = 0.0;
            let mut denom = 0.0;

            for j in 0..n {
                if j == i {
                    continue;
                }
                let d = dist[i][j];
                let k = 1.0 / (d * d);

                let dx = xs[i] - xs[j];
                let dy = ys[i] - ys[j];
                let gap = dx.hypot(dy);
                if gap < 1e-9 {
                    continue;
                }

                numer_x += k * (xs[j] + d * dx / gap);
                numer_y += k * (ys[j] + d * dy / gap);
                denom += k;
            }

            if denom == 0.0 {
                continue;
            }

            let nx = numer_x / denom;
            let ny = numer_y / denom;
            max_move = max_move.max((nx - xs[i]).hypot(ny - ys[i]));
            next_xs[i] = nx;
            next_ys[i] = ny;
        }

        xs = next_xs;
        ys = next_ys;

        if max_move < config.tolerance {
            debug!(iteration, "layout converged");
            break;
        }
    }

    let positions = countries
        .into_iter()
        .enumerate()
        .map(|(i, country)| NodePosition {
            country,
            x: xs[i],
            y: ys[i],
        })
        .collect();

    LayoutResult { positions, edges }
}

/// Normalize every edge weight into [0, 1] over the graph's weight range.
#[must_use]
pub fn render_edges(g: &CountryGraph) -> Vec<RenderEdge> {
    let edges = g.edges();
    if edges.is_empty() {
        return Vec::new();
    }

    let min = edges.iter().map(|e| e.weight).min().unwrap_or(0);
    let max = edges.iter().map(|e| e.weight).max().unwrap_or(0);
    let range = f64::from(max) - f64::from(min);

    edges
        .into_iter()
        .map(|edge| {
            let visual_weight = if range > 0.0 {
                (f64::from(edge.weight) - f64::from(min)) / range
            } else {
                0.0
            };
            RenderEdge {
                source: edge.source,
                target: edge.target,
                weight: edge.weight,
                visual_weight,
            }
        })
        .collect()
}

/// Symmetric distance matrix over weighted shortest paths, in sorted-node
/// order. Unreachable pairs sit at twice the largest finite distance so the
/// layout keeps disconnected parts apart without blowing up the stress.
fn distance_matrix(g: &CountryGraph, index_of: &[usize]) -> Vec<Vec<f64>> {
    let n = index_of.len();

    // Directed distances keyed by petgraph index.
    let directed: Vec<Vec<f64>> = g
        .graph
        .node_indices()
        .map(|idx| shortest_path_costs(g, idx))
        .collect();

    let mut dist = vec![vec![0.0_f64; n]; n];
    let mut max_finite = 0.0_f64;

    for (row, &gi) in index_of.iter().enumerate() {
        for (col, &gj) in index_of.iter().enumerate() {
            if row == col {
                continue;
            }
            let d = directed[gi][gj].min(directed[gj][gi]);
            dist[row][col] = d;
            if d.is_finite() {
                max_finite = max_finite.max(d);
            }
        }
    }

    let fallback = if max_finite > 0.0 {
        2.0 * max_finite
    } else {
        1.0
    };

    for row in &mut dist {
        for d in row.iter_mut() {
            if !d.is_finite() {
                *d = fallback;
            }
        }
    }

    dist
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
