//! Presentation-side assembly of the centrality table.
//!
//! Runs every metric over one graph and flattens the results into
//! per-country rows: values rounded to two decimals, countries sorted
//! descending, and optional metrics (closeness for unreachable countries,
//! eigenvector for non-convergent runs) represented as absent rather than
//! silently zeroed.

use serde::Serialize;
use tracing::{instrument, warn};

use crate::build::CountryGraph;
use crate::metrics::betweenness::betweenness_centrality;
use crate::metrics::closeness::closeness_centrality;
use crate::metrics::clustering::clustering_coefficient;
use crate::metrics::degree::degree_centrality;
use crate::metrics::eigenvector::{
    DEFAULT_MAX_ITER, DEFAULT_TOLERANCE, eigenvector_centrality,
};
use crate::metrics::pagerank::{PageRankConfig, pagerank};

/// Tuning knobs for the full centrality computation.
#[derive(Debug, Clone)]
pub struct CentralityConfig {
    pub pagerank: PageRankConfig,
    pub eigenvector_max_iter: usize,
    pub eigenvector_tolerance: f64,
}

impl Default for CentralityConfig {
    fn default() -> Self {
        Self {
            pagerank: PageRankConfig::default(),
            eigenvector_max_iter: DEFAULT_MAX_ITER,
            eigenvector_tolerance: DEFAULT_TOLERANCE,
        }
    }
}

/// One country's centrality scores, rounded for presentation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CentralityRow {
    pub country: String,
    pub degree: f64,
    pub in_degree: f64,
    pub out_degree: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub closeness: Option<f64>,
    pub betweenness: f64,
    pub clustering: f64,
    pub pagerank: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub eigenvector: Option<f64>,
}

/// Compute every centrality metric and assemble the presentation table.
///
/// Countries are sorted descending by code. A zero-node graph yields an
/// empty table.
#[must_use]
#[instrument(skip(g, config))]
pub fn centrality_table(g: &CountryGraph, config: &CentralityConfig) -> Vec<CentralityRow> {
    if g.is_empty() {
        return Vec::new();
    }

    let degrees = degree_centrality(g);
    let closeness = closeness_centrality(g);
    let betweenness = betweenness_centrality(g);
    let clustering = clustering_coefficient(g);
    let pagerank = pagerank(g, &config.pagerank);

    let eigenvector = eigenvector_centrality(
        g,
        config.eigenvector_max_iter,
        config.eigenvector_tolerance,
    );
    if !eigenvector.converged {
        warn!(
            iterations = eigenvector.iterations,
            "eigenvector centrality did not converge; omitting the metric"
        );
    }

    let mut countries = g.countries();
    countries.sort_unstable_by(|a, b| b.cmp(a));

    countries
        .into_iter()
        .map(|country| {
            let metric = |map: &std::collections::HashMap<String, f64>| {
                map.get(&country).copied().unwrap_or(0.0)
            };

            CentralityRow {
                degree: round2(metric(&degrees.degree)),
                in_degree: round2(metric(&degrees.in_degree)),
                out_degree: round2(metric(&degrees.out_degree)),
                closeness: closeness.get(&country).copied().map(round2),
                betweenness: round2(metric(&betweenness)),
                clustering: round2(metric(&clustering)),
                pagerank: round2(metric(&pagerank.scores)),
                eigenvector: eigenvector
                    .converged
                    .then(|| round2(metric(&eigenvector.scores))),
                country,
            }
        })
        .collect()
}

/// Round to two decimal places for presentation output.
#[must_use]
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
