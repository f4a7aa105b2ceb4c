//! Analysis request assembly: graph → centrality → layout in one call.
//!
//! # Overview
//!
//! One analysis request builds its own graph from the current relation-row
//! set, computes the centrality table and the layout over it, and hands the
//! combined payload back. Nothing is persisted: the graph and everything
//! derived from it live exactly as long as the request.
//!
//! An empty graph (no rows match the filter) flows through as an empty
//! result — empty layout, no edges, no centrality rows — never an error.

use anyhow::Result;
use rusqlite::Connection;
use serde::Serialize;
use tracing::{info, instrument};

use embargo_core::model::RelationFilter;

use crate::build::CountryGraph;
use crate::layout::{LayoutConfig, LayoutResult, NodePosition, RenderEdge, layout};
use crate::metrics::table::{CentralityConfig, CentralityRow, centrality_table};

/// Tuning knobs for one analysis request.
#[derive(Debug, Clone, Default)]
pub struct AnalysisConfig {
    pub centrality: CentralityConfig,
    pub layout: LayoutConfig,
}

/// The complete payload for one analysis request.
///
/// `layout` and `centralities` cover the same country set; `edges_render`
/// carries the raw and normalized weight per directed country pair.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AnalysisResult {
    pub layout: Vec<NodePosition>,
    pub edges_render: Vec<RenderEdge>,
    pub centralities: Vec<CentralityRow>,
}

impl AnalysisResult {
    /// `true` when no country matched the request's filter.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.layout.is_empty()
    }
}

/// Run the full analysis over a graph already in hand.
#[must_use]
pub fn analyze_graph(g: &CountryGraph, config: &AnalysisConfig) -> AnalysisResult {
    let LayoutResult { positions, edges } = layout(g, &config.layout);

    AnalysisResult {
        layout: positions,
        edges_render: edges,
        centralities: centrality_table(g, &config.centrality),
    }
}

/// Build the filtered country graph from the store and analyze it.
///
/// # Errors
///
/// Returns an error if the graph query fails; an empty match is a valid
/// (empty) result, not an error.
#[instrument(skip(conn, filter, config))]
pub fn analyze(
    conn: &Connection,
    filter: &RelationFilter,
    config: &AnalysisConfig,
) -> Result<AnalysisResult> {
    let graph = CountryGraph::from_store(conn, filter)?;

    info!(
        nodes = graph.node_count(),
        edges = graph.edge_count(),
        "analysis graph ready"
    );

    Ok(analyze_graph(&graph, config))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
