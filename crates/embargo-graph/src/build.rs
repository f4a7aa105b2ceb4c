//! Country graph construction from the relation store.
//!
//! # Overview
//!
//! This module queries the `relation_rows` table and builds a
//! [`petgraph`]-backed weighted directed graph suitable for the centrality
//! and layout computations. Nodes are country codes; an edge `A → B` means
//! "A sanctions entities in B", weighted by the number of **distinct**
//! entities behind that pair — relation-row multiplicity (one row per
//! contributing dataset and target country) must never inflate the weight.
//!
//! Self-loops (a country sanctioning its own entities) are excluded. When a
//! country allow-list is supplied it restricts the induced subgraph: both
//! endpoints of an edge must be listed.
//!
//! A filter that matches nothing produces an empty graph, which every
//! downstream consumer accepts and maps to empty output.

#![allow(clippy::module_name_repetitions)]

use std::collections::HashMap;

use anyhow::{Context, Result};
use petgraph::Direction;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;
use rusqlite::{Connection, params_from_iter, types::ToSql};
use tracing::{debug, instrument};

use embargo_core::model::RelationFilter;
use embargo_core::store::query::push_filter_conditions;

/// One weighted edge of the country graph.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GraphEdge {
    pub source: String,
    pub target: String,
    pub weight: u32,
}

/// The weighted directed "who sanctions whom" graph.
///
/// Nodes are country codes (strings). The petgraph representation is an
/// internal detail; callers interact through country codes and the
/// accessors here, so the backing structure can change without touching
/// the metric implementations.
#[derive(Debug, Default)]
pub struct CountryGraph {
    /// Directed graph: nodes = country codes, edge weights = distinct
    /// entity counts.
    pub graph: DiGraph<String, u32>,
    /// Mapping from country code to petgraph `NodeIndex`.
    pub node_map: HashMap<String, NodeIndex>,
}

impl CountryGraph {
    /// Build a [`CountryGraph`] by aggregating `relation_rows` in `conn`
    /// under `filter`.
    ///
    /// # Errors
    ///
    /// Returns an error if the SQLite query fails.
    #[instrument(skip(conn, filter))]
    pub fn from_store(conn: &Connection, filter: &RelationFilter) -> Result<Self> {
        let mut conditions = vec!["source_country <> target_country".to_string()];
        let mut params: Vec<Box<dyn ToSql>> = Vec::new();
        push_filter_conditions(filter, &mut conditions, &mut params);

        let sql = format!(
            "SELECT source_country, target_country, COUNT(DISTINCT id)
             FROM relation_rows
             WHERE {}
             GROUP BY source_country, target_country
             ORDER BY source_country, target_country",
            conditions.join(" AND ")
        );

        let mut stmt = conn
            .prepare(&sql)
            .with_context(|| format!("prepare edge aggregation query: {sql}"))?;

        let params_ref: Vec<&dyn ToSql> = params.iter().map(AsRef::as_ref).collect();
        let rows = stmt
            .query_map(params_from_iter(params_ref), |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, i64>(2)?,
                ))
            })
            .context("execute edge aggregation query")?;

        let mut graph = Self::default();
        for row in rows {
            let (source, target, weight) = row.context("read edge row")?;
            let weight = u32::try_from(weight).context("edge weight out of range")?;
            graph.add_edge(&source, &target, weight);
        }

        debug!(
            nodes = graph.node_count(),
            edges = graph.edge_count(),
            "built country graph"
        );

        Ok(graph)
    }

    /// Build a graph directly from an edge list.
    ///
    /// Applies the same hygiene as the store path: self-loops and
    /// zero-weight edges are dropped, and a repeated (source, target) pair
    /// keeps its first weight.
    #[must_use]
    pub fn from_edges(edges: &[(&str, &str, u32)]) -> Self {
        Self::from_parts(&[], edges)
    }

    /// Build a graph from an explicit node list plus an edge list.
    ///
    /// Unlike [`Self::from_edges`], countries without any surviving edge
    /// (isolated nodes) can be represented this way.
    #[must_use]
    pub fn from_parts(countries: &[&str], edges: &[(&str, &str, u32)]) -> Self {
        let mut graph = Self::default();
        for country in countries {
            graph.intern(country);
        }
        for (source, target, weight) in edges {
            graph.add_edge(source, target, *weight);
        }
        graph
    }

    fn add_edge(&mut self, source: &str, target: &str, weight: u32) {
        if source == target || weight == 0 {
            return;
        }

        let source_idx = self.intern(source);
        let target_idx = self.intern(target);

        if self.graph.find_edge(source_idx, target_idx).is_none() {
            self.graph.add_edge(source_idx, target_idx, weight);
        }
    }

    fn intern(&mut self, country: &str) -> NodeIndex {
        if let Some(idx) = self.node_map.get(country) {
            return *idx;
        }
        let idx = self.graph.add_node(country.to_string());
        self.node_map.insert(country.to_string(), idx);
        idx
    }

    /// Return the number of countries in the graph.
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    /// Return the number of directed country pairs.
    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// `true` when the graph has no nodes at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.graph.node_count() == 0
    }

    /// Look up the `NodeIndex` for a country code.
    #[must_use]
    pub fn node_index(&self, country: &str) -> Option<NodeIndex> {
        self.node_map.get(country).copied()
    }

    /// Return the country code label for a node.
    #[must_use]
    pub fn country(&self, idx: NodeIndex) -> Option<&str> {
        self.graph.node_weight(idx).map(String::as_str)
    }

    /// Country codes in ascending order.
    #[must_use]
    pub fn countries(&self) -> Vec<String> {
        let mut countries: Vec<String> = self.node_map.keys().cloned().collect();
        countries.sort_unstable();
        countries
    }

    /// Weight of the edge `source → target`, if present.
    #[must_use]
    pub fn weight(&self, source: &str, target: &str) -> Option<u32> {
        let source_idx = self.node_index(source)?;
        let target_idx = self.node_index(target)?;
        self.graph
            .find_edge(source_idx, target_idx)
            .and_then(|edge| self.graph.edge_weight(edge))
            .copied()
    }

    /// All edges, sorted by (source, target) for deterministic output.
    #[must_use]
    pub fn edges(&self) -> Vec<GraphEdge> {
        let mut edges: Vec<GraphEdge> = self
            .graph
            .edge_references()
            .map(|edge| GraphEdge {
                source: self.graph[edge.source()].clone(),
                target: self.graph[edge.target()].clone(),
                weight: *edge.weight(),
            })
            .collect();
        edges.sort_by(|a, b| (&a.source, &a.target).cmp(&(&b.source, &b.target)));
        edges
    }

    /// Sum of outgoing edge weights for a node.
    #[must_use]
    pub fn out_weight(&self, idx: NodeIndex) -> u64 {
        self.graph
            .edges_directed(idx, Direction::Outgoing)
            .map(|edge| u64::from(*edge.weight()))
            .sum()
    }

    /// Sum of incoming edge weights for a node.
    #[must_use]
    pub fn in_weight(&self, idx: NodeIndex) -> u64 {
        self.graph
            .edges_directed(idx, Direction::Incoming)
            .map(|edge| u64::from(*edge.weight()))
            .sum()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
