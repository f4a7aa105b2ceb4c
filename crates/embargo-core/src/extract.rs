//! Relation extraction: the entity/dataset join producing relation rows.
//!
//! # Overview
//!
//! For every entity, each dataset membership is joined against the stored
//! catalogue: the dataset's publisher country becomes `source_country` and
//! the entity's own declared countries become `target_country` values. The
//! whole relation-row set is recomputed in one transaction whenever
//! ingestion changes — relation rows carry no identity of their own.
//!
//! ## Join rules
//!
//! - Datasets of type `external` and datasets without a publisher country
//!   contribute nothing.
//! - Target countries come from the `country` property; only when that is
//!   absent does the `jurisdiction` property stand in (never both).
//! - Rows are deduplicated by (entity, dataset, target country); an entity
//!   with N distinct target countries and M qualifying datasets yields at
//!   most N×M rows.
//!
//! Re-running on unchanged inputs yields an identical row multiset, so the
//! extractor can be invoked after every ingest without bookkeeping.

use anyhow::{Context, Result};
use rusqlite::Connection;
use std::collections::{HashMap, HashSet};
use tracing::{info, instrument};

use crate::model::RelationRow;
use crate::store::query;

/// Outcome of one extraction run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExtractReport {
    /// Datasets that qualify as relation sources (non-external, with a
    /// publisher country).
    pub source_datasets: usize,
    /// Entities scanned.
    pub entities: usize,
    /// Relation rows written.
    pub rows: usize,
}

/// Recompute the `relation_rows` table from the current entity and dataset
/// sets.
///
/// # Errors
///
/// Returns an error if a store read/write fails or a stored JSON column is
/// corrupt.
#[instrument(skip(conn))]
pub fn extract_relations(conn: &mut Connection) -> Result<ExtractReport> {
    let datasets = query::load_datasets(conn).context("load dataset catalogue")?;

    let mut publishers: HashMap<String, String> = HashMap::new();
    for dataset in &datasets {
        if !dataset.contributes_relations() {
            continue;
        }
        if let Some(country) = dataset.publisher_country() {
            publishers.insert(dataset.name.clone(), country.to_string());
        }
    }

    let mut report = ExtractReport {
        source_datasets: publishers.len(),
        ..ExtractReport::default()
    };

    let tx = conn.transaction().context("begin extraction transaction")?;
    tx.execute("DELETE FROM relation_rows", [])
        .context("clear relation rows")?;

    {
        let mut stmt = tx
            .prepare(
                "SELECT id, caption, schema, properties, datasets,
                        first_seen, last_seen, last_change, target, industry
                 FROM entities
                 ORDER BY id",
            )
            .context("prepare entity scan")?;
        let mut entity_rows = stmt.query([]).context("execute entity scan")?;

        while let Some(row) = entity_rows.next().context("read entity row")? {
            report.entities += 1;

            let id: String = row.get(0)?;
            let caption: String = row.get(1)?;
            let schema: String = row.get(2)?;
            let properties: String = row.get(3)?;
            let memberships: String = row.get(4)?;
            let first_seen: Option<String> = row.get(5)?;
            let last_seen: Option<String> = row.get(6)?;
            let last_change: Option<String> = row.get(7)?;
            let target: bool = row.get(8)?;
            let industry: Option<String> = row.get(9)?;

            let properties: serde_json::Value = serde_json::from_str(&properties)
                .with_context(|| format!("parse properties JSON for entity {id}"))?;
            let memberships: Vec<String> = serde_json::from_str(&memberships)
                .with_context(|| format!("parse dataset list for entity {id}"))?;

            let targets = target_countries(&properties);
            if targets.is_empty() {
                continue;
            }

            // Dedup key within one entity: (dataset, target country).
            let mut seen: HashSet<(String, String)> = HashSet::new();

            for dataset in &memberships {
                let Some(source_country) = publishers.get(dataset) else {
                    continue;
                };

                for target_country in &targets {
                    if !seen.insert((dataset.clone(), target_country.clone())) {
                        continue;
                    }

                    query::insert_relation_row(
                        &tx,
                        &RelationRow {
                            id: id.clone(),
                            caption: caption.clone(),
                            schema: schema.clone(),
                            target_country: target_country.clone(),
                            source_country: source_country.clone(),
                            first_seen: first_seen.clone(),
                            last_seen: last_seen.clone(),
                            last_change: last_change.clone(),
                            target,
                            industry: industry.clone(),
                        },
                    )?;
                    report.rows += 1;
                }
            }
        }
    }

    tx.commit().context("commit extraction")?;

    info!(
        source_datasets = report.source_datasets,
        entities = report.entities,
        rows = report.rows,
        "relation extraction finished"
    );

    Ok(report)
}

/// Declared target countries for one entity: the `country` property values,
/// or the `jurisdiction` values only when `country` yields none.
fn target_countries(properties: &serde_json::Value) -> Vec<String> {
    let countries = string_values(properties, "country");
    if countries.is_empty() {
        string_values(properties, "jurisdiction")
    } else {
        countries
    }
}

fn string_values(properties: &serde_json::Value, key: &str) -> Vec<String> {
    properties
        .get(key)
        .and_then(serde_json::Value::as_array)
        .map(|values| {
            values
                .iter()
                .filter_map(serde_json::Value::as_str)
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
