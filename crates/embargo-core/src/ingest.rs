//! Streaming ingestion of newline-delimited entity records.
//!
//! # Overview
//!
//! Upstream entity exports are NDJSON files that routinely hold millions of
//! records, so ingestion reads one line at a time from any [`BufRead`] and
//! never materializes the file: memory use is O(1) in file size.
//!
//! Writes are committed in checkpoint-sized batches. An aborted run loses at
//! most the current batch; everything before the last checkpoint stays
//! durable and re-running skips already-present ids.
//!
//! # Malformed records
//!
//! Whether a malformed line aborts the run or is skipped is an explicit
//! policy, not an accident of error propagation: [`MalformedPolicy::Fail`]
//! aborts with line-number context, [`MalformedPolicy::Skip`] (the default)
//! logs the line and counts it in the report.

use anyhow::{Context, Result};
use rusqlite::Connection;
use serde::Deserialize;
use std::collections::BTreeSet;
use std::io::BufRead;
use tracing::{info, instrument, warn};

use crate::model::{Entity, truncate_caption};
use crate::store::query;

/// What to do with a line that fails to parse.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum MalformedPolicy {
    /// Abort the whole run on the first malformed line.
    Fail,
    /// Log the line, count it, and continue.
    #[default]
    Skip,
}

/// Ingestion tuning knobs.
#[derive(Debug, Clone)]
pub struct IngestConfig {
    pub malformed: MalformedPolicy,
    /// Lines per committed batch.
    pub checkpoint_interval: usize,
    /// Lines between progress log records.
    pub progress_interval: usize,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            malformed: MalformedPolicy::default(),
            checkpoint_interval: 50_000,
            progress_interval: 100_000,
        }
    }
}

/// Outcome of one ingestion run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IngestReport {
    /// Non-blank lines consumed.
    pub total_lines: usize,
    /// Entities newly written.
    pub ingested: usize,
    /// Lines rejected by parsing (only under [`MalformedPolicy::Skip`]).
    pub skipped_invalid: usize,
    /// Lines whose entity id was already present.
    pub skipped_existing: usize,
    /// Distinct schema tags seen across ingested records.
    pub schemas: BTreeSet<String>,
}

/// One NDJSON entity record as it appears on the wire.
#[derive(Debug, Deserialize)]
struct EntityRecord {
    id: String,
    caption: String,
    schema: String,
    #[serde(default)]
    properties: serde_json::Value,
    #[serde(default)]
    referents: serde_json::Value,
    #[serde(default)]
    datasets: Vec<String>,
    #[serde(default)]
    first_seen: Option<String>,
    #[serde(default)]
    last_seen: Option<String>,
    #[serde(default)]
    last_change: Option<String>,
    #[serde(default)]
    target: bool,
}

impl EntityRecord {
    fn into_entity(self) -> Entity {
        Entity {
            caption: truncate_caption(&self.caption),
            id: self.id,
            schema: self.schema,
            properties: self.properties,
            referents: self.referents,
            datasets: self.datasets,
            first_seen: self.first_seen,
            last_seen: self.last_seen,
            last_change: self.last_change,
            target: self.target,
            industry: None,
        }
    }
}

/// Stream NDJSON entity records from `reader` into the store.
///
/// # Errors
///
/// Returns an error when reading fails, when a store write fails, or — under
/// [`MalformedPolicy::Fail`] — when a line does not parse.
#[instrument(skip(conn, reader, config))]
pub fn ingest_entities(
    conn: &mut Connection,
    reader: impl BufRead,
    config: &IngestConfig,
) -> Result<IngestReport> {
    let mut report = IngestReport::default();
    let checkpoint_interval = config.checkpoint_interval.max(1);

    let mut tx = conn.transaction().context("begin ingest transaction")?;
    let mut since_checkpoint = 0_usize;

    for (line_no, line) in reader.lines().enumerate() {
        let line_no = line_no + 1;
        let raw = line.with_context(|| format!("read entity line {line_no}"))?;
        if raw.trim().is_empty() {
            continue;
        }

        report.total_lines += 1;

        let record: EntityRecord = match serde_json::from_str(&raw) {
            Ok(record) => record,
            Err(err) => match config.malformed {
                MalformedPolicy::Fail => {
                    return Err(err)
                        .with_context(|| format!("parse entity record at line {line_no}"));
                }
                MalformedPolicy::Skip => {
                    warn!(line = line_no, error = %err, "skipping malformed entity record");
                    report.skipped_invalid += 1;
                    continue;
                }
            },
        };

        let entity = record.into_entity();
        let schema = entity.schema.clone();

        if query::insert_entity(&tx, &entity)
            .with_context(|| format!("write entity at line {line_no}"))?
        {
            report.ingested += 1;
            report.schemas.insert(schema);
        } else {
            report.skipped_existing += 1;
        }

        since_checkpoint += 1;
        if since_checkpoint >= checkpoint_interval {
            tx.commit().context("commit ingest checkpoint")?;
            tx = conn.transaction().context("begin ingest transaction")?;
            since_checkpoint = 0;
        }

        if report.total_lines % config.progress_interval.max(1) == 0 {
            info!(
                lines = report.total_lines,
                ingested = report.ingested,
                "ingest progress"
            );
        }
    }

    tx.commit().context("commit final ingest batch")?;

    info!(
        lines = report.total_lines,
        ingested = report.ingested,
        skipped_invalid = report.skipped_invalid,
        skipped_existing = report.skipped_existing,
        "ingest finished"
    );

    Ok(report)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
