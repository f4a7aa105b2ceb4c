//! `embargo extract` — recompute relation rows from the stored entities
//! and dataset catalogue.

use std::io::Write;
use std::path::Path;

use clap::Args;
use serde::Serialize;

use embargo_core::extract::extract_relations;
use embargo_core::store::open_store;

use crate::output::{OutputMode, render};

/// Arguments for `embargo extract`.
#[derive(Args, Debug, Default)]
pub struct ExtractArgs {}

/// Report payload for `embargo extract`.
#[derive(Debug, Serialize)]
struct ExtractPayload {
    source_datasets: usize,
    entities: usize,
    rows: usize,
}

/// Execute `embargo extract`.
pub fn run_extract(_args: &ExtractArgs, output: OutputMode, db: &Path) -> anyhow::Result<()> {
    let mut conn = open_store(db)?;
    let report = extract_relations(&mut conn)?;

    let payload = ExtractPayload {
        source_datasets: report.source_datasets,
        entities: report.entities,
        rows: report.rows,
    };

    render(output, &payload, |p, w| {
        writeln!(
            w,
            "extracted {} relation rows from {} entities across {} source datasets",
            p.rows, p.entities, p.source_datasets
        )
    })
}
