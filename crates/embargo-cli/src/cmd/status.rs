//! `embargo status` — store inventory: row counts and schema tags.

use std::io::Write;
use std::path::Path;

use clap::Args;
use serde::Serialize;

use embargo_core::store::open_store;
use embargo_core::store::query::{list_schemas, store_counts};

use crate::output::{OutputMode, render};

/// Arguments for `embargo status`.
#[derive(Args, Debug, Default)]
pub struct StatusArgs {}

/// Report payload for `embargo status`.
#[derive(Debug, Serialize)]
struct StatusPayload {
    entities: usize,
    datasets: usize,
    relation_rows: usize,
    schemas: Vec<String>,
}

/// Execute `embargo status`.
pub fn run_status(_args: &StatusArgs, output: OutputMode, db: &Path) -> anyhow::Result<()> {
    let conn = open_store(db)?;
    let counts = store_counts(&conn)?;

    let payload = StatusPayload {
        entities: counts.entities,
        datasets: counts.datasets,
        relation_rows: counts.relation_rows,
        schemas: list_schemas(&conn)?,
    };

    render(output, &payload, |p, w| {
        writeln!(w, "entities:      {}", p.entities)?;
        writeln!(w, "datasets:      {}", p.datasets)?;
        writeln!(w, "relation rows: {}", p.relation_rows)?;
        writeln!(w, "schemas:       {}", p.schemas.join(", "))?;
        Ok(())
    })
}
