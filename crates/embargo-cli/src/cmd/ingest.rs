//! `embargo ingest` — stream an NDJSON entity export into the store.

use std::fs::File;
use std::io::{self, BufReader, Write};
use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::Args;
use serde::Serialize;

use embargo_core::ingest::{IngestConfig, MalformedPolicy, ingest_entities};
use embargo_core::store::open_store;

use crate::output::{OutputMode, render};

/// Arguments for `embargo ingest`.
#[derive(Args, Debug)]
pub struct IngestArgs {
    /// NDJSON entity file; `-` reads from stdin.
    pub file: PathBuf,

    /// Abort on the first malformed record instead of skipping it.
    #[arg(long)]
    pub fail_fast: bool,

    /// Lines per committed batch. An aborted run loses at most one batch.
    #[arg(long, default_value_t = 50_000)]
    pub checkpoint_interval: usize,
}

/// Report payload for `embargo ingest`.
#[derive(Debug, Serialize)]
struct IngestPayload {
    total_lines: usize,
    ingested: usize,
    skipped_invalid: usize,
    skipped_existing: usize,
    schemas: Vec<String>,
}

/// Execute `embargo ingest`.
pub fn run_ingest(args: &IngestArgs, output: OutputMode, db: &Path) -> anyhow::Result<()> {
    let mut conn = open_store(db)?;

    let config = IngestConfig {
        malformed: if args.fail_fast {
            MalformedPolicy::Fail
        } else {
            MalformedPolicy::Skip
        },
        checkpoint_interval: args.checkpoint_interval,
        ..IngestConfig::default()
    };

    let report = if args.file == Path::new("-") {
        let stdin = io::stdin();
        ingest_entities(&mut conn, stdin.lock(), &config)?
    } else {
        let file = File::open(&args.file)
            .with_context(|| format!("open entity file {}", args.file.display()))?;
        ingest_entities(&mut conn, BufReader::new(file), &config)?
    };

    let payload = IngestPayload {
        total_lines: report.total_lines,
        ingested: report.ingested,
        skipped_invalid: report.skipped_invalid,
        skipped_existing: report.skipped_existing,
        schemas: report.schemas.into_iter().collect(),
    };

    render(output, &payload, |p, w| {
        writeln!(w, "ingested {} of {} lines", p.ingested, p.total_lines)?;
        if p.skipped_invalid > 0 {
            writeln!(w, "  malformed (skipped): {}", p.skipped_invalid)?;
        }
        if p.skipped_existing > 0 {
            writeln!(w, "  already present:     {}", p.skipped_existing)?;
        }
        writeln!(w, "  schemas: {}", p.schemas.join(", "))?;
        Ok(())
    })
}
