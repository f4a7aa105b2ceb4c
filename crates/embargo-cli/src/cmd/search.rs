//! `embargo search` — caption search over the entity inventory.

use std::io::Write;
use std::path::Path;

use clap::Args;
use serde::Serialize;

use embargo_core::store::open_store;
use embargo_core::store::query::{EntitySearchFilter, search_entities};

use crate::output::{OutputMode, render};

/// Arguments for `embargo search`.
#[derive(Args, Debug)]
pub struct SearchArgs {
    /// Case-insensitive caption substring to look for.
    pub query: String,

    /// Restrict to one entity schema tag.
    #[arg(long)]
    pub schema: Option<String>,

    /// Keep only entities sanctioned by this country.
    #[arg(long, value_name = "CODE")]
    pub sanctioned_by: Option<String>,

    /// Maximum hits to return.
    #[arg(short = 'n', long, default_value_t = 100)]
    pub limit: usize,
}

/// One search hit as rendered.
#[derive(Debug, Serialize)]
struct SearchHit {
    id: String,
    caption: String,
    schema: String,
    first_seen: Option<String>,
    datasets: Vec<String>,
}

/// Execute `embargo search`.
pub fn run_search(args: &SearchArgs, output: OutputMode, db: &Path) -> anyhow::Result<()> {
    let conn = open_store(db)?;

    let hits = search_entities(
        &conn,
        &EntitySearchFilter {
            query: args.query.clone(),
            schema: args.schema.clone(),
            sanctioned_by: args.sanctioned_by.clone(),
            limit: Some(args.limit),
        },
    )?;

    let payload: Vec<SearchHit> = hits
        .into_iter()
        .map(|hit| SearchHit {
            id: hit.id,
            caption: hit.caption,
            schema: hit.schema,
            first_seen: hit.first_seen,
            datasets: hit.datasets,
        })
        .collect();

    render(output, &payload, |hits, w| {
        if hits.is_empty() {
            return writeln!(w, "no entities match");
        }
        for hit in hits {
            writeln!(
                w,
                "{}  [{}]  {}  ({})",
                hit.id,
                hit.schema,
                hit.caption,
                hit.datasets.join(", ")
            )?;
        }
        Ok(())
    })
}
