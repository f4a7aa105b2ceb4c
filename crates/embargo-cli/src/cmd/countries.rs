//! `embargo countries` — the country codes present in the relation set.

use std::io::Write;
use std::path::Path;

use clap::Args;
use serde::Serialize;

use embargo_core::store::open_store;
use embargo_core::store::query::list_countries;

use crate::output::{OutputMode, render};

/// Arguments for `embargo countries`.
#[derive(Args, Debug, Default)]
pub struct CountriesArgs {}

/// Report payload for `embargo countries`.
#[derive(Debug, Serialize)]
struct CountriesPayload {
    countries: Vec<String>,
}

/// Execute `embargo countries`.
pub fn run_countries(
    _args: &CountriesArgs,
    output: OutputMode,
    db: &Path,
) -> anyhow::Result<()> {
    let conn = open_store(db)?;
    let payload = CountriesPayload {
        countries: list_countries(&conn)?,
    };

    render(output, &payload, |p, w| {
        for country in &p.countries {
            writeln!(w, "{country}")?;
        }
        Ok(())
    })
}
