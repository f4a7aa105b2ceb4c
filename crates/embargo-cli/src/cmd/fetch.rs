//! `embargo fetch` — sync dataset catalogue metadata into the store.

use std::io::Write;
use std::path::Path;

use anyhow::Context;
use chrono::{Local, NaiveDate};
use clap::Args;
use serde::Serialize;

use embargo_core::fetch::{CatalogueClient, FetchConfig, sync_datasets};
use embargo_core::store::open_store;

use crate::output::{OutputMode, render};

/// Arguments for `embargo fetch`.
#[derive(Args, Debug)]
pub struct FetchArgs {
    /// Dataset names to fetch. With none given, the full catalogue index
    /// for the reference date is enumerated instead.
    pub datasets: Vec<String>,

    /// Reference snapshot date (YYYY-MM-DD). Defaults to today; lookups
    /// walk backward from here one day per missed attempt.
    #[arg(long)]
    pub date: Option<NaiveDate>,

    /// Catalogue base URL.
    #[arg(long)]
    pub base_url: Option<String>,

    /// Lookup attempts per dataset before it is skipped.
    #[arg(long, default_value_t = 100)]
    pub max_attempts: u32,
}

/// Report payload for `embargo fetch`.
#[derive(Debug, Serialize)]
struct FetchPayload {
    date: NaiveDate,
    requested: usize,
    stored: usize,
    missing: Vec<String>,
}

/// Execute `embargo fetch`.
pub fn run_fetch(args: &FetchArgs, output: OutputMode, db: &Path) -> anyhow::Result<()> {
    let conn = open_store(db)?;

    let mut config = FetchConfig {
        max_attempts: args.max_attempts,
        ..FetchConfig::default()
    };
    if let Some(ref base_url) = args.base_url {
        config.base_url.clone_from(base_url);
    }

    let date = args.date.unwrap_or_else(|| Local::now().date_naive());
    let client = CatalogueClient::new(config);

    let names = if args.datasets.is_empty() {
        client
            .fetch_catalogue(date)
            .context("catalogue index not found within the attempt cap")?
            .datasets
    } else {
        args.datasets.clone()
    };

    let report = sync_datasets(&conn, &client, &names, date)?;
    let payload = FetchPayload {
        date,
        requested: report.requested,
        stored: report.stored,
        missing: report.missing,
    };

    render(output, &payload, |p, w| {
        writeln!(
            w,
            "stored {} of {} datasets (reference date {})",
            p.stored, p.requested, p.date
        )?;
        for name in &p.missing {
            writeln!(w, "  missing: {name}")?;
        }
        Ok(())
    })
}
