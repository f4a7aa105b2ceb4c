//! `embargo country` — relation rows pinned to one country, on either side
//! of the sanction.

use std::io::Write;
use std::path::Path;

use clap::{Args, ValueEnum};
use serde::Serialize;

use embargo_core::store::open_store;
use embargo_core::store::query::{SanctionDirection, country_relations};

use crate::cmd::FilterArgs;
use crate::output::{OutputMode, render};

/// Which side of the relation the country sits on.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum Direction {
    /// Relations targeting the country's entities (who sanctions it).
    #[default]
    Towards,
    /// Relations the country issues (whom it sanctions).
    From,
}

impl From<Direction> for SanctionDirection {
    fn from(direction: Direction) -> Self {
        match direction {
            Direction::Towards => Self::Towards,
            Direction::From => Self::From,
        }
    }
}

/// Arguments for `embargo country`.
#[derive(Args, Debug)]
pub struct CountryArgs {
    /// Country code to pin.
    pub code: String,

    /// Side of the relation the country sits on.
    #[arg(long, value_enum, default_value = "towards")]
    pub direction: Direction,

    #[command(flatten)]
    pub filter: FilterArgs,
}

/// One relation row as rendered.
#[derive(Debug, Serialize)]
struct CountryRelation {
    id: String,
    caption: String,
    schema: String,
    source_country: String,
    target_country: String,
    first_seen: Option<String>,
}

/// Execute `embargo country`.
pub fn run_country(args: &CountryArgs, output: OutputMode, db: &Path) -> anyhow::Result<()> {
    let conn = open_store(db)?;

    let rows = country_relations(
        &conn,
        &args.code,
        args.direction.into(),
        &args.filter.to_filter(),
    )?;

    let payload: Vec<CountryRelation> = rows
        .into_iter()
        .map(|row| CountryRelation {
            id: row.id,
            caption: row.caption,
            schema: row.schema,
            source_country: row.source_country,
            target_country: row.target_country,
            first_seen: row.first_seen,
        })
        .collect();

    render(output, &payload, |rows, w| {
        if rows.is_empty() {
            return writeln!(w, "no relations match");
        }
        for row in rows {
            writeln!(
                w,
                "{} -> {}  {}  [{}]  {}",
                row.source_country, row.target_country, row.id, row.schema, row.caption
            )?;
        }
        Ok(())
    })
}
