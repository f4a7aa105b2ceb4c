//! Command handlers for the `embargo` binary, one module per subcommand.

pub mod analyze;
pub mod countries;
pub mod country;
pub mod extract;
pub mod fetch;
pub mod ingest;
pub mod search;
pub mod status;

use chrono::NaiveDate;
use clap::Args;

use embargo_core::model::RelationFilter;

/// Relation filter flags shared by the analysis-side commands.
#[derive(Args, Debug, Default)]
pub struct FilterArgs {
    /// Restrict to one entity schema tag (e.g. Company, Person).
    #[arg(long)]
    pub schema: Option<String>,

    /// Restrict to one industry tag.
    #[arg(long)]
    pub industry: Option<String>,

    /// Keep relations first seen on or after this date (YYYY-MM-DD).
    #[arg(long)]
    pub date_start: Option<NaiveDate>,

    /// Keep relations first seen on or before this date (YYYY-MM-DD).
    #[arg(long)]
    pub date_end: Option<NaiveDate>,

    /// Country allow-list; both endpoints of a relation must be listed.
    /// Repeat the flag for each country code.
    #[arg(long = "country", value_name = "CODE")]
    pub countries: Vec<String>,
}

impl FilterArgs {
    /// Convert the flags into the library filter type.
    #[must_use]
    pub fn to_filter(&self) -> RelationFilter {
        RelationFilter {
            schema: self.schema.clone(),
            industry: self.industry.clone(),
            date_start: self.date_start,
            date_end: self.date_end,
            countries: (!self.countries.is_empty()).then(|| self.countries.clone()),
        }
    }
}
