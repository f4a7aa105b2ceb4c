//! Dataset catalogue client with backward date-walk retry.
//!
//! # Overview
//!
//! The upstream catalogue publishes daily snapshots under
//! `{base}/datasets/{YYYYMMDD}/{name}/index.json`. A dataset can be briefly
//! absent on the exact reference date, so a lookup that fails steps the date
//! back one day and tries again, up to a hard attempt cap. Exhausting the cap
//! is a normal outcome ("not found"), never an error: batch ingestion
//! proceeds with a partial catalogue.
//!
//! The walk is an explicit loop with an attempt counter — the backing
//! behavior is naturally recursive but a 100-deep recursion over network
//! calls has no business on the stack.

use anyhow::{Context, Result};
use chrono::NaiveDate;
use rusqlite::Connection;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::{debug, info, instrument, warn};

use crate::model::Dataset;
use crate::store::query;

/// Configuration for catalogue lookups.
#[derive(Debug, Clone)]
pub struct FetchConfig {
    /// Catalogue base URL (no trailing slash).
    pub base_url: String,
    /// Total lookup attempts per dataset before giving up. Default: 100.
    pub max_attempts: u32,
    /// Per-request timeout.
    pub timeout: Duration,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            base_url: "https://data.opensanctions.org".to_string(),
            max_attempts: 100,
            timeout: Duration::from_secs(30),
        }
    }
}

/// One dataset's metadata as served by the catalogue.
#[derive(Debug, Clone, Deserialize)]
pub struct DatasetIndex {
    pub name: String,
    pub title: String,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub index_url: Option<String>,
    #[serde(default)]
    pub summary: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub publisher: Option<serde_json::Value>,
    #[serde(rename = "type", default = "default_dataset_type")]
    pub dataset_type: String,
}

fn default_dataset_type() -> String {
    "source".to_string()
}

impl DatasetIndex {
    /// Convert the catalogue record into the stored [`Dataset`] shape.
    #[must_use]
    pub fn into_dataset(self) -> Dataset {
        Dataset {
            name: self.name,
            title: self.title,
            url: self.url,
            index_url: self.index_url,
            summary: self.summary,
            description: self.description,
            publisher: self.publisher,
            dataset_type: self.dataset_type,
        }
    }
}

/// The catalogue-level index listing dataset names for one snapshot day.
#[derive(Debug, Clone, Deserialize)]
struct CatalogueIndex {
    #[serde(default)]
    datasets: Vec<String>,
}

/// A successfully located dataset snapshot.
#[derive(Debug, Clone)]
pub struct DatasetSnapshot {
    /// The snapshot day the record was found under (may be earlier than the
    /// requested reference date).
    pub date: NaiveDate,
    pub index: DatasetIndex,
}

/// A successfully located catalogue index snapshot.
#[derive(Debug, Clone)]
pub struct CatalogueSnapshot {
    pub date: NaiveDate,
    pub datasets: Vec<String>,
}

/// Report from [`sync_datasets`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncReport {
    pub requested: usize,
    pub stored: usize,
    /// Dataset names that exhausted the date walk.
    pub missing: Vec<String>,
}

// ---------------------------------------------------------------------------
// Date walk
// ---------------------------------------------------------------------------

/// Outcome of a single snapshot lookup.
pub(crate) enum Lookup<T> {
    Found(T),
    /// Not found / error status / transport failure — all retried the same
    /// way by stepping one day back.
    Miss,
}

pub(crate) struct WalkOutcome<T> {
    pub snapshot: Option<(NaiveDate, T)>,
    pub attempts: u32,
}

/// Walk backward from `start`, one day per attempt, until `lookup` finds a
/// snapshot or `max_attempts` lookups have been spent.
pub(crate) fn walk_back<T>(
    start: NaiveDate,
    max_attempts: u32,
    mut lookup: impl FnMut(NaiveDate) -> Lookup<T>,
) -> WalkOutcome<T> {
    let mut date = start;
    let mut attempts = 0;

    while attempts < max_attempts {
        attempts += 1;
        if let Lookup::Found(value) = lookup(date) {
            return WalkOutcome {
                snapshot: Some((date, value)),
                attempts,
            };
        }

        match date.pred_opt() {
            Some(previous) => date = previous,
            None => break,
        }
    }

    WalkOutcome {
        snapshot: None,
        attempts,
    }
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

/// HTTP client for the dataset catalogue.
pub struct CatalogueClient {
    agent: ureq::Agent,
    config: FetchConfig,
}

impl CatalogueClient {
    #[must_use]
    pub fn new(config: FetchConfig) -> Self {
        let agent = ureq::AgentBuilder::new()
            .timeout(config.timeout)
            .user_agent("embargo")
            .build();
        Self { agent, config }
    }

    /// Locate one dataset's metadata, walking backward from `date`.
    ///
    /// Returns `None` when every attempt misses.
    #[instrument(skip(self))]
    pub fn fetch_dataset(&self, name: &str, date: NaiveDate) -> Option<DatasetSnapshot> {
        let outcome = walk_back(date, self.config.max_attempts, |day| {
            self.get_json::<DatasetIndex>(&dataset_index_url(&self.config.base_url, day, name))
        });

        match outcome.snapshot {
            Some((snapshot_date, index)) => {
                debug!(
                    dataset = name,
                    %snapshot_date,
                    attempts = outcome.attempts,
                    "located dataset snapshot"
                );
                Some(DatasetSnapshot {
                    date: snapshot_date,
                    index,
                })
            }
            None => {
                warn!(
                    dataset = name,
                    attempts = outcome.attempts,
                    "dataset not found within attempt cap"
                );
                None
            }
        }
    }

    /// Locate the catalogue index (the list of dataset names) for `date`,
    /// with the same backward walk.
    #[instrument(skip(self))]
    pub fn fetch_catalogue(&self, date: NaiveDate) -> Option<CatalogueSnapshot> {
        let outcome = walk_back(date, self.config.max_attempts, |day| {
            self.get_json::<CatalogueIndex>(&catalogue_index_url(&self.config.base_url, day))
        });

        match outcome.snapshot {
            Some((snapshot_date, index)) => Some(CatalogueSnapshot {
                date: snapshot_date,
                datasets: index.datasets,
            }),
            None => {
                warn!(attempts = outcome.attempts, "catalogue index not found");
                None
            }
        }
    }

    fn get_json<T: DeserializeOwned>(&self, url: &str) -> Lookup<T> {
        match self.agent.get(url).call() {
            Ok(response) => match response.into_json::<T>() {
                Ok(value) => Lookup::Found(value),
                Err(err) => {
                    warn!(url, error = %err, "snapshot response was not valid JSON");
                    Lookup::Miss
                }
            },
            Err(ureq::Error::Status(code, _)) => {
                debug!(url, status = code, "snapshot lookup missed");
                Lookup::Miss
            }
            Err(err) => {
                warn!(url, error = %err, "snapshot lookup failed");
                Lookup::Miss
            }
        }
    }
}

fn dataset_index_url(base: &str, date: NaiveDate, name: &str) -> String {
    format!("{base}/datasets/{}/{name}/index.json", date.format("%Y%m%d"))
}

fn catalogue_index_url(base: &str, date: NaiveDate) -> String {
    format!("{base}/datasets/{}/index.json", date.format("%Y%m%d"))
}

// ---------------------------------------------------------------------------
// Batch sync
// ---------------------------------------------------------------------------

/// Fetch and store metadata for each named dataset.
///
/// Datasets that exhaust the date walk are logged and reported as missing;
/// the sync itself still succeeds with a partial catalogue.
///
/// # Errors
///
/// Returns an error only when a store write fails.
#[instrument(skip(conn, client, names))]
pub fn sync_datasets(
    conn: &Connection,
    client: &CatalogueClient,
    names: &[String],
    date: NaiveDate,
) -> Result<SyncReport> {
    let mut report = SyncReport {
        requested: names.len(),
        ..SyncReport::default()
    };

    for name in names {
        match client.fetch_dataset(name, date) {
            Some(snapshot) => {
                query::upsert_dataset(conn, &snapshot.index.into_dataset())
                    .with_context(|| format!("store dataset {name}"))?;
                report.stored += 1;
            }
            None => report.missing.push(name.clone()),
        }
    }

    info!(
        requested = report.requested,
        stored = report.stored,
        missing = report.missing.len(),
        "dataset sync finished"
    );

    Ok(report)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
