#![forbid(unsafe_code)]
//! embargo-core library.
//!
//! Batch side of the sanctions pipeline: catalogue fetching, streaming
//! entity ingestion, relation extraction, and the SQLite store they share.
//!
//! # Conventions
//!
//! - **Errors**: Use `anyhow::Result` for return types.
//! - **Logging**: Use `tracing` macros (`info!`, `warn!`, `error!`, `debug!`, `trace!`).

pub mod extract;
pub mod fetch;
pub mod ingest;
pub mod model;
pub mod store;
