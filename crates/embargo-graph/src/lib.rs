#![forbid(unsafe_code)]
//! embargo-graph library.
//!
//! Analysis side of the sanctions pipeline: builds the weighted directed
//! country graph from the relation store and computes centrality metrics and
//! a 2D layout over it. Everything here is read-only with respect to the
//! store and ephemeral — a graph lives for one analysis request.
//!
//! # Conventions
//!
//! - **Errors**: Use `anyhow::Result` for return types.
//! - **Logging**: Use `tracing` macros (`info!`, `warn!`, `error!`, `debug!`, `trace!`).

pub mod build;
pub mod layout;
pub mod metrics;
pub mod report;
