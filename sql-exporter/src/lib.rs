//! sql-exporter library crate.
//!
//! Wires the scrapers from `scrape-core` to a MySQL pool and serves the
//! result in Prometheus text format.

pub mod api;
pub mod collector;
pub mod config;
pub mod database;
pub mod error;
pub mod logging;
pub mod metrics;

pub use collector::{CollectionConfig, CollectionReport, Exporter, ScrapeOutcome};
pub use config::ExporterConfig;
pub use error::{Error, Result};
