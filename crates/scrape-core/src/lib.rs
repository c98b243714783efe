//! scrape-core: turn database introspection queries into metric points.
//!
//! Every collector ("scraper") runs one static query, decodes each row into
//! one or more points and pushes them onto a stream shared with every other
//! scraper in the same collection cycle.
//!
//! ## Core Types
//!
//! - [`Scraper`] - The contract every collector implements
//! - [`QueryScraper`] - Query text plus row decoder, driven by [`pipeline::execute`]
//! - [`Database`] - Handle a scraper issues its query on
//! - [`Row`] / [`Value`] - Driver-neutral result rows
//!
//! ## Metrics
//!
//! - [`Descriptor`] / [`DescriptorRegistry`] - Immutable metric family identities
//! - [`MetricPoint`] - One labelled observation
//! - [`MetricSink`] / [`MetricReceiver`] - Multi-producer output stream
//!
//! ## Scrapers
//!
//! - [`scrapers::InnodbTrx`] - `information_schema.innodb_trx`
//! - [`scrapers::AuroraHostStatus`] - `information_schema.replica_host_status`
//! - [`scrapers::ScraperRegistry`] - Name → scraper mapping

pub mod database;
pub mod descriptor;
pub mod error;
#[cfg(any(test, feature = "mock"))]
pub mod mock;
pub mod pipeline;
pub mod point;
pub mod row;
pub mod scraper;
pub mod scrapers;
pub mod sink;

pub use database::{Database, RowStream};
pub use descriptor::{
    Descriptor, DescriptorRegistry, INFORMATION_SCHEMA, NAMESPACE, build_fq_name,
};
pub use error::{BoxError, Result, ScrapeError};
pub use point::{MetricKind, MetricPoint};
pub use row::{FromValue, Row, Value};
pub use scraper::{QueryScraper, Scraper};
pub use scrapers::ScraperRegistry;
pub use sink::{MetricReceiver, MetricSink, channel};

pub use tokio_util::sync::CancellationToken;
