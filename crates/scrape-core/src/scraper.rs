//! The scraper contract.

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::database::Database;
use crate::error::Result;
use crate::point::MetricPoint;
use crate::row::Row;
use crate::sink::MetricSink;

/// A stateless query-to-metrics transformer.
///
/// Instances are built once at startup and reused for every collection
/// cycle. Many scrapers run concurrently against the same sink; none of
/// them may hold state between calls.
#[async_trait]
pub trait Scraper: Send + Sync {
    /// Short, unique name. Used as the enable/disable key.
    fn name(&self) -> &'static str;

    /// What this scraper collects, for help output.
    fn help(&self) -> &'static str;

    /// Oldest engine version exposing the queried view.
    ///
    /// Advisory only: the orchestrator gates on it, `scrape` never checks it.
    fn version(&self) -> f64;

    /// Run the bound query and push every resulting point onto `sink`.
    ///
    /// `cancel` is the only cancellation channel; implementations must not
    /// install their own timeout. Diagnostics go to the `tracing` span the
    /// caller instruments this future with.
    async fn scrape(
        &self,
        cancel: &CancellationToken,
        db: &dyn Database,
        sink: &MetricSink,
    ) -> Result<()>;
}

/// The query and row decoder behind a single-query scraper.
///
/// Concrete scrapers implement this next to [`Scraper`] and forward
/// `scrape` to [`crate::pipeline::execute`], which handles cancellation, cursor
/// release and emission order for every variant the same way.
pub trait QueryScraper: Scraper {
    /// The single, parameter-free SQL text this scraper runs.
    fn query(&self) -> &'static str;

    /// Decode one row into `points`, in descriptor declaration order.
    ///
    /// Returning an error aborts the scrape. Points appended to `points`
    /// before the error are discarded, so a failing row emits nothing.
    fn decode(&self, row: &Row, points: &mut Vec<MetricPoint>) -> Result<()>;
}
