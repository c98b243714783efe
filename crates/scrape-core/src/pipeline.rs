//! Query → decode → emit pipeline shared by every single-query scraper.
//!
//! One call runs the bound query once, walks the cursor row by row and
//! pushes each row's points onto the sink before moving on:
//!
//! 1. The query is issued under the cancellation token. A cancelled token
//!    wins over a pending query and the call returns [`ScrapeError::Cancelled`].
//! 2. The returned [`RowStream`] owns the cursor. It is a local of
//!    [`execute`], so it is dropped, and the cursor released, on every
//!    return path: end of rows, decode error, sink error or cancellation.
//! 3. Rows are pulled lazily; at most one row is held in memory.
//! 4. Each row is decoded into a scratch buffer first. A row that fails to
//!    decode therefore emits nothing, and no later row is read.
//! 5. The buffered points are pushed in declaration order.
//!
//! Points pushed for rows before a failing row stay pushed. There is no
//! rollback: the consumer may already have forwarded them, and the caller
//! sees the error outcome alongside them.

use futures::StreamExt;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::database::{Database, RowStream};
use crate::error::{Result, ScrapeError};
use crate::point::MetricPoint;
use crate::scraper::QueryScraper;
use crate::sink::MetricSink;

/// Run `scraper`'s query against `db` and stream its points into `sink`.
///
/// Returns the number of points pushed.
pub async fn execute<S>(
    scraper: &S,
    cancel: &CancellationToken,
    db: &dyn Database,
    sink: &MetricSink,
) -> Result<usize>
where
    S: QueryScraper + ?Sized,
{
    let mut rows: RowStream<'_> = tokio::select! {
        biased;
        _ = cancel.cancelled() => return Err(ScrapeError::Cancelled),
        rows = db.query(scraper.query()) => rows?,
    };

    let mut batch: Vec<MetricPoint> = Vec::new();
    let mut row_count = 0usize;
    let mut emitted = 0usize;

    loop {
        let next = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(ScrapeError::Cancelled),
            next = rows.next() => next,
        };
        let Some(row) = next else {
            break;
        };
        let row = row?;
        row_count += 1;

        batch.clear();
        if let Err(e) = scraper.decode(&row, &mut batch) {
            debug!(
                scraper = scraper.name(),
                row = row_count,
                emitted,
                error = %e,
                "Row decode failed, aborting scrape"
            );
            return Err(e);
        }

        for point in batch.drain(..) {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(ScrapeError::Cancelled),
                pushed = sink.push(point) => pushed?,
            }
            emitted += 1;
        }
    }

    debug!(
        scraper = scraper.name(),
        rows = row_count,
        emitted,
        "Scrape finished"
    );
    Ok(emitted)
}
