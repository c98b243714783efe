//! Database handle seam.
//!
//! The pool behind a [`Database`] is owned elsewhere; scrapers only issue a
//! query on the handle they are given.

use async_trait::async_trait;
use futures::stream::BoxStream;

use crate::error::Result;
use crate::row::Row;

/// Lazy, finite, non-restartable cursor over a query result.
///
/// Rows are produced one at a time. Dropping the stream releases the
/// underlying cursor, whether or not it was read to the end.
pub type RowStream<'a> = BoxStream<'a, Result<Row>>;

/// A live handle rows can be queried from.
#[async_trait]
pub trait Database: Send + Sync {
    /// Issue `sql` and return a cursor over its rows.
    async fn query<'a>(&'a self, sql: &'a str) -> Result<RowStream<'a>>;
}
