//! Scripted in-memory [`Database`] for tests.
//!
//! Each SQL text maps to a scripted result. Cursor opens and closes are
//! counted so tests can assert the cursor is released on every path.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use futures::StreamExt;
use parking_lot::Mutex;

use crate::database::{Database, RowStream};
use crate::error::{Result, ScrapeError};
use crate::row::Row;

/// One scripted cursor item.
#[derive(Debug, Clone)]
pub enum MockRow {
    Row(Row),
    /// The cursor fails with a driver error at this position.
    Fail(String),
}

/// Scripted outcome of a query.
#[derive(Debug, Clone)]
pub enum MockResult {
    Rows(Vec<MockRow>),
    /// The query itself fails; no cursor is opened.
    Error(String),
}

#[derive(Debug, Default)]
struct CursorCounters {
    opened: AtomicUsize,
    closed: AtomicUsize,
}

/// Increments the closed counter when the stream owning it is dropped.
struct CursorGuard(Arc<CursorCounters>);

impl Drop for CursorGuard {
    fn drop(&mut self) {
        self.0.closed.fetch_add(1, Ordering::SeqCst);
    }
}

/// In-memory database answering a fixed script.
#[derive(Debug, Default)]
pub struct MockDatabase {
    scripts: HashMap<String, MockResult>,
    latency: Option<Duration>,
    query_latency: HashMap<String, Duration>,
    counters: Arc<CursorCounters>,
    queries: Mutex<Vec<String>>,
}

impl MockDatabase {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer `sql` with `rows`.
    pub fn with_rows(self, sql: &str, rows: Vec<Row>) -> Self {
        self.with_script(sql, MockResult::Rows(rows.into_iter().map(MockRow::Row).collect()))
    }

    /// Fail `sql` before any cursor is opened.
    pub fn with_error(self, sql: &str, message: impl Into<String>) -> Self {
        self.with_script(sql, MockResult::Error(message.into()))
    }

    pub fn with_script(mut self, sql: &str, result: MockResult) -> Self {
        self.scripts.insert(sql.to_string(), result);
        self
    }

    /// Delay every query by `latency` before it returns.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// Delay only `sql` by `latency`.
    pub fn with_query_latency(mut self, sql: &str, latency: Duration) -> Self {
        self.query_latency.insert(sql.to_string(), latency);
        self
    }

    pub fn cursors_opened(&self) -> usize {
        self.counters.opened.load(Ordering::SeqCst)
    }

    pub fn cursors_closed(&self) -> usize {
        self.counters.closed.load(Ordering::SeqCst)
    }

    /// SQL texts received so far, in order.
    pub fn queries(&self) -> Vec<String> {
        self.queries.lock().clone()
    }
}

#[async_trait]
impl Database for MockDatabase {
    async fn query<'a>(&'a self, sql: &'a str) -> Result<RowStream<'a>> {
        self.queries.lock().push(sql.to_string());

        if let Some(latency) = self.query_latency.get(sql).copied().or(self.latency) {
            tokio::time::sleep(latency).await;
        }

        let items = match self.scripts.get(sql) {
            Some(MockResult::Rows(items)) => items.clone(),
            Some(MockResult::Error(message)) => {
                return Err(ScrapeError::query(message.clone()));
            }
            None => {
                return Err(ScrapeError::query(format!(
                    "Unknown table for query: {}",
                    sql.trim()
                )));
            }
        };

        self.counters.opened.fetch_add(1, Ordering::SeqCst);
        let guard = CursorGuard(self.counters.clone());

        let stream = futures::stream::iter(items).map(move |item| {
            let _open = &guard;
            match item {
                MockRow::Row(row) => Ok(row),
                MockRow::Fail(message) => Err(ScrapeError::query(message)),
            }
        });
        Ok(stream.boxed())
    }
}
