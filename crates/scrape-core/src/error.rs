//! Scrape error types.

use thiserror::Error;

/// Crate-specific result type.
pub type Result<T> = std::result::Result<T, ScrapeError>;

/// Boxed driver error carried by [`ScrapeError::Query`].
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Errors that end a single scrape.
///
/// Every variant is local to one `scrape` call: the orchestrator records it
/// as that scraper's outcome and the rest of the collection cycle carries on.
#[derive(Error, Debug)]
pub enum ScrapeError {
    /// The query could not be issued or the cursor failed mid-stream
    /// (connectivity, syntax, permission, unknown table on an older engine).
    #[error("Query error: {0}")]
    Query(#[source] BoxError),

    /// A column of a returned row could not be decoded into the declared type.
    #[error("Decode error in column {column}: {reason}")]
    Decode { column: usize, reason: String },

    /// The cancellation token fired before the scrape finished.
    #[error("Scrape cancelled")]
    Cancelled,

    /// The consumer side of the metric stream has gone away.
    #[error("Metric sink closed")]
    SinkClosed,

    /// Label values did not match the descriptor's label schema.
    #[error("Label mismatch for {metric}: expected {expected} label values, got {got}")]
    LabelMismatch {
        metric: String,
        expected: usize,
        got: usize,
    },

    /// A descriptor with the same name but a different schema already exists.
    #[error("Descriptor {0} already defined with a different schema")]
    DuplicateDescriptor(String),
}

impl ScrapeError {
    /// Wrap a driver error as a query failure.
    pub fn query(err: impl Into<BoxError>) -> Self {
        Self::Query(err.into())
    }

    /// Create a decode error for the given column.
    pub fn decode(column: usize, reason: impl Into<String>) -> Self {
        Self::Decode {
            column,
            reason: reason.into(),
        }
    }

    /// Whether this error came from the cancellation token rather than the engine.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }
}
