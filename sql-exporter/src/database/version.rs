//! Engine version probe used for version gating.

use std::sync::LazyLock;

use futures::StreamExt;
use regex::Regex;
use scrape_core::{CancellationToken, Database, ScrapeError};
use tracing::warn;

/// Query returning the engine's version string.
pub const ENGINE_VERSION_QUERY: &str = "SELECT @@version";

/// Assumed version when the version string cannot be parsed; enables every scraper.
pub const UNKNOWN_ENGINE_VERSION: f64 = 999.0;

static VERSION_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d+\.\d+").unwrap());

/// Parse the leading `major.minor` of a version string.
///
/// `"8.0.35-log"` → `Some(8.0)`, `"5.6.10"` → `Some(5.6)`.
pub fn parse_engine_version(version: &str) -> Option<f64> {
    VERSION_RE
        .find(version.trim())
        .and_then(|m| m.as_str().parse().ok())
}

/// Probe the engine version.
///
/// A failing query is returned as an error (the engine is unreachable).
/// A version string that does not parse falls back to
/// [`UNKNOWN_ENGINE_VERSION`].
pub async fn detect_engine_version(
    db: &dyn Database,
    cancel: &CancellationToken,
) -> scrape_core::Result<f64> {
    let version: Option<String> = tokio::select! {
        biased;
        _ = cancel.cancelled() => return Err(ScrapeError::Cancelled),
        version = first_text(db) => version?,
    };

    match version.as_deref().and_then(parse_engine_version) {
        Some(v) => Ok(v),
        None => {
            warn!(version = ?version, "Could not parse engine version, enabling every scraper");
            Ok(UNKNOWN_ENGINE_VERSION)
        }
    }
}

async fn first_text(db: &dyn Database) -> scrape_core::Result<Option<String>> {
    let mut rows = db.query(ENGINE_VERSION_QUERY).await?;
    match rows.next().await {
        Some(row) => row?.get::<Option<String>>(0),
        None => Ok(None),
    }
}
