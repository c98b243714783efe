//! Metrics scrape endpoint.

use axum::{Router, extract::State, http::header, response::IntoResponse, routing::get};

use crate::api::server::AppState;
use crate::metrics::prometheus::CONTENT_TYPE;

/// Create the metrics router.
pub fn router() -> Router<AppState> {
    Router::new().route("/", get(scrape))
}

/// Run one collection cycle and render it.
///
/// Always 200: an unreachable engine is reported through `up`.
async fn scrape(State(state): State<AppState>) -> impl IntoResponse {
    let report = state.exporter.collect(state.database.clone()).await;
    let body = state.encoder.encode(&report.points);
    ([(header::CONTENT_TYPE, CONTENT_TYPE)], body)
}
