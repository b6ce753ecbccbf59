use axum::extract::State;
use axum::http::header;
use axum::response::IntoResponse;

use crate::error::AppError;
use crate::exposition::{self, CONTENT_TYPE};
use crate::AppState;

/// GET /metrics: query SendGrid and render the result. Upstream failures only
/// remove the affected gauges; the scrape itself still succeeds.
pub async fn metrics(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let samples = state.collector.collect().await;
    tracing::debug!(handler = "metrics", samples = samples.len(), "Collected SendGrid samples");

    let body = exposition::render(&state.registry, &state.collector, &samples)?;
    Ok(([(header::CONTENT_TYPE, CONTENT_TYPE)], body))
}
