pub mod collector;
pub mod config;
pub mod error;
pub mod exposition;
pub mod handlers;
pub mod models;
pub mod sendgrid_client;
pub mod stats_api;
pub mod util;

use axum::{routing::get, Router};
use collector::StatsCollector;
use prometheus::Registry;
use std::sync::Arc;

pub const EXPORTER_NAME: &str = "sendgrid-stats-exporter";

#[derive(Clone)]
pub struct AppState {
    pub collector: Arc<StatsCollector>,
    /// Self-instrumentation rendered alongside the SendGrid gauges.
    pub registry: Registry,
}

fn metrics_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::index::index))
        .route("/metrics", get(handlers::metrics::metrics))
}

fn health_routes() -> Router<AppState> {
    Router::new().route("/-/healthy", get(handlers::health::healthy))
}

/// Build the full application router (used by main and tests).
pub fn build_app(state: AppState) -> Router {
    Router::new()
        .merge(metrics_routes())
        .merge(health_routes())
        .with_state(state)
}
