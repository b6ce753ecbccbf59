use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use prometheus::Registry;
use tower_http::trace::{self, TraceLayer};
use tracing::Level;
use tracing_subscriber::EnvFilter;

use sendgrid_stats_exporter::collector::StatsCollector;
use sendgrid_stats_exporter::config::{Config, LogFormat};
use sendgrid_stats_exporter::exposition::register_exporter_metrics;
use sendgrid_stats_exporter::sendgrid_client::SendGridClient;
use sendgrid_stats_exporter::{build_app, AppState, EXPORTER_NAME};

const STOP_TIMEOUT: Duration = Duration::from_secs(10);

fn init_tracing(config: &Config) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    match config.log_format {
        LogFormat::Json => tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .init(),
        LogFormat::Logfmt => tracing_subscriber::fmt().with_env_filter(filter).init(),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::parse();
    init_tracing(&config);

    tracing::info!(
        exporter = EXPORTER_NAME,
        version = env!("CARGO_PKG_VERSION"),
        "Starting"
    );

    let categories = config.categories();
    tracing::info!(categories = %categories.join(", "), "Target SendGrid categories");

    let zone = config.reporting_zone()?;
    if let Some(zone) = &zone {
        tracing::info!(location = zone.name(), offset = %zone.offset(), "Reporting in fixed zone");
    }

    let client = SendGridClient::new(config.api_key.clone(), config.api_timeout())
        .context("Failed to build SendGrid client")?;
    let collector = StatsCollector::new(
        Arc::new(client),
        config.user_name.clone(),
        categories,
        zone,
    )?;

    let registry = Registry::new();
    if !config.disable_exporter_metrics {
        register_exporter_metrics(&registry)?;
    }

    let state = AppState {
        collector: Arc::new(collector),
        registry,
    };

    let app = build_app(state).layer(
        TraceLayer::new_for_http()
            .make_span_with(trace::DefaultMakeSpan::new().level(Level::INFO))
            .on_request(trace::DefaultOnRequest::new().level(Level::INFO))
            .on_response(
                trace::DefaultOnResponse::new()
                    .level(Level::INFO)
                    .latency_unit(tower_http::LatencyUnit::Millis),
            ),
    );

    let addr = config.listen_addr();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    tracing::info!("Listening on {addr}");

    let (stop_tx, stop_rx) = tokio::sync::oneshot::channel::<()>();
    let mut server = tokio::spawn(async move {
        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = stop_rx.await;
            })
            .await
    });

    tokio::select! {
        result = &mut server => {
            return result
                .context("Server task failed")?
                .context("Server error");
        }
        _ = shutdown_signal() => {}
    }

    let _ = stop_tx.send(());
    match tokio::time::timeout(STOP_TIMEOUT, server).await {
        Ok(Ok(Ok(()))) => tracing::info!("Server stopped"),
        Ok(Ok(Err(e))) => tracing::error!(error = %e, "Server error during shutdown"),
        Ok(Err(e)) => tracing::error!(error = %e, "Server task failed during shutdown"),
        Err(_) => tracing::warn!(
            timeout_secs = STOP_TIMEOUT.as_secs(),
            "In-flight requests did not finish in time, forcing shutdown"
        ),
    }

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
    tracing::info!("Shutting down...");
}
