//! Callback Gateway
//!
//! Single-binary service that:
//! 1. Loads the client registry (OAuth 2.0 and form clients) from TOML
//! 2. Serves login initiation, profile and logout routes
//! 3. Completes indirect logins on the callback path through the callback
//!    engine, rotating the session cookie after every successful login
//! 4. Expires idle sessions in the background

mod clients;
mod config;
mod cookie;
mod error;
mod filter;
mod metrics;
mod routes;

use anyhow::{Context, Result};
use axum::Router;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::get;
use std::sync::Arc;
use std::sync::atomic::Ordering;
use std::time::Duration;
use tokio::net::TcpListener;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use callback_engine::{CallbackEngine, Configuration, PathDecision};
use metrics_exporter_prometheus::PrometheusHandle;
use session_store::{MemorySessionStore, spawn_sweep_task};

use crate::config::Config;
use crate::cookie::SessionCookie;
use crate::error::ApiError;
use crate::metrics::GatewayStats;

/// Time allowed for in-flight requests after a shutdown signal.
const DRAIN_TIMEOUT: Duration = Duration::from_secs(5);

/// Shared application state accessible from all handlers
#[derive(Clone)]
struct AppState {
    engine: Arc<CallbackEngine>,
    sessions: Arc<MemorySessionStore>,
    path: PathDecision,
    cookie: SessionCookie,
    stats: GatewayStats,
    prometheus: PrometheusHandle,
}

/// Build the axum router with all routes and shared state.
///
/// The callback filter wraps every route (and the fallback), so the callback
/// path needs no route of its own.
fn build_router(state: AppState, max_connections: usize) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/metrics", get(metrics_handler))
        .merge(routes::router())
        .fallback(not_found_handler)
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            filter::callback_filter,
        ))
        .layer(tower::limit::ConcurrencyLimitLayer::new(max_connections))
        .with_state(state)
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing with JSON output and LOG_LEVEL / RUST_LOG support
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_env("LOG_LEVEL")
                .or_else(|_| EnvFilter::try_from_default_env())
                .unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with(tracing_subscriber::fmt::layer().json())
        .init();

    info!("starting callback-gateway");

    // Install Prometheus metrics recorder before any metrics are emitted
    let prometheus_handle =
        metrics::install_recorder().context("failed to install Prometheus recorder")?;

    // CLI: simple --config flag parsing
    let args: Vec<String> = std::env::args().collect();
    let cli_config_path = args
        .iter()
        .position(|a| a == "--config")
        .and_then(|i| args.get(i + 1))
        .map(|s| s.as_str());

    let config_path = Config::resolve_path(cli_config_path);
    info!(path = %config_path.display(), "loading configuration");

    let config = Config::load(&config_path)
        .with_context(|| format!("failed to load config from {}", config_path.display()))?;

    info!(
        listen_addr = %config.server.listen_addr,
        suffix = %config.callback.suffix,
        clients = config.clients.len(),
        "configuration loaded"
    );

    let http = reqwest::Client::builder()
        .timeout(Duration::from_secs(config.server.http_timeout_secs))
        .build()
        .context("failed to build HTTP client")?;

    let sessions = Arc::new(MemorySessionStore::new(Duration::from_secs(
        config.session.idle_timeout_secs,
    )));

    let clients = clients::build_clients(config.clients, &http)?;
    let configuration = Configuration::builder(sessions.clone())
        .clients(clients)
        .build()
        .context("invalid client registry")?;
    let engine = CallbackEngine::builder()
        .configuration(Arc::new(configuration))
        .options(config.callback.options)
        .build()
        .context("failed to build callback engine")?;

    let sweeper = spawn_sweep_task(
        sessions.clone(),
        Duration::from_secs(config.session.sweep_interval_secs),
    );

    let stats = GatewayStats::new();
    let app_state = AppState {
        engine: Arc::new(engine),
        sessions,
        path: PathDecision::new(config.callback.suffix),
        cookie: SessionCookie::from_config(&config.session),
        stats: stats.clone(),
        prometheus: prometheus_handle,
    };

    let app = build_router(app_state, config.server.max_connections);

    let listen_addr = config.server.listen_addr;
    let listener = TcpListener::bind(listen_addr)
        .await
        .with_context(|| format!("failed to bind to {listen_addr}"))?;
    info!(addr = %listen_addr, "accepting requests");

    // The drain timeout starts when the shutdown signal fires: the server is
    // told to drain, then the drain races DRAIN_TIMEOUT.
    let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel::<()>();

    let server_handle = tokio::spawn(async move {
        axum::serve(listener, app)
            .with_graceful_shutdown(async {
                let _ = shutdown_rx.await;
            })
            .await
    });

    shutdown_signal().await;
    let _ = shutdown_tx.send(());

    match tokio::time::timeout(DRAIN_TIMEOUT, server_handle).await {
        Ok(Ok(Ok(()))) => {
            info!("all in-flight requests drained");
        }
        Ok(Ok(Err(e))) => {
            error!(error = %e, "server error during shutdown");
        }
        Ok(Err(e)) => {
            error!(error = %e, "server task panicked");
        }
        Err(_) => {
            warn!(
                drain_timeout_secs = DRAIN_TIMEOUT.as_secs(),
                "drain timeout exceeded, forcing shutdown"
            );
        }
    }

    sweeper.abort();
    info!(
        callbacks_served = stats.callbacks_total.load(Ordering::Relaxed),
        "shutdown complete"
    );
    Ok(())
}

/// Health endpoint: status, uptime, live sessions, callbacks served.
async fn health_handler(State(state): State<AppState>) -> impl IntoResponse {
    let body = serde_json::json!({
        "status": "healthy",
        "uptime_seconds": state.stats.started_at.elapsed().as_secs(),
        "sessions_active": state.sessions.len().await,
        "callbacks_served": state.stats.callbacks_total.load(Ordering::Relaxed),
        "callback_errors": state.stats.callback_errors_total.load(Ordering::Relaxed),
        "clients": state.engine.configuration().all_clients().len(),
    });

    (
        StatusCode::OK,
        [(axum::http::header::CONTENT_TYPE, "application/json")],
        body.to_string(),
    )
}

/// Prometheus metrics endpoint — returns metrics in text exposition format.
async fn metrics_handler(State(state): State<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(
            axum::http::header::CONTENT_TYPE,
            "text/plain; version=0.0.4; charset=utf-8",
        )],
        state.prometheus.render(),
    )
}

async fn not_found_handler() -> ApiError {
    ApiError::not_found("no route for this path")
}

/// Wait for SIGTERM or SIGINT for graceful shutdown.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("received SIGINT, shutting down"),
        _ = terminate => info!("received SIGTERM, shutting down"),
    }
}
