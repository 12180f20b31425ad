//! Brandlens server library.
//!
//! Wires the runtime services into an axum router and serves it. Reused by
//! the binary and by integration tests.

mod error;
mod routes;

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use axum::{
    Router,
    routing::{delete, get, post},
};
use config::Config;
use llm::Orchestrator;
use runtime::{ProbeGuard, RunDispatcher, TemplateService, VersionService, startup_preflight};
use store::StoreClient;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;

/// Shared state handed to every route handler.
pub struct AppState {
    pub templates: TemplateService,
    pub versions: Arc<VersionService>,
    pub dispatcher: RunDispatcher,
    pub store: Arc<StoreClient>,
    pub orchestrator: Arc<Orchestrator>,
}

/// Configuration for serving Brandlens.
pub struct ServeConfig {
    /// The socket address the server will bind to.
    pub listen_address: SocketAddr,
    /// The deserialized brandlens TOML configuration.
    pub config: Config,
    /// Cancellation token for graceful shutdown.
    pub shutdown_signal: CancellationToken,
    /// The version string to log on startup.
    pub version: String,
    /// Optional oneshot sender to send back the bound address (useful if
    /// port 0 was specified).
    pub bound_addr_sender: Option<tokio::sync::oneshot::Sender<SocketAddr>>,
}

/// Build the application state from configuration: store, adapters, guard
/// and the services on top of them.
pub async fn build_state(config: &Config) -> anyhow::Result<Arc<AppState>> {
    let database_url = config
        .database
        .url
        .as_deref()
        .context("database.url (or DATABASE_URL) is required")?;

    let store = Arc::new(
        StoreClient::connect(database_url, config.database.max_connections)
            .await
            .context("failed to connect to PostgreSQL")?,
    );
    store.migrate().await.context("failed to run migrations")?;

    let orchestrator = Arc::new(
        Orchestrator::from_config(&config.llm)
            .await
            .map_err(|e| anyhow::anyhow!("failed to initialize provider adapters: {e}"))?,
    );

    let guard = match &config.redis.url {
        Some(url) => Some(
            ProbeGuard::connect(url, config.redis.probe_guard_ttl_secs)
                .await
                .map_err(|e| anyhow::anyhow!("failed to connect to Redis: {e}"))?,
        ),
        None => {
            log::info!("Redis not configured; version probes run unguarded");
            None
        }
    };

    let versions = Arc::new(VersionService::new(store.clone(), orchestrator.clone(), guard));

    let dispatcher = RunDispatcher::new(
        store.clone(),
        orchestrator.clone(),
        versions.clone(),
        config.run.clone(),
    );

    Ok(Arc::new(AppState {
        templates: TemplateService::new(store.clone()),
        versions,
        dispatcher,
        store,
        orchestrator,
    }))
}

/// Creates the axum router for all operation families.
pub fn router(state: Arc<AppState>, config: &Config) -> Router {
    Router::new()
        .route(
            "/v1/templates",
            post(routes::create_template).get(routes::list_templates),
        )
        .route("/v1/templates/check-duplicate", post(routes::check_duplicate))
        .route("/v1/templates/{id}", delete(routes::soft_delete_template))
        .route("/v1/templates/{id}/run", post(routes::run_template))
        .route("/v1/templates/{id}/ensure-version", post(routes::ensure_version))
        .route("/v1/results/{id}", get(routes::get_result))
        .route(config.server.health_path(), get(routes::health))
        .with_state(state)
}

/// Starts and runs the Brandlens server with the provided configuration.
pub async fn serve(
    ServeConfig {
        listen_address,
        config,
        shutdown_signal,
        version,
        bound_addr_sender,
    }: ServeConfig,
) -> anyhow::Result<()> {
    log::info!("Brandlens {version}");

    let state = build_state(&config).await?;

    let preflight = startup_preflight(&state.orchestrator).await;
    if !preflight.all_healthy() {
        log::warn!("startup preflight reported degraded providers; continuing");
    }

    let app = router(state, &config);

    let listener = TcpListener::bind(listen_address)
        .await
        .with_context(|| format!("failed to bind {listen_address}"))?;

    let bound_addr = listener.local_addr().context("failed to read bound address")?;
    log::info!("listening on {bound_addr}");

    if let Some(sender) = bound_addr_sender {
        let _ = sender.send(bound_addr);
    }

    axum::serve(listener, app)
        .with_graceful_shutdown(async move { shutdown_signal.cancelled().await })
        .await
        .context("server error")?;

    Ok(())
}
