//! Agent service HTTP entry point.
//!
//! # Purpose
//! Wires configuration, catalogs, device storage, and the HTTP router, then
//! serves until SIGINT or SIGTERM.
//!
//! # Notes
//! The `build_state` helper keeps wiring testable and minimizes main setup logic.
use agentapi::app::{AppState, ReleaseInfo, build_router};
use agentapi::config::{AgentApiConfig, StorageBackend};
use agentapi::observability;
use agentapi::store::DeviceStore;
use agentapi::store::memory::InMemoryStore;
use agentapi::store::postgres::PostgresStore;
use anyhow::Context;
use metrics_exporter_prometheus::PrometheusHandle;
use mua_catalog::{AgentBuilder, Catalogs};
use std::future::Future;
use std::sync::Arc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = AgentApiConfig::from_env_or_yaml()?;
    run_with_shutdown(config, shutdown_signal()).await
}

async fn shutdown_signal() {
    let ctrl_c = async {
        let _ = tokio::signal::ctrl_c().await;
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => {
                tracing::warn!(error = %err, "failed to install SIGTERM handler");
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
    tracing::info!("got signal, shutting down");
}

async fn run_with_shutdown<F>(config: AgentApiConfig, shutdown: F) -> anyhow::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let metrics_handle = observability::init_observability("mua-agentapi", config.production);
    tracing::info!("running mobile user agent api");
    let state = build_state(&config, metrics_handle).await?;
    let app = build_router(state);

    let addr = config.bind_addr;
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("listen http on {addr}"))?;
    tracing::info!(addr = %listener.local_addr()?, "listening http");
    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(shutdown)
        .await?;
    Ok(())
}

async fn build_state(
    config: &AgentApiConfig,
    metrics: PrometheusHandle,
) -> anyhow::Result<AppState> {
    let catalogs = Catalogs::load(&config.browser_catalog_path, &config.platform_catalog_path)
        .context("load version catalogs")?;
    let store: Arc<dyn DeviceStore> = match config.storage {
        StorageBackend::Memory => match &config.devices_path {
            Some(path) => Arc::new(InMemoryStore::from_json_file(path)?),
            None => Arc::new(InMemoryStore::new(Vec::new())),
        },
        StorageBackend::Postgres => Arc::new(
            PostgresStore::connect(&config.postgres)
                .await
                .context("connect to postgres")?,
        ),
    };
    tracing::info!(backend = store.backend_name(), "device store ready");

    Ok(AppState {
        agents: Arc::new(AgentBuilder::new(catalogs)),
        store,
        release: ReleaseInfo::read(&config.version_path, &config.revision_path),
        metrics,
    })
}
