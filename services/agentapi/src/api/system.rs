//! Heartbeat, version, and metrics handlers.
//!
//! # Purpose and responsibility
//! Lightweight endpoints for probes and operators: pool statistics, deployed
//! release, and the Prometheus exposition.
//!
//! # Key invariants and assumptions
//! - These handlers never touch the database beyond reading pool counters.
use crate::api::types::{Heartbeat, VersionInfo};
use crate::app::AppState;
use axum::Json;
use axum::extract::State;

#[utoipa::path(
    get,
    path = "/heartbeat",
    tag = "system",
    responses(
        (status = 200, description = "Service liveness and pool statistics", body = Heartbeat)
    )
)]
/// Report liveness together with connection-pool statistics.
pub(crate) async fn heartbeat(State(state): State<AppState>) -> Json<Heartbeat> {
    let stats = state.store.pool_stats();
    stats.publish();
    Json(Heartbeat {
        status: "ok".to_string(),
        db: stats,
    })
}

#[utoipa::path(
    get,
    path = "/version",
    tag = "system",
    responses(
        (status = 200, description = "Deployed release", body = VersionInfo)
    )
)]
/// Return the release recorded at startup.
pub(crate) async fn version(State(state): State<AppState>) -> Json<VersionInfo> {
    Json(VersionInfo {
        version: state.release.version.clone(),
        revision: state.release.revision.clone(),
        storage_backend: state.store.backend_name().to_string(),
    })
}

/// Render Prometheus metrics after refreshing the pool gauges.
pub(crate) async fn metrics(State(state): State<AppState>) -> String {
    state.store.pool_stats().publish();
    state.metrics.render()
}
