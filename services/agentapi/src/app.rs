//! Agent service HTTP application wiring.
//!
//! # Purpose
//! Builds the Axum router, configures middleware, and defines the shared
//! application state injected into handlers.
use crate::api;
use crate::api::openapi::ApiDoc;
use crate::observability;
use crate::store::DeviceStore;
use axum::Router;
use metrics_exporter_prometheus::PrometheusHandle;
use mua_catalog::AgentBuilder;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use tracing_opentelemetry::OpenTelemetrySpanExt;
use utoipa::OpenApi;

/// Upper bound for a whole request, read through write.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(3);

const UNKNOWN_RELEASE: &str = "unknown";

/// Deployed version and revision, read once at startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReleaseInfo {
    pub version: String,
    pub revision: String,
}

impl Default for ReleaseInfo {
    fn default() -> Self {
        Self {
            version: UNKNOWN_RELEASE.to_string(),
            revision: UNKNOWN_RELEASE.to_string(),
        }
    }
}

impl ReleaseInfo {
    /// Read both files; a missing or empty file reports `unknown`.
    pub fn read(version_path: &Path, revision_path: &Path) -> Self {
        Self {
            version: read_release_file(version_path),
            revision: read_release_file(revision_path),
        }
    }
}

fn read_release_file(path: &Path) -> String {
    match std::fs::read_to_string(path) {
        Ok(contents) if !contents.trim().is_empty() => contents.trim().to_string(),
        Ok(_) => UNKNOWN_RELEASE.to_string(),
        Err(err) => {
            tracing::debug!(path = %path.display(), error = %err, "release file unavailable");
            UNKNOWN_RELEASE.to_string()
        }
    }
}

#[derive(Clone)]
pub struct AppState {
    pub agents: Arc<AgentBuilder>,
    pub store: Arc<dyn DeviceStore>,
    pub release: ReleaseInfo,
    pub metrics: PrometheusHandle,
}

pub fn build_router(state: AppState) -> Router {
    let trace_layer =
        TraceLayer::new_for_http().make_span_with(|request: &axum::http::Request<_>| {
            let parent = observability::trace_context_from_headers(request.headers());
            let span = tracing::info_span!(
                "http.request",
                method = %request.method(),
                uri = %request.uri(),
                version = ?request.version()
            );
            span.set_parent(parent);
            span
        });

    Router::new()
        .route("/agents", axum::routing::get(api::agents::user_agent))
        .route("/heartbeat", axum::routing::get(api::system::heartbeat))
        .route("/version", axum::routing::get(api::system::version))
        .route("/metrics", axum::routing::get(api::system::metrics))
        .route(
            "/openapi.json",
            axum::routing::get(|| async { axum::Json(ApiDoc::openapi()) }),
        )
        .layer(TimeoutLayer::new(REQUEST_TIMEOUT))
        .layer(trace_layer)
        .with_state(state)
}
