#![allow(dead_code)]

use agentapi::app::{AppState, ReleaseInfo, build_router};
use agentapi::observability;
use agentapi::store::DeviceStore;
use axum::body::Body;
use axum::http::Request;
use mua_catalog::{AgentBuilder, Catalogs, Thresholds};
use std::path::PathBuf;
use std::sync::Arc;

pub async fn read_json(response: axum::response::Response) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body");
    serde_json::from_slice(&bytes).expect("json")
}

pub async fn read_text(response: axum::response::Response) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body");
    String::from_utf8(bytes.to_vec()).expect("utf8")
}

pub fn docs(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("docs").join(name)
}

pub fn catalogs() -> Catalogs {
    Catalogs::load(docs("chrome.json"), docs("android.json")).expect("catalogs")
}

pub fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).expect("request")
}

pub fn app_with_store(
    store: Arc<dyn DeviceStore>,
) -> axum::routing::RouterIntoService<axum::body::Body, ()> {
    let state = AppState {
        agents: Arc::new(AgentBuilder::with_seed(catalogs(), Thresholds::default(), 17)),
        store,
        release: ReleaseInfo {
            version: "0.0.1".to_string(),
            revision: "abc123".to_string(),
        },
        metrics: observability::install_metrics_recorder(),
    };
    build_router(state).into_service()
}
