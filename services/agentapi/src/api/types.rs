//! HTTP API request/response types.
//!
//! # Purpose
//! Defines payload shapes for the agent REST API and OpenAPI schema generation.
use crate::store::PoolStats;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Serialize, Deserialize, ToSchema, Clone)]
pub struct AgentResponse {
    #[serde(rename = "mobile_chrome_user_agent")]
    pub mobile: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema, Clone)]
pub struct Heartbeat {
    pub status: String,
    pub db: PoolStats,
}

#[derive(Debug, Serialize, Deserialize, ToSchema, Clone)]
pub struct VersionInfo {
    pub version: String,
    pub revision: String,
    pub storage_backend: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    pub code: String,
    pub message: String,
    pub request_id: Option<String>,
}
