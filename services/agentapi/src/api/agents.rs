//! User-agent API handler.
//!
//! # Purpose and responsibility
//! Draws one random device from storage and returns a mobile Chrome
//! user-agent string built from it.
//!
//! # Key invariants and assumptions
//! - The agent builder is only invoked with a device actually returned by the store.
//! - Failures to obtain a device never reach the builder.
use crate::api::error::{ApiError, api_from_store};
use crate::api::types::AgentResponse;
use crate::app::AppState;
use crate::observability::{AGENTS_BUILT_TOTAL, DEVICE_ERRORS_TOTAL};
use axum::Json;
use axum::extract::State;

#[utoipa::path(
    get,
    path = "/agents",
    tag = "agents",
    responses(
        (status = 200, description = "Random mobile user agent", body = AgentResponse),
        (status = 503, description = "No devices stored", body = crate::api::types::ErrorResponse),
        (status = 500, description = "Device lookup failed", body = crate::api::types::ErrorResponse)
    )
)]
/// Return a randomized mobile user agent.
///
/// # Errors
/// - 503 if the device table is empty.
/// - 500 if the device lookup fails.
pub(crate) async fn user_agent(State(state): State<AppState>) -> Result<Json<AgentResponse>, ApiError> {
    let device = state.store.random_device().await.map_err(|err| {
        metrics::counter!(DEVICE_ERRORS_TOTAL).increment(1);
        api_from_store("rand device query error", err)
    })?;
    let mobile = state.agents.build(&device);
    tracing::debug!(device_id = device.id, agent = %mobile, "agent built");
    metrics::counter!(AGENTS_BUILT_TOTAL).increment(1);
    Ok(Json(AgentResponse { mobile }))
}
