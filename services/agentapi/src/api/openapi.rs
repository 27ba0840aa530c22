//! OpenAPI schema aggregation for the agent API.
use crate::api::types::{AgentResponse, ErrorResponse, Heartbeat, VersionInfo};
use crate::api::{agents, system};
use crate::store::PoolStats;
use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "mua-agentapi",
        version = "v1",
        description = "Random mobile user-agent HTTP API"
    ),
    paths(agents::user_agent, system::heartbeat, system::version),
    components(schemas(AgentResponse, ErrorResponse, Heartbeat, PoolStats, VersionInfo)),
    tags(
        (name = "agents", description = "User-agent generation"),
        (name = "system", description = "Health and release information")
    )
)]
pub struct ApiDoc;
