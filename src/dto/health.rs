use serde::Serialize;
use utoipa::ToSchema;

/// Payload returned by the `/healthcheck` route.
///
/// "degraded" means the coordinator is up but the song catalog is
/// unreachable; rooms keep working while playback updates are refused until
/// the supervisor reconnects.
#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    /// Either "ok" or "degraded".
    pub status: String,
}

impl HealthResponse {
    /// Response for a coordinator with a reachable song catalog.
    pub fn ok() -> Self {
        Self {
            status: "ok".to_string(),
        }
    }

    /// Response while the song catalog is unreachable.
    pub fn degraded() -> Self {
        Self {
            status: "degraded".to_string(),
        }
    }
}
