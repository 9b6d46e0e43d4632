use tracing::warn;

use crate::{dto::health::HealthResponse, state::SharedState};

/// Respond with a health payload while logging catalog connectivity issues.
pub async fn health_status(state: &SharedState) -> HealthResponse {
    match state.require_catalog().await {
        Ok(catalog) => {
            if let Err(err) = catalog.health_check().await {
                warn!(error = %err, "catalog health check failed");
            }
        }
        Err(_) => warn!("song catalog unavailable (degraded mode)"),
    }

    // Report the published flag rather than re-deriving it from the slot, so
    // the health payload always agrees with what watch subscribers see.
    if *state.degraded_watcher().borrow() {
        HealthResponse::degraded()
    } else {
        HealthResponse::ok()
    }
}
