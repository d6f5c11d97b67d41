use tracing::warn;

use crate::{dto::health::HealthResponse, state::SharedState};

/// Ping the store and report whether polling is alive.
pub async fn health_status(state: &SharedState) -> HealthResponse {
    let storage = match state.store().health_check().await {
        Ok(()) => true,
        Err(err) => {
            warn!(error = %err, "storage health check failed");
            false
        }
    };

    HealthResponse::new(state.polling().is_running().await, storage)
}
