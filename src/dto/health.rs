use serde::Serialize;

/// Health response returned by the `/healthcheck` route.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// Health status ("ok" or "degraded").
    pub status: String,
    /// Whether the tracking loops are running.
    pub polling: bool,
    /// Whether the match store answered its health check.
    pub storage: bool,
}

impl HealthResponse {
    /// Build the response, reporting "degraded" when either component is down.
    pub fn new(polling: bool, storage: bool) -> Self {
        let status = if polling && storage { "ok" } else { "degraded" };
        Self {
            status: status.to_string(),
            polling,
            storage,
        }
    }
}
