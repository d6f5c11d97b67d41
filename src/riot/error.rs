//! Error types shared by the Riot API client.

use std::time::Duration;

use reqwest::StatusCode;
use thiserror::Error;

/// Convenient result alias returning [`RiotError`] failures.
pub type RiotResult<T> = Result<T, RiotError>;

/// Failures that can occur while talking to the Riot API.
///
/// "Not in a match" and "result not available yet" are not errors; they surface as `Ok(None)`.
#[derive(Debug, Error)]
pub enum RiotError {
    /// No account exists upstream for the Riot ID.
    #[error("no Riot account found for `{riot_id}`")]
    NotFound { riot_id: String },
    /// Upstream throttled us; the client is cooling down until `retry_after` elapses.
    #[error("rate limited by the Riot API, retry after {retry_after:?}")]
    RateLimited { retry_after: Duration },
    /// Neither API key is configured.
    #[error("missing Riot API key: set `{lol_var}` or `{tft_var}`")]
    MissingApiKey {
        lol_var: &'static str,
        tft_var: &'static str,
    },
    /// A configured base URL cannot be used to build request URLs.
    #[error("invalid Riot API base URL `{url}`: {reason}")]
    InvalidBaseUrl { url: String, reason: String },
    /// Building the HTTP client failed (invalid TLS setup, etc).
    #[error("failed to build Riot API client")]
    ClientBuilder {
        #[source]
        source: reqwest::Error,
    },
    /// The request could not be sent.
    #[error("failed to send Riot API request to `{path}`")]
    RequestSend {
        path: String,
        #[source]
        source: reqwest::Error,
    },
    /// Upstream answered with an unexpected status code.
    #[error("unexpected Riot API response status {status} for `{path}`")]
    RequestStatus { path: String, status: StatusCode },
    /// Response payload could not be parsed into JSON.
    #[error("failed to decode Riot API response for `{path}`")]
    DecodeResponse {
        path: String,
        #[source]
        source: reqwest::Error,
    },
    /// Decoding a JSON value into the expected model failed.
    #[error("failed to deserialize Riot API payload for `{path}`")]
    DeserializeValue {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}

impl RiotError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, RiotError::NotFound { .. })
    }

    pub fn is_rate_limited(&self) -> bool {
        matches!(self, RiotError::RateLimited { .. })
    }
}
