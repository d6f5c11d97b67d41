/// Completion loop finalizing finished matches.
pub mod completion;
/// Detection loop discovering new matches.
pub mod detection;
/// State-change event construction.
pub mod event_factory;
/// Read-only views over tracked games.
pub mod games_service;
/// Health check service.
pub mod health_service;
/// Start/stop control of the tracking loops.
pub mod polling;
/// Event publishing seam and its SSE implementation.
pub mod publisher;
/// Server-Sent Events broadcasting service.
pub mod sse_service;
#[cfg(test)]
pub(crate) mod testing;
