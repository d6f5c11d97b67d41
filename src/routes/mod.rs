use axum::Router;

use crate::state::SharedState;

pub mod games;
pub mod health;
pub mod sse;

/// Compose all route trees and wire in shared state.
pub fn router(state: SharedState) -> Router<()> {
    health::router()
        .merge(games::router())
        .merge(sse::router())
        .with_state(state)
}
