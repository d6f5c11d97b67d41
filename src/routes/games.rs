use axum::{Json, Router, extract::State, routing::get};

use crate::{
    dto::games::ActiveGameSummary, error::AppError, services::games_service, state::SharedState,
};

/// List the games currently being tracked.
pub async fn active_games(
    State(state): State<SharedState>,
) -> Result<Json<Vec<ActiveGameSummary>>, AppError> {
    let games = games_service::active_games(&state).await?;
    Ok(Json(games))
}

pub fn router() -> Router<SharedState> {
    Router::<SharedState>::new().route("/games/active", get(active_games))
}
