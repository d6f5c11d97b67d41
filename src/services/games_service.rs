use crate::{dao::storage::StorageResult, dto::games::ActiveGameSummary, state::SharedState};

/// Active tracked games, oldest detection first.
pub async fn active_games(state: &SharedState) -> StorageResult<Vec<ActiveGameSummary>> {
    let games = state.store().list_active_games().await?;
    Ok(games.into_iter().map(ActiveGameSummary::from).collect())
}
