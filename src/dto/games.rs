use serde::Serialize;
use uuid::Uuid;

use crate::{
    dao::models::{GameMode, TrackedGameEntity},
    riot::QueueType,
};

use super::format_system_time;

/// Public view of an in-progress tracked game.
#[derive(Debug, Serialize)]
pub struct ActiveGameSummary {
    pub id: Uuid,
    pub player_id: Uuid,
    pub match_id: String,
    pub game_mode: GameMode,
    pub queue_type: QueueType,
    pub detected_at: String,
    pub started_at: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_error: Option<String>,
}

impl From<TrackedGameEntity> for ActiveGameSummary {
    fn from(game: TrackedGameEntity) -> Self {
        Self {
            id: game.id,
            player_id: game.player_id,
            match_id: game.match_id,
            game_mode: game.game_mode,
            queue_type: game.queue_type,
            detected_at: format_system_time(game.detected_at),
            started_at: format_system_time(game.started_at),
            last_error: game.last_error,
        }
    }
}
