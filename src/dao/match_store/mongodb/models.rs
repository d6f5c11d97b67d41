use mongodb::bson::{DateTime, Document, doc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::{
    dao::models::{
        GameMode, GameResult, GameState, GameStatus, PlayerEntity, TrackedGameEntity,
    },
    riot::QueueType,
};

use super::error::MongoDaoError;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MongoPlayerDocument {
    #[serde(rename = "_id")]
    id: String,
    game_name: String,
    tag_line: String,
    /// Lower-cased copies backing the case-insensitive unique index.
    game_name_lower: String,
    tag_line_lower: String,
    created_at: DateTime,
}

impl From<PlayerEntity> for MongoPlayerDocument {
    fn from(value: PlayerEntity) -> Self {
        Self {
            id: value.id.to_string(),
            game_name_lower: value.game_name.to_lowercase(),
            tag_line_lower: value.tag_line.to_lowercase(),
            game_name: value.game_name,
            tag_line: value.tag_line,
            created_at: DateTime::from_system_time(value.created_at),
        }
    }
}

impl TryFrom<MongoPlayerDocument> for PlayerEntity {
    type Error = MongoDaoError;

    fn try_from(value: MongoPlayerDocument) -> Result<Self, Self::Error> {
        Ok(Self {
            id: parse_uuid(&value.id, &value.id)?,
            game_name: value.game_name,
            tag_line: value.tag_line,
            created_at: value.created_at.to_system_time(),
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MongoTrackedGameDocument {
    #[serde(rename = "_id")]
    id: String,
    player_id: String,
    match_id: String,
    game_mode: GameMode,
    status: GameStatus,
    queue_type: QueueType,
    detected_at: DateTime,
    started_at: DateTime,
    #[serde(default)]
    completed_at: Option<DateTime>,
    #[serde(default)]
    result: Option<GameResult>,
    #[serde(default)]
    duration_seconds: Option<u32>,
    #[serde(default)]
    raw_snapshot: Option<Value>,
    #[serde(default)]
    last_error: Option<String>,
}

impl From<TrackedGameEntity> for MongoTrackedGameDocument {
    fn from(value: TrackedGameEntity) -> Self {
        let status = value.status();
        let duration_seconds = value.duration_seconds();
        let (result, completed_at) = match value.state {
            GameState::Active => (None, None),
            GameState::Completed {
                result,
                completed_at,
            } => (Some(result), Some(DateTime::from_system_time(completed_at))),
        };

        Self {
            id: value.id.to_string(),
            player_id: value.player_id.to_string(),
            match_id: value.match_id,
            game_mode: value.game_mode,
            status,
            queue_type: value.queue_type,
            detected_at: DateTime::from_system_time(value.detected_at),
            started_at: DateTime::from_system_time(value.started_at),
            completed_at,
            result,
            duration_seconds,
            raw_snapshot: value.raw_snapshot,
            last_error: value.last_error,
        }
    }
}

impl TryFrom<MongoTrackedGameDocument> for TrackedGameEntity {
    type Error = MongoDaoError;

    fn try_from(value: MongoTrackedGameDocument) -> Result<Self, Self::Error> {
        let state = match (value.status, value.result, value.completed_at) {
            (GameStatus::Active, _, _) => GameState::Active,
            (GameStatus::Completed, Some(result), Some(completed_at)) => GameState::Completed {
                result,
                completed_at: completed_at.to_system_time(),
            },
            (GameStatus::Completed, _, _) => {
                return Err(MongoDaoError::CorruptDocument {
                    id: value.id,
                    reason: "completed game without result".into(),
                });
            }
        };

        Ok(Self {
            id: parse_uuid(&value.id, &value.id)?,
            player_id: parse_uuid(&value.id, &value.player_id)?,
            match_id: value.match_id,
            game_mode: value.game_mode,
            queue_type: value.queue_type,
            detected_at: value.detected_at.to_system_time(),
            started_at: value.started_at.to_system_time(),
            raw_snapshot: value.raw_snapshot,
            last_error: value.last_error,
            state,
        })
    }
}

fn parse_uuid(doc_id: &str, raw: &str) -> Result<Uuid, MongoDaoError> {
    Uuid::parse_str(raw).map_err(|err| MongoDaoError::CorruptDocument {
        id: doc_id.to_owned(),
        reason: format!("invalid uuid `{raw}`: {err}"),
    })
}

pub fn doc_id(id: Uuid) -> Document {
    doc! {"_id": id.to_string()}
}

pub fn game_key(player_id: Uuid, match_id: &str) -> Document {
    doc! {"player_id": player_id.to_string(), "match_id": match_id}
}

#[cfg(test)]
mod tests {
    use std::time::SystemTime;

    use super::*;
    use crate::dao::models::NewTrackedGame;

    fn active_game() -> TrackedGameEntity {
        TrackedGameEntity::from_new(
            NewTrackedGame {
                player_id: Uuid::new_v4(),
                match_id: "123".into(),
                game_mode: GameMode::Tft,
                queue_type: QueueType::TftRanked,
                started_at: None,
                raw_snapshot: None,
            },
            SystemTime::now(),
        )
    }

    #[test]
    fn player_document_keeps_lowercase_key() {
        let document = MongoPlayerDocument::from(PlayerEntity::new("Hide On Bush", "KR1"));
        assert_eq!(document.game_name_lower, "hide on bush");
        assert_eq!(document.tag_line_lower, "kr1");
        assert_eq!(document.game_name, "Hide On Bush");
    }

    #[test]
    fn completed_document_carries_result_and_duration() {
        let mut game = active_game();
        game.finalize(
            GameResult::Tft {
                placement: 6,
                duration_seconds: 1900,
            },
            SystemTime::now(),
        );

        let document = MongoTrackedGameDocument::from(game.clone());
        assert_eq!(document.status, GameStatus::Completed);
        assert_eq!(document.duration_seconds, Some(1900));
        assert!(document.completed_at.is_some());

        let restored = TrackedGameEntity::try_from(document).unwrap();
        assert_eq!(restored.result(), game.result());
        assert_eq!(restored.id, game.id);
    }

    #[test]
    fn completed_document_without_result_is_corrupt() {
        let mut document = MongoTrackedGameDocument::from(active_game());
        document.status = GameStatus::Completed;

        let err = TrackedGameEntity::try_from(document).unwrap_err();
        assert!(matches!(err, MongoDaoError::CorruptDocument { .. }));
    }
}
