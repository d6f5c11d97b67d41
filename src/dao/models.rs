use std::time::SystemTime;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::riot::QueueType;

/// Game family a tracked match belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum GameMode {
    /// League of Legends (win/loss outcome).
    Lol,
    /// Teamfight Tactics (ranked placement outcome).
    Tft,
}

impl GameMode {
    /// Stable lowercase label used in logs and storage.
    pub fn as_str(self) -> &'static str {
        match self {
            GameMode::Lol => "lol",
            GameMode::Tft => "tft",
        }
    }
}

/// Coarse lifecycle status stored next to each tracked game.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum GameStatus {
    /// Match still running or result not yet recorded.
    Active,
    /// Result recorded; the record is final.
    Completed,
}

impl GameStatus {
    /// Label persisted by storage backends.
    pub fn as_str(self) -> &'static str {
        match self {
            GameStatus::Active => "ACTIVE",
            GameStatus::Completed => "COMPLETED",
        }
    }
}

/// Verified outcome of a finished match for one player.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "lowercase")]
pub enum GameResult {
    /// League outcome.
    Lol {
        /// Whether the player's team won.
        won: bool,
        /// Match length in seconds.
        duration_seconds: u32,
        /// Champion the player picked.
        champion_played: String,
    },
    /// TFT outcome; `placement` is always within `1..=8`.
    Tft {
        /// Final standing, 1 being first.
        placement: u8,
        /// Match length in seconds.
        duration_seconds: u32,
    },
}

impl GameResult {
    /// Game mode the result was produced for.
    pub fn mode(&self) -> GameMode {
        match self {
            GameResult::Lol { .. } => GameMode::Lol,
            GameResult::Tft { .. } => GameMode::Tft,
        }
    }

    /// Match length in seconds.
    pub fn duration_seconds(&self) -> u32 {
        match self {
            GameResult::Lol {
                duration_seconds, ..
            }
            | GameResult::Tft {
                duration_seconds, ..
            } => *duration_seconds,
        }
    }

    /// Win/loss view of the result. TFT counts a top-four placement as a win.
    pub fn won(&self) -> bool {
        match self {
            GameResult::Lol { won, .. } => *won,
            GameResult::Tft { placement, .. } => (1..=4).contains(placement),
        }
    }
}

/// Lifecycle state of a tracked game. A completed game always owns its result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameState {
    /// Detected and waiting for completion.
    Active,
    /// Finalized by the completion loop.
    Completed {
        /// Outcome for the owning player.
        result: GameResult,
        /// When the record was finalized.
        completed_at: SystemTime,
    },
}

/// Registered player whose matches are tracked.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PlayerEntity {
    /// Stable identifier for the player.
    pub id: Uuid,
    /// Riot ID name part (before the `#`).
    pub game_name: String,
    /// Riot ID tag part (after the `#`).
    pub tag_line: String,
    /// Registration timestamp.
    pub created_at: SystemTime,
}

impl PlayerEntity {
    /// Create a new player with a fresh identifier.
    pub fn new(game_name: impl Into<String>, tag_line: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            game_name: game_name.into(),
            tag_line: tag_line.into(),
            created_at: SystemTime::now(),
        }
    }

    /// Display form `game_name#tag_line`.
    pub fn riot_id(&self) -> String {
        format!("{}#{}", self.game_name, self.tag_line)
    }

    /// Case-insensitive comparison against another Riot ID.
    pub fn matches_riot_id(&self, game_name: &str, tag_line: &str) -> bool {
        riot_id_eq(&self.game_name, &self.tag_line, game_name, tag_line)
    }
}

/// Compare two Riot IDs ignoring case.
pub fn riot_id_eq(name_a: &str, tag_a: &str, name_b: &str, tag_b: &str) -> bool {
    name_a.to_lowercase() == name_b.to_lowercase() && tag_a.to_lowercase() == tag_b.to_lowercase()
}

/// One player's journey through one match, from detection to completion.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TrackedGameEntity {
    /// Primary key of the record.
    pub id: Uuid,
    /// Owning player.
    pub player_id: Uuid,
    /// Upstream game id as reported by the spectator endpoint.
    pub match_id: String,
    /// Game family of the match.
    pub game_mode: GameMode,
    /// Queue resolved from the spectator payload.
    pub queue_type: QueueType,
    /// When the detection loop first observed the match.
    pub detected_at: SystemTime,
    /// Upstream start time, or the detection time when the match had not started yet.
    pub started_at: SystemTime,
    /// Spectator payload captured at detection.
    pub raw_snapshot: Option<Value>,
    /// Advisory note left by the completion loop.
    pub last_error: Option<String>,
    /// Lifecycle state, carrying the result once completed.
    pub state: GameState,
}

impl TrackedGameEntity {
    /// Build an active record from a creation request.
    pub fn from_new(new: NewTrackedGame, detected_at: SystemTime) -> Self {
        Self {
            id: Uuid::new_v4(),
            player_id: new.player_id,
            match_id: new.match_id,
            game_mode: new.game_mode,
            queue_type: new.queue_type,
            detected_at,
            started_at: new.started_at.unwrap_or(detected_at),
            raw_snapshot: new.raw_snapshot,
            last_error: None,
            state: GameState::Active,
        }
    }

    pub fn status(&self) -> GameStatus {
        match self.state {
            GameState::Active => GameStatus::Active,
            GameState::Completed { .. } => GameStatus::Completed,
        }
    }

    pub fn is_active(&self) -> bool {
        matches!(self.state, GameState::Active)
    }

    pub fn result(&self) -> Option<&GameResult> {
        match &self.state {
            GameState::Active => None,
            GameState::Completed { result, .. } => Some(result),
        }
    }

    pub fn completed_at(&self) -> Option<SystemTime> {
        match &self.state {
            GameState::Active => None,
            GameState::Completed { completed_at, .. } => Some(*completed_at),
        }
    }

    pub fn duration_seconds(&self) -> Option<u32> {
        self.result().map(GameResult::duration_seconds)
    }

    /// Move an active record to the completed state and clear its advisory note.
    ///
    /// Returns `false` without touching the record when it is already completed.
    pub fn finalize(&mut self, result: GameResult, completed_at: SystemTime) -> bool {
        if !self.is_active() {
            return false;
        }
        self.state = GameState::Completed {
            result,
            completed_at,
        };
        self.last_error = None;
        true
    }
}

/// Parameters for inserting a freshly detected match.
#[derive(Debug, Clone, PartialEq)]
pub struct NewTrackedGame {
    /// Owning player.
    pub player_id: Uuid,
    /// Upstream game id.
    pub match_id: String,
    /// Game family of the match.
    pub game_mode: GameMode,
    /// Queue resolved from the spectator payload.
    pub queue_type: QueueType,
    /// Upstream start time, when the match has started.
    pub started_at: Option<SystemTime>,
    /// Spectator payload to keep with the record.
    pub raw_snapshot: Option<Value>,
}

#[cfg(test)]
mod tests {
    use super::*;

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
    fn placement_maps_to_win_view() {
        for placement in 1..=4 {
            let result = GameResult::Tft {
                placement,
                duration_seconds: 1800,
            };
            assert!(result.won(), "placement {placement} should count as a win");
        }
        for placement in 5..=8 {
            let result = GameResult::Tft {
                placement,
                duration_seconds: 1800,
            };
            assert!(!result.won(), "placement {placement} should count as a loss");
        }
    }

    #[test]
    fn finalize_only_once() {
        let mut game = active_game();
        game.last_error = Some("match result not yet available".into());
        let result = GameResult::Tft {
            placement: 2,
            duration_seconds: 2100,
        };

        assert!(game.finalize(result.clone(), SystemTime::now()));
        assert_eq!(game.status(), GameStatus::Completed);
        assert_eq!(game.result(), Some(&result));
        assert_eq!(game.duration_seconds(), Some(2100));
        assert!(game.last_error.is_none());

        let other = GameResult::Tft {
            placement: 8,
            duration_seconds: 1,
        };
        assert!(!game.finalize(other, SystemTime::now()));
        assert_eq!(game.result(), Some(&result));
    }

    #[test]
    fn riot_id_comparison_ignores_case() {
        let player = PlayerEntity::new("Faker", "KR1");
        assert!(player.matches_riot_id("faker", "kr1"));
        assert!(!player.matches_riot_id("faker", "kr2"));
        assert_eq!(player.riot_id(), "Faker#KR1");
    }
}
