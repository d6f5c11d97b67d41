//! Construction of the polymorphic state-change events.

use std::time::SystemTime;

use thiserror::Error;

use crate::{
    dao::models::{GameMode, GameResult, GameState, GameStatus, PlayerEntity, TrackedGameEntity},
    dto::{
        events::{
            EventSubject, LolGameEvent, LolOutcome, PlayerIdentity, StateChangeEvent,
            TftGameEvent, TftOutcome,
        },
        format_system_time,
    },
};

/// Reasons an event cannot be built for a pair of lifecycle snapshots.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EventError {
    /// The snapshots do not describe a start or an end transition.
    #[error("no event for match `{match_id}` moving from {previous:?} to {current:?}")]
    InvariantViolation {
        match_id: String,
        previous: Option<GameStatus>,
        current: GameStatus,
    },
    /// The stored result belongs to the other game mode.
    #[error("match `{match_id}` is a {game:?} game but its result is for {result:?}")]
    ModeMismatch {
        match_id: String,
        game: GameMode,
        result: GameMode,
    },
}

/// Build the event describing how `current` differs from `previous`.
///
/// A start event needs no previous snapshot and an active current one. An end event needs an
/// active previous snapshot of the same record and a completed current one, which always owns
/// its result.
pub fn build_event(
    player: &PlayerEntity,
    previous: Option<&TrackedGameEntity>,
    current: &TrackedGameEntity,
) -> Result<StateChangeEvent, EventError> {
    let same_record = previous.is_none_or(|previous| previous.id == current.id);

    match (previous.map(TrackedGameEntity::status), &current.state) {
        (None, GameState::Active) => Ok(start_event(player, current)),
        (
            Some(GameStatus::Active),
            GameState::Completed {
                result,
                completed_at,
            },
        ) if same_record => end_event(player, current, result, *completed_at),
        (previous, _) => Err(EventError::InvariantViolation {
            match_id: current.match_id.clone(),
            previous,
            current: current.status(),
        }),
    }
}

fn start_event(player: &PlayerEntity, game: &TrackedGameEntity) -> StateChangeEvent {
    let subject = subject(player, game);
    let changed_at = format_system_time(game.detected_at);

    match game.game_mode {
        GameMode::Lol => StateChangeEvent::Lol(LolGameEvent::start(subject, changed_at)),
        GameMode::Tft => StateChangeEvent::Tft(TftGameEvent::start(subject, changed_at)),
    }
}

fn end_event(
    player: &PlayerEntity,
    game: &TrackedGameEntity,
    result: &GameResult,
    completed_at: SystemTime,
) -> Result<StateChangeEvent, EventError> {
    if result.mode() != game.game_mode {
        return Err(EventError::ModeMismatch {
            match_id: game.match_id.clone(),
            game: game.game_mode,
            result: result.mode(),
        });
    }

    let subject = subject(player, game);
    let changed_at = format_system_time(completed_at);
    let duration_seconds = result.duration_seconds();

    Ok(match result {
        GameResult::Lol {
            won,
            champion_played,
            ..
        } => StateChangeEvent::Lol(LolGameEvent::end(
            subject,
            changed_at,
            duration_seconds,
            LolOutcome {
                won: *won,
                champion_played: champion_played.clone(),
            },
        )),
        GameResult::Tft { placement, .. } => StateChangeEvent::Tft(TftGameEvent::end(
            subject,
            changed_at,
            duration_seconds,
            TftOutcome::new(*placement),
        )),
    })
}

fn subject(player: &PlayerEntity, game: &TrackedGameEntity) -> EventSubject {
    EventSubject {
        player: PlayerIdentity {
            player_id: player.id,
            game_name: player.game_name.clone(),
            tag_line: player.tag_line.clone(),
        },
        game_id: game.match_id.clone(),
        queue_type: game.queue_type,
    }
}
