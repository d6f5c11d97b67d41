//! Completion loop: finalizes tracked games once verified results exist.

use std::{collections::HashMap, time::SystemTime};

use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::{
    dao::models::{PlayerEntity, TrackedGameEntity},
    error::TrackerError,
    services::{
        event_factory::build_event,
        polling::{PollingConfig, StopSignal, Tracker},
    },
};

pub const RESULT_NOT_AVAILABLE: &str = "match result not yet available";
pub const PLAYER_NOT_IN_MATCH: &str = "player not found among match participants";

/// Counters describing one completion pass.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CompletionSummary {
    pub active: usize,
    pub completed: usize,
    pub pending: usize,
    pub failed: usize,
}

/// What a completion check concluded for one record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Completion {
    /// The player is still in this match.
    StillActive,
    /// No usable result yet; the note was recorded on the record.
    ResultPending(&'static str),
    Completed,
    /// Another writer completed the record first.
    AlreadyFinalized,
}

pub(crate) async fn run(tracker: Tracker, config: PollingConfig, mut stop: StopSignal) {
    info!(delay = ?config.completion_start_delay, "completion loop scheduled");

    if !stop.sleep(config.completion_start_delay).await {
        while !stop.is_stopped() {
            let pause = match run_completion_iteration(&tracker, &stop).await {
                Ok(summary) => {
                    debug!(
                        active = summary.active,
                        completed = summary.completed,
                        pending = summary.pending,
                        failed = summary.failed,
                        "completion iteration finished"
                    );
                    config.completion_interval
                }
                Err(err) => {
                    error!(error = %err, "completion iteration failed");
                    config.error_backoff(config.completion_interval)
                }
            };

            if stop.sleep(pause).await {
                break;
            }
        }
    }

    info!("completion loop stopped");
}

/// Check every active record once. Per-record failures are annotated and never abort the scan.
pub async fn run_completion_iteration(
    tracker: &Tracker,
    stop: &StopSignal,
) -> Result<CompletionSummary, TrackerError> {
    let games = tracker.store.list_active_games().await?;
    let mut summary = CompletionSummary {
        active: games.len(),
        ..CompletionSummary::default()
    };
    if games.is_empty() {
        return Ok(summary);
    }

    let players: HashMap<Uuid, PlayerEntity> = tracker
        .store
        .list_players()
        .await?
        .into_iter()
        .map(|player| (player.id, player))
        .collect();

    for game in &games {
        if stop.is_stopped() {
            debug!("stop requested; ending completion iteration early");
            break;
        }

        let Some(player) = players.get(&game.player_id) else {
            debug!(match_id = %game.match_id, player_id = %game.player_id, "owner no longer registered");
            continue;
        };

        match complete_game(tracker, player, game).await {
            Ok(Completion::Completed) => summary.completed += 1,
            Ok(Completion::ResultPending(_)) => summary.pending += 1,
            Ok(_) => {}
            Err(err) => {
                summary.failed += 1;
                warn!(
                    player = %player.riot_id(),
                    match_id = %game.match_id,
                    error = %err,
                    "completion check failed"
                );
                annotate(tracker, game, err.to_string()).await;
            }
        }
    }

    Ok(summary)
}

/// Finalize one active record when its match is over and the player's result is known.
///
/// The store write happens before the end event is published, so a publishing failure never
/// leaves the record active.
pub async fn complete_game(
    tracker: &Tracker,
    player: &PlayerEntity,
    game: &TrackedGameEntity,
) -> Result<Completion, TrackerError> {
    let current = tracker
        .riot
        .get_active_match(&player.game_name, &player.tag_line)
        .await?;
    if current.is_some_and(|snapshot| snapshot.match_id == game.match_id) {
        return Ok(Completion::StillActive);
    }

    let Some(match_result) = tracker
        .riot
        .get_match_result(&game.match_id, game.game_mode)
        .await?
    else {
        return pending(tracker, game, RESULT_NOT_AVAILABLE).await;
    };

    let Some(result) = match_result.result_for(&player.game_name, &player.tag_line) else {
        return pending(tracker, game, PLAYER_NOT_IN_MATCH).await;
    };

    let completed_at = SystemTime::now();
    let mut completed = game.clone();
    if !completed.finalize(result.clone(), completed_at) {
        return Ok(Completion::AlreadyFinalized);
    }
    // Built before the write so a mode mismatch leaves the record active.
    let event = build_event(player, Some(game), &completed)?;

    if !tracker
        .store
        .finalize_game(game.id, result, completed_at)
        .await?
    {
        debug!(match_id = %game.match_id, "record already finalized");
        return Ok(Completion::AlreadyFinalized);
    }

    info!(
        player = %player.riot_id(),
        match_id = %game.match_id,
        mode = game.game_mode.as_str(),
        won = completed.result().is_some_and(|result| result.won()),
        duration_seconds = ?completed.duration_seconds(),
        "match completed"
    );

    if let Err(err) = tracker.publisher.publish(event).await {
        warn!(
            player = %player.riot_id(),
            match_id = %game.match_id,
            error = %err,
            "failed to publish end event"
        );
    }

    Ok(Completion::Completed)
}

async fn pending(
    tracker: &Tracker,
    game: &TrackedGameEntity,
    note: &'static str,
) -> Result<Completion, TrackerError> {
    debug!(match_id = %game.match_id, note, "result pending");
    tracker
        .store
        .annotate_error(game.player_id, &game.match_id, note.to_string())
        .await?;
    Ok(Completion::ResultPending(note))
}

async fn annotate(tracker: &Tracker, game: &TrackedGameEntity, message: String) {
    if let Err(err) = tracker
        .store
        .annotate_error(game.player_id, &game.match_id, message)
        .await
    {
        warn!(match_id = %game.match_id, error = %err, "failed to annotate tracked game");
    }
}
