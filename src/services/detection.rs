//! Detection loop: discovers matches players have just entered.

use tracing::{debug, error, info, warn};

use crate::{
    dao::models::{NewTrackedGame, PlayerEntity},
    error::TrackerError,
    services::{
        event_factory::build_event,
        polling::{PollingConfig, StopSignal, Tracker},
    },
};

/// Counters describing one detection pass.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct DetectionSummary {
    pub players: usize,
    pub created: usize,
    pub failed: usize,
}

/// What a detection check concluded for one player.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Detection {
    NotInMatch,
    AlreadyTracked,
    Created,
}

pub(crate) async fn run(tracker: Tracker, config: PollingConfig, mut stop: StopSignal) {
    info!("detection loop started");

    while !stop.is_stopped() {
        let pause = match run_detection_iteration(&tracker, &stop).await {
            Ok(summary) => {
                debug!(
                    players = summary.players,
                    created = summary.created,
                    failed = summary.failed,
                    "detection iteration finished"
                );
                config.detection_interval
            }
            Err(err) => {
                error!(error = %err, "detection iteration failed");
                config.error_backoff(config.detection_interval)
            }
        };

        if stop.sleep(pause).await {
            break;
        }
    }

    info!("detection loop stopped");
}

/// Check every registered player once. Per-player failures are logged and skipped.
pub async fn run_detection_iteration(
    tracker: &Tracker,
    stop: &StopSignal,
) -> Result<DetectionSummary, TrackerError> {
    let players = tracker.store.list_players().await?;
    let mut summary = DetectionSummary {
        players: players.len(),
        ..DetectionSummary::default()
    };

    for player in &players {
        if stop.is_stopped() {
            debug!("stop requested; ending detection iteration early");
            break;
        }

        match detect_for_player(tracker, player).await {
            Ok(Detection::Created) => summary.created += 1,
            Ok(_) => {}
            Err(err) => {
                summary.failed += 1;
                log_player_failure(player, &err);
            }
        }
    }

    Ok(summary)
}

/// Look for a live match and start tracking it when it is new.
pub async fn detect_for_player(
    tracker: &Tracker,
    player: &PlayerEntity,
) -> Result<Detection, TrackerError> {
    let Some(snapshot) = tracker
        .riot
        .get_active_match(&player.game_name, &player.tag_line)
        .await?
    else {
        return Ok(Detection::NotInMatch);
    };

    if tracker
        .store
        .find_game(player.id, &snapshot.match_id)
        .await?
        .is_some()
    {
        return Ok(Detection::AlreadyTracked);
    }

    let queue_type = snapshot.queue_type();
    let new_game = NewTrackedGame {
        player_id: player.id,
        match_id: snapshot.match_id,
        game_mode: snapshot.game_mode,
        queue_type,
        started_at: snapshot.started_at,
        raw_snapshot: Some(snapshot.raw),
    };

    let game = match tracker.store.create_game(new_game).await {
        Ok(game) => game,
        Err(err) if err.is_duplicate() => {
            debug!(player = %player.riot_id(), error = %err, "match already tracked");
            return Ok(Detection::AlreadyTracked);
        }
        Err(err) => return Err(err.into()),
    };

    info!(
        player = %player.riot_id(),
        match_id = %game.match_id,
        mode = game.game_mode.as_str(),
        queue = ?game.queue_type,
        ranked = game.queue_type.is_ranked(),
        "match detected"
    );

    let event = build_event(player, None, &game)?;
    if let Err(err) = tracker.publisher.publish(event).await {
        warn!(
            player = %player.riot_id(),
            match_id = %game.match_id,
            error = %err,
            "failed to publish start event"
        );
    }

    Ok(Detection::Created)
}

fn log_player_failure(player: &PlayerEntity, err: &TrackerError) {
    match err {
        TrackerError::Riot(riot) if riot.is_not_found() => {
            debug!(player = %player.riot_id(), error = %err, "player unknown upstream")
        }
        TrackerError::Riot(riot) if riot.is_rate_limited() => {
            warn!(player = %player.riot_id(), error = %err, "rate limited; skipping player")
        }
        _ => warn!(player = %player.riot_id(), error = %err, "detection failed for player"),
    }
}
