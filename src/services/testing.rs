//! Fakes for exercising the loops without a network.

use std::{
    collections::HashMap,
    sync::{
        Mutex,
        atomic::{AtomicBool, AtomicUsize, Ordering},
    },
    time::Duration,
};

use futures::future::BoxFuture;
use serde_json::json;

use crate::{
    dao::models::{GameMode, PlayerEntity},
    dto::events::StateChangeEvent,
    riot::{
        CredentialScope, LolMatchResult, LolParticipant, MatchResult, MatchSnapshot, Puuid,
        RiotApi, RiotError, RiotResult, TftMatchResult, TftParticipant,
    },
    services::publisher::{EventPublisher, PublishError},
};

#[derive(Clone)]
enum Lookup<T> {
    Ready(T),
    Throttled,
}

impl<T> Lookup<T> {
    fn into_result(self) -> RiotResult<T> {
        match self {
            Lookup::Ready(value) => Ok(value),
            Lookup::Throttled => Err(RiotError::RateLimited {
                retry_after: Duration::from_secs(10),
            }),
        }
    }
}

/// Scriptable Riot API keyed by lowercase Riot ID and match id.
#[derive(Default)]
pub struct FakeRiot {
    active: Mutex<HashMap<String, Lookup<Option<MatchSnapshot>>>>,
    results: Mutex<HashMap<String, Lookup<Option<MatchResult>>>>,
    active_calls: AtomicUsize,
}

fn key(game_name: &str, tag_line: &str) -> String {
    format!("{}#{}", game_name.to_lowercase(), tag_line.to_lowercase())
}

impl FakeRiot {
    pub fn lol_snapshot(match_id: &str) -> MatchSnapshot {
        MatchSnapshot {
            match_id: match_id.into(),
            game_mode: GameMode::Lol,
            queue_id: 420,
            started_at: None,
            raw: json!({ "gameId": match_id }),
        }
    }

    pub fn tft_snapshot(match_id: &str) -> MatchSnapshot {
        MatchSnapshot {
            match_id: match_id.into(),
            game_mode: GameMode::Tft,
            queue_id: 1100,
            started_at: None,
            raw: json!({ "gameId": match_id }),
        }
    }

    pub fn lol_result(player: &PlayerEntity, won: bool, seconds: u32, champion: &str) -> MatchResult {
        MatchResult::Lol(LolMatchResult {
            duration_seconds: seconds,
            queue_id: 420,
            participants: vec![
                LolParticipant {
                    game_name: "Someone".into(),
                    tag_line: "Else".into(),
                    won: !won,
                    champion_name: "Teemo".into(),
                },
                LolParticipant {
                    game_name: player.game_name.to_uppercase(),
                    tag_line: player.tag_line.to_lowercase(),
                    won,
                    champion_name: champion.into(),
                },
            ],
        })
    }

    pub fn tft_result(player: &PlayerEntity, placement: u8, seconds: u32) -> MatchResult {
        MatchResult::Tft(TftMatchResult {
            duration_seconds: seconds,
            queue_id: 1100,
            participants: vec![TftParticipant {
                game_name: player.game_name.clone(),
                tag_line: player.tag_line.clone(),
                placement,
            }],
        })
    }

    pub fn set_in_match(&self, player: &PlayerEntity, snapshot: MatchSnapshot) {
        self.set_active(player, Lookup::Ready(Some(snapshot)));
    }

    pub fn set_idle(&self, player: &PlayerEntity) {
        self.set_active(player, Lookup::Ready(None));
    }

    pub fn set_throttled(&self, player: &PlayerEntity) {
        self.set_active(player, Lookup::Throttled);
    }

    pub fn set_result(&self, match_id: &str, result: Option<MatchResult>) {
        self.results
            .lock()
            .unwrap()
            .insert(match_id.into(), Lookup::Ready(result));
    }

    pub fn set_result_throttled(&self, match_id: &str) {
        self.results
            .lock()
            .unwrap()
            .insert(match_id.into(), Lookup::Throttled);
    }

    pub fn active_calls(&self) -> usize {
        self.active_calls.load(Ordering::SeqCst)
    }

    fn set_active(&self, player: &PlayerEntity, lookup: Lookup<Option<MatchSnapshot>>) {
        self.active
            .lock()
            .unwrap()
            .insert(key(&player.game_name, &player.tag_line), lookup);
    }
}

impl RiotApi for FakeRiot {
    fn resolve_identity(
        &self,
        game_name: &str,
        tag_line: &str,
        scope: CredentialScope,
    ) -> BoxFuture<'static, RiotResult<Puuid>> {
        let puuid = format!("{scope:?}-{}", key(game_name, tag_line));
        Box::pin(async move { Ok(puuid) })
    }

    fn get_active_match(
        &self,
        game_name: &str,
        tag_line: &str,
    ) -> BoxFuture<'static, RiotResult<Option<MatchSnapshot>>> {
        self.active_calls.fetch_add(1, Ordering::SeqCst);
        let lookup = self
            .active
            .lock()
            .unwrap()
            .get(&key(game_name, tag_line))
            .cloned()
            .unwrap_or(Lookup::Ready(None));
        Box::pin(async move { lookup.into_result() })
    }

    fn get_match_result(
        &self,
        match_id: &str,
        _game_mode: GameMode,
    ) -> BoxFuture<'static, RiotResult<Option<MatchResult>>> {
        let lookup = self
            .results
            .lock()
            .unwrap()
            .get(match_id)
            .cloned()
            .unwrap_or(Lookup::Ready(None));
        Box::pin(async move { lookup.into_result() })
    }
}

/// Publisher remembering every event it accepted.
#[derive(Default)]
pub struct RecordingPublisher {
    events: Mutex<Vec<StateChangeEvent>>,
    failing: AtomicBool,
}

impl RecordingPublisher {
    pub fn events(&self) -> Vec<StateChangeEvent> {
        self.events.lock().unwrap().clone()
    }

    /// Make every later publish fail.
    pub fn fail(&self) {
        self.failing.store(true, Ordering::SeqCst);
    }
}

impl EventPublisher for RecordingPublisher {
    fn publish(&self, event: StateChangeEvent) -> BoxFuture<'static, Result<(), PublishError>> {
        let outcome = if self.failing.load(Ordering::SeqCst) {
            Err(PublishError::Unavailable("publisher offline".into()))
        } else {
            self.events.lock().unwrap().push(event);
            Ok(())
        };
        Box::pin(async move { outcome })
    }
}
