//! Wire representations of the Riot endpoints the client consumes.

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use serde::Deserialize;
use serde_json::Value;

use crate::dao::models::GameMode;

use super::{
    LolMatchResult, LolParticipant, MatchSnapshot, TftMatchResult, TftParticipant,
};

/// account-v1 `by-riot-id` payload.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountDto {
    pub puuid: String,
}

/// Shared subset of the LoL and TFT spectator-v5 payloads.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActiveGameDto {
    pub game_id: i64,
    #[serde(default)]
    pub game_queue_config_id: Option<i64>,
    /// Epoch milliseconds; zero while players are still loading.
    #[serde(default)]
    pub game_start_time: i64,
}

impl ActiveGameDto {
    pub fn into_snapshot(self, game_mode: GameMode, raw: Value) -> MatchSnapshot {
        MatchSnapshot {
            match_id: self.game_id.to_string(),
            game_mode,
            queue_id: self.game_queue_config_id.unwrap_or(-1),
            started_at: epoch_millis(self.game_start_time),
            raw,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct LolMatchDto {
    pub info: LolMatchInfoDto,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LolMatchInfoDto {
    pub game_duration: i64,
    /// Only present on recent matches; without it `game_duration` is in milliseconds.
    #[serde(default)]
    pub game_end_timestamp: Option<i64>,
    #[serde(default)]
    pub queue_id: i64,
    pub participants: Vec<LolParticipantDto>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LolParticipantDto {
    #[serde(default)]
    pub riot_id_game_name: Option<String>,
    #[serde(default)]
    pub riot_id_tagline: Option<String>,
    pub win: bool,
    pub champion_name: String,
}

impl From<LolMatchDto> for LolMatchResult {
    fn from(value: LolMatchDto) -> Self {
        let info = value.info;
        let seconds = match info.game_end_timestamp {
            Some(_) => info.game_duration,
            None => info.game_duration / 1_000,
        };

        Self {
            duration_seconds: clamp_seconds(seconds),
            queue_id: info.queue_id,
            participants: info
                .participants
                .into_iter()
                .map(|p| LolParticipant {
                    game_name: p.riot_id_game_name.unwrap_or_default(),
                    tag_line: p.riot_id_tagline.unwrap_or_default(),
                    won: p.win,
                    champion_name: p.champion_name,
                })
                .collect(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct TftMatchDto {
    pub info: TftMatchInfoDto,
}

#[derive(Debug, Deserialize)]
pub struct TftMatchInfoDto {
    /// Seconds, reported as a float.
    pub game_length: f64,
    #[serde(default)]
    pub queue_id: i64,
    pub participants: Vec<TftParticipantDto>,
}

#[derive(Debug, Deserialize)]
pub struct TftParticipantDto {
    #[serde(default, rename = "riotIdGameName")]
    pub riot_id_game_name: Option<String>,
    #[serde(default, rename = "riotIdTagline")]
    pub riot_id_tagline: Option<String>,
    pub placement: u8,
}

impl From<TftMatchDto> for TftMatchResult {
    fn from(value: TftMatchDto) -> Self {
        let info = value.info;
        Self {
            duration_seconds: clamp_seconds(info.game_length.round() as i64),
            queue_id: info.queue_id,
            participants: info
                .participants
                .into_iter()
                .map(|p| TftParticipant {
                    game_name: p.riot_id_game_name.unwrap_or_default(),
                    tag_line: p.riot_id_tagline.unwrap_or_default(),
                    placement: p.placement,
                })
                .collect(),
        }
    }
}

fn epoch_millis(millis: i64) -> Option<SystemTime> {
    u64::try_from(millis)
        .ok()
        .filter(|millis| *millis > 0)
        .map(|millis| UNIX_EPOCH + Duration::from_millis(millis))
}

fn clamp_seconds(seconds: i64) -> u32 {
    u32::try_from(seconds.max(0)).unwrap_or(u32::MAX)
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn spectator_payload_becomes_snapshot() {
        let raw = json!({
            "gameId": 123,
            "gameQueueConfigId": 420,
            "gameStartTime": 1_700_000_000_000_i64,
            "participants": []
        });
        let dto: ActiveGameDto = serde_json::from_value(raw.clone()).unwrap();
        let snapshot = dto.into_snapshot(GameMode::Lol, raw.clone());

        assert_eq!(snapshot.match_id, "123");
        assert_eq!(snapshot.queue_id, 420);
        assert_eq!(
            snapshot.started_at,
            Some(UNIX_EPOCH + Duration::from_millis(1_700_000_000_000))
        );
        assert_eq!(snapshot.raw, raw);
    }

    #[test]
    fn loading_screen_has_no_start_time() {
        let raw = json!({"gameId": 9, "gameStartTime": 0});
        let dto: ActiveGameDto = serde_json::from_value(raw.clone()).unwrap();
        let snapshot = dto.into_snapshot(GameMode::Tft, raw);
        assert_eq!(snapshot.started_at, None);
        assert_eq!(snapshot.queue_id, -1);
    }

    #[test]
    fn legacy_lol_duration_is_milliseconds() {
        let dto: LolMatchDto = serde_json::from_value(json!({
            "info": {
                "gameDuration": 1_800_000,
                "queueId": 420,
                "participants": [{
                    "riotIdGameName": "Caps",
                    "riotIdTagline": "EUW",
                    "win": false,
                    "championName": "Sylas"
                }]
            }
        }))
        .unwrap();
        let result = LolMatchResult::from(dto);
        assert_eq!(result.duration_seconds, 1800);
        assert_eq!(result.participants[0].champion_name, "Sylas");
    }

    #[test]
    fn tft_length_rounds_to_seconds() {
        let dto: TftMatchDto = serde_json::from_value(json!({
            "info": {
                "game_length": 2039.6,
                "queue_id": 1100,
                "participants": [{
                    "riotIdGameName": "Dishsoap",
                    "riotIdTagline": "NA1",
                    "placement": 4
                }]
            }
        }))
        .unwrap();
        let result = TftMatchResult::from(dto);
        assert_eq!(result.duration_seconds, 2040);
        assert_eq!(result.participants[0].placement, 4);
    }
}
