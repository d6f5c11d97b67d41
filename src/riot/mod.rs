//! Riot API access: identity resolution, live-game lookups and match results.

pub mod client;
mod error;
mod identity;
mod models;
mod queue;
mod rate_limit;

use std::time::SystemTime;

use futures::future::BoxFuture;
use serde_json::Value;

use crate::dao::models::{GameMode, GameResult, riot_id_eq};

pub use client::{RiotClient, RiotConfig};
pub use error::{RiotError, RiotResult};
pub use identity::IdentityCache;
pub use queue::QueueType;
pub use rate_limit::RateLimiter;

/// Player identifier returned by account-v1, scoped to the API key that resolved it.
pub type Puuid = String;

/// API credential an identifier was resolved under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CredentialScope {
    Lol,
    Tft,
}

impl CredentialScope {
    /// Scope whose key serves lookups for the given game mode.
    pub fn for_mode(mode: GameMode) -> Self {
        match mode {
            GameMode::Lol => CredentialScope::Lol,
            GameMode::Tft => CredentialScope::Tft,
        }
    }
}

/// A match a player is currently in, as seen by a spectator endpoint.
#[derive(Debug, Clone, PartialEq)]
pub struct MatchSnapshot {
    pub match_id: String,
    pub game_mode: GameMode,
    pub queue_id: i64,
    /// `None` while the match is still in loading screen.
    pub started_at: Option<SystemTime>,
    /// Upstream payload as received.
    pub raw: Value,
}

impl MatchSnapshot {
    pub fn queue_type(&self) -> QueueType {
        QueueType::from_id(self.queue_id)
    }
}

/// Finished match as reported by the match endpoints, covering every participant.
#[derive(Debug, Clone, PartialEq)]
pub enum MatchResult {
    Lol(LolMatchResult),
    Tft(TftMatchResult),
}

#[derive(Debug, Clone, PartialEq)]
pub struct LolMatchResult {
    pub duration_seconds: u32,
    pub queue_id: i64,
    pub participants: Vec<LolParticipant>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LolParticipant {
    pub game_name: String,
    pub tag_line: String,
    pub won: bool,
    pub champion_name: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TftMatchResult {
    pub duration_seconds: u32,
    pub queue_id: i64,
    pub participants: Vec<TftParticipant>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TftParticipant {
    pub game_name: String,
    pub tag_line: String,
    pub placement: u8,
}

impl MatchResult {
    pub fn game_mode(&self) -> GameMode {
        match self {
            MatchResult::Lol(_) => GameMode::Lol,
            MatchResult::Tft(_) => GameMode::Tft,
        }
    }

    /// Extract one player's outcome, matching the Riot ID case-insensitively.
    ///
    /// Returns `None` when the player is not among the participants or the reported
    /// placement is outside `1..=8`.
    pub fn result_for(&self, game_name: &str, tag_line: &str) -> Option<GameResult> {
        match self {
            MatchResult::Lol(result) => result
                .participants
                .iter()
                .find(|p| riot_id_eq(&p.game_name, &p.tag_line, game_name, tag_line))
                .map(|p| GameResult::Lol {
                    won: p.won,
                    duration_seconds: result.duration_seconds,
                    champion_played: p.champion_name.clone(),
                }),
            MatchResult::Tft(result) => result
                .participants
                .iter()
                .find(|p| riot_id_eq(&p.game_name, &p.tag_line, game_name, tag_line))
                .filter(|p| (1..=8).contains(&p.placement))
                .map(|p| GameResult::Tft {
                    placement: p.placement,
                    duration_seconds: result.duration_seconds,
                }),
        }
    }
}

/// Seam between the tracking loops and the Riot API.
pub trait RiotApi: Send + Sync {
    /// Resolve a Riot ID to the identifier valid under `scope`.
    fn resolve_identity(
        &self,
        game_name: &str,
        tag_line: &str,
        scope: CredentialScope,
    ) -> BoxFuture<'static, RiotResult<Puuid>>;

    /// Check both game modes for a live match. `Ok(None)` when the player is in neither.
    fn get_active_match(
        &self,
        game_name: &str,
        tag_line: &str,
    ) -> BoxFuture<'static, RiotResult<Option<MatchSnapshot>>>;

    /// Fetch the result of a finished match. `Ok(None)` when it is not available yet.
    fn get_match_result(
        &self,
        match_id: &str,
        game_mode: GameMode,
    ) -> BoxFuture<'static, RiotResult<Option<MatchResult>>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tft_result(placement: u8) -> MatchResult {
        MatchResult::Tft(TftMatchResult {
            duration_seconds: 2040,
            queue_id: 1100,
            participants: vec![
                TftParticipant {
                    game_name: "Someone".into(),
                    tag_line: "NA1".into(),
                    placement: 1,
                },
                TftParticipant {
                    game_name: "Dishsoap".into(),
                    tag_line: "NA1".into(),
                    placement,
                },
            ],
        })
    }

    #[test]
    fn lol_result_matches_participant_ignoring_case() {
        let result = MatchResult::Lol(LolMatchResult {
            duration_seconds: 1800,
            queue_id: 420,
            participants: vec![LolParticipant {
                game_name: "Doublelift".into(),
                tag_line: "NA1".into(),
                won: true,
                champion_name: "Jinx".into(),
            }],
        });

        assert_eq!(
            result.result_for("DOUBLELIFT", "na1"),
            Some(GameResult::Lol {
                won: true,
                duration_seconds: 1800,
                champion_played: "Jinx".into(),
            })
        );
        assert_eq!(result.result_for("Doublelift", "EUW"), None);
    }

    #[test]
    fn tft_result_carries_placement() {
        assert_eq!(
            tft_result(3).result_for("dishsoap", "NA1"),
            Some(GameResult::Tft {
                placement: 3,
                duration_seconds: 2040,
            })
        );
    }

    #[test]
    fn out_of_range_placement_is_not_a_result() {
        assert_eq!(tft_result(0).result_for("Dishsoap", "NA1"), None);
        assert_eq!(tft_result(9).result_for("Dishsoap", "NA1"), None);
    }
}
