//! Application-level configuration loading: polling pace, Riot hosts and seed players.

use std::{env, fs, io::ErrorKind, path::PathBuf, time::Duration};

use serde::Deserialize;
use tracing::{info, warn};

use crate::services::polling::PollingConfig;

/// Default location on disk where the server looks for the JSON configuration.
const DEFAULT_CONFIG_PATH: &str = "config/app.json";
/// Environment variable that overrides [`DEFAULT_CONFIG_PATH`].
const CONFIG_PATH_ENV: &str = "MATCH_TRACKER_CONFIG_PATH";

const DEFAULT_MIN_REQUEST_DELAY: Duration = Duration::from_millis(1_200);
const DEFAULT_RETRY_AFTER: Duration = Duration::from_secs(10);
const DEFAULT_REGIONAL_BASE_URL: &str = "https://americas.api.riotgames.com";
const DEFAULT_PLATFORM_BASE_URL: &str = "https://na1.api.riotgames.com";
const DEFAULT_PLATFORM_ID: &str = "NA1";

#[derive(Debug, Clone, PartialEq)]
/// Immutable runtime configuration shared across the application.
pub struct AppConfig {
    pub polling: PollingConfig,
    pub min_request_delay: Duration,
    pub default_retry_after: Duration,
    pub regional_base_url: String,
    pub platform_base_url: String,
    pub platform_id: String,
    /// Riot IDs registered in the memory store at startup.
    pub seed_players: Vec<SeedPlayer>,
}

/// A `Name#TAG` entry from the configuration file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeedPlayer {
    pub game_name: String,
    pub tag_line: String,
}

impl SeedPlayer {
    /// Split a `Name#TAG` Riot ID at its last `#`.
    pub fn parse(riot_id: &str) -> Option<Self> {
        let (game_name, tag_line) = riot_id.trim().rsplit_once('#')?;
        if game_name.is_empty() || tag_line.is_empty() {
            return None;
        }
        Some(Self {
            game_name: game_name.to_string(),
            tag_line: tag_line.to_string(),
        })
    }
}

impl AppConfig {
    /// Load the application configuration from disk, falling back to built-in defaults.
    pub fn load() -> Self {
        let path = resolve_config_path();
        match fs::read_to_string(&path) {
            Ok(contents) => match Self::from_json(&contents) {
                Ok(app_config) => {
                    info!(
                        path = %path.display(),
                        seed_players = app_config.seed_players.len(),
                        "loaded configuration"
                    );
                    app_config
                }
                Err(err) => {
                    warn!(
                        path = %path.display(),
                        error = %err,
                        "failed to parse config; falling back to defaults"
                    );
                    Self::default()
                }
            },
            Err(err) if err.kind() == ErrorKind::NotFound => {
                info!(
                    path = %path.display(),
                    "config file not found; using built-in defaults"
                );
                Self::default()
            }
            Err(err) => {
                warn!(
                    path = %path.display(),
                    error = %err,
                    "failed to read config; falling back to defaults"
                );
                Self::default()
            }
        }
    }

    /// Parse a JSON document, defaulting every absent field.
    pub fn from_json(contents: &str) -> serde_json::Result<Self> {
        serde_json::from_str::<RawConfig>(contents).map(Into::into)
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        RawConfig::default().into()
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
/// JSON representation of the configuration file located at [`DEFAULT_CONFIG_PATH`].
struct RawConfig {
    polling: RawPolling,
    riot: RawRiot,
    players: Vec<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawPolling {
    detection_interval_secs: Option<u64>,
    completion_interval_secs: Option<u64>,
    completion_start_delay_secs: Option<u64>,
    error_backoff_cap_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawRiot {
    regional_base_url: Option<String>,
    platform_base_url: Option<String>,
    platform_id: Option<String>,
    min_request_delay_ms: Option<u64>,
    default_retry_after_secs: Option<u64>,
}

impl From<RawConfig> for AppConfig {
    fn from(value: RawConfig) -> Self {
        let defaults = PollingConfig::default();
        let polling = PollingConfig {
            detection_interval: secs_or(value.polling.detection_interval_secs, defaults.detection_interval),
            completion_interval: secs_or(value.polling.completion_interval_secs, defaults.completion_interval),
            completion_start_delay: secs_or(
                value.polling.completion_start_delay_secs,
                defaults.completion_start_delay,
            ),
            error_backoff_cap: secs_or(value.polling.error_backoff_cap_secs, defaults.error_backoff_cap),
        };

        let seed_players = value
            .players
            .iter()
            .filter_map(|riot_id| {
                let parsed = SeedPlayer::parse(riot_id);
                if parsed.is_none() {
                    warn!(riot_id = %riot_id, "ignoring malformed seed player");
                }
                parsed
            })
            .collect();

        let riot = value.riot;
        Self {
            polling,
            min_request_delay: riot
                .min_request_delay_ms
                .map(Duration::from_millis)
                .unwrap_or(DEFAULT_MIN_REQUEST_DELAY),
            default_retry_after: secs_or(riot.default_retry_after_secs, DEFAULT_RETRY_AFTER),
            regional_base_url: riot
                .regional_base_url
                .unwrap_or_else(|| DEFAULT_REGIONAL_BASE_URL.into()),
            platform_base_url: riot
                .platform_base_url
                .unwrap_or_else(|| DEFAULT_PLATFORM_BASE_URL.into()),
            platform_id: riot.platform_id.unwrap_or_else(|| DEFAULT_PLATFORM_ID.into()),
            seed_players,
        }
    }
}

fn secs_or(value: Option<u64>, default: Duration) -> Duration {
    value.map(Duration::from_secs).unwrap_or(default)
}

/// Resolve the configuration path taking the environment override into account.
fn resolve_config_path() -> PathBuf {
    env::var_os(CONFIG_PATH_ENV)
        .map(PathBuf::from)
        .filter(|path| !path.as_os_str().is_empty())
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_uses_defaults() {
        let config = AppConfig::from_json("{}").unwrap();
        assert_eq!(config, AppConfig::default());
        assert_eq!(config.polling.detection_interval, Duration::from_secs(30));
        assert_eq!(config.polling.completion_interval, Duration::from_secs(60));
        assert_eq!(config.min_request_delay, Duration::from_millis(1_200));
        assert_eq!(config.platform_id, "NA1");
    }

    #[test]
    fn partial_document_overrides_only_given_fields() {
        let config = AppConfig::from_json(
            r#"{
                "polling": { "detection_interval_secs": 5 },
                "riot": { "platform_id": "EUW1", "min_request_delay_ms": 50 },
                "players": ["Caps#EUW", "broken", "Hide on bush#KR1"]
            }"#,
        )
        .unwrap();

        assert_eq!(config.polling.detection_interval, Duration::from_secs(5));
        assert_eq!(config.polling.completion_start_delay, Duration::from_secs(10));
        assert_eq!(config.platform_id, "EUW1");
        assert_eq!(config.min_request_delay, Duration::from_millis(50));
        assert_eq!(
            config.seed_players,
            vec![
                SeedPlayer {
                    game_name: "Caps".into(),
                    tag_line: "EUW".into(),
                },
                SeedPlayer {
                    game_name: "Hide on bush".into(),
                    tag_line: "KR1".into(),
                },
            ]
        );
    }

    #[test]
    fn seed_player_needs_both_parts() {
        assert_eq!(SeedPlayer::parse("#EUW"), None);
        assert_eq!(SeedPlayer::parse("Caps#"), None);
        assert!(SeedPlayer::parse("a#b#c").is_some_and(|p| p.game_name == "a#b"));
    }
}
