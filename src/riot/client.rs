use std::{sync::Arc, time::Duration};

use futures::future::BoxFuture;
use reqwest::{
    Client, StatusCode, Url,
    header::{HeaderMap, RETRY_AFTER},
};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, warn};

use crate::dao::models::GameMode;

use super::{
    CredentialScope, MatchResult, MatchSnapshot, Puuid, RiotApi,
    error::{RiotError, RiotResult},
    identity::IdentityCache,
    models::{AccountDto, ActiveGameDto, LolMatchDto, TftMatchDto},
    rate_limit::RateLimiter,
};

const TOKEN_HEADER: &str = "X-Riot-Token";
const LOL_KEY_ENV: &str = "RIOT_LOL_API_KEY";
const TFT_KEY_ENV: &str = "RIOT_TFT_API_KEY";

/// Runtime configuration describing how to reach the Riot API.
#[derive(Debug, Clone)]
pub struct RiotConfig {
    /// Regional routing host serving account-v1 and the match endpoints.
    pub regional_base_url: String,
    /// Platform host serving the spectator endpoints.
    pub platform_base_url: String,
    /// Platform id prefixed to spectator game ids to form match ids (e.g. `NA1`).
    pub platform_id: String,
    pub lol_api_key: String,
    pub tft_api_key: String,
    pub min_request_delay: Duration,
    /// Cooldown applied when a 429 carries no usable `Retry-After` header.
    pub default_retry_after: Duration,
}

impl RiotConfig {
    /// Construct a configuration for the North America hosts with explicit keys.
    pub fn new(lol_api_key: impl Into<String>, tft_api_key: impl Into<String>) -> Self {
        Self {
            regional_base_url: "https://americas.api.riotgames.com".into(),
            platform_base_url: "https://na1.api.riotgames.com".into(),
            platform_id: "NA1".into(),
            lol_api_key: lol_api_key.into(),
            tft_api_key: tft_api_key.into(),
            min_request_delay: Duration::from_millis(1_200),
            default_retry_after: Duration::from_secs(10),
        }
    }

    /// Point the client at other hosts.
    pub fn with_hosts(
        mut self,
        regional_base_url: impl Into<String>,
        platform_base_url: impl Into<String>,
        platform_id: impl Into<String>,
    ) -> Self {
        self.regional_base_url = regional_base_url.into();
        self.platform_base_url = platform_base_url.into();
        self.platform_id = platform_id.into();
        self
    }

    /// Adjust request pacing.
    pub fn with_pacing(mut self, min_request_delay: Duration, default_retry_after: Duration) -> Self {
        self.min_request_delay = min_request_delay;
        self.default_retry_after = default_retry_after;
        self
    }

    /// Build a configuration by reading the API keys from the environment.
    ///
    /// Either key falls back to the other when only one is set. Identifiers stay cached per
    /// scope regardless.
    pub fn from_env() -> RiotResult<Self> {
        Self::from_keys(
            std::env::var(LOL_KEY_ENV).ok(),
            std::env::var(TFT_KEY_ENV).ok(),
        )
    }

    fn from_keys(lol: Option<String>, tft: Option<String>) -> RiotResult<Self> {
        let lol = lol.filter(|key| !key.is_empty());
        let tft = tft.filter(|key| !key.is_empty());

        match (lol, tft) {
            (Some(lol), Some(tft)) => Ok(Self::new(lol, tft)),
            (Some(key), None) | (None, Some(key)) => Ok(Self::new(key.clone(), key)),
            (None, None) => Err(RiotError::MissingApiKey {
                lol_var: LOL_KEY_ENV,
                tft_var: TFT_KEY_ENV,
            }),
        }
    }
}

/// Rate-limited Riot API client with per-scope identity caching.
#[derive(Clone)]
pub struct RiotClient {
    inner: Arc<ClientInner>,
}

struct ClientInner {
    http: Client,
    regional_base: Url,
    platform_base: Url,
    platform_id: String,
    lol_api_key: String,
    tft_api_key: String,
    default_retry_after: Duration,
    limiter: RateLimiter,
    identities: IdentityCache,
}

impl RiotClient {
    pub fn new(config: RiotConfig) -> RiotResult<Self> {
        let http = Client::builder()
            .build()
            .map_err(|source| RiotError::ClientBuilder { source })?;

        Ok(Self {
            inner: Arc::new(ClientInner {
                http,
                regional_base: parse_base_url(&config.regional_base_url)?,
                platform_base: parse_base_url(&config.platform_base_url)?,
                platform_id: config.platform_id.to_uppercase(),
                lol_api_key: config.lol_api_key,
                tft_api_key: config.tft_api_key,
                default_retry_after: config.default_retry_after,
                limiter: RateLimiter::new(config.min_request_delay),
                identities: IdentityCache::new(),
            }),
        })
    }

    /// Resolved identifiers cached so far.
    pub fn identities(&self) -> &IdentityCache {
        &self.inner.identities
    }

    fn api_key(&self, scope: CredentialScope) -> &str {
        match scope {
            CredentialScope::Lol => &self.inner.lol_api_key,
            CredentialScope::Tft => &self.inner.tft_api_key,
        }
    }

    async fn get_json(&self, url: Url, scope: CredentialScope) -> RiotResult<Option<Value>> {
        let path = url.path().to_owned();

        self.inner.limiter.acquire().await;
        debug!(%path, "sending Riot API request");

        let response = self
            .inner
            .http
            .get(url)
            .header(TOKEN_HEADER, self.api_key(scope))
            .send()
            .await
            .map_err(|source| RiotError::RequestSend {
                path: path.clone(),
                source,
            })?;

        match response.status() {
            StatusCode::NOT_FOUND => Ok(None),
            StatusCode::TOO_MANY_REQUESTS => {
                let retry_after = parse_retry_after(response.headers())
                    .unwrap_or(self.inner.default_retry_after);
                warn!(
                    %path,
                    retry_after_secs = retry_after.as_secs(),
                    "Riot API rate limit hit; cooling down"
                );
                self.inner.limiter.cool_down(retry_after).await;
                Err(RiotError::RateLimited { retry_after })
            }
            status if status.is_success() => response
                .json::<Value>()
                .await
                .map(Some)
                .map_err(|source| RiotError::DecodeResponse { path, source }),
            other => Err(RiotError::RequestStatus {
                path,
                status: other,
            }),
        }
    }

    async fn resolve(
        &self,
        game_name: &str,
        tag_line: &str,
        scope: CredentialScope,
    ) -> RiotResult<Puuid> {
        if let Some(puuid) = self.inner.identities.get(game_name, tag_line, scope) {
            return Ok(puuid);
        }

        let url = endpoint(
            &self.inner.regional_base,
            &[
                "riot",
                "account",
                "v1",
                "accounts",
                "by-riot-id",
                game_name,
                tag_line,
            ],
        );
        let path = url.path().to_owned();
        let Some(value) = self.get_json(url, scope).await? else {
            return Err(RiotError::NotFound {
                riot_id: format!("{game_name}#{tag_line}"),
            });
        };

        let account: AccountDto = decode(&path, value)?;
        self.inner
            .identities
            .insert(game_name, tag_line, scope, account.puuid.clone());
        debug!(riot_id = %format!("{game_name}#{tag_line}"), ?scope, "resolved Riot identity");
        Ok(account.puuid)
    }

    async fn active_game(
        &self,
        game_name: &str,
        tag_line: &str,
        game_mode: GameMode,
    ) -> RiotResult<Option<MatchSnapshot>> {
        let puuid = self
            .resolve(game_name, tag_line, CredentialScope::for_mode(game_mode))
            .await?;

        let url = match game_mode {
            GameMode::Lol => endpoint(
                &self.inner.platform_base,
                &[
                    "lol",
                    "spectator",
                    "v5",
                    "active-games",
                    "by-summoner",
                    puuid.as_str(),
                ],
            ),
            GameMode::Tft => endpoint(
                &self.inner.platform_base,
                &[
                    "lol",
                    "spectator",
                    "tft",
                    "v5",
                    "active-games",
                    "by-puuid",
                    puuid.as_str(),
                ],
            ),
        };
        let path = url.path().to_owned();

        let Some(raw) = self
            .get_json(url, CredentialScope::for_mode(game_mode))
            .await?
        else {
            return Ok(None);
        };

        let game: ActiveGameDto = decode(&path, raw.clone())?;
        Ok(Some(game.into_snapshot(game_mode, raw)))
    }

    async fn match_result(
        &self,
        match_id: &str,
        game_mode: GameMode,
    ) -> RiotResult<Option<MatchResult>> {
        let qualified = self.qualified_match_id(match_id);
        let url = match game_mode {
            GameMode::Lol => endpoint(
                &self.inner.regional_base,
                &["lol", "match", "v5", "matches", qualified.as_str()],
            ),
            GameMode::Tft => endpoint(
                &self.inner.regional_base,
                &["tft", "match", "v1", "matches", qualified.as_str()],
            ),
        };
        let path = url.path().to_owned();

        let Some(value) = self
            .get_json(url, CredentialScope::for_mode(game_mode))
            .await?
        else {
            return Ok(None);
        };

        let result = match game_mode {
            GameMode::Lol => MatchResult::Lol(decode::<LolMatchDto>(&path, value)?.into()),
            GameMode::Tft => MatchResult::Tft(decode::<TftMatchDto>(&path, value)?.into()),
        };
        Ok(Some(result))
    }

    /// Spectator ids are bare numbers; the match endpoints want `PLATFORM_id`.
    fn qualified_match_id(&self, match_id: &str) -> String {
        if match_id.contains('_') {
            match_id.to_owned()
        } else {
            format!("{}_{}", self.inner.platform_id, match_id)
        }
    }
}

impl RiotApi for RiotClient {
    fn resolve_identity(
        &self,
        game_name: &str,
        tag_line: &str,
        scope: CredentialScope,
    ) -> BoxFuture<'static, RiotResult<Puuid>> {
        let client = self.clone();
        let (game_name, tag_line) = (game_name.to_owned(), tag_line.to_owned());
        Box::pin(async move { client.resolve(&game_name, &tag_line, scope).await })
    }

    fn get_active_match(
        &self,
        game_name: &str,
        tag_line: &str,
    ) -> BoxFuture<'static, RiotResult<Option<MatchSnapshot>>> {
        let client = self.clone();
        let (game_name, tag_line) = (game_name.to_owned(), tag_line.to_owned());
        Box::pin(async move {
            let (lol, tft) = futures::join!(
                client.active_game(&game_name, &tag_line, GameMode::Lol),
                client.active_game(&game_name, &tag_line, GameMode::Tft),
            );
            merge_active_lookups(lol, tft)
        })
    }

    fn get_match_result(
        &self,
        match_id: &str,
        game_mode: GameMode,
    ) -> BoxFuture<'static, RiotResult<Option<MatchResult>>> {
        let client = self.clone();
        let match_id = match_id.to_owned();
        Box::pin(async move { client.match_result(&match_id, game_mode).await })
    }
}

/// Combine the per-mode lookups: a live match wins (LoL first), then the first error, then
/// absence.
fn merge_active_lookups(
    lol: RiotResult<Option<MatchSnapshot>>,
    tft: RiotResult<Option<MatchSnapshot>>,
) -> RiotResult<Option<MatchSnapshot>> {
    match (lol, tft) {
        (Ok(Some(snapshot)), _) | (_, Ok(Some(snapshot))) => Ok(Some(snapshot)),
        (Err(err), _) | (_, Err(err)) => Err(err),
        (Ok(None), Ok(None)) => Ok(None),
    }
}

fn parse_base_url(raw: &str) -> RiotResult<Url> {
    let url = Url::parse(raw).map_err(|err| RiotError::InvalidBaseUrl {
        url: raw.to_owned(),
        reason: err.to_string(),
    })?;
    if url.cannot_be_a_base() {
        return Err(RiotError::InvalidBaseUrl {
            url: raw.to_owned(),
            reason: "cannot be used as a base".into(),
        });
    }
    Ok(url)
}

/// Append percent-encoded path segments to a validated base URL.
fn endpoint(base: &Url, segments: &[&str]) -> Url {
    let mut url = base.clone();
    if let Ok(mut path) = url.path_segments_mut() {
        path.pop_if_empty().extend(segments);
    }
    url
}

fn decode<T: DeserializeOwned>(path: &str, value: Value) -> RiotResult<T> {
    serde_json::from_value(value).map_err(|source| RiotError::DeserializeValue {
        path: path.to_owned(),
        source,
    })
}

fn parse_retry_after(headers: &HeaderMap) -> Option<Duration> {
    headers
        .get(RETRY_AFTER)?
        .to_str()
        .ok()?
        .trim()
        .parse::<u64>()
        .ok()
        .map(Duration::from_secs)
}

#[cfg(test)]
mod tests {
    use reqwest::header::HeaderValue;
    use serde_json::json;

    use super::*;

    #[test]
    fn missing_keys_name_both_variables() {
        let err = RiotConfig::from_keys(None, Some(String::new())).unwrap_err();
        assert_eq!(
            err.to_string(),
            "missing Riot API key: set `RIOT_LOL_API_KEY` or `RIOT_TFT_API_KEY`"
        );
    }

    fn snapshot(match_id: &str, game_mode: GameMode) -> MatchSnapshot {
        MatchSnapshot {
            match_id: match_id.into(),
            game_mode,
            queue_id: 420,
            started_at: None,
            raw: json!({}),
        }
    }

    fn throttled() -> RiotError {
        RiotError::RateLimited {
            retry_after: Duration::from_secs(1),
        }
    }

    #[test]
    fn live_match_wins_over_absence_and_errors() {
        let merged = merge_active_lookups(Ok(None), Ok(Some(snapshot("9", GameMode::Tft))));
        assert_eq!(merged.unwrap().unwrap().game_mode, GameMode::Tft);

        let merged = merge_active_lookups(Err(throttled()), Ok(Some(snapshot("9", GameMode::Tft))));
        assert_eq!(merged.unwrap().unwrap().match_id, "9");

        let merged = merge_active_lookups(
            Ok(Some(snapshot("1", GameMode::Lol))),
            Ok(Some(snapshot("2", GameMode::Tft))),
        );
        assert_eq!(merged.unwrap().unwrap().match_id, "1");
    }

    #[test]
    fn absence_in_both_modes_is_none() {
        assert!(merge_active_lookups(Ok(None), Ok(None)).unwrap().is_none());
    }

    #[test]
    fn first_error_propagates() {
        let err = merge_active_lookups(
            Err(RiotError::NotFound {
                riot_id: "a#b".into(),
            }),
            Err(throttled()),
        )
        .unwrap_err();
        assert!(err.is_not_found());

        let err = merge_active_lookups(Ok(None), Err(throttled())).unwrap_err();
        assert!(err.is_rate_limited());
    }

    #[test]
    fn endpoint_percent_encodes_riot_ids() {
        let base = parse_base_url("https://americas.api.riotgames.com").unwrap();
        let url = endpoint(&base, &["riot", "account", "by-riot-id", "Hide on bush", "KR1"]);
        assert_eq!(
            url.as_str(),
            "https://americas.api.riotgames.com/riot/account/by-riot-id/Hide%20on%20bush/KR1"
        );
    }

    #[test]
    fn invalid_base_urls_are_rejected() {
        assert!(parse_base_url("not a url").is_err());
        assert!(parse_base_url("mailto:someone@example.com").is_err());
    }

    #[test]
    fn retry_after_parses_seconds() {
        let mut headers = HeaderMap::new();
        assert_eq!(parse_retry_after(&headers), None);

        headers.insert(RETRY_AFTER, HeaderValue::from_static("7"));
        assert_eq!(parse_retry_after(&headers), Some(Duration::from_secs(7)));

        headers.insert(RETRY_AFTER, HeaderValue::from_static("soon"));
        assert_eq!(parse_retry_after(&headers), None);
    }

    #[test]
    fn spectator_ids_get_platform_prefix() {
        let client = RiotClient::new(RiotConfig::new("lol", "tft")).unwrap();
        assert_eq!(client.qualified_match_id("123"), "NA1_123");
        assert_eq!(client.qualified_match_id("EUW1_55"), "EUW1_55");
    }
}
