use std::{collections::HashMap, sync::Arc, time::SystemTime};

use futures::future::BoxFuture;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::dao::{
    match_store::MatchStore,
    models::{GameResult, NewTrackedGame, PlayerEntity, TrackedGameEntity},
    storage::{StorageError, StorageResult},
};

/// Process-local store used for development runs and tests.
#[derive(Clone, Default)]
pub struct MemoryMatchStore {
    inner: Arc<RwLock<MemoryState>>,
}

#[derive(Default)]
struct MemoryState {
    players: Vec<PlayerEntity>,
    games: HashMap<Uuid, TrackedGameEntity>,
    /// Unique index over `(player_id, match_id)`.
    game_keys: HashMap<(Uuid, String), Uuid>,
}

impl MemoryMatchStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a player, rejecting Riot IDs that already exist in any letter case.
    pub async fn add_player(
        &self,
        game_name: impl Into<String>,
        tag_line: impl Into<String>,
    ) -> StorageResult<PlayerEntity> {
        let player = PlayerEntity::new(game_name, tag_line);
        let mut state = self.inner.write().await;
        if state
            .players
            .iter()
            .any(|existing| existing.matches_riot_id(&player.game_name, &player.tag_line))
        {
            return Err(StorageError::DuplicatePlayer {
                riot_id: player.riot_id(),
            });
        }
        state.players.push(player.clone());
        Ok(player)
    }

    /// Remove a player and cascade the deletion to its tracked games.
    pub async fn remove_player(&self, player_id: Uuid) -> bool {
        let mut state = self.inner.write().await;
        let before = state.players.len();
        state.players.retain(|player| player.id != player_id);
        if state.players.len() == before {
            return false;
        }
        state.games.retain(|_, game| game.player_id != player_id);
        state.game_keys.retain(|(owner, _), _| *owner != player_id);
        true
    }

    /// Every tracked game regardless of status.
    pub async fn all_games(&self) -> Vec<TrackedGameEntity> {
        let state = self.inner.read().await;
        state.games.values().cloned().collect()
    }
}

impl MatchStore for MemoryMatchStore {
    fn list_players(&self) -> BoxFuture<'static, StorageResult<Vec<PlayerEntity>>> {
        let inner = self.inner.clone();
        Box::pin(async move { Ok(inner.read().await.players.clone()) })
    }

    fn find_game(
        &self,
        player_id: Uuid,
        match_id: &str,
    ) -> BoxFuture<'static, StorageResult<Option<TrackedGameEntity>>> {
        let inner = self.inner.clone();
        let key = (player_id, match_id.to_owned());
        Box::pin(async move {
            let state = inner.read().await;
            Ok(state
                .game_keys
                .get(&key)
                .and_then(|id| state.games.get(id))
                .cloned())
        })
    }

    fn create_game(
        &self,
        game: NewTrackedGame,
    ) -> BoxFuture<'static, StorageResult<TrackedGameEntity>> {
        let inner = self.inner.clone();
        Box::pin(async move {
            let mut state = inner.write().await;
            let key = (game.player_id, game.match_id.clone());
            if state.game_keys.contains_key(&key) {
                return Err(StorageError::Duplicate {
                    player_id: key.0,
                    match_id: key.1,
                });
            }
            let entity = TrackedGameEntity::from_new(game, SystemTime::now());
            state.game_keys.insert(key, entity.id);
            state.games.insert(entity.id, entity.clone());
            Ok(entity)
        })
    }

    fn list_active_games(&self) -> BoxFuture<'static, StorageResult<Vec<TrackedGameEntity>>> {
        let inner = self.inner.clone();
        Box::pin(async move {
            let state = inner.read().await;
            let mut active: Vec<_> = state
                .games
                .values()
                .filter(|game| game.is_active())
                .cloned()
                .collect();
            active.sort_by_key(|game| game.detected_at);
            Ok(active)
        })
    }

    fn finalize_game(
        &self,
        id: Uuid,
        result: GameResult,
        completed_at: SystemTime,
    ) -> BoxFuture<'static, StorageResult<bool>> {
        let inner = self.inner.clone();
        Box::pin(async move {
            let mut state = inner.write().await;
            Ok(state
                .games
                .get_mut(&id)
                .is_some_and(|game| game.finalize(result, completed_at)))
        })
    }

    fn annotate_error(
        &self,
        player_id: Uuid,
        match_id: &str,
        message: String,
    ) -> BoxFuture<'static, StorageResult<bool>> {
        let inner = self.inner.clone();
        let key = (player_id, match_id.to_owned());
        Box::pin(async move {
            let mut state = inner.write().await;
            let Some(id) = state.game_keys.get(&key).copied() else {
                return Ok(false);
            };
            match state.games.get_mut(&id) {
                Some(game) => {
                    game.last_error = Some(message);
                    Ok(true)
                }
                None => Ok(false),
            }
        })
    }

    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>> {
        Box::pin(async { Ok(()) })
    }
}
