use std::{sync::Arc, time::SystemTime};

use futures::{TryStreamExt, future::BoxFuture};
use mongodb::{
    Collection, Database,
    bson::doc,
    error::{Error as MongoError, ErrorKind, WriteFailure},
    options::IndexOptions,
};
use uuid::Uuid;

use super::{
    config::MongoConfig,
    connection::open_database,
    error::{MongoDaoError, MongoResult},
    models::{MongoPlayerDocument, MongoTrackedGameDocument, doc_id, game_key},
};
use crate::dao::{
    match_store::MatchStore,
    models::{GameResult, GameStatus, NewTrackedGame, PlayerEntity, TrackedGameEntity},
    storage::StorageResult,
};

const PLAYER_COLLECTION_NAME: &str = "players";
const GAME_COLLECTION_NAME: &str = "tracked_games";
const DUPLICATE_KEY_CODE: i32 = 11000;

#[derive(Clone)]
pub struct MongoMatchStore {
    inner: Arc<MongoInner>,
}

struct MongoInner {
    database: Database,
}

impl MongoMatchStore {
    /// Establish a connection to MongoDB and ensure indexes are present.
    pub async fn connect(config: MongoConfig) -> MongoResult<Self> {
        let database = open_database(&config).await?;

        let store = Self {
            inner: Arc::new(MongoInner { database }),
        };
        store.ensure_indexes().await?;
        Ok(store)
    }

    async fn ensure_indexes(&self) -> MongoResult<()> {
        let players = self.players();
        let player_index = mongodb::IndexModel::builder()
            .keys(doc! {"game_name_lower": 1, "tag_line_lower": 1})
            .options(
                IndexOptions::builder()
                    .name(Some("player_riot_id_idx".to_owned()))
                    .unique(Some(true))
                    .build(),
            )
            .build();
        players
            .create_index(player_index)
            .await
            .map_err(|source| MongoDaoError::EnsureIndex {
                collection: PLAYER_COLLECTION_NAME,
                index: "game_name_lower,tag_line_lower",
                source,
            })?;

        let games = self.games();
        let key_index = mongodb::IndexModel::builder()
            .keys(doc! {"player_id": 1, "match_id": 1})
            .options(
                IndexOptions::builder()
                    .name(Some("tracked_game_key_idx".to_owned()))
                    .unique(Some(true))
                    .build(),
            )
            .build();
        games
            .create_index(key_index)
            .await
            .map_err(|source| MongoDaoError::EnsureIndex {
                collection: GAME_COLLECTION_NAME,
                index: "player_id,match_id",
                source,
            })?;

        let status_index = mongodb::IndexModel::builder()
            .keys(doc! {"status": 1})
            .options(
                IndexOptions::builder()
                    .name(Some("tracked_game_status_idx".to_owned()))
                    .build(),
            )
            .build();
        games
            .create_index(status_index)
            .await
            .map_err(|source| MongoDaoError::EnsureIndex {
                collection: GAME_COLLECTION_NAME,
                index: "status",
                source,
            })?;

        Ok(())
    }

    fn players(&self) -> Collection<MongoPlayerDocument> {
        self.inner
            .database
            .collection::<MongoPlayerDocument>(PLAYER_COLLECTION_NAME)
    }

    fn games(&self) -> Collection<MongoTrackedGameDocument> {
        self.inner
            .database
            .collection::<MongoTrackedGameDocument>(GAME_COLLECTION_NAME)
    }

    async fn ping(&self) -> MongoResult<()> {
        self.inner
            .database
            .run_command(doc! { "ping": 1 })
            .await
            .map_err(|source| MongoDaoError::HealthPing { source })?;
        Ok(())
    }

    async fn list_players(&self) -> MongoResult<Vec<PlayerEntity>> {
        let documents: Vec<MongoPlayerDocument> = self
            .players()
            .find(doc! {})
            .await
            .map_err(|source| MongoDaoError::ListPlayers { source })?
            .try_collect()
            .await
            .map_err(|source| MongoDaoError::ListPlayers { source })?;

        documents.into_iter().map(TryInto::try_into).collect()
    }

    async fn find_game(
        &self,
        player_id: Uuid,
        match_id: String,
    ) -> MongoResult<Option<TrackedGameEntity>> {
        let document = self
            .games()
            .find_one(game_key(player_id, &match_id))
            .await
            .map_err(|source| MongoDaoError::LoadGame {
                player_id,
                match_id,
                source,
            })?;

        document.map(TryInto::try_into).transpose()
    }

    async fn create_game(&self, game: NewTrackedGame) -> MongoResult<TrackedGameEntity> {
        let entity = TrackedGameEntity::from_new(game, SystemTime::now());
        let document: MongoTrackedGameDocument = entity.clone().into();

        match self.games().insert_one(&document).await {
            Ok(_) => Ok(entity),
            Err(source) if is_duplicate_key(&source) => Err(MongoDaoError::DuplicateGame {
                player_id: entity.player_id,
                match_id: entity.match_id,
            }),
            Err(source) => Err(MongoDaoError::InsertGame {
                player_id: entity.player_id,
                match_id: entity.match_id,
                source,
            }),
        }
    }

    async fn list_active_games(&self) -> MongoResult<Vec<TrackedGameEntity>> {
        let documents: Vec<MongoTrackedGameDocument> = self
            .games()
            .find(doc! {"status": GameStatus::Active.as_str()})
            .sort(doc! {"detected_at": 1})
            .await
            .map_err(|source| MongoDaoError::ListActiveGames { source })?
            .try_collect()
            .await
            .map_err(|source| MongoDaoError::ListActiveGames { source })?;

        documents.into_iter().map(TryInto::try_into).collect()
    }

    async fn finalize_game(
        &self,
        id: Uuid,
        result: GameResult,
        completed_at: SystemTime,
    ) -> MongoResult<bool> {
        let mut active_filter = doc_id(id);
        active_filter.insert("status", GameStatus::Active.as_str());

        let collection = self.games();
        let Some(document) = collection
            .find_one(active_filter.clone())
            .await
            .map_err(|source| MongoDaoError::FinalizeGame { id, source })?
        else {
            return Ok(false);
        };

        let mut entity: TrackedGameEntity = document.try_into()?;
        if !entity.finalize(result, completed_at) {
            return Ok(false);
        }

        // The status guard in the filter keeps this a single conditional write.
        let replaced: MongoTrackedGameDocument = entity.into();
        let outcome = collection
            .replace_one(active_filter, &replaced)
            .await
            .map_err(|source| MongoDaoError::FinalizeGame { id, source })?;

        Ok(outcome.matched_count > 0)
    }

    async fn annotate_error(
        &self,
        player_id: Uuid,
        match_id: String,
        message: String,
    ) -> MongoResult<bool> {
        let outcome = self
            .games()
            .update_one(
                game_key(player_id, &match_id),
                doc! {"$set": {"last_error": message}},
            )
            .await
            .map_err(|source| MongoDaoError::AnnotateGame {
                player_id,
                match_id,
                source,
            })?;

        Ok(outcome.matched_count > 0)
    }
}

fn is_duplicate_key(err: &MongoError) -> bool {
    matches!(
        err.kind.as_ref(),
        ErrorKind::Write(WriteFailure::WriteError(write)) if write.code == DUPLICATE_KEY_CODE
    )
}

impl MatchStore for MongoMatchStore {
    fn list_players(&self) -> BoxFuture<'static, StorageResult<Vec<PlayerEntity>>> {
        let store = self.clone();
        Box::pin(async move { store.list_players().await.map_err(Into::into) })
    }

    fn find_game(
        &self,
        player_id: Uuid,
        match_id: &str,
    ) -> BoxFuture<'static, StorageResult<Option<TrackedGameEntity>>> {
        let store = self.clone();
        let match_id = match_id.to_owned();
        Box::pin(async move {
            store
                .find_game(player_id, match_id)
                .await
                .map_err(Into::into)
        })
    }

    fn create_game(
        &self,
        game: NewTrackedGame,
    ) -> BoxFuture<'static, StorageResult<TrackedGameEntity>> {
        let store = self.clone();
        Box::pin(async move { store.create_game(game).await.map_err(Into::into) })
    }

    fn list_active_games(&self) -> BoxFuture<'static, StorageResult<Vec<TrackedGameEntity>>> {
        let store = self.clone();
        Box::pin(async move { store.list_active_games().await.map_err(Into::into) })
    }

    fn finalize_game(
        &self,
        id: Uuid,
        result: GameResult,
        completed_at: SystemTime,
    ) -> BoxFuture<'static, StorageResult<bool>> {
        let store = self.clone();
        Box::pin(async move {
            store
                .finalize_game(id, result, completed_at)
                .await
                .map_err(Into::into)
        })
    }

    fn annotate_error(
        &self,
        player_id: Uuid,
        match_id: &str,
        message: String,
    ) -> BoxFuture<'static, StorageResult<bool>> {
        let store = self.clone();
        let match_id = match_id.to_owned();
        Box::pin(async move {
            store
                .annotate_error(player_id, match_id, message)
                .await
                .map_err(Into::into)
        })
    }

    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.ping().await.map_err(Into::into) })
    }
}
