use mongodb::error::Error as MongoError;
use thiserror::Error;
use uuid::Uuid;

pub type MongoResult<T> = std::result::Result<T, MongoDaoError>;

#[derive(Debug, Error)]
pub enum MongoDaoError {
    #[error("missing MongoDB environment variable `{var}`")]
    MissingEnvVar { var: &'static str },
    #[error("failed to parse MongoDB connection URI `{uri}`")]
    InvalidUri {
        uri: String,
        #[source]
        source: MongoError,
    },
    #[error("failed to build MongoDB client from options")]
    ClientConstruction {
        #[source]
        source: MongoError,
    },
    #[error("MongoDB ping failed during initial connection after {attempts} attempt(s)")]
    InitialPing {
        attempts: u32,
        #[source]
        source: MongoError,
    },
    #[error("MongoDB ping health check failed")]
    HealthPing {
        #[source]
        source: MongoError,
    },
    #[error("failed to ensure index `{index}` on collection `{collection}`")]
    EnsureIndex {
        collection: &'static str,
        index: &'static str,
        #[source]
        source: MongoError,
    },
    #[error("failed to list players")]
    ListPlayers {
        #[source]
        source: MongoError,
    },
    #[error("failed to load tracked game `{match_id}` for player `{player_id}`")]
    LoadGame {
        player_id: Uuid,
        match_id: String,
        #[source]
        source: MongoError,
    },
    #[error("failed to insert tracked game `{match_id}` for player `{player_id}`")]
    InsertGame {
        player_id: Uuid,
        match_id: String,
        #[source]
        source: MongoError,
    },
    #[error("tracked game `{match_id}` already exists for player `{player_id}`")]
    DuplicateGame { player_id: Uuid, match_id: String },
    #[error("failed to list active tracked games")]
    ListActiveGames {
        #[source]
        source: MongoError,
    },
    #[error("failed to finalize tracked game `{id}`")]
    FinalizeGame {
        id: Uuid,
        #[source]
        source: MongoError,
    },
    #[error("failed to annotate tracked game `{match_id}` for player `{player_id}`")]
    AnnotateGame {
        player_id: Uuid,
        match_id: String,
        #[source]
        source: MongoError,
    },
    #[error("corrupt document `{id}`: {reason}")]
    CorruptDocument { id: String, reason: String },
}
