mod config;
mod connection;
mod error;
mod models;
pub mod store;

pub use config::MongoConfig;
pub use error::MongoDaoError;
pub use store::MongoMatchStore;

use crate::dao::storage::StorageError;

impl From<MongoDaoError> for StorageError {
    fn from(err: MongoDaoError) -> Self {
        match err {
            MongoDaoError::DuplicateGame {
                player_id,
                match_id,
            } => StorageError::Duplicate {
                player_id,
                match_id,
            },
            MongoDaoError::CorruptDocument { id, reason } => StorageError::Corrupt { id, reason },
            other => StorageError::unavailable(other.to_string(), other),
        }
    }
}
