use std::error::Error;
use thiserror::Error;
use uuid::Uuid;

/// Result alias for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Error raised by storage backends regardless of the underlying database.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("storage unavailable: {message}")]
    Unavailable {
        message: String,
        #[source]
        source: Box<dyn Error + Send + Sync>,
    },
    /// The `(player_id, match_id)` pair is already tracked.
    #[error("match `{match_id}` is already tracked for player `{player_id}`")]
    Duplicate { player_id: Uuid, match_id: String },
    /// Another player already uses this Riot ID (compared case-insensitively).
    #[error("player `{riot_id}` is already registered")]
    DuplicatePlayer { riot_id: String },
    /// A stored document could not be mapped back to an entity.
    #[error("corrupt record `{id}`: {reason}")]
    Corrupt { id: String, reason: String },
}

impl StorageError {
    /// Construct an unavailable error from any backend failure.
    pub fn unavailable(message: String, source: impl Error + Send + Sync + 'static) -> Self {
        StorageError::Unavailable {
            message,
            source: Box::new(source),
        }
    }

    /// Whether the failure is a unique-key collision on a tracked game.
    pub fn is_duplicate(&self) -> bool {
        matches!(self, StorageError::Duplicate { .. })
    }
}
