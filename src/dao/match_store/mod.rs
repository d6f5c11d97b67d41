pub mod memory;
#[cfg(feature = "mongo-store")]
pub mod mongodb;

use std::time::SystemTime;

use futures::future::BoxFuture;
use uuid::Uuid;

use crate::dao::models::{GameResult, NewTrackedGame, PlayerEntity, TrackedGameEntity};
use crate::dao::storage::StorageResult;

pub use memory::MemoryMatchStore;

/// Abstraction over the persistence layer for players and their tracked games.
///
/// Implementations must make `create_game` an atomic insert-if-absent on
/// `(player_id, match_id)` and `finalize_game` a single conditional write, since the
/// detection and completion loops coordinate only through these calls.
pub trait MatchStore: Send + Sync {
    fn list_players(&self) -> BoxFuture<'static, StorageResult<Vec<PlayerEntity>>>;
    fn find_game(
        &self,
        player_id: Uuid,
        match_id: &str,
    ) -> BoxFuture<'static, StorageResult<Option<TrackedGameEntity>>>;
    /// Insert a new active record; fails with `StorageError::Duplicate` on key collision.
    fn create_game(&self, game: NewTrackedGame) -> BoxFuture<'static, StorageResult<TrackedGameEntity>>;
    fn list_active_games(&self) -> BoxFuture<'static, StorageResult<Vec<TrackedGameEntity>>>;
    /// Complete an active record. Returns `false` when it is missing or already completed.
    fn finalize_game(
        &self,
        id: Uuid,
        result: GameResult,
        completed_at: SystemTime,
    ) -> BoxFuture<'static, StorageResult<bool>>;
    /// Attach an advisory note to a record. Returns `false` when no record matched.
    fn annotate_error(
        &self,
        player_id: Uuid,
        match_id: &str,
        message: String,
    ) -> BoxFuture<'static, StorageResult<bool>>;
    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>>;
}
