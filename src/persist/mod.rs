pub mod memory;
pub mod sqlite;

use std::time::{SystemTime, UNIX_EPOCH};

use crate::{
    favorite::{FavoritePatch, FavoriteRecord, NewFavorite, OrderUpdate},
    types::{FavoriteId, PlayerId, ScoutId, TournamentId},
};

/// Errors reported by a [`FavoriteStorage`] backend.
#[derive(Debug, thiserror::Error)]
pub enum PersistError {
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// The `(scout, player, tournament)` triple is already stored.
    #[error("favorite already exists for scout {scout_id}, player {player_id}, tournament {tournament_id}")]
    Conflict {
        scout_id: ScoutId,
        player_id: PlayerId,
        tournament_id: TournamentId,
    },

    /// No record with this id.
    #[error("favorite {0} not found")]
    NotFound(FavoriteId),

    /// A non-atomic backend applied only part of a batch.
    #[error("batch order update applied {applied} rows before failing")]
    PartialBatch { applied: usize },

    /// Backend-specific failure.
    #[error("{0}")]
    Message(String),
}

pub type PersistResult<T> = Result<T, PersistError>;

/// Storage collaborator holding favorite records.
///
/// Each call is atomic on its own. `batch_update_orders` must be
/// all-or-nothing; a backend that cannot promise that reports partial
/// progress as [`PersistError::PartialBatch`].
pub trait FavoriteStorage: Send {
    /// All records of one scout in one tournament.
    fn list_favorites(
        &mut self,
        scout_id: ScoutId,
        tournament_id: TournamentId,
    ) -> PersistResult<Vec<FavoriteRecord>>;

    /// Inserts a record; a taken triple is [`PersistError::Conflict`].
    fn create_favorite(&mut self, new: &NewFavorite) -> PersistResult<FavoriteRecord>;

    /// Applies `patch` to record `id` and returns the stored result.
    fn update_favorite(
        &mut self,
        id: FavoriteId,
        patch: &FavoritePatch,
    ) -> PersistResult<FavoriteRecord>;

    /// Deletes record `id`.
    fn delete_favorite(&mut self, id: FavoriteId) -> PersistResult<()>;

    /// Rewrites ranks on several records at once.
    fn batch_update_orders(&mut self, updates: &[OrderUpdate]) -> PersistResult<()>;
}

/// Wall-clock milliseconds since the Unix epoch; 0 if the clock is before it.
pub(crate) fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}
