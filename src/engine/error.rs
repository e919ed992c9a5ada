use crate::{
    persist::PersistError,
    types::{PlayerId, ScoutId, TournamentId},
};

/// Errors surfaced by [`crate::engine::FavoritesEngine`].
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// Storage already holds a favorite for this triple.
    #[error("favorite already exists for scout {scout_id}, player {player_id}, tournament {tournament_id}")]
    Conflict {
        scout_id: ScoutId,
        player_id: PlayerId,
        tournament_id: TournamentId,
    },

    #[error("exclusive cap of {cap} reached")]
    CapacityExceeded { cap: usize },

    /// The membership or exclusive state does not allow the operation.
    #[error("invalid state: {0}")]
    InvalidState(String),

    /// A reorder payload did not match the list it targets.
    #[error("validation failed: {0}")]
    Validation(String),

    #[error("storage error: {0}")]
    Storage(#[source] PersistError),

    /// A multi-step write failed midway; local state may disagree with storage.
    #[error("partial write left favorites out of sync; refresh required")]
    RefreshRequired,
}

impl From<PersistError> for EngineError {
    fn from(value: PersistError) -> Self {
        match value {
            PersistError::Conflict {
                scout_id,
                player_id,
                tournament_id,
            } => Self::Conflict {
                scout_id,
                player_id,
                tournament_id,
            },
            other => Self::Storage(other),
        }
    }
}

pub type EngineResult<T> = Result<T, EngineError>;
