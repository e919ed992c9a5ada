//! Runtime event stream payloads.

use crate::types::{ListKind, PlayerId};

/// Events emitted from the single-writer runtime loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FavoriteEvent {
    /// A player became a favorite.
    FavoriteAdded {
        /// Affected player.
        player_id: PlayerId,
    },
    /// A favorite was deleted.
    FavoriteRemoved {
        /// Affected player.
        player_id: PlayerId,
    },
    /// A player was marked exclusive.
    ExclusiveAdded {
        /// Affected player.
        player_id: PlayerId,
    },
    /// Exclusivity was cleared; the player stays a favorite.
    ExclusiveRemoved {
        /// Affected player.
        player_id: PlayerId,
    },
    /// A new order was staged for one list.
    ReorderStaged {
        /// Staged list.
        kind: ListKind,
    },
    /// Staged orders were written.
    ReorderCommitted {
        /// Number of records whose rank changed.
        rows: usize,
    },
    /// Staged orders were dropped.
    ReorderDiscarded,
    /// State was reloaded from storage.
    Refreshed,
}
