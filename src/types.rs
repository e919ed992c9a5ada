//! Shared primitive IDs, list kinds, and the exclusive cap.

use serde::{Deserialize, Serialize};

/// Storage-assigned favorite record identifier.
pub type FavoriteId = u64;
/// Scout identifier.
pub type ScoutId = u64;
/// Player identifier.
pub type PlayerId = u64;
/// Tournament identifier.
pub type TournamentId = u64;

/// Maximum number of exclusives per scout per tournament.
pub const EXCLUSIVE_CAP: usize = 3;

/// The two independently ordered lists a scout maintains.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ListKind {
    /// Exclusive players, ranked by `order`.
    Exclusives,
    /// All favorites, ranked by `favorite_order`.
    Favorites,
}
