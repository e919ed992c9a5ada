//! Favorite record, create payload, sparse patch, and order update types.

use serde::{Deserialize, Serialize};

use crate::types::{FavoriteId, PlayerId, ScoutId, TournamentId};

/// One scout's marking of one player within one tournament.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FavoriteRecord {
    /// Storage-assigned identifier.
    pub id: FavoriteId,
    /// Owning scout.
    pub scout_id: ScoutId,
    /// Marked player.
    pub player_id: PlayerId,
    /// Tournament context.
    pub tournament_id: TournamentId,
    /// True when the favorite is also an exclusive.
    pub is_exclusive: bool,
    /// Rank among exclusives; `Some` iff `is_exclusive`.
    pub order: Option<u32>,
    /// Rank among all favorites.
    pub favorite_order: u32,
    /// Creation timestamp in milliseconds since epoch.
    pub created_at_ms: u64,
    /// Last update timestamp in milliseconds since epoch.
    pub updated_at_ms: u64,
}

/// Create payload handed to the storage collaborator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewFavorite {
    /// Owning scout.
    pub scout_id: ScoutId,
    /// Marked player.
    pub player_id: PlayerId,
    /// Tournament context.
    pub tournament_id: TournamentId,
    /// Initial exclusive flag.
    pub is_exclusive: bool,
    /// Initial exclusive rank.
    pub order: Option<u32>,
    /// Initial favorites rank.
    pub favorite_order: u32,
}

impl NewFavorite {
    /// Materializes a record with storage-provided id and timestamp.
    pub fn into_record(self, id: FavoriteId, now_ms: u64) -> FavoriteRecord {
        FavoriteRecord {
            id,
            scout_id: self.scout_id,
            player_id: self.player_id,
            tournament_id: self.tournament_id,
            is_exclusive: self.is_exclusive,
            order: self.order,
            favorite_order: self.favorite_order,
            created_at_ms: now_ms,
            updated_at_ms: now_ms,
        }
    }
}

/// Sparse patch where each `Some` field overwrites the record value.
///
/// `order` is doubly optional so a patch can clear the exclusive rank.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FavoritePatch {
    /// Optional replacement for the exclusive flag.
    pub is_exclusive: Option<bool>,
    /// Optional replacement for the exclusive rank.
    pub order: Option<Option<u32>>,
    /// Optional replacement for the favorites rank.
    pub favorite_order: Option<u32>,
}

impl FavoritePatch {
    /// Returns true when no fields are set.
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }

    /// Applies this patch in place to `rec`.
    pub fn apply_to(&self, rec: &mut FavoriteRecord) {
        if let Some(v) = self.is_exclusive {
            rec.is_exclusive = v;
        }
        if let Some(v) = self.order {
            rec.order = v;
        }
        if let Some(v) = self.favorite_order {
            rec.favorite_order = v;
        }
    }
}

/// One row of a batch order write.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderUpdate {
    /// Record to update.
    pub id: FavoriteId,
    /// New exclusive rank, if changing.
    pub order: Option<u32>,
    /// New favorites rank, if changing.
    pub favorite_order: Option<u32>,
}

impl OrderUpdate {
    /// Applies the set ranks in place to `rec`.
    pub fn apply_to(&self, rec: &mut FavoriteRecord) {
        if let Some(v) = self.order {
            rec.order = Some(v);
        }
        if let Some(v) = self.favorite_order {
            rec.favorite_order = v;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record() -> FavoriteRecord {
        NewFavorite {
            scout_id: 1,
            player_id: 10,
            tournament_id: 7,
            is_exclusive: true,
            order: Some(2),
            favorite_order: 4,
        }
        .into_record(99, 1_000)
    }

    #[test]
    fn patch_can_clear_exclusive_rank() {
        let mut rec = record();
        let patch = FavoritePatch {
            is_exclusive: Some(false),
            order: Some(None),
            ..FavoritePatch::default()
        };
        patch.apply_to(&mut rec);
        assert!(!rec.is_exclusive);
        assert_eq!(rec.order, None);
        assert_eq!(rec.favorite_order, 4);
    }

    #[test]
    fn empty_patch_leaves_record_alone() {
        let mut rec = record();
        let before = rec.clone();
        let patch = FavoritePatch::default();
        assert!(patch.is_empty());
        patch.apply_to(&mut rec);
        assert_eq!(rec, before);
    }

    #[test]
    fn order_update_touches_only_set_fields() {
        let mut rec = record();
        OrderUpdate {
            id: rec.id,
            order: None,
            favorite_order: Some(0),
        }
        .apply_to(&mut rec);
        assert_eq!(rec.order, Some(2));
        assert_eq!(rec.favorite_order, 0);
    }
}
