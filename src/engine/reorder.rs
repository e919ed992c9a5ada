use crate::types::{ListKind, PlayerId};

/// Locally staged orderings that have not been written to storage yet.
///
/// Each list is staged independently; a commit writes every staged list
/// in one batch.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PendingReorder {
    exclusives: Option<Vec<PlayerId>>,
    favorites: Option<Vec<PlayerId>>,
}

impl PendingReorder {
    /// Staged order for `kind`, if any.
    pub fn get(&self, kind: ListKind) -> Option<&[PlayerId]> {
        self.slot(kind).as_deref()
    }

    /// Replaces whatever was staged for `kind`.
    pub fn stage(&mut self, kind: ListKind, player_ids: Vec<PlayerId>) {
        *self.slot_mut(kind) = Some(player_ids);
    }

    /// Drops whatever was staged for `kind`.
    pub fn drop_kind(&mut self, kind: ListKind) {
        *self.slot_mut(kind) = None;
    }

    /// Clears everything; returns true if anything was staged.
    pub fn clear(&mut self) -> bool {
        let had_any = !self.is_empty();
        *self = Self::default();
        had_any
    }

    /// True when neither list is staged.
    pub fn is_empty(&self) -> bool {
        self.exclusives.is_none() && self.favorites.is_none()
    }

    /// Staged lists, exclusives first.
    pub fn staged(&self) -> Vec<(ListKind, &[PlayerId])> {
        [ListKind::Exclusives, ListKind::Favorites]
            .into_iter()
            .filter_map(|kind| self.get(kind).map(|ids| (kind, ids)))
            .collect()
    }

    fn slot(&self, kind: ListKind) -> &Option<Vec<PlayerId>> {
        match kind {
            ListKind::Exclusives => &self.exclusives,
            ListKind::Favorites => &self.favorites,
        }
    }

    fn slot_mut(&mut self, kind: ListKind) -> &mut Option<Vec<PlayerId>> {
        match kind {
            ListKind::Exclusives => &mut self.exclusives,
            ListKind::Favorites => &mut self.favorites,
        }
    }
}
