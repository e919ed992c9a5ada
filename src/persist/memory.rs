//! In-process favorite storage.

use hashbrown::HashMap;

use crate::{
    favorite::{FavoritePatch, FavoriteRecord, NewFavorite, OrderUpdate},
    types::{FavoriteId, ScoutId, TournamentId},
};

use super::{FavoriteStorage, PersistError, PersistResult, now_ms};

/// `hashbrown`-backed [`FavoriteStorage`] with the same uniqueness and
/// atomicity guarantees as the SQLite store.
#[derive(Debug, Default)]
pub struct MemoryFavoriteStore {
    records: HashMap<FavoriteId, FavoriteRecord>,
    next_id: FavoriteId,
}

impl MemoryFavoriteStore {
    pub fn new() -> Self {
        Self {
            next_id: 1,
            ..Self::default()
        }
    }

    /// Stores `rec` verbatim, bypassing the uniqueness check.
    ///
    /// Intended for seeding fixtures, including ones with broken ranks.
    pub fn insert_raw(&mut self, rec: FavoriteRecord) {
        self.next_id = self.next_id.max(rec.id.saturating_add(1));
        self.records.insert(rec.id, rec);
    }

    pub fn get(&self, id: FavoriteId) -> Option<&FavoriteRecord> {
        self.records.get(&id)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl FavoriteStorage for MemoryFavoriteStore {
    fn list_favorites(
        &mut self,
        scout_id: ScoutId,
        tournament_id: TournamentId,
    ) -> PersistResult<Vec<FavoriteRecord>> {
        let mut out: Vec<FavoriteRecord> = self
            .records
            .values()
            .filter(|rec| rec.scout_id == scout_id && rec.tournament_id == tournament_id)
            .cloned()
            .collect();
        out.sort_by_key(|rec| (rec.favorite_order, rec.id));
        Ok(out)
    }

    fn create_favorite(&mut self, new: &NewFavorite) -> PersistResult<FavoriteRecord> {
        let taken = self.records.values().any(|rec| {
            rec.scout_id == new.scout_id
                && rec.player_id == new.player_id
                && rec.tournament_id == new.tournament_id
        });
        if taken {
            return Err(PersistError::Conflict {
                scout_id: new.scout_id,
                player_id: new.player_id,
                tournament_id: new.tournament_id,
            });
        }

        let id = self.next_id.max(1);
        self.next_id = id + 1;
        let rec = new.clone().into_record(id, now_ms());
        self.records.insert(id, rec.clone());
        Ok(rec)
    }

    fn update_favorite(
        &mut self,
        id: FavoriteId,
        patch: &FavoritePatch,
    ) -> PersistResult<FavoriteRecord> {
        let rec = self.records.get_mut(&id).ok_or(PersistError::NotFound(id))?;
        patch.apply_to(rec);
        rec.updated_at_ms = now_ms();
        Ok(rec.clone())
    }

    fn delete_favorite(&mut self, id: FavoriteId) -> PersistResult<()> {
        self.records
            .remove(&id)
            .map(|_| ())
            .ok_or(PersistError::NotFound(id))
    }

    fn batch_update_orders(&mut self, updates: &[OrderUpdate]) -> PersistResult<()> {
        if let Some(missing) = updates.iter().find(|u| !self.records.contains_key(&u.id)) {
            return Err(PersistError::NotFound(missing.id));
        }
        let now = now_ms();
        for update in updates {
            if let Some(rec) = self.records.get_mut(&update.id) {
                update.apply_to(rec);
                rec.updated_at_ms = now;
            }
        }
        Ok(())
    }
}
