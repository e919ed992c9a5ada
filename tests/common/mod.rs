#![allow(dead_code)]

use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};

use scoutfav::{
    favorite::{FavoritePatch, FavoriteRecord, NewFavorite, OrderUpdate},
    persist::{FavoriteStorage, PersistError, PersistResult, memory::MemoryFavoriteStore},
    types::{FavoriteId, PlayerId, ScoutId, TournamentId},
};

pub const SCOUT: ScoutId = 1;
pub const TOURNAMENT: TournamentId = 7;

pub fn player_ids(records: Vec<&FavoriteRecord>) -> Vec<PlayerId> {
    records.into_iter().map(|r| r.player_id).collect()
}

pub fn raw(id: FavoriteId, player_id: PlayerId, favorite_order: u32, order: Option<u32>) -> FavoriteRecord {
    FavoriteRecord {
        id,
        scout_id: SCOUT,
        player_id,
        tournament_id: TOURNAMENT,
        is_exclusive: order.is_some(),
        order,
        favorite_order,
        created_at_ms: id,
        updated_at_ms: id,
    }
}

/// Switches shared with a [`FlakyStore`] after it has moved into an engine.
#[derive(Clone, Default)]
pub struct Faults {
    pub fail_create: Arc<AtomicBool>,
    pub fail_batch: Arc<AtomicBool>,
    pub partial_batch: Arc<AtomicBool>,
}

pub struct FlakyStore {
    pub inner: MemoryFavoriteStore,
    faults: Faults,
}

impl FlakyStore {
    pub fn new(faults: Faults) -> Self {
        Self {
            inner: MemoryFavoriteStore::new(),
            faults,
        }
    }
}

impl FavoriteStorage for FlakyStore {
    fn list_favorites(
        &mut self,
        scout_id: ScoutId,
        tournament_id: TournamentId,
    ) -> PersistResult<Vec<FavoriteRecord>> {
        self.inner.list_favorites(scout_id, tournament_id)
    }

    fn create_favorite(&mut self, new: &NewFavorite) -> PersistResult<FavoriteRecord> {
        if self.faults.fail_create.load(Ordering::SeqCst) {
            return Err(PersistError::Message("injected create failure".to_string()));
        }
        self.inner.create_favorite(new)
    }

    fn update_favorite(
        &mut self,
        id: FavoriteId,
        patch: &FavoritePatch,
    ) -> PersistResult<FavoriteRecord> {
        self.inner.update_favorite(id, patch)
    }

    fn delete_favorite(&mut self, id: FavoriteId) -> PersistResult<()> {
        self.inner.delete_favorite(id)
    }

    fn batch_update_orders(&mut self, updates: &[OrderUpdate]) -> PersistResult<()> {
        if self.faults.fail_batch.load(Ordering::SeqCst) {
            return Err(PersistError::Message("injected batch failure".to_string()));
        }
        if self.faults.partial_batch.load(Ordering::SeqCst) && updates.len() > 1 {
            self.inner.batch_update_orders(&updates[..1])?;
            return Err(PersistError::PartialBatch { applied: 1 });
        }
        self.inner.batch_update_orders(updates)
    }
}

/// Identity and rank fields; timestamps are storage-owned and left out.
pub fn ranks(rec: &FavoriteRecord) -> (FavoriteId, PlayerId, bool, Option<u32>, u32) {
    (rec.id, rec.player_id, rec.is_exclusive, rec.order, rec.favorite_order)
}
