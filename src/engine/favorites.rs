use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::{
    core::{order::merge_updates, set::FavoriteSet},
    favorite::{FavoriteRecord, OrderUpdate},
    op::{Op, Outcome, Plan},
    persist::{FavoriteStorage, PersistError, PersistResult},
    types::{ListKind, PlayerId, ScoutId, TournamentId},
};

use super::{
    error::{EngineError, EngineResult},
    reorder::PendingReorder,
};

/// Membership change produced by a successful mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Change {
    FavoriteAdded(PlayerId),
    FavoriteRemoved(PlayerId),
    /// `created` is true when the player was not a favorite beforehand.
    ExclusiveAdded { player_id: PlayerId, created: bool },
    ExclusiveRemoved(PlayerId),
}

/// Serializable view of an engine, as handed to UI callers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FavoritesSnapshot {
    pub scout_id: ScoutId,
    pub tournament_id: TournamentId,
    pub exclusives: Vec<FavoriteRecord>,
    pub favorites: Vec<FavoriteRecord>,
    pub can_add_exclusive: bool,
    pub has_pending_reorder: bool,
}

/// Favorites and exclusives of one scout within one tournament.
///
/// Membership changes are written through to storage before local state
/// moves. Reordering is staged locally with [`FavoritesEngine::reorder`]
/// and written in one batch by [`FavoritesEngine::commit_reorder`].
pub struct FavoritesEngine<S: FavoriteStorage> {
    storage: S,
    set: FavoriteSet,
    pending: PendingReorder,
    stale: bool,
}

impl<S: FavoriteStorage> FavoritesEngine<S> {
    /// Builds an engine for `(scout_id, tournament_id)` and loads its
    /// favorites from `storage`.
    ///
    /// Only a failed read is an error. If rewriting non-dense ranks fails,
    /// the engine is returned stale; see [`FavoritesEngine::is_stale`].
    pub fn load(storage: S, scout_id: ScoutId, tournament_id: TournamentId) -> EngineResult<Self> {
        let mut engine = Self {
            storage,
            set: FavoriteSet::new(scout_id, tournament_id),
            pending: PendingReorder::default(),
            stale: false,
        };
        let repairs = engine.reload()?;
        // A failed repair leaves the engine stale rather than unbuilt.
        let _ = engine.write_repairs(&repairs);
        Ok(engine)
    }

    /// Owning scout.
    pub fn scout_id(&self) -> ScoutId {
        self.set.scout_id()
    }

    /// Tournament context.
    pub fn tournament_id(&self) -> TournamentId {
        self.set.tournament_id()
    }

    /// Borrows the storage collaborator.
    pub fn storage(&self) -> &S {
        &self.storage
    }

    /// Consumes the engine, returning its storage.
    pub fn into_storage(self) -> S {
        self.storage
    }

    /// True if `player_id` is a favorite, exclusive or not.
    pub fn is_favorite(&self, player_id: PlayerId) -> bool {
        self.set.is_favorite(player_id)
    }

    /// True if `player_id` is an exclusive.
    pub fn is_exclusive(&self, player_id: PlayerId) -> bool {
        self.set.is_exclusive(player_id)
    }

    /// True while fewer than [`EXCLUSIVE_CAP`](crate::types::EXCLUSIVE_CAP) exclusives exist.
    pub fn can_add_exclusive(&self) -> bool {
        self.set.can_add_exclusive()
    }

    /// True after a partial write until the next successful refresh.
    pub fn is_stale(&self) -> bool {
        self.stale
    }

    /// True if either list has a staged, uncommitted order.
    pub fn has_pending_reorder(&self) -> bool {
        !self.pending.is_empty()
    }

    /// Staged order for `kind`, if any.
    pub fn pending(&self, kind: ListKind) -> Option<&[PlayerId]> {
        self.pending.get(kind)
    }

    /// Records of `kind` in display order.
    ///
    /// A staged reorder takes precedence over persisted ranks; the rank
    /// fields on the returned records stay the persisted ones.
    pub fn ordered(&self, kind: ListKind) -> Vec<&FavoriteRecord> {
        match self.pending.get(kind) {
            Some(ids) => ids.iter().filter_map(|id| self.set.get(*id)).collect(),
            None => self.set.ordered(kind),
        }
    }

    /// Exclusives in display order.
    pub fn exclusives(&self) -> Vec<&FavoriteRecord> {
        self.ordered(ListKind::Exclusives)
    }

    /// All favorites in display order.
    pub fn favorites(&self) -> Vec<&FavoriteRecord> {
        self.ordered(ListKind::Favorites)
    }

    /// Owned copy of the current view.
    pub fn snapshot(&self) -> FavoritesSnapshot {
        FavoritesSnapshot {
            scout_id: self.scout_id(),
            tournament_id: self.tournament_id(),
            exclusives: self.exclusives().into_iter().cloned().collect(),
            favorites: self.favorites().into_iter().cloned().collect(),
            can_add_exclusive: self.can_add_exclusive(),
            has_pending_reorder: self.has_pending_reorder(),
        }
    }

    /// Adds `player_id` to favorites, or removes it if it is a
    /// non-exclusive favorite.
    pub fn toggle_favorite(&mut self, player_id: PlayerId) -> EngineResult<Change> {
        self.ensure_mutable()?;
        let was_favorite = self.set.is_favorite(player_id);
        let plan = self.plan(player_id, |set| set.plan_toggle_favorite(player_id))?;
        self.execute(plan)?;

        let change = if was_favorite {
            Change::FavoriteRemoved(player_id)
        } else {
            Change::FavoriteAdded(player_id)
        };
        info!(
            scout_id = self.scout_id(),
            tournament_id = self.tournament_id(),
            ?change,
            "favorite toggled"
        );
        Ok(change)
    }

    /// Marks `player_id` exclusive (favoriting it if needed), or clears
    /// exclusivity while keeping it a favorite.
    pub fn toggle_exclusive(&mut self, player_id: PlayerId) -> EngineResult<Change> {
        self.ensure_mutable()?;
        let was_favorite = self.set.is_favorite(player_id);
        let was_exclusive = self.set.is_exclusive(player_id);
        let plan = self.plan(player_id, |set| set.plan_toggle_exclusive(player_id))?;
        self.execute(plan)?;

        let change = if was_exclusive {
            Change::ExclusiveRemoved(player_id)
        } else {
            Change::ExclusiveAdded {
                player_id,
                created: !was_favorite,
            }
        };
        info!(
            scout_id = self.scout_id(),
            tournament_id = self.tournament_id(),
            ?change,
            "exclusive toggled"
        );
        Ok(change)
    }

    /// Deletes a non-exclusive favorite.
    pub fn remove_from_favorites(&mut self, player_id: PlayerId) -> EngineResult<Change> {
        self.ensure_mutable()?;
        let plan = self.plan(player_id, |set| set.plan_remove_from_favorites(player_id))?;
        self.execute(plan)?;

        info!(
            scout_id = self.scout_id(),
            tournament_id = self.tournament_id(),
            player_id,
            "favorite removed"
        );
        Ok(Change::FavoriteRemoved(player_id))
    }

    /// Stages a new order for `kind` without writing it.
    ///
    /// `player_ids` must be a permutation of the list's current members.
    pub fn reorder(&mut self, kind: ListKind, player_ids: Vec<PlayerId>) -> EngineResult<()> {
        if self.stale {
            return Err(EngineError::RefreshRequired);
        }
        self.set.validate_membership(kind, &player_ids)?;
        debug!(?kind, len = player_ids.len(), "reorder staged");
        self.pending.stage(kind, player_ids);
        Ok(())
    }

    /// Writes every staged list in one batch and returns the number of
    /// rows whose rank changed.
    ///
    /// On failure the staged lists are kept so the caller can retry or
    /// discard them.
    pub fn commit_reorder(&mut self) -> EngineResult<usize> {
        if self.stale {
            return Err(EngineError::RefreshRequired);
        }
        if self.pending.is_empty() {
            return Ok(0);
        }

        let mut updates = Vec::new();
        for (kind, ids) in self.pending.staged() {
            updates.extend(self.set.plan_order_commit(kind, ids)?);
        }
        let updates = merge_updates(updates);

        if !updates.is_empty() {
            if let Err(err) = self.storage.batch_update_orders(&updates) {
                self.mark_stale_if_partial(&err, 0);
                return Err(err.into());
            }
        }

        let rows = updates.len();
        self.set.apply(Outcome::Reordered(updates));
        self.pending.clear();
        info!(
            scout_id = self.scout_id(),
            tournament_id = self.tournament_id(),
            rows,
            "reorder committed"
        );
        Ok(rows)
    }

    /// Drops staged lists; returns true if anything was staged.
    pub fn discard_reorder(&mut self) -> bool {
        let dropped = self.pending.clear();
        if dropped {
            debug!("reorder discarded");
        }
        dropped
    }

    /// Reloads from storage, replacing local state.
    ///
    /// Non-dense stored ranks are rewritten in one batch. Staged lists
    /// survive only if they still match the reloaded membership. If that
    /// rewrite fails the reloaded state is kept, but the engine stays stale
    /// until a later refresh succeeds.
    pub fn refresh(&mut self) -> EngineResult<()> {
        let repairs = self.reload()?;
        self.write_repairs(&repairs)
    }

    fn reload(&mut self) -> EngineResult<Vec<OrderUpdate>> {
        let scout_id = self.scout_id();
        let tournament_id = self.tournament_id();
        let rows = self.storage.list_favorites(scout_id, tournament_id)?;
        let (set, repairs) = FavoriteSet::load(scout_id, tournament_id, rows)?;

        self.set = set;
        self.stale = false;
        for (kind, ids) in self.pending.clone().staged() {
            if self.set.validate_membership(kind, ids).is_err() {
                debug!(?kind, "staged reorder no longer matches; dropping");
                self.pending.drop_kind(kind);
            }
        }
        debug!(
            scout_id,
            tournament_id,
            favorites = self.set.favorite_count(),
            exclusives = self.set.exclusive_count(),
            "favorites loaded"
        );
        Ok(repairs)
    }

    fn write_repairs(&mut self, repairs: &[OrderUpdate]) -> EngineResult<()> {
        if repairs.is_empty() {
            return Ok(());
        }
        warn!(
            scout_id = self.scout_id(),
            tournament_id = self.tournament_id(),
            rows = repairs.len(),
            "stored ranks were not dense; rewriting"
        );
        if let Err(err) = self.storage.batch_update_orders(repairs) {
            self.stale = true;
            warn!(
                scout_id = self.scout_id(),
                tournament_id = self.tournament_id(),
                error = %err,
                "rank repair failed; refresh required before further mutations"
            );
            return Err(err.into());
        }
        Ok(())
    }

    fn ensure_mutable(&self) -> EngineResult<()> {
        if self.stale {
            return Err(EngineError::RefreshRequired);
        }
        if !self.pending.is_empty() {
            return Err(EngineError::InvalidState(
                "a reorder is pending; commit or discard it first".to_string(),
            ));
        }
        Ok(())
    }

    fn plan<F>(&self, player_id: PlayerId, planner: F) -> EngineResult<Plan>
    where
        F: FnOnce(&FavoriteSet) -> EngineResult<Plan>,
    {
        planner(&self.set).inspect_err(|err| {
            warn!(
                scout_id = self.scout_id(),
                tournament_id = self.tournament_id(),
                player_id,
                error = %err,
                "favorite mutation rejected"
            );
        })
    }

    fn execute(&mut self, plan: Plan) -> EngineResult<()> {
        let mut outcomes = Vec::with_capacity(plan.ops().len());
        for (step, op) in plan.into_ops().into_iter().enumerate() {
            match self.run_op(op) {
                Ok(outcome) => outcomes.push(outcome),
                Err(err) => {
                    self.mark_stale_if_partial(&err, step);
                    return Err(err.into());
                }
            }
        }
        for outcome in outcomes {
            self.set.apply(outcome);
        }
        Ok(())
    }

    fn run_op(&mut self, op: Op) -> PersistResult<Outcome> {
        match op {
            Op::Create(new) => self.storage.create_favorite(&new).map(Outcome::Upserted),
            Op::Update { id, patch } => self
                .storage
                .update_favorite(id, &patch)
                .map(Outcome::Upserted),
            Op::Delete { id } => self
                .storage
                .delete_favorite(id)
                .map(|()| Outcome::Deleted(id)),
            Op::BatchOrders(updates) => {
                self.storage.batch_update_orders(&updates)?;
                Ok(Outcome::Reordered(updates))
            }
        }
    }

    fn mark_stale_if_partial(&mut self, err: &PersistError, step: usize) {
        if step > 0 || matches!(err, PersistError::PartialBatch { .. }) {
            self.stale = true;
            warn!(
                scout_id = self.scout_id(),
                tournament_id = self.tournament_id(),
                step,
                error = %err,
                "partial write; refresh required before further mutations"
            );
        }
    }
}
