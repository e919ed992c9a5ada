use hashbrown::{HashMap, HashSet};

use crate::{
    engine::error::{EngineError, EngineResult},
    favorite::{FavoritePatch, FavoriteRecord, NewFavorite, OrderUpdate},
    op::{Op, Outcome, Plan},
    types::{EXCLUSIVE_CAP, FavoriteId, ListKind, PlayerId, ScoutId, TournamentId},
};

use super::order::{densify, merge_updates};

/// Loaded favorites of one scout within one tournament.
///
/// Planners never mutate; state only changes through [`FavoriteSet::apply`]
/// once storage has accepted the corresponding writes.
#[derive(Debug, Clone)]
pub struct FavoriteSet {
    scout_id: ScoutId,
    tournament_id: TournamentId,
    records: HashMap<PlayerId, FavoriteRecord>,
    by_id: HashMap<FavoriteId, PlayerId>,
}

impl FavoriteSet {
    /// Empty set for `(scout_id, tournament_id)`.
    pub fn new(scout_id: ScoutId, tournament_id: TournamentId) -> Self {
        Self {
            scout_id,
            tournament_id,
            records: HashMap::new(),
            by_id: HashMap::new(),
        }
    }

    /// Builds a set from storage rows.
    ///
    /// Returns the set together with the rank writes needed to bring
    /// storage back to dense ranks; empty when storage was already dense.
    pub fn load(
        scout_id: ScoutId,
        tournament_id: TournamentId,
        rows: Vec<FavoriteRecord>,
    ) -> EngineResult<(Self, Vec<OrderUpdate>)> {
        let mut set = Self::new(scout_id, tournament_id);

        for mut rec in rows {
            if rec.scout_id != scout_id || rec.tournament_id != tournament_id {
                return Err(EngineError::Validation(format!(
                    "favorite {} belongs to scout {} in tournament {}, expected scout {scout_id} in tournament {tournament_id}",
                    rec.id, rec.scout_id, rec.tournament_id
                )));
            }
            if set.records.contains_key(&rec.player_id) {
                return Err(EngineError::InvalidState(format!(
                    "duplicate favorite for player {}",
                    rec.player_id
                )));
            }
            if !rec.is_exclusive {
                rec.order = None;
            }
            set.insert(rec);
        }

        if set.exclusive_count() > EXCLUSIVE_CAP {
            return Err(EngineError::InvalidState(format!(
                "{} exclusives stored, cap is {EXCLUSIVE_CAP}",
                set.exclusive_count()
            )));
        }

        let repairs = set.normalize_ranks();
        Ok((set, repairs))
    }

    /// Owning scout.
    pub fn scout_id(&self) -> ScoutId {
        self.scout_id
    }

    /// Tournament context.
    pub fn tournament_id(&self) -> TournamentId {
        self.tournament_id
    }

    /// Record for `player_id`, if it is a favorite.
    pub fn get(&self, player_id: PlayerId) -> Option<&FavoriteRecord> {
        self.records.get(&player_id)
    }

    /// True if `player_id` is a favorite.
    pub fn is_favorite(&self, player_id: PlayerId) -> bool {
        self.records.contains_key(&player_id)
    }

    /// True if `player_id` is an exclusive.
    pub fn is_exclusive(&self, player_id: PlayerId) -> bool {
        self.records
            .get(&player_id)
            .is_some_and(|rec| rec.is_exclusive)
    }

    /// True while the exclusive cap has room.
    pub fn can_add_exclusive(&self) -> bool {
        self.exclusive_count() < EXCLUSIVE_CAP
    }

    /// Number of exclusives.
    pub fn exclusive_count(&self) -> usize {
        self.records.values().filter(|rec| rec.is_exclusive).count()
    }

    /// Number of favorites, exclusives included.
    pub fn favorite_count(&self) -> usize {
        self.records.len()
    }

    /// Members of `kind`, ranked.
    pub fn ordered(&self, kind: ListKind) -> Vec<&FavoriteRecord> {
        let mut members: Vec<&FavoriteRecord> = self
            .records
            .values()
            .filter(|rec| kind == ListKind::Favorites || rec.is_exclusive)
            .collect();
        members.sort_by_key(|rec| (rank_of(rec, kind), rec.created_at_ms, rec.id));
        members
    }

    /// Player ids of `kind`, ranked.
    pub fn ordered_ids(&self, kind: ListKind) -> Vec<PlayerId> {
        self.ordered(kind)
            .into_iter()
            .map(|rec| rec.player_id)
            .collect()
    }

    /// Plans adding `player_id`, or removing it if it is a non-exclusive favorite.
    pub fn plan_toggle_favorite(&self, player_id: PlayerId) -> EngineResult<Plan> {
        match self.records.get(&player_id) {
            None => Ok(Plan::single(Op::Create(NewFavorite {
                scout_id: self.scout_id,
                player_id,
                tournament_id: self.tournament_id,
                is_exclusive: false,
                order: None,
                favorite_order: self.favorite_count() as u32,
            }))),
            Some(rec) if rec.is_exclusive => Err(EngineError::InvalidState(format!(
                "player {player_id} is exclusive; remove exclusivity before unfavoriting"
            ))),
            Some(rec) => Ok(Plan::single(Op::Delete { id: rec.id })
                .then_batch(self.ranks_without(ListKind::Favorites, player_id))),
        }
    }

    /// Plans promoting `player_id` to exclusive, or demoting it.
    pub fn plan_toggle_exclusive(&self, player_id: PlayerId) -> EngineResult<Plan> {
        match self.records.get(&player_id) {
            None => {
                self.ensure_exclusive_room()?;
                Ok(Plan::single(Op::Create(NewFavorite {
                    scout_id: self.scout_id,
                    player_id,
                    tournament_id: self.tournament_id,
                    is_exclusive: true,
                    order: Some(self.exclusive_count() as u32),
                    favorite_order: self.favorite_count() as u32,
                })))
            }
            Some(rec) if !rec.is_exclusive => {
                self.ensure_exclusive_room()?;
                Ok(Plan::single(Op::Update {
                    id: rec.id,
                    patch: FavoritePatch {
                        is_exclusive: Some(true),
                        order: Some(Some(self.exclusive_count() as u32)),
                        ..FavoritePatch::default()
                    },
                }))
            }
            Some(rec) => Ok(Plan::single(Op::Update {
                id: rec.id,
                patch: FavoritePatch {
                    is_exclusive: Some(false),
                    order: Some(None),
                    ..FavoritePatch::default()
                },
            })
            .then_batch(self.ranks_without(ListKind::Exclusives, player_id))),
        }
    }

    /// Plans deleting a non-exclusive favorite and closing its rank gap.
    pub fn plan_remove_from_favorites(&self, player_id: PlayerId) -> EngineResult<Plan> {
        let rec = self.records.get(&player_id).ok_or_else(|| {
            EngineError::InvalidState(format!("player {player_id} is not a favorite"))
        })?;
        if rec.is_exclusive {
            return Err(EngineError::InvalidState(format!(
                "player {player_id} is exclusive; remove exclusivity before removing the favorite"
            )));
        }
        Ok(Plan::single(Op::Delete { id: rec.id })
            .then_batch(self.ranks_without(ListKind::Favorites, player_id)))
    }

    /// Rank writes that would place `kind` in the order of `player_ids`.
    ///
    /// Only records whose rank actually changes are included.
    pub fn plan_order_commit(
        &self,
        kind: ListKind,
        player_ids: &[PlayerId],
    ) -> EngineResult<Vec<OrderUpdate>> {
        self.validate_membership(kind, player_ids)?;
        Ok(self.rank_updates(kind, player_ids))
    }

    /// Checks that `player_ids` is a permutation of the current `kind` list.
    pub fn validate_membership(&self, kind: ListKind, player_ids: &[PlayerId]) -> EngineResult<()> {
        let members = self.ordered_ids(kind);
        let mut seen: HashSet<PlayerId> = HashSet::with_capacity(player_ids.len());
        for id in player_ids {
            if !seen.insert(*id) {
                return Err(EngineError::Validation(format!(
                    "player {id} appears more than once in {kind:?} reorder"
                )));
            }
        }
        if player_ids.len() != members.len() || members.iter().any(|id| !seen.contains(id)) {
            return Err(EngineError::Validation(format!(
                "{kind:?} reorder must list exactly the {} current members",
                members.len()
            )));
        }
        Ok(())
    }

    /// Folds one completed storage write into local state.
    pub fn apply(&mut self, outcome: Outcome) {
        match outcome {
            Outcome::Upserted(rec) => self.insert(rec),
            Outcome::Deleted(id) => {
                if let Some(player_id) = self.by_id.remove(&id) {
                    self.records.remove(&player_id);
                }
            }
            Outcome::Reordered(updates) => {
                for update in &updates {
                    if let Some(rec) = self
                        .by_id
                        .get(&update.id)
                        .and_then(|player_id| self.records.get_mut(player_id))
                    {
                        update.apply_to(rec);
                    }
                }
            }
        }
    }

    fn ensure_exclusive_room(&self) -> EngineResult<()> {
        if self.can_add_exclusive() {
            Ok(())
        } else {
            Err(EngineError::CapacityExceeded { cap: EXCLUSIVE_CAP })
        }
    }

    fn ranks_without(&self, kind: ListKind, player_id: PlayerId) -> Vec<OrderUpdate> {
        let remaining: Vec<PlayerId> = self
            .ordered_ids(kind)
            .into_iter()
            .filter(|id| *id != player_id)
            .collect();
        self.rank_updates(kind, &remaining)
    }

    fn rank_updates(&self, kind: ListKind, player_ids: &[PlayerId]) -> Vec<OrderUpdate> {
        densify(player_ids)
            .into_iter()
            .filter_map(|(player_id, rank)| {
                let rec = self.records.get(&player_id)?;
                match kind {
                    ListKind::Exclusives if rec.order != Some(rank) => Some(OrderUpdate {
                        id: rec.id,
                        order: Some(rank),
                        favorite_order: None,
                    }),
                    ListKind::Favorites if rec.favorite_order != rank => Some(OrderUpdate {
                        id: rec.id,
                        order: None,
                        favorite_order: Some(rank),
                    }),
                    _ => None,
                }
            })
            .collect()
    }

    fn normalize_ranks(&mut self) -> Vec<OrderUpdate> {
        let mut updates = self.rank_updates(
            ListKind::Favorites,
            &self.ordered_ids(ListKind::Favorites),
        );
        updates.extend(self.rank_updates(
            ListKind::Exclusives,
            &self.ordered_ids(ListKind::Exclusives),
        ));
        let updates = merge_updates(updates);
        self.apply(Outcome::Reordered(updates.clone()));
        updates
    }

    fn insert(&mut self, rec: FavoriteRecord) {
        self.by_id.insert(rec.id, rec.player_id);
        self.records.insert(rec.player_id, rec);
    }
}

fn rank_of(rec: &FavoriteRecord, kind: ListKind) -> u32 {
    match kind {
        ListKind::Exclusives => rec.order.unwrap_or(u32::MAX),
        ListKind::Favorites => rec.favorite_order,
    }
}
