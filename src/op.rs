//! Planned storage writes.
//!
//! Every engine mutation is first planned as a [`Plan`] against the loaded
//! [`crate::core::set::FavoriteSet`], then executed op by op against the
//! storage collaborator, and only folded back into local state once every
//! op has succeeded.

use crate::{
    favorite::{FavoritePatch, FavoriteRecord, NewFavorite, OrderUpdate},
    types::FavoriteId,
};

/// One storage write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Op {
    /// Create a new favorite record.
    Create(NewFavorite),
    /// Patch an existing record.
    Update {
        /// Record to patch.
        id: FavoriteId,
        /// Sparse patch.
        patch: FavoritePatch,
    },
    /// Delete a record.
    Delete {
        /// Record to delete.
        id: FavoriteId,
    },
    /// Rewrite ranks on several records at once.
    BatchOrders(Vec<OrderUpdate>),
}

/// Ordered storage writes making up one logical engine operation.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Plan {
    ops: Vec<Op>,
}

impl Plan {
    /// Starts a plan with a single op.
    pub fn single(op: Op) -> Self {
        Self { ops: vec![op] }
    }

    /// Appends a batch order write; empty batches are dropped.
    pub fn then_batch(mut self, updates: Vec<OrderUpdate>) -> Self {
        if !updates.is_empty() {
            self.ops.push(Op::BatchOrders(updates));
        }
        self
    }

    /// Planned ops in execution order.
    pub fn ops(&self) -> &[Op] {
        &self.ops
    }

    /// Consumes the plan, yielding its ops.
    pub fn into_ops(self) -> Vec<Op> {
        self.ops
    }

    /// Returns true when nothing needs to be written.
    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }
}

/// Result of one accepted storage write, ready to fold into local state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Record as returned by storage after a create or update.
    Upserted(FavoriteRecord),
    /// Record removed by storage.
    Deleted(FavoriteId),
    /// Ranks rewritten by storage.
    Reordered(Vec<OrderUpdate>),
}
