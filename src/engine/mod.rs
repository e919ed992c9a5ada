//! Favorites/exclusives engine.

/// Engine error taxonomy.
pub mod error;
/// Engine bound to one scout and tournament.
pub mod favorites;
/// Staged, unpersisted list orderings.
pub mod reorder;

pub use error::{EngineError, EngineResult};
pub use favorites::{Change, FavoritesEngine, FavoritesSnapshot};
