//! Favorites and exclusives for scouts, with ordered lists and a pluggable
//! storage collaborator.
//!
//! A scout may favorite any number of players in a tournament and mark up
//! to [`types::EXCLUSIVE_CAP`] of them exclusive. Both lists keep their own
//! dense, zero-based ranks.
//!
//! # Examples
//!
//! In-process usage with [`persist::memory::MemoryFavoriteStore`]:
//! ```
//! use scoutfav::{
//!     engine::{EngineError, FavoritesEngine},
//!     persist::memory::MemoryFavoriteStore,
//!     types::ListKind,
//! };
//!
//! let mut engine = FavoritesEngine::load(MemoryFavoriteStore::new(), 1, 7).expect("load");
//! engine.toggle_favorite(10).expect("favorite");
//! engine.toggle_exclusive(10).expect("exclusive");
//! assert!(engine.is_exclusive(10));
//!
//! let err = engine.remove_from_favorites(10).unwrap_err();
//! assert!(matches!(err, EngineError::InvalidState(_)));
//!
//! engine.toggle_favorite(11).expect("favorite");
//! engine.reorder(ListKind::Favorites, vec![11, 10]).expect("stage");
//! assert_eq!(engine.commit_reorder().expect("commit"), 2);
//! ```
//!
//! Runtime usage with the SQLite store:
//! ```no_run
//! use scoutfav::{
//!     engine::FavoritesEngine,
//!     persist::sqlite::SqliteFavoriteStore,
//!     runtime::handle::{spawn_favorites, RuntimeConfig},
//! };
//!
//! # #[tokio::main]
//! # async fn main() {
//! let store = SqliteFavoriteStore::open("favorites.db").expect("open sqlite");
//! let engine = FavoritesEngine::load(store, 1, 7).expect("load");
//! let handle = spawn_favorites(engine, RuntimeConfig::default());
//! handle.toggle_exclusive(10).await.expect("exclusive");
//! handle.shutdown().await.expect("shutdown");
//! # }
//! ```

/// In-memory favorite state and rank helpers.
pub mod core;
/// Engine bound to one scout and tournament.
pub mod engine;
/// Favorite records, patches, and order updates.
pub mod favorite;
/// Planned storage writes.
pub mod op;
/// Storage collaborator abstraction with SQLite and in-memory backends.
pub mod persist;
/// Single-writer runtime handle and events.
pub mod runtime;
/// Shared primitive types.
pub mod types;
