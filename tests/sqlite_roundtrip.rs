mod common;

use tempfile::TempDir;

use common::{SCOUT, TOURNAMENT, player_ids, ranks};
use scoutfav::{
    engine::{EngineError, FavoritesEngine},
    favorite::{FavoritePatch, NewFavorite, OrderUpdate},
    persist::{FavoriteStorage, PersistError, sqlite::SqliteFavoriteStore},
    types::ListKind,
};

fn new_favorite(player_id: u64, favorite_order: u32) -> NewFavorite {
    NewFavorite {
        scout_id: SCOUT,
        player_id,
        tournament_id: TOURNAMENT,
        is_exclusive: false,
        order: None,
        favorite_order,
    }
}

#[test]
fn engine_state_survives_reopen() {
    let tmp = TempDir::new().expect("tmp");
    let db_path = tmp.path().join("favorites.db");

    let store = SqliteFavoriteStore::open(&db_path).expect("open sqlite");
    let mut engine = FavoritesEngine::load(store, SCOUT, TOURNAMENT).expect("load");
    for p in [11, 12, 13, 14] {
        engine.toggle_favorite(p).expect("fav");
    }
    engine.toggle_exclusive(13).expect("excl 13");
    engine.toggle_exclusive(11).expect("excl 11");
    engine.toggle_favorite(12).expect("unfav 12");
    engine.reorder(ListKind::Favorites, vec![14, 13, 11]).expect("stage");
    engine.commit_reorder().expect("commit");

    let expected: Vec<_> = engine.favorites().into_iter().map(ranks).collect();
    drop(engine);

    let reopened = SqliteFavoriteStore::open(&db_path).expect("reopen");
    let engine = FavoritesEngine::load(reopened, SCOUT, TOURNAMENT).expect("reload");
    let loaded: Vec<_> = engine.favorites().into_iter().map(ranks).collect();

    assert_eq!(loaded, expected);
    assert_eq!(player_ids(engine.favorites()), vec![14, 13, 11]);
    assert_eq!(player_ids(engine.exclusives()), vec![13, 11]);
}

#[test]
fn scouts_and_tournaments_are_isolated() {
    let mut store = SqliteFavoriteStore::open_in_memory().expect("open");
    store.create_favorite(&new_favorite(1, 0)).expect("create");
    store
        .create_favorite(&NewFavorite { scout_id: SCOUT + 1, ..new_favorite(1, 0) })
        .expect("other scout");
    store
        .create_favorite(&NewFavorite { tournament_id: TOURNAMENT + 1, ..new_favorite(1, 0) })
        .expect("other tournament");

    let rows = store.list_favorites(SCOUT, TOURNAMENT).expect("list");
    assert_eq!(rows.len(), 1);
    assert_eq!((rows[0].scout_id, rows[0].tournament_id), (SCOUT, TOURNAMENT));
}

#[test]
fn duplicate_triple_maps_to_conflict() {
    let mut store = SqliteFavoriteStore::open_in_memory().expect("open");
    store.create_favorite(&new_favorite(5, 0)).expect("create");
    let err = store.create_favorite(&new_favorite(5, 1)).unwrap_err();
    assert!(matches!(err, PersistError::Conflict { player_id: 5, .. }));
}

#[test]
fn concurrent_create_surfaces_as_engine_conflict() {
    let tmp = TempDir::new().expect("tmp");
    let db_path = tmp.path().join("conflict.db");

    let store = SqliteFavoriteStore::open(&db_path).expect("open");
    let mut engine = FavoritesEngine::load(store, SCOUT, TOURNAMENT).expect("load");

    let mut other = SqliteFavoriteStore::open(&db_path).expect("second connection");
    other.create_favorite(&new_favorite(5, 0)).expect("create elsewhere");

    let err = engine.toggle_favorite(5).unwrap_err();
    assert!(matches!(err, EngineError::Conflict { player_id: 5, .. }));
    assert!(!engine.is_favorite(5));

    engine.refresh().expect("refresh");
    assert!(engine.is_favorite(5));
}

#[test]
fn update_can_clear_exclusive_rank() {
    let mut store = SqliteFavoriteStore::open_in_memory().expect("open");
    let rec = store
        .create_favorite(&NewFavorite {
            is_exclusive: true,
            order: Some(0),
            ..new_favorite(3, 0)
        })
        .expect("create");

    let updated = store
        .update_favorite(
            rec.id,
            &FavoritePatch {
                is_exclusive: Some(false),
                order: Some(None),
                ..FavoritePatch::default()
            },
        )
        .expect("update");
    assert!(!updated.is_exclusive);
    assert_eq!(updated.order, None);

    let stored = store.get(rec.id).expect("get").expect("row");
    assert_eq!(ranks(&stored), ranks(&updated));

    let err = store.update_favorite(999, &FavoritePatch::default()).unwrap_err();
    assert!(matches!(err, PersistError::NotFound(999)));
}

#[test]
fn batch_update_is_all_or_nothing() {
    let mut store = SqliteFavoriteStore::open_in_memory().expect("open");
    let a = store.create_favorite(&new_favorite(1, 0)).expect("a");
    let b = store.create_favorite(&new_favorite(2, 1)).expect("b");

    let err = store
        .batch_update_orders(&[
            OrderUpdate { id: a.id, order: None, favorite_order: Some(1) },
            OrderUpdate { id: 404, order: None, favorite_order: Some(0) },
        ])
        .unwrap_err();
    assert!(matches!(err, PersistError::NotFound(404)));
    assert_eq!(store.get(a.id).expect("get").map(|r| r.favorite_order), Some(0));

    store
        .batch_update_orders(&[
            OrderUpdate { id: a.id, order: None, favorite_order: Some(1) },
            OrderUpdate { id: b.id, order: None, favorite_order: Some(0) },
        ])
        .expect("batch");
    assert_eq!(store.get(a.id).expect("get").map(|r| r.favorite_order), Some(1));
    assert_eq!(store.get(b.id).expect("get").map(|r| r.favorite_order), Some(0));
}

#[test]
fn delete_of_missing_row_is_not_found() {
    let mut store = SqliteFavoriteStore::open_in_memory().expect("open");
    let err = store.delete_favorite(77).unwrap_err();
    assert!(matches!(err, PersistError::NotFound(77)));
}
