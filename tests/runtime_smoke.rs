mod common;

use std::time::Duration;

use common::{SCOUT, TOURNAMENT};
use scoutfav::{
    engine::{Change, EngineError, FavoritesEngine},
    persist::{memory::MemoryFavoriteStore, sqlite::SqliteFavoriteStore},
    runtime::{
        events::FavoriteEvent,
        handle::{RuntimeConfig, RuntimeError, spawn_favorites},
    },
    types::ListKind,
};

async fn next_event(sub: &mut tokio::sync::broadcast::Receiver<FavoriteEvent>) -> FavoriteEvent {
    tokio::time::timeout(Duration::from_secs(1), sub.recv())
        .await
        .expect("event")
        .expect("recv")
}

#[tokio::test]
async fn runtime_mutations_emit_ordered_events() {
    let engine = FavoritesEngine::load(MemoryFavoriteStore::new(), SCOUT, TOURNAMENT).expect("load");
    let handle = spawn_favorites(engine, RuntimeConfig::default());
    let mut sub = handle.subscribe();

    assert_eq!(handle.toggle_favorite(1).await.expect("fav"), Change::FavoriteAdded(1));
    assert_eq!(
        handle.toggle_exclusive(2).await.expect("excl"),
        Change::ExclusiveAdded { player_id: 2, created: true }
    );
    handle
        .reorder(ListKind::Favorites, vec![2, 1])
        .await
        .expect("stage");
    assert_eq!(handle.commit_reorder().await.expect("commit"), 2);
    handle.toggle_exclusive(2).await.expect("unexcl");
    handle.remove_from_favorites(2).await.expect("remove");

    let expected = vec![
        FavoriteEvent::FavoriteAdded { player_id: 1 },
        FavoriteEvent::FavoriteAdded { player_id: 2 },
        FavoriteEvent::ExclusiveAdded { player_id: 2 },
        FavoriteEvent::ReorderStaged { kind: ListKind::Favorites },
        FavoriteEvent::ReorderCommitted { rows: 2 },
        FavoriteEvent::ExclusiveRemoved { player_id: 2 },
        FavoriteEvent::FavoriteRemoved { player_id: 2 },
    ];
    for want in expected {
        assert_eq!(next_event(&mut sub).await, want);
    }

    assert!(handle.is_favorite(1).await.expect("query"));
    assert!(!handle.is_favorite(2).await.expect("query"));
    assert!(handle.can_add_exclusive().await.expect("query"));
    let favorites = handle.favorites().await.expect("favorites");
    assert_eq!(favorites.len(), 1);
    assert_eq!(favorites[0].favorite_order, 0);

    handle.shutdown().await.expect("shutdown");
}

#[tokio::test]
async fn runtime_surfaces_engine_errors_without_events() {
    let store = SqliteFavoriteStore::open_in_memory().expect("open");
    let engine = FavoritesEngine::load(store, SCOUT, TOURNAMENT).expect("load");
    let handle = spawn_favorites(engine, RuntimeConfig::default());
    let mut sub = handle.subscribe();

    for p in [1, 2, 3] {
        handle.toggle_exclusive(p).await.expect("excl");
    }
    for _ in 0..6 {
        next_event(&mut sub).await;
    }

    let err = handle.toggle_exclusive(4).await.unwrap_err();
    assert!(matches!(err, RuntimeError::Engine(EngineError::CapacityExceeded { .. })));
    let err = handle.remove_from_favorites(1).await.unwrap_err();
    assert!(matches!(err, RuntimeError::Engine(EngineError::InvalidState(_))));
    assert!(sub.try_recv().is_err());

    handle.reorder(ListKind::Exclusives, vec![3, 2, 1]).await.expect("stage");
    assert_eq!(
        handle
            .exclusives()
            .await
            .expect("exclusives")
            .iter()
            .map(|r| r.player_id)
            .collect::<Vec<_>>(),
        vec![3, 2, 1]
    );
    assert!(handle.discard_reorder().await.expect("discard"));
    assert!(!handle.discard_reorder().await.expect("discard again"));
    assert_eq!(
        next_event(&mut sub).await,
        FavoriteEvent::ReorderStaged { kind: ListKind::Exclusives }
    );
    assert_eq!(next_event(&mut sub).await, FavoriteEvent::ReorderDiscarded);

    assert_eq!(handle.commit_reorder().await.expect("empty commit"), 0);
    assert!(sub.try_recv().is_err());

    handle.refresh().await.expect("refresh");
    let snapshot = handle.snapshot().await.expect("snapshot");
    assert_eq!(snapshot.exclusives.len(), 3);
    assert!(!snapshot.can_add_exclusive);

    handle.shutdown().await.expect("shutdown");
    assert!(matches!(
        handle.is_favorite(1).await,
        Err(RuntimeError::ChannelClosed)
    ));
}
