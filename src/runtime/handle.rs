use std::sync::Arc;

use tokio::sync::{Mutex, broadcast, mpsc, oneshot};

use crate::{
    engine::{Change, EngineError, EngineResult, FavoritesEngine, FavoritesSnapshot},
    favorite::FavoriteRecord,
    persist::FavoriteStorage,
    types::{ListKind, PlayerId},
};

use super::events::FavoriteEvent;

/// Errors returned by [`FavoritesHandle`] calls.
#[derive(Debug, thiserror::Error)]
pub enum RuntimeError {
    /// The engine rejected or failed the operation.
    #[error(transparent)]
    Engine(#[from] EngineError),

    /// The runtime task has stopped.
    #[error("favorites runtime channel closed")]
    ChannelClosed,

    /// A blocking storage task panicked or was cancelled.
    #[error("blocking storage task failed: {0}")]
    Join(String),
}

/// Channel sizing for [`spawn_favorites`].
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    /// Commands buffered before callers wait.
    pub command_queue_bound: usize,
    /// Events retained for slow subscribers.
    pub event_capacity: usize,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            command_queue_bound: 256,
            event_capacity: 1024,
        }
    }
}

/// Cloneable async front end to a spawned [`FavoritesEngine`].
pub struct FavoritesHandle {
    cmd_tx: mpsc::Sender<Command>,
    events_tx: broadcast::Sender<FavoriteEvent>,
}

impl Clone for FavoritesHandle {
    fn clone(&self) -> Self {
        Self {
            cmd_tx: self.cmd_tx.clone(),
            events_tx: self.events_tx.clone(),
        }
    }
}

enum Command {
    IsFavorite {
        player_id: PlayerId,
        resp: oneshot::Sender<bool>,
    },
    IsExclusive {
        player_id: PlayerId,
        resp: oneshot::Sender<bool>,
    },
    CanAddExclusive {
        resp: oneshot::Sender<bool>,
    },
    Ordered {
        kind: ListKind,
        resp: oneshot::Sender<Vec<FavoriteRecord>>,
    },
    Snapshot {
        resp: oneshot::Sender<FavoritesSnapshot>,
    },
    ToggleFavorite {
        player_id: PlayerId,
        resp: oneshot::Sender<Result<Change, RuntimeError>>,
    },
    ToggleExclusive {
        player_id: PlayerId,
        resp: oneshot::Sender<Result<Change, RuntimeError>>,
    },
    RemoveFromFavorites {
        player_id: PlayerId,
        resp: oneshot::Sender<Result<Change, RuntimeError>>,
    },
    Reorder {
        kind: ListKind,
        player_ids: Vec<PlayerId>,
        resp: oneshot::Sender<Result<(), RuntimeError>>,
    },
    CommitReorder {
        resp: oneshot::Sender<Result<usize, RuntimeError>>,
    },
    DiscardReorder {
        resp: oneshot::Sender<bool>,
    },
    Refresh {
        resp: oneshot::Sender<Result<(), RuntimeError>>,
    },
    Shutdown {
        resp: oneshot::Sender<()>,
    },
}

/// Moves `engine` onto a dedicated task and returns a handle to it.
///
/// Commands are served one at a time, so callers sharing a handle never
/// interleave mutations. Storage calls run on the blocking pool.
pub fn spawn_favorites<S>(engine: FavoritesEngine<S>, config: RuntimeConfig) -> FavoritesHandle
where
    S: FavoriteStorage + 'static,
{
    let (cmd_tx, mut cmd_rx) = mpsc::channel::<Command>(config.command_queue_bound);
    let (events_tx, _) = broadcast::channel::<FavoriteEvent>(config.event_capacity);

    let events_tx_loop = events_tx.clone();
    let engine = Arc::new(Mutex::new(engine));

    tokio::spawn(async move {
        while let Some(cmd) = cmd_rx.recv().await {
            if handle_command(cmd, &engine, &events_tx_loop).await {
                break;
            }
        }
        tracing::debug!("favorites runtime stopped");
    });

    FavoritesHandle { cmd_tx, events_tx }
}

impl FavoritesHandle {
    /// Subscribes to events published after successful mutations.
    pub fn subscribe(&self) -> broadcast::Receiver<FavoriteEvent> {
        self.events_tx.subscribe()
    }

    /// See [`FavoritesEngine::is_favorite`].
    pub async fn is_favorite(&self, player_id: PlayerId) -> Result<bool, RuntimeError> {
        self.request(|resp| Command::IsFavorite { player_id, resp })
            .await
    }

    /// See [`FavoritesEngine::is_exclusive`].
    pub async fn is_exclusive(&self, player_id: PlayerId) -> Result<bool, RuntimeError> {
        self.request(|resp| Command::IsExclusive { player_id, resp })
            .await
    }

    /// See [`FavoritesEngine::can_add_exclusive`].
    pub async fn can_add_exclusive(&self) -> Result<bool, RuntimeError> {
        self.request(|resp| Command::CanAddExclusive { resp }).await
    }

    /// Owned records of `kind` in display order.
    pub async fn ordered(&self, kind: ListKind) -> Result<Vec<FavoriteRecord>, RuntimeError> {
        self.request(|resp| Command::Ordered { kind, resp }).await
    }

    /// Owned exclusives in display order.
    pub async fn exclusives(&self) -> Result<Vec<FavoriteRecord>, RuntimeError> {
        self.ordered(ListKind::Exclusives).await
    }

    /// Owned favorites in display order.
    pub async fn favorites(&self) -> Result<Vec<FavoriteRecord>, RuntimeError> {
        self.ordered(ListKind::Favorites).await
    }

    /// See [`FavoritesEngine::snapshot`].
    pub async fn snapshot(&self) -> Result<FavoritesSnapshot, RuntimeError> {
        self.request(|resp| Command::Snapshot { resp }).await
    }

    /// See [`FavoritesEngine::toggle_favorite`].
    pub async fn toggle_favorite(&self, player_id: PlayerId) -> Result<Change, RuntimeError> {
        self.request(|resp| Command::ToggleFavorite { player_id, resp })
            .await?
    }

    /// See [`FavoritesEngine::toggle_exclusive`].
    pub async fn toggle_exclusive(&self, player_id: PlayerId) -> Result<Change, RuntimeError> {
        self.request(|resp| Command::ToggleExclusive { player_id, resp })
            .await?
    }

    /// See [`FavoritesEngine::remove_from_favorites`].
    pub async fn remove_from_favorites(&self, player_id: PlayerId) -> Result<Change, RuntimeError> {
        self.request(|resp| Command::RemoveFromFavorites { player_id, resp })
            .await?
    }

    /// See [`FavoritesEngine::reorder`].
    pub async fn reorder(
        &self,
        kind: ListKind,
        player_ids: Vec<PlayerId>,
    ) -> Result<(), RuntimeError> {
        self.request(|resp| Command::Reorder {
            kind,
            player_ids,
            resp,
        })
        .await?
    }

    /// See [`FavoritesEngine::commit_reorder`].
    pub async fn commit_reorder(&self) -> Result<usize, RuntimeError> {
        self.request(|resp| Command::CommitReorder { resp }).await?
    }

    /// See [`FavoritesEngine::discard_reorder`].
    pub async fn discard_reorder(&self) -> Result<bool, RuntimeError> {
        self.request(|resp| Command::DiscardReorder { resp }).await
    }

    /// See [`FavoritesEngine::refresh`].
    pub async fn refresh(&self) -> Result<(), RuntimeError> {
        self.request(|resp| Command::Refresh { resp }).await?
    }

    /// Stops the runtime loop once queued commands ahead of it are served.
    pub async fn shutdown(&self) -> Result<(), RuntimeError> {
        self.request(|resp| Command::Shutdown { resp }).await
    }

    async fn request<T>(
        &self,
        build: impl FnOnce(oneshot::Sender<T>) -> Command,
    ) -> Result<T, RuntimeError> {
        let (tx, rx) = oneshot::channel();
        self.cmd_tx
            .send(build(tx))
            .await
            .map_err(|_| RuntimeError::ChannelClosed)?;
        rx.await.map_err(|_| RuntimeError::ChannelClosed)
    }
}

async fn handle_command<S>(
    cmd: Command,
    engine: &Arc<Mutex<FavoritesEngine<S>>>,
    events_tx: &broadcast::Sender<FavoriteEvent>,
) -> bool
where
    S: FavoriteStorage + 'static,
{
    match cmd {
        Command::IsFavorite { player_id, resp } => {
            let _ = resp.send(engine.lock().await.is_favorite(player_id));
        }
        Command::IsExclusive { player_id, resp } => {
            let _ = resp.send(engine.lock().await.is_exclusive(player_id));
        }
        Command::CanAddExclusive { resp } => {
            let _ = resp.send(engine.lock().await.can_add_exclusive());
        }
        Command::Ordered { kind, resp } => {
            let records = engine
                .lock()
                .await
                .ordered(kind)
                .into_iter()
                .cloned()
                .collect();
            let _ = resp.send(records);
        }
        Command::Snapshot { resp } => {
            let _ = resp.send(engine.lock().await.snapshot());
        }
        Command::ToggleFavorite { player_id, resp } => {
            let res = run_blocking(engine, move |e| e.toggle_favorite(player_id)).await;
            publish_change(events_tx, &res);
            let _ = resp.send(res);
        }
        Command::ToggleExclusive { player_id, resp } => {
            let res = run_blocking(engine, move |e| e.toggle_exclusive(player_id)).await;
            publish_change(events_tx, &res);
            let _ = resp.send(res);
        }
        Command::RemoveFromFavorites { player_id, resp } => {
            let res = run_blocking(engine, move |e| e.remove_from_favorites(player_id)).await;
            publish_change(events_tx, &res);
            let _ = resp.send(res);
        }
        Command::Reorder {
            kind,
            player_ids,
            resp,
        } => {
            let res = engine
                .lock()
                .await
                .reorder(kind, player_ids)
                .map_err(RuntimeError::from);
            if res.is_ok() {
                let _ = events_tx.send(FavoriteEvent::ReorderStaged { kind });
            }
            let _ = resp.send(res);
        }
        Command::CommitReorder { resp } => {
            let res = run_blocking(engine, |e| {
                let staged = e.has_pending_reorder();
                e.commit_reorder().map(|rows| (staged, rows))
            })
            .await;
            if let Ok((true, rows)) = res {
                let _ = events_tx.send(FavoriteEvent::ReorderCommitted { rows });
            }
            let _ = resp.send(res.map(|(_, rows)| rows));
        }
        Command::DiscardReorder { resp } => {
            let dropped = engine.lock().await.discard_reorder();
            if dropped {
                let _ = events_tx.send(FavoriteEvent::ReorderDiscarded);
            }
            let _ = resp.send(dropped);
        }
        Command::Refresh { resp } => {
            let res = run_blocking(engine, |e| e.refresh()).await;
            if res.is_ok() {
                let _ = events_tx.send(FavoriteEvent::Refreshed);
            }
            let _ = resp.send(res);
        }
        Command::Shutdown { resp } => {
            let _ = resp.send(());
            return true;
        }
    }

    false
}

async fn run_blocking<S, T, F>(
    engine: &Arc<Mutex<FavoritesEngine<S>>>,
    f: F,
) -> Result<T, RuntimeError>
where
    S: FavoriteStorage + 'static,
    T: Send + 'static,
    F: FnOnce(&mut FavoritesEngine<S>) -> EngineResult<T> + Send + 'static,
{
    let engine = Arc::clone(engine);
    tokio::task::spawn_blocking(move || {
        let mut engine = engine.blocking_lock();
        f(&mut *engine)
    })
    .await
    .map_err(|e| RuntimeError::Join(e.to_string()))?
    .map_err(RuntimeError::from)
}

fn publish_change(events_tx: &broadcast::Sender<FavoriteEvent>, res: &Result<Change, RuntimeError>) {
    let Ok(change) = res else {
        return;
    };
    let events = match *change {
        Change::FavoriteAdded(player_id) => vec![FavoriteEvent::FavoriteAdded { player_id }],
        Change::FavoriteRemoved(player_id) => vec![FavoriteEvent::FavoriteRemoved { player_id }],
        Change::ExclusiveAdded {
            player_id,
            created: true,
        } => vec![
            FavoriteEvent::FavoriteAdded { player_id },
            FavoriteEvent::ExclusiveAdded { player_id },
        ],
        Change::ExclusiveAdded {
            player_id,
            created: false,
        } => vec![FavoriteEvent::ExclusiveAdded { player_id }],
        Change::ExclusiveRemoved(player_id) => vec![FavoriteEvent::ExclusiveRemoved { player_id }],
    };
    for event in events {
        let _ = events_tx.send(event);
    }
}
