//! SQLite-backed favorite storage.

use std::path::Path;

use rusqlite::{Connection, ErrorCode, OptionalExtension, Row, params};

use crate::{
    favorite::{FavoritePatch, FavoriteRecord, NewFavorite, OrderUpdate},
    types::{FavoriteId, ScoutId, TournamentId},
};

use super::{FavoriteStorage, PersistError, PersistResult, now_ms};

const SELECT_COLUMNS: &str = "SELECT id, scout_id, player_id, tournament_id, is_exclusive, \
     exclusive_order, favorite_order, created_at_ms, updated_at_ms FROM favorites";

/// SQLite implementation of [`crate::persist::FavoriteStorage`].
pub struct SqliteFavoriteStore {
    conn: Connection,
}

impl SqliteFavoriteStore {
    /// Opens or creates a SQLite-backed store at `path`.
    ///
    /// Enables WAL mode and sets `synchronous=NORMAL`.
    pub fn open(path: impl AsRef<Path>) -> PersistResult<Self> {
        let conn = Connection::open(path)?;
        Self::init_connection(conn)
    }

    /// Opens an in-memory SQLite store.
    pub fn open_in_memory() -> PersistResult<Self> {
        let conn = Connection::open_in_memory()?;
        Self::init_connection(conn)
    }

    fn init_connection(conn: Connection) -> PersistResult<Self> {
        conn.execute_batch(include_str!("schema.sql"))?;
        conn.pragma_update(None, "journal_mode", "WAL")?;
        conn.pragma_update(None, "synchronous", "NORMAL")?;
        Ok(Self { conn })
    }

    /// Reads a single record by id.
    pub fn get(&self, id: FavoriteId) -> PersistResult<Option<FavoriteRecord>> {
        fetch(&self.conn, id)
    }
}

impl FavoriteStorage for SqliteFavoriteStore {
    fn list_favorites(
        &mut self,
        scout_id: ScoutId,
        tournament_id: TournamentId,
    ) -> PersistResult<Vec<FavoriteRecord>> {
        let mut stmt = self.conn.prepare(&format!(
            "{SELECT_COLUMNS} WHERE scout_id = ?1 AND tournament_id = ?2 ORDER BY favorite_order ASC, id ASC"
        ))?;
        let rows = stmt.query_map(params![scout_id as i64, tournament_id as i64], read_row)?;

        let mut out = Vec::new();
        for row in rows {
            out.push(row?);
        }
        Ok(out)
    }

    fn create_favorite(&mut self, new: &NewFavorite) -> PersistResult<FavoriteRecord> {
        let now = now_ms();
        let res = self.conn.execute(
            "INSERT INTO favorites(scout_id, player_id, tournament_id, is_exclusive, exclusive_order, \
             favorite_order, created_at_ms, updated_at_ms) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?7)",
            params![
                new.scout_id as i64,
                new.player_id as i64,
                new.tournament_id as i64,
                new.is_exclusive,
                new.order.map(i64::from),
                i64::from(new.favorite_order),
                now as i64,
            ],
        );

        match res {
            Ok(_) => {
                let id = self.conn.last_insert_rowid() as FavoriteId;
                Ok(new.clone().into_record(id, now))
            }
            Err(err) if err.sqlite_error_code() == Some(ErrorCode::ConstraintViolation) => {
                Err(PersistError::Conflict {
                    scout_id: new.scout_id,
                    player_id: new.player_id,
                    tournament_id: new.tournament_id,
                })
            }
            Err(err) => Err(err.into()),
        }
    }

    fn update_favorite(
        &mut self,
        id: FavoriteId,
        patch: &FavoritePatch,
    ) -> PersistResult<FavoriteRecord> {
        let tx = self.conn.transaction()?;
        let mut rec = fetch(&tx, id)?.ok_or(PersistError::NotFound(id))?;
        patch.apply_to(&mut rec);
        rec.updated_at_ms = now_ms();
        tx.execute(
            "UPDATE favorites SET is_exclusive = ?2, exclusive_order = ?3, favorite_order = ?4, \
             updated_at_ms = ?5 WHERE id = ?1",
            params![
                id as i64,
                rec.is_exclusive,
                rec.order.map(i64::from),
                i64::from(rec.favorite_order),
                rec.updated_at_ms as i64,
            ],
        )?;
        tx.commit()?;
        Ok(rec)
    }

    fn delete_favorite(&mut self, id: FavoriteId) -> PersistResult<()> {
        let count = self
            .conn
            .execute("DELETE FROM favorites WHERE id = ?1", params![id as i64])?;
        if count == 0 {
            return Err(PersistError::NotFound(id));
        }
        Ok(())
    }

    fn batch_update_orders(&mut self, updates: &[OrderUpdate]) -> PersistResult<()> {
        if updates.is_empty() {
            return Ok(());
        }

        let now = now_ms();
        let tx = self.conn.transaction()?;
        {
            let mut stmt = tx.prepare(
                "UPDATE favorites SET exclusive_order = COALESCE(?2, exclusive_order), \
                 favorite_order = COALESCE(?3, favorite_order), updated_at_ms = ?4 WHERE id = ?1",
            )?;
            for update in updates {
                let changed = stmt.execute(params![
                    update.id as i64,
                    update.order.map(i64::from),
                    update.favorite_order.map(i64::from),
                    now as i64,
                ])?;
                // Dropping the transaction rolls back rows already written.
                if changed == 0 {
                    return Err(PersistError::NotFound(update.id));
                }
            }
        }
        tx.commit()?;
        Ok(())
    }
}

fn fetch(conn: &Connection, id: FavoriteId) -> PersistResult<Option<FavoriteRecord>> {
    let rec = conn
        .query_row(
            &format!("{SELECT_COLUMNS} WHERE id = ?1"),
            params![id as i64],
            read_row,
        )
        .optional()?;
    Ok(rec)
}

fn read_row(row: &Row<'_>) -> rusqlite::Result<FavoriteRecord> {
    let id: i64 = row.get(0)?;
    let scout_id: i64 = row.get(1)?;
    let player_id: i64 = row.get(2)?;
    let tournament_id: i64 = row.get(3)?;
    let is_exclusive: bool = row.get(4)?;
    let order: Option<i64> = row.get(5)?;
    let favorite_order: i64 = row.get(6)?;
    let created_at_ms: i64 = row.get(7)?;
    let updated_at_ms: i64 = row.get(8)?;
    Ok(FavoriteRecord {
        id: id as FavoriteId,
        scout_id: scout_id as ScoutId,
        player_id: player_id as u64,
        tournament_id: tournament_id as TournamentId,
        is_exclusive,
        order: order.map(|v| v as u32),
        favorite_order: favorite_order as u32,
        created_at_ms: created_at_ms as u64,
        updated_at_ms: updated_at_ms as u64,
    })
}
