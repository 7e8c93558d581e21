use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use rusqlite::Connection;

use crate::room::{GameType, Room, RoomPatch};
use crate::store::{RoomStore, RoomWatch, StoreError, WatchRegistry};

/// SQLite-backed [`RoomStore`] for single-node deployments of the server
/// binary. Records persist as JSON rows keyed by namespace and code; change
/// notifications stay in-process.
pub struct SqliteRoomStore {
    conn: Arc<Mutex<Connection>>,
    watches: WatchRegistry,
}

impl Clone for SqliteRoomStore {
    fn clone(&self) -> Self {
        SqliteRoomStore {
            conn: self.conn.clone(),
            watches: self.watches.clone(),
        }
    }
}

fn db_err(err: rusqlite::Error) -> StoreError {
    StoreError::Unavailable(err.to_string())
}

fn lock_err() -> StoreError {
    StoreError::Unavailable("store lock poisoned".to_string())
}

impl SqliteRoomStore {
    /// Open (or create) a SQLite database at the given path.
    pub fn open(path: &str) -> Result<Self, StoreError> {
        let conn = Connection::open(path).map_err(db_err)?;
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS rooms (
                game_type TEXT NOT NULL,
                room_id TEXT NOT NULL,
                data TEXT NOT NULL,
                PRIMARY KEY (game_type, room_id)
            );",
        )
        .map_err(db_err)?;
        Ok(SqliteRoomStore {
            conn: Arc::new(Mutex::new(conn)),
            watches: WatchRegistry::default(),
        })
    }

    fn read_row(
        conn: &Connection,
        game_type: GameType,
        room_id: &str,
    ) -> Result<Option<Room>, StoreError> {
        let mut stmt = conn
            .prepare("SELECT data FROM rooms WHERE game_type = ?1 AND room_id = ?2")
            .map_err(db_err)?;
        let mut rows = stmt
            .query(rusqlite::params![game_type.as_str(), room_id])
            .map_err(db_err)?;
        match rows.next().map_err(db_err)? {
            Some(row) => {
                let json: String = row.get(0).map_err(db_err)?;
                let room: Room = serde_json::from_str(&json)?;
                Ok(Some(room))
            }
            None => Ok(None),
        }
    }

    fn write_row(conn: &Connection, room: &Room) -> Result<(), StoreError> {
        let json = serde_json::to_string(room)?;
        conn.execute(
            "INSERT OR REPLACE INTO rooms (game_type, room_id, data) VALUES (?1, ?2, ?3)",
            rusqlite::params![room.game_type.as_str(), room.room_id, json],
        )
        .map_err(db_err)?;
        Ok(())
    }
}

impl RoomStore for SqliteRoomStore {
    async fn create(&self, room: &Room) -> Result<(), StoreError> {
        {
            let conn = self.conn.lock().map_err(|_| lock_err())?;
            Self::write_row(&conn, room)?;
        }
        self.watches.notify(room);
        Ok(())
    }

    async fn read(&self, game_type: GameType, room_id: &str) -> Result<Option<Room>, StoreError> {
        let conn = self.conn.lock().map_err(|_| lock_err())?;
        Self::read_row(&conn, game_type, room_id)
    }

    async fn update(
        &self,
        game_type: GameType,
        room_id: &str,
        patch: &RoomPatch,
    ) -> Result<(), StoreError> {
        let updated = {
            let conn = self.conn.lock().map_err(|_| lock_err())?;
            match Self::read_row(&conn, game_type, room_id)? {
                Some(mut room) => {
                    room.apply(patch);
                    Self::write_row(&conn, &room)?;
                    Some(room)
                }
                None => None,
            }
        };
        if let Some(room) = updated {
            self.watches.notify(&room);
        }
        Ok(())
    }

    async fn remove(&self, game_type: GameType, room_id: &str) -> Result<(), StoreError> {
        {
            let conn = self.conn.lock().map_err(|_| lock_err())?;
            conn.execute(
                "DELETE FROM rooms WHERE game_type = ?1 AND room_id = ?2",
                rusqlite::params![game_type.as_str(), room_id],
            )
            .map_err(db_err)?;
        }
        self.watches.close(game_type, room_id);
        Ok(())
    }

    async fn list(&self, game_type: GameType) -> Result<Vec<Room>, StoreError> {
        let conn = self.conn.lock().map_err(|_| lock_err())?;
        let mut stmt = conn
            .prepare("SELECT data FROM rooms WHERE game_type = ?1")
            .map_err(db_err)?;
        let rows = stmt
            .query_map(rusqlite::params![game_type.as_str()], |row| {
                row.get::<_, String>(0)
            })
            .map_err(db_err)?;

        let mut rooms = Vec::new();
        for row in rows {
            let json = row.map_err(db_err)?;
            rooms.push(serde_json::from_str(&json)?);
        }
        Ok(rooms)
    }

    async fn read_all(&self) -> Result<HashMap<GameType, HashMap<String, Room>>, StoreError> {
        let conn = self.conn.lock().map_err(|_| lock_err())?;
        let mut stmt = conn.prepare("SELECT data FROM rooms").map_err(db_err)?;
        let rows = stmt
            .query_map([], |row| row.get::<_, String>(0))
            .map_err(db_err)?;

        let mut out: HashMap<GameType, HashMap<String, Room>> = HashMap::new();
        for row in rows {
            let json = row.map_err(db_err)?;
            let room: Room = serde_json::from_str(&json)?;
            out.entry(room.game_type)
                .or_default()
                .insert(room.room_id.clone(), room);
        }
        Ok(out)
    }

    async fn subscribe(&self, game_type: GameType, room_id: &str) -> RoomWatch {
        let snapshot = self
            .conn
            .lock()
            .ok()
            .and_then(|conn| Self::read_row(&conn, game_type, room_id).ok().flatten());
        self.watches.subscribe(game_type, room_id, snapshot)
    }
}
