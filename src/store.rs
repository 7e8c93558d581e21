use std::collections::HashMap;
use std::error::Error;
use std::fmt;
use std::future::Future;
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;

use crate::room::{GameType, Room, RoomPatch};

/// Errors from the backing store. Serialization failures are the caller's
/// bug; everything else is the backend being unreachable or broken.
#[derive(Debug, Clone, PartialEq)]
pub enum StoreError {
    Serialization(String),
    Unavailable(String),
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            StoreError::Serialization(msg) => write!(f, "serialization failed: {}", msg),
            StoreError::Unavailable(msg) => write!(f, "{}", msg),
        }
    }
}

impl Error for StoreError {}

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        StoreError::Serialization(err.to_string())
    }
}

/// A live subscription to one room record. Each watcher gets the full
/// current record on every change, starting with an immediate snapshot if
/// the record exists at subscribe time. The stream ends when the room is
/// deleted. Dropping the watch unsubscribes it.
pub struct RoomWatch {
    rx: mpsc::UnboundedReceiver<Room>,
    cancel: Option<Box<dyn FnOnce() + Send>>,
}

impl RoomWatch {
    /// Next room snapshot, or `None` once the room is gone and the buffer
    /// is drained.
    pub async fn recv(&mut self) -> Option<Room> {
        self.rx.recv().await
    }

    /// Non-blocking variant of [`recv`](Self::recv).
    pub fn try_recv(&mut self) -> Option<Room> {
        self.rx.try_recv().ok()
    }

    /// Stop receiving updates. Safe to call more than once.
    pub fn unsubscribe(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }
}

impl Drop for RoomWatch {
    fn drop(&mut self) {
        self.unsubscribe();
    }
}

struct Watcher {
    id: u64,
    tx: mpsc::UnboundedSender<Room>,
}

#[derive(Default)]
struct RegistryInner {
    next_id: u64,
    watchers: HashMap<(GameType, String), Vec<Watcher>>,
}

/// Per-path watcher bookkeeping shared by the store implementations.
#[derive(Clone, Default)]
pub(crate) struct WatchRegistry {
    inner: Arc<Mutex<RegistryInner>>,
}

impl WatchRegistry {
    pub(crate) fn subscribe(
        &self,
        game_type: GameType,
        room_id: &str,
        snapshot: Option<Room>,
    ) -> RoomWatch {
        let (tx, rx) = mpsc::unbounded_channel();
        if let Some(room) = snapshot {
            let _ = tx.send(room);
        }

        let key = (game_type, room_id.to_string());
        let id = {
            let mut inner = self.inner.lock().unwrap();
            let id = inner.next_id;
            inner.next_id += 1;
            inner
                .watchers
                .entry(key.clone())
                .or_default()
                .push(Watcher { id, tx });
            id
        };

        let registry = self.inner.clone();
        let cancel = Box::new(move || {
            let mut inner = registry.lock().unwrap();
            let emptied = match inner.watchers.get_mut(&key) {
                Some(watchers) => {
                    watchers.retain(|w| w.id != id);
                    watchers.is_empty()
                }
                None => false,
            };
            if emptied {
                inner.watchers.remove(&key);
            }
        });

        RoomWatch {
            rx,
            cancel: Some(cancel),
        }
    }

    pub(crate) fn notify(&self, room: &Room) {
        let key = (room.game_type, room.room_id.clone());
        let mut inner = self.inner.lock().unwrap();
        if let Some(watchers) = inner.watchers.get_mut(&key) {
            watchers.retain(|w| w.tx.send(room.clone()).is_ok());
        }
    }

    /// Drop every watcher on a path; their streams end.
    pub(crate) fn close(&self, game_type: GameType, room_id: &str) {
        let key = (game_type, room_id.to_string());
        self.inner.lock().unwrap().watchers.remove(&key);
    }
}

/// The external room store collaborator: a path-addressable document store
/// keyed `rooms/{gameType}/{roomId}`, with change notifications. There is no
/// transaction or compare-and-swap primitive; concurrent writers race and
/// the last write to a field wins. Callers narrow each write's field set
/// through [`RoomPatch`] to limit the damage.
pub trait RoomStore: Send + Sync {
    /// Write a full record. Fails only if the record cannot be serialized;
    /// writing the same record twice is fine.
    fn create(&self, room: &Room) -> impl Future<Output = Result<(), StoreError>> + Send;

    /// Point-in-time read; `None` when the record is absent.
    fn read(
        &self,
        game_type: GameType,
        room_id: &str,
    ) -> impl Future<Output = Result<Option<Room>, StoreError>> + Send;

    /// Shallow-merge the patch's set fields into the record. Merging into an
    /// absent record is a silent no-op: a concurrent delete wins the race.
    fn update(
        &self,
        game_type: GameType,
        room_id: &str,
        patch: &RoomPatch,
    ) -> impl Future<Output = Result<(), StoreError>> + Send;

    /// Delete the record and end its watchers' streams. Removing an absent
    /// record is fine.
    fn remove(
        &self,
        game_type: GameType,
        room_id: &str,
    ) -> impl Future<Output = Result<(), StoreError>> + Send;

    /// Every record under a game-type namespace. A scan: O(room count), no
    /// pagination.
    fn list(
        &self,
        game_type: GameType,
    ) -> impl Future<Output = Result<Vec<Room>, StoreError>> + Send;

    /// The whole `rooms/` tree, for the admin view.
    fn read_all(
        &self,
    ) -> impl Future<Output = Result<HashMap<GameType, HashMap<String, Room>>, StoreError>> + Send;

    /// Watch one record. Delivers the current record immediately when it
    /// exists, then every subsequent change; delivers nothing while absent.
    /// Watchers are independent of each other.
    fn subscribe(
        &self,
        game_type: GameType,
        room_id: &str,
    ) -> impl Future<Output = RoomWatch> + Send;
}

/// In-memory [`RoomStore`]: the reference implementation backing tests and
/// any single-process deployment.
#[derive(Clone, Default)]
pub struct MemoryRoomStore {
    rooms: Arc<Mutex<HashMap<(GameType, String), Room>>>,
    watches: WatchRegistry,
}

impl MemoryRoomStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock_rooms(&self) -> Result<std::sync::MutexGuard<'_, HashMap<(GameType, String), Room>>, StoreError> {
        self.rooms
            .lock()
            .map_err(|_| StoreError::Unavailable("store lock poisoned".to_string()))
    }
}

impl RoomStore for MemoryRoomStore {
    async fn create(&self, room: &Room) -> Result<(), StoreError> {
        serde_json::to_value(room)?;
        let key = (room.game_type, room.room_id.clone());
        self.lock_rooms()?.insert(key, room.clone());
        self.watches.notify(room);
        Ok(())
    }

    async fn read(&self, game_type: GameType, room_id: &str) -> Result<Option<Room>, StoreError> {
        let rooms = self.lock_rooms()?;
        Ok(rooms.get(&(game_type, room_id.to_string())).cloned())
    }

    async fn update(
        &self,
        game_type: GameType,
        room_id: &str,
        patch: &RoomPatch,
    ) -> Result<(), StoreError> {
        let updated = {
            let mut rooms = self.lock_rooms()?;
            match rooms.get_mut(&(game_type, room_id.to_string())) {
                Some(room) => {
                    room.apply(patch);
                    Some(room.clone())
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
        self.lock_rooms()?.remove(&(game_type, room_id.to_string()));
        self.watches.close(game_type, room_id);
        Ok(())
    }

    async fn list(&self, game_type: GameType) -> Result<Vec<Room>, StoreError> {
        let rooms = self.lock_rooms()?;
        Ok(rooms
            .iter()
            .filter(|((gt, _), _)| *gt == game_type)
            .map(|(_, room)| room.clone())
            .collect())
    }

    async fn read_all(&self) -> Result<HashMap<GameType, HashMap<String, Room>>, StoreError> {
        let rooms = self.lock_rooms()?;
        let mut out: HashMap<GameType, HashMap<String, Room>> = HashMap::new();
        for ((game_type, room_id), room) in rooms.iter() {
            out.entry(*game_type)
                .or_default()
                .insert(room_id.clone(), room.clone());
        }
        Ok(out)
    }

    async fn subscribe(&self, game_type: GameType, room_id: &str) -> RoomWatch {
        let snapshot = self
            .rooms
            .lock()
            .ok()
            .and_then(|rooms| rooms.get(&(game_type, room_id.to_string())).cloned());
        self.watches.subscribe(game_type, room_id, snapshot)
    }
}
