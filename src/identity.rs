use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use uuid::Uuid;

/// Key the player id persists under, shared with the browser profile layout.
pub const PLAYER_ID_KEY: &str = "playerId";

/// The per-client key/value persistence collaborator. Private to one client,
/// never shared: holds the player id and the best-score caches. Writes are
/// write-through and reads hit the loaded snapshot.
pub trait LocalStore: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&self, key: &str, value: &str);
}

/// In-memory store for tests and short-lived tools.
#[derive(Clone, Default)]
pub struct MemoryLocalStore {
    values: Arc<Mutex<HashMap<String, String>>>,
}

impl MemoryLocalStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl LocalStore for MemoryLocalStore {
    fn get(&self, key: &str) -> Option<String> {
        self.values.lock().unwrap().get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) {
        self.values
            .lock()
            .unwrap()
            .insert(key.to_string(), value.to_string());
    }
}

/// JSON-file-backed store: the whole map is loaded on open and rewritten on
/// every set. Write failures are logged and swallowed; losing a cached best
/// score or regenerating a player id is acceptable, blocking the caller on
/// disk errors is not.
pub struct JsonFileStore {
    path: PathBuf,
    values: Mutex<HashMap<String, String>>,
}

impl JsonFileStore {
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let values = std::fs::read_to_string(&path)
            .ok()
            .and_then(|raw| serde_json::from_str(&raw).ok())
            .unwrap_or_default();
        JsonFileStore {
            path,
            values: Mutex::new(values),
        }
    }

    fn flush(&self, values: &HashMap<String, String>) {
        let json = match serde_json::to_string_pretty(values) {
            Ok(json) => json,
            Err(e) => {
                tracing::warn!(error = %e, "failed to serialize local store");
                return;
            }
        };
        if let Err(e) = std::fs::write(&self.path, json) {
            tracing::warn!(path = %self.path.display(), error = %e, "failed to write local store");
        }
    }
}

impl LocalStore for JsonFileStore {
    fn get(&self, key: &str) -> Option<String> {
        self.values.lock().unwrap().get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) {
        let mut values = self.values.lock().unwrap();
        values.insert(key.to_string(), value.to_string());
        self.flush(&values);
    }
}

/// Generate a fresh player id: `player_` plus the first 8 hex characters of
/// a v4 UUID.
pub fn new_player_id() -> String {
    let uuid = Uuid::new_v4().simple().to_string();
    format!("player_{}", &uuid[..8])
}

/// Return this client's player id, generating and persisting one on first
/// call. Later calls return the stored value unchanged. There is no server
/// round-trip and no error path.
pub fn get_or_create_player_id(store: &impl LocalStore) -> String {
    if let Some(existing) = store.get(PLAYER_ID_KEY) {
        return existing;
    }
    let player_id = new_player_id();
    store.set(PLAYER_ID_KEY, &player_id);
    player_id
}
