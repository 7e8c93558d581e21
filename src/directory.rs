use serde::{Serialize, Deserialize};

use crate::error::RoomError;
use crate::room::{epoch_ms_now, GameType, Room};
use crate::store::RoomStore;

/// Rooms idle past this age are eligible for deletion: 5 minutes.
pub const ROOM_IDLE_TIMEOUT_MS: u64 = 5 * 60 * 1000;

/// One row of the browse list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomSummary {
    pub room_id: String,
    pub host_name: String,
    pub created_at: u64,
}

impl RoomSummary {
    fn from_room(room: &Room) -> RoomSummary {
        RoomSummary {
            room_id: room.room_id.clone(),
            host_name: room
                .host
                .as_ref()
                .map(|h| h.name.clone())
                .unwrap_or_else(|| "Unknown".to_string()),
            created_at: room.created_at,
        }
    }
}

/// Browse view over a game-type namespace. Listing doubles as the garbage
/// collector: there is no background sweep, so stale rooms live until the
/// next client browses the namespace.
pub struct RoomDirectory<S> {
    store: S,
    idle_timeout_ms: u64,
}

impl<S: Clone> Clone for RoomDirectory<S> {
    fn clone(&self) -> Self {
        RoomDirectory {
            store: self.store.clone(),
            idle_timeout_ms: self.idle_timeout_ms,
        }
    }
}

impl<S: RoomStore> RoomDirectory<S> {
    pub fn new(store: S) -> Self {
        RoomDirectory {
            store,
            idle_timeout_ms: ROOM_IDLE_TIMEOUT_MS,
        }
    }

    pub fn with_timeout(store: S, idle_timeout_ms: u64) -> Self {
        RoomDirectory {
            store,
            idle_timeout_ms,
        }
    }

    /// Rooms a new guest can join right now, oldest first. As a side effect,
    /// deletes every record in the namespace idle past the timeout. Cleanup
    /// is best-effort: a failed delete is logged at debug and never fails
    /// the listing.
    pub async fn list_joinable(
        &self,
        game_type: GameType,
    ) -> Result<Vec<RoomSummary>, RoomError> {
        let rooms = self.store.list(game_type).await?;
        let now = epoch_ms_now();

        let mut joinable = Vec::new();
        for room in rooms {
            if now.saturating_sub(room.last_active()) > self.idle_timeout_ms {
                if let Err(e) = self.store.remove(game_type, &room.room_id).await {
                    tracing::debug!(
                        game_type = %game_type,
                        room_id = %room.room_id,
                        error = %e,
                        "stale room cleanup failed"
                    );
                } else {
                    tracing::debug!(
                        game_type = %game_type,
                        room_id = %room.room_id,
                        "stale room removed"
                    );
                }
                continue;
            }
            if room.is_joinable() {
                joinable.push(RoomSummary::from_room(&room));
            }
        }

        joinable.sort_by_key(|summary| summary.created_at);
        Ok(joinable)
    }
}
