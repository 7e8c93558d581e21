use std::collections::HashMap;

use crate::auth::AuthProvider;
use crate::error::RoomError;
use crate::room::{GameType, Room};
use crate::store::RoomStore;

/// Room inspection across every game type, gated by the auth collaborator's
/// admin claim. No bulk operations, no audit trail.
pub struct AdminConsole<S, A> {
    store: S,
    auth: A,
}

impl<S: RoomStore, A: AuthProvider> AdminConsole<S, A> {
    pub fn new(store: S, auth: A) -> Self {
        AdminConsole { store, auth }
    }

    pub fn auth(&self) -> &A {
        &self.auth
    }

    async fn require_admin(&self) -> Result<(), RoomError> {
        match self.auth.current_user().await {
            Some(user) if user.admin => Ok(()),
            _ => Err(RoomError::Unauthorized),
        }
    }

    /// Every room record, grouped by game type.
    pub async fn list_all_rooms(
        &self,
    ) -> Result<HashMap<GameType, HashMap<String, Room>>, RoomError> {
        self.require_admin().await?;
        Ok(self.store.read_all().await?)
    }

    /// Delete one room. Returns whether a record existed to delete.
    pub async fn delete_room(
        &self,
        game_type: GameType,
        room_id: &str,
    ) -> Result<bool, RoomError> {
        self.require_admin().await?;
        let existed = self.store.read(game_type, room_id).await?.is_some();
        self.store.remove(game_type, room_id).await?;
        if existed {
            tracing::info!(game_type = %game_type, room_id = %room_id, "room deleted by admin");
        }
        Ok(existed)
    }
}
