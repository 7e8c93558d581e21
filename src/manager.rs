use std::sync::Arc;
use serde_json::Value;

use crate::error::RoomError;
use crate::room::{
    epoch_ms_now, GameType, Outcome, Participant, Room, RoomPatch, RoomStatus, Seat,
};
use crate::room_code;
use crate::store::{RoomStore, RoomWatch};

/// Attempts at finding a free room code before giving up.
pub const MAX_CODE_ATTEMPTS: usize = 10;

/// A participant's handle on a room: which room, which seat, which local
/// player id. Sessions are plain data; every mutation goes back through the
/// [`RoomManager`], and readers hold a [`RoomWatch`], never the record
/// itself.
#[derive(Debug, Clone, PartialEq)]
pub struct RoomSession {
    pub game_type: GameType,
    pub room_id: String,
    pub seat: Seat,
    pub player_id: String,
}

/// Owns every room mutation. Generic over the store collaborator so tests
/// run against [`MemoryRoomStore`](crate::store::MemoryRoomStore) and
/// deployments plug in whichever backend hosts `rooms/`.
pub struct RoomManager<S> {
    store: S,
    code_source: Arc<dyn Fn() -> String + Send + Sync>,
}

impl<S: Clone> Clone for RoomManager<S> {
    fn clone(&self) -> Self {
        RoomManager {
            store: self.store.clone(),
            code_source: self.code_source.clone(),
        }
    }
}

impl<S: RoomStore> RoomManager<S> {
    pub fn new(store: S) -> Self {
        RoomManager {
            store,
            code_source: Arc::new(|| room_code::generate_code(&mut rand::thread_rng())),
        }
    }

    /// Replace the code generator. Tests use this to force collisions.
    pub fn with_code_source(
        store: S,
        source: impl Fn() -> String + Send + Sync + 'static,
    ) -> Self {
        RoomManager {
            store,
            code_source: Arc::new(source),
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Create a room and seat the host. The generator alone does not
    /// guarantee uniqueness: each candidate code is probed against the
    /// store and regenerated on collision, up to [`MAX_CODE_ATTEMPTS`].
    /// Exhaustion leaves nothing behind in the store.
    pub async fn create_room(
        &self,
        game_type: GameType,
        player_id: &str,
        player_name: &str,
    ) -> Result<RoomSession, RoomError> {
        let host = Participant::new(player_id, display_name(player_name, Seat::Host));

        for _ in 0..MAX_CODE_ATTEMPTS {
            let code = (self.code_source)();
            if self.store.read(game_type, &code).await?.is_some() {
                continue;
            }

            let room = Room::new(game_type, &code, host.clone());
            self.store.create(&room).await?;
            tracing::info!(game_type = %game_type, room_id = %code, "room created");
            return Ok(RoomSession {
                game_type,
                room_id: code,
                seat: Seat::Host,
                player_id: player_id.to_string(),
            });
        }

        Err(RoomError::RoomCodeExhausted)
    }

    /// Seat a guest in a waiting room. The read-then-write window is open:
    /// two simultaneous joiners can both see an empty seat, and the second
    /// write overwrites the first's name. Accepted: `status` lands on
    /// `playing` either way.
    pub async fn join_room(
        &self,
        game_type: GameType,
        code: &str,
        player_id: &str,
        player_name: &str,
    ) -> Result<RoomSession, RoomError> {
        let code = room_code::normalize(code);
        let room = self
            .store
            .read(game_type, &code)
            .await?
            .ok_or(RoomError::RoomNotFound)?;

        if room.guest.is_some() {
            return Err(RoomError::RoomFull);
        }
        if room.status != RoomStatus::Waiting {
            return Err(RoomError::GameInProgress);
        }

        let guest = Participant::new(player_id, display_name(player_name, Seat::Guest));
        let patch = RoomPatch {
            guest: Some(Some(guest)),
            status: Some(RoomStatus::Playing),
            last_activity: Some(epoch_ms_now()),
            ..Default::default()
        };
        self.store.update(game_type, &code, &patch).await?;
        tracing::info!(game_type = %game_type, room_id = %code, "guest joined");

        Ok(RoomSession {
            game_type,
            room_id: code,
            seat: Seat::Guest,
            player_id: player_id.to_string(),
        })
    }

    /// Publish a move: one update carrying exactly the new game state, the
    /// seat to move next, and a refreshed activity timestamp, never the
    /// whole record. The opponent sees it through their watch.
    pub async fn publish_move(
        &self,
        session: &RoomSession,
        game_state: Value,
        next_turn: Seat,
    ) -> Result<(), RoomError> {
        let patch = RoomPatch {
            game_state: Some(game_state),
            current_turn: Some(next_turn),
            last_activity: Some(epoch_ms_now()),
            ..Default::default()
        };
        self.store
            .update(session.game_type, &session.room_id, &patch)
            .await?;
        Ok(())
    }

    /// Publish the terminal outcome the mover computed locally. There is no
    /// adjudication beyond this write.
    pub async fn finish_game(
        &self,
        session: &RoomSession,
        outcome: Outcome,
    ) -> Result<(), RoomError> {
        let patch = RoomPatch {
            status: Some(RoomStatus::Finished),
            winner: Some(outcome),
            last_activity: Some(epoch_ms_now()),
            ..Default::default()
        };
        self.store
            .update(session.game_type, &session.room_id, &patch)
            .await?;
        tracing::info!(
            game_type = %session.game_type,
            room_id = %session.room_id,
            winner = ?outcome,
            "game finished"
        );
        Ok(())
    }

    /// Leave the room. A departing host deletes the record outright; a
    /// departing guest vacates the seat and the room goes back to waiting
    /// for a new opponent.
    pub async fn leave_room(&self, session: &RoomSession) -> Result<(), RoomError> {
        match session.seat {
            Seat::Host => {
                self.store
                    .remove(session.game_type, &session.room_id)
                    .await?;
                tracing::info!(
                    game_type = %session.game_type,
                    room_id = %session.room_id,
                    "host left, room removed"
                );
            }
            Seat::Guest => {
                let patch = RoomPatch {
                    guest: Some(None),
                    status: Some(RoomStatus::Waiting),
                    last_activity: Some(epoch_ms_now()),
                    ..Default::default()
                };
                self.store
                    .update(session.game_type, &session.room_id, &patch)
                    .await?;
                tracing::info!(
                    game_type = %session.game_type,
                    room_id = %session.room_id,
                    "guest left, room back to waiting"
                );
            }
        }
        Ok(())
    }

    /// Point-in-time read of a room record.
    pub async fn read_room(
        &self,
        game_type: GameType,
        room_id: &str,
    ) -> Result<Room, RoomError> {
        self.store
            .read(game_type, room_id)
            .await?
            .ok_or(RoomError::RoomNotFound)
    }

    /// Watch a room. Remember to drop or unsubscribe the watch when the
    /// client navigates away.
    pub async fn subscribe(&self, game_type: GameType, room_id: &str) -> RoomWatch {
        self.store.subscribe(game_type, room_id).await
    }
}

/// Trimmed display name, falling back to the seat's default.
fn display_name(raw: &str, seat: Seat) -> String {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        match seat {
            Seat::Host => "Player 1".to_string(),
            Seat::Guest => "Player 2".to_string(),
        }
    } else {
        trimmed.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryRoomStore;
    use serde_json::json;
    use std::sync::Mutex;

    fn make_manager() -> RoomManager<MemoryRoomStore> {
        RoomManager::new(MemoryRoomStore::new())
    }

    /// Manager whose generator replays a fixed code sequence.
    fn scripted_manager(codes: Vec<&str>) -> RoomManager<MemoryRoomStore> {
        let codes: Mutex<Vec<String>> =
            Mutex::new(codes.into_iter().rev().map(String::from).collect());
        RoomManager::with_code_source(MemoryRoomStore::new(), move || {
            codes.lock().unwrap().pop().expect("script ran dry")
        })
    }

    #[tokio::test]
    async fn create_room_seats_host_and_waits() {
        let manager = make_manager();
        let session = manager
            .create_room(GameType::TicTacToe, "player_11112222", "Alice")
            .await
            .unwrap();

        assert_eq!(session.seat, Seat::Host);
        assert!(room_code::is_valid_code(&session.room_id));

        let room = manager
            .read_room(GameType::TicTacToe, &session.room_id)
            .await
            .unwrap();
        assert_eq!(room.status, RoomStatus::Waiting);
        assert_eq!(room.current_turn, Seat::Host);
        assert_eq!(room.host.as_ref().unwrap().name, "Alice");
        assert!(room.host.as_ref().unwrap().ready);
        assert!(room.guest.is_none());
    }

    #[tokio::test]
    async fn create_room_retries_on_collision() {
        let manager = scripted_manager(vec!["AAAA", "AAAA", "BBBB"]);
        let first = manager
            .create_room(GameType::TicTacToe, "player_1", "Alice")
            .await
            .unwrap();
        assert_eq!(first.room_id, "AAAA");

        // Second creation draws "AAAA" again, collides with the live room,
        // and settles on "BBBB".
        let second = manager
            .create_room(GameType::TicTacToe, "player_2", "Bob")
            .await
            .unwrap();
        assert_eq!(second.room_id, "BBBB");
    }

    #[tokio::test]
    async fn create_room_exhaustion_leaves_no_partial_room() {
        let codes = vec!["AAAA"; MAX_CODE_ATTEMPTS + 1];
        let manager = scripted_manager(codes);
        manager
            .create_room(GameType::TicTacToe, "player_1", "Alice")
            .await
            .unwrap();

        let result = manager
            .create_room(GameType::TicTacToe, "player_2", "Bob")
            .await;
        assert_eq!(result.unwrap_err(), RoomError::RoomCodeExhausted);

        // Only the first room exists.
        let rooms = manager.store().list(GameType::TicTacToe).await.unwrap();
        assert_eq!(rooms.len(), 1);
    }

    #[tokio::test]
    async fn same_code_may_live_under_two_game_types() {
        let manager = scripted_manager(vec!["AAAA", "AAAA"]);
        manager
            .create_room(GameType::TicTacToe, "player_1", "Alice")
            .await
            .unwrap();
        let other = manager
            .create_room(GameType::Checkers, "player_2", "Bob")
            .await
            .unwrap();
        assert_eq!(other.room_id, "AAAA");
    }

    #[tokio::test]
    async fn join_transitions_to_playing() {
        let manager = make_manager();
        let host = manager
            .create_room(GameType::TicTacToe, "player_1", "Alice")
            .await
            .unwrap();

        let guest = manager
            .join_room(GameType::TicTacToe, &host.room_id, "player_2", "Bob")
            .await
            .unwrap();
        assert_eq!(guest.seat, Seat::Guest);

        let room = manager
            .read_room(GameType::TicTacToe, &host.room_id)
            .await
            .unwrap();
        assert_eq!(room.status, RoomStatus::Playing);
        assert_eq!(room.guest.as_ref().unwrap().name, "Bob");
        // Host's fields were not touched by the join patch.
        assert_eq!(room.host.as_ref().unwrap().name, "Alice");
        assert_eq!(room.current_turn, Seat::Host);
    }

    #[tokio::test]
    async fn join_normalizes_the_code() {
        let manager = scripted_manager(vec!["ABCD"]);
        manager
            .create_room(GameType::TicTacToe, "player_1", "Alice")
            .await
            .unwrap();

        let guest = manager
            .join_room(GameType::TicTacToe, " ab cd ", "player_2", "Bob")
            .await
            .unwrap();
        assert_eq!(guest.room_id, "ABCD");
    }

    #[tokio::test]
    async fn join_unknown_code_fails() {
        let manager = make_manager();
        let result = manager
            .join_room(GameType::TicTacToe, "ZZZZ", "player_2", "Bob")
            .await;
        assert_eq!(result.unwrap_err(), RoomError::RoomNotFound);
    }

    #[tokio::test]
    async fn second_join_fails_full_and_leaves_record_unchanged() {
        let manager = make_manager();
        let host = manager
            .create_room(GameType::TicTacToe, "player_1", "Alice")
            .await
            .unwrap();
        manager
            .join_room(GameType::TicTacToe, &host.room_id, "player_2", "Bob")
            .await
            .unwrap();

        let before = manager
            .read_room(GameType::TicTacToe, &host.room_id)
            .await
            .unwrap();
        let result = manager
            .join_room(GameType::TicTacToe, &host.room_id, "player_3", "Carol")
            .await;
        assert_eq!(result.unwrap_err(), RoomError::RoomFull);

        let after = manager
            .read_room(GameType::TicTacToe, &host.room_id)
            .await
            .unwrap();
        assert_eq!(after, before);
    }

    #[tokio::test]
    async fn join_non_waiting_room_fails_in_progress() {
        let manager = make_manager();
        let host = manager
            .create_room(GameType::TicTacToe, "player_1", "Alice")
            .await
            .unwrap();

        // An empty guest seat with a non-waiting status: the shape a record
        // takes mid-race or after a finished guest walked away un-patched.
        let patch = RoomPatch {
            status: Some(RoomStatus::Finished),
            ..Default::default()
        };
        manager
            .store()
            .update(GameType::TicTacToe, &host.room_id, &patch)
            .await
            .unwrap();

        let result = manager
            .join_room(GameType::TicTacToe, &host.room_id, "player_2", "Bob")
            .await;
        assert_eq!(result.unwrap_err(), RoomError::GameInProgress);
    }

    #[tokio::test]
    async fn empty_names_fall_back_to_seat_defaults() {
        let manager = make_manager();
        let host = manager
            .create_room(GameType::TicTacToe, "player_1", "   ")
            .await
            .unwrap();
        manager
            .join_room(GameType::TicTacToe, &host.room_id, "player_2", "")
            .await
            .unwrap();

        let room = manager
            .read_room(GameType::TicTacToe, &host.room_id)
            .await
            .unwrap();
        assert_eq!(room.host.as_ref().unwrap().name, "Player 1");
        assert_eq!(room.guest.as_ref().unwrap().name, "Player 2");
    }

    #[tokio::test]
    async fn publish_move_writes_state_turn_and_activity_only() {
        let manager = make_manager();
        let host = manager
            .create_room(GameType::TicTacToe, "player_1", "Alice")
            .await
            .unwrap();
        manager
            .join_room(GameType::TicTacToe, &host.room_id, "player_2", "Bob")
            .await
            .unwrap();

        let before = manager
            .read_room(GameType::TicTacToe, &host.room_id)
            .await
            .unwrap();

        let board = json!({"board": ["X", null, null, null, null, null, null, null, null]});
        manager
            .publish_move(&host, board.clone(), Seat::Guest)
            .await
            .unwrap();

        let after = manager
            .read_room(GameType::TicTacToe, &host.room_id)
            .await
            .unwrap();
        assert_eq!(after.game_state, Some(board));
        assert_eq!(after.current_turn, Seat::Guest);
        assert!(after.last_activity >= before.last_activity);
        // Untouched fields survive the narrow write.
        assert_eq!(after.status, before.status);
        assert_eq!(after.host, before.host);
        assert_eq!(after.guest, before.guest);
        assert_eq!(after.winner, None);
    }

    #[tokio::test]
    async fn turns_alternate_across_moves() {
        let manager = make_manager();
        let host = manager
            .create_room(GameType::TicTacToe, "player_1", "Alice")
            .await
            .unwrap();
        let guest = manager
            .join_room(GameType::TicTacToe, &host.room_id, "player_2", "Bob")
            .await
            .unwrap();

        let mut mover = host.clone();
        for turn in 0..6 {
            let room = manager
                .read_room(GameType::TicTacToe, &host.room_id)
                .await
                .unwrap();
            assert_eq!(room.current_turn, mover.seat, "turn {}", turn);

            manager
                .publish_move(&mover, json!({"turn": turn}), mover.seat.other())
                .await
                .unwrap();
            mover = if mover.seat == Seat::Host {
                guest.clone()
            } else {
                host.clone()
            };
        }
    }

    #[tokio::test]
    async fn finish_game_records_winner() {
        let manager = make_manager();
        let host = manager
            .create_room(GameType::TicTacToe, "player_1", "Alice")
            .await
            .unwrap();
        manager
            .join_room(GameType::TicTacToe, &host.room_id, "player_2", "Bob")
            .await
            .unwrap();

        manager
            .finish_game(&host, Outcome::from_seat(Seat::Host))
            .await
            .unwrap();

        let room = manager
            .read_room(GameType::TicTacToe, &host.room_id)
            .await
            .unwrap();
        assert_eq!(room.status, RoomStatus::Finished);
        assert_eq!(room.winner, Some(Outcome::Host));
    }

    #[tokio::test]
    async fn host_departure_deletes_the_room() {
        let manager = make_manager();
        let host = manager
            .create_room(GameType::TicTacToe, "player_1", "Alice")
            .await
            .unwrap();

        manager.leave_room(&host).await.unwrap();

        let result = manager.read_room(GameType::TicTacToe, &host.room_id).await;
        assert_eq!(result.unwrap_err(), RoomError::RoomNotFound);
    }

    #[tokio::test]
    async fn guest_departure_returns_room_to_waiting() {
        let manager = make_manager();
        let host = manager
            .create_room(GameType::TicTacToe, "player_1", "Alice")
            .await
            .unwrap();
        let guest = manager
            .join_room(GameType::TicTacToe, &host.room_id, "player_2", "Bob")
            .await
            .unwrap();

        manager.leave_room(&guest).await.unwrap();

        let room = manager
            .read_room(GameType::TicTacToe, &host.room_id)
            .await
            .unwrap();
        assert_eq!(room.status, RoomStatus::Waiting);
        assert!(room.guest.is_none());
        assert!(room.host.is_some());
    }

    #[tokio::test]
    async fn vacated_room_accepts_a_new_guest() {
        let manager = make_manager();
        let host = manager
            .create_room(GameType::TicTacToe, "player_1", "Alice")
            .await
            .unwrap();
        let guest = manager
            .join_room(GameType::TicTacToe, &host.room_id, "player_2", "Bob")
            .await
            .unwrap();
        manager.leave_room(&guest).await.unwrap();

        let replacement = manager
            .join_room(GameType::TicTacToe, &host.room_id, "player_3", "Carol")
            .await
            .unwrap();
        assert_eq!(replacement.seat, Seat::Guest);

        let room = manager
            .read_room(GameType::TicTacToe, &host.room_id)
            .await
            .unwrap();
        assert_eq!(room.guest.as_ref().unwrap().name, "Carol");
        assert_eq!(room.status, RoomStatus::Playing);
    }

    #[tokio::test]
    async fn host_leaving_ends_guest_watch() {
        let manager = make_manager();
        let host = manager
            .create_room(GameType::TicTacToe, "player_1", "Alice")
            .await
            .unwrap();
        let mut watch = manager.subscribe(GameType::TicTacToe, &host.room_id).await;
        watch.recv().await.unwrap();

        manager.leave_room(&host).await.unwrap();
        assert!(watch.recv().await.is_none());
    }
}
