//! Room matchmaking and turn exchange for a casual multiplayer game arcade.
//!
//! Two clients rendezvous through a short room code, exchange a game-specific
//! state blob, and hand the turn back and forth, all over a path-addressable
//! document store ([`RoomStore`]) with no transactions and no server-side
//! adjudication. Concurrent writes race; each operation writes the narrowest
//! field set it can and the last write to a field wins.
//!
//! ## Example usage
//! ```
//! use parlor::{GameType, MemoryRoomStore, RoomManager, Seat};
//! use serde_json::json;
//!
//! let rt = tokio::runtime::Runtime::new().unwrap();
//! rt.block_on(async {
//!     let store = MemoryRoomStore::new();
//!     let manager = RoomManager::new(store.clone());
//!
//!     // Host creates a room and shares the 4-letter code.
//!     let host = manager
//!         .create_room(GameType::TicTacToe, "player_1a2b3c4d", "Alice")
//!         .await
//!         .unwrap();
//!
//!     // Guest joins with the code; the room starts playing.
//!     let mut watch = manager.subscribe(host.game_type, &host.room_id).await;
//!     let guest = manager
//!         .join_room(GameType::TicTacToe, &host.room_id, "player_5e6f7a8b", "Bob")
//!         .await
//!         .unwrap();
//!
//!     // Host publishes a move and hands the turn over.
//!     manager
//!         .publish_move(
//!             &host,
//!             json!({"board": ["X", null, null, null, null, null, null, null, null]}),
//!             Seat::Guest,
//!         )
//!         .await
//!         .unwrap();
//!
//!     // The guest's watch sees every change, newest state last.
//!     let mut latest = None;
//!     while let Some(room) = watch.try_recv() {
//!         latest = Some(room);
//!     }
//!     let room = latest.unwrap();
//!     assert_eq!(room.current_turn, Seat::Guest);
//!     assert_eq!(room.guest.unwrap().id, guest.player_id);
//! });
//! ```

mod error;
mod room;
mod room_code;
mod identity;
mod scores;
mod store;
mod manager;
mod directory;
mod auth;
mod admin;
mod payloads;

#[cfg(feature = "server")]
pub mod validation;
#[cfg(feature = "server")]
mod sqlite_store;
#[cfg(feature = "server")]
pub mod server;

pub use error::RoomError;
pub use room::{
    GameType, Outcome, Participant, Room, RoomPatch, RoomStatus, Seat,
};
pub use room_code::{generate_code, is_valid_code, normalize, CODE_ALPHABET, CODE_LEN};
pub use identity::{
    get_or_create_player_id, new_player_id, JsonFileStore, LocalStore, MemoryLocalStore,
    PLAYER_ID_KEY,
};
pub use scores::{
    ScoreCache, BEST_2048_KEY, MEMORY_MATCH_BEST_KEY, SNAKE_HIGH_SCORE_KEY, TYPING_BEST_WPM_KEY,
};
pub use store::{MemoryRoomStore, RoomStore, RoomWatch, StoreError};
pub use manager::{RoomManager, RoomSession, MAX_CODE_ATTEMPTS};
pub use directory::{RoomDirectory, RoomSummary, ROOM_IDLE_TIMEOUT_MS};
pub use auth::{AuthError, AuthProvider, AuthUser, StaticAuth};
pub use admin::AdminConsole;
pub use payloads::{
    BattlePhase, BattleshipState, CheckersPiece, CheckersState, Choice, ConnectFourState, Disc,
    GamePayload, Mark, PieceColor, RockPaperScissorsState, ShotOutcome, TicTacToeState,
    WordChainState,
};

#[cfg(feature = "server")]
pub use sqlite_store::SqliteRoomStore;
