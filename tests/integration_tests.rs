//! End-to-end room scenarios: two independent clients sharing one store,
//! each holding its own manager handle and watch, the way two browser tabs
//! share the hosted backend.

use parlor::{
    GamePayload, GameType, Mark, MemoryRoomStore, Outcome, Room, RoomDirectory, RoomError,
    RoomManager, RoomPatch, RoomStatus, RoomStore, Seat, TicTacToeState,
};
use serde_json::json;

fn epoch_ms_now() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap()
        .as_millis() as u64
}

/// Drain a watch and return the newest snapshot it delivered.
fn latest(watch: &mut parlor::RoomWatch) -> Option<Room> {
    let mut newest = None;
    while let Some(room) = watch.try_recv() {
        newest = Some(room);
    }
    newest
}

#[tokio::test]
async fn full_tictactoe_round_trip() {
    let store = MemoryRoomStore::new();

    // Client A and client B each hold their own handles.
    let client_a = RoomManager::new(store.clone());
    let client_b = RoomManager::new(store.clone());

    // A creates a room and starts watching it.
    let host = client_a
        .create_room(GameType::TicTacToe, "player_aaaa1111", "Alice")
        .await
        .unwrap();
    let mut a_watch = client_a.subscribe(GameType::TicTacToe, &host.room_id).await;
    assert_eq!(a_watch.recv().await.unwrap().status, RoomStatus::Waiting);

    // B joins with the shared code.
    let guest = client_b
        .join_room(GameType::TicTacToe, &host.room_id, "player_bbbb2222", "Bob")
        .await
        .unwrap();
    let mut b_watch = client_b.subscribe(GameType::TicTacToe, &host.room_id).await;

    // Both watchers observe the playing transition.
    let seen_by_a = a_watch.recv().await.unwrap();
    assert_eq!(seen_by_a.status, RoomStatus::Playing);
    assert_eq!(seen_by_a.guest.as_ref().unwrap().name, "Bob");
    let seen_by_b = b_watch.recv().await.unwrap();
    assert_eq!(seen_by_b.status, RoomStatus::Playing);

    // A plays the center cell and hands the turn to B.
    let mut board = TicTacToeState::new();
    board.board[4] = Some(Mark::X);
    let payload = GamePayload::TicTacToe(board).encode().unwrap();
    client_a
        .publish_move(&host, payload.clone(), Seat::Guest)
        .await
        .unwrap();

    // B sees exactly the new mark and the turn flag; everything else is
    // unchanged from the join snapshot.
    let after_move = b_watch.recv().await.unwrap();
    assert_eq!(after_move.game_state, Some(payload));
    assert_eq!(after_move.current_turn, Seat::Guest);
    assert_eq!(after_move.status, seen_by_b.status);
    assert_eq!(after_move.host, seen_by_b.host);
    assert_eq!(after_move.guest, seen_by_b.guest);
    assert_eq!(after_move.winner, None);
    assert!(after_move.last_activity >= seen_by_b.last_activity);

    // B's client decodes the payload with the tictactoe schema.
    let decoded =
        GamePayload::decode(GameType::TicTacToe, after_move.game_state.as_ref().unwrap()).unwrap();
    match decoded {
        GamePayload::TicTacToe(state) => assert_eq!(state.board[4], Some(Mark::X)),
        other => panic!("wrong payload schema: {:?}", other),
    }

    // Guest finishes the game as a draw; both clients observe it.
    client_b.finish_game(&guest, Outcome::Draw).await.unwrap();
    let finished = latest(&mut a_watch).unwrap();
    assert_eq!(finished.status, RoomStatus::Finished);
    assert_eq!(finished.winner, Some(Outcome::Draw));
}

#[tokio::test]
async fn turn_flag_alternates_for_both_watchers() {
    let store = MemoryRoomStore::new();
    let client_a = RoomManager::new(store.clone());
    let client_b = RoomManager::new(store.clone());

    let host = client_a
        .create_room(GameType::WordChain, "player_aaaa1111", "Alice")
        .await
        .unwrap();
    let guest = client_b
        .join_room(GameType::WordChain, &host.room_id, "player_bbbb2222", "Bob")
        .await
        .unwrap();

    let mut watch = client_a.subscribe(GameType::WordChain, &host.room_id).await;
    latest(&mut watch);

    let words = ["apple", "elephant", "tiger", "rabbit"];
    let mut mover = &host;
    for (i, word) in words.iter().enumerate() {
        let payload = json!({"words": &words[..=i], "hostScore": 0, "guestScore": 0});
        let next = mover.seat.other();
        if mover.seat == Seat::Host {
            client_a.publish_move(mover, payload, next).await.unwrap();
        } else {
            client_b.publish_move(mover, payload, next).await.unwrap();
        }

        let seen = watch.recv().await.unwrap();
        assert_eq!(seen.current_turn, next, "after word {:?}", word);
        mover = if mover.seat == Seat::Host { &guest } else { &host };
    }
}

#[tokio::test]
async fn stale_room_disappears_after_one_listing() {
    let store = MemoryRoomStore::new();
    let manager = RoomManager::new(store.clone());
    // 5-minute production timeout, driven directly by backdating the record.
    let directory = RoomDirectory::new(store.clone());

    let host = manager
        .create_room(GameType::TicTacToe, "player_aaaa1111", "Alice")
        .await
        .unwrap();

    // Six idle minutes pass without a guest.
    let six_minutes_ago = epoch_ms_now() - 6 * 60 * 1000;
    let patch = RoomPatch {
        last_activity: Some(six_minutes_ago),
        ..Default::default()
    };
    store
        .update(GameType::TicTacToe, &host.room_id, &patch)
        .await
        .unwrap();

    // Any client's listing no longer shows the room, and the scan removed
    // the record itself.
    let listed = directory.list_joinable(GameType::TicTacToe).await.unwrap();
    assert!(listed.iter().all(|room| room.room_id != host.room_id));

    let read = store.read(GameType::TicTacToe, &host.room_id).await.unwrap();
    assert!(read.is_none());

    // A second listing over the cleaned namespace deletes nothing more.
    let relisted = directory.list_joinable(GameType::TicTacToe).await.unwrap();
    assert!(relisted.is_empty());
}

#[tokio::test]
async fn host_departure_deletes_and_guest_departure_vacates() {
    let store = MemoryRoomStore::new();
    let client_a = RoomManager::new(store.clone());
    let client_b = RoomManager::new(store.clone());

    let host = client_a
        .create_room(GameType::Checkers, "player_aaaa1111", "Alice")
        .await
        .unwrap();
    let guest = client_b
        .join_room(GameType::Checkers, &host.room_id, "player_bbbb2222", "Bob")
        .await
        .unwrap();

    // Guest departure: record survives, seat empties, back to waiting.
    client_b.leave_room(&guest).await.unwrap();
    let room = store
        .read(GameType::Checkers, &host.room_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(room.status, RoomStatus::Waiting);
    assert!(room.guest.is_none());

    // Host departure: record fully absent.
    client_a.leave_room(&host).await.unwrap();
    let room = store.read(GameType::Checkers, &host.room_id).await.unwrap();
    assert!(room.is_none());

    // Joining the deleted code now fails cleanly.
    let result = client_b
        .join_room(GameType::Checkers, &host.room_id, "player_cccc3333", "Carol")
        .await;
    assert_eq!(result.unwrap_err(), RoomError::RoomNotFound);
}

#[tokio::test]
async fn simultaneous_joiners_both_land_on_playing() {
    let store = MemoryRoomStore::new();
    let manager = RoomManager::new(store.clone());

    let host = manager
        .create_room(GameType::TicTacToe, "player_aaaa1111", "Alice")
        .await
        .unwrap();

    // Two joiners race. With the read-then-write window there is no
    // serialization between them; at least one wins, and whatever happens
    // the record ends populated and playing.
    let store_b = store.clone();
    let store_c = store.clone();
    let room_id_b = host.room_id.clone();
    let room_id_c = host.room_id.clone();
    let join_b = tokio::spawn(async move {
        RoomManager::new(store_b)
            .join_room(GameType::TicTacToe, &room_id_b, "player_bbbb2222", "Bob")
            .await
    });
    let join_c = tokio::spawn(async move {
        RoomManager::new(store_c)
            .join_room(GameType::TicTacToe, &room_id_c, "player_cccc3333", "Carol")
            .await
    });
    let results = [join_b.await.unwrap(), join_c.await.unwrap()];
    assert!(results.iter().any(|r| r.is_ok()));

    let room = store
        .read(GameType::TicTacToe, &host.room_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(room.status, RoomStatus::Playing);
    assert!(room.guest.is_some());
}

#[tokio::test]
async fn codes_are_unique_per_namespace_at_any_moment() {
    let store = MemoryRoomStore::new();
    let manager = RoomManager::new(store.clone());

    let mut codes = std::collections::HashSet::new();
    for i in 0..50 {
        let session = manager
            .create_room(GameType::TicTacToe, &format!("player_{:08}", i), "Host")
            .await
            .unwrap();
        assert!(codes.insert(session.room_id.clone()), "duplicate live code");
    }
    assert_eq!(store.list(GameType::TicTacToe).await.unwrap().len(), 50);
}
