//! HTTP facade over the room manager: REST for the lifecycle operations, an
//! SSE stream for the subscribe path, and the admin view behind the auth
//! collaborator.

use std::collections::HashMap;
use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    response::sse::{Event, KeepAlive, Sse},
    response::Json,
    routing::{delete, get, post},
    Router,
};
use futures_util::Stream;
use serde::{Serialize, Deserialize};
use serde_json::Value;
use tower_http::cors::CorsLayer;
use uuid::Uuid;

use crate::admin::AdminConsole;
use crate::auth::{AuthProvider, StaticAuth};
use crate::directory::{RoomDirectory, RoomSummary};
use crate::error::RoomError;
use crate::identity;
use crate::manager::{RoomManager, RoomSession};
use crate::room::{GameType, Outcome, Room, Seat};
use crate::store::RoomStore;
use crate::validation::validate_player_name;

pub struct AppState<S> {
    manager: RoomManager<S>,
    directory: RoomDirectory<S>,
    console: Arc<AdminConsole<S, StaticAuth>>,
    admin_token: Arc<Mutex<Option<String>>>,
}

impl<S: Clone> Clone for AppState<S> {
    fn clone(&self) -> Self {
        AppState {
            manager: self.manager.clone(),
            directory: self.directory.clone(),
            console: self.console.clone(),
            admin_token: self.admin_token.clone(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateRoomRequest {
    pub player_name: String,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JoinRoomRequest {
    pub player_name: String,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionResponse {
    pub game_type: GameType,
    pub room_id: String,
    pub seat: Seat,
    pub player_id: String,
}

impl From<RoomSession> for SessionResponse {
    fn from(session: RoomSession) -> Self {
        SessionResponse {
            game_type: session.game_type,
            room_id: session.room_id,
            seat: session.seat,
            player_id: session.player_id,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MoveRequest {
    pub seat: Seat,
    pub player_id: String,
    pub game_state: Value,
    pub next_turn: Seat,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FinishRequest {
    pub seat: Seat,
    pub player_id: String,
    pub winner: Outcome,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeaveRequest {
    pub seat: Seat,
    pub player_id: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LoginResponse {
    pub token: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

type ApiError = (StatusCode, Json<ErrorResponse>);

fn error_response(status: StatusCode, message: impl Into<String>) -> ApiError {
    (
        status,
        Json(ErrorResponse {
            error: message.into(),
        }),
    )
}

fn room_error(err: RoomError) -> ApiError {
    let status = match err {
        RoomError::RoomNotFound => StatusCode::NOT_FOUND,
        RoomError::RoomFull | RoomError::GameInProgress => StatusCode::CONFLICT,
        RoomError::Unauthorized => StatusCode::UNAUTHORIZED,
        RoomError::StoreUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        RoomError::RoomCodeExhausted => StatusCode::INTERNAL_SERVER_ERROR,
    };
    error_response(status, err.to_string())
}

fn parse_game_type(raw: &str) -> Result<GameType, ApiError> {
    raw.parse().map_err(|_| {
        error_response(
            StatusCode::NOT_FOUND,
            format!("Unknown game type: {}", raw),
        )
    })
}

fn checked_name(raw: &str) -> Result<String, ApiError> {
    validate_player_name(raw).map_err(|msg| error_response(StatusCode::BAD_REQUEST, msg))
}

/// Build the application router over any store backend.
pub fn router<S>(store: S, auth: StaticAuth) -> Router
where
    S: RoomStore + Clone + 'static,
{
    let state = AppState {
        manager: RoomManager::new(store.clone()),
        directory: RoomDirectory::new(store.clone()),
        console: Arc::new(AdminConsole::new(store, auth)),
        admin_token: Arc::new(Mutex::new(None)),
    };

    Router::new()
        .route("/", get(root))
        .route(
            "/rooms/{game_type}",
            post(create_room::<S>).get(list_rooms::<S>),
        )
        .route("/rooms/{game_type}/{room_id}", get(get_room::<S>))
        .route("/rooms/{game_type}/{room_id}/join", post(join_room::<S>))
        .route("/rooms/{game_type}/{room_id}/move", post(publish_move::<S>))
        .route("/rooms/{game_type}/{room_id}/finish", post(finish_game::<S>))
        .route("/rooms/{game_type}/{room_id}/leave", post(leave_room::<S>))
        .route("/rooms/{game_type}/{room_id}/events", get(room_events::<S>))
        .route("/admin/login", post(admin_login::<S>))
        .route("/admin/rooms", get(admin_list_rooms::<S>))
        .route(
            "/admin/rooms/{game_type}/{room_id}",
            delete(admin_delete_room::<S>),
        )
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Serve the router until the process exits.
pub async fn serve<S>(store: S, auth: StaticAuth, addr: SocketAddr) -> std::io::Result<()>
where
    S: RoomStore + Clone + 'static,
{
    let app = router(store, auth);
    println!("Parlor room server listening on {}", addr);
    println!("\nAvailable endpoints:");
    println!("  POST   /rooms/{{game_type}}                        - Create a room");
    println!("  GET    /rooms/{{game_type}}                        - List joinable rooms");
    println!("  GET    /rooms/{{game_type}}/{{room_id}}            - Read a room");
    println!("  POST   /rooms/{{game_type}}/{{room_id}}/join       - Join a room");
    println!("  POST   /rooms/{{game_type}}/{{room_id}}/move       - Publish a move");
    println!("  POST   /rooms/{{game_type}}/{{room_id}}/finish     - Publish the outcome");
    println!("  POST   /rooms/{{game_type}}/{{room_id}}/leave      - Leave a room");
    println!("  GET    /rooms/{{game_type}}/{{room_id}}/events     - Room snapshots (SSE)");
    println!("  POST   /admin/login                                - Admin sign-in");
    println!("  GET    /admin/rooms                                - All rooms (admin)");
    println!("  DELETE /admin/rooms/{{game_type}}/{{room_id}}      - Delete a room (admin)");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await
}

async fn root() -> Json<Value> {
    Json(serde_json::json!({
        "name": "Parlor Room Server",
        "endpoints": {
            "create_room": "POST /rooms/{game_type}",
            "list_rooms": "GET /rooms/{game_type}",
            "get_room": "GET /rooms/{game_type}/{room_id}",
            "join_room": "POST /rooms/{game_type}/{room_id}/join",
            "publish_move": "POST /rooms/{game_type}/{room_id}/move",
            "finish_game": "POST /rooms/{game_type}/{room_id}/finish",
            "leave_room": "POST /rooms/{game_type}/{room_id}/leave",
            "room_events": "GET /rooms/{game_type}/{room_id}/events",
        }
    }))
}

async fn create_room<S: RoomStore + Clone + 'static>(
    State(state): State<AppState<S>>,
    Path(game_type): Path<String>,
    Json(request): Json<CreateRoomRequest>,
) -> Result<Json<SessionResponse>, ApiError> {
    let game_type = parse_game_type(&game_type)?;
    let name = checked_name(&request.player_name)?;
    let player_id = identity::new_player_id();

    let session = state
        .manager
        .create_room(game_type, &player_id, &name)
        .await
        .map_err(room_error)?;
    Ok(Json(session.into()))
}

async fn list_rooms<S: RoomStore + Clone + 'static>(
    State(state): State<AppState<S>>,
    Path(game_type): Path<String>,
) -> Result<Json<Vec<RoomSummary>>, ApiError> {
    let game_type = parse_game_type(&game_type)?;
    state
        .directory
        .list_joinable(game_type)
        .await
        .map(Json)
        .map_err(room_error)
}

async fn get_room<S: RoomStore + Clone + 'static>(
    State(state): State<AppState<S>>,
    Path((game_type, room_id)): Path<(String, String)>,
) -> Result<Json<Room>, ApiError> {
    let game_type = parse_game_type(&game_type)?;
    state
        .manager
        .read_room(game_type, &room_id)
        .await
        .map(Json)
        .map_err(room_error)
}

async fn join_room<S: RoomStore + Clone + 'static>(
    State(state): State<AppState<S>>,
    Path((game_type, room_id)): Path<(String, String)>,
    Json(request): Json<JoinRoomRequest>,
) -> Result<Json<SessionResponse>, ApiError> {
    let game_type = parse_game_type(&game_type)?;
    let name = checked_name(&request.player_name)?;
    let player_id = identity::new_player_id();

    let session = state
        .manager
        .join_room(game_type, &room_id, &player_id, &name)
        .await
        .map_err(room_error)?;
    Ok(Json(session.into()))
}

fn session_from(
    game_type: GameType,
    room_id: &str,
    seat: Seat,
    player_id: &str,
) -> RoomSession {
    RoomSession {
        game_type,
        room_id: room_id.to_string(),
        seat,
        player_id: player_id.to_string(),
    }
}

async fn publish_move<S: RoomStore + Clone + 'static>(
    State(state): State<AppState<S>>,
    Path((game_type, room_id)): Path<(String, String)>,
    Json(request): Json<MoveRequest>,
) -> Result<StatusCode, ApiError> {
    let game_type = parse_game_type(&game_type)?;
    let session = session_from(game_type, &room_id, request.seat, &request.player_id);
    state
        .manager
        .publish_move(&session, request.game_state, request.next_turn)
        .await
        .map(|_| StatusCode::NO_CONTENT)
        .map_err(room_error)
}

async fn finish_game<S: RoomStore + Clone + 'static>(
    State(state): State<AppState<S>>,
    Path((game_type, room_id)): Path<(String, String)>,
    Json(request): Json<FinishRequest>,
) -> Result<StatusCode, ApiError> {
    let game_type = parse_game_type(&game_type)?;
    let session = session_from(game_type, &room_id, request.seat, &request.player_id);
    state
        .manager
        .finish_game(&session, request.winner)
        .await
        .map(|_| StatusCode::NO_CONTENT)
        .map_err(room_error)
}

async fn leave_room<S: RoomStore + Clone + 'static>(
    State(state): State<AppState<S>>,
    Path((game_type, room_id)): Path<(String, String)>,
    Json(request): Json<LeaveRequest>,
) -> Result<StatusCode, ApiError> {
    let game_type = parse_game_type(&game_type)?;
    let session = session_from(game_type, &room_id, request.seat, &request.player_id);
    state
        .manager
        .leave_room(&session)
        .await
        .map(|_| StatusCode::NO_CONTENT)
        .map_err(room_error)
}

async fn room_events<S: RoomStore + Clone + 'static>(
    State(state): State<AppState<S>>,
    Path((game_type, room_id)): Path<(String, String)>,
) -> Result<Sse<impl Stream<Item = Result<Event, Infallible>>>, ApiError> {
    let game_type = parse_game_type(&game_type)?;
    let mut watch = state.manager.subscribe(game_type, &room_id).await;

    let stream = async_stream::stream! {
        while let Some(room) = watch.recv().await {
            if let Ok(event) = Event::default().json_data(&room) {
                yield Ok(event);
            }
        }
    };
    Ok(Sse::new(stream).keep_alive(KeepAlive::default()))
}

async fn admin_login<S: RoomStore + Clone + 'static>(
    State(state): State<AppState<S>>,
    Json(request): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, ApiError> {
    state
        .console
        .auth()
        .login(&request.email, &request.password)
        .await
        .map_err(|e| error_response(StatusCode::UNAUTHORIZED, e.to_string()))?;

    let token = Uuid::new_v4().to_string();
    *state.admin_token.lock().unwrap() = Some(token.clone());
    Ok(Json(LoginResponse { token }))
}

fn check_bearer<S>(state: &AppState<S>, headers: &HeaderMap) -> Result<(), ApiError> {
    let presented = headers
        .get("authorization")
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "));
    let issued = state.admin_token.lock().unwrap();
    match (presented, issued.as_deref()) {
        (Some(presented), Some(issued)) if presented == issued => Ok(()),
        _ => Err(error_response(
            StatusCode::UNAUTHORIZED,
            RoomError::Unauthorized.to_string(),
        )),
    }
}

async fn admin_list_rooms<S: RoomStore + Clone + 'static>(
    State(state): State<AppState<S>>,
    headers: HeaderMap,
) -> Result<Json<HashMap<GameType, HashMap<String, Room>>>, ApiError> {
    check_bearer(&state, &headers)?;
    state
        .console
        .list_all_rooms()
        .await
        .map(Json)
        .map_err(room_error)
}

async fn admin_delete_room<S: RoomStore + Clone + 'static>(
    State(state): State<AppState<S>>,
    Path((game_type, room_id)): Path<(String, String)>,
    headers: HeaderMap,
) -> Result<Json<Value>, ApiError> {
    check_bearer(&state, &headers)?;
    let game_type = parse_game_type(&game_type)?;
    state
        .console
        .delete_room(game_type, &room_id)
        .await
        .map(|deleted| Json(serde_json::json!({ "deleted": deleted })))
        .map_err(room_error)
}
