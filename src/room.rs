use std::fmt;
use std::str::FromStr;
use std::time::{SystemTime, UNIX_EPOCH};
use serde::{Serialize, Deserialize};
use serde_json::Value;

/// The multiplayer game types the arcade hosts. Each selects which payload
/// schema rides in [`Room::game_state`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GameType {
    TicTacToe,
    ConnectFour,
    Checkers,
    RockPaperScissors,
    Battleship,
    WordChain,
}

impl GameType {
    pub const ALL: [GameType; 6] = [
        GameType::TicTacToe,
        GameType::ConnectFour,
        GameType::Checkers,
        GameType::RockPaperScissors,
        GameType::Battleship,
        GameType::WordChain,
    ];

    /// The namespace segment under `rooms/` for this game type.
    pub fn as_str(self) -> &'static str {
        match self {
            GameType::TicTacToe => "tictactoe",
            GameType::ConnectFour => "connectfour",
            GameType::Checkers => "checkers",
            GameType::RockPaperScissors => "rockpaperscissors",
            GameType::Battleship => "battleship",
            GameType::WordChain => "wordchain",
        }
    }
}

impl fmt::Display for GameType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for GameType {
    type Err = ();
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "tictactoe" => Ok(GameType::TicTacToe),
            "connectfour" => Ok(GameType::ConnectFour),
            "checkers" => Ok(GameType::Checkers),
            "rockpaperscissors" => Ok(GameType::RockPaperScissors),
            "battleship" => Ok(GameType::Battleship),
            "wordchain" => Ok(GameType::WordChain),
            _ => Err(()),
        }
    }
}

/// A seat in a two-player room. There is no spectator or third seat.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Seat {
    Host,
    Guest,
}

impl Seat {
    /// The opposing seat; turn alternation is strictly two-valued.
    pub fn other(self) -> Seat {
        match self {
            Seat::Host => Seat::Guest,
            Seat::Guest => Seat::Host,
        }
    }
}

impl fmt::Display for Seat {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Seat::Host => write!(f, "host"),
            Seat::Guest => write!(f, "guest"),
        }
    }
}

impl FromStr for Seat {
    type Err = ();
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "host" => Ok(Seat::Host),
            "guest" => Ok(Seat::Guest),
            _ => Err(()),
        }
    }
}

/// Room status. Transitions are monotonic forward, with one backward edge:
/// a guest leaving a room returns it to `Waiting`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RoomStatus {
    Waiting,
    Playing,
    Finished,
}

/// Terminal outcome of a finished game, as published by the mover.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Outcome {
    Host,
    Guest,
    Draw,
}

impl Outcome {
    pub fn from_seat(seat: Seat) -> Outcome {
        match seat {
            Seat::Host => Outcome::Host,
            Seat::Guest => Outcome::Guest,
        }
    }
}

/// One occupant of a seat. The id is the locally generated player id; it is
/// not authenticated and not guaranteed unique across devices.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Participant {
    pub id: String,
    pub name: String,
    pub ready: bool,
}

impl Participant {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Participant {
        Participant {
            id: id.into(),
            name: name.into(),
            ready: true,
        }
    }
}

/// The shared room record, stored at `rooms/{gameType}/{roomId}`. Both
/// participants write it; there is no locking or single-writer enforcement.
/// Field names serialize camelCase to match the wire records.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Room {
    pub room_id: String,
    pub game_type: GameType,
    pub host: Option<Participant>,
    pub guest: Option<Participant>,
    pub status: RoomStatus,
    pub game_state: Option<Value>,
    pub current_turn: Seat,
    pub created_at: u64,
    pub last_activity: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub winner: Option<Outcome>,
}

impl Room {
    /// A freshly created room: host seated, guest empty, host to move.
    pub fn new(game_type: GameType, room_id: impl Into<String>, host: Participant) -> Room {
        let now = epoch_ms_now();
        Room {
            room_id: room_id.into(),
            game_type,
            host: Some(host),
            guest: None,
            status: RoomStatus::Waiting,
            game_state: None,
            current_turn: Seat::Host,
            created_at: now,
            last_activity: now,
            winner: None,
        }
    }

    /// The timestamp that drives expiry: `last_activity`, falling back to
    /// `created_at` for records that were never touched after creation.
    pub fn last_active(&self) -> u64 {
        if self.last_activity > 0 {
            self.last_activity
        } else {
            self.created_at
        }
    }

    pub fn is_joinable(&self) -> bool {
        self.status == RoomStatus::Waiting && self.guest.is_none()
    }

    /// Shallow-merge a patch into this record, field by field. This is the
    /// whole conflict policy: the most recent write to a field wins.
    pub fn apply(&mut self, patch: &RoomPatch) {
        if let Some(guest) = &patch.guest {
            self.guest = guest.clone();
        }
        if let Some(status) = patch.status {
            self.status = status;
        }
        if let Some(game_state) = &patch.game_state {
            self.game_state = Some(game_state.clone());
        }
        if let Some(current_turn) = patch.current_turn {
            self.current_turn = current_turn;
        }
        if let Some(last_activity) = patch.last_activity {
            self.last_activity = last_activity;
        }
        if let Some(winner) = patch.winner {
            self.winner = Some(winner);
        }
    }
}

/// The named last-write-wins policy: every mutation after creation is a
/// shallow merge of exactly the fields set here, never the whole record.
/// Narrow write sets keep concurrent writers from trampling each other's
/// unrelated fields.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RoomPatch {
    /// `Some(None)` vacates the seat; `None` leaves it untouched.
    pub guest: Option<Option<Participant>>,
    pub status: Option<RoomStatus>,
    pub game_state: Option<Value>,
    pub current_turn: Option<Seat>,
    pub last_activity: Option<u64>,
    pub winner: Option<Outcome>,
}

impl RoomPatch {
    /// Names of the fields this patch writes, in record order. Tests assert
    /// the exact field set each operation produces.
    pub fn fields(&self) -> Vec<&'static str> {
        let mut out = Vec::new();
        if self.guest.is_some() {
            out.push("guest");
        }
        if self.status.is_some() {
            out.push("status");
        }
        if self.game_state.is_some() {
            out.push("gameState");
        }
        if self.current_turn.is_some() {
            out.push("currentTurn");
        }
        if self.last_activity.is_some() {
            out.push("lastActivity");
        }
        if self.winner.is_some() {
            out.push("winner");
        }
        out
    }
}

pub(crate) fn epoch_ms_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}
