//! Typed schemas for the opaque `gameState` blob each game type exchanges.
//!
//! The turn-exchange path treats the payload as pass-through JSON; these
//! types pin the wire shape per game so independently written clients
//! interoperate. Each carries just enough rule logic for the mover to decide
//! the terminal transition locally (there is no adjudication anywhere else).

use serde::{Serialize, Deserialize};
use serde_json::Value;

use crate::room::{GameType, Seat};

/// A mark on the tic-tac-toe board.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Mark {
    X,
    O,
}

/// Tic-tac-toe: nine cells, row-major.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TicTacToeState {
    pub board: [Option<Mark>; 9],
}

const TICTACTOE_LINES: [[usize; 3]; 8] = [
    [0, 1, 2],
    [3, 4, 5],
    [6, 7, 8],
    [0, 3, 6],
    [1, 4, 7],
    [2, 5, 8],
    [0, 4, 8],
    [2, 4, 6],
];

impl TicTacToeState {
    pub fn new() -> Self {
        TicTacToeState { board: [None; 9] }
    }

    pub fn winner(&self) -> Option<Mark> {
        for [a, b, c] in TICTACTOE_LINES {
            if let Some(mark) = self.board[a] {
                if self.board[b] == Some(mark) && self.board[c] == Some(mark) {
                    return Some(mark);
                }
            }
        }
        None
    }

    pub fn is_draw(&self) -> bool {
        self.winner().is_none() && self.board.iter().all(|cell| cell.is_some())
    }
}

impl Default for TicTacToeState {
    fn default() -> Self {
        Self::new()
    }
}

/// A connect-four disc.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Disc {
    Red,
    Yellow,
}

pub const CONNECT_FOUR_ROWS: usize = 6;
pub const CONNECT_FOUR_COLS: usize = 7;

/// Connect four: rows top to bottom, discs fall to the highest empty row of
/// a column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectFourState {
    pub board: Vec<Vec<Option<Disc>>>,
}

impl ConnectFourState {
    pub fn new() -> Self {
        ConnectFourState {
            board: vec![vec![None; CONNECT_FOUR_COLS]; CONNECT_FOUR_ROWS],
        }
    }

    /// Drop a disc into a column. Returns the row it lands in, or `None` if
    /// the column is full or out of range.
    pub fn drop_disc(&mut self, col: usize, disc: Disc) -> Option<usize> {
        if col >= CONNECT_FOUR_COLS {
            return None;
        }
        for row in (0..CONNECT_FOUR_ROWS).rev() {
            if self.board[row][col].is_none() {
                self.board[row][col] = Some(disc);
                return Some(row);
            }
        }
        None
    }

    pub fn winner(&self) -> Option<Disc> {
        let dirs: [(isize, isize); 4] = [(0, 1), (1, 0), (1, 1), (1, -1)];
        for row in 0..CONNECT_FOUR_ROWS {
            for col in 0..CONNECT_FOUR_COLS {
                let Some(disc) = self.board[row][col] else {
                    continue;
                };
                for (dr, dc) in dirs {
                    let mut run = 1;
                    let (mut r, mut c) = (row as isize + dr, col as isize + dc);
                    while r >= 0
                        && (r as usize) < CONNECT_FOUR_ROWS
                        && c >= 0
                        && (c as usize) < CONNECT_FOUR_COLS
                        && self.board[r as usize][c as usize] == Some(disc)
                    {
                        run += 1;
                        r += dr;
                        c += dc;
                    }
                    if run >= 4 {
                        return Some(disc);
                    }
                }
            }
        }
        None
    }

    pub fn is_full(&self) -> bool {
        self.board
            .iter()
            .all(|row| row.iter().all(|cell| cell.is_some()))
    }
}

impl Default for ConnectFourState {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PieceColor {
    Red,
    Black,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckersPiece {
    pub color: PieceColor,
    pub king: bool,
}

pub const CHECKERS_SIZE: usize = 8;

/// Checkers: 8x8 board plus live piece counts, counts maintained by the
/// mover so the opponent can detect the win without rescanning the board.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckersState {
    pub board: Vec<Vec<Option<CheckersPiece>>>,
    pub red_pieces: u32,
    pub black_pieces: u32,
}

impl CheckersState {
    /// Standard opening layout: black on the top three rows, red on the
    /// bottom three, dark squares only.
    pub fn new() -> Self {
        let mut board = vec![vec![None; CHECKERS_SIZE]; CHECKERS_SIZE];
        for (row, board_row) in board.iter_mut().enumerate() {
            for (col, cell) in board_row.iter_mut().enumerate() {
                if (row + col) % 2 == 1 {
                    if row < 3 {
                        *cell = Some(CheckersPiece {
                            color: PieceColor::Black,
                            king: false,
                        });
                    } else if row >= CHECKERS_SIZE - 3 {
                        *cell = Some(CheckersPiece {
                            color: PieceColor::Red,
                            king: false,
                        });
                    }
                }
            }
        }
        CheckersState {
            board,
            red_pieces: 12,
            black_pieces: 12,
        }
    }

    pub fn winner(&self) -> Option<PieceColor> {
        if self.red_pieces == 0 {
            Some(PieceColor::Black)
        } else if self.black_pieces == 0 {
            Some(PieceColor::Red)
        } else {
            None
        }
    }
}

impl Default for CheckersState {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Choice {
    Rock,
    Paper,
    Scissors,
}

impl Choice {
    pub fn beats(self, other: Choice) -> bool {
        matches!(
            (self, other),
            (Choice::Rock, Choice::Scissors)
                | (Choice::Paper, Choice::Rock)
                | (Choice::Scissors, Choice::Paper)
        )
    }
}

/// Rock-paper-scissors: per-seat choice and score fields, so each mover
/// writes only its own half of the round and the last-write-wins merge
/// cannot eat the opponent's pick.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RockPaperScissorsState {
    pub host_choice: Option<Choice>,
    pub guest_choice: Option<Choice>,
    pub host_score: u32,
    pub guest_score: u32,
    pub round: u32,
}

impl RockPaperScissorsState {
    pub fn new() -> Self {
        RockPaperScissorsState {
            host_choice: None,
            guest_choice: None,
            host_score: 0,
            guest_score: 0,
            round: 1,
        }
    }

    /// Winner of the current round once both choices are in; `None` while a
    /// choice is missing or on a tie.
    pub fn round_winner(&self) -> Option<Seat> {
        let (host, guest) = (self.host_choice?, self.guest_choice?);
        if host.beats(guest) {
            Some(Seat::Host)
        } else if guest.beats(host) {
            Some(Seat::Guest)
        } else {
            None
        }
    }
}

impl Default for RockPaperScissorsState {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShotOutcome {
    Hit,
    Miss,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BattlePhase {
    Placement,
    Playing,
    Ended,
}

pub const BATTLESHIP_SIZE: usize = 10;

/// Total cells across the standard fleet (5+4+3+3+2); sinking all of them
/// ends the game.
pub const BATTLESHIP_FLEET_CELLS: u32 = 17;

/// Battleship: each seat owns its attack grid and hit counter, so a mover
/// publishes only its own shots; ship placement never leaves the owning
/// client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BattleshipState {
    pub host_shots: Vec<Vec<Option<ShotOutcome>>>,
    pub guest_shots: Vec<Vec<Option<ShotOutcome>>>,
    pub host_hits: u32,
    pub guest_hits: u32,
    pub phase: BattlePhase,
}

impl BattleshipState {
    pub fn new() -> Self {
        BattleshipState {
            host_shots: vec![vec![None; BATTLESHIP_SIZE]; BATTLESHIP_SIZE],
            guest_shots: vec![vec![None; BATTLESHIP_SIZE]; BATTLESHIP_SIZE],
            host_hits: 0,
            guest_hits: 0,
            phase: BattlePhase::Placement,
        }
    }

    /// Whether a hit count accounts for the entire opposing fleet.
    pub fn fleet_sunk(hits: u32) -> bool {
        hits >= BATTLESHIP_FLEET_CELLS
    }

    pub fn winner(&self) -> Option<Seat> {
        if Self::fleet_sunk(self.host_hits) {
            Some(Seat::Host)
        } else if Self::fleet_sunk(self.guest_hits) {
            Some(Seat::Guest)
        } else {
            None
        }
    }
}

impl Default for BattleshipState {
    fn default() -> Self {
        Self::new()
    }
}

/// Word chain: each word must start with the last letter of the previous
/// one, no repeats.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WordChainState {
    pub words: Vec<String>,
    pub host_score: u32,
    pub guest_score: u32,
}

impl WordChainState {
    pub fn new() -> Self {
        WordChainState {
            words: Vec::new(),
            host_score: 0,
            guest_score: 0,
        }
    }

    /// Whether `word` legally extends the chain.
    pub fn accepts(&self, word: &str) -> bool {
        let word = word.trim().to_lowercase();
        if word.len() < 2 {
            return false;
        }
        if self.words.iter().any(|w| w.to_lowercase() == word) {
            return false;
        }
        match self.words.last() {
            Some(last) => {
                let required = last.to_lowercase().chars().last();
                required == word.chars().next()
            }
            None => true,
        }
    }
}

impl Default for WordChainState {
    fn default() -> Self {
        Self::new()
    }
}

/// A decoded payload, one variant per game type.
#[derive(Debug, Clone, PartialEq)]
pub enum GamePayload {
    TicTacToe(TicTacToeState),
    ConnectFour(ConnectFourState),
    Checkers(CheckersState),
    RockPaperScissors(RockPaperScissorsState),
    Battleship(BattleshipState),
    WordChain(WordChainState),
}

impl GamePayload {
    pub fn game_type(&self) -> GameType {
        match self {
            GamePayload::TicTacToe(_) => GameType::TicTacToe,
            GamePayload::ConnectFour(_) => GameType::ConnectFour,
            GamePayload::Checkers(_) => GameType::Checkers,
            GamePayload::RockPaperScissors(_) => GameType::RockPaperScissors,
            GamePayload::Battleship(_) => GameType::Battleship,
            GamePayload::WordChain(_) => GameType::WordChain,
        }
    }

    /// Interpret an opaque `gameState` value against a game type's schema.
    pub fn decode(game_type: GameType, value: &Value) -> Result<GamePayload, serde_json::Error> {
        let payload = match game_type {
            GameType::TicTacToe => GamePayload::TicTacToe(serde_json::from_value(value.clone())?),
            GameType::ConnectFour => {
                GamePayload::ConnectFour(serde_json::from_value(value.clone())?)
            }
            GameType::Checkers => GamePayload::Checkers(serde_json::from_value(value.clone())?),
            GameType::RockPaperScissors => {
                GamePayload::RockPaperScissors(serde_json::from_value(value.clone())?)
            }
            GameType::Battleship => GamePayload::Battleship(serde_json::from_value(value.clone())?),
            GameType::WordChain => GamePayload::WordChain(serde_json::from_value(value.clone())?),
        };
        Ok(payload)
    }

    pub fn encode(&self) -> Result<Value, serde_json::Error> {
        match self {
            GamePayload::TicTacToe(state) => serde_json::to_value(state),
            GamePayload::ConnectFour(state) => serde_json::to_value(state),
            GamePayload::Checkers(state) => serde_json::to_value(state),
            GamePayload::RockPaperScissors(state) => serde_json::to_value(state),
            GamePayload::Battleship(state) => serde_json::to_value(state),
            GamePayload::WordChain(state) => serde_json::to_value(state),
        }
    }
}
