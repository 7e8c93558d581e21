use std::error::Error;
use std::fmt;
use serde::{Serialize, Deserialize};

use crate::store::StoreError;

/// Errors from room operations. Every variant is user-facing: callers show
/// the message inline and return to the previous menu or form. Nothing here
/// is retried automatically.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum RoomError {
    RoomNotFound,
    RoomFull,
    GameInProgress,
    RoomCodeExhausted,
    StoreUnavailable(String),
    Unauthorized,
}

impl fmt::Display for RoomError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            RoomError::RoomNotFound => write!(f, "Room not found"),
            RoomError::RoomFull => write!(f, "Room is full"),
            RoomError::GameInProgress => write!(f, "Game already in progress"),
            RoomError::RoomCodeExhausted => write!(f, "Could not find a free room code"),
            RoomError::StoreUnavailable(msg) => write!(f, "Store unavailable: {}", msg),
            RoomError::Unauthorized => write!(f, "Admin access required"),
        }
    }
}

impl Error for RoomError {}

impl From<StoreError> for RoomError {
    fn from(err: StoreError) -> Self {
        RoomError::StoreUnavailable(err.to_string())
    }
}
