use serde::{Deserialize, Serialize};

use crate::models::game_session::{Color, EndgameType, JoinedSession};

/// Push message sent over a player's websocket connection. Serialises as
/// `{"type": "...", "payload": {...}}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "camelCase")]
pub enum Notification {
    OpponentJoined(JoinedSession),
    BoardUpdated(BoardUpdate),
    ClearBoard(BoardCleared),
}

impl Notification {
    pub fn kind(&self) -> &'static str {
        match self {
            Notification::OpponentJoined(_) => "opponentJoined",
            Notification::BoardUpdated(_) => "boardUpdated",
            Notification::ClearBoard(_) => "clearBoard",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BoardUpdate {
    pub session: String,
    pub board: String,
    pub game_over: bool,
    pub endgame_type: Option<EndgameType>,
    pub winner: Option<Color>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoardCleared {
    pub session: String,
}
