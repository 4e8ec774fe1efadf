use serde::{Deserialize, Serialize};

/// Field names of a session record in the public partition.
pub mod fields {
    pub const BOARD: &str = "board";
    pub const WHITE: &str = "white";
    pub const BLACK: &str = "black";
    pub const GAME_OVER: &str = "gameOver";
    pub const ENDGAME_TYPE: &str = "endgameType";
    pub const WINNER: &str = "winner";

    pub const ALL: &[&str] = &[BOARD, WHITE, BLACK, GAME_OVER, ENDGAME_TYPE, WINNER];
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Color {
    White,
    Black,
}

impl Color {
    pub fn opposite(self) -> Color {
        match self {
            Color::White => Color::Black,
            Color::Black => Color::White,
        }
    }
}

impl From<chess::Color> for Color {
    fn from(color: chess::Color) -> Self {
        match color {
            chess::Color::White => Color::White,
            chess::Color::Black => Color::Black,
        }
    }
}

impl From<Color> for chess::Color {
    fn from(color: Color) -> Self {
        match color {
            Color::White => chess::Color::White,
            Color::Black => chess::Color::Black,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum EndgameType {
    Checkmate,
    Stalemate,
    Resignation,
    Draw,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HostedGame {
    pub session_id: String,
    pub join_code: String,
}

/// A session from one player's perspective. Returned to the joiner and
/// pushed to the other party with the perspective flipped.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JoinedSession {
    pub session_id: String,
    pub board: String,
    pub opponent_id: String,
    pub is_white: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MoveResult {
    pub board: String,
    pub game_over: bool,
    pub endgame_type: Option<EndgameType>,
    pub winner: Option<Color>,
}

/// Full state of a session, used to resynchronise a client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionView {
    pub session_id: String,
    pub board: String,
    pub white_id: Option<String>,
    pub black_id: Option<String>,
    pub active_color: Color,
    pub game_over: bool,
    pub endgame_type: Option<EndgameType>,
    pub winner: Option<Color>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_color_conversions() {
        assert_eq!(Color::from(chess::Color::Black), Color::Black);
        assert_eq!(chess::Color::from(Color::White), chess::Color::White);
        assert_eq!(Color::White.opposite(), Color::Black);
    }

    #[test]
    fn test_move_result_wire_shape() {
        let result = MoveResult {
            board: "fen".to_string(),
            game_over: true,
            endgame_type: Some(EndgameType::Checkmate),
            winner: Some(Color::White),
        };

        let json = serde_json::to_value(&result).unwrap();

        assert_eq!(json["gameOver"], true);
        assert_eq!(json["endgameType"], "checkmate");
        assert_eq!(json["winner"], "white");
    }
}
