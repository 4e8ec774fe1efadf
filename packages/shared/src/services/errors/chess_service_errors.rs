use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub enum ChessServiceError {
    /// Stored board could not be parsed
    InvalidPosition(String),
    InvalidSquare(String),
    InvalidPromotion(String),
    IllegalMove(String),
    GameOver,
}

impl fmt::Display for ChessServiceError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ChessServiceError::InvalidPosition(msg) => write!(f, "Invalid position: {}", msg),
            ChessServiceError::InvalidSquare(square) => write!(f, "Invalid square: {}", square),
            ChessServiceError::InvalidPromotion(piece) => {
                write!(f, "Invalid promotion piece: {}", piece)
            }
            ChessServiceError::IllegalMove(mv) => write!(f, "Illegal move: {}", mv),
            ChessServiceError::GameOver => write!(f, "Game is already over"),
        }
    }
}

impl std::error::Error for ChessServiceError {}
