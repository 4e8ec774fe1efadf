use chess::{Board, BoardStatus, ChessMove, Piece, Rank, Square};
use std::str::FromStr;

use crate::models::game_session::{Color, EndgameType};
use crate::services::errors::chess_service_errors::ChessServiceError;

/// Terminal state of a board.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EndGame {
    pub winner: Option<Color>,
    pub endgame_type: EndgameType,
}

/// Rules-engine adapter over `chess::Board`, adding resignation.
#[derive(Debug, Clone, Copy)]
pub struct ChessBoard {
    board: Board,
    resigned: Option<Color>,
}

impl Default for ChessBoard {
    fn default() -> Self {
        Self::new()
    }
}

impl ChessBoard {
    pub fn new() -> Self {
        ChessBoard {
            board: Board::default(),
            resigned: None,
        }
    }

    pub fn from_fen(fen: &str) -> Result<Self, ChessServiceError> {
        let board = Board::from_str(fen)
            .map_err(|e| ChessServiceError::InvalidPosition(format!("Invalid FEN: {}", e)))?;
        Ok(ChessBoard {
            board,
            resigned: None,
        })
    }

    pub fn to_fen(&self) -> String {
        format!("{}", self.board)
    }

    pub fn turn(&self) -> Color {
        self.board.side_to_move().into()
    }

    /// Parses a move given as square names. A pawn reaching the last rank
    /// promotes to `promotion`, or a queen when none is given.
    pub fn parse_move(
        &self,
        from: &str,
        to: &str,
        promotion: Option<&str>,
    ) -> Result<ChessMove, ChessServiceError> {
        let source = Square::from_str(&from.to_lowercase())
            .map_err(|_| ChessServiceError::InvalidSquare(from.to_string()))?;
        let dest = Square::from_str(&to.to_lowercase())
            .map_err(|_| ChessServiceError::InvalidSquare(to.to_string()))?;

        let promotion = match promotion.map(|p| p.to_lowercase()) {
            Some(piece) => Some(match piece.as_str() {
                "q" | "queen" => Piece::Queen,
                "r" | "rook" => Piece::Rook,
                "b" | "bishop" => Piece::Bishop,
                "n" | "knight" => Piece::Knight,
                _ => return Err(ChessServiceError::InvalidPromotion(piece)),
            }),
            None => {
                let last_rank = matches!(dest.get_rank(), Rank::First | Rank::Eighth);
                if last_rank && self.board.piece_on(source) == Some(Piece::Pawn) {
                    Some(Piece::Queen)
                } else {
                    None
                }
            }
        };

        Ok(ChessMove::new(source, dest, promotion))
    }

    pub fn is_valid_move(&self, from: &str, to: &str) -> bool {
        match self.parse_move(from, to, None) {
            Ok(mv) => !self.is_end_game() && self.board.legal(mv),
            Err(_) => false,
        }
    }

    /// Applies the move if legal for the side to move.
    pub fn make_move(
        &mut self,
        from: &str,
        to: &str,
        promotion: Option<&str>,
    ) -> Result<(), ChessServiceError> {
        if self.is_end_game() {
            return Err(ChessServiceError::GameOver);
        }
        let mv = self.parse_move(from, to, promotion)?;
        if !self.board.legal(mv) {
            return Err(ChessServiceError::IllegalMove(format!("{}{}", from, to)));
        }
        self.board = self.board.make_move_new(mv);
        Ok(())
    }

    pub fn resign(&mut self, color: Color) {
        self.resigned = Some(color);
    }

    pub fn is_end_game(&self) -> bool {
        self.end_game().is_some()
    }

    pub fn end_game(&self) -> Option<EndGame> {
        if let Some(loser) = self.resigned {
            return Some(EndGame {
                winner: Some(loser.opposite()),
                endgame_type: EndgameType::Resignation,
            });
        }
        match self.board.status() {
            BoardStatus::Checkmate => Some(EndGame {
                // The side to move is the one mated
                winner: Some(Color::from(self.board.side_to_move()).opposite()),
                endgame_type: EndgameType::Checkmate,
            }),
            BoardStatus::Stalemate => Some(EndGame {
                winner: None,
                endgame_type: EndgameType::Stalemate,
            }),
            BoardStatus::Ongoing if self.insufficient_material() => Some(EndGame {
                winner: None,
                endgame_type: EndgameType::Draw,
            }),
            BoardStatus::Ongoing => None,
        }
    }

    // King vs king, or king and a single minor piece vs king
    fn insufficient_material(&self) -> bool {
        let heavy = *self.board.pieces(Piece::Pawn)
            | *self.board.pieces(Piece::Rook)
            | *self.board.pieces(Piece::Queen);
        heavy.popcnt() == 0 && self.board.combined().popcnt() <= 3
    }
}

impl PartialEq for ChessBoard {
    fn eq(&self, other: &Self) -> bool {
        let a = &self.board;
        let b = &other.board;
        let colors = [chess::Color::White, chess::Color::Black];
        self.resigned == other.resigned
            && a.side_to_move() == b.side_to_move()
            && a.en_passant() == b.en_passant()
            && colors.iter().all(|&c| {
                a.color_combined(c) == b.color_combined(c) && a.castle_rights(c) == b.castle_rights(c)
            })
            && chess::ALL_PIECES
                .iter()
                .all(|&p| a.pieces(p) == b.pieces(p))
    }
}
