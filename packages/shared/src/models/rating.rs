use serde::{Deserialize, Serialize};

pub const DEFAULT_RATING: f64 = 1500.0;
pub const K_FACTOR: f64 = 30.0;

/// A player's score on one named leaderboard.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RatingEntry {
    pub leaderboard_id: String,
    pub player_id: String,
    pub score: f64,
}

/// Outcome of a concluded game from one player's side.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GameOutcome {
    Win,
    Draw,
    Loss,
}

impl GameOutcome {
    pub fn score(&self) -> f64 {
        match self {
            GameOutcome::Win => 1.0,
            GameOutcome::Draw => 0.5,
            GameOutcome::Loss => 0.0,
        }
    }
}

/// Logistic expected score of `rating` against `opponent_rating`.
pub fn expected_score(rating: f64, opponent_rating: f64) -> f64 {
    1.0 / (1.0 + 10f64.powf((opponent_rating - rating) / 400.0))
}

/// Rating change for the player; the opponent moves by the negation.
pub fn rating_delta(rating: f64, opponent_rating: f64, outcome: GameOutcome, k_factor: f64) -> f64 {
    k_factor * (outcome.score() - expected_score(rating, opponent_rating))
}
