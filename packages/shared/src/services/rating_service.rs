use std::sync::Arc;

use tracing::{error, info};

use crate::models::rating::{rating_delta, GameOutcome};
use crate::repositories::leaderboard_repository::LeaderboardRepository;
use crate::services::errors::service_errors::ServiceError;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RatingChange {
    pub player: f64,
    pub opponent: f64,
}

/// Elo bookkeeping for concluded games.
#[derive(Clone)]
pub struct RatingService {
    repository: Arc<dyn LeaderboardRepository + Send + Sync>,
    leaderboard_id: String,
    k_factor: f64,
    default_rating: f64,
}

impl RatingService {
    pub fn new(
        repository: Arc<dyn LeaderboardRepository + Send + Sync>,
        leaderboard_id: impl Into<String>,
        k_factor: f64,
        default_rating: f64,
    ) -> Self {
        Self {
            repository,
            leaderboard_id: leaderboard_id.into(),
            k_factor,
            default_rating,
        }
    }

    /// Applies one game's result to both players, `outcome` being the
    /// player's side. Not retried: a second application would double-count.
    pub async fn update_ratings(
        &self,
        player_id: &str,
        opponent_id: &str,
        outcome: GameOutcome,
    ) -> Result<RatingChange, ServiceError> {
        let scores = self
            .repository
            .get_scores(
                &self.leaderboard_id,
                &[player_id.to_string(), opponent_id.to_string()],
            )
            .await?;
        let player = scores.get(player_id).copied().unwrap_or(self.default_rating);
        let opponent = scores
            .get(opponent_id)
            .copied()
            .unwrap_or(self.default_rating);

        let delta = rating_delta(player, opponent, outcome, self.k_factor);
        let change = RatingChange {
            player: player + delta,
            opponent: opponent - delta,
        };

        self.repository
            .set_score(&self.leaderboard_id, player_id, change.player)
            .await?;

        if let Err(e) = self
            .repository
            .set_score(&self.leaderboard_id, opponent_id, change.opponent)
            .await
        {
            error!(
                "Rating data-integrity break on {}: {} was set to {} but {} could not be set to {}: {}",
                self.leaderboard_id, player_id, change.player, opponent_id, change.opponent, e
            );
            return Err(ServiceError::Upstream(format!(
                "rating for {} not updated: {}",
                opponent_id, e
            )));
        }

        info!(
            "Ratings updated: {} {} -> {}, {} {} -> {}",
            player_id, player, change.player, opponent_id, opponent, change.opponent
        );
        Ok(change)
    }
}
