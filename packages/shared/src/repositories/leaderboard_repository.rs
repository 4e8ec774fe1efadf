use std::collections::HashMap;

use async_trait::async_trait;
use aws_sdk_dynamodb::types::{AttributeValue, KeysAndAttributes};
use aws_sdk_dynamodb::Client;
use parking_lot::Mutex;
use tracing::debug;

use crate::models::rating::RatingEntry;
use crate::repositories::errors::leaderboard_repository_errors::LeaderboardRepositoryError;

#[cfg(test)]
use mockall::automock;

// BatchGetItem accepts at most this many keys per request
const BATCH_GET_LIMIT: usize = 100;

#[cfg_attr(test, automock)]
#[async_trait]
pub trait LeaderboardRepository: Send + Sync {
    /// Scores of the given players; players without an entry are left out.
    async fn get_scores(
        &self,
        leaderboard_id: &str,
        player_ids: &[String],
    ) -> Result<HashMap<String, f64>, LeaderboardRepositoryError>;

    async fn set_score(
        &self,
        leaderboard_id: &str,
        player_id: &str,
        score: f64,
    ) -> Result<(), LeaderboardRepositoryError>;
}

pub struct DynamoDbLeaderboardRepository {
    pub client: Client,
    pub table_name: String,
}

impl DynamoDbLeaderboardRepository {
    pub fn new(client: Client, table_name: impl Into<String>) -> Self {
        Self {
            client,
            table_name: table_name.into(),
        }
    }
}

#[async_trait]
impl LeaderboardRepository for DynamoDbLeaderboardRepository {
    async fn get_scores(
        &self,
        leaderboard_id: &str,
        player_ids: &[String],
    ) -> Result<HashMap<String, f64>, LeaderboardRepositoryError> {
        let mut scores = HashMap::new();

        for chunk in player_ids.chunks(BATCH_GET_LIMIT) {
            let keys = chunk
                .iter()
                .map(|player_id| {
                    HashMap::from([
                        (
                            "leaderboard_id".to_string(),
                            AttributeValue::S(leaderboard_id.to_string()),
                        ),
                        ("player_id".to_string(), AttributeValue::S(player_id.clone())),
                    ])
                })
                .collect::<Vec<_>>();
            let mut request = Some(HashMap::from([(
                self.table_name.clone(),
                KeysAndAttributes::builder()
                    .set_keys(Some(keys))
                    .consistent_read(true)
                    .build()
                    .map_err(|e| LeaderboardRepositoryError::DynamoDb(e.to_string()))?,
            )]));

            while let Some(items) = request.take() {
                let output = self
                    .client
                    .batch_get_item()
                    .set_request_items(Some(items))
                    .send()
                    .await
                    .map_err(|e| LeaderboardRepositoryError::DynamoDb(e.to_string()))?;

                if let Some(mut responses) = output.responses {
                    for item in responses.remove(&self.table_name).unwrap_or_default() {
                        let entry: RatingEntry = serde_dynamo::from_item(item).map_err(|e| {
                            LeaderboardRepositoryError::Serialization(e.to_string())
                        })?;
                        scores.insert(entry.player_id, entry.score);
                    }
                }

                request = output.unprocessed_keys.filter(|keys| !keys.is_empty());
            }
        }

        debug!(
            "Loaded {} of {} scores from {}",
            scores.len(),
            player_ids.len(),
            leaderboard_id
        );
        Ok(scores)
    }

    async fn set_score(
        &self,
        leaderboard_id: &str,
        player_id: &str,
        score: f64,
    ) -> Result<(), LeaderboardRepositoryError> {
        let entry = RatingEntry {
            leaderboard_id: leaderboard_id.to_string(),
            player_id: player_id.to_string(),
            score,
        };
        let item = serde_dynamo::to_item(&entry)
            .map_err(|e| LeaderboardRepositoryError::Serialization(e.to_string()))?;

        self.client
            .put_item()
            .table_name(&self.table_name)
            .set_item(Some(item))
            .send()
            .await
            .map_err(|e| LeaderboardRepositoryError::DynamoDb(e.to_string()))?;
        Ok(())
    }
}

#[derive(Default)]
pub struct InMemoryLeaderboardRepository {
    scores: Mutex<HashMap<(String, String), f64>>,
}

impl InMemoryLeaderboardRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl LeaderboardRepository for InMemoryLeaderboardRepository {
    async fn get_scores(
        &self,
        leaderboard_id: &str,
        player_ids: &[String],
    ) -> Result<HashMap<String, f64>, LeaderboardRepositoryError> {
        let scores = self.scores.lock();
        Ok(player_ids
            .iter()
            .filter_map(|player_id| {
                scores
                    .get(&(leaderboard_id.to_string(), player_id.clone()))
                    .map(|score| (player_id.clone(), *score))
            })
            .collect())
    }

    async fn set_score(
        &self,
        leaderboard_id: &str,
        player_id: &str,
        score: f64,
    ) -> Result<(), LeaderboardRepositoryError> {
        self.scores
            .lock()
            .insert((leaderboard_id.to_string(), player_id.to_string()), score);
        Ok(())
    }
}
