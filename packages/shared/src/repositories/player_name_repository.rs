use std::collections::HashMap;

use async_trait::async_trait;
use aws_sdk_dynamodb::types::{AttributeValue, KeysAndAttributes};
use aws_sdk_dynamodb::Client;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use crate::repositories::errors::player_name_repository_errors::PlayerNameRepositoryError;

const BATCH_GET_LIMIT: usize = 100;

/// Projection of a users table row down to what clubs display.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct PlayerProfile {
    id: String,
    display_name: String,
}

#[async_trait]
pub trait PlayerNameRepository: Send + Sync {
    /// Display names of the given players. Players without a stored name are
    /// left out; callers fall back to the id.
    async fn get_names(
        &self,
        player_ids: &[String],
    ) -> Result<HashMap<String, String>, PlayerNameRepositoryError>;
}

pub struct DynamoDbPlayerNameRepository {
    pub client: Client,
    pub table_name: String,
}

impl DynamoDbPlayerNameRepository {
    pub fn new(client: Client, table_name: impl Into<String>) -> Self {
        Self {
            client,
            table_name: table_name.into(),
        }
    }
}

#[async_trait]
impl PlayerNameRepository for DynamoDbPlayerNameRepository {
    async fn get_names(
        &self,
        player_ids: &[String],
    ) -> Result<HashMap<String, String>, PlayerNameRepositoryError> {
        let mut names = HashMap::new();

        for chunk in player_ids.chunks(BATCH_GET_LIMIT) {
            let keys = chunk
                .iter()
                .map(|id| HashMap::from([("id".to_string(), AttributeValue::S(id.clone()))]))
                .collect::<Vec<_>>();
            let mut request = Some(HashMap::from([(
                self.table_name.clone(),
                KeysAndAttributes::builder()
                    .set_keys(Some(keys))
                    .projection_expression("id, display_name")
                    .build()
                    .map_err(|e| PlayerNameRepositoryError::DynamoDb(e.to_string()))?,
            )]));

            while let Some(items) = request.take() {
                let output = self
                    .client
                    .batch_get_item()
                    .set_request_items(Some(items))
                    .send()
                    .await
                    .map_err(|e| PlayerNameRepositoryError::DynamoDb(e.to_string()))?;

                if let Some(mut responses) = output.responses {
                    for item in responses.remove(&self.table_name).unwrap_or_default() {
                        if !item.contains_key("display_name") {
                            continue;
                        }
                        let profile: PlayerProfile = serde_dynamo::from_item(item).map_err(|e| {
                            PlayerNameRepositoryError::Serialization(e.to_string())
                        })?;
                        names.insert(profile.id, profile.display_name);
                    }
                }

                request = output.unprocessed_keys.filter(|keys| !keys.is_empty());
            }
        }

        Ok(names)
    }
}

#[derive(Default)]
pub struct InMemoryPlayerNameRepository {
    names: Mutex<HashMap<String, String>>,
}

impl InMemoryPlayerNameRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_name(&self, player_id: &str, display_name: &str) {
        self.names
            .lock()
            .insert(player_id.to_string(), display_name.to_string());
    }
}

#[async_trait]
impl PlayerNameRepository for InMemoryPlayerNameRepository {
    async fn get_names(
        &self,
        player_ids: &[String],
    ) -> Result<HashMap<String, String>, PlayerNameRepositoryError> {
        let names = self.names.lock();
        Ok(player_ids
            .iter()
            .filter_map(|id| names.get(id).map(|name| (id.clone(), name.clone())))
            .collect())
    }
}
