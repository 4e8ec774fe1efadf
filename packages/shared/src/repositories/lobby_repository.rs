use std::collections::HashMap;

use async_trait::async_trait;
use aws_sdk_dynamodb::types::{AttributeValue, ReturnValue};
use aws_sdk_dynamodb::Client;
use parking_lot::Mutex;
use tracing::info;

use crate::models::lobby::Lobby;
use crate::repositories::errors::lobby_repository_errors::LobbyRepositoryError;

const JOIN_CODE_INDEX: &str = "JoinCodeIndex";

#[async_trait]
pub trait LobbyRepository: Send + Sync {
    async fn create_lobby(
        &self,
        host_id: &str,
        max_players: u32,
    ) -> Result<Lobby, LobbyRepositoryError>;

    /// Seats `player_id` in the lobby behind `join_code`. Fails with
    /// `AlreadyMember` when the player is seated already.
    async fn join_lobby_by_code(
        &self,
        player_id: &str,
        join_code: &str,
    ) -> Result<Lobby, LobbyRepositoryError>;

    async fn get_lobby(&self, lobby_id: &str) -> Result<Lobby, LobbyRepositoryError>;

    async fn get_joined_lobbies(&self, player_id: &str) -> Result<Vec<Lobby>, LobbyRepositoryError>;
}

pub struct DynamoDbLobbyRepository {
    pub client: Client,
    pub table_name: String,
}

impl DynamoDbLobbyRepository {
    pub fn new(client: Client, table_name: impl Into<String>) -> Self {
        Self {
            client,
            table_name: table_name.into(),
        }
    }

    async fn find_by_code(&self, join_code: &str) -> Result<Lobby, LobbyRepositoryError> {
        let output = self
            .client
            .query()
            .table_name(&self.table_name)
            .index_name(JOIN_CODE_INDEX)
            .key_condition_expression("join_code = :code")
            .expression_attribute_values(":code", AttributeValue::S(join_code.to_string()))
            .send()
            .await
            .map_err(|e| LobbyRepositoryError::DynamoDb(e.to_string()))?;

        let item = output
            .items
            .and_then(|items| items.into_iter().next())
            .ok_or(LobbyRepositoryError::NotFound)?;

        // The index may project keys only, so re-read the base item
        let lobby_id = match item.get("lobby_id") {
            Some(AttributeValue::S(id)) => id.clone(),
            _ => return Err(LobbyRepositoryError::NotFound),
        };
        self.get_lobby(&lobby_id).await
    }
}

#[async_trait]
impl LobbyRepository for DynamoDbLobbyRepository {
    async fn create_lobby(
        &self,
        host_id: &str,
        max_players: u32,
    ) -> Result<Lobby, LobbyRepositoryError> {
        let lobby = Lobby::new(host_id, max_players);
        let item = serde_dynamo::to_item(&lobby)
            .map_err(|e| LobbyRepositoryError::Serialization(e.to_string()))?;

        self.client
            .put_item()
            .table_name(&self.table_name)
            .set_item(Some(item))
            .condition_expression("attribute_not_exists(lobby_id)")
            .send()
            .await
            .map_err(|e| LobbyRepositoryError::DynamoDb(e.to_string()))?;

        info!(
            "Created lobby {} with code {} for host {}",
            lobby.lobby_id, lobby.join_code, host_id
        );
        Ok(lobby)
    }

    async fn join_lobby_by_code(
        &self,
        player_id: &str,
        join_code: &str,
    ) -> Result<Lobby, LobbyRepositoryError> {
        let lobby = self.find_by_code(join_code).await?;
        if lobby.contains(player_id) {
            return Err(LobbyRepositoryError::AlreadyMember);
        }
        if lobby.is_full() {
            return Err(LobbyRepositoryError::LobbyFull);
        }

        let result = self
            .client
            .update_item()
            .table_name(&self.table_name)
            .key("lobby_id", AttributeValue::S(lobby.lobby_id.clone()))
            .update_expression("SET players = list_append(players, :new_player)")
            .condition_expression("size(players) < :max AND NOT contains(players, :player)")
            .expression_attribute_values(
                ":new_player",
                AttributeValue::L(vec![AttributeValue::S(player_id.to_string())]),
            )
            .expression_attribute_values(":player", AttributeValue::S(player_id.to_string()))
            .expression_attribute_values(":max", AttributeValue::N(lobby.max_players.to_string()))
            .return_values(ReturnValue::AllNew)
            .send()
            .await;

        match result {
            Ok(output) => {
                let attributes = output.attributes.ok_or(LobbyRepositoryError::NotFound)?;
                let joined: Lobby = serde_dynamo::from_item(attributes)
                    .map_err(|e| LobbyRepositoryError::Serialization(e.to_string()))?;
                info!("Player {} joined lobby {}", player_id, joined.lobby_id);
                Ok(joined)
            }
            Err(e) => match e.as_service_error() {
                Some(service_err) if service_err.is_conditional_check_failed_exception() => {
                    // Lost a race: work out which condition failed
                    let current = self.get_lobby(&lobby.lobby_id).await?;
                    if current.contains(player_id) {
                        Err(LobbyRepositoryError::AlreadyMember)
                    } else {
                        Err(LobbyRepositoryError::LobbyFull)
                    }
                }
                _ => Err(LobbyRepositoryError::DynamoDb(e.to_string())),
            },
        }
    }

    async fn get_lobby(&self, lobby_id: &str) -> Result<Lobby, LobbyRepositoryError> {
        let result = self
            .client
            .get_item()
            .table_name(&self.table_name)
            .key("lobby_id", AttributeValue::S(lobby_id.to_string()))
            .consistent_read(true)
            .send()
            .await
            .map_err(|e| LobbyRepositoryError::DynamoDb(e.to_string()))?;

        match result.item {
            Some(item) => serde_dynamo::from_item(item)
                .map_err(|e| LobbyRepositoryError::Serialization(e.to_string())),
            None => Err(LobbyRepositoryError::NotFound),
        }
    }

    async fn get_joined_lobbies(&self, player_id: &str) -> Result<Vec<Lobby>, LobbyRepositoryError> {
        let mut lobbies = Vec::new();
        let mut start_key = None;
        loop {
            let output = self
                .client
                .scan()
                .table_name(&self.table_name)
                .filter_expression("contains(players, :player)")
                .expression_attribute_values(":player", AttributeValue::S(player_id.to_string()))
                .set_exclusive_start_key(start_key.take())
                .send()
                .await
                .map_err(|e| LobbyRepositoryError::DynamoDb(e.to_string()))?;

            for item in output.items.unwrap_or_default() {
                let lobby: Lobby = serde_dynamo::from_item(item)
                    .map_err(|e| LobbyRepositoryError::Serialization(e.to_string()))?;
                lobbies.push(lobby);
            }

            start_key = output.last_evaluated_key;
            if start_key.is_none() {
                break;
            }
        }
        lobbies.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(lobbies)
    }
}

#[derive(Default)]
pub struct InMemoryLobbyRepository {
    lobbies: Mutex<HashMap<String, Lobby>>,
}

impl InMemoryLobbyRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl LobbyRepository for InMemoryLobbyRepository {
    async fn create_lobby(
        &self,
        host_id: &str,
        max_players: u32,
    ) -> Result<Lobby, LobbyRepositoryError> {
        let mut lobbies = self.lobbies.lock();
        let mut lobby = Lobby::new(host_id, max_players);
        while lobbies.values().any(|l| l.join_code == lobby.join_code) {
            lobby.join_code = Lobby::generate_join_code();
        }
        lobbies.insert(lobby.lobby_id.clone(), lobby.clone());
        Ok(lobby)
    }

    async fn join_lobby_by_code(
        &self,
        player_id: &str,
        join_code: &str,
    ) -> Result<Lobby, LobbyRepositoryError> {
        let mut lobbies = self.lobbies.lock();
        let lobby = lobbies
            .values_mut()
            .find(|l| l.join_code == join_code)
            .ok_or(LobbyRepositoryError::NotFound)?;
        if lobby.contains(player_id) {
            return Err(LobbyRepositoryError::AlreadyMember);
        }
        if lobby.is_full() {
            return Err(LobbyRepositoryError::LobbyFull);
        }
        lobby.players.push(player_id.to_string());
        Ok(lobby.clone())
    }

    async fn get_lobby(&self, lobby_id: &str) -> Result<Lobby, LobbyRepositoryError> {
        self.lobbies
            .lock()
            .get(lobby_id)
            .cloned()
            .ok_or(LobbyRepositoryError::NotFound)
    }

    async fn get_joined_lobbies(&self, player_id: &str) -> Result<Vec<Lobby>, LobbyRepositoryError> {
        let mut lobbies: Vec<Lobby> = self
            .lobbies
            .lock()
            .values()
            .filter(|l| l.contains(player_id))
            .cloned()
            .collect();
        lobbies.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(lobbies)
    }
}
