use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use aws_sdk_apigatewaymanagement::{primitives::Blob, Client as ApiGatewayClient};
use aws_sdk_dynamodb::types::AttributeValue;
use aws_sdk_dynamodb::Client as DynamoDbClient;
use parking_lot::Mutex;
use tracing::{debug, info};

use crate::repositories::errors::websocket_repository_errors::WebSocketRepositoryError;

#[cfg(test)]
use mockall::automock;

#[cfg_attr(test, automock)]
#[async_trait]
pub trait WebSocketRepository: Send + Sync {
    async fn store_connection(
        &self,
        player_id: &str,
        connection_id: &str,
    ) -> Result<(), WebSocketRepositoryError>;

    async fn remove_connection_by_id(
        &self,
        connection_id: &str,
    ) -> Result<(), WebSocketRepositoryError>;

    async fn get_connection_id(
        &self,
        player_id: &str,
    ) -> Result<Option<String>, WebSocketRepositoryError>;

    /// Posts `message` to the connection. A connection the gateway no longer
    /// knows about fails with `Gone`.
    async fn send_message(
        &self,
        connection_id: &str,
        message: &str,
    ) -> Result<(), WebSocketRepositoryError>;
}

pub struct DynamoDbWebSocketRepository {
    dynamodb_client: DynamoDbClient,
    api_gateway_client: ApiGatewayClient,
    table_name: String,
}

impl DynamoDbWebSocketRepository {
    /// `api_gateway_client` must already point at the websocket stage's
    /// management endpoint.
    pub fn new(
        dynamodb_client: DynamoDbClient,
        api_gateway_client: ApiGatewayClient,
        table_name: impl Into<String>,
    ) -> Self {
        Self {
            dynamodb_client,
            api_gateway_client,
            table_name: table_name.into(),
        }
    }
}

#[async_trait]
impl WebSocketRepository for DynamoDbWebSocketRepository {
    async fn store_connection(
        &self,
        player_id: &str,
        connection_id: &str,
    ) -> Result<(), WebSocketRepositoryError> {
        self.dynamodb_client
            .put_item()
            .table_name(&self.table_name)
            .item("player_id", AttributeValue::S(player_id.to_string()))
            .item("connection_id", AttributeValue::S(connection_id.to_string()))
            .send()
            .await
            .map_err(|e| WebSocketRepositoryError::DynamoDb(e.to_string()))?;

        info!("Stored WebSocket connection for player: {}", player_id);
        Ok(())
    }

    async fn remove_connection_by_id(
        &self,
        connection_id: &str,
    ) -> Result<(), WebSocketRepositoryError> {
        let scan_result = self
            .dynamodb_client
            .scan()
            .table_name(&self.table_name)
            .filter_expression("connection_id = :connection_id")
            .expression_attribute_values(
                ":connection_id",
                AttributeValue::S(connection_id.to_string()),
            )
            .send()
            .await
            .map_err(|e| WebSocketRepositoryError::DynamoDb(e.to_string()))?;

        for item in scan_result.items.unwrap_or_default() {
            if let Some(AttributeValue::S(player_id)) = item.get("player_id") {
                // Only delete if the player has not reconnected in the meantime
                let result = self
                    .dynamodb_client
                    .delete_item()
                    .table_name(&self.table_name)
                    .key("player_id", AttributeValue::S(player_id.clone()))
                    .condition_expression("connection_id = :connection_id")
                    .expression_attribute_values(
                        ":connection_id",
                        AttributeValue::S(connection_id.to_string()),
                    )
                    .send()
                    .await;

                match result {
                    Ok(_) => info!("Removed connection for player: {}", player_id),
                    Err(e) => match e.as_service_error() {
                        Some(service_err)
                            if service_err.is_conditional_check_failed_exception() =>
                        {
                            debug!("Player {} already reconnected", player_id)
                        }
                        _ => return Err(WebSocketRepositoryError::DynamoDb(e.to_string())),
                    },
                }
            }
        }

        Ok(())
    }

    async fn get_connection_id(
        &self,
        player_id: &str,
    ) -> Result<Option<String>, WebSocketRepositoryError> {
        let result = self
            .dynamodb_client
            .get_item()
            .table_name(&self.table_name)
            .key("player_id", AttributeValue::S(player_id.to_string()))
            .send()
            .await
            .map_err(|e| WebSocketRepositoryError::DynamoDb(e.to_string()))?;

        Ok(match result.item.as_ref().and_then(|i| i.get("connection_id")) {
            Some(AttributeValue::S(connection_id)) => Some(connection_id.clone()),
            _ => None,
        })
    }

    async fn send_message(
        &self,
        connection_id: &str,
        message: &str,
    ) -> Result<(), WebSocketRepositoryError> {
        let result = self
            .api_gateway_client
            .post_to_connection()
            .connection_id(connection_id)
            .data(Blob::new(message.as_bytes()))
            .send()
            .await;

        match result {
            Ok(_) => {
                debug!("Sent message to connection: {}", connection_id);
                Ok(())
            }
            Err(e) => match e.as_service_error() {
                Some(service_err) if service_err.is_gone_exception() => {
                    Err(WebSocketRepositoryError::Gone(connection_id.to_string()))
                }
                _ => Err(WebSocketRepositoryError::ApiGateway(e.to_string())),
            },
        }
    }
}

/// Connection registry kept in process. Messages are recorded instead of
/// sent so local runs and tests can inspect them.
#[derive(Default)]
pub struct InMemoryWebSocketRepository {
    connections: Mutex<HashMap<String, String>>,
    gone: Mutex<HashSet<String>>,
    sent: Mutex<Vec<(String, String)>>,
}

impl InMemoryWebSocketRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Simulates the client vanishing without a `$disconnect`.
    pub fn mark_gone(&self, connection_id: &str) {
        self.gone.lock().insert(connection_id.to_string());
    }

    pub fn sent_to(&self, connection_id: &str) -> Vec<String> {
        self.sent
            .lock()
            .iter()
            .filter(|(id, _)| id == connection_id)
            .map(|(_, message)| message.clone())
            .collect()
    }
}

#[async_trait]
impl WebSocketRepository for InMemoryWebSocketRepository {
    async fn store_connection(
        &self,
        player_id: &str,
        connection_id: &str,
    ) -> Result<(), WebSocketRepositoryError> {
        self.connections
            .lock()
            .insert(player_id.to_string(), connection_id.to_string());
        Ok(())
    }

    async fn remove_connection_by_id(
        &self,
        connection_id: &str,
    ) -> Result<(), WebSocketRepositoryError> {
        self.connections
            .lock()
            .retain(|_, connection| connection != connection_id);
        Ok(())
    }

    async fn get_connection_id(
        &self,
        player_id: &str,
    ) -> Result<Option<String>, WebSocketRepositoryError> {
        Ok(self.connections.lock().get(player_id).cloned())
    }

    async fn send_message(
        &self,
        connection_id: &str,
        message: &str,
    ) -> Result<(), WebSocketRepositoryError> {
        if self.gone.lock().contains(connection_id) {
            return Err(WebSocketRepositoryError::Gone(connection_id.to_string()));
        }
        self.sent
            .lock()
            .push((connection_id.to_string(), message.to_string()));
        Ok(())
    }
}
