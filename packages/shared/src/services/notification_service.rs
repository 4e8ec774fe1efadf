use std::sync::Arc;

use tracing::{info, warn};

use crate::models::notification::Notification;
use crate::repositories::errors::websocket_repository_errors::WebSocketRepositoryError;
use crate::repositories::websocket_repository::WebSocketRepository;
use crate::services::errors::service_errors::ServiceError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    Delivered,
    /// Player not connected, or the connection vanished. Nothing is queued.
    Dropped,
}

/// Best-effort, at-most-once push to connected players. Clients that miss a
/// push recover through the coordinators' full-state reads.
#[derive(Clone)]
pub struct NotificationService {
    repository: Arc<dyn WebSocketRepository + Send + Sync>,
}

impl NotificationService {
    pub fn new(repository: Arc<dyn WebSocketRepository + Send + Sync>) -> Self {
        Self { repository }
    }

    pub async fn register_connection(
        &self,
        player_id: &str,
        connection_id: &str,
    ) -> Result<(), ServiceError> {
        info!("Registering connection {} for player {}", connection_id, player_id);
        Ok(self
            .repository
            .store_connection(player_id, connection_id)
            .await?)
    }

    pub async fn drop_connection(&self, connection_id: &str) -> Result<(), ServiceError> {
        info!("Dropping connection {}", connection_id);
        Ok(self.repository.remove_connection_by_id(connection_id).await?)
    }

    pub async fn send_to_player(
        &self,
        player_id: &str,
        notification: &Notification,
    ) -> Result<Delivery, ServiceError> {
        let Some(connection_id) = self.repository.get_connection_id(player_id).await? else {
            info!(
                "Player {} is not connected, dropping {}",
                player_id,
                notification.kind()
            );
            return Ok(Delivery::Dropped);
        };

        let message = serde_json::to_string(notification)
            .map_err(|e| ServiceError::Upstream(format!("notification encoding: {}", e)))?;

        match self.repository.send_message(&connection_id, &message).await {
            Ok(()) => {
                info!("Sent {} to player {}", notification.kind(), player_id);
                Ok(Delivery::Delivered)
            }
            Err(WebSocketRepositoryError::Gone(_)) => {
                warn!(
                    "Connection {} of player {} is gone, dropping {}",
                    connection_id,
                    player_id,
                    notification.kind()
                );
                self.repository.remove_connection_by_id(&connection_id).await?;
                Ok(Delivery::Dropped)
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Like `send_to_player`, but a transport failure is logged instead of
    /// returned. Coordinators use this after their writes have committed.
    pub async fn notify(&self, player_id: &str, notification: &Notification) -> Delivery {
        match self.send_to_player(player_id, notification).await {
            Ok(delivery) => delivery,
            Err(e) => {
                warn!(
                    "Failed to push {} to player {}: {}",
                    notification.kind(),
                    player_id,
                    e
                );
                Delivery::Dropped
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::notification::BoardCleared;
    use crate::repositories::websocket_repository::MockWebSocketRepository;
    use mockall::predicate::eq;

    fn clear_board() -> Notification {
        Notification::ClearBoard(BoardCleared {
            session: "s1".to_string(),
        })
    }

    #[tokio::test]
    async fn test_send_to_connected_player() {
        let mut repo = MockWebSocketRepository::new();
        repo.expect_get_connection_id()
            .with(eq("alice"))
            .returning(|_| Ok(Some("conn-1".to_string())));
        repo.expect_send_message()
            .withf(|connection_id, message| {
                connection_id == "conn-1" && message.contains("\"type\":\"clearBoard\"")
            })
            .times(1)
            .returning(|_, _| Ok(()));

        let service = NotificationService::new(Arc::new(repo));

        let delivery = service.send_to_player("alice", &clear_board()).await.unwrap();
        assert_eq!(delivery, Delivery::Delivered);
    }

    #[tokio::test]
    async fn test_disconnected_player_is_dropped() {
        let mut repo = MockWebSocketRepository::new();
        repo.expect_get_connection_id().returning(|_| Ok(None));
        repo.expect_send_message().never();

        let service = NotificationService::new(Arc::new(repo));

        let delivery = service.send_to_player("alice", &clear_board()).await.unwrap();
        assert_eq!(delivery, Delivery::Dropped);
    }

    #[tokio::test]
    async fn test_gone_connection_is_unregistered() {
        let mut repo = MockWebSocketRepository::new();
        repo.expect_get_connection_id()
            .returning(|_| Ok(Some("conn-1".to_string())));
        repo.expect_send_message()
            .returning(|id, _| Err(WebSocketRepositoryError::Gone(id.to_string())));
        repo.expect_remove_connection_by_id()
            .with(eq("conn-1"))
            .times(1)
            .returning(|_| Ok(()));

        let service = NotificationService::new(Arc::new(repo));

        let delivery = service.send_to_player("alice", &clear_board()).await.unwrap();
        assert_eq!(delivery, Delivery::Dropped);
    }

    #[tokio::test]
    async fn test_notify_swallows_transport_errors() {
        let mut repo = MockWebSocketRepository::new();
        repo.expect_get_connection_id()
            .returning(|_| Err(WebSocketRepositoryError::DynamoDb("throttled".to_string())));

        let service = NotificationService::new(Arc::new(repo));

        assert_eq!(service.notify("alice", &clear_board()).await, Delivery::Dropped);
    }
}
