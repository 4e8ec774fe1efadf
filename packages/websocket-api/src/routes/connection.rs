use lambda_runtime::Error;
use serde_json::{json, Value};
use tracing::{debug, error, info, warn};

use crate::state::AppState;

/// Registers the connection under the player named by the bearer token the
/// client passes as `?token=`. Unauthenticated connections are refused.
pub async fn handle_connect(
    connection_id: &str,
    token: Option<&str>,
    state: &AppState,
) -> Result<Value, Error> {
    let Some(token) = token else {
        warn!("Connection {} refused: no token", connection_id);
        return Ok(json!({
            "statusCode": 401,
            "body": json!({"error": "Missing token query parameter"}).to_string()
        }));
    };

    let player_id = match state.auth_service.extract_player_id(token) {
        Ok(player_id) => player_id,
        Err(e) => {
            warn!("Connection {} refused: {}", connection_id, e);
            return Ok(json!({
                "statusCode": 401,
                "body": json!({"error": "Invalid or expired token"}).to_string()
            }));
        }
    };

    debug!("Storing connection {} for {}", connection_id, player_id);
    if let Err(e) = state
        .notification_service
        .register_connection(&player_id, connection_id)
        .await
    {
        error!("Failed to store connection {}: {}", connection_id, e);
        return Ok(json!({
            "statusCode": 500,
            "body": json!({"error": "Failed to store connection"}).to_string()
        }));
    }

    info!("Player {} connected on {}", player_id, connection_id);
    Ok(json!({ "statusCode": 200 }))
}

pub async fn handle_disconnect(connection_id: &str, state: &AppState) -> Result<Value, Error> {
    info!("WebSocket connection disconnected: {}", connection_id);

    // The client is gone either way; a failed removal is cleaned up on the
    // next delivery attempt to this connection.
    if let Err(e) = state
        .notification_service
        .drop_connection(connection_id)
        .await
    {
        error!("Failed to remove connection {}: {}", connection_id, e);
    }

    Ok(json!({ "statusCode": 200 }))
}
