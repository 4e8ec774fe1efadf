use lambda_runtime::Error;
use serde_json::{json, Value};
use tracing::debug;

/// Clients only receive pushes; the one message they may send is a
/// keep-alive `{"action": "ping"}`.
pub async fn handle_default_message(connection_id: &str, body: Option<&str>) -> Result<Value, Error> {
    debug!("Message on {}: {:?}", connection_id, body);

    let action = body
        .and_then(|body| serde_json::from_str::<Value>(body).ok())
        .and_then(|message| message.get("action").and_then(Value::as_str).map(String::from));

    match action.as_deref() {
        Some("ping") => Ok(json!({
            "statusCode": 200,
            "body": json!({"action": "pong"}).to_string()
        })),
        _ => Ok(json!({
            "statusCode": 400,
            "body": json!({"error": "Unsupported message"}).to_string()
        })),
    }
}
