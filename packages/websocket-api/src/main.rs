use aws_lambda_events::apigw::ApiGatewayWebsocketProxyRequest;
use lambda_runtime::{run, service_fn, Error, LambdaEvent};
use serde_json::{json, Value};
use tracing::{debug, error};

pub mod routes;
pub mod state;

use shared::config::Config;

#[tokio::main]
async fn main() -> Result<(), Error> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .with_target(false)
        .without_time()
        .init();

    let config = Config::from_env()?;
    let sdk_config = aws_config::load_from_env().await;
    let app_state = state::AppState::from_config(&config, &sdk_config);

    run(service_fn(
        |event: LambdaEvent<ApiGatewayWebsocketProxyRequest>| {
            websocket_handler(event, app_state.clone())
        },
    ))
    .await
}

async fn websocket_handler(
    event: LambdaEvent<ApiGatewayWebsocketProxyRequest>,
    state: state::AppState,
) -> Result<Value, Error> {
    let request = event.payload;
    let route_key = request.request_context.route_key.as_deref().unwrap_or("");
    let connection_id = request
        .request_context
        .connection_id
        .as_deref()
        .unwrap_or("");
    debug!("Route {} on connection {}", route_key, connection_id);

    match route_key {
        "$connect" => {
            let token = request.query_string_parameters.first("token");
            routes::connection::handle_connect(connection_id, token, &state).await
        }
        "$disconnect" => routes::connection::handle_disconnect(connection_id, &state).await,
        "$default" => {
            routes::default::handle_default_message(connection_id, request.body.as_deref()).await
        }
        _ => {
            error!("Unknown route key: {}", route_key);
            Ok(json!({
                "statusCode": 400,
                "body": json!({"error": "Unknown route"}).to_string()
            }))
        }
    }
}
