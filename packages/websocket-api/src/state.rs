use std::sync::Arc;

use shared::config::Config;
use shared::repositories::websocket_repository::DynamoDbWebSocketRepository;
use shared::services::auth_service::AuthService;
use shared::services::notification_service::NotificationService;

#[derive(Clone)]
pub struct AppState {
    pub notification_service: Arc<NotificationService>,
    pub auth_service: Arc<AuthService>,
}

impl AppState {
    pub fn from_config(config: &Config, sdk_config: &aws_config::SdkConfig) -> Self {
        let dynamodb_client = aws_sdk_dynamodb::Client::new(sdk_config);
        let mut api_gateway_config = aws_sdk_apigatewaymanagement::config::Builder::from(sdk_config);
        if let Some(endpoint) = &config.websocket_endpoint {
            api_gateway_config = api_gateway_config.endpoint_url(endpoint);
        }
        let api_gateway_client =
            aws_sdk_apigatewaymanagement::Client::from_conf(api_gateway_config.build());

        let repository = Arc::new(DynamoDbWebSocketRepository::new(
            dynamodb_client,
            api_gateway_client,
            &config.connections_table,
        ));

        AppState {
            notification_service: Arc::new(NotificationService::new(repository)),
            auth_service: Arc::new(AuthService::new(config.jwt_secret.clone())),
        }
    }
}
