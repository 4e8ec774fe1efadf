use std::sync::Arc;

use shared::config::Config;
use shared::repositories::leaderboard_repository::DynamoDbLeaderboardRepository;
use shared::repositories::lobby_repository::DynamoDbLobbyRepository;
use shared::repositories::player_name_repository::DynamoDbPlayerNameRepository;
use shared::repositories::record_store::DynamoDbRecordStore;
use shared::repositories::websocket_repository::DynamoDbWebSocketRepository;
use shared::services::auth_service::AuthService;
use shared::services::club_service::ClubService;
use shared::services::game_session_service::GameSessionService;
use shared::services::notification_service::NotificationService;
use shared::services::rating_service::RatingService;

#[derive(Clone)]
pub struct AppState {
    pub auth_service: Arc<AuthService>,
    pub game_session_service: Arc<GameSessionService>,
    pub club_service: Arc<ClubService>,
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

        let records = Arc::new(DynamoDbRecordStore::new(
            dynamodb_client.clone(),
            &config.records_table,
        ));
        let notifications = NotificationService::new(Arc::new(DynamoDbWebSocketRepository::new(
            dynamodb_client.clone(),
            api_gateway_client,
            &config.connections_table,
        )));
        let ratings = RatingService::new(
            Arc::new(DynamoDbLeaderboardRepository::new(
                dynamodb_client.clone(),
                &config.leaderboard_table,
            )),
            &config.leaderboard_id,
            config.k_factor,
            config.default_rating,
        );

        let game_session_service = GameSessionService::new(
            records.clone(),
            Arc::new(DynamoDbLobbyRepository::new(
                dynamodb_client.clone(),
                &config.lobbies_table,
            )),
            ratings,
            notifications,
            config.retry,
            config.call_deadline,
        );
        let club_service = ClubService::new(
            records,
            Arc::new(DynamoDbPlayerNameRepository::new(
                dynamodb_client,
                &config.users_table,
            )),
            config.retry,
            config.call_deadline,
            config.blocked_terms.clone(),
        );

        AppState {
            auth_service: Arc::new(AuthService::new(config.jwt_secret.clone())),
            game_session_service: Arc::new(game_session_service),
            club_service: Arc::new(club_service),
        }
    }
}

#[cfg(test)]
impl AppState {
    /// Same wiring over the in-memory repositories.
    pub fn in_memory(jwt_secret: &str) -> Self {
        use shared::config::RetryPolicy;
        use shared::models::rating::{DEFAULT_RATING, K_FACTOR};
        use shared::repositories::leaderboard_repository::InMemoryLeaderboardRepository;
        use shared::repositories::lobby_repository::InMemoryLobbyRepository;
        use shared::repositories::player_name_repository::InMemoryPlayerNameRepository;
        use shared::repositories::record_store::InMemoryRecordStore;
        use shared::repositories::websocket_repository::InMemoryWebSocketRepository;
        use std::time::Duration;

        let records = Arc::new(InMemoryRecordStore::new());
        let game_session_service = GameSessionService::new(
            records.clone(),
            Arc::new(InMemoryLobbyRepository::new()),
            RatingService::new(
                Arc::new(InMemoryLeaderboardRepository::new()),
                "EloRatings",
                K_FACTOR,
                DEFAULT_RATING,
            ),
            NotificationService::new(Arc::new(InMemoryWebSocketRepository::new())),
            RetryPolicy::default(),
            Duration::from_secs(5),
        );
        let club_service = ClubService::new(
            records,
            Arc::new(InMemoryPlayerNameRepository::new()),
            RetryPolicy::default(),
            Duration::from_secs(5),
            vec!["banasco".to_string()],
        );

        AppState {
            auth_service: Arc::new(AuthService::new(jwt_secret)),
            game_session_service: Arc::new(game_session_service),
            club_service: Arc::new(club_service),
        }
    }
}
