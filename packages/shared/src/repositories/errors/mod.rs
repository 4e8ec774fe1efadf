pub mod leaderboard_repository_errors;
pub mod lobby_repository_errors;
pub mod player_name_repository_errors;
pub mod record_store_errors;
pub mod websocket_repository_errors;
