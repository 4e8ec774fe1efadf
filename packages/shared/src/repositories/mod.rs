pub mod errors;
pub mod leaderboard_repository;
pub mod lobby_repository;
pub mod player_name_repository;
pub mod record_store;
pub mod websocket_repository;
