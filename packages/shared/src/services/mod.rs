pub mod auth_service;
pub mod chess_service;
pub mod club_service;
pub mod concurrency;
pub mod errors;
pub mod game_session_service;
pub mod notification_service;
pub mod rating_service;
