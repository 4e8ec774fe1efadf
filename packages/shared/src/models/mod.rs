pub mod auth;
pub mod club;
pub mod game_session;
pub mod lobby;
pub mod notification;
pub mod rating;
pub mod record;
pub mod requests;
pub mod responses;
