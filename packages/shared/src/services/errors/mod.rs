pub mod auth_service_errors;
pub mod chess_service_errors;
pub mod service_errors;
