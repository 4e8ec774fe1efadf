pub mod connection;
pub mod default;
