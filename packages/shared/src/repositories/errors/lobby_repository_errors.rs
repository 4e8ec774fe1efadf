#[derive(Debug, Clone, PartialEq)]
pub enum LobbyRepositoryError {
    NotFound,
    AlreadyMember,
    LobbyFull,
    Serialization(String),
    DynamoDb(String),
}

impl std::fmt::Display for LobbyRepositoryError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LobbyRepositoryError::NotFound => write!(f, "Lobby not found"),
            LobbyRepositoryError::AlreadyMember => write!(f, "Player is already in the lobby"),
            LobbyRepositoryError::LobbyFull => write!(f, "Lobby is full"),
            LobbyRepositoryError::Serialization(msg) => write!(f, "Serialization error: {}", msg),
            LobbyRepositoryError::DynamoDb(msg) => write!(f, "DynamoDB error: {}", msg),
        }
    }
}

impl std::error::Error for LobbyRepositoryError {}
