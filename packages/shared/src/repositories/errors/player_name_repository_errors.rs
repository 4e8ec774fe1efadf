#[derive(Debug, Clone, PartialEq)]
pub enum PlayerNameRepositoryError {
    Serialization(String),
    DynamoDb(String),
}

impl std::fmt::Display for PlayerNameRepositoryError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PlayerNameRepositoryError::Serialization(msg) => {
                write!(f, "Serialization error: {}", msg)
            }
            PlayerNameRepositoryError::DynamoDb(msg) => write!(f, "DynamoDB error: {}", msg),
        }
    }
}

impl std::error::Error for PlayerNameRepositoryError {}
