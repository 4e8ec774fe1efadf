#[derive(Debug, Clone, PartialEq)]
pub enum WebSocketRepositoryError {
    /// The connection no longer exists on the gateway side.
    Gone(String),
    DynamoDb(String),
    ApiGateway(String),
}

impl std::fmt::Display for WebSocketRepositoryError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            WebSocketRepositoryError::Gone(connection_id) => {
                write!(f, "Connection {} is gone", connection_id)
            }
            WebSocketRepositoryError::DynamoDb(msg) => write!(f, "DynamoDB error: {}", msg),
            WebSocketRepositoryError::ApiGateway(msg) => write!(f, "API Gateway error: {}", msg),
        }
    }
}

impl std::error::Error for WebSocketRepositoryError {}
