#[derive(Debug, Clone, PartialEq)]
pub enum RecordStoreError {
    /// A version token presented on write was stale, or a field expected to
    /// be absent already exists.
    Conflict(String),
    Serialization(String),
    DynamoDb(String),
}

impl std::fmt::Display for RecordStoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RecordStoreError::Conflict(msg) => write!(f, "Write conflict: {}", msg),
            RecordStoreError::Serialization(msg) => write!(f, "Serialization error: {}", msg),
            RecordStoreError::DynamoDb(msg) => write!(f, "DynamoDB error: {}", msg),
        }
    }
}

impl std::error::Error for RecordStoreError {}
