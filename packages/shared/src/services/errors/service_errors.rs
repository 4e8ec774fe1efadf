use std::fmt;
use std::time::Duration;

use serde::Serialize;

use crate::repositories::errors::leaderboard_repository_errors::LeaderboardRepositoryError;
use crate::repositories::errors::lobby_repository_errors::LobbyRepositoryError;
use crate::repositories::errors::player_name_repository_errors::PlayerNameRepositoryError;
use crate::repositories::errors::record_store_errors::RecordStoreError;
use crate::repositories::errors::websocket_repository_errors::WebSocketRepositoryError;
use crate::services::errors::auth_service_errors::AuthServiceError;
use crate::services::errors::chess_service_errors::ChessServiceError;

/// Error categories reported to clients in `{errorKind, message}` results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ErrorKind {
    ValidationError,
    NotFoundError,
    ConflictError,
    AuthorizationError,
    StateError,
    UpstreamError,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ServiceError {
    Validation(String),
    NotFound(String),
    /// Stale version token. Retried inside the coordinators; surfaces only
    /// once the retry budget is spent.
    Conflict(String),
    Unauthorized(String),
    InvalidState(String),
    NotActivePlayer,
    IllegalMove(String),
    Upstream(String),
    DeadlineExceeded {
        operation: String,
        deadline: Duration,
    },
    /// A fan-out over several records stopped short. `failed` names the
    /// records that still need the update.
    PartialFailure {
        operation: String,
        failed: Vec<String>,
    },
}

impl ServiceError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ServiceError::Validation(_) | ServiceError::IllegalMove(_) => {
                ErrorKind::ValidationError
            }
            ServiceError::NotFound(_) => ErrorKind::NotFoundError,
            ServiceError::Conflict(_) => ErrorKind::ConflictError,
            ServiceError::Unauthorized(_) => ErrorKind::AuthorizationError,
            ServiceError::InvalidState(_) | ServiceError::NotActivePlayer => ErrorKind::StateError,
            ServiceError::Upstream(_)
            | ServiceError::DeadlineExceeded { .. }
            | ServiceError::PartialFailure { .. } => ErrorKind::UpstreamError,
        }
    }
}

impl fmt::Display for ServiceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ServiceError::Validation(msg) => write!(f, "{}", msg),
            ServiceError::NotFound(what) => write!(f, "{} does not exist", what),
            ServiceError::Conflict(msg) => write!(f, "Write conflict: {}", msg),
            ServiceError::Unauthorized(msg) => write!(f, "{}", msg),
            ServiceError::InvalidState(msg) => write!(f, "{}", msg),
            ServiceError::NotActivePlayer => write!(f, "It is not your turn"),
            ServiceError::IllegalMove(mv) => write!(f, "Illegal move: {}", mv),
            ServiceError::Upstream(msg) => write!(f, "Upstream failure: {}", msg),
            ServiceError::DeadlineExceeded {
                operation,
                deadline,
            } => write!(
                f,
                "{} did not complete within {}ms",
                operation,
                deadline.as_millis()
            ),
            ServiceError::PartialFailure { operation, failed } => write!(
                f,
                "{} did not complete for: {}",
                operation,
                failed.join(", ")
            ),
        }
    }
}

impl std::error::Error for ServiceError {}

impl From<RecordStoreError> for ServiceError {
    fn from(err: RecordStoreError) -> Self {
        match err {
            RecordStoreError::Conflict(msg) => ServiceError::Conflict(msg),
            other => ServiceError::Upstream(other.to_string()),
        }
    }
}

impl From<LobbyRepositoryError> for ServiceError {
    fn from(err: LobbyRepositoryError) -> Self {
        match err {
            LobbyRepositoryError::NotFound => ServiceError::NotFound("Game".to_string()),
            LobbyRepositoryError::AlreadyMember => {
                ServiceError::InvalidState("Player already joined this game".to_string())
            }
            LobbyRepositoryError::LobbyFull => {
                ServiceError::InvalidState("Game is already full".to_string())
            }
            other => ServiceError::Upstream(other.to_string()),
        }
    }
}

impl From<LeaderboardRepositoryError> for ServiceError {
    fn from(err: LeaderboardRepositoryError) -> Self {
        ServiceError::Upstream(err.to_string())
    }
}

impl From<PlayerNameRepositoryError> for ServiceError {
    fn from(err: PlayerNameRepositoryError) -> Self {
        ServiceError::Upstream(err.to_string())
    }
}

impl From<WebSocketRepositoryError> for ServiceError {
    fn from(err: WebSocketRepositoryError) -> Self {
        ServiceError::Upstream(err.to_string())
    }
}

impl From<ChessServiceError> for ServiceError {
    fn from(err: ChessServiceError) -> Self {
        match err {
            ChessServiceError::InvalidSquare(_) | ChessServiceError::InvalidPromotion(_) => {
                ServiceError::Validation(err.to_string())
            }
            ChessServiceError::IllegalMove(mv) => ServiceError::IllegalMove(mv),
            ChessServiceError::GameOver => ServiceError::InvalidState(err.to_string()),
            ChessServiceError::InvalidPosition(msg) => ServiceError::Upstream(format!(
                "stored board is corrupt: {}",
                msg
            )),
        }
    }
}

impl From<AuthServiceError> for ServiceError {
    fn from(err: AuthServiceError) -> Self {
        ServiceError::Unauthorized(err.to_string())
    }
}
