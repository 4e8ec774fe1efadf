use axum::{
    extract::rejection::{JsonRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use tracing::error;

use shared::models::responses::ErrorResponse;
use shared::services::errors::auth_service_errors::AuthServiceError;
use shared::services::errors::service_errors::{ErrorKind, ServiceError};

#[derive(Debug)]
pub enum ApiError {
    Service(ServiceError),
    AuthService(AuthServiceError),
    Unauthorized,
    BadRequest(String),
}

impl From<ServiceError> for ApiError {
    fn from(error: ServiceError) -> Self {
        ApiError::Service(error)
    }
}

impl From<AuthServiceError> for ApiError {
    fn from(error: AuthServiceError) -> Self {
        ApiError::AuthService(error)
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl ApiError {
    fn status_and_body(&self) -> (StatusCode, ErrorResponse) {
        match self {
            ApiError::Service(e) => {
                let status = match e {
                    ServiceError::DeadlineExceeded { .. } => StatusCode::GATEWAY_TIMEOUT,
                    _ => match e.kind() {
                        ErrorKind::ValidationError => StatusCode::BAD_REQUEST,
                        ErrorKind::NotFoundError => StatusCode::NOT_FOUND,
                        ErrorKind::ConflictError => StatusCode::CONFLICT,
                        ErrorKind::AuthorizationError => StatusCode::FORBIDDEN,
                        ErrorKind::StateError => StatusCode::UNPROCESSABLE_ENTITY,
                        ErrorKind::UpstreamError => StatusCode::BAD_GATEWAY,
                    },
                };
                // Transport detail stays in the logs
                let message = match e {
                    ServiceError::Upstream(_) => {
                        error!("Upstream failure: {}", e);
                        "An upstream service failed, try again later".to_string()
                    }
                    _ => e.to_string(),
                };
                (
                    status,
                    ErrorResponse {
                        error_kind: e.kind(),
                        message,
                    },
                )
            }
            ApiError::AuthService(AuthServiceError::JwtError(detail)) => {
                error!("Token handling failed: {}", detail);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorResponse {
                        error_kind: ErrorKind::UpstreamError,
                        message: "Token handling failed".to_string(),
                    },
                )
            }
            ApiError::AuthService(e) => (
                StatusCode::UNAUTHORIZED,
                ErrorResponse {
                    error_kind: ErrorKind::AuthorizationError,
                    message: e.to_string(),
                },
            ),
            ApiError::Unauthorized => (
                StatusCode::UNAUTHORIZED,
                ErrorResponse {
                    error_kind: ErrorKind::AuthorizationError,
                    message: "Missing or malformed bearer token".to_string(),
                },
            ),
            ApiError::BadRequest(message) => (
                StatusCode::BAD_REQUEST,
                ErrorResponse {
                    error_kind: ErrorKind::ValidationError,
                    message: message.clone(),
                },
            ),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = self.status_and_body();
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_follows_error_kind() {
        let cases = [
            (ServiceError::Validation("x".into()), StatusCode::BAD_REQUEST),
            (ServiceError::NotFound("Club".into()), StatusCode::NOT_FOUND),
            (ServiceError::Conflict("x".into()), StatusCode::CONFLICT),
            (ServiceError::Unauthorized("x".into()), StatusCode::FORBIDDEN),
            (ServiceError::NotActivePlayer, StatusCode::UNPROCESSABLE_ENTITY),
            (ServiceError::Upstream("x".into()), StatusCode::BAD_GATEWAY),
        ];
        for (error, expected) in cases {
            let (status, _) = ApiError::from(error).status_and_body();
            assert_eq!(status, expected);
        }
    }

    #[test]
    fn test_upstream_detail_is_not_exposed() {
        let (_, body) = ApiError::from(ServiceError::Upstream(
            "dynamodb: ProvisionedThroughputExceeded".to_string(),
        ))
        .status_and_body();

        assert_eq!(body.error_kind, ErrorKind::UpstreamError);
        assert!(!body.message.contains("dynamodb"));
    }

    #[test]
    fn test_expired_token_is_unauthorized() {
        let (status, body) = ApiError::from(AuthServiceError::ExpiredToken).status_and_body();

        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body.error_kind, ErrorKind::AuthorizationError);
    }
}
