use axum::{extract::FromRequestParts, http::request::Parts};

use crate::{error::ApiError, state::AppState};

/// Player behind the request's bearer token.
#[derive(Debug, Clone)]
pub struct AuthenticatedPlayer {
    pub player_id: String,
}

impl FromRequestParts<AppState> for AuthenticatedPlayer {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let auth_header = parts
            .headers
            .get("Authorization")
            .ok_or(ApiError::Unauthorized)?
            .to_str()
            .map_err(|_| ApiError::Unauthorized)?;

        let token = auth_header
            .strip_prefix("Bearer ")
            .ok_or(ApiError::Unauthorized)?;

        let player_id = state.auth_service.extract_player_id(token)?;

        Ok(AuthenticatedPlayer { player_id })
    }
}
