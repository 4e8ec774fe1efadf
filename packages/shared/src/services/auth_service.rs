use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};

use crate::models::auth::TokenClaims;
use crate::services::errors::auth_service_errors::AuthServiceError;

/// Verifies the bearer tokens players present. Tokens are issued by the
/// account service with the player id as subject.
#[derive(Clone)]
pub struct AuthService {
    jwt_secret: String,
}

impl AuthService {
    pub fn new(jwt_secret: impl Into<String>) -> Self {
        AuthService {
            jwt_secret: jwt_secret.into(),
        }
    }

    pub fn generate_token(&self, player_id: &str) -> Result<String, AuthServiceError> {
        let now = Utc::now();
        let claims = TokenClaims {
            sub: player_id.to_string(),
            exp: (now + Duration::hours(24)).timestamp() as usize,
            iat: now.timestamp() as usize,
        };

        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.jwt_secret.as_ref()),
        )
        .map_err(|e| AuthServiceError::JwtError(format!("{:#?}", e)))
    }

    pub fn verify_token(&self, token: &str) -> Result<TokenClaims, AuthServiceError> {
        let decoding_key = DecodingKey::from_secret(self.jwt_secret.as_ref());

        match decode::<TokenClaims>(token, &decoding_key, &Validation::default()) {
            Ok(token_data) => Ok(token_data.claims),
            Err(err) => match err.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => {
                    Err(AuthServiceError::ExpiredToken)
                }
                _ => Err(AuthServiceError::InvalidToken),
            },
        }
    }

    pub fn extract_player_id(&self, token: &str) -> Result<String, AuthServiceError> {
        Ok(self.verify_token(token)?.sub)
    }
}
