use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TokenClaims {
    /// Player id
    pub sub: String,
    pub exp: usize,
    pub iat: usize,
}
