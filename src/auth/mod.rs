use chrono::{Duration, Utc};
use jsonwebtoken::{encode, EncodingKey, Header};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config;

/// JWT claims for an authenticated staff scanner session. The tenant id in
/// the claims establishes the isolation scope for every downstream lookup.
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub tenant_id: Uuid,
    pub staff_id: String,
    pub exp: i64,
    pub iat: i64,
}

impl Claims {
    pub fn new(tenant_id: Uuid, staff_id: String) -> Self {
        let now = Utc::now();
        let expiry_hours = config::config().security.jwt_expiry_hours;
        let exp = (now + Duration::hours(expiry_hours as i64)).timestamp();

        Self {
            tenant_id,
            staff_id,
            exp,
            iat: now.timestamp(),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum JwtError {
    #[error("JWT generation error: {0}")]
    TokenGeneration(String),
    #[error("JWT secret is not configured")]
    MissingSecret,
}

/// Issue a signed staff token. Used by the session layer and by tests.
pub fn issue_token(claims: &Claims) -> Result<String, JwtError> {
    let secret = &config::config().security.jwt_secret;
    if secret.is_empty() {
        return Err(JwtError::MissingSecret);
    }
    encode(
        &Header::default(),
        claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| JwtError::TokenGeneration(e.to_string()))
}
