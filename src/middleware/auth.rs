use axum::{
    extract::Request,
    http::HeaderMap,
    middleware::Next,
    response::Response,
};
use jsonwebtoken::{decode, DecodingKey, Validation};
use uuid::Uuid;

use crate::auth::Claims;
use crate::config;
use crate::error::ApiError;

/// Authenticated staff context extracted from JWT
#[derive(Clone, Debug)]
pub struct AuthStaff {
    pub tenant_id: Uuid,
    pub staff_id: String,
}

impl From<Claims> for AuthStaff {
    fn from(claims: Claims) -> Self {
        Self {
            tenant_id: claims.tenant_id,
            staff_id: claims.staff_id,
        }
    }
}

/// JWT authentication middleware that validates tokens and injects the staff
/// context into the request extensions.
pub async fn jwt_auth_middleware(
    headers: HeaderMap,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = extract_jwt_from_headers(&headers).map_err(ApiError::unauthorized)?;
    let claims = validate_jwt(&token).map_err(ApiError::unauthorized)?;

    request.extensions_mut().insert(AuthStaff::from(claims));
    Ok(next.run(request).await)
}

/// Extract JWT token from Authorization header
fn extract_jwt_from_headers(headers: &HeaderMap) -> Result<String, String> {
    let auth_header = headers
        .get("authorization")
        .or_else(|| headers.get("Authorization"))
        .ok_or_else(|| "Missing Authorization header".to_string())?;

    let auth_str = auth_header
        .to_str()
        .map_err(|_| "Invalid Authorization header format".to_string())?;

    if let Some(token) = auth_str.strip_prefix("Bearer ") {
        if token.trim().is_empty() {
            return Err("Empty JWT token".to_string());
        }
        Ok(token.to_string())
    } else {
        Err("Authorization header must use Bearer token format".to_string())
    }
}

/// Validate JWT token and extract claims
fn validate_jwt(token: &str) -> Result<Claims, String> {
    let secret = &config::config().security.jwt_secret;
    if secret.is_empty() {
        return Err("JWT secret is not configured".to_string());
    }

    decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims)
    .map_err(|e| format!("Invalid JWT token: {}", e))
}
