use axum::extract::State;
use axum::Json;
use serde::Deserialize;
use uuid::Uuid;

use crate::app::AppState;
use crate::error::ApiError;
use crate::middleware::response::{ApiResponse, ApiResult};
use crate::services::registration::{
    RegistrationReceipt, RegistrationRequest, RegistrationService,
};

#[derive(Debug, Deserialize)]
pub struct RegisterBody {
    pub event_id: Uuid,
    pub tenant_slug: String,
    pub email: String,
    pub name: String,
    pub phone: Option<String>,
}

/// POST /register - public participant registration
///
/// Admits against event capacity, mints the QR identity token and persists
/// the participant. Responds 201 with the receipt, 409 on capacity or
/// duplicate email, 410 when the registration window is closed.
pub async fn register_post(
    State(state): State<AppState>,
    Json(body): Json<RegisterBody>,
) -> ApiResult<RegistrationReceipt> {
    validate_body(&body)?;

    let service = RegistrationService::new(state.store.clone());
    let receipt = service
        .register(RegistrationRequest {
            tenant_slug: body.tenant_slug,
            event_id: body.event_id,
            email: body.email,
            name: body.name,
            phone: body.phone,
        })
        .await?;

    Ok(ApiResponse::created(receipt))
}

fn validate_body(body: &RegisterBody) -> Result<(), ApiError> {
    if body.tenant_slug.trim().is_empty() {
        return Err(ApiError::bad_request("tenant_slug is required"));
    }
    if body.name.trim().is_empty() {
        return Err(ApiError::bad_request("name is required"));
    }
    let email = body.email.trim();
    if email.is_empty() || !email.contains('@') {
        return Err(ApiError::bad_request("a valid email is required"));
    }
    Ok(())
}
