use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use uuid::Uuid;

use super::auth::AuthStaff;
use crate::app::AppState;
use crate::error::ApiError;

/// Validated tenant information from the tenants registry
#[derive(Clone, Debug)]
pub struct ValidatedTenant {
    pub id: Uuid,
    pub slug: String,
    pub name: String,
}

/// Middleware that validates the tenant from JWT claims against the tenants
/// registry. Ensures the tenant exists and is active before any staff
/// operation runs.
pub async fn validate_tenant_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    // AuthStaff is injected by the JWT middleware, which runs first
    let auth = request
        .extensions()
        .get::<AuthStaff>()
        .cloned()
        .ok_or_else(|| {
            ApiError::unauthorized("JWT authentication required before tenant validation")
        })?;

    let tenant = state
        .store
        .tenant_by_id(auth.tenant_id)
        .await?
        .ok_or_else(|| {
            tracing::warn!(tenant = %auth.tenant_id, "staff token references unknown tenant");
            ApiError::unauthorized("Tenant does not exist")
        })?;

    if !tenant.is_active() {
        tracing::warn!(tenant = %tenant.id, slug = %tenant.slug, "rejected suspended tenant");
        return Err(ApiError::TenantSuspended);
    }

    tracing::debug!(tenant = %tenant.id, slug = %tenant.slug, "tenant validation successful");

    request.extensions_mut().insert(ValidatedTenant {
        id: tenant.id,
        slug: tenant.slug,
        name: tenant.name,
    });

    Ok(next.run(request).await)
}
