use axum::extract::{Path, State};
use axum::Extension;
use uuid::Uuid;

use crate::app::AppState;
use crate::middleware::auth::AuthStaff;
use crate::middleware::response::{ApiResponse, ApiResult};
use crate::services::reconcile::{ReconcileReport, ReconcileService};

/// POST /api/events/:event_id/reconcile - repair leaked capacity reservations
///
/// Compares `registered_count` against persisted participant rows and
/// releases the difference. Safe to run while registrations are live; a
/// sweep that loses the race reports `repaired: false` and can be retried.
pub async fn reconcile_post(
    State(state): State<AppState>,
    Extension(staff): Extension<AuthStaff>,
    Path(event_id): Path<Uuid>,
) -> ApiResult<ReconcileReport> {
    let service = ReconcileService::new(state.store.clone());
    let report = service.reconcile_event(staff.tenant_id, event_id).await?;
    Ok(ApiResponse::success(report))
}
