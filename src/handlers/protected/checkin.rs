use axum::extract::State;
use axum::{Extension, Json};
use serde::Deserialize;
use uuid::Uuid;

use crate::app::AppState;
use crate::middleware::auth::AuthStaff;
use crate::middleware::response::{ApiResponse, ApiResult};
use crate::services::checkin::{CheckInReceipt, CheckInService, CheckInTarget};

/// The two accepted body shapes for POST /api/checkin, resolved here once.
/// `Token` is the QR scan path (`event_id` optionally pins the scanner to
/// one event); `Direct` is the manual event/participant id path.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum CheckInBody {
    Token {
        token: String,
        event_id: Option<Uuid>,
    },
    Direct {
        event_id: Uuid,
        participant_id: Uuid,
    },
}

impl From<CheckInBody> for CheckInTarget {
    fn from(body: CheckInBody) -> Self {
        match body {
            CheckInBody::Token { token, event_id } => CheckInTarget::Token { token, event_id },
            CheckInBody::Direct { event_id, participant_id } => {
                CheckInTarget::Direct { event_id, participant_id }
            }
        }
    }
}

/// POST /api/checkin - transition a participant to checked-in
///
/// First successful scan responds with `status: "checked_in"`; any replay
/// responds 200 with `status: "already_checked"` and the original timestamp.
pub async fn checkin_post(
    State(state): State<AppState>,
    Extension(staff): Extension<AuthStaff>,
    Json(body): Json<CheckInBody>,
) -> ApiResult<CheckInReceipt> {
    let service = CheckInService::new(state.store.clone());
    let receipt = service
        .check_in(staff.tenant_id, &staff.staff_id, body.into())
        .await?;
    Ok(ApiResponse::success(receipt))
}
