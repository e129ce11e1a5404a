// HTTP API Error Types
use axum::{http::StatusCode, response::IntoResponse, Json};
use serde_json::{json, Value};

use crate::core::admission::NotOpenReason;
use crate::core::checkin::CheckInError;
use crate::services::registration::RegistrationError;
use crate::store::StoreError;
use crate::token::TokenError;

/// HTTP API error with appropriate status codes and client-friendly messages
#[derive(Debug)]
pub enum ApiError {
    // 400 Bad Request
    BadRequest(String),
    InvalidToken(String),
    EventCancelled,
    WrongEvent,

    // 401 Unauthorized
    Unauthorized(String),

    // 403 Forbidden
    TenantMismatch,
    TenantSuspended,

    // 404 Not Found
    NotFound(String),
    ParticipantNotFound,

    // 409 Conflict
    CapacityFull,
    AlreadyRegistered,

    // 410 Gone - registration window
    RegistrationNotOpen,
    RegistrationClosed,

    // 500 Internal Server Error
    InternalServerError(String),

    // 503 Service Unavailable
    ServiceUnavailable(String),
}

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_)
            | ApiError::InvalidToken(_)
            | ApiError::EventCancelled
            | ApiError::WrongEvent => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::TenantMismatch | ApiError::TenantSuspended => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) | ApiError::ParticipantNotFound => StatusCode::NOT_FOUND,
            ApiError::CapacityFull | ApiError::AlreadyRegistered => StatusCode::CONFLICT,
            ApiError::RegistrationNotOpen | ApiError::RegistrationClosed => StatusCode::GONE,
            ApiError::InternalServerError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::ServiceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        }
    }

    /// Stable error code for client handling
    pub fn error_code(&self) -> &'static str {
        match self {
            ApiError::BadRequest(_) => "BAD_REQUEST",
            ApiError::InvalidToken(_) => "INVALID_TOKEN",
            ApiError::EventCancelled => "EVENT_CANCELLED",
            ApiError::WrongEvent => "WRONG_EVENT",
            ApiError::Unauthorized(_) => "UNAUTHORIZED",
            ApiError::TenantMismatch => "TENANT_MISMATCH",
            ApiError::TenantSuspended => "TENANT_SUSPENDED",
            ApiError::NotFound(_) => "NOT_FOUND",
            ApiError::ParticipantNotFound => "PARTICIPANT_NOT_FOUND",
            ApiError::CapacityFull => "CAPACITY_FULL",
            ApiError::AlreadyRegistered => "ALREADY_REGISTERED",
            ApiError::RegistrationNotOpen => "REGISTRATION_NOT_OPEN",
            ApiError::RegistrationClosed => "REGISTRATION_CLOSED",
            ApiError::InternalServerError(_) => "INTERNAL_SERVER_ERROR",
            ApiError::ServiceUnavailable(_) => "SERVICE_UNAVAILABLE",
        }
    }

    /// Client-safe error message
    pub fn message(&self) -> String {
        match self {
            ApiError::BadRequest(msg) => msg.clone(),
            ApiError::InvalidToken(msg) => msg.clone(),
            ApiError::EventCancelled => "Event has been cancelled".to_string(),
            ApiError::WrongEvent => "Participant is registered for a different event".to_string(),
            ApiError::Unauthorized(msg) => msg.clone(),
            ApiError::TenantMismatch => "Record belongs to a different tenant".to_string(),
            ApiError::TenantSuspended => "Tenant is suspended".to_string(),
            ApiError::NotFound(msg) => msg.clone(),
            ApiError::ParticipantNotFound => "Participant not found".to_string(),
            ApiError::CapacityFull => "Event has reached capacity".to_string(),
            ApiError::AlreadyRegistered => "Email is already registered for this event".to_string(),
            ApiError::RegistrationNotOpen => "Registration has not opened yet".to_string(),
            ApiError::RegistrationClosed => "Registration window has closed".to_string(),
            ApiError::InternalServerError(msg) => msg.clone(),
            ApiError::ServiceUnavailable(msg) => msg.clone(),
        }
    }

    pub fn to_json(&self) -> Value {
        json!({
            "error": true,
            "message": self.message(),
            "code": self.error_code()
        })
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        ApiError::BadRequest(message.into())
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        ApiError::Unauthorized(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        ApiError::NotFound(message.into())
    }

    pub fn internal_server_error(message: impl Into<String>) -> Self {
        ApiError::InternalServerError(message.into())
    }

    pub fn service_unavailable(message: impl Into<String>) -> Self {
        ApiError::ServiceUnavailable(message.into())
    }
}

impl From<TokenError> for ApiError {
    fn from(err: TokenError) -> Self {
        ApiError::InvalidToken(err.to_string())
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(msg) => ApiError::not_found(msg),
            StoreError::DuplicateEmail(_) => ApiError::AlreadyRegistered,
            // A naked condition failure reaching the HTTP layer means a
            // caller skipped its gate; surface as a server fault rather than
            // a business outcome.
            StoreError::ConditionFailed => {
                tracing::error!("conditional write failed outside an admission/check-in gate");
                ApiError::internal_server_error("An error occurred while processing your request")
            }
            StoreError::Database(msg) => {
                // Don't expose internal database errors to clients
                tracing::error!("store error: {}", msg);
                ApiError::internal_server_error("An error occurred while processing your request")
            }
        }
    }
}

impl From<RegistrationError> for ApiError {
    fn from(err: RegistrationError) -> Self {
        match err {
            RegistrationError::TenantNotFound => ApiError::not_found("Tenant not found"),
            RegistrationError::TenantSuspended => ApiError::TenantSuspended,
            RegistrationError::EventNotFound => ApiError::not_found("Event not found"),
            RegistrationError::TenantMismatch => ApiError::TenantMismatch,
            RegistrationError::NotOpen(reason) => match reason {
                NotOpenReason::NotPublished | NotOpenReason::NotYetOpen => {
                    ApiError::RegistrationNotOpen
                }
                NotOpenReason::Closed | NotOpenReason::Cancelled => ApiError::RegistrationClosed,
            },
            RegistrationError::CapacityFull => ApiError::CapacityFull,
            RegistrationError::AlreadyRegistered => ApiError::AlreadyRegistered,
            RegistrationError::Store(e) => e.into(),
        }
    }
}

impl From<crate::services::reconcile::ReconcileError> for ApiError {
    fn from(err: crate::services::reconcile::ReconcileError) -> Self {
        use crate::services::reconcile::ReconcileError;
        match err {
            ReconcileError::EventNotFound => ApiError::not_found("Event not found"),
            ReconcileError::TenantMismatch => ApiError::TenantMismatch,
            ReconcileError::Store(e) => e.into(),
        }
    }
}

impl From<CheckInError> for ApiError {
    fn from(err: CheckInError) -> Self {
        match err {
            CheckInError::InvalidToken(e) => ApiError::InvalidToken(e.to_string()),
            CheckInError::TenantMismatch => ApiError::TenantMismatch,
            CheckInError::NotFound => ApiError::ParticipantNotFound,
            CheckInError::EventCancelled => ApiError::EventCancelled,
            CheckInError::WrongEvent => ApiError::WrongEvent,
            CheckInError::Store(e) => e.into(),
        }
    }
}

// Standard error trait implementations
impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message())
    }
}

impl std::error::Error for ApiError {}

// Automatic HTTP response conversion for Axum
impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        (self.status_code(), Json(self.to_json())).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_codes_match_error_taxonomy() {
        assert_eq!(ApiError::CapacityFull.status_code(), StatusCode::CONFLICT);
        assert_eq!(ApiError::AlreadyRegistered.status_code(), StatusCode::CONFLICT);
        assert_eq!(ApiError::RegistrationClosed.status_code(), StatusCode::GONE);
        assert_eq!(ApiError::RegistrationNotOpen.status_code(), StatusCode::GONE);
        assert_eq!(ApiError::TenantMismatch.status_code(), StatusCode::FORBIDDEN);
        assert_eq!(ApiError::ParticipantNotFound.status_code(), StatusCode::NOT_FOUND);
        assert_eq!(ApiError::EventCancelled.status_code(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn registration_window_reasons_split_across_410_codes() {
        let not_open: ApiError = RegistrationError::NotOpen(NotOpenReason::NotYetOpen).into();
        assert_eq!(not_open.error_code(), "REGISTRATION_NOT_OPEN");
        let closed: ApiError = RegistrationError::NotOpen(NotOpenReason::Closed).into();
        assert_eq!(closed.error_code(), "REGISTRATION_CLOSED");
    }
}
