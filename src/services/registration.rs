// Public registration flow: resolve tenant and event, reserve a capacity
// slot, mint the identity token, persist the participant. Two-phase by
// design: the slot reservation is the only contended step, and a failed
// persist releases the slot with a compensating decrement.

use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;

use crate::core::admission::{Admission, AdmissionController, AdmissionMode, NotOpenReason};
use crate::core::guard::{self, GuardError};
use crate::store::models::{CheckInState, Participant};
use crate::store::{RegistrationStore, StoreError};
use crate::token::{self, TokenClaims};

#[derive(Debug, Clone)]
pub struct RegistrationRequest {
    pub tenant_slug: String,
    pub event_id: Uuid,
    pub email: String,
    pub name: String,
    pub phone: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RegistrationReceipt {
    pub participant_id: Uuid,
    pub registration_number: i64,
    pub token: String,
    pub status: RegistrationStatus,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RegistrationStatus {
    Registered,
    Waitlisted,
}

#[derive(Debug, Error)]
pub enum RegistrationError {
    #[error("tenant not found")]
    TenantNotFound,
    #[error("tenant is suspended")]
    TenantSuspended,
    #[error("event not found")]
    EventNotFound,
    #[error("event belongs to a different tenant")]
    TenantMismatch,
    #[error(transparent)]
    NotOpen(NotOpenReason),
    #[error("event has reached capacity")]
    CapacityFull,
    #[error("email is already registered for this event")]
    AlreadyRegistered,
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl From<GuardError> for RegistrationError {
    fn from(_: GuardError) -> Self {
        RegistrationError::TenantMismatch
    }
}

pub struct RegistrationService {
    store: Arc<dyn RegistrationStore>,
}

impl RegistrationService {
    pub fn new(store: Arc<dyn RegistrationStore>) -> Self {
        Self { store }
    }

    pub async fn register(
        &self,
        request: RegistrationRequest,
    ) -> Result<RegistrationReceipt, RegistrationError> {
        let tenant = self
            .store
            .tenant_by_slug(&request.tenant_slug)
            .await?
            .ok_or(RegistrationError::TenantNotFound)?;
        if !tenant.is_active() {
            return Err(RegistrationError::TenantSuspended);
        }

        let event = self
            .store
            .event_by_id(request.event_id)
            .await?
            .ok_or(RegistrationError::EventNotFound)?;
        // The slug scopes the request; an event id from another tenant must
        // not be reachable through it.
        guard::verify_tenant(tenant.id, event.tenant_id)?;

        // Advisory duplicate check so an obvious replay does not burn a
        // capacity slot. The unique index at insert remains the authority.
        if self
            .store
            .participant_by_email(event.id, &request.email)
            .await?
            .is_some()
        {
            return Err(RegistrationError::AlreadyRegistered);
        }

        let controller = AdmissionController::new(self.store.as_ref());
        let now = Utc::now();
        let admission = controller.try_admit(&event, now, AdmissionMode::Standard).await?;
        let admission = match admission {
            Admission::CapacityFull if event.waitlist_enabled => {
                controller.try_admit(&event, now, AdmissionMode::Waitlist).await?
            }
            other => other,
        };

        let (registration_number, mode, status) = match admission {
            Admission::Admitted { registration_number } => {
                (registration_number, AdmissionMode::Standard, RegistrationStatus::Registered)
            }
            Admission::Waitlisted { position } => {
                (position, AdmissionMode::Waitlist, RegistrationStatus::Waitlisted)
            }
            Admission::CapacityFull => return Err(RegistrationError::CapacityFull),
            Admission::NotOpen(reason) => return Err(RegistrationError::NotOpen(reason)),
        };

        // Slot reserved; mint the identity and persist. Any failure from
        // here on releases the reservation before surfacing.
        let participant_id = Uuid::new_v4();
        let token = token::encode(&TokenClaims {
            tenant_id: tenant.id,
            event_id: event.id,
            participant_id,
        });
        let participant = Participant {
            id: participant_id,
            tenant_id: tenant.id,
            event_id: event.id,
            email: request.email.clone(),
            name: request.name.clone(),
            phone: request.phone.clone(),
            registration_number,
            waitlisted: status == RegistrationStatus::Waitlisted,
            check_in_state: CheckInState::Registered,
            checked_in_at: None,
            checked_in_by: None,
            created_at: now,
        };

        if let Err(persist_err) = self.store.insert_participant(&participant).await {
            if let Err(release_err) = controller.release(event.id, mode).await {
                // Leaked reservation; the reconciliation sweep picks it up.
                tracing::error!(
                    event = %event.id,
                    error = %release_err,
                    "failed to release reserved slot after persist failure"
                );
            }
            return Err(match persist_err {
                StoreError::DuplicateEmail(_) => RegistrationError::AlreadyRegistered,
                other => RegistrationError::Store(other),
            });
        }

        tracing::info!(
            tenant = %tenant.id,
            event = %event.id,
            participant = %participant_id,
            number = registration_number,
            waitlisted = status == RegistrationStatus::Waitlisted,
            "registration persisted"
        );

        Ok(RegistrationReceipt {
            participant_id,
            registration_number,
            token,
            status,
        })
    }
}
