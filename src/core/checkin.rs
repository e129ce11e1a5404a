// Check-in state machine.
//
// Two states, one direction: registered -> checked_in. The transition is a
// single conditional store write; under N concurrent scans of the same badge
// exactly one caller observes `CheckedIn` and bumps the event tally, the
// rest observe `AlreadyCheckedIn` with no side effect.

use chrono::{DateTime, Utc};
use thiserror::Error;
use uuid::Uuid;

use crate::core::guard::{self, GuardError};
use crate::store::models::{Event, EventStatus, Participant};
use crate::store::{CheckInTransition, Condition, CounterKey, RegistrationStore, StoreError};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckInOutcome {
    /// This call performed the transition and incremented the event tally.
    CheckedIn { checked_in_at: DateTime<Utc> },
    /// Benign idempotent replay: no mutation, no counter change.
    AlreadyCheckedIn { checked_in_at: Option<DateTime<Utc>> },
}

#[derive(Debug, Error)]
pub enum CheckInError {
    #[error(transparent)]
    InvalidToken(#[from] crate::token::TokenError),
    #[error("participant belongs to a different tenant")]
    TenantMismatch,
    #[error("participant not found")]
    NotFound,
    #[error("event is cancelled")]
    EventCancelled,
    #[error("participant is registered for a different event")]
    WrongEvent,
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl From<GuardError> for CheckInError {
    fn from(_: GuardError) -> Self {
        CheckInError::TenantMismatch
    }
}

pub struct CheckInMachine<'a> {
    store: &'a dyn RegistrationStore,
}

impl<'a> CheckInMachine<'a> {
    pub fn new(store: &'a dyn RegistrationStore) -> Self {
        Self { store }
    }

    /// Gate and run the transition for an already-resolved participant and
    /// event. All gates are non-mutating and run before the write.
    ///
    /// `expected_event` carries the event id the scanner believes it is
    /// serving (from the request body or the QR token); a mismatch means a
    /// badge presented at the wrong event's door.
    pub async fn check_in(
        &self,
        participant: &Participant,
        event: &Event,
        caller_tenant: Uuid,
        staff_id: &str,
        expected_event: Option<Uuid>,
        now: DateTime<Utc>,
    ) -> Result<CheckInOutcome, CheckInError> {
        guard::verify_tenant(caller_tenant, participant.tenant_id)?;
        guard::verify_tenant(caller_tenant, event.tenant_id)?;

        if let Some(expected) = expected_event {
            if expected != participant.event_id {
                return Err(CheckInError::WrongEvent);
            }
        }

        if event.status == EventStatus::Cancelled {
            return Err(CheckInError::EventCancelled);
        }

        match self
            .store
            .transition_check_in(participant.id, staff_id, now)
            .await?
        {
            CheckInTransition::Applied { checked_in_at } => {
                // Fires once per participant: the transition above is the
                // gate, so the tally needs no bound of its own.
                self.store
                    .conditional_increment(
                        CounterKey::checked_in(event.id),
                        1,
                        Condition::None,
                    )
                    .await?;
                Ok(CheckInOutcome::CheckedIn { checked_in_at })
            }
            CheckInTransition::AlreadyApplied { checked_in_at } => {
                Ok(CheckInOutcome::AlreadyCheckedIn { checked_in_at })
            }
            CheckInTransition::NotFound => Err(CheckInError::NotFound),
        }
    }
}
