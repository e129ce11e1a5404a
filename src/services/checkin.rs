// Staff check-in flow: resolve the request variant to a participant, run the
// tenant guard, then hand off to the state machine. Resolution happens once
// at this boundary; everything below works with typed records.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::core::checkin::{CheckInError, CheckInMachine, CheckInOutcome};
use crate::store::RegistrationStore;
use crate::token;

/// The two accepted request shapes, resolved from the wire format by the
/// handler: a scanned QR token (optionally pinned to the scanner's event) or
/// a direct event/participant id pair.
#[derive(Debug, Clone)]
pub enum CheckInTarget {
    Token {
        token: String,
        event_id: Option<Uuid>,
    },
    Direct {
        event_id: Uuid,
        participant_id: Uuid,
    },
}

#[derive(Debug, Clone, Serialize)]
pub struct CheckInReceipt {
    pub participant_id: Uuid,
    pub name: String,
    pub status: CheckInStatus,
    pub checked_in_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum CheckInStatus {
    #[serde(rename = "checked_in")]
    CheckedIn,
    #[serde(rename = "already_checked")]
    AlreadyChecked,
}

pub struct CheckInService {
    store: Arc<dyn RegistrationStore>,
}

impl CheckInService {
    pub fn new(store: Arc<dyn RegistrationStore>) -> Self {
        Self { store }
    }

    pub async fn check_in(
        &self,
        caller_tenant: Uuid,
        staff_id: &str,
        target: CheckInTarget,
    ) -> Result<CheckInReceipt, CheckInError> {
        let (participant_id, expected_event, token_tenant) = match target {
            CheckInTarget::Token { token, event_id } => {
                let claims = token::decode(&token)?;
                // A scanner pinned to one event must reject tokens minted
                // for another, before any lookup happens.
                if let Some(scanner_event) = event_id {
                    if scanner_event != claims.event_id {
                        return Err(CheckInError::WrongEvent);
                    }
                }
                (claims.participant_id, Some(claims.event_id), Some(claims.tenant_id))
            }
            CheckInTarget::Direct { event_id, participant_id } => {
                (participant_id, Some(event_id), None)
            }
        };

        // Lookup by participant id alone is not tenant-scoped; the guard
        // inside the state machine re-checks ownership before the write.
        let participant = self
            .store
            .participant_by_id(participant_id)
            .await?
            .ok_or(CheckInError::NotFound)?;

        // A token whose tenant field disagrees with the stored record was
        // never issued by this system.
        if let Some(token_tenant) = token_tenant {
            if token_tenant != participant.tenant_id {
                return Err(CheckInError::NotFound);
            }
        }

        let event = self
            .store
            .event_by_id(participant.event_id)
            .await?
            .ok_or(CheckInError::NotFound)?;

        let machine = CheckInMachine::new(self.store.as_ref());
        let outcome = machine
            .check_in(
                &participant,
                &event,
                caller_tenant,
                staff_id,
                expected_event,
                Utc::now(),
            )
            .await?;

        let receipt = match outcome {
            CheckInOutcome::CheckedIn { checked_in_at } => {
                tracing::info!(
                    tenant = %caller_tenant,
                    participant = %participant.id,
                    staff = staff_id,
                    "participant checked in"
                );
                CheckInReceipt {
                    participant_id: participant.id,
                    name: participant.name.clone(),
                    status: CheckInStatus::CheckedIn,
                    checked_in_at: Some(checked_in_at),
                }
            }
            CheckInOutcome::AlreadyCheckedIn { checked_in_at } => CheckInReceipt {
                participant_id: participant.id,
                name: participant.name.clone(),
                status: CheckInStatus::AlreadyChecked,
                checked_in_at,
            },
        };
        Ok(receipt)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::models::{
        CheckInState, Event, EventStatus, Participant, Tenant, TenantStatus,
    };
    use crate::store::MemoryStore;
    use crate::token::TokenClaims;

    struct Fixture {
        service: CheckInService,
        store: Arc<MemoryStore>,
        tenant_id: Uuid,
        event: Event,
        participant: Participant,
        token: String,
    }

    async fn fixture() -> Fixture {
        let now = Utc::now();
        let tenant_id = Uuid::new_v4();
        let tenant = Tenant {
            id: tenant_id,
            slug: "acme".into(),
            name: "Acme Corp".into(),
            status: TenantStatus::Active,
            created_at: now,
            updated_at: now,
        };
        let event = Event {
            id: Uuid::new_v4(),
            tenant_id,
            name: "kickoff".into(),
            status: EventStatus::Published,
            capacity: 10,
            registered_count: 1,
            checked_in_count: 0,
            waitlist_count: 0,
            waitlist_enabled: false,
            registration_opens_at: None,
            registration_closes_at: None,
            created_at: now,
            updated_at: now,
        };
        let participant = Participant {
            id: Uuid::new_v4(),
            tenant_id,
            event_id: event.id,
            email: "a@example.com".into(),
            name: "Alice".into(),
            phone: None,
            registration_number: 1,
            waitlisted: false,
            check_in_state: CheckInState::Registered,
            checked_in_at: None,
            checked_in_by: None,
            created_at: now,
        };
        let token = token::encode(&TokenClaims {
            tenant_id,
            event_id: event.id,
            participant_id: participant.id,
        });

        let store = Arc::new(MemoryStore::new());
        store.seed_tenant(tenant).await;
        store.seed_event(event.clone()).await;
        store.seed_participant(participant.clone()).await;

        Fixture {
            service: CheckInService::new(store.clone()),
            store,
            tenant_id,
            event,
            participant,
            token,
        }
    }

    #[tokio::test]
    async fn token_check_in_then_replay() {
        let f = fixture().await;

        let first = f
            .service
            .check_in(f.tenant_id, "staff-1", CheckInTarget::Token {
                token: f.token.clone(),
                event_id: None,
            })
            .await
            .unwrap();
        assert_eq!(first.status, CheckInStatus::CheckedIn);
        assert!(first.checked_in_at.is_some());

        let replay = f
            .service
            .check_in(f.tenant_id, "staff-2", CheckInTarget::Token {
                token: f.token.clone(),
                event_id: None,
            })
            .await
            .unwrap();
        assert_eq!(replay.status, CheckInStatus::AlreadyChecked);
        assert_eq!(replay.checked_in_at, first.checked_in_at);

        let event = f.store.event_by_id(f.event.id).await.unwrap().unwrap();
        assert_eq!(event.checked_in_count, 1);
    }

    #[tokio::test]
    async fn direct_variant_checks_in() {
        let f = fixture().await;

        let receipt = f
            .service
            .check_in(f.tenant_id, "staff-1", CheckInTarget::Direct {
                event_id: f.event.id,
                participant_id: f.participant.id,
            })
            .await
            .unwrap();
        assert_eq!(receipt.status, CheckInStatus::CheckedIn);
        assert_eq!(receipt.name, "Alice");
    }

    #[tokio::test]
    async fn cross_tenant_token_is_a_mismatch_not_a_miss() {
        let f = fixture().await;

        let err = f
            .service
            .check_in(Uuid::new_v4(), "staff-1", CheckInTarget::Token {
                token: f.token.clone(),
                event_id: None,
            })
            .await
            .unwrap_err();
        assert!(matches!(err, CheckInError::TenantMismatch));
    }

    #[tokio::test]
    async fn scanner_pinned_to_other_event_rejects_token() {
        let f = fixture().await;

        let err = f
            .service
            .check_in(f.tenant_id, "staff-1", CheckInTarget::Token {
                token: f.token.clone(),
                event_id: Some(Uuid::new_v4()),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, CheckInError::WrongEvent));
    }

    #[tokio::test]
    async fn constructed_token_for_unknown_participant_misses() {
        let f = fixture().await;
        let forged = token::encode(&TokenClaims {
            tenant_id: f.tenant_id,
            event_id: f.event.id,
            participant_id: Uuid::new_v4(),
        });

        let err = f
            .service
            .check_in(f.tenant_id, "staff-1", CheckInTarget::Token {
                token: forged,
                event_id: None,
            })
            .await
            .unwrap_err();
        assert!(matches!(err, CheckInError::NotFound));
    }

    #[tokio::test]
    async fn token_with_wrong_tenant_field_misses() {
        let f = fixture().await;
        // Real participant id, forged tenant field: never issued, so it
        // must not resolve.
        let forged = token::encode(&TokenClaims {
            tenant_id: Uuid::new_v4(),
            event_id: f.event.id,
            participant_id: f.participant.id,
        });

        let err = f
            .service
            .check_in(f.tenant_id, "staff-1", CheckInTarget::Token {
                token: forged,
                event_id: None,
            })
            .await
            .unwrap_err();
        assert!(matches!(err, CheckInError::NotFound));
    }

    #[tokio::test]
    async fn malformed_token_is_an_input_error() {
        let f = fixture().await;

        let err = f
            .service
            .check_in(f.tenant_id, "staff-1", CheckInTarget::Token {
                token: "garbage".into(),
                event_id: None,
            })
            .await
            .unwrap_err();
        assert!(matches!(err, CheckInError::InvalidToken(_)));
    }
}
