// In-memory store double. One mutex guards the whole state, so every
// conditional write has the same single linearization point the Postgres
// implementation gets from a one-statement UPDATE. Used by the test suite to
// exercise the race properties without a live database, and usable for local
// development.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::Mutex;
use uuid::Uuid;

use super::models::{CheckInState, Event, Participant, Tenant};
use super::{
    CheckInTransition, Condition, CounterKey, CounterKind, CounterStore, RegistrationStore,
    StoreError,
};

#[derive(Default)]
struct Inner {
    tenants: HashMap<Uuid, Tenant>,
    events: HashMap<Uuid, Event>,
    participants: HashMap<Uuid, Participant>,
}

#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn seed_tenant(&self, tenant: Tenant) {
        self.inner.lock().await.tenants.insert(tenant.id, tenant);
    }

    pub async fn seed_event(&self, event: Event) {
        self.inner.lock().await.events.insert(event.id, event);
    }

    pub async fn seed_participant(&self, participant: Participant) {
        self.inner
            .lock()
            .await
            .participants
            .insert(participant.id, participant);
    }
}

fn counter_field(event: &mut Event, kind: CounterKind) -> &mut i64 {
    match kind {
        CounterKind::Registered => &mut event.registered_count,
        CounterKind::CheckedIn => &mut event.checked_in_count,
        CounterKind::Waitlist => &mut event.waitlist_count,
    }
}

#[async_trait]
impl CounterStore for MemoryStore {
    async fn conditional_increment(
        &self,
        key: CounterKey,
        delta: i64,
        condition: Condition,
    ) -> Result<i64, StoreError> {
        let mut inner = self.inner.lock().await;
        let event = inner
            .events
            .get_mut(&key.event_id)
            .ok_or_else(|| StoreError::NotFound(format!("event {}", key.event_id)))?;

        let field = counter_field(event, key.counter);
        let current = *field;
        match condition {
            Condition::None => {}
            Condition::ResultAtMost(n) => {
                if current + delta > n {
                    return Err(StoreError::ConditionFailed);
                }
            }
            Condition::CurrentEquals(n) => {
                if current != n {
                    return Err(StoreError::ConditionFailed);
                }
            }
        }
        *field = current + delta;
        event.updated_at = Utc::now();
        Ok(current + delta)
    }
}

#[async_trait]
impl RegistrationStore for MemoryStore {
    async fn tenant_by_slug(&self, slug: &str) -> Result<Option<Tenant>, StoreError> {
        let inner = self.inner.lock().await;
        Ok(inner.tenants.values().find(|t| t.slug == slug).cloned())
    }

    async fn tenant_by_id(&self, id: Uuid) -> Result<Option<Tenant>, StoreError> {
        Ok(self.inner.lock().await.tenants.get(&id).cloned())
    }

    async fn event_by_id(&self, id: Uuid) -> Result<Option<Event>, StoreError> {
        Ok(self.inner.lock().await.events.get(&id).cloned())
    }

    async fn participant_by_id(&self, id: Uuid) -> Result<Option<Participant>, StoreError> {
        Ok(self.inner.lock().await.participants.get(&id).cloned())
    }

    async fn participant_by_email(
        &self,
        event_id: Uuid,
        email: &str,
    ) -> Result<Option<Participant>, StoreError> {
        let normalized = Participant::normalized_email(email);
        let inner = self.inner.lock().await;
        Ok(inner
            .participants
            .values()
            .find(|p| p.event_id == event_id && Participant::normalized_email(&p.email) == normalized)
            .cloned())
    }

    async fn insert_participant(&self, participant: &Participant) -> Result<(), StoreError> {
        let normalized = Participant::normalized_email(&participant.email);
        let mut inner = self.inner.lock().await;
        let duplicate = inner.participants.values().any(|p| {
            p.event_id == participant.event_id
                && Participant::normalized_email(&p.email) == normalized
        });
        if duplicate {
            return Err(StoreError::DuplicateEmail(participant.email.clone()));
        }
        inner
            .participants
            .insert(participant.id, participant.clone());
        Ok(())
    }

    async fn transition_check_in(
        &self,
        participant_id: Uuid,
        staff_id: &str,
        at: DateTime<Utc>,
    ) -> Result<CheckInTransition, StoreError> {
        let mut inner = self.inner.lock().await;
        let participant = match inner.participants.get_mut(&participant_id) {
            Some(p) => p,
            None => return Ok(CheckInTransition::NotFound),
        };
        match participant.check_in_state {
            CheckInState::Registered => {
                participant.check_in_state = CheckInState::CheckedIn;
                participant.checked_in_at = Some(at);
                participant.checked_in_by = Some(staff_id.to_string());
                Ok(CheckInTransition::Applied { checked_in_at: at })
            }
            CheckInState::CheckedIn => Ok(CheckInTransition::AlreadyApplied {
                checked_in_at: participant.checked_in_at,
            }),
        }
    }

    async fn participant_count(&self, event_id: Uuid) -> Result<i64, StoreError> {
        let inner = self.inner.lock().await;
        Ok(inner
            .participants
            .values()
            .filter(|p| p.event_id == event_id && !p.waitlisted)
            .count() as i64)
    }

    async fn health_check(&self) -> Result<(), StoreError> {
        Ok(())
    }
}
