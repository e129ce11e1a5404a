// Leaked-reservation reconciliation. A request that dies between reserving a
// capacity slot and persisting its participant row leaves registered_count
// above the real row count. This sweep repairs the drift off the hot path,
// guarded so it can never race a live admission into a lost update.

use std::sync::Arc;

use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;

use crate::core::guard::{self, GuardError};
use crate::store::{Condition, CounterKey, RegistrationStore, StoreError};

#[derive(Debug, Error)]
pub enum ReconcileError {
    #[error("event not found")]
    EventNotFound,
    #[error("event belongs to a different tenant")]
    TenantMismatch,
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl From<GuardError> for ReconcileError {
    fn from(_: GuardError) -> Self {
        ReconcileError::TenantMismatch
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ReconcileReport {
    pub event_id: Uuid,
    pub registered_count: i64,
    pub persisted_participants: i64,
    pub drift: i64,
    pub repaired: bool,
}

pub struct ReconcileService {
    store: Arc<dyn RegistrationStore>,
}

impl ReconcileService {
    pub fn new(store: Arc<dyn RegistrationStore>) -> Self {
        Self { store }
    }

    pub async fn reconcile_event(
        &self,
        caller_tenant: Uuid,
        event_id: Uuid,
    ) -> Result<ReconcileReport, ReconcileError> {
        let event = self
            .store
            .event_by_id(event_id)
            .await?
            .ok_or(ReconcileError::EventNotFound)?;
        guard::verify_tenant(caller_tenant, event.tenant_id)?;

        let persisted = self.store.participant_count(event_id).await?;
        let drift = event.registered_count - persisted;

        if drift < 0 {
            // More rows than counter: something wrote around the admission
            // controller. Never lower rows to match; just report it.
            tracing::error!(
                event = %event_id,
                counter = event.registered_count,
                rows = persisted,
                "registered_count below persisted participant rows"
            );
            return Ok(ReconcileReport {
                event_id,
                registered_count: event.registered_count,
                persisted_participants: persisted,
                drift,
                repaired: false,
            });
        }

        let mut repaired = false;
        if drift > 0 {
            // CAS on the observed counter value: if an admission landed in
            // between, skip this pass rather than clobber it.
            match self
                .store
                .conditional_increment(
                    CounterKey::registered(event_id),
                    -drift,
                    Condition::CurrentEquals(event.registered_count),
                )
                .await
            {
                Ok(_) => {
                    repaired = true;
                    tracing::info!(event = %event_id, drift, "released leaked reservations");
                }
                Err(StoreError::ConditionFailed) => {
                    tracing::debug!(event = %event_id, "counter moved during sweep, skipping");
                }
                Err(e) => return Err(e.into()),
            }
        }

        Ok(ReconcileReport {
            event_id,
            registered_count: event.registered_count,
            persisted_participants: persisted,
            drift,
            repaired,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::models::{CheckInState, Event, EventStatus, Participant};
    use crate::store::MemoryStore;
    use chrono::Utc;

    fn event(tenant_id: Uuid, registered_count: i64) -> Event {
        let now = Utc::now();
        Event {
            id: Uuid::new_v4(),
            tenant_id,
            name: "expo".into(),
            status: EventStatus::Published,
            capacity: 100,
            registered_count,
            checked_in_count: 0,
            waitlist_count: 0,
            waitlist_enabled: false,
            registration_opens_at: None,
            registration_closes_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    fn participant(tenant_id: Uuid, event_id: Uuid, n: i64) -> Participant {
        let now = Utc::now();
        Participant {
            id: Uuid::new_v4(),
            tenant_id,
            event_id,
            email: format!("p{}@example.com", n),
            name: format!("P{}", n),
            phone: None,
            registration_number: n,
            waitlisted: false,
            check_in_state: CheckInState::Registered,
            checked_in_at: None,
            checked_in_by: None,
            created_at: now,
        }
    }

    #[tokio::test]
    async fn repairs_leaked_reservations() {
        let tenant_id = Uuid::new_v4();
        // Counter says 3 but only 2 rows made it
        let ev = event(tenant_id, 3);
        let store = Arc::new(MemoryStore::new());
        store.seed_event(ev.clone()).await;
        store.seed_participant(participant(tenant_id, ev.id, 1)).await;
        store.seed_participant(participant(tenant_id, ev.id, 2)).await;

        let service = ReconcileService::new(store.clone());
        let report = service.reconcile_event(tenant_id, ev.id).await.unwrap();
        assert_eq!(report.drift, 1);
        assert!(report.repaired);

        let stored = store.event_by_id(ev.id).await.unwrap().unwrap();
        assert_eq!(stored.registered_count, 2);
    }

    #[tokio::test]
    async fn clean_event_reports_zero_drift() {
        let tenant_id = Uuid::new_v4();
        let ev = event(tenant_id, 1);
        let store = Arc::new(MemoryStore::new());
        store.seed_event(ev.clone()).await;
        store.seed_participant(participant(tenant_id, ev.id, 1)).await;

        let service = ReconcileService::new(store.clone());
        let report = service.reconcile_event(tenant_id, ev.id).await.unwrap();
        assert_eq!(report.drift, 0);
        assert!(!report.repaired);
    }

    #[tokio::test]
    async fn cross_tenant_sweep_is_rejected() {
        let tenant_id = Uuid::new_v4();
        let ev = event(tenant_id, 0);
        let store = Arc::new(MemoryStore::new());
        store.seed_event(ev.clone()).await;

        let service = ReconcileService::new(store);
        let err = service.reconcile_event(Uuid::new_v4(), ev.id).await.unwrap_err();
        assert!(matches!(err, ReconcileError::TenantMismatch));
    }

    #[tokio::test]
    async fn negative_drift_is_reported_but_never_repaired() {
        let tenant_id = Uuid::new_v4();
        let ev = event(tenant_id, 0);
        let store = Arc::new(MemoryStore::new());
        store.seed_event(ev.clone()).await;
        store.seed_participant(participant(tenant_id, ev.id, 1)).await;

        let service = ReconcileService::new(store.clone());
        let report = service.reconcile_event(tenant_id, ev.id).await.unwrap();
        assert_eq!(report.drift, -1);
        assert!(!report.repaired);

        let stored = store.event_by_id(ev.id).await.unwrap().unwrap();
        assert_eq!(stored.registered_count, 0);
    }
}
