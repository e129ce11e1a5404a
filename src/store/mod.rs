pub mod memory;
pub mod models;
pub mod postgres;

pub use memory::MemoryStore;
pub use models::{CheckInState, Event, EventStatus, Participant, Tenant, TenantStatus};
pub use postgres::PgStore;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum StoreError {
    /// The conditional write's predicate did not hold; nothing was applied.
    #[error("condition failed, no write applied")]
    ConditionFailed,

    #[error("not found: {0}")]
    NotFound(String),

    /// Unique (event, email) constraint violation on participant insert.
    #[error("duplicate registration for {0}")]
    DuplicateEmail(String),

    #[error("database error: {0}")]
    Database(String),
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        StoreError::Database(err.to_string())
    }
}

/// Which per-event counter a conditional increment targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CounterKind {
    Registered,
    CheckedIn,
    Waitlist,
}

#[derive(Debug, Clone, Copy)]
pub struct CounterKey {
    pub event_id: Uuid,
    pub counter: CounterKind,
}

impl CounterKey {
    pub fn registered(event_id: Uuid) -> Self {
        Self { event_id, counter: CounterKind::Registered }
    }

    pub fn checked_in(event_id: Uuid) -> Self {
        Self { event_id, counter: CounterKind::CheckedIn }
    }

    pub fn waitlist(event_id: Uuid) -> Self {
        Self { event_id, counter: CounterKind::Waitlist }
    }
}

/// Predicate evaluated atomically with the increment, against either the
/// resulting value or the current stored value.
#[derive(Debug, Clone, Copy)]
pub enum Condition {
    /// Unconditional (still a single write, never read-then-write).
    None,
    /// Apply only if `current + delta <= n`. The capacity gate.
    ResultAtMost(i64),
    /// Apply only if the stored value still equals `n`. Used by the
    /// reconciliation sweep so a repair cannot race a live admission.
    CurrentEquals(i64),
}

/// Outcome of the one-way check-in transition attempt.
#[derive(Debug, Clone)]
pub enum CheckInTransition {
    /// This call performed the transition.
    Applied { checked_in_at: DateTime<Utc> },
    /// The participant was already checked in; nothing was written.
    AlreadyApplied { checked_in_at: Option<DateTime<Utc>> },
    NotFound,
}

/// The atomic increment primitive everything else leans on. Implementations
/// must evaluate the condition and apply the delta as one linearizable step;
/// composing it from a separate read and write re-opens the races this
/// crate exists to close.
#[async_trait]
pub trait CounterStore: Send + Sync {
    async fn conditional_increment(
        &self,
        key: CounterKey,
        delta: i64,
        condition: Condition,
    ) -> Result<i64, StoreError>;
}

/// Full persistence surface for the registration and check-in flows.
#[async_trait]
pub trait RegistrationStore: CounterStore {
    async fn tenant_by_slug(&self, slug: &str) -> Result<Option<Tenant>, StoreError>;

    async fn tenant_by_id(&self, id: Uuid) -> Result<Option<Tenant>, StoreError>;

    async fn event_by_id(&self, id: Uuid) -> Result<Option<Event>, StoreError>;

    async fn participant_by_id(&self, id: Uuid) -> Result<Option<Participant>, StoreError>;

    /// Lookup by the per-event unique key (case-insensitive email).
    async fn participant_by_email(
        &self,
        event_id: Uuid,
        email: &str,
    ) -> Result<Option<Participant>, StoreError>;

    async fn insert_participant(&self, participant: &Participant) -> Result<(), StoreError>;

    /// Conditional `registered -> checked_in` transition. Must be a single
    /// test-and-set against the stored state: under concurrent calls for the
    /// same participant exactly one gets `Applied`.
    async fn transition_check_in(
        &self,
        participant_id: Uuid,
        staff_id: &str,
        at: DateTime<Utc>,
    ) -> Result<CheckInTransition, StoreError>;

    /// Number of persisted non-waitlist participant rows for an event, for
    /// the leaked-reservation reconciliation sweep.
    async fn participant_count(&self, event_id: Uuid) -> Result<i64, StoreError>;

    async fn health_check(&self) -> Result<(), StoreError>;
}
