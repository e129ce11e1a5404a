// Postgres-backed store. Every conditional write here is a single UPDATE
// with the predicate in the WHERE clause, so the condition and the mutation
// share one linearization point inside the database. No code path does a
// read followed by a dependent unconditional write.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::{PgPool, PgPoolOptions, PgRow};
use sqlx::Row;
use tracing::info;
use uuid::Uuid;

use crate::config::AppConfig;

use super::models::{CheckInState, Event, EventStatus, Participant, Tenant, TenantStatus};
use super::{
    CheckInTransition, Condition, CounterKey, CounterKind, CounterStore, RegistrationStore,
    StoreError,
};

const UNIQUE_VIOLATION: &str = "23505";

pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Build a pool from `DATABASE_URL` and run pending migrations.
    pub async fn connect(database_url: &str, config: &AppConfig) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(config.database.max_connections)
            .acquire_timeout(Duration::from_secs(config.database.connection_timeout_secs))
            .connect(database_url)
            .await?;

        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .map_err(|e| StoreError::Database(format!("migration failed: {}", e)))?;

        info!("Connected database pool ({} max connections)", config.database.max_connections);
        Ok(Self { pool })
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

fn counter_column(kind: CounterKind) -> &'static str {
    match kind {
        CounterKind::Registered => "registered_count",
        CounterKind::CheckedIn => "checked_in_count",
        CounterKind::Waitlist => "waitlist_count",
    }
}

fn parse_status<T>(raw: &str, parse: impl Fn(&str) -> Option<T>, what: &str) -> Result<T, StoreError> {
    parse(raw).ok_or_else(|| StoreError::Database(format!("unknown {} value: {}", what, raw)))
}

fn tenant_from_row(row: &PgRow) -> Result<Tenant, StoreError> {
    let status: String = row.try_get("status")?;
    Ok(Tenant {
        id: row.try_get("id")?,
        slug: row.try_get("slug")?,
        name: row.try_get("name")?,
        status: parse_status(&status, TenantStatus::parse, "tenant status")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

fn event_from_row(row: &PgRow) -> Result<Event, StoreError> {
    let status: String = row.try_get("status")?;
    Ok(Event {
        id: row.try_get("id")?,
        tenant_id: row.try_get("tenant_id")?,
        name: row.try_get("name")?,
        status: parse_status(&status, EventStatus::parse, "event status")?,
        capacity: row.try_get("capacity")?,
        registered_count: row.try_get("registered_count")?,
        checked_in_count: row.try_get("checked_in_count")?,
        waitlist_count: row.try_get("waitlist_count")?,
        waitlist_enabled: row.try_get("waitlist_enabled")?,
        registration_opens_at: row.try_get("registration_opens_at")?,
        registration_closes_at: row.try_get("registration_closes_at")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

fn participant_from_row(row: &PgRow) -> Result<Participant, StoreError> {
    let state: String = row.try_get("check_in_state")?;
    Ok(Participant {
        id: row.try_get("id")?,
        tenant_id: row.try_get("tenant_id")?,
        event_id: row.try_get("event_id")?,
        email: row.try_get("email")?,
        name: row.try_get("name")?,
        phone: row.try_get("phone")?,
        registration_number: row.try_get("registration_number")?,
        waitlisted: row.try_get("waitlisted")?,
        check_in_state: parse_status(&state, CheckInState::parse, "check_in_state")?,
        checked_in_at: row.try_get("checked_in_at")?,
        checked_in_by: row.try_get("checked_in_by")?,
        created_at: row.try_get("created_at")?,
    })
}

#[async_trait]
impl CounterStore for PgStore {
    async fn conditional_increment(
        &self,
        key: CounterKey,
        delta: i64,
        condition: Condition,
    ) -> Result<i64, StoreError> {
        let col = counter_column(key.counter);
        // Counter column names are compile-time constants, never user input.
        let (sql, guard): (String, Option<i64>) = match condition {
            Condition::None => (
                format!(
                    "UPDATE events SET {col} = {col} + $2, updated_at = now() \
                     WHERE id = $1 RETURNING {col}"
                ),
                None,
            ),
            Condition::ResultAtMost(n) => (
                format!(
                    "UPDATE events SET {col} = {col} + $2, updated_at = now() \
                     WHERE id = $1 AND {col} + $2 <= $3 RETURNING {col}"
                ),
                Some(n),
            ),
            Condition::CurrentEquals(n) => (
                format!(
                    "UPDATE events SET {col} = {col} + $2, updated_at = now() \
                     WHERE id = $1 AND {col} = $3 RETURNING {col}"
                ),
                Some(n),
            ),
        };

        let mut query = sqlx::query(&sql).bind(key.event_id).bind(delta);
        if let Some(n) = guard {
            query = query.bind(n);
        }

        let row = query.fetch_optional(&self.pool).await?;
        match row {
            Some(row) => Ok(row.try_get::<i64, _>(0)?),
            // Callers load the event before incrementing, so a missing row
            // under a guarded update means the predicate lost.
            None => match condition {
                Condition::None => Err(StoreError::NotFound(format!("event {}", key.event_id))),
                _ => Err(StoreError::ConditionFailed),
            },
        }
    }
}

#[async_trait]
impl RegistrationStore for PgStore {
    async fn tenant_by_slug(&self, slug: &str) -> Result<Option<Tenant>, StoreError> {
        let row = sqlx::query(
            "SELECT id, slug, name, status, created_at, updated_at FROM tenants WHERE slug = $1",
        )
        .bind(slug)
        .fetch_optional(&self.pool)
        .await?;
        row.as_ref().map(tenant_from_row).transpose()
    }

    async fn tenant_by_id(&self, id: Uuid) -> Result<Option<Tenant>, StoreError> {
        let row = sqlx::query(
            "SELECT id, slug, name, status, created_at, updated_at FROM tenants WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        row.as_ref().map(tenant_from_row).transpose()
    }

    async fn event_by_id(&self, id: Uuid) -> Result<Option<Event>, StoreError> {
        let row = sqlx::query(
            "SELECT id, tenant_id, name, status, capacity, registered_count, checked_in_count, \
                    waitlist_count, waitlist_enabled, registration_opens_at, \
                    registration_closes_at, created_at, updated_at \
             FROM events WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        row.as_ref().map(event_from_row).transpose()
    }

    async fn participant_by_id(&self, id: Uuid) -> Result<Option<Participant>, StoreError> {
        let row = sqlx::query(
            "SELECT id, tenant_id, event_id, email, name, phone, registration_number, \
                    waitlisted, check_in_state, checked_in_at, checked_in_by, created_at \
             FROM participants WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        row.as_ref().map(participant_from_row).transpose()
    }

    async fn participant_by_email(
        &self,
        event_id: Uuid,
        email: &str,
    ) -> Result<Option<Participant>, StoreError> {
        let row = sqlx::query(
            "SELECT id, tenant_id, event_id, email, name, phone, registration_number, \
                    waitlisted, check_in_state, checked_in_at, checked_in_by, created_at \
             FROM participants WHERE event_id = $1 AND lower(email) = $2",
        )
        .bind(event_id)
        .bind(Participant::normalized_email(email))
        .fetch_optional(&self.pool)
        .await?;
        row.as_ref().map(participant_from_row).transpose()
    }

    async fn insert_participant(&self, participant: &Participant) -> Result<(), StoreError> {
        let result = sqlx::query(
            "INSERT INTO participants \
                (id, tenant_id, event_id, email, name, phone, registration_number, \
                 waitlisted, check_in_state, checked_in_at, checked_in_by, created_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)",
        )
        .bind(participant.id)
        .bind(participant.tenant_id)
        .bind(participant.event_id)
        .bind(&participant.email)
        .bind(&participant.name)
        .bind(&participant.phone)
        .bind(participant.registration_number)
        .bind(participant.waitlisted)
        .bind(participant.check_in_state.as_str())
        .bind(participant.checked_in_at)
        .bind(&participant.checked_in_by)
        .bind(participant.created_at)
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => Ok(()),
            Err(sqlx::Error::Database(db)) if db.code().as_deref() == Some(UNIQUE_VIOLATION) => {
                Err(StoreError::DuplicateEmail(participant.email.clone()))
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn transition_check_in(
        &self,
        participant_id: Uuid,
        staff_id: &str,
        at: DateTime<Utc>,
    ) -> Result<CheckInTransition, StoreError> {
        // Single test-and-set: the state predicate rides in the WHERE clause,
        // so exactly one of N concurrent attempts gets a row back.
        let row = sqlx::query(
            "UPDATE participants \
             SET check_in_state = 'checked_in', checked_in_at = $2, checked_in_by = $3 \
             WHERE id = $1 AND check_in_state = 'registered' \
             RETURNING checked_in_at",
        )
        .bind(participant_id)
        .bind(at)
        .bind(staff_id)
        .fetch_optional(&self.pool)
        .await?;

        if let Some(row) = row {
            let checked_in_at: DateTime<Utc> = row.try_get("checked_in_at")?;
            return Ok(CheckInTransition::Applied { checked_in_at });
        }

        // Lost the race or replayed a scan. A follow-up read only classifies
        // the outcome; the transition itself was decided above.
        let existing = sqlx::query(
            "SELECT checked_in_at FROM participants WHERE id = $1",
        )
        .bind(participant_id)
        .fetch_optional(&self.pool)
        .await?;

        match existing {
            Some(row) => Ok(CheckInTransition::AlreadyApplied {
                checked_in_at: row.try_get("checked_in_at")?,
            }),
            None => Ok(CheckInTransition::NotFound),
        }
    }

    async fn participant_count(&self, event_id: Uuid) -> Result<i64, StoreError> {
        let row = sqlx::query(
            "SELECT COUNT(*) AS count FROM participants WHERE event_id = $1 AND waitlisted = false",
        )
        .bind(event_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(row.try_get("count")?)
    }

    async fn health_check(&self) -> Result<(), StoreError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}
