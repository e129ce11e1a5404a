// Capacity-bounded admission.
//
// The capacity gate and the increment are one conditional store operation;
// there is no point where a value read here is compared and then written
// back. Two concurrent admissions against the last free slot means one gets
// the slot and the other gets ConditionFailed, never an overshoot.

use chrono::{DateTime, Utc};
use thiserror::Error;
use uuid::Uuid;

use crate::store::models::{Event, EventStatus};
use crate::store::{Condition, CounterKey, CounterStore, StoreError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdmissionMode {
    /// Contend for a capacity slot.
    Standard,
    /// Unbounded waitlist counter; never contends with the capacity gate.
    Waitlist,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Admission {
    /// Slot reserved; the counter value doubles as the registration number.
    Admitted { registration_number: i64 },
    Waitlisted { position: i64 },
    CapacityFull,
    NotOpen(NotOpenReason),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum NotOpenReason {
    #[error("event is not published")]
    NotPublished,
    #[error("event is cancelled")]
    Cancelled,
    #[error("registration has not opened yet")]
    NotYetOpen,
    #[error("registration window has closed")]
    Closed,
}

pub struct AdmissionController<'a> {
    counters: &'a dyn CounterStore,
}

impl<'a> AdmissionController<'a> {
    pub fn new(counters: &'a dyn CounterStore) -> Self {
        Self { counters }
    }

    /// Run the ordered admission gates against an already-resolved event.
    ///
    /// Gate order: published status, registration window, then the atomic
    /// bounded increment. The caller decides whether a `CapacityFull` result
    /// warrants a second call in `Waitlist` mode.
    pub async fn try_admit(
        &self,
        event: &Event,
        now: DateTime<Utc>,
        mode: AdmissionMode,
    ) -> Result<Admission, StoreError> {
        match event.status {
            EventStatus::Published => {}
            EventStatus::Draft => return Ok(Admission::NotOpen(NotOpenReason::NotPublished)),
            EventStatus::Cancelled => return Ok(Admission::NotOpen(NotOpenReason::Cancelled)),
        }

        if let Some(opens) = event.registration_opens_at {
            if now < opens {
                return Ok(Admission::NotOpen(NotOpenReason::NotYetOpen));
            }
        }
        if let Some(closes) = event.registration_closes_at {
            if now > closes {
                return Ok(Admission::NotOpen(NotOpenReason::Closed));
            }
        }

        match mode {
            AdmissionMode::Standard => {
                let condition = if event.is_unlimited() {
                    Condition::None
                } else {
                    Condition::ResultAtMost(event.capacity)
                };
                match self
                    .counters
                    .conditional_increment(CounterKey::registered(event.id), 1, condition)
                    .await
                {
                    Ok(n) => Ok(Admission::Admitted { registration_number: n }),
                    Err(StoreError::ConditionFailed) => Ok(Admission::CapacityFull),
                    Err(e) => Err(e),
                }
            }
            AdmissionMode::Waitlist => {
                let position = self
                    .counters
                    .conditional_increment(CounterKey::waitlist(event.id), 1, Condition::None)
                    .await?;
                Ok(Admission::Waitlisted { position })
            }
        }
    }

    /// Compensating decrement: releases a slot reserved by `try_admit` when
    /// the participant row could not be persisted afterwards.
    pub async fn release(&self, event_id: Uuid, mode: AdmissionMode) -> Result<(), StoreError> {
        let key = match mode {
            AdmissionMode::Standard => CounterKey::registered(event_id),
            AdmissionMode::Waitlist => CounterKey::waitlist(event_id),
        };
        self.counters
            .conditional_increment(key, -1, Condition::None)
            .await?;
        Ok(())
    }
}
