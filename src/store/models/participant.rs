use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Row in the `participants` table. Email is unique per event,
/// case-insensitive. After creation, `check_in_state`, `checked_in_at` and
/// `checked_in_by` are the only mutable fields, and only the check-in state
/// machine mutates them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Participant {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub event_id: Uuid,
    pub email: String,
    pub name: String,
    pub phone: Option<String>,
    pub registration_number: i64,
    pub waitlisted: bool,
    pub check_in_state: CheckInState,
    pub checked_in_at: Option<DateTime<Utc>>,
    pub checked_in_by: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Canonical two-value representation. The transition is one-way:
/// `Registered -> CheckedIn`, never back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckInState {
    Registered,
    CheckedIn,
}

impl CheckInState {
    pub fn as_str(&self) -> &'static str {
        match self {
            CheckInState::Registered => "registered",
            CheckInState::CheckedIn => "checked_in",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "registered" => Some(CheckInState::Registered),
            "checked_in" => Some(CheckInState::CheckedIn),
            _ => None,
        }
    }
}

impl Participant {
    /// Normalized form used by the per-event uniqueness constraint.
    pub fn normalized_email(email: &str) -> String {
        email.trim().to_lowercase()
    }
}
