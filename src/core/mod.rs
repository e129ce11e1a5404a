pub mod admission;
pub mod checkin;
pub mod guard;

pub use admission::{Admission, AdmissionController, AdmissionMode, NotOpenReason};
pub use checkin::{CheckInError, CheckInMachine, CheckInOutcome};
pub use guard::{verify_tenant, GuardError};
