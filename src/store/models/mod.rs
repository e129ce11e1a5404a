pub mod event;
pub mod participant;
pub mod tenant;

pub use event::{Event, EventStatus};
pub use participant::{CheckInState, Participant};
pub use tenant::{Tenant, TenantStatus};
