pub mod checkin;
pub mod reconcile;
pub mod registration;

pub use checkin::{CheckInReceipt, CheckInService, CheckInStatus, CheckInTarget};
pub use reconcile::{ReconcileError, ReconcileReport, ReconcileService};
pub use registration::{
    RegistrationError, RegistrationReceipt, RegistrationRequest, RegistrationService,
    RegistrationStatus,
};
