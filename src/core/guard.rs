// Tenant isolation guard.
//
// Every record resolved through a path that is not already tenant-scoped in
// its query predicate (token lookups, direct participant-id lookups) must
// pass through here before anything is mutated or returned. Verify first,
// mutate after; never the other way around.

use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum GuardError {
    #[error("record belongs to a different tenant")]
    TenantMismatch,
}

/// Confirm a resolved record belongs to the caller's authenticated tenant.
pub fn verify_tenant(caller_tenant: Uuid, record_tenant: Uuid) -> Result<(), GuardError> {
    if caller_tenant == record_tenant {
        Ok(())
    } else {
        tracing::warn!(
            caller = %caller_tenant,
            record = %record_tenant,
            "tenant isolation check rejected cross-tenant access"
        );
        Err(GuardError::TenantMismatch)
    }
}
