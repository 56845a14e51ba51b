//! Ownership guard.
//!
//! Binds a parent to its owning principal. The caller is already
//! authenticated; this only authorizes.

use tally_shared::types::UserId;

use super::error::LedgerError;
use super::types::Parent;

/// Fails with `AccessDenied` unless `principal_id` owns `parent`.
///
/// # Errors
///
/// Returns `LedgerError::AccessDenied` on owner mismatch.
pub fn assert_owner(parent: &Parent, principal_id: UserId) -> Result<(), LedgerError> {
    if parent.owner_id == principal_id {
        Ok(())
    } else {
        Err(LedgerError::AccessDenied {
            parent_id: parent.id,
            principal_id,
        })
    }
}

/// Guards a parent for an operation that needs it live.
///
/// Ownership is checked before the deleted flag so a foreign parent is
/// reported as `AccessDenied` regardless of its state.
///
/// # Errors
///
/// Returns `AccessDenied` on owner mismatch, `ParentNotFound` if deleted.
pub fn assert_live_owner(parent: &Parent, principal_id: UserId) -> Result<(), LedgerError> {
    assert_owner(parent, principal_id)?;
    if parent.deleted {
        return Err(LedgerError::ParentNotFound(parent.id));
    }
    Ok(())
}

/// Returns true if the parent is visible to the principal in bulk reads.
#[must_use]
pub fn is_visible_to(parent: &Parent, principal_id: UserId) -> bool {
    assert_live_owner(parent, principal_id).is_ok()
}
