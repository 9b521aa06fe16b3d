//! Account Provisioning
//!
//! Creates a login identity, its profile record and its role assignment.
//! The engine runs all three steps in one transaction, so a failure leaves
//! no partially provisioned account behind.

use crate::engine::{NewIdentity, Session};
use crate::error::{ClosetlyError, Result};

/// Longest accepted username or password, in characters
pub const MAX_FIELD_LEN: usize = 20;

/// Whether `value` is longer than [`MAX_FIELD_LEN`] characters
#[must_use]
pub fn exceeds_field_len(value: &str) -> bool {
    value.chars().count() > MAX_FIELD_LEN
}

/// Reject a field longer than [`MAX_FIELD_LEN`] characters
pub fn check_field_len(field: &str, value: &str) -> Result<()> {
    if exceeds_field_len(value) {
        return Err(ClosetlyError::invalid_input(format!(
            "{field} must be {MAX_FIELD_LEN} characters or less"
        )));
    }
    Ok(())
}

/// Create `identity` over `session` and return its username
pub async fn create_identity<S: Session>(session: &mut S, identity: &NewIdentity) -> Result<String> {
    check_field_len("Username", &identity.username)?;
    check_field_len("Password", &identity.password)?;

    session.create_identity(identity).await.map_err(|err| {
        tracing::error!(
            username = %identity.username,
            account = %session.account(),
            error = %err,
            "account provisioning failed"
        );
        err
    })?;

    tracing::info!(username = %identity.username, role = %identity.role, "account provisioned");
    Ok(identity.username.clone())
}
