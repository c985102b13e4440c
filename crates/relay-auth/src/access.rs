//! Access decisions for the `requests` resource.
//!
//! Visibility is computed once as a [`RequestFilter`] and used both to
//! restrict list queries and to check single rows, so the two can never
//! disagree.

use relay_types::models::{RequestFilter, RequestRecord, Role, User};

use crate::error::AuthError;
use crate::store::UserStore;

/// Every authenticated user may create requests attributed to themselves.
pub fn can_create_request(_user: &User) -> bool {
    true
}

/// Rows `user` may read:
/// - `Admin`: everything, including ownerless bot rows
/// - `Manager`: rows owned by direct reports, not the manager's own
/// - `User`: rows owned by the user
///
/// A stored role outside the closed set is denied.
pub fn scope_for_read(store: &dyn UserStore, user: &User) -> Result<RequestFilter, AuthError> {
    let role = user
        .role()
        .map_err(|_| AuthError::UnknownRole(user.role.clone()))?;

    let filter = match role {
        Role::Admin => RequestFilter::All,
        Role::Manager => RequestFilter::OwnedByAny(store.direct_reports(user.id)?),
        Role::User => RequestFilter::OwnedBy(user.id),
    };

    Ok(filter)
}

/// Single-row check using the same filter as listing.
pub fn authorize_read(
    store: &dyn UserStore,
    user: &User,
    record: &RequestRecord,
) -> Result<(), AuthError> {
    if scope_for_read(store, user)?.permits(record.user_id) {
        Ok(())
    } else {
        Err(AuthError::OutOfScope)
    }
}

/// Exact match on the stored role name.
pub fn authorize_role(user: &User, required: Role) -> Result<(), AuthError> {
    if user.role == required.as_str() {
        Ok(())
    } else {
        Err(AuthError::RoleMismatch {
            required,
            actual: user.role.clone(),
        })
    }
}
