//! Caller identity and role gates.
//!
//! Authentication is the identity provider's job: it asserts the acting user
//! through the `x-user-id` header. This layer only resolves that id against
//! the user directory and checks the role. An absent, malformed, or unknown
//! id is treated the same way (401) so the header never becomes an oracle
//! for probing user ids.

use axum::http::HeaderMap;

use equilearn_ledger::{Error, Ledger, Role, User};

use crate::errors::{ApiError, Result};

pub const USER_ID_HEADER: &str = "x-user-id";

/// Resolve the acting user from the identity header.
pub fn resolve_actor(ledger: &Ledger, headers: &HeaderMap) -> Result<User> {
    let id = headers
        .get(USER_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse::<u64>().ok())
        .ok_or(ApiError::MissingIdentity)?;
    match ledger.get_user(id) {
        Ok(user) => Ok(user),
        Err(Error::UnknownUser(_)) => Err(ApiError::MissingIdentity),
        Err(e) => Err(e.into()),
    }
}

/// Resolve the actor and require the admin role.
pub fn require_admin(ledger: &Ledger, headers: &HeaderMap) -> Result<User> {
    let user = resolve_actor(ledger, headers)?;
    if user.role != Role::Admin {
        return Err(ApiError::Forbidden);
    }
    Ok(user)
}
