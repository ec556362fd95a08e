//! Caller identity passed into every service operation.
//!
//! There is no ambient "current user": the session collaborator resolves a
//! [`Caller`] once per request and the caller is handed to each operation.

use serde::{Deserialize, Serialize};

use shopwright_core::{Role, UserId};

/// Authenticated identity of whoever invoked an operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Caller {
    /// Identity-provider user ID.
    pub id: UserId,
    /// Email address, when the identity provider exposes one.
    pub email: Option<String>,
    /// Role claim decoded at the session boundary.
    pub role: Role,
}

impl Caller {
    /// Create a caller with the given role and no email.
    #[must_use]
    pub const fn new(id: UserId, role: Role) -> Self {
        Self {
            id,
            email: None,
            role,
        }
    }
}

/// Role of an optional caller. Anonymous requests have [`Role::None`].
#[must_use]
pub fn role_of(caller: Option<&Caller>) -> Role {
    caller.map_or(Role::None, |c| c.role)
}
