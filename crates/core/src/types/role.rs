//! Role claims and the authorization gate for catalog mutations.
//!
//! The identity provider stores the role as a loosely typed string in the
//! user's app metadata. It is decoded exactly once, at the session
//! boundary, into [`Role`]; everything downstream works on the closed enum.

use serde::{Deserialize, Serialize};

/// Role claim attached to a caller's session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Full read/write access to the admin dashboard.
    Admin,
    /// May explore the admin dashboard but never change data.
    DemoAdmin,
    /// No role claim, or a claim this system does not recognize.
    #[default]
    None,
}

/// Error returned when parsing a role name strictly.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("invalid role: {0} (expected admin or demo_admin)")]
pub struct RoleParseError(pub String);

impl Role {
    /// Decode a raw role claim.
    ///
    /// Missing or unrecognized claims decode to [`Role::None`]; the
    /// comparison is exact, so `"Admin"` is not an admin.
    #[must_use]
    pub fn from_claim(claim: Option<&str>) -> Self {
        match claim {
            Some("admin") => Self::Admin,
            Some("demo_admin") => Self::DemoAdmin,
            _ => Self::None,
        }
    }

    /// The claim string written to the identity provider, if any.
    #[must_use]
    pub const fn as_claim(self) -> Option<&'static str> {
        match self {
            Self::Admin => Some("admin"),
            Self::DemoAdmin => Some("demo_admin"),
            Self::None => None,
        }
    }

    /// True iff the role is a full admin.
    #[must_use]
    pub const fn is_admin(self) -> bool {
        matches!(self, Self::Admin)
    }

    /// True iff the role is a demo admin.
    #[must_use]
    pub const fn is_demo_admin(self) -> bool {
        matches!(self, Self::DemoAdmin)
    }

    /// Whether the role may create, update, delete or bulk-modify records.
    ///
    /// Only full admins pass. Demo admins are read-and-explore only.
    #[must_use]
    pub const fn has_read_write_access(self) -> bool {
        self.is_admin()
    }

    /// Whether the role may see the admin area at all.
    #[must_use]
    pub const fn has_dashboard_access(self) -> bool {
        self.is_admin() || self.is_demo_admin()
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Admin => write!(f, "admin"),
            Self::DemoAdmin => write!(f, "demo_admin"),
            Self::None => write!(f, "none"),
        }
    }
}

impl std::str::FromStr for Role {
    type Err = RoleParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "admin" => Ok(Self::Admin),
            "demo_admin" => Ok(Self::DemoAdmin),
            "none" => Ok(Self::None),
            _ => Err(RoleParseError(s.to_owned())),
        }
    }
}

/// True iff the role is a full admin.
#[must_use]
pub const fn is_admin(role: Role) -> bool {
    role.is_admin()
}

/// True iff the role is a demo admin.
#[must_use]
pub const fn is_demo_admin(role: Role) -> bool {
    role.is_demo_admin()
}

/// Gate for every mutating catalog operation.
#[must_use]
pub const fn has_read_write_access(role: Role) -> bool {
    role.has_read_write_access()
}

/// Gate for visibility of the admin area. Never used for mutations.
#[must_use]
pub const fn has_dashboard_access(role: Role) -> bool {
    role.has_dashboard_access()
}
