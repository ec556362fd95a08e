//! Session and identity-admin ports.

use async_trait::async_trait;
use thiserror::Error;

use shopwright_core::{Role, UserId};

use crate::models::Caller;

/// Errors reported by the identity provider.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IdentityError {
    /// The request never got a response.
    #[error("HTTP error: {0}")]
    Http(String),

    /// The identity API rejected the request.
    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    /// The token or service key was refused.
    #[error("Unauthorized: identity credentials rejected")]
    Unauthorized,

    /// The response body could not be decoded.
    #[error("Parse error: {0}")]
    Parse(String),
}

/// Resolves who is calling.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SessionProvider: Send + Sync {
    /// The authenticated caller, or `None` for an anonymous session.
    async fn current_caller(&self) -> Result<Option<Caller>, IdentityError>;
}

/// Privileged identity-provider operations.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait IdentityAdmin: Send + Sync {
    /// Write the role claim into the user's app metadata.
    async fn set_role(&self, user: UserId, role: Role) -> Result<(), IdentityError>;
}
