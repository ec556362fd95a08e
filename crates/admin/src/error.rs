//! Unified error handling for mutation and read operations.

use std::fmt;

use thiserror::Error;

use crate::models::FieldError;
use crate::ports::{IdentityError, StorageError, StoreError};

/// Where in its lifecycle an operation was when it failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MutationStage {
    Authorizing,
    Validating,
    AllocatingSlug,
    StoringImages,
    Persisting,
}

impl MutationStage {
    /// Lowercase name used in logs.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Authorizing => "authorizing",
            Self::Validating => "validating",
            Self::AllocatingSlug => "allocating_slug",
            Self::StoringImages => "storing_images",
            Self::Persisting => "persisting",
        }
    }
}

impl fmt::Display for MutationStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned by every service operation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MutationError {
    /// The caller lacks the role required for the action.
    #[error("Unauthorized: {action} requires admin access")]
    Unauthorized { action: &'static str },

    /// A form field failed validation.
    #[error("Invalid {field}: {reason}")]
    Validation { field: &'static str, reason: String },

    /// No usable unique slug could be derived from the name.
    #[error("Slug conflict for \"{name}\"")]
    SlugConflict { name: String },

    /// The addressed record does not exist.
    #[error("Not found: {entity}")]
    NotFound { entity: &'static str },

    /// The persistence backend failed.
    #[error("Database error: {source}")]
    Persistence {
        stage: MutationStage,
        #[source]
        source: StoreError,
    },

    /// Object storage failed.
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// The identity provider failed.
    #[error("Identity error: {0}")]
    Identity(#[from] IdentityError),
}

impl From<FieldError> for MutationError {
    fn from(err: FieldError) -> Self {
        Self::Validation {
            field: err.field,
            reason: err.reason,
        }
    }
}

impl MutationError {
    /// Map a store failure at `stage`, turning constraint violations on the
    /// slug into [`MutationError::SlugConflict`] and missing rows into
    /// [`MutationError::NotFound`].
    #[must_use]
    pub fn from_store(
        err: StoreError,
        stage: MutationStage,
        entity: &'static str,
        name: &str,
    ) -> Self {
        match err {
            StoreError::Conflict(_) => Self::SlugConflict {
                name: name.to_string(),
            },
            StoreError::NotFound => Self::NotFound { entity },
            source => Self::Persistence { stage, source },
        }
    }

    /// The stage the operation had reached when this error occurred.
    #[must_use]
    pub const fn stage(&self) -> MutationStage {
        match self {
            Self::Unauthorized { .. } => MutationStage::Authorizing,
            Self::Validation { .. } | Self::NotFound { .. } => MutationStage::Validating,
            Self::SlugConflict { .. } => MutationStage::AllocatingSlug,
            Self::Storage(_) => MutationStage::StoringImages,
            Self::Persistence { stage, .. } => *stage,
            Self::Identity(_) => MutationStage::Persisting,
        }
    }

    /// Message safe to show to the person who triggered the operation.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Unauthorized { .. } => {
                "You do not have permission to perform this action".to_string()
            }
            Self::Validation { reason, .. } => reason.clone(),
            Self::SlugConflict { .. } => {
                "That name is already taken or unusable, try a different name".to_string()
            }
            Self::NotFound { entity } => format!("That {entity} no longer exists"),
            Self::Persistence { source, .. } => format!("Failed to save changes: {source}"),
            Self::Storage(err) => format!("Failed to upload image: {err}"),
            Self::Identity(err) => format!("Failed to update account: {err}"),
        }
    }

    /// Whether this is a collaborator failure rather than a caller mistake.
    #[must_use]
    pub const fn is_server_error(&self) -> bool {
        matches!(
            self,
            Self::Persistence { .. } | Self::Storage(_) | Self::Identity(_)
        )
    }

    /// Log the failure and, for collaborator failures, capture it in Sentry.
    pub fn report(&self, action: &'static str) {
        if self.is_server_error() {
            let event_id = sentry::capture_error(self);
            tracing::error!(
                action,
                stage = %self.stage(),
                error = %self,
                sentry_event_id = %event_id,
                "Mutation failed"
            );
        } else {
            tracing::warn!(
                action,
                stage = %self.stage(),
                error = %self,
                "Mutation rejected"
            );
        }
    }
}

/// Set the Sentry user context for the current caller.
pub fn set_sentry_user(user_id: &str, email: Option<&str>) {
    sentry::configure_scope(|scope| {
        scope.set_user(Some(sentry::User {
            id: Some(user_id.to_string()),
            email: email.map(String::from),
            ..Default::default()
        }));
    });
}
