//! Command implementations.

pub mod account;
pub mod catalog;
pub mod migrate;
pub mod slug;

use secrecy::SecretString;
use thiserror::Error;

use shopwright_admin::config::{AppConfig, ConfigError};
use shopwright_admin::error::{MutationError, set_sentry_user};
use shopwright_admin::models::Caller;
use shopwright_admin::ports::{IdentityError, SessionProvider, StoreError};
use shopwright_admin::state::{AppState, StateError};
use shopwright_admin::telemetry;
use shopwright_core::SlugError;

/// Errors that can occur while running a command.
#[derive(Debug, Error)]
pub enum CommandError {
    /// Required environment variable is missing.
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(&'static str),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Startup failed: {0}")]
    State(#[from] StateError),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Session lookup failed: {0}")]
    Identity(#[from] IdentityError),

    #[error("{}", .0.user_message())]
    Mutation(#[from] MutationError),

    #[error("Invalid slug: {0}")]
    Slug(#[from] SlugError),

    /// An ID argument is not a UUID.
    #[error("Invalid ID '{0}'")]
    InvalidId(String),
}

/// A connected application plus the caller resolved from the access token.
pub struct Context {
    pub state: AppState,
    pub caller: Option<Caller>,
    _sentry: Option<sentry::ClientInitGuard>,
}

impl Context {
    /// Load configuration, connect, and resolve the caller.
    pub async fn connect(access_token: Option<SecretString>) -> Result<Self, CommandError> {
        let config = AppConfig::from_env()?;
        let sentry = telemetry::init_sentry(&config);

        let state = AppState::connect(&config).await?;
        let caller = match state.session(access_token) {
            Some(session) => session.current_caller().await?,
            None => None,
        };

        match &caller {
            Some(caller) => {
                set_sentry_user(&caller.id.to_string(), caller.email.as_deref());
                tracing::info!(user = %caller.id, role = %caller.role, "Resolved caller");
            }
            None => tracing::warn!("No valid access token; running as anonymous"),
        }

        Ok(Self {
            state,
            caller,
            _sentry: sentry,
        })
    }

    pub fn caller(&self) -> Option<&Caller> {
        self.caller.as_ref()
    }
}

/// Parse a UUID-backed ID argument.
pub fn parse_id<T: std::str::FromStr>(raw: &str) -> Result<T, CommandError> {
    raw.parse().map_err(|_| CommandError::InvalidId(raw.to_owned()))
}

#[cfg(test)]
mod tests {
    use shopwright_core::ProductId;

    use super::*;

    #[test]
    fn test_parse_id() {
        let id = ProductId::generate();
        let parsed: ProductId = parse_id(&id.to_string()).unwrap_or_else(|e| panic!("{e}"));
        assert_eq!(parsed, id);
    }

    #[test]
    fn test_parse_id_rejects_garbage() {
        let err = parse_id::<ProductId>("hat").err();
        assert!(matches!(err, Some(CommandError::InvalidId(raw)) if raw == "hat"));
    }

    #[test]
    fn test_mutation_error_shows_user_message() {
        let err = CommandError::from(MutationError::Unauthorized {
            action: "hide_empty_categories",
        });
        let expected = MutationError::Unauthorized {
            action: "hide_empty_categories",
        }
        .user_message();
        assert_eq!(err.to_string(), expected);
    }
}
