//! Supabase Auth client.
//!
//! Two surfaces share one HTTP client:
//!
//! - [`SupabaseSession`] resolves the caller behind a user access token
//!   (`GET /auth/v1/user`) and implements [`SessionProvider`].
//! - [`SupabaseAuth`] performs service-role writes
//!   (`PUT /auth/v1/admin/users/{id}`) and implements [`IdentityAdmin`].
//!
//! The role claim lives in the user's `app_metadata.role` and is decoded
//! with [`Role::from_claim`], so unknown values become [`Role::None`].

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use shopwright_core::{Role, UserId};

use crate::config::{SupabaseConfig, bearer};
use crate::models::Caller;
use crate::ports::{IdentityAdmin, IdentityError, SessionProvider};

impl From<reqwest::Error> for IdentityError {
    fn from(err: reqwest::Error) -> Self {
        Self::Http(err.to_string())
    }
}

// =============================================================================
// Wire Types
// =============================================================================

#[derive(Debug, Deserialize)]
struct AuthUser {
    id: String,
    email: Option<String>,
    #[serde(default)]
    app_metadata: AppMetadata,
}

#[derive(Debug, Default, Deserialize, Serialize)]
struct AppMetadata {
    #[serde(default)]
    role: Option<String>,
}

#[derive(Debug, Serialize)]
struct UpdateUserRequest {
    app_metadata: AppMetadata,
}

impl TryFrom<AuthUser> for Caller {
    type Error = IdentityError;

    fn try_from(user: AuthUser) -> Result<Self, Self::Error> {
        let id: UserId = user
            .id
            .parse()
            .map_err(|e| IdentityError::Parse(format!("invalid user id: {e}")))?;

        Ok(Self {
            id,
            email: user.email,
            role: Role::from_claim(user.app_metadata.role.as_deref()),
        })
    }
}

// =============================================================================
// Client
// =============================================================================

/// Supabase Auth admin client.
#[derive(Clone)]
pub struct SupabaseAuth {
    inner: Arc<SupabaseAuthInner>,
}

struct SupabaseAuthInner {
    client: reqwest::Client,
    base_url: String,
    service_role_key: SecretString,
}

impl SupabaseAuth {
    /// Create a new auth client.
    ///
    /// # Errors
    ///
    /// Returns error if a key is not a valid header value or the HTTP
    /// client fails to build.
    pub fn new(config: &SupabaseConfig) -> Result<Self, IdentityError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            "apikey",
            HeaderValue::from_str(config.public_key().expose_secret())
                .map_err(|e| IdentityError::Parse(format!("Invalid API key format: {e}")))?,
        );

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .build()?;

        Ok(Self {
            inner: Arc::new(SupabaseAuthInner {
                client,
                base_url: config.url.as_str().trim_end_matches('/').to_string(),
                service_role_key: config.service_role_key.clone(),
            }),
        })
    }

    /// A session provider for one request's access token.
    ///
    /// `None` yields an anonymous session without calling the API.
    #[must_use]
    pub fn session(&self, access_token: Option<SecretString>) -> SupabaseSession {
        SupabaseSession {
            auth: self.clone(),
            access_token,
        }
    }

    fn user_url(&self) -> String {
        format!("{}/auth/v1/user", self.inner.base_url)
    }

    fn admin_user_url(&self, user: UserId) -> String {
        format!("{}/auth/v1/admin/users/{user}", self.inner.base_url)
    }

    /// Turn a non-success response into an [`IdentityError`].
    async fn parse_error(response: reqwest::Response) -> IdentityError {
        let status = response.status().as_u16();

        if status == 401 || status == 403 {
            return IdentityError::Unauthorized;
        }

        let message = response
            .text()
            .await
            .unwrap_or_else(|_| "Unknown error".to_string());

        IdentityError::Api { status, message }
    }
}

#[async_trait]
impl IdentityAdmin for SupabaseAuth {
    #[instrument(skip(self))]
    async fn set_role(&self, user: UserId, role: Role) -> Result<(), IdentityError> {
        let body = UpdateUserRequest {
            app_metadata: AppMetadata {
                role: role.as_claim().map(str::to_string),
            },
        };

        let response = self
            .inner
            .client
            .put(self.admin_user_url(user))
            .header(AUTHORIZATION, bearer(&self.inner.service_role_key))
            .header("apikey", self.inner.service_role_key.expose_secret())
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Self::parse_error(response).await);
        }

        debug!("Updated role claim");
        Ok(())
    }
}

impl std::fmt::Debug for SupabaseAuth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SupabaseAuth")
            .field("base_url", &self.inner.base_url)
            .finish_non_exhaustive()
    }
}

// =============================================================================
// Session
// =============================================================================

/// Resolves the caller behind a single access token.
#[derive(Clone)]
pub struct SupabaseSession {
    auth: SupabaseAuth,
    access_token: Option<SecretString>,
}

#[async_trait]
impl SessionProvider for SupabaseSession {
    #[instrument(skip(self))]
    async fn current_caller(&self) -> Result<Option<Caller>, IdentityError> {
        let Some(token) = &self.access_token else {
            return Ok(None);
        };

        let response = self
            .auth
            .inner
            .client
            .get(self.auth.user_url())
            .header(AUTHORIZATION, bearer(token))
            .send()
            .await?;

        let status = response.status();
        // Expired or revoked tokens are anonymous sessions, not failures.
        if status.as_u16() == 401 || status.as_u16() == 403 {
            debug!("Access token rejected");
            return Ok(None);
        }
        if !status.is_success() {
            return Err(SupabaseAuth::parse_error(response).await);
        }

        let user: AuthUser = response
            .json()
            .await
            .map_err(|e| IdentityError::Parse(format!("Failed to parse user: {e}")))?;

        Caller::try_from(user).map(Some)
    }
}

impl std::fmt::Debug for SupabaseSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SupabaseSession")
            .field("auth", &self.auth)
            .field("has_token", &self.access_token.is_some())
            .finish()
    }
}
