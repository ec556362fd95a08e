//! Account actions available to any signed-in user.

use std::sync::Arc;

use tracing::{info, instrument};

use shopwright_core::Role;

use crate::error::{MutationError, MutationStage};
use crate::models::{Caller, Profile, ProfileForm};
use crate::ports::{CacheInvalidator, IdentityAdmin, ProfileStore, ROOT_PATH};

const BECOME_DEMO_ADMIN: &str = "become_demo_admin";
const UPDATE_PROFILE: &str = "update_profile";
const GET_PROFILE: &str = "get_profile";

/// Demo-admin elevation and profile management.
#[derive(Clone)]
pub struct AccountService {
    identity: Arc<dyn IdentityAdmin>,
    profiles: Arc<dyn ProfileStore>,
    cache: Arc<dyn CacheInvalidator>,
}

impl AccountService {
    #[must_use]
    pub fn new(
        identity: Arc<dyn IdentityAdmin>,
        profiles: Arc<dyn ProfileStore>,
        cache: Arc<dyn CacheInvalidator>,
    ) -> Self {
        Self {
            identity,
            profiles,
            cache,
        }
    }

    /// Grant the caller read-only dashboard access.
    ///
    /// Callers who already have dashboard access keep their role. Returns the
    /// caller's role after the call.
    ///
    /// # Errors
    ///
    /// [`MutationError::Unauthorized`] for anonymous callers, or
    /// [`MutationError::Identity`] if the role claim cannot be written.
    #[instrument(skip(self, caller), fields(caller = ?caller.map(|c| c.id)))]
    pub async fn become_demo_admin(&self, caller: Option<&Caller>) -> Result<Role, MutationError> {
        self.elevate(caller)
            .await
            .inspect_err(|e| e.report(BECOME_DEMO_ADMIN))
    }

    /// Create or replace the caller's own profile.
    ///
    /// # Errors
    ///
    /// [`MutationError::Unauthorized`] for anonymous callers,
    /// [`MutationError::Validation`] for a blank name or bad age, or
    /// [`MutationError::Persistence`].
    #[instrument(skip(self, caller, form), fields(caller = ?caller.map(|c| c.id)))]
    pub async fn update_profile(
        &self,
        caller: Option<&Caller>,
        form: ProfileForm,
    ) -> Result<Profile, MutationError> {
        self.save_profile(caller, form)
            .await
            .inspect_err(|e| e.report(UPDATE_PROFILE))
    }

    /// The caller's profile, if one was saved.
    ///
    /// # Errors
    ///
    /// [`MutationError::Unauthorized`] for anonymous callers, or
    /// [`MutationError::Persistence`].
    pub async fn get_profile(&self, caller: Option<&Caller>) -> Result<Option<Profile>, MutationError> {
        let caller = signed_in(caller, GET_PROFILE)?;
        self.profiles
            .find_profile(caller.id)
            .await
            .map_err(|e| MutationError::from_store(e, MutationStage::Persisting, "profile", ""))
    }

    async fn elevate(&self, caller: Option<&Caller>) -> Result<Role, MutationError> {
        let caller = signed_in(caller, BECOME_DEMO_ADMIN)?;

        if caller.role.has_dashboard_access() {
            info!(role = %caller.role, "Caller already has dashboard access");
            return Ok(caller.role);
        }

        self.identity.set_role(caller.id, Role::DemoAdmin).await?;
        self.cache.revalidate(ROOT_PATH).await;
        info!(user_id = %caller.id, "Granted demo admin role");
        Ok(Role::DemoAdmin)
    }

    async fn save_profile(
        &self,
        caller: Option<&Caller>,
        form: ProfileForm,
    ) -> Result<Profile, MutationError> {
        let caller = signed_in(caller, UPDATE_PROFILE)?;
        let fields = form.validate()?;

        let profile = self
            .profiles
            .upsert_profile(caller.id, &fields)
            .await
            .map_err(|e| {
                MutationError::from_store(e, MutationStage::Persisting, "profile", &fields.name)
            })?;

        self.cache.revalidate(ROOT_PATH).await;
        info!(user_id = %caller.id, "Updated profile");
        Ok(profile)
    }
}

impl std::fmt::Debug for AccountService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AccountService").finish_non_exhaustive()
    }
}

fn signed_in<'a>(
    caller: Option<&'a Caller>,
    action: &'static str,
) -> Result<&'a Caller, MutationError> {
    caller.ok_or(MutationError::Unauthorized { action })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::Utc;
    use mockall::predicate::eq;
    use shopwright_core::UserId;

    use super::*;
    use crate::ports::{IdentityError, MockCacheInvalidator, MockIdentityAdmin, MockProfileStore};

    fn service(
        identity: MockIdentityAdmin,
        profiles: MockProfileStore,
        cache: MockCacheInvalidator,
    ) -> AccountService {
        AccountService::new(Arc::new(identity), Arc::new(profiles), Arc::new(cache))
    }

    #[tokio::test]
    async fn test_become_demo_admin_sets_claim_and_revalidates_root() {
        let user = Caller::new(UserId::generate(), Role::None);
        let user_id = user.id;

        let mut identity = MockIdentityAdmin::new();
        identity
            .expect_set_role()
            .with(eq(user_id), eq(Role::DemoAdmin))
            .times(1)
            .returning(|_, _| Ok(()));
        let mut cache = MockCacheInvalidator::new();
        cache
            .expect_revalidate()
            .with(eq(ROOT_PATH))
            .times(1)
            .returning(|_| ());

        let svc = service(identity, MockProfileStore::new(), cache);
        assert_eq!(svc.become_demo_admin(Some(&user)).await.unwrap(), Role::DemoAdmin);
    }

    #[tokio::test]
    async fn test_become_demo_admin_keeps_admin() {
        let admin = Caller::new(UserId::generate(), Role::Admin);
        let svc = service(
            MockIdentityAdmin::new(),
            MockProfileStore::new(),
            MockCacheInvalidator::new(),
        );
        assert_eq!(svc.become_demo_admin(Some(&admin)).await.unwrap(), Role::Admin);
    }

    #[tokio::test]
    async fn test_become_demo_admin_anonymous() {
        let svc = service(
            MockIdentityAdmin::new(),
            MockProfileStore::new(),
            MockCacheInvalidator::new(),
        );
        let err = svc.become_demo_admin(None).await.unwrap_err();
        assert!(matches!(err, MutationError::Unauthorized { .. }));
    }

    #[tokio::test]
    async fn test_become_demo_admin_identity_failure() {
        let mut identity = MockIdentityAdmin::new();
        identity
            .expect_set_role()
            .returning(|_, _| Err(IdentityError::Unauthorized));
        let svc = service(identity, MockProfileStore::new(), MockCacheInvalidator::new());

        let user = Caller::new(UserId::generate(), Role::None);
        let err = svc.become_demo_admin(Some(&user)).await.unwrap_err();
        assert_eq!(err, MutationError::Identity(IdentityError::Unauthorized));
    }

    #[tokio::test]
    async fn test_update_profile_upserts_own_profile() {
        let user = Caller::new(UserId::generate(), Role::DemoAdmin);
        let user_id = user.id;

        let mut profiles = MockProfileStore::new();
        profiles
            .expect_upsert_profile()
            .withf(move |id, fields| *id == user_id && fields.name == "Sam" && fields.age == Some(30))
            .times(1)
            .returning(|id, fields| {
                Ok(Profile {
                    user_id: id,
                    name: fields.name.clone(),
                    photo_url: None,
                    phone: None,
                    age: fields.age,
                    gender: None,
                    updated_at: Utc::now(),
                })
            });
        let mut cache = MockCacheInvalidator::new();
        cache.expect_revalidate().returning(|_| ());

        let svc = service(MockIdentityAdmin::new(), profiles, cache);
        let form = ProfileForm {
            name: "Sam".to_string(),
            age: Some("30".to_string()),
            ..ProfileForm::default()
        };
        let profile = svc.update_profile(Some(&user), form).await.unwrap();
        assert_eq!(profile.user_id, user_id);
    }

    #[tokio::test]
    async fn test_update_profile_rejects_bad_age() {
        let user = Caller::new(UserId::generate(), Role::None);
        let svc = service(
            MockIdentityAdmin::new(),
            MockProfileStore::new(),
            MockCacheInvalidator::new(),
        );
        let form = ProfileForm {
            name: "Sam".to_string(),
            age: Some("200".to_string()),
            ..ProfileForm::default()
        };
        let err = svc.update_profile(Some(&user), form).await.unwrap_err();
        assert!(matches!(err, MutationError::Validation { field: "age", .. }));
    }
}
