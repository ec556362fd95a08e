//! Application state: every service wired to its collaborators.

use std::sync::Arc;

use secrecy::SecretString;
use sqlx::PgPool;
use thiserror::Error;

use crate::cache::ListingCache;
use crate::config::AppConfig;
use crate::db::{self, PgStore};
use crate::identity::{SupabaseAuth, SupabaseSession};
use crate::ports::{
    CacheInvalidator, CategoryStore, IdentityAdmin, IdentityError, ObjectStorage, ProductStore,
    ProfileStore, StorageError,
};
use crate::services::{AccountService, CatalogService, CategoryService, ProductService};

/// Errors raised while building [`AppState`].
#[derive(Debug, Error)]
pub enum StateError {
    #[error("Database connection failed: {0}")]
    Database(#[from] sqlx::Error),
    #[error("Storage client setup failed: {0}")]
    Storage(#[from] StorageError),
    #[error("Auth client setup failed: {0}")]
    Identity(#[from] IdentityError),
}

/// Collaborators the services are built from.
pub struct Collaborators {
    pub products: Arc<dyn ProductStore>,
    pub categories: Arc<dyn CategoryStore>,
    pub profiles: Arc<dyn ProfileStore>,
    pub storage: Arc<dyn ObjectStorage>,
    pub identity: Arc<dyn IdentityAdmin>,
}

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    pool: Option<PgPool>,
    auth: Option<SupabaseAuth>,
    listings: ListingCache,
    products: ProductService,
    categories: CategoryService,
    account: AccountService,
    catalog: CatalogService,
}

impl AppState {
    /// Connect to `PostgreSQL` and Supabase and wire the services.
    ///
    /// # Errors
    ///
    /// Returns `StateError` if the pool cannot connect or an HTTP client
    /// cannot be built.
    pub async fn connect(config: &AppConfig) -> Result<Self, StateError> {
        let pool = db::create_pool(&config.database_url).await?;
        tracing::info!("Database pool created");

        let store = Arc::new(PgStore::new(pool.clone()));
        let auth = SupabaseAuth::new(&config.supabase)?;
        let storage = crate::storage::SupabaseStorage::new(&config.supabase)?;

        let collaborators = Collaborators {
            products: store.clone(),
            categories: store.clone(),
            profiles: store,
            storage: Arc::new(storage),
            identity: Arc::new(auth.clone()),
        };

        Ok(Self::build(collaborators, config, Some(pool), Some(auth)))
    }

    /// Wire the services from arbitrary collaborators.
    #[must_use]
    pub fn from_collaborators(collaborators: Collaborators, config: &AppConfig) -> Self {
        Self::build(collaborators, config, None, None)
    }

    fn build(
        collaborators: Collaborators,
        config: &AppConfig,
        pool: Option<PgPool>,
        auth: Option<SupabaseAuth>,
    ) -> Self {
        let listings = ListingCache::new(
            collaborators.products.clone(),
            collaborators.categories.clone(),
            config.cache.ttl,
            config.cache.capacity,
        );
        let invalidator: Arc<dyn CacheInvalidator> = Arc::new(listings.clone());

        let products = ProductService::new(
            collaborators.products,
            collaborators.storage.clone(),
            invalidator.clone(),
            config.buckets.product_images.clone(),
        );
        let categories = CategoryService::new(
            collaborators.categories,
            collaborators.storage,
            invalidator.clone(),
            config.buckets.category_images.clone(),
        );
        let account = AccountService::new(
            collaborators.identity,
            collaborators.profiles,
            invalidator,
        );

        Self {
            inner: Arc::new(AppStateInner {
                pool,
                auth,
                catalog: CatalogService::new(listings.clone()),
                listings,
                products,
                categories,
                account,
            }),
        }
    }

    /// Database pool, when connected to `PostgreSQL`.
    #[must_use]
    pub fn pool(&self) -> Option<&PgPool> {
        self.inner.pool.as_ref()
    }

    /// Session provider for one request's access token.
    ///
    /// Without a Supabase connection every session is anonymous.
    #[must_use]
    pub fn session(&self, access_token: Option<SecretString>) -> Option<SupabaseSession> {
        self.inner
            .auth
            .as_ref()
            .map(|auth| auth.session(access_token))
    }

    #[must_use]
    pub fn listings(&self) -> &ListingCache {
        &self.inner.listings
    }

    #[must_use]
    pub fn products(&self) -> &ProductService {
        &self.inner.products
    }

    #[must_use]
    pub fn categories(&self) -> &CategoryService {
        &self.inner.categories
    }

    #[must_use]
    pub fn account(&self) -> &AccountService {
        &self.inner.account
    }

    #[must_use]
    pub fn catalog(&self) -> &CatalogService {
        &self.inner.catalog
    }
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("connected", &self.inner.pool.is_some())
            .finish_non_exhaustive()
    }
}
