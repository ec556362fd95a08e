//! Cached catalog listings for the dashboard.
//!
//! Listings are cached in `moka` with a TTL and cleared by path whenever a
//! mutation signals that data behind a page changed.
//!
//! Each key family carries a generation that `revalidate` bumps before it
//! invalidates. A load only stores its result if the generation it started
//! under is still current, so a read that overlaps a mutation cannot put the
//! pre-mutation listing back after the invalidation.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use moka::future::Cache;
use tracing::{debug, instrument, warn};

use shopwright_core::ProductId;

use crate::models::{Category, Product};
use crate::ports::{
    CATEGORIES_PATH, CacheInvalidator, CategoryStore, PRODUCTS_PATH, ProductStore, ROOT_PATH,
    StoreError,
};

/// Default time-to-live for cached listings.
pub const DEFAULT_TTL: Duration = Duration::from_secs(300);
/// Default maximum number of cached entries.
pub const DEFAULT_CAPACITY: u64 = 1000;

/// Cache key for listings.
#[derive(Debug, Clone, Hash, PartialEq, Eq)]
enum CacheKey {
    Products,
    Product(ProductId),
    Categories,
}

impl CacheKey {
    const fn family(&self) -> Family {
        match self {
            Self::Products | Self::Product(_) => Family::Products,
            Self::Categories => Family::Categories,
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum Family {
    Products,
    Categories,
}

/// Cached value types.
#[derive(Debug, Clone)]
enum CacheValue {
    Products(Arc<Vec<Product>>),
    Product(Option<Box<Product>>),
    Categories(Arc<Vec<Category>>),
}

/// Read-through cache over the catalog stores.
#[derive(Clone)]
pub struct ListingCache {
    inner: Arc<ListingCacheInner>,
}

struct ListingCacheInner {
    products: Arc<dyn ProductStore>,
    categories: Arc<dyn CategoryStore>,
    cache: Cache<CacheKey, CacheValue>,
    product_generation: AtomicU64,
    category_generation: AtomicU64,
}

impl ListingCacheInner {
    const fn generation(&self, family: Family) -> &AtomicU64 {
        match family {
            Family::Products => &self.product_generation,
            Family::Categories => &self.category_generation,
        }
    }

    fn current(&self, family: Family) -> u64 {
        self.generation(family).load(Ordering::SeqCst)
    }

    fn bump(&self, family: Family) {
        self.generation(family).fetch_add(1, Ordering::SeqCst);
    }

    /// Store a loaded value unless its family was revalidated since `started`.
    async fn store(&self, key: CacheKey, value: CacheValue, started: u64) {
        let family = key.family();
        if self.current(family) != started {
            debug!(?key, "Listing changed during load, not caching");
            return;
        }
        self.cache.insert(key.clone(), value).await;
        // A revalidate that bumped between the check and the insert may have
        // already run its invalidation.
        if self.current(family) != started {
            self.cache.invalidate(&key).await;
        }
    }
}

impl ListingCache {
    /// Create a cache with the given TTL and capacity.
    #[must_use]
    pub fn new(
        products: Arc<dyn ProductStore>,
        categories: Arc<dyn CategoryStore>,
        ttl: Duration,
        capacity: u64,
    ) -> Self {
        let cache = Cache::builder()
            .max_capacity(capacity)
            .time_to_live(ttl)
            .support_invalidation_closures()
            .build();

        Self {
            inner: Arc::new(ListingCacheInner {
                products,
                categories,
                cache,
                product_generation: AtomicU64::new(0),
                category_generation: AtomicU64::new(0),
            }),
        }
    }

    /// All products, newest first.
    ///
    /// # Errors
    ///
    /// Returns the store error on a cache miss that fails to load.
    #[instrument(skip(self))]
    pub async fn products(&self) -> Result<Arc<Vec<Product>>, StoreError> {
        if let Some(CacheValue::Products(products)) =
            self.inner.cache.get(&CacheKey::Products).await
        {
            debug!("Cache hit for product listing");
            return Ok(products);
        }

        let started = self.inner.current(Family::Products);
        let products = Arc::new(self.inner.products.list_products().await?);
        self.inner
            .store(
                CacheKey::Products,
                CacheValue::Products(Arc::clone(&products)),
                started,
            )
            .await;
        Ok(products)
    }

    /// One product, or `None` if it does not exist.
    ///
    /// # Errors
    ///
    /// Returns the store error on a cache miss that fails to load.
    #[instrument(skip(self))]
    pub async fn product(&self, id: ProductId) -> Result<Option<Product>, StoreError> {
        let key = CacheKey::Product(id);
        if let Some(CacheValue::Product(product)) = self.inner.cache.get(&key).await {
            debug!("Cache hit for product");
            return Ok(product.map(|p| *p));
        }

        let started = self.inner.current(Family::Products);
        let product = self.inner.products.find_product(id).await?;
        self.inner
            .store(key, CacheValue::Product(product.clone().map(Box::new)), started)
            .await;
        Ok(product)
    }

    /// All categories with product counts.
    ///
    /// # Errors
    ///
    /// Returns the store error on a cache miss that fails to load.
    #[instrument(skip(self))]
    pub async fn categories(&self) -> Result<Arc<Vec<Category>>, StoreError> {
        if let Some(CacheValue::Categories(categories)) =
            self.inner.cache.get(&CacheKey::Categories).await
        {
            debug!("Cache hit for category listing");
            return Ok(categories);
        }

        let started = self.inner.current(Family::Categories);
        let categories = Arc::new(self.inner.categories.list_categories().await?);
        self.inner
            .store(
                CacheKey::Categories,
                CacheValue::Categories(Arc::clone(&categories)),
                started,
            )
            .await;
        Ok(categories)
    }

    /// Invalidate all cached data.
    pub async fn invalidate_all(&self) {
        self.inner.bump(Family::Products);
        self.inner.bump(Family::Categories);
        self.inner.cache.invalidate_all();
        self.inner.cache.run_pending_tasks().await;
    }

    async fn invalidate_products(&self) {
        self.inner.bump(Family::Products);
        self.inner.cache.invalidate(&CacheKey::Products).await;
        if let Err(e) = self
            .inner
            .cache
            .invalidate_entries_if(|key, _| matches!(key, CacheKey::Product(_)))
        {
            warn!(error = %e, "Falling back to clearing the whole listing cache");
            self.inner.cache.invalidate_all();
        }
        self.inner.cache.run_pending_tasks().await;
    }

    async fn invalidate_categories(&self) {
        self.inner.bump(Family::Categories);
        self.inner.cache.invalidate(&CacheKey::Categories).await;
    }
}

#[async_trait]
impl CacheInvalidator for ListingCache {
    async fn revalidate(&self, path: &str) {
        match path {
            PRODUCTS_PATH => self.invalidate_products().await,
            CATEGORIES_PATH => self.invalidate_categories().await,
            ROOT_PATH => self.invalidate_all().await,
            other => debug!(path = other, "No cached listing for path"),
        }
    }
}

impl std::fmt::Debug for ListingCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ListingCache")
            .field("entries", &self.inner.cache.entry_count())
            .finish_non_exhaustive()
    }
}
