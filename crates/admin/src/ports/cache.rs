//! Cache invalidation port.

use async_trait::async_trait;

/// Product listing and detail pages.
pub const PRODUCTS_PATH: &str = "/admin/products";
/// Category listing page.
pub const CATEGORIES_PATH: &str = "/admin/products/categories";
/// Root layout; invalidating it refreshes everything.
pub const ROOT_PATH: &str = "/";

/// Receives a signal whenever data behind a listing path changed.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CacheInvalidator: Send + Sync {
    /// Mark everything cached under `path` as stale.
    async fn revalidate(&self, path: &str);
}
