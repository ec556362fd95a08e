//! Dashboard reads, served from the listing cache.

use std::sync::Arc;

use tracing::instrument;

use shopwright_core::ProductId;

use super::authorize_read;
use crate::cache::ListingCache;
use crate::error::{MutationError, MutationStage};
use crate::models::{Caller, Category, Product};

const LIST_PRODUCTS: &str = "list_products";
const GET_PRODUCT: &str = "get_product";
const LIST_CATEGORIES: &str = "list_categories";

/// Read access to the catalog for admins and demo admins.
#[derive(Debug, Clone)]
pub struct CatalogService {
    listings: ListingCache,
}

impl CatalogService {
    #[must_use]
    pub const fn new(listings: ListingCache) -> Self {
        Self { listings }
    }

    /// All products, newest first.
    ///
    /// # Errors
    ///
    /// [`MutationError::Unauthorized`] without dashboard access, or
    /// [`MutationError::Persistence`].
    #[instrument(skip(self, caller))]
    pub async fn list_products(
        &self,
        caller: Option<&Caller>,
    ) -> Result<Arc<Vec<Product>>, MutationError> {
        authorize_read(caller, LIST_PRODUCTS)?;
        self.listings.products().await.map_err(read_error)
    }

    /// One product.
    ///
    /// # Errors
    ///
    /// [`MutationError::Unauthorized`], [`MutationError::NotFound`], or
    /// [`MutationError::Persistence`].
    #[instrument(skip(self, caller))]
    pub async fn get_product(
        &self,
        caller: Option<&Caller>,
        id: ProductId,
    ) -> Result<Product, MutationError> {
        authorize_read(caller, GET_PRODUCT)?;
        self.listings
            .product(id)
            .await
            .map_err(read_error)?
            .ok_or(MutationError::NotFound { entity: "product" })
    }

    /// All categories with their product counts.
    ///
    /// # Errors
    ///
    /// [`MutationError::Unauthorized`] without dashboard access, or
    /// [`MutationError::Persistence`].
    #[instrument(skip(self, caller))]
    pub async fn list_categories(
        &self,
        caller: Option<&Caller>,
    ) -> Result<Arc<Vec<Category>>, MutationError> {
        authorize_read(caller, LIST_CATEGORIES)?;
        self.listings.categories().await.map_err(read_error)
    }
}

fn read_error(err: crate::ports::StoreError) -> MutationError {
    MutationError::from_store(err, MutationStage::Persisting, "listing", "")
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use shopwright_core::{Role, UserId};

    use super::*;
    use crate::cache::{DEFAULT_CAPACITY, DEFAULT_TTL};
    use crate::ports::{MockCategoryStore, MockProductStore};

    fn catalog(products: MockProductStore, categories: MockCategoryStore) -> CatalogService {
        CatalogService::new(ListingCache::new(
            Arc::new(products),
            Arc::new(categories),
            DEFAULT_TTL,
            DEFAULT_CAPACITY,
        ))
    }

    #[tokio::test]
    async fn test_demo_admin_can_read() {
        let mut categories = MockCategoryStore::new();
        categories
            .expect_list_categories()
            .returning(|| Ok(Vec::new()));
        let svc = catalog(MockProductStore::new(), categories);

        let demo = Caller::new(UserId::generate(), Role::DemoAdmin);
        assert!(svc.list_categories(Some(&demo)).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_anonymous_cannot_read() {
        let svc = catalog(MockProductStore::new(), MockCategoryStore::new());
        let err = svc.list_products(None).await.unwrap_err();
        assert!(matches!(err, MutationError::Unauthorized { .. }));
    }

    #[tokio::test]
    async fn test_get_missing_product() {
        let mut products = MockProductStore::new();
        products.expect_find_product().returning(|_| Ok(None));
        let svc = catalog(products, MockCategoryStore::new());

        let admin = Caller::new(UserId::generate(), Role::Admin);
        let err = svc
            .get_product(Some(&admin), ProductId::generate())
            .await
            .unwrap_err();
        assert_eq!(err, MutationError::NotFound { entity: "product" });
    }
}
