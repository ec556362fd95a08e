//! Persistence ports for products, categories and profiles.

use async_trait::async_trait;
use thiserror::Error;

use shopwright_core::{CategoryId, ProductId, UserId};

use crate::models::{Category, CategoryFields, Product, ProductFields, Profile, ProfileFields};

/// Errors reported by a persistence backend.
///
/// Messages are carried as text so the error stays `Clone` and independent of
/// the driver.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// The backend failed to execute the query.
    #[error("database error: {0}")]
    Database(String),

    /// A stored row could not be decoded.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// The addressed record does not exist.
    #[error("not found")]
    NotFound,

    /// A uniqueness constraint rejected the write.
    #[error("constraint violation: {0}")]
    Conflict(String),
}

/// Product persistence.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ProductStore: Send + Sync {
    /// Slugs of all products whose slug starts with `prefix`.
    async fn product_slugs_with_prefix(&self, prefix: &str) -> Result<Vec<String>, StoreError>;

    /// Load one product.
    async fn find_product(&self, id: ProductId) -> Result<Option<Product>, StoreError>;

    /// All products, newest first.
    async fn list_products(&self) -> Result<Vec<Product>, StoreError>;

    /// Insert a product and return its assigned ID.
    async fn insert_product(&self, fields: &ProductFields) -> Result<ProductId, StoreError>;

    /// Overwrite a product. Fails with [`StoreError::NotFound`] for an unknown ID.
    async fn update_product(&self, id: ProductId, fields: &ProductFields)
    -> Result<(), StoreError>;

    /// Delete a product. Fails with [`StoreError::NotFound`] for an unknown ID.
    async fn delete_product(&self, id: ProductId) -> Result<(), StoreError>;
}

/// Category persistence.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CategoryStore: Send + Sync {
    /// Slugs of all categories whose slug starts with `prefix`.
    async fn category_slugs_with_prefix(&self, prefix: &str) -> Result<Vec<String>, StoreError>;

    /// Load one category with its product count.
    async fn find_category(&self, id: CategoryId) -> Result<Option<Category>, StoreError>;

    /// All categories with product counts, newest first.
    async fn list_categories(&self) -> Result<Vec<Category>, StoreError>;

    /// Insert a category and return its assigned ID.
    async fn insert_category(&self, fields: &CategoryFields) -> Result<CategoryId, StoreError>;

    /// Overwrite a category. Fails with [`StoreError::NotFound`] for an unknown ID.
    async fn update_category(
        &self,
        id: CategoryId,
        fields: &CategoryFields,
    ) -> Result<(), StoreError>;

    /// Delete a category. Fails with [`StoreError::NotFound`] for an unknown ID.
    async fn delete_category(&self, id: CategoryId) -> Result<(), StoreError>;

    /// Mark every inactive category active. Returns how many changed.
    async fn publish_inactive_categories(&self) -> Result<u64, StoreError>;

    /// Set `is_active` on the given categories. Returns how many changed.
    async fn set_categories_active(
        &self,
        ids: &[CategoryId],
        active: bool,
    ) -> Result<u64, StoreError>;

    /// Delete the given categories. Returns how many were removed.
    async fn delete_categories(&self, ids: &[CategoryId]) -> Result<u64, StoreError>;
}

/// Profile persistence.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ProfileStore: Send + Sync {
    /// Load the profile for a user.
    async fn find_profile(&self, user: UserId) -> Result<Option<Profile>, StoreError>;

    /// Insert or replace the profile for a user.
    async fn upsert_profile(
        &self,
        user: UserId,
        fields: &ProfileFields,
    ) -> Result<Profile, StoreError>;
}
