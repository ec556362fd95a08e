//! Product mutations.
//!
//! Each operation runs authorize, validate, allocate slug, store images,
//! persist and revalidate, in that order. The first failing step aborts the
//! operation and later steps never run.

use std::sync::Arc;

use tracing::{debug, info, instrument, warn};

use shopwright_core::ProductId;
use shopwright_core::types::slug;

use super::{allocate_slug, authorize, upload_timestamp};
use crate::error::{MutationError, MutationStage};
use crate::models::{Caller, FieldError, ImageUpload, Product, ProductForm};
use crate::ports::{
    CATEGORIES_PATH, CacheInvalidator, ObjectStorage, PRODUCTS_PATH, ProductStore,
    object_path_from_url,
};

const CREATE_PRODUCT: &str = "create_product";
const UPDATE_PRODUCT: &str = "update_product";
const DELETE_PRODUCT: &str = "delete_product";

const ENTITY: &str = "product";

/// Default bucket for product images.
pub const DEFAULT_BUCKET: &str = "product-images";

/// Product create/update/delete.
#[derive(Clone)]
pub struct ProductService {
    products: Arc<dyn ProductStore>,
    storage: Arc<dyn ObjectStorage>,
    cache: Arc<dyn CacheInvalidator>,
    bucket: String,
}

impl ProductService {
    /// Create a product service writing images to `bucket`.
    #[must_use]
    pub fn new(
        products: Arc<dyn ProductStore>,
        storage: Arc<dyn ObjectStorage>,
        cache: Arc<dyn CacheInvalidator>,
        bucket: impl Into<String>,
    ) -> Self {
        Self {
            products,
            storage,
            cache,
            bucket: bucket.into(),
        }
    }

    /// Create a product from a form submission.
    ///
    /// # Errors
    ///
    /// - [`MutationError::Unauthorized`] unless the caller is an admin
    /// - [`MutationError::Validation`] for invalid fields or no images
    /// - [`MutationError::SlugConflict`] if the name yields no usable slug
    /// - [`MutationError::Storage`] / [`MutationError::Persistence`] for
    ///   collaborator failures
    #[instrument(skip(self, caller, form), fields(caller = ?caller.map(|c| c.id)))]
    pub async fn create_product(
        &self,
        caller: Option<&Caller>,
        form: ProductForm,
    ) -> Result<ProductId, MutationError> {
        self.create(caller, form)
            .await
            .inspect_err(|e| e.report(CREATE_PRODUCT))
    }

    /// Update a product. The slug is only regenerated when the name changes.
    ///
    /// Existing images listed in `retained_images` are kept, new files are
    /// appended, and images that were dropped are removed from storage after
    /// the update commits.
    ///
    /// # Errors
    ///
    /// As [`ProductService::create_product`], plus [`MutationError::NotFound`]
    /// for an unknown ID.
    #[instrument(skip(self, caller, form), fields(caller = ?caller.map(|c| c.id)))]
    pub async fn update_product(
        &self,
        caller: Option<&Caller>,
        id: ProductId,
        form: ProductForm,
    ) -> Result<(), MutationError> {
        self.update(caller, id, form)
            .await
            .inspect_err(|e| e.report(UPDATE_PRODUCT))
    }

    /// Delete a product and, best effort, its stored images.
    ///
    /// # Errors
    ///
    /// [`MutationError::Unauthorized`], [`MutationError::NotFound`] or
    /// [`MutationError::Persistence`].
    #[instrument(skip(self, caller), fields(caller = ?caller.map(|c| c.id)))]
    pub async fn delete_product(
        &self,
        caller: Option<&Caller>,
        id: ProductId,
    ) -> Result<(), MutationError> {
        self.delete(caller, id)
            .await
            .inspect_err(|e| e.report(DELETE_PRODUCT))
    }

    async fn create(
        &self,
        caller: Option<&Caller>,
        form: ProductForm,
    ) -> Result<ProductId, MutationError> {
        authorize(caller, CREATE_PRODUCT)?;

        let valid = form.validate()?;
        let uploads: Vec<&ImageUpload> = form.non_empty_images().collect();
        if uploads.is_empty() {
            return Err(images_required().into());
        }

        let slug = allocate_slug(&valid.name, ENTITY, None, |prefix| async move {
            self.products.product_slugs_with_prefix(&prefix).await
        })
        .await?;

        let images = self.store_images(slug.as_str(), 0, &uploads).await?;
        let fields = valid.into_fields(slug, images);

        let id = self.products.insert_product(&fields).await.map_err(|e| {
            warn!(
                orphaned = fields.images.len(),
                "Product insert failed after images were uploaded"
            );
            MutationError::from_store(e, MutationStage::Persisting, ENTITY, &fields.name)
        })?;

        self.revalidate().await;
        info!(product_id = %id, slug = %fields.slug, "Created product");
        Ok(id)
    }

    async fn update(
        &self,
        caller: Option<&Caller>,
        id: ProductId,
        form: ProductForm,
    ) -> Result<(), MutationError> {
        authorize(caller, UPDATE_PRODUCT)?;

        let valid = form.validate()?;
        let current = self.load(id).await?;

        let retained: Vec<String> = form
            .retained_images
            .iter()
            .filter(|url| current.images.contains(url))
            .cloned()
            .collect();
        let uploads: Vec<&ImageUpload> = form.non_empty_images().collect();
        if retained.is_empty() && uploads.is_empty() {
            return Err(images_required().into());
        }

        let slug = if slug::normalize(&valid.name) == slug::normalize(&current.name) {
            current.slug.clone()
        } else {
            allocate_slug(
                &valid.name,
                ENTITY,
                Some(current.slug.as_str()),
                |prefix| async move { self.products.product_slugs_with_prefix(&prefix).await },
            )
            .await?
        };

        let uploaded = self
            .store_images(slug.as_str(), retained.len(), &uploads)
            .await?;
        let mut images = retained;
        images.extend(uploaded);

        let fields = valid.into_fields(slug, images);
        self.products
            .update_product(id, &fields)
            .await
            .map_err(|e| {
                MutationError::from_store(e, MutationStage::Persisting, ENTITY, &fields.name)
            })?;

        let dropped: Vec<&String> = current
            .images
            .iter()
            .filter(|url| !fields.images.contains(url))
            .collect();
        self.remove_images(&dropped).await;

        self.revalidate().await;
        info!(product_id = %id, slug = %fields.slug, "Updated product");
        Ok(())
    }

    async fn delete(&self, caller: Option<&Caller>, id: ProductId) -> Result<(), MutationError> {
        authorize(caller, DELETE_PRODUCT)?;

        let current = self.load(id).await?;
        self.products
            .delete_product(id)
            .await
            .map_err(|e| {
                MutationError::from_store(e, MutationStage::Persisting, ENTITY, &current.name)
            })?;

        let images: Vec<&String> = current.images.iter().collect();
        self.remove_images(&images).await;

        self.revalidate().await;
        info!(product_id = %id, "Deleted product");
        Ok(())
    }

    async fn load(&self, id: ProductId) -> Result<Product, MutationError> {
        self.products
            .find_product(id)
            .await
            .map_err(|e| MutationError::from_store(e, MutationStage::Validating, ENTITY, ""))?
            .ok_or(MutationError::NotFound { entity: ENTITY })
    }

    /// Upload files as `products/{slug}-{n}-{timestamp}.{ext}`, numbering
    /// from `offset + 1`.
    async fn store_images(
        &self,
        slug: &str,
        offset: usize,
        uploads: &[&ImageUpload],
    ) -> Result<Vec<String>, MutationError> {
        let timestamp = upload_timestamp();
        let mut urls = Vec::with_capacity(uploads.len());
        for (i, upload) in uploads.iter().enumerate() {
            let path = format!(
                "products/{slug}-{}-{timestamp}.{}",
                offset + i + 1,
                upload.extension()
            );
            let url = self.storage.upload(&self.bucket, &path, upload).await?;
            debug!(%path, "Uploaded product image");
            urls.push(url);
        }
        Ok(urls)
    }

    /// Remove stored images after a commit. Failures are logged only.
    async fn remove_images(&self, urls: &[&String]) {
        let paths: Vec<String> = urls
            .iter()
            .filter_map(|url| object_path_from_url(url, &self.bucket))
            .collect();
        if paths.is_empty() {
            return;
        }
        if let Err(e) = self.storage.remove(&self.bucket, &paths).await {
            warn!(error = %e, count = paths.len(), "Failed to remove product images");
        }
    }

    async fn revalidate(&self) {
        self.cache.revalidate(PRODUCTS_PATH).await;
        self.cache.revalidate(CATEGORIES_PATH).await;
    }
}

impl std::fmt::Debug for ProductService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProductService")
            .field("bucket", &self.bucket)
            .finish_non_exhaustive()
    }
}

fn images_required() -> FieldError {
    FieldError::new("images", "At least one image is required")
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::Utc;
    use mockall::predicate::{always, eq};
    use shopwright_core::{CategoryId, Price, Role, Slug, UserId};

    use super::*;
    use crate::ports::{MockCacheInvalidator, MockObjectStorage, MockProductStore, StoreError};

    const BASE: &str = "https://x.supabase.co/storage/v1/object/public/product-images";

    fn admin() -> Caller {
        Caller::new(UserId::generate(), Role::Admin)
    }

    fn form(name: &str) -> ProductForm {
        ProductForm {
            name: name.to_string(),
            price: "24.99".to_string(),
            category: CategoryId::generate().to_string(),
            stock: "5".to_string(),
            is_active: true,
            images: vec![ImageUpload::new("front.PNG", "image/png", vec![1, 2])],
            ..ProductForm::default()
        }
    }

    fn existing(name: &str, slug: &str, images: Vec<String>) -> Product {
        Product {
            id: ProductId::generate(),
            name: name.to_string(),
            slug: Slug::parse(slug).unwrap(),
            description: None,
            price: Price::parse("24.99").unwrap(),
            compare_price: None,
            category_id: CategoryId::generate(),
            stock: 5,
            sku: None,
            primary_image: images.first().cloned(),
            images,
            is_active: true,
            created_at: Utc::now(),
        }
    }

    fn echo_storage() -> MockObjectStorage {
        let mut storage = MockObjectStorage::new();
        storage
            .expect_upload()
            .returning(|bucket, path, _| {
                Ok(format!(
                    "https://x.supabase.co/storage/v1/object/public/{bucket}/{path}"
                ))
            });
        storage
    }

    fn quiet_cache() -> MockCacheInvalidator {
        let mut cache = MockCacheInvalidator::new();
        cache.expect_revalidate().returning(|_| ());
        cache
    }

    fn service(
        products: MockProductStore,
        storage: MockObjectStorage,
        cache: MockCacheInvalidator,
    ) -> ProductService {
        ProductService::new(
            Arc::new(products),
            Arc::new(storage),
            Arc::new(cache),
            DEFAULT_BUCKET,
        )
    }

    #[tokio::test]
    async fn test_create_product_as_demo_admin_touches_nothing() {
        // No expectations: any collaborator call panics.
        let svc = service(
            MockProductStore::new(),
            MockObjectStorage::new(),
            MockCacheInvalidator::new(),
        );
        let demo = Caller::new(UserId::generate(), Role::DemoAdmin);

        let err = svc
            .create_product(Some(&demo), form("Hat"))
            .await
            .unwrap_err();
        assert_eq!(
            err,
            MutationError::Unauthorized {
                action: CREATE_PRODUCT
            }
        );
    }

    #[tokio::test]
    async fn test_create_product_anonymous_is_unauthorized() {
        let svc = service(
            MockProductStore::new(),
            MockObjectStorage::new(),
            MockCacheInvalidator::new(),
        );
        let err = svc.create_product(None, form("Hat")).await.unwrap_err();
        assert!(matches!(err, MutationError::Unauthorized { .. }));
    }

    #[tokio::test]
    async fn test_create_product_allocates_suffix_and_persists() {
        let mut products = MockProductStore::new();
        products
            .expect_product_slugs_with_prefix()
            .with(eq("classic-white-t-shirt"))
            .times(1)
            .returning(|_| Ok(vec!["classic-white-t-shirt".to_string()]));
        let new_id = ProductId::generate();
        products
            .expect_insert_product()
            .withf(|fields| {
                fields.slug.as_str() == "classic-white-t-shirt-1"
                    && fields.images.len() == 1
                    && fields.images[0].contains("/products/classic-white-t-shirt-1-1-")
                    && fields.images[0].ends_with(".png")
            })
            .times(1)
            .returning(move |_| Ok(new_id));

        let mut cache = MockCacheInvalidator::new();
        cache
            .expect_revalidate()
            .with(eq(PRODUCTS_PATH))
            .times(1)
            .returning(|_| ());
        cache
            .expect_revalidate()
            .with(eq(CATEGORIES_PATH))
            .times(1)
            .returning(|_| ());

        let svc = service(products, echo_storage(), cache);
        let id = svc
            .create_product(Some(&admin()), form("Classic White T-Shirt"))
            .await
            .unwrap();
        assert_eq!(id, new_id);
    }

    #[tokio::test]
    async fn test_create_product_requires_image() {
        let svc = service(
            MockProductStore::new(),
            MockObjectStorage::new(),
            MockCacheInvalidator::new(),
        );
        let no_images = ProductForm {
            images: vec![ImageUpload::new("", "application/octet-stream", vec![])],
            ..form("Hat")
        };
        let err = svc
            .create_product(Some(&admin()), no_images)
            .await
            .unwrap_err();
        assert_eq!(
            err,
            MutationError::Validation {
                field: "images",
                reason: "At least one image is required".to_string()
            }
        );
    }

    #[tokio::test]
    async fn test_create_product_validation_before_store() {
        let svc = service(
            MockProductStore::new(),
            MockObjectStorage::new(),
            MockCacheInvalidator::new(),
        );
        let bad = ProductForm {
            stock: "-3".to_string(),
            ..form("Hat")
        };
        let err = svc.create_product(Some(&admin()), bad).await.unwrap_err();
        assert!(matches!(err, MutationError::Validation { field: "stock", .. }));
    }

    #[tokio::test]
    async fn test_create_product_storage_failure_aborts_before_insert() {
        let mut products = MockProductStore::new();
        products
            .expect_product_slugs_with_prefix()
            .returning(|_| Ok(Vec::new()));
        products.expect_insert_product().never();

        let mut storage = MockObjectStorage::new();
        storage
            .expect_upload()
            .returning(|_, _, _| Err(crate::ports::StorageError::Unauthorized));

        let svc = service(products, storage, MockCacheInvalidator::new());
        let err = svc
            .create_product(Some(&admin()), form("Hat"))
            .await
            .unwrap_err();
        assert_eq!(err.stage(), MutationStage::StoringImages);
    }

    #[tokio::test]
    async fn test_create_product_late_unique_violation_is_slug_conflict() {
        let mut products = MockProductStore::new();
        products
            .expect_product_slugs_with_prefix()
            .returning(|_| Ok(Vec::new()));
        products
            .expect_insert_product()
            .returning(|_| Err(StoreError::Conflict("products_slug_key".to_string())));

        let svc = service(products, echo_storage(), MockCacheInvalidator::new());
        let err = svc
            .create_product(Some(&admin()), form("Hat"))
            .await
            .unwrap_err();
        assert_eq!(
            err,
            MutationError::SlugConflict {
                name: "Hat".to_string()
            }
        );
    }

    #[tokio::test]
    async fn test_update_product_same_name_keeps_slug() {
        let current = existing(
            "Classic White T-Shirt",
            "classic-white-t-shirt-1",
            vec![format!("{BASE}/products/a.png")],
        );
        let id = current.id;
        let kept = current.images.clone();

        let mut products = MockProductStore::new();
        products
            .expect_find_product()
            .with(eq(id))
            .returning(move |_| Ok(Some(current.clone())));
        products.expect_product_slugs_with_prefix().never();
        products
            .expect_update_product()
            .withf(move |pid, fields| {
                *pid == id
                    && fields.slug.as_str() == "classic-white-t-shirt-1"
                    && fields.images == kept
            })
            .times(1)
            .returning(|_, _| Ok(()));

        let svc = service(products, MockObjectStorage::new(), quiet_cache());
        let update = ProductForm {
            name: "  classic white t-shirt ".to_string(),
            images: Vec::new(),
            retained_images: vec![format!("{BASE}/products/a.png")],
            ..form("unused")
        };
        svc.update_product(Some(&admin()), id, update).await.unwrap();
    }

    #[tokio::test]
    async fn test_update_product_rename_excludes_own_slug() {
        let current = existing("Hat", "hat", vec![format!("{BASE}/products/hat-1-1.png")]);
        let id = current.id;

        let mut products = MockProductStore::new();
        products
            .expect_find_product()
            .returning(move |_| Ok(Some(current.clone())));
        products
            .expect_product_slugs_with_prefix()
            .with(eq("cap"))
            .returning(|_| Ok(vec!["cap".to_string()]));
        products
            .expect_update_product()
            .withf(|_, fields| fields.slug.as_str() == "cap-1" && fields.images.len() == 1)
            .times(1)
            .returning(|_, _| Ok(()));

        let mut storage = echo_storage();
        storage
            .expect_remove()
            .with(eq(DEFAULT_BUCKET), eq(vec!["products/hat-1-1.png".to_string()]))
            .times(1)
            .returning(|_, _| Ok(()));

        let svc = service(products, storage, quiet_cache());
        svc.update_product(Some(&admin()), id, form("Cap"))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_update_product_unknown_id() {
        let mut products = MockProductStore::new();
        products.expect_find_product().returning(|_| Ok(None));

        let svc = service(products, MockObjectStorage::new(), MockCacheInvalidator::new());
        let err = svc
            .update_product(Some(&admin()), ProductId::generate(), form("Hat"))
            .await
            .unwrap_err();
        assert_eq!(err, MutationError::NotFound { entity: "product" });
    }

    #[tokio::test]
    async fn test_delete_product_removes_images_best_effort() {
        let current = existing("Hat", "hat", vec![format!("{BASE}/products/hat-1-1.png")]);
        let id = current.id;

        let mut products = MockProductStore::new();
        products
            .expect_find_product()
            .returning(move |_| Ok(Some(current.clone())));
        products
            .expect_delete_product()
            .with(eq(id))
            .times(1)
            .returning(|_| Ok(()));

        let mut storage = MockObjectStorage::new();
        storage
            .expect_remove()
            .with(always(), always())
            .returning(|_, _| Err(crate::ports::StorageError::Http("timeout".to_string())));

        let svc = service(products, storage, quiet_cache());
        svc.delete_product(Some(&admin()), id).await.unwrap();
    }

    #[tokio::test]
    async fn test_delete_product_as_demo_admin() {
        let svc = service(
            MockProductStore::new(),
            MockObjectStorage::new(),
            MockCacheInvalidator::new(),
        );
        let demo = Caller::new(UserId::generate(), Role::DemoAdmin);
        let err = svc
            .delete_product(Some(&demo), ProductId::generate())
            .await
            .unwrap_err();
        assert!(matches!(err, MutationError::Unauthorized { .. }));
    }
}
