//! Category mutations, including the bulk publish/hide/delete actions.

use std::sync::Arc;

use tracing::{debug, info, instrument, warn};

use shopwright_core::types::slug;
use shopwright_core::{CategoryId, Slug};

use super::{allocate_slug, authorize, upload_timestamp};
use crate::error::{MutationError, MutationStage};
use crate::models::validation::optional_text;
use crate::models::{Caller, Category, CategoryForm, ImageUpload};
use crate::ports::{
    CATEGORIES_PATH, CacheInvalidator, CategoryStore, ObjectStorage, object_path_from_url,
};

const CREATE_CATEGORY: &str = "create_category";
const UPDATE_CATEGORY: &str = "update_category";
const DELETE_CATEGORY: &str = "delete_category";
const PUBLISH_DRAFTS: &str = "publish_draft_categories";
const HIDE_EMPTY: &str = "hide_empty_categories";
const DELETE_EMPTY: &str = "delete_empty_categories";

const ENTITY: &str = "category";

/// Default bucket for category images.
pub const DEFAULT_BUCKET: &str = "category-images";

/// Category create/update/delete and bulk actions.
#[derive(Clone)]
pub struct CategoryService {
    categories: Arc<dyn CategoryStore>,
    storage: Arc<dyn ObjectStorage>,
    cache: Arc<dyn CacheInvalidator>,
    bucket: String,
}

impl CategoryService {
    /// Create a category service writing images to `bucket`.
    #[must_use]
    pub fn new(
        categories: Arc<dyn CategoryStore>,
        storage: Arc<dyn ObjectStorage>,
        cache: Arc<dyn CacheInvalidator>,
        bucket: impl Into<String>,
    ) -> Self {
        Self {
            categories,
            storage,
            cache,
            bucket: bucket.into(),
        }
    }

    /// Create a category.
    ///
    /// # Errors
    ///
    /// [`MutationError::Unauthorized`], [`MutationError::Validation`],
    /// [`MutationError::SlugConflict`], or a collaborator failure.
    #[instrument(skip(self, caller, form), fields(caller = ?caller.map(|c| c.id)))]
    pub async fn create_category(
        &self,
        caller: Option<&Caller>,
        form: CategoryForm,
    ) -> Result<CategoryId, MutationError> {
        self.create(caller, form)
            .await
            .inspect_err(|e| e.report(CREATE_CATEGORY))
    }

    /// Update a category. The slug is only regenerated when the name changes.
    ///
    /// # Errors
    ///
    /// As [`CategoryService::create_category`], plus
    /// [`MutationError::NotFound`] for an unknown ID.
    #[instrument(skip(self, caller, form), fields(caller = ?caller.map(|c| c.id)))]
    pub async fn update_category(
        &self,
        caller: Option<&Caller>,
        id: CategoryId,
        form: CategoryForm,
    ) -> Result<(), MutationError> {
        self.update(caller, id, form)
            .await
            .inspect_err(|e| e.report(UPDATE_CATEGORY))
    }

    /// Delete a category.
    ///
    /// # Errors
    ///
    /// [`MutationError::Unauthorized`], [`MutationError::NotFound`] or
    /// [`MutationError::Persistence`].
    #[instrument(skip(self, caller), fields(caller = ?caller.map(|c| c.id)))]
    pub async fn delete_category(
        &self,
        caller: Option<&Caller>,
        id: CategoryId,
    ) -> Result<(), MutationError> {
        self.delete(caller, id)
            .await
            .inspect_err(|e| e.report(DELETE_CATEGORY))
    }

    /// Activate every draft category. Returns the number published.
    ///
    /// # Errors
    ///
    /// [`MutationError::Unauthorized`] or [`MutationError::Persistence`].
    #[instrument(skip(self, caller), fields(caller = ?caller.map(|c| c.id)))]
    pub async fn publish_draft_categories(
        &self,
        caller: Option<&Caller>,
    ) -> Result<u64, MutationError> {
        self.publish_drafts(caller)
            .await
            .inspect_err(|e| e.report(PUBLISH_DRAFTS))
    }

    /// Deactivate every category without products. Returns how many changed.
    ///
    /// Selection and update are separate steps; a product added in between
    /// does not stop its category from being hidden.
    ///
    /// # Errors
    ///
    /// [`MutationError::Unauthorized`] or [`MutationError::Persistence`].
    #[instrument(skip(self, caller), fields(caller = ?caller.map(|c| c.id)))]
    pub async fn hide_empty_categories(
        &self,
        caller: Option<&Caller>,
    ) -> Result<u64, MutationError> {
        self.hide_empty(caller)
            .await
            .inspect_err(|e| e.report(HIDE_EMPTY))
    }

    /// Delete every category without products. Returns how many were deleted.
    ///
    /// # Errors
    ///
    /// [`MutationError::Unauthorized`] or [`MutationError::Persistence`].
    #[instrument(skip(self, caller), fields(caller = ?caller.map(|c| c.id)))]
    pub async fn delete_empty_categories(
        &self,
        caller: Option<&Caller>,
    ) -> Result<u64, MutationError> {
        self.delete_empty(caller)
            .await
            .inspect_err(|e| e.report(DELETE_EMPTY))
    }

    async fn create(
        &self,
        caller: Option<&Caller>,
        form: CategoryForm,
    ) -> Result<CategoryId, MutationError> {
        authorize(caller, CREATE_CATEGORY)?;

        let valid = form.validate()?;
        let slug = self.allocate(&valid.name, None).await?;

        let image = match form.attached_image() {
            Some(upload) => Some(self.store_image(&slug, upload).await?),
            None => None,
        };

        let fields = valid.into_fields(slug, image);
        let id = self.categories.insert_category(&fields).await.map_err(|e| {
            if fields.image.is_some() {
                warn!("Category insert failed after its image was uploaded");
            }
            MutationError::from_store(e, MutationStage::Persisting, ENTITY, &fields.name)
        })?;

        self.cache.revalidate(CATEGORIES_PATH).await;
        info!(category_id = %id, slug = %fields.slug, "Created category");
        Ok(id)
    }

    async fn update(
        &self,
        caller: Option<&Caller>,
        id: CategoryId,
        form: CategoryForm,
    ) -> Result<(), MutationError> {
        authorize(caller, UPDATE_CATEGORY)?;

        let valid = form.validate()?;
        let current = self.load(id).await?;

        let slug = if slug::normalize(&valid.name) == slug::normalize(&current.name) {
            current.slug.clone()
        } else {
            self.allocate(&valid.name, Some(current.slug.as_str()))
                .await?
        };

        let image = match form.attached_image() {
            Some(upload) => Some(self.store_image(&slug, upload).await?),
            None => optional_text(form.image_url.as_deref())
                .filter(|url| current.image.as_deref() == Some(url.as_str())),
        };

        let fields = valid.into_fields(slug, image);
        self.categories
            .update_category(id, &fields)
            .await
            .map_err(|e| {
                MutationError::from_store(e, MutationStage::Persisting, ENTITY, &fields.name)
            })?;

        if let Some(old) = current.image
            && fields.image.as_deref() != Some(old.as_str())
        {
            self.remove_image(&old).await;
        }

        self.cache.revalidate(CATEGORIES_PATH).await;
        info!(category_id = %id, slug = %fields.slug, "Updated category");
        Ok(())
    }

    async fn delete(&self, caller: Option<&Caller>, id: CategoryId) -> Result<(), MutationError> {
        authorize(caller, DELETE_CATEGORY)?;

        self.categories
            .delete_category(id)
            .await
            .map_err(|e| MutationError::from_store(e, MutationStage::Persisting, ENTITY, ""))?;

        self.cache.revalidate(CATEGORIES_PATH).await;
        info!(category_id = %id, "Deleted category");
        Ok(())
    }

    async fn publish_drafts(&self, caller: Option<&Caller>) -> Result<u64, MutationError> {
        authorize(caller, PUBLISH_DRAFTS)?;

        let count = self
            .categories
            .publish_inactive_categories()
            .await
            .map_err(|e| MutationError::from_store(e, MutationStage::Persisting, ENTITY, ""))?;

        self.cache.revalidate(CATEGORIES_PATH).await;
        info!(count, "Published draft categories");
        Ok(count)
    }

    async fn hide_empty(&self, caller: Option<&Caller>) -> Result<u64, MutationError> {
        authorize(caller, HIDE_EMPTY)?;

        let empty = self.empty_category_ids().await?;
        let count = if empty.is_empty() {
            0
        } else {
            self.categories
                .set_categories_active(&empty, false)
                .await
                .map_err(|e| {
                    MutationError::from_store(e, MutationStage::Persisting, ENTITY, "")
                })?
        };

        self.cache.revalidate(CATEGORIES_PATH).await;
        info!(count, "Hid empty categories");
        Ok(count)
    }

    async fn delete_empty(&self, caller: Option<&Caller>) -> Result<u64, MutationError> {
        authorize(caller, DELETE_EMPTY)?;

        let empty = self.empty_category_ids().await?;
        let count = if empty.is_empty() {
            0
        } else {
            self.categories
                .delete_categories(&empty)
                .await
                .map_err(|e| {
                    MutationError::from_store(e, MutationStage::Persisting, ENTITY, "")
                })?
        };

        self.cache.revalidate(CATEGORIES_PATH).await;
        info!(count, "Deleted empty categories");
        Ok(count)
    }

    async fn empty_category_ids(&self) -> Result<Vec<CategoryId>, MutationError> {
        let categories = self
            .categories
            .list_categories()
            .await
            .map_err(|e| MutationError::from_store(e, MutationStage::Validating, ENTITY, ""))?;

        let empty: Vec<CategoryId> = categories
            .iter()
            .filter(|c| c.is_empty())
            .map(|c| c.id)
            .collect();
        debug!(total = categories.len(), empty = empty.len(), "Selected empty categories");
        Ok(empty)
    }

    async fn allocate(&self, name: &str, excluding: Option<&str>) -> Result<Slug, MutationError> {
        allocate_slug(name, ENTITY, excluding, |prefix| async move {
            self.categories.category_slugs_with_prefix(&prefix).await
        })
        .await
    }

    async fn load(&self, id: CategoryId) -> Result<Category, MutationError> {
        self.categories
            .find_category(id)
            .await
            .map_err(|e| MutationError::from_store(e, MutationStage::Validating, ENTITY, ""))?
            .ok_or(MutationError::NotFound { entity: ENTITY })
    }

    /// Upload the image as `{slug}/{slug}-{timestamp}.{ext}`.
    async fn store_image(&self, slug: &Slug, upload: &ImageUpload) -> Result<String, MutationError> {
        let path = format!(
            "{slug}/{slug}-{}.{}",
            upload_timestamp(),
            upload.extension()
        );
        let url = self.storage.upload(&self.bucket, &path, upload).await?;
        debug!(%path, "Uploaded category image");
        Ok(url)
    }

    async fn remove_image(&self, url: &str) {
        let Some(path) = object_path_from_url(url, &self.bucket) else {
            return;
        };
        if let Err(e) = self.storage.remove(&self.bucket, &[path]).await {
            warn!(error = %e, "Failed to remove replaced category image");
        }
    }
}

impl std::fmt::Debug for CategoryService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CategoryService")
            .field("bucket", &self.bucket)
            .finish_non_exhaustive()
    }
}
