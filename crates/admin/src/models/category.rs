//! Category domain types and form validation.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use shopwright_core::{CategoryId, Slug};

use super::upload::{ImageUpload, MAX_IMAGE_BYTES};
use super::validation::{FieldError, max_chars, optional_text, required_text};

/// Longest accepted category name, in characters.
pub const MAX_NAME_CHARS: usize = 50;
/// Longest accepted category description, in characters.
pub const MAX_DESCRIPTION_CHARS: usize = 500;

/// A persisted category, with the number of products filed under it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: CategoryId,
    pub name: String,
    pub slug: Slug,
    pub description: Option<String>,
    /// Public image URL.
    pub image: Option<String>,
    /// Draft categories are inactive.
    pub is_active: bool,
    /// Derived from the products table; never written directly.
    pub product_count: i64,
    pub created_at: DateTime<Utc>,
}

impl Category {
    /// Whether no products reference this category.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.product_count == 0
    }
}

/// Everything written to storage when creating or updating a category.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryFields {
    pub name: String,
    pub slug: Slug,
    pub description: Option<String>,
    pub image: Option<String>,
    pub is_active: bool,
}

/// Raw category form submission.
#[derive(Debug, Clone, Default)]
pub struct CategoryForm {
    pub name: String,
    pub description: Option<String>,
    pub is_active: bool,
    /// A newly attached image, replacing any existing one.
    pub image: Option<ImageUpload>,
    /// Existing image URL to keep when no new file is attached.
    pub image_url: Option<String>,
}

/// Category form fields after validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidCategory {
    pub name: String,
    pub description: Option<String>,
    pub is_active: bool,
}

impl ValidCategory {
    /// Combine with the allocated slug and final image URL.
    #[must_use]
    pub fn into_fields(self, slug: Slug, image: Option<String>) -> CategoryFields {
        CategoryFields {
            name: self.name,
            slug,
            description: self.description,
            image,
            is_active: self.is_active,
        }
    }
}

impl CategoryForm {
    /// Validate the form, including the attached image size.
    ///
    /// # Errors
    ///
    /// Returns the first invalid field in form order.
    pub fn validate(&self) -> Result<ValidCategory, FieldError> {
        let name = required_text("name", &self.name, "Category name is required")?;
        max_chars("name", &name, MAX_NAME_CHARS)?;

        let description = optional_text(self.description.as_deref());
        if let Some(description) = &description {
            max_chars("description", description, MAX_DESCRIPTION_CHARS)?;
        }

        if let Some(image) = self.attached_image()
            && image.len() > MAX_IMAGE_BYTES
        {
            return Err(FieldError::new("image", "Image must be 2 MiB or smaller"));
        }

        Ok(ValidCategory {
            name,
            description,
            is_active: self.is_active,
        })
    }

    /// The attached image, ignoring empty file inputs.
    #[must_use]
    pub fn attached_image(&self) -> Option<&ImageUpload> {
        self.image.as_ref().filter(|image| !image.is_empty())
    }
}
