//! Product domain types and form validation.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use shopwright_core::{CategoryId, Price, PriceError, ProductId, Slug};

use super::upload::ImageUpload;
use super::validation::{FieldError, optional_text, required_text};

/// A persisted product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    /// Unique product ID.
    pub id: ProductId,
    /// Display name.
    pub name: String,
    /// URL slug, unique among products.
    pub slug: Slug,
    /// Long-form description (rich text HTML).
    pub description: Option<String>,
    /// Selling price.
    pub price: Price,
    /// Original price shown struck through, if on sale.
    pub compare_price: Option<Price>,
    /// Category the product belongs to.
    pub category_id: CategoryId,
    /// Units in stock.
    pub stock: i32,
    /// Stock keeping unit.
    pub sku: Option<String>,
    /// Public image URLs, in display order.
    pub images: Vec<String>,
    /// First image, used for listings.
    pub primary_image: Option<String>,
    /// Whether the product is visible on the storefront.
    pub is_active: bool,
    /// When the product was created.
    pub created_at: DateTime<Utc>,
}

/// Everything written to storage when creating or updating a product.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductFields {
    pub name: String,
    pub slug: Slug,
    pub description: Option<String>,
    pub price: Price,
    pub compare_price: Option<Price>,
    pub category_id: CategoryId,
    pub stock: i32,
    pub sku: Option<String>,
    pub images: Vec<String>,
    pub is_active: bool,
}

impl ProductFields {
    /// The listing image (first image), if any.
    #[must_use]
    pub fn primary_image(&self) -> Option<&str> {
        self.images.first().map(String::as_str)
    }
}

/// Raw product form submission.
///
/// Numeric fields arrive as text, exactly as the browser sent them.
#[derive(Debug, Clone, Default)]
pub struct ProductForm {
    pub name: String,
    pub description: Option<String>,
    pub price: String,
    pub compare_price: Option<String>,
    pub category: String,
    pub stock: String,
    pub sku: Option<String>,
    pub is_active: bool,
    /// Newly attached image files.
    pub images: Vec<ImageUpload>,
    /// Existing image URLs to keep (update only).
    pub retained_images: Vec<String>,
}

/// Product form fields after validation, before slug and image handling.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidProduct {
    pub name: String,
    pub description: Option<String>,
    pub price: Price,
    pub compare_price: Option<Price>,
    pub category_id: CategoryId,
    pub stock: i32,
    pub sku: Option<String>,
    pub is_active: bool,
}

impl ValidProduct {
    /// Combine with the allocated slug and final image list.
    #[must_use]
    pub fn into_fields(self, slug: Slug, images: Vec<String>) -> ProductFields {
        ProductFields {
            name: self.name,
            slug,
            description: self.description,
            price: self.price,
            compare_price: self.compare_price,
            category_id: self.category_id,
            stock: self.stock,
            sku: self.sku,
            images,
            is_active: self.is_active,
        }
    }
}

impl ProductForm {
    /// Minimum selling price.
    pub const MIN_PRICE: Decimal = Decimal::ONE;

    /// Validate the text fields of the form.
    ///
    /// Image requirements depend on whether this is a create or an update and
    /// are checked by the caller.
    ///
    /// # Errors
    ///
    /// Returns the first invalid field in form order.
    pub fn validate(&self) -> Result<ValidProduct, FieldError> {
        let name = required_text("name", &self.name, "Product name is required")?;

        let price = Price::parse_at_least(&self.price, Self::MIN_PRICE)
            .map_err(|e| price_error("price", &e))?;

        let compare_price = match optional_text(self.compare_price.as_deref()) {
            Some(raw) => Some(
                Price::parse_at_least(&raw, Decimal::ZERO)
                    .map_err(|e| price_error("compare_price", &e))?,
            ),
            None => None,
        };

        let category = required_text("category", &self.category, "Category is required")?;
        let category_id = category
            .parse::<CategoryId>()
            .map_err(|_| FieldError::new("category", "Category is not valid"))?;

        let stock = parse_stock(&self.stock)?;

        Ok(ValidProduct {
            name,
            description: optional_text(self.description.as_deref()),
            price,
            compare_price,
            category_id,
            stock,
            sku: optional_text(self.sku.as_deref()),
            is_active: self.is_active,
        })
    }

    /// Attached files that actually carry data.
    pub fn non_empty_images(&self) -> impl Iterator<Item = &ImageUpload> {
        self.images.iter().filter(|image| !image.is_empty())
    }
}

fn price_error(field: &'static str, err: &PriceError) -> FieldError {
    let reason = match (field, err) {
        ("price", PriceError::Missing) => "Price is required".to_string(),
        ("price", PriceError::Negative | PriceError::BelowMinimum(_)) => {
            "Price must be at least 1".to_string()
        }
        (_, PriceError::Negative | PriceError::BelowMinimum(_)) => {
            "Compare price must be at least 0".to_string()
        }
        (_, PriceError::NotNumeric(_) | PriceError::Missing) => "must be a number".to_string(),
    };
    FieldError::new(field, reason)
}

/// Blank stock means zero, matching the form default.
fn parse_stock(raw: &str) -> Result<i32, FieldError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Ok(0);
    }
    let stock = trimmed
        .parse::<i32>()
        .map_err(|_| FieldError::new("stock", "Stock must be a whole number"))?;
    if stock < 0 {
        return Err(FieldError::new("stock", "Stock must be at least 0"));
    }
    Ok(stock)
}
