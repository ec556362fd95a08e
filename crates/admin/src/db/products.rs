//! Product queries.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use tracing::{debug, instrument};
use uuid::Uuid;

use shopwright_core::{CategoryId, Price, ProductId, Slug};

use super::{PgStore, require_row};
use crate::models::{Product, ProductFields};
use crate::ports::{ProductStore, StoreError};

// =============================================================================
// Internal Row Types
// =============================================================================

#[derive(Debug, sqlx::FromRow)]
struct ProductRow {
    id: Uuid,
    name: String,
    slug: String,
    description: Option<String>,
    price: Decimal,
    compare_price: Option<Decimal>,
    category_id: Uuid,
    stock: i32,
    sku: Option<String>,
    images: Vec<String>,
    primary_image: Option<String>,
    is_active: bool,
    created_at: DateTime<Utc>,
}

impl TryFrom<ProductRow> for Product {
    type Error = StoreError;

    fn try_from(row: ProductRow) -> Result<Self, Self::Error> {
        let slug = Slug::parse(&row.slug)
            .map_err(|e| StoreError::DataCorruption(format!("invalid product slug: {e}")))?;
        let price = Price::new(row.price)
            .map_err(|e| StoreError::DataCorruption(format!("invalid product price: {e}")))?;
        let compare_price = row
            .compare_price
            .map(Price::new)
            .transpose()
            .map_err(|e| StoreError::DataCorruption(format!("invalid compare price: {e}")))?;

        Ok(Self {
            id: ProductId::new(row.id),
            name: row.name,
            slug,
            description: row.description,
            price,
            compare_price,
            category_id: CategoryId::new(row.category_id),
            stock: row.stock,
            sku: row.sku,
            images: row.images,
            primary_image: row.primary_image,
            is_active: row.is_active,
            created_at: row.created_at,
        })
    }
}

const PRODUCT_COLUMNS: &str = "id, name, slug, description, price, compare_price, category_id, \
     stock, sku, images, primary_image, is_active, created_at";

// =============================================================================
// Store
// =============================================================================

#[async_trait]
impl ProductStore for PgStore {
    #[instrument(skip(self))]
    async fn product_slugs_with_prefix(&self, prefix: &str) -> Result<Vec<String>, StoreError> {
        let slugs = sqlx::query_scalar::<_, String>(
            r"
            SELECT slug FROM products
            WHERE left(slug, char_length($1)) = $1
            ",
        )
        .bind(prefix)
        .fetch_all(self.pool())
        .await?;

        debug!(count = slugs.len(), "Loaded product slugs");
        Ok(slugs)
    }

    #[instrument(skip(self))]
    async fn find_product(&self, id: ProductId) -> Result<Option<Product>, StoreError> {
        let row = sqlx::query_as::<_, ProductRow>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE id = $1"
        ))
        .bind(id.as_uuid())
        .fetch_optional(self.pool())
        .await?;

        row.map(TryInto::try_into).transpose()
    }

    #[instrument(skip(self))]
    async fn list_products(&self) -> Result<Vec<Product>, StoreError> {
        let rows = sqlx::query_as::<_, ProductRow>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products ORDER BY created_at DESC"
        ))
        .fetch_all(self.pool())
        .await?;

        rows.into_iter().map(TryInto::try_into).collect()
    }

    #[instrument(skip(self, fields), fields(slug = %fields.slug))]
    async fn insert_product(&self, fields: &ProductFields) -> Result<ProductId, StoreError> {
        let id: Uuid = sqlx::query_scalar(
            r"
            INSERT INTO products
                (name, slug, description, price, compare_price, category_id,
                 stock, sku, images, primary_image, is_active)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            RETURNING id
            ",
        )
        .bind(&fields.name)
        .bind(fields.slug.as_str())
        .bind(&fields.description)
        .bind(fields.price.amount())
        .bind(fields.compare_price.map(|p| p.amount()))
        .bind(fields.category_id.as_uuid())
        .bind(fields.stock)
        .bind(&fields.sku)
        .bind(&fields.images)
        .bind(fields.primary_image())
        .bind(fields.is_active)
        .fetch_one(self.pool())
        .await?;

        debug!(%id, "Inserted product");
        Ok(ProductId::new(id))
    }

    #[instrument(skip(self, fields), fields(slug = %fields.slug))]
    async fn update_product(
        &self,
        id: ProductId,
        fields: &ProductFields,
    ) -> Result<(), StoreError> {
        let result = sqlx::query(
            r"
            UPDATE products SET
                name = $2, slug = $3, description = $4, price = $5,
                compare_price = $6, category_id = $7, stock = $8, sku = $9,
                images = $10, primary_image = $11, is_active = $12
            WHERE id = $1
            ",
        )
        .bind(id.as_uuid())
        .bind(&fields.name)
        .bind(fields.slug.as_str())
        .bind(&fields.description)
        .bind(fields.price.amount())
        .bind(fields.compare_price.map(|p| p.amount()))
        .bind(fields.category_id.as_uuid())
        .bind(fields.stock)
        .bind(&fields.sku)
        .bind(&fields.images)
        .bind(fields.primary_image())
        .bind(fields.is_active)
        .execute(self.pool())
        .await?;

        require_row(result.rows_affected())
    }

    #[instrument(skip(self))]
    async fn delete_product(&self, id: ProductId) -> Result<(), StoreError> {
        let result = sqlx::query("DELETE FROM products WHERE id = $1")
            .bind(id.as_uuid())
            .execute(self.pool())
            .await?;

        require_row(result.rows_affected())
    }
}
