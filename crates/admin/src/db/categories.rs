//! Category queries. Product counts are computed with a join, never stored.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tracing::{debug, instrument};
use uuid::Uuid;

use shopwright_core::{CategoryId, Slug};

use super::{PgStore, require_row};
use crate::models::{Category, CategoryFields};
use crate::ports::{CategoryStore, StoreError};

#[derive(Debug, sqlx::FromRow)]
struct CategoryRow {
    id: Uuid,
    name: String,
    slug: String,
    description: Option<String>,
    image: Option<String>,
    is_active: bool,
    product_count: i64,
    created_at: DateTime<Utc>,
}

impl TryFrom<CategoryRow> for Category {
    type Error = StoreError;

    fn try_from(row: CategoryRow) -> Result<Self, Self::Error> {
        let slug = Slug::parse(&row.slug)
            .map_err(|e| StoreError::DataCorruption(format!("invalid category slug: {e}")))?;

        Ok(Self {
            id: CategoryId::new(row.id),
            name: row.name,
            slug,
            description: row.description,
            image: row.image,
            is_active: row.is_active,
            product_count: row.product_count,
            created_at: row.created_at,
        })
    }
}

const SELECT_WITH_COUNT: &str = r"
    SELECT c.id, c.name, c.slug, c.description, c.image, c.is_active, c.created_at,
           COUNT(p.id) AS product_count
    FROM categories c
    LEFT JOIN products p ON p.category_id = c.id
";

fn uuids(ids: &[CategoryId]) -> Vec<Uuid> {
    ids.iter().map(CategoryId::as_uuid).collect()
}

#[async_trait]
impl CategoryStore for PgStore {
    #[instrument(skip(self))]
    async fn category_slugs_with_prefix(&self, prefix: &str) -> Result<Vec<String>, StoreError> {
        let slugs = sqlx::query_scalar::<_, String>(
            r"
            SELECT slug FROM categories
            WHERE left(slug, char_length($1)) = $1
            ",
        )
        .bind(prefix)
        .fetch_all(self.pool())
        .await?;

        debug!(count = slugs.len(), "Loaded category slugs");
        Ok(slugs)
    }

    #[instrument(skip(self))]
    async fn find_category(&self, id: CategoryId) -> Result<Option<Category>, StoreError> {
        let row = sqlx::query_as::<_, CategoryRow>(&format!(
            "{SELECT_WITH_COUNT} WHERE c.id = $1 GROUP BY c.id"
        ))
        .bind(id.as_uuid())
        .fetch_optional(self.pool())
        .await?;

        row.map(TryInto::try_into).transpose()
    }

    #[instrument(skip(self))]
    async fn list_categories(&self) -> Result<Vec<Category>, StoreError> {
        let rows = sqlx::query_as::<_, CategoryRow>(&format!(
            "{SELECT_WITH_COUNT} GROUP BY c.id ORDER BY c.created_at DESC"
        ))
        .fetch_all(self.pool())
        .await?;

        rows.into_iter().map(TryInto::try_into).collect()
    }

    #[instrument(skip(self, fields), fields(slug = %fields.slug))]
    async fn insert_category(&self, fields: &CategoryFields) -> Result<CategoryId, StoreError> {
        let id: Uuid = sqlx::query_scalar(
            r"
            INSERT INTO categories (name, slug, description, image, is_active)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id
            ",
        )
        .bind(&fields.name)
        .bind(fields.slug.as_str())
        .bind(&fields.description)
        .bind(&fields.image)
        .bind(fields.is_active)
        .fetch_one(self.pool())
        .await?;

        debug!(%id, "Inserted category");
        Ok(CategoryId::new(id))
    }

    #[instrument(skip(self, fields), fields(slug = %fields.slug))]
    async fn update_category(
        &self,
        id: CategoryId,
        fields: &CategoryFields,
    ) -> Result<(), StoreError> {
        let result = sqlx::query(
            r"
            UPDATE categories
            SET name = $2, slug = $3, description = $4, image = $5, is_active = $6
            WHERE id = $1
            ",
        )
        .bind(id.as_uuid())
        .bind(&fields.name)
        .bind(fields.slug.as_str())
        .bind(&fields.description)
        .bind(&fields.image)
        .bind(fields.is_active)
        .execute(self.pool())
        .await?;

        require_row(result.rows_affected())
    }

    #[instrument(skip(self))]
    async fn delete_category(&self, id: CategoryId) -> Result<(), StoreError> {
        let result = sqlx::query("DELETE FROM categories WHERE id = $1")
            .bind(id.as_uuid())
            .execute(self.pool())
            .await?;

        require_row(result.rows_affected())
    }

    #[instrument(skip(self))]
    async fn publish_inactive_categories(&self) -> Result<u64, StoreError> {
        let result = sqlx::query("UPDATE categories SET is_active = true WHERE NOT is_active")
            .execute(self.pool())
            .await?;

        Ok(result.rows_affected())
    }

    #[instrument(skip(self, ids), fields(count = ids.len()))]
    async fn set_categories_active(
        &self,
        ids: &[CategoryId],
        active: bool,
    ) -> Result<u64, StoreError> {
        let result = sqlx::query("UPDATE categories SET is_active = $2 WHERE id = ANY($1)")
            .bind(uuids(ids))
            .bind(active)
            .execute(self.pool())
            .await?;

        Ok(result.rows_affected())
    }

    #[instrument(skip(self, ids), fields(count = ids.len()))]
    async fn delete_categories(&self, ids: &[CategoryId]) -> Result<u64, StoreError> {
        let result = sqlx::query("DELETE FROM categories WHERE id = ANY($1)")
            .bind(uuids(ids))
            .execute(self.pool())
            .await?;

        Ok(result.rows_affected())
    }
}
