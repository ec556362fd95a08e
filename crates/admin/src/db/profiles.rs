//! Profile queries.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tracing::instrument;
use uuid::Uuid;

use shopwright_core::UserId;

use super::PgStore;
use crate::models::{Profile, ProfileFields};
use crate::ports::{ProfileStore, StoreError};

#[derive(Debug, sqlx::FromRow)]
struct ProfileRow {
    user_id: Uuid,
    name: String,
    photo_url: Option<String>,
    phone: Option<String>,
    age: Option<i16>,
    gender: Option<String>,
    updated_at: DateTime<Utc>,
}

impl From<ProfileRow> for Profile {
    fn from(row: ProfileRow) -> Self {
        Self {
            user_id: UserId::new(row.user_id),
            name: row.name,
            photo_url: row.photo_url,
            phone: row.phone,
            age: row.age,
            gender: row.gender,
            updated_at: row.updated_at,
        }
    }
}

#[async_trait]
impl ProfileStore for PgStore {
    #[instrument(skip(self))]
    async fn find_profile(&self, user: UserId) -> Result<Option<Profile>, StoreError> {
        let row = sqlx::query_as::<_, ProfileRow>(
            r"
            SELECT user_id, name, photo_url, phone, age, gender, updated_at
            FROM profiles
            WHERE user_id = $1
            ",
        )
        .bind(user.as_uuid())
        .fetch_optional(self.pool())
        .await?;

        Ok(row.map(Into::into))
    }

    #[instrument(skip(self, fields))]
    async fn upsert_profile(
        &self,
        user: UserId,
        fields: &ProfileFields,
    ) -> Result<Profile, StoreError> {
        let row = sqlx::query_as::<_, ProfileRow>(
            r"
            INSERT INTO profiles (user_id, name, photo_url, phone, age, gender, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, now())
            ON CONFLICT (user_id) DO UPDATE SET
                name = EXCLUDED.name,
                photo_url = EXCLUDED.photo_url,
                phone = EXCLUDED.phone,
                age = EXCLUDED.age,
                gender = EXCLUDED.gender,
                updated_at = now()
            RETURNING user_id, name, photo_url, phone, age, gender, updated_at
            ",
        )
        .bind(user.as_uuid())
        .bind(&fields.name)
        .bind(&fields.photo_url)
        .bind(&fields.phone)
        .bind(fields.age)
        .bind(&fields.gender)
        .fetch_one(self.pool())
        .await?;

        Ok(row.into())
    }
}
