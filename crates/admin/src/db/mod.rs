//! `PostgreSQL` persistence for the catalog.
//!
//! # Tables
//!
//! - `categories` - Product categories (`slug` unique)
//! - `products` - Products with image URLs (`slug` unique)
//! - `profiles` - Per-user profile details
//!
//! # Migrations
//!
//! Migrations are stored in `crates/admin/migrations/` and run via:
//! ```bash
//! cargo run -p shopwright-cli -- migrate
//! ```

mod categories;
mod products;
mod profiles;

use std::time::Duration;

use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::migrate::Migrator;
use sqlx::postgres::PgPoolOptions;

use crate::ports::StoreError;

/// Embedded schema migrations.
pub static MIGRATOR: Migrator = sqlx::migrate!("./migrations");

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(1)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}

/// Catalog and profile store backed by `PostgreSQL`.
///
/// Implements [`ProductStore`](crate::ports::ProductStore),
/// [`CategoryStore`](crate::ports::CategoryStore) and
/// [`ProfileStore`](crate::ports::ProfileStore).
#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    /// Wrap an existing pool.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// The underlying pool.
    #[must_use]
    pub const fn pool(&self) -> &PgPool {
        &self.pool
    }
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        match &err {
            sqlx::Error::RowNotFound => Self::NotFound,
            sqlx::Error::Database(db) if db.is_unique_violation() => {
                Self::Conflict(db.constraint().unwrap_or("unique constraint").to_string())
            }
            sqlx::Error::Database(db) if db.is_foreign_key_violation() => {
                Self::Database(format!("record is still referenced: {}", db.message()))
            }
            _ => Self::Database(err.to_string()),
        }
    }
}

/// Fail with [`StoreError::NotFound`] when a write touched no rows.
const fn require_row(rows_affected: u64) -> Result<(), StoreError> {
    if rows_affected == 0 {
        Err(StoreError::NotFound)
    } else {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_row_not_found_maps_to_not_found() {
        assert_eq!(StoreError::from(sqlx::Error::RowNotFound), StoreError::NotFound);
    }

    #[test]
    fn test_other_errors_keep_message() {
        let err = StoreError::from(sqlx::Error::PoolTimedOut);
        assert!(matches!(err, StoreError::Database(msg) if msg.contains("timed out")));
    }

    #[test]
    fn test_require_row() {
        assert_eq!(require_row(0), Err(StoreError::NotFound));
        assert_eq!(require_row(1), Ok(()));
    }
}
