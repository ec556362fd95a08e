//! Database migration command.
//!
//! # Usage
//!
//! ```bash
//! sw-cli migrate
//! ```
//!
//! # Environment Variables
//!
//! - `SHOPWRIGHT_DATABASE_URL` - `PostgreSQL` connection string (falls back to `DATABASE_URL`)
//!
//! # Migration Files
//!
//! Migrations live in `crates/admin/migrations/` and are embedded in the
//! binary:
//! ```text
//! migrations/
//! ├── 20260301000001_create_categories.sql
//! ├── 20260301000002_create_products.sql
//! └── 20260301000003_create_profiles.sql
//! ```

use secrecy::SecretString;

use shopwright_admin::db::{MIGRATOR, create_pool};

use super::CommandError;

/// Database URL from the environment, primary variable first.
pub fn database_url() -> Result<SecretString, CommandError> {
    std::env::var("SHOPWRIGHT_DATABASE_URL")
        .or_else(|_| std::env::var("DATABASE_URL"))
        .map(SecretString::from)
        .map_err(|_| CommandError::MissingEnvVar("SHOPWRIGHT_DATABASE_URL"))
}

/// Run all pending migrations.
pub async fn run() -> Result<(), CommandError> {
    let database_url = database_url()?;

    tracing::info!("Connecting to database...");
    let pool = create_pool(&database_url).await?;

    tracing::info!("Running migrations...");
    MIGRATOR.run(&pool).await?;

    tracing::info!("Migrations complete!");
    Ok(())
}
