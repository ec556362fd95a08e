//! Slug preview.
//!
//! # Usage
//!
//! ```bash
//! # Against an explicit set of taken slugs
//! sw-cli slug preview "Classic White T-Shirt" -t classic-white-t-shirt
//!
//! # Against the live products table
//! sw-cli slug preview "Classic White T-Shirt" --table products
//! ```

use shopwright_admin::db::{PgStore, create_pool};
use shopwright_admin::ports::{CategoryStore, ProductStore};
use shopwright_core::slug::{allocate_unique, normalize};

use super::CommandError;
use super::migrate::database_url;

/// Table whose slugs count as taken.
#[derive(Debug, Clone, Copy)]
pub enum Table {
    Products,
    Categories,
}

/// Print the slug `name` would be allocated.
pub async fn preview(
    name: &str,
    mut taken: Vec<String>,
    table: Option<Table>,
) -> Result<(), CommandError> {
    if let Some(table) = table {
        let pool = create_pool(&database_url()?).await?;
        let store = PgStore::new(pool);
        let base = normalize(name);

        let stored = match table {
            Table::Products => store.product_slugs_with_prefix(&base).await?,
            Table::Categories => store.category_slugs_with_prefix(&base).await?,
        };
        tracing::debug!(count = stored.len(), "Loaded stored slugs");
        taken.extend(stored);
    }

    let slug = allocate_unique(name, &taken, None)?;

    #[allow(clippy::print_stdout)]
    {
        println!("{slug}");
    }
    Ok(())
}
