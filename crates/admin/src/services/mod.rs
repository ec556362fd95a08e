//! Business logic services for the admin dashboard.
//!
//! # Services
//!
//! - `products` - Create, update and delete products
//! - `categories` - Category CRUD and bulk publish/hide/delete
//! - `account` - Demo-admin elevation and profile updates
//! - `listings` - Cached catalog reads for the dashboard
//!
//! Every operation takes the caller explicitly and checks the role gate
//! before reading any submitted field.

pub mod account;
pub mod categories;
pub mod listings;
pub mod products;

use std::future::Future;

use shopwright_core::Slug;
use shopwright_core::types::slug;

use crate::error::{MutationError, MutationStage};
use crate::models::{Caller, role_of};
use crate::ports::StoreError;

pub use account::AccountService;
pub use categories::CategoryService;
pub use listings::CatalogService;
pub use products::ProductService;

/// Fail unless the caller may mutate data.
///
/// # Errors
///
/// Returns [`MutationError::Unauthorized`] for anonymous callers, demo admins
/// and anyone else without the `admin` role.
pub fn authorize(caller: Option<&Caller>, action: &'static str) -> Result<(), MutationError> {
    if role_of(caller).has_read_write_access() {
        Ok(())
    } else {
        Err(MutationError::Unauthorized { action })
    }
}

/// Fail unless the caller may view the dashboard.
///
/// # Errors
///
/// Returns [`MutationError::Unauthorized`] unless the caller is an admin or
/// demo admin.
pub fn authorize_read(caller: Option<&Caller>, action: &'static str) -> Result<(), MutationError> {
    if role_of(caller).has_dashboard_access() {
        Ok(())
    } else {
        Err(MutationError::Unauthorized { action })
    }
}

/// Allocate a unique slug for `name` in one collection.
///
/// `existing_with_prefix` loads the collection's slugs that start with the
/// normalized base. `excluding` is the record's own slug on rename.
pub(crate) async fn allocate_slug<F, Fut>(
    name: &str,
    entity: &'static str,
    excluding: Option<&str>,
    existing_with_prefix: F,
) -> Result<Slug, MutationError>
where
    F: FnOnce(String) -> Fut,
    Fut: Future<Output = Result<Vec<String>, StoreError>>,
{
    let conflict = || MutationError::SlugConflict {
        name: name.to_string(),
    };

    let base = slug::normalize(name);
    if base.is_empty() {
        return Err(conflict());
    }

    let existing = existing_with_prefix(base)
        .await
        .map_err(|e| MutationError::from_store(e, MutationStage::AllocatingSlug, entity, name))?;

    slug::allocate_unique(name, &existing, excluding).map_err(|_| conflict())
}

/// Milliseconds since the epoch, used to keep object paths unique.
pub(crate) fn upload_timestamp() -> i64 {
    chrono::Utc::now().timestamp_millis()
}
