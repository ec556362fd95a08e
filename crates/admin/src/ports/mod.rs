//! Collaborator interfaces used by the mutation services.
//!
//! Each port is an `async_trait` so adapters (`PgStore`, `SupabaseStorage`,
//! `SupabaseAuth`, `ListingCache`) and in-memory fakes are interchangeable
//! behind `Arc<dyn ...>`.

pub mod cache;
pub mod catalog;
pub mod identity;
pub mod storage;

pub use cache::{CATEGORIES_PATH, CacheInvalidator, PRODUCTS_PATH, ROOT_PATH};
pub use catalog::{CategoryStore, ProductStore, ProfileStore, StoreError};
pub use identity::{IdentityAdmin, IdentityError, SessionProvider};
pub use storage::{ObjectStorage, StorageError, object_path_from_url};

#[cfg(test)]
pub use cache::MockCacheInvalidator;
#[cfg(test)]
pub use catalog::{MockCategoryStore, MockProductStore, MockProfileStore};
#[cfg(test)]
pub use identity::{MockIdentityAdmin, MockSessionProvider};
#[cfg(test)]
pub use storage::MockObjectStorage;
