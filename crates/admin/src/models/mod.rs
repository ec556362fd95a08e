//! Domain models for the admin dashboard.
//!
//! Persisted records (`Product`, `Category`, `Profile`), the field sets
//! written to storage, and the raw form types with their validation.

pub mod category;
pub mod product;
pub mod profile;
pub mod session;
pub mod upload;
pub mod validation;

pub use category::{Category, CategoryFields, CategoryForm, ValidCategory};
pub use product::{Product, ProductFields, ProductForm, ValidProduct};
pub use profile::{Profile, ProfileFields, ProfileForm};
pub use session::{Caller, role_of};
pub use upload::{ImageUpload, MAX_IMAGE_BYTES};
pub use validation::FieldError;
