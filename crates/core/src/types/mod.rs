//! Core types for Shopwright.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod id;
pub mod price;
pub mod role;
pub mod slug;

pub use id::*;
pub use price::{Price, PriceError};
pub use role::{Role, RoleParseError};
pub use slug::{Slug, SlugError};
