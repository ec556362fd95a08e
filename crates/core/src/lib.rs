//! Shopwright Core - Shared types library.
//!
//! This crate provides the pure building blocks used by every Shopwright
//! component:
//! - `admin` - Catalog mutation services and their collaborators
//! - `cli` - Operator command-line tools
//!
//! # Architecture
//!
//! The core crate contains only types and pure functions - no I/O, no
//! database access, no HTTP clients. Slug allocation and the authorization
//! gate live here so they can be tested without any collaborator.
//!
//! # Modules
//!
//! - [`types`] - IDs, prices, role claims and slugs

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
