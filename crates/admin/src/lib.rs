//! Shopwright Admin library.
//!
//! Catalog mutation services for the admin dashboard: product and category
//! CRUD with image storage, bulk category operations, cached catalog reads,
//! and account operations.
//!
//! # Layout
//!
//! - [`services`] - Orchestration: authorize, validate, allocate slug,
//!   store images, persist, revalidate
//! - [`ports`] - Collaborator traits (stores, object storage, identity, cache)
//! - [`db`], [`storage`], [`identity`], [`cache`] - Production collaborators
//! - [`models`] - Entities, form inputs and validation
//!
//! # Security
//!
//! This crate holds the Supabase service-role key, which bypasses row level
//! security. Every write goes through the authorization gate in
//! [`services::authorize`].

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod cache;
pub mod config;
pub mod db;
pub mod error;
pub mod identity;
pub mod models;
pub mod ports;
pub mod services;
pub mod state;
pub mod storage;
pub mod telemetry;
