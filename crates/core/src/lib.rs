//! Sabzi Core - Shared domain types.
//!
//! This crate provides the types used across the backend components:
//! - `api` - The HTTP API serving the mobile and web clients
//! - `cli` - Command-line tools for migrations, seeding and catalog sync
//!
//! # Architecture
//!
//! The core crate contains only types and pure rules - no I/O, no database
//! access, no HTTP clients. Database encodings are available behind the
//! `postgres` feature.
//!
//! # Modules
//!
//! - [`types`] - Typed IDs, phone numbers, prices, quantities and statuses

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
