//! Database operations for the API `PostgreSQL` database.
//!
//! ## Tables
//!
//! - `users` - Phone-authenticated customers and warehouse staff
//! - `units_of_measure`, `categories`, `products` - Local catalog
//! - `delivery_zones` - Serviceable zip codes
//! - `orders`, `order_items` - Placed orders with address and price snapshots
//! - `addresses` - Saved delivery addresses
//! - `coupons` - Flat-discount codes
//! - `subscriptions` - Recurring product deliveries
//! - `wishlist_entries` - Saved products
//!
//! # Migrations
//!
//! Migrations are stored in `crates/api/migrations/` and run via:
//! ```bash
//! cargo run -p sabzi-cli -- migrate
//! ```

pub mod addresses;
pub mod catalog;
pub mod coupons;
pub mod delivery_zones;
pub mod orders;
pub mod subscriptions;
pub mod users;
pub mod wishlist;

use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

pub use addresses::AddressRepository;
pub use catalog::{CatalogRepository, ExternalProductUpsert, ProductUpsert};
pub use coupons::CouponRepository;
pub use delivery_zones::DeliveryZoneRepository;
pub use orders::OrderRepository;
pub use subscriptions::{NewSubscription, SubscriptionRepository};
pub use users::UserRepository;
pub use wishlist::WishlistRepository;

/// Errors that can occur during repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Data in the database is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// Requested entity was not found.
    #[error("not found")]
    NotFound,

    /// Constraint violation (e.g., duplicate slug).
    #[error("constraint violation: {0}")]
    Conflict(String),
}

impl RepositoryError {
    /// Map unique violations to [`RepositoryError::Conflict`].
    pub(crate) fn from_insert(e: sqlx::Error, what: &str) -> Self {
        if let sqlx::Error::Database(ref db_err) = e
            && db_err.is_unique_violation()
        {
            return Self::Conflict(format!("{what} already exists"));
        }
        Self::Database(e)
    }
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &SecretString) -> Result<PgPool, sqlx::Error> {
    pool_options().connect(database_url.expose_secret()).await
}

/// Create a pool that connects on first use.
///
/// Used by tests and tooling that build the router without a live database.
///
/// # Errors
///
/// Returns `sqlx::Error` if the URL cannot be parsed.
pub fn create_lazy_pool(database_url: &SecretString) -> Result<PgPool, sqlx::Error> {
    pool_options()
        .min_connections(0)
        .connect_lazy(database_url.expose_secret())
}

fn pool_options() -> PgPoolOptions {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
}
