//! Product and order backends.
//!
//! The catalog and order pipeline can be served from the local database or
//! from a WooCommerce store. Both sit behind [`ProductAdapter`] and
//! [`OrderAdapter`]; [`build_adapters`] picks the pair matching
//! [`CommerceBackend`] once at startup.
//!
//! # Failure semantics
//!
//! - Catalog reads from WooCommerce degrade to empty results (logged).
//! - Order sync never fails placement: callers log the error and move on.
//! - Picker weight updates surface every failure to the caller.

pub mod local;
pub mod woocommerce;

use std::sync::Arc;

use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use thiserror::Error;

use crate::config::{ApiConfig, CommerceBackend};
use crate::db::RepositoryError;
use crate::models::{Order, Product, User};

pub use local::{LocalOrderAdapter, LocalProductAdapter};
pub use woocommerce::{WooCommerceClient, WooCommerceOrderAdapter, WooCommerceProductAdapter};

/// Trust badge shown on organic products.
pub const ORGANIC_BADGE: &str = "Certified Organic";

/// Errors raised by a commerce backend.
#[derive(Debug, Error)]
pub enum CommerceError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The platform returned a non-success response.
    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    /// Failed to parse a response or build a request.
    #[error("Parse error: {0}")]
    Parse(String),

    /// The local order has no external counterpart.
    #[error("Order is not synced to WooCommerce")]
    OrderNotSynced,

    /// The local product has no external counterpart.
    #[error("Product is not mapped to WooCommerce")]
    ProductNotMapped,

    /// The external order has no line for the product.
    #[error("Item not found in WooCommerce order")]
    ItemNotFound,

    /// The backend is selected but not configured.
    #[error("Commerce backend not configured: {0}")]
    NotConfigured(&'static str),

    /// Local persistence failed.
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

/// Filters for catalog listing.
#[derive(Debug, Clone, Deserialize)]
pub struct ProductQuery {
    /// Category slug.
    pub category: Option<String>,
    /// Case-insensitive name search.
    pub search: Option<String>,
    /// 1-based page number.
    #[serde(default = "default_page")]
    pub page: u32,
    #[serde(default = "default_per_page")]
    pub per_page: u32,
}

impl Default for ProductQuery {
    fn default() -> Self {
        Self {
            category: None,
            search: None,
            page: default_page(),
            per_page: default_per_page(),
        }
    }
}

impl ProductQuery {
    /// Largest page size accepted.
    pub const MAX_PER_PAGE: u32 = 100;

    /// Clamp paging to sane bounds and drop blank filters.
    #[must_use]
    pub fn normalized(mut self) -> Self {
        self.page = self.page.max(1);
        self.per_page = self.per_page.clamp(1, Self::MAX_PER_PAGE);
        self.category = self.category.filter(|c| !c.trim().is_empty());
        self.search = self.search.filter(|s| !s.trim().is_empty());
        self
    }

    /// Row offset of the first item on this page.
    #[must_use]
    pub fn offset(&self) -> i64 {
        (i64::from(self.page) - 1) * i64::from(self.per_page)
    }
}

const fn default_page() -> u32 {
    1
}

const fn default_per_page() -> u32 {
    ProductQuery::MAX_PER_PAGE
}

/// A pricing or weight unit as exposed by the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CatalogUnit {
    /// Local unit ID; absent for external units.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<i32>,
    pub name: String,
    pub symbol: String,
}

/// A product in the shape both backends return.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CatalogProduct {
    /// Local UUID or external numeric ID.
    pub id: String,
    pub name: String,
    pub slug: String,
    pub description: String,
    pub image: Option<String>,
    pub base_price: Decimal,
    pub discounted_price: Option<Decimal>,
    pub pricing_unit: Option<CatalogUnit>,
    pub weight_value: Option<Decimal>,
    pub weight_unit: Option<CatalogUnit>,
    pub is_organic: bool,
    pub trust_badge: Option<&'static str>,
    pub is_active: bool,
    pub external_id: Option<String>,
}

impl CatalogProduct {
    /// Badge text for a product's organic flag.
    #[must_use]
    pub const fn badge_for(is_organic: bool) -> Option<&'static str> {
        if is_organic { Some(ORGANIC_BADGE) } else { None }
    }
}

/// A category in the shape both backends return.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CatalogCategory {
    pub id: String,
    pub name: String,
    pub slug: String,
    /// Image URL; empty when none.
    pub image: String,
}

/// An order line prepared for external sync.
#[derive(Debug, Clone)]
pub struct SyncLineItem {
    pub product_external_id: Option<String>,
    pub quantity: Decimal,
}

/// Everything a backend needs to mirror a placed order.
#[derive(Debug, Clone)]
pub struct OrderSync<'a> {
    pub order: &'a Order,
    pub customer: &'a User,
    pub items: &'a [SyncLineItem],
}

/// Catalog source.
#[async_trait]
pub trait ProductAdapter: Send + Sync {
    /// The backend this adapter serves.
    fn backend(&self) -> CommerceBackend;

    /// List active products matching the query.
    async fn list_products(&self, query: &ProductQuery)
    -> Result<Vec<CatalogProduct>, CommerceError>;

    /// Find a product by slug, then by ID.
    async fn get_product(&self, identifier: &str) -> Result<Option<CatalogProduct>, CommerceError>;

    /// List all categories.
    async fn list_categories(&self) -> Result<Vec<CatalogCategory>, CommerceError>;

    /// Pull the external catalog into the local `products` table.
    ///
    /// Returns the number of newly created products.
    async fn sync_to_local(&self) -> Result<u64, CommerceError>;
}

/// Order sink.
#[async_trait]
pub trait OrderAdapter: Send + Sync {
    /// Mirror a placed order; returns the external order ID when one was created.
    async fn sync_order(&self, sync: OrderSync<'_>) -> Result<Option<String>, CommerceError>;

    /// Record a picker's measured weight for one product of an order.
    ///
    /// Returns `false` when the order has no line for the product.
    async fn update_item_weight(
        &self,
        order: &Order,
        product: &Product,
        weight: Decimal,
    ) -> Result<bool, CommerceError>;
}

/// The adapter pair for the configured backend.
#[derive(Clone)]
pub struct Adapters {
    pub products: Arc<dyn ProductAdapter>,
    pub orders: Arc<dyn OrderAdapter>,
    /// Raw WooCommerce client, present whenever credentials are configured.
    pub woocommerce: Option<WooCommerceClient>,
}

/// Build the adapters selected by configuration.
///
/// # Errors
///
/// Returns an error if WooCommerce is selected without credentials or its
/// HTTP client cannot be built.
pub fn build_adapters(config: &ApiConfig, pool: PgPool) -> Result<Adapters, CommerceError> {
    let woocommerce = config
        .woocommerce
        .as_ref()
        .map(WooCommerceClient::new)
        .transpose()?;

    let adapters = match config.backend {
        CommerceBackend::Local => Adapters {
            products: Arc::new(LocalProductAdapter::new(pool.clone())),
            orders: Arc::new(LocalOrderAdapter::new(pool)),
            woocommerce,
        },
        CommerceBackend::WooCommerce => {
            let client = woocommerce
                .clone()
                .ok_or(CommerceError::NotConfigured("WC_CONSUMER_KEY / WC_CONSUMER_SECRET"))?;
            Adapters {
                products: Arc::new(WooCommerceProductAdapter::new(client.clone(), pool.clone())),
                orders: Arc::new(WooCommerceOrderAdapter::new(client, pool)),
                woocommerce,
            }
        }
    };

    tracing::info!(backend = ?config.backend, "Commerce adapters ready");
    Ok(adapters)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_normalization() {
        let query = ProductQuery {
            category: Some("  ".to_string()),
            search: Some("onion".to_string()),
            page: 0,
            per_page: 500,
        }
        .normalized();

        assert_eq!(query.category, None);
        assert_eq!(query.search.as_deref(), Some("onion"));
        assert_eq!(query.page, 1);
        assert_eq!(query.per_page, ProductQuery::MAX_PER_PAGE);
        assert_eq!(query.offset(), 0);
    }

    #[test]
    fn test_offset() {
        let query = ProductQuery {
            page: 3,
            per_page: 20,
            ..ProductQuery::default()
        };
        assert_eq!(query.offset(), 40);
    }

    #[test]
    fn test_badge() {
        assert_eq!(CatalogProduct::badge_for(true), Some("Certified Organic"));
        assert_eq!(CatalogProduct::badge_for(false), None);
    }
}
