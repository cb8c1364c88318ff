//! Catalog reads and cart validation.

use std::collections::HashMap;
use std::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize};
use sqlx::PgPool;
use thiserror::Error;

use sabzi_core::{ProductId, QuantityError, validate_quantity};

use crate::commerce::{
    CatalogCategory, CatalogProduct, CommerceError, ProductAdapter, ProductQuery,
};
use crate::db::{CatalogRepository, RepositoryError};
use crate::models::ProductListing;

/// Upper bound for the unpaginated local product list.
const LOCAL_LISTING_LIMIT: i64 = 1000;

/// A product identifier from a client: local UUID, slug or external ID.
///
/// Clients send WooCommerce IDs as JSON numbers, so both numbers and strings
/// are accepted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ProductRef(String);

impl ProductRef {
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    #[must_use]
    pub fn is_blank(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl fmt::Display for ProductRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ProductRef {
    fn from(s: &str) -> Self {
        Self(s.trim().to_string())
    }
}

impl<'de> Deserialize<'de> for ProductRef {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Text(String),
            Number(u64),
        }

        Ok(match Raw::deserialize(deserializer)? {
            Raw::Text(s) => Self::from(s.as_str()),
            Raw::Number(n) => Self(n.to_string()),
        })
    }
}

/// Errors from catalog operations.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("Product not found")]
    ProductNotFound,

    #[error(transparent)]
    Quantity(#[from] QuantityError),

    #[error(transparent)]
    Commerce(#[from] CommerceError),

    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

/// A validated cart line.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CartItem {
    pub product_id: String,
    pub product_name: String,
    pub quantity: Decimal,
    /// Price per pricing unit the customer will pay.
    pub price: Decimal,
}

impl CartItem {
    /// Build the cart line for a product already checked against `quantity`.
    #[must_use]
    pub fn new(listing: &ProductListing, quantity: Decimal) -> Self {
        Self {
            product_id: listing.product.id.to_string(),
            product_name: listing.product.name.clone(),
            quantity,
            price: listing.product.effective_price(),
        }
    }
}

/// Check a purchase quantity against a product's pricing unit.
///
/// # Errors
///
/// Returns the [`QuantityError`] the quantity violates.
pub fn check_quantity(listing: &ProductListing, quantity: Decimal) -> Result<(), QuantityError> {
    validate_quantity(
        quantity,
        Some(listing.pricing_unit_symbol.as_str()),
        &listing.product.name,
    )
}

/// Catalog access through the configured product adapter.
pub struct ProductService<'a> {
    adapter: &'a dyn ProductAdapter,
    catalog: CatalogRepository<'a>,
}

impl<'a> ProductService<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool, adapter: &'a dyn ProductAdapter) -> Self {
        Self {
            adapter,
            catalog: CatalogRepository::new(pool),
        }
    }

    /// List products.
    ///
    /// # Errors
    ///
    /// Returns an error if the local catalog cannot be read.
    #[tracing::instrument(skip(self))]
    pub async fn list(&self, query: ProductQuery) -> Result<Vec<CatalogProduct>, CatalogError> {
        Ok(self.adapter.list_products(&query.normalized()).await?)
    }

    /// Find a product by slug or ID.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::ProductNotFound` when nothing matches.
    #[tracing::instrument(skip(self))]
    pub async fn get(&self, identifier: &str) -> Result<CatalogProduct, CatalogError> {
        self.adapter
            .get_product(identifier.trim())
            .await?
            .ok_or(CatalogError::ProductNotFound)
    }

    /// List categories.
    ///
    /// # Errors
    ///
    /// Returns an error if the local catalog cannot be read.
    pub async fn categories(&self) -> Result<Vec<CatalogCategory>, CatalogError> {
        Ok(self.adapter.list_categories().await?)
    }

    /// Pull the external catalog into the local database.
    ///
    /// Returns the number of products created.
    ///
    /// # Errors
    ///
    /// Returns the adapter's error if the sync cannot run.
    #[tracing::instrument(skip(self), fields(backend = ?self.adapter.backend()))]
    pub async fn sync_from_external(&self) -> Result<u64, CatalogError> {
        let created = self.adapter.sync_to_local().await?;
        tracing::info!(created, "Catalog sync finished");
        Ok(created)
    }

    /// Active products from the local catalog, as stored.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn local_listings(&self) -> Result<Vec<CatalogProduct>, CatalogError> {
        let rows = self
            .catalog
            .list_active(None, None, LOCAL_LISTING_LIMIT, 0)
            .await?;
        Ok(rows.into_iter().map(CatalogProduct::from).collect())
    }

    /// Local product details keyed by ID, for embedding in wishlist and
    /// subscription responses. Inactive products are included.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn details_by_id(
        &self,
        ids: &[ProductId],
    ) -> Result<HashMap<ProductId, CatalogProduct>, CatalogError> {
        let rows = self.catalog.get_listings(ids).await?;
        Ok(rows
            .into_iter()
            .map(|listing| (listing.product.id, CatalogProduct::from(listing)))
            .collect())
    }

    /// Resolve a product reference to an active local product.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::ProductNotFound` for unknown or inactive
    /// products.
    pub async fn resolve_active(&self, product: &ProductRef) -> Result<ProductListing, CatalogError> {
        self.catalog
            .resolve(product.as_str())
            .await?
            .filter(|l| l.product.is_active)
            .ok_or(CatalogError::ProductNotFound)
    }

    /// Validate a product and quantity before it goes into a cart.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::ProductNotFound` for unknown or inactive
    /// products and `CatalogError::Quantity` for invalid quantities.
    #[tracing::instrument(skip(self))]
    pub async fn validate_cart_item(
        &self,
        product: &ProductRef,
        quantity: Decimal,
    ) -> Result<CartItem, CatalogError> {
        let listing = self.resolve_active(product).await?;
        check_quantity(&listing, quantity)?;
        Ok(CartItem::new(&listing, quantity))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
pub(crate) mod tests {
    use chrono::Utc;
    use sabzi_core::{ProductId, UnitId};

    use super::*;
    use crate::models::Product;

    pub(crate) fn listing(name: &str, unit_symbol: &str, base: i64, discounted: Option<i64>) -> ProductListing {
        let now = Utc::now();
        ProductListing {
            product: Product {
                id: ProductId::generate(),
                category_id: None,
                name: name.to_string(),
                slug: name.to_lowercase().replace(' ', "-"),
                description: String::new(),
                image: None,
                external_id: None,
                external_source: None,
                base_price: Decimal::new(base, 0),
                discounted_price: discounted.map(|d| Decimal::new(d, 0)),
                pricing_unit_id: UnitId::new(1),
                weight_value: Decimal::ONE,
                weight_unit_id: UnitId::new(1),
                is_organic: true,
                is_active: true,
                created_at: now,
                updated_at: now,
            },
            pricing_unit_name: unit_symbol.to_string(),
            pricing_unit_symbol: unit_symbol.to_string(),
            weight_unit_name: unit_symbol.to_string(),
            weight_unit_symbol: unit_symbol.to_string(),
            category_slug: None,
        }
    }

    #[test]
    fn test_product_ref_accepts_numbers_and_strings() {
        let from_number: ProductRef = serde_json::from_value(serde_json::json!(812)).unwrap();
        assert_eq!(from_number.as_str(), "812");

        let from_string: ProductRef =
            serde_json::from_value(serde_json::json!(" desi-tomato ")).unwrap();
        assert_eq!(from_string.as_str(), "desi-tomato");

        let blank: ProductRef = serde_json::from_value(serde_json::json!("")).unwrap();
        assert!(blank.is_blank());
    }

    #[test]
    fn test_cart_item_uses_discounted_price() {
        let tomato = listing("Desi Tomato", "kg", 60, Some(45));
        let item = CartItem::new(&tomato, Decimal::new(15, 1));
        assert_eq!(item.price, Decimal::new(45, 0));
        assert_eq!(item.product_name, "Desi Tomato");

        let onion = listing("Red Onion", "kg", 40, None);
        assert_eq!(CartItem::new(&onion, Decimal::ONE).price, Decimal::new(40, 0));
    }

    #[test]
    fn test_piece_product_rejects_fraction() {
        let lemon = listing("Organic Lemon", "pc", 5, None);
        let err = check_quantity(&lemon, Decimal::new(25, 1)).unwrap_err();
        assert!(matches!(err, QuantityError::Fractional { .. }));
        assert!(check_quantity(&lemon, Decimal::new(3, 0)).is_ok());
    }

    #[test]
    fn test_zero_quantity_rejected() {
        let spinach = listing("Spinach", "g", 30, None);
        assert_eq!(
            check_quantity(&spinach, Decimal::ZERO).unwrap_err(),
            QuantityError::NotPositive
        );
    }
}
