//! Local database backend.
//!
//! The `products` table is the catalog and the `orders` table is the order
//! system of record, so syncing is a no-op.

use async_trait::async_trait;
use rust_decimal::Decimal;
use sqlx::PgPool;
use tracing::{debug, instrument};

use sabzi_core::ProductId;

use super::{
    CatalogCategory, CatalogProduct, CatalogUnit, CommerceError, OrderAdapter, OrderSync,
    ProductAdapter, ProductQuery,
};
use crate::config::CommerceBackend;
use crate::db::{CatalogRepository, OrderRepository};
use crate::models::{Category, Order, Product, ProductListing, UnitOfMeasure};

impl From<UnitOfMeasure> for CatalogUnit {
    fn from(unit: UnitOfMeasure) -> Self {
        Self {
            id: Some(unit.id.as_i32()),
            name: unit.name,
            symbol: unit.symbol,
        }
    }
}

impl From<ProductListing> for CatalogProduct {
    fn from(listing: ProductListing) -> Self {
        let pricing_unit = listing.pricing_unit().into();
        let weight_unit = listing.weight_unit().into();
        let p = listing.product;

        Self {
            id: p.id.to_string(),
            name: p.name,
            slug: p.slug,
            description: p.description,
            image: p.image,
            base_price: p.base_price,
            discounted_price: p.discounted_price,
            pricing_unit: Some(pricing_unit),
            weight_value: Some(p.weight_value),
            weight_unit: Some(weight_unit),
            is_organic: p.is_organic,
            trust_badge: Self::badge_for(p.is_organic),
            is_active: p.is_active,
            external_id: p.external_id,
        }
    }
}

impl From<Category> for CatalogCategory {
    fn from(category: Category) -> Self {
        Self {
            id: category.id.to_string(),
            name: category.name,
            slug: category.slug,
            image: category.image.unwrap_or_default(),
        }
    }
}

/// Catalog served from the `products` table.
#[derive(Clone)]
pub struct LocalProductAdapter {
    pool: PgPool,
}

impl LocalProductAdapter {
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ProductAdapter for LocalProductAdapter {
    fn backend(&self) -> CommerceBackend {
        CommerceBackend::Local
    }

    #[instrument(skip(self))]
    async fn list_products(
        &self,
        query: &ProductQuery,
    ) -> Result<Vec<CatalogProduct>, CommerceError> {
        let listings = CatalogRepository::new(&self.pool)
            .list_active(
                query.category.as_deref(),
                query.search.as_deref(),
                i64::from(query.per_page),
                query.offset(),
            )
            .await?;
        Ok(listings.into_iter().map(CatalogProduct::from).collect())
    }

    #[instrument(skip(self))]
    async fn get_product(&self, identifier: &str) -> Result<Option<CatalogProduct>, CommerceError> {
        let repo = CatalogRepository::new(&self.pool);

        if let Some(listing) = repo.get_listing_by_slug(identifier).await? {
            return Ok(Some(listing.into()));
        }

        match identifier.parse::<ProductId>() {
            Ok(id) => Ok(repo.get_listing(id).await?.map(CatalogProduct::from)),
            Err(_) => Ok(None),
        }
    }

    async fn list_categories(&self) -> Result<Vec<CatalogCategory>, CommerceError> {
        let categories = CatalogRepository::new(&self.pool).list_categories().await?;
        Ok(categories.into_iter().map(CatalogCategory::from).collect())
    }

    async fn sync_to_local(&self) -> Result<u64, CommerceError> {
        debug!("Local catalog is authoritative; nothing to sync");
        Ok(0)
    }
}

/// Orders kept only in the local database.
#[derive(Clone)]
pub struct LocalOrderAdapter {
    pool: PgPool,
}

impl LocalOrderAdapter {
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl OrderAdapter for LocalOrderAdapter {
    async fn sync_order(&self, sync: OrderSync<'_>) -> Result<Option<String>, CommerceError> {
        debug!(order_id = %sync.order.id, "Order stored locally; no external sync");
        Ok(None)
    }

    async fn update_item_weight(
        &self,
        order: &Order,
        product: &Product,
        weight: Decimal,
    ) -> Result<bool, CommerceError> {
        let found = OrderRepository::new(&self.pool)
            .has_item(order.id, product.id)
            .await?;
        debug!(order_id = %order.id, product_id = %product.id, %weight, found, "Verified local weight");
        Ok(found)
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use sabzi_core::{CategoryId, UnitId};

    use super::*;

    fn listing(is_organic: bool) -> ProductListing {
        let now = Utc::now();
        ProductListing {
            product: Product {
                id: ProductId::generate(),
                category_id: Some(CategoryId::new(2)),
                name: "Desi Tomato".to_string(),
                slug: "desi-tomato".to_string(),
                description: String::new(),
                image: None,
                external_id: Some("812".to_string()),
                external_source: Some("woocommerce".to_string()),
                base_price: Decimal::new(60, 0),
                discounted_price: Some(Decimal::new(50, 0)),
                pricing_unit_id: UnitId::new(1),
                weight_value: Decimal::ONE,
                weight_unit_id: UnitId::new(1),
                is_organic,
                is_active: true,
                created_at: now,
                updated_at: now,
            },
            pricing_unit_name: "Kilogram".to_string(),
            pricing_unit_symbol: "kg".to_string(),
            weight_unit_name: "Kilogram".to_string(),
            weight_unit_symbol: "kg".to_string(),
            category_slug: Some("organic-vegetables".to_string()),
        }
    }

    #[test]
    fn test_listing_conversion() {
        let product = CatalogProduct::from(listing(true));
        assert_eq!(product.slug, "desi-tomato");
        assert_eq!(product.trust_badge, Some("Certified Organic"));
        assert_eq!(product.pricing_unit.as_ref().map(|u| u.symbol.as_str()), Some("kg"));
        assert_eq!(product.external_id.as_deref(), Some("812"));
    }

    #[test]
    fn test_non_organic_has_no_badge() {
        assert_eq!(CatalogProduct::from(listing(false)).trust_badge, None);
    }

    #[test]
    fn test_category_without_image() {
        let category = CatalogCategory::from(Category {
            id: CategoryId::new(4),
            name: "Fruits".to_string(),
            slug: "organic-fruits".to_string(),
            image: None,
        });
        assert_eq!(category.id, "4");
        assert_eq!(category.image, "");
    }
}
