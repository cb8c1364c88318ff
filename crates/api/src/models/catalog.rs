//! Local catalog types.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

use sabzi_core::{CategoryId, ProductId, UnitId};

/// A unit products are priced or weighed in (kg, g, pc).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow)]
pub struct UnitOfMeasure {
    pub id: UnitId,
    pub name: String,
    pub symbol: String,
}

/// A product category.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Category {
    pub id: CategoryId,
    pub name: String,
    pub slug: String,
    /// Icon URL, or the WooCommerce category ID for the external backend.
    pub image: Option<String>,
}

/// A row of the `products` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Product {
    pub id: ProductId,
    pub category_id: Option<CategoryId>,
    pub name: String,
    pub slug: String,
    pub description: String,
    pub image: Option<String>,
    /// ID of the product on the external platform, when mapped.
    pub external_id: Option<String>,
    pub external_source: Option<String>,
    pub base_price: Decimal,
    pub discounted_price: Option<Decimal>,
    pub pricing_unit_id: UnitId,
    pub weight_value: Decimal,
    pub weight_unit_id: UnitId,
    pub is_organic: bool,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Product {
    /// The price a customer pays per pricing unit.
    #[must_use]
    pub fn effective_price(&self) -> Decimal {
        self.discounted_price.unwrap_or(self.base_price)
    }
}

/// A product joined with its units and category.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ProductListing {
    #[sqlx(flatten)]
    pub product: Product,
    pub pricing_unit_name: String,
    pub pricing_unit_symbol: String,
    pub weight_unit_name: String,
    pub weight_unit_symbol: String,
    pub category_slug: Option<String>,
}

impl ProductListing {
    /// The pricing unit as a standalone value.
    #[must_use]
    pub fn pricing_unit(&self) -> UnitOfMeasure {
        UnitOfMeasure {
            id: self.product.pricing_unit_id,
            name: self.pricing_unit_name.clone(),
            symbol: self.pricing_unit_symbol.clone(),
        }
    }

    /// The weight unit as a standalone value.
    #[must_use]
    pub fn weight_unit(&self) -> UnitOfMeasure {
        UnitOfMeasure {
            id: self.product.weight_unit_id,
            name: self.weight_unit_name.clone(),
            symbol: self.weight_unit_symbol.clone(),
        }
    }
}
