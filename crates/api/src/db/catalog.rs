//! Catalog repository: units, categories and products.
//!
//! Product reads return [`ProductListing`] rows so callers get unit names and
//! the category slug without extra round trips.

use rust_decimal::Decimal;
use sqlx::PgPool;
use tracing::{debug, instrument};
use uuid::Uuid;

use sabzi_core::{CategoryId, ProductId, UnitId};

use super::RepositoryError;
use crate::models::{Category, Product, ProductListing, UnitOfMeasure};

const LISTING_SELECT: &str = r"
    SELECT p.*,
           pu.name AS pricing_unit_name, pu.symbol AS pricing_unit_symbol,
           wu.name AS weight_unit_name, wu.symbol AS weight_unit_symbol,
           c.slug AS category_slug
    FROM products p
    JOIN units_of_measure pu ON pu.id = p.pricing_unit_id
    JOIN units_of_measure wu ON wu.id = p.weight_unit_id
    LEFT JOIN categories c ON c.id = p.category_id
";

/// Fields for creating or refreshing a local product.
#[derive(Debug, Clone)]
pub struct ProductUpsert {
    pub category_id: Option<CategoryId>,
    pub name: String,
    pub slug: String,
    pub description: String,
    pub image: Option<String>,
    pub base_price: Decimal,
    pub discounted_price: Option<Decimal>,
    pub pricing_unit_id: UnitId,
    pub weight_value: Decimal,
    pub weight_unit_id: UnitId,
    pub is_organic: bool,
}

/// A product pulled from an external platform.
#[derive(Debug, Clone)]
pub struct ExternalProductUpsert {
    pub external_id: String,
    pub external_source: &'static str,
    pub name: String,
    pub slug: String,
    pub description: String,
    pub image: Option<String>,
    pub base_price: Decimal,
    pub discounted_price: Option<Decimal>,
    pub is_active: bool,
    /// Unit assigned to newly created rows.
    pub default_unit_id: UnitId,
}

#[derive(sqlx::FromRow)]
struct UpsertOutcome {
    inserted: bool,
}

/// Repository for catalog database operations.
pub struct CatalogRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> CatalogRepository<'a> {
    /// Create a new catalog repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// List active products, filtered by category slug and name search.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    #[instrument(skip(self))]
    pub async fn list_active(
        &self,
        category: Option<&str>,
        search: Option<&str>,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<ProductListing>, RepositoryError> {
        let sql = format!(
            "{LISTING_SELECT}
            WHERE p.is_active
              AND ($1::text IS NULL OR c.slug = $1)
              AND ($2::text IS NULL OR p.name ILIKE '%' || $2 || '%')
            ORDER BY p.name
            LIMIT $3 OFFSET $4"
        );

        let rows = sqlx::query_as::<_, ProductListing>(&sql)
            .bind(category)
            .bind(search)
            .bind(limit)
            .bind(offset)
            .fetch_all(self.pool)
            .await?;

        debug!(count = rows.len(), "Listed active products");
        Ok(rows)
    }

    /// Get an active product by slug.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_listing_by_slug(
        &self,
        slug: &str,
    ) -> Result<Option<ProductListing>, RepositoryError> {
        let sql = format!("{LISTING_SELECT} WHERE p.slug = $1 AND p.is_active");
        let row = sqlx::query_as::<_, ProductListing>(&sql)
            .bind(slug)
            .fetch_optional(self.pool)
            .await?;
        Ok(row)
    }

    /// Get an active product by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_listing(&self, id: ProductId) -> Result<Option<ProductListing>, RepositoryError> {
        let sql = format!("{LISTING_SELECT} WHERE p.id = $1 AND p.is_active");
        let row = sqlx::query_as::<_, ProductListing>(&sql)
            .bind(id)
            .fetch_optional(self.pool)
            .await?;
        Ok(row)
    }

    /// Get products by ID, active or not.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_listings(
        &self,
        ids: &[ProductId],
    ) -> Result<Vec<ProductListing>, RepositoryError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let raw: Vec<Uuid> = ids.iter().map(ProductId::as_uuid).collect();
        let sql = format!("{LISTING_SELECT} WHERE p.id = ANY($1)");
        let rows = sqlx::query_as::<_, ProductListing>(&sql)
            .bind(raw)
            .fetch_all(self.pool)
            .await?;
        Ok(rows)
    }

    /// Get a product row by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_product(&self, id: ProductId) -> Result<Option<Product>, RepositoryError> {
        let row = sqlx::query_as::<_, Product>("SELECT * FROM products WHERE id = $1")
            .bind(id)
            .fetch_optional(self.pool)
            .await?;
        Ok(row)
    }

    /// Get a product row by its external platform ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_by_external_id(
        &self,
        external_id: &str,
    ) -> Result<Option<ProductListing>, RepositoryError> {
        let sql = format!("{LISTING_SELECT} WHERE p.external_id = $1");
        let row = sqlx::query_as::<_, ProductListing>(&sql)
            .bind(external_id)
            .fetch_optional(self.pool)
            .await?;
        Ok(row)
    }

    /// Resolve a client-supplied product reference.
    ///
    /// The identifier is tried as an external ID first, then as a local UUID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    #[instrument(skip(self))]
    pub async fn resolve(&self, identifier: &str) -> Result<Option<ProductListing>, RepositoryError> {
        if let Some(listing) = self.get_by_external_id(identifier).await? {
            return Ok(Some(listing));
        }

        let Ok(id) = identifier.parse::<ProductId>() else {
            return Ok(None);
        };

        let sql = format!("{LISTING_SELECT} WHERE p.id = $1");
        let row = sqlx::query_as::<_, ProductListing>(&sql)
            .bind(id)
            .fetch_optional(self.pool)
            .await?;
        Ok(row)
    }

    /// List all categories by name.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_categories(&self) -> Result<Vec<Category>, RepositoryError> {
        let rows = sqlx::query_as::<_, Category>("SELECT * FROM categories ORDER BY name")
            .fetch_all(self.pool)
            .await?;
        Ok(rows)
    }

    /// Get a category by slug.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_category_by_slug(&self, slug: &str) -> Result<Option<Category>, RepositoryError> {
        let row = sqlx::query_as::<_, Category>("SELECT * FROM categories WHERE slug = $1")
            .bind(slug)
            .fetch_optional(self.pool)
            .await?;
        Ok(row)
    }

    /// Get a unit by symbol (`kg`, `pc`, ...).
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_unit_by_symbol(
        &self,
        symbol: &str,
    ) -> Result<Option<UnitOfMeasure>, RepositoryError> {
        let row = sqlx::query_as::<_, UnitOfMeasure>(
            "SELECT * FROM units_of_measure WHERE symbol = $1",
        )
        .bind(symbol)
        .fetch_optional(self.pool)
        .await?;
        Ok(row)
    }

    /// Insert a unit, or rename the existing one with the same symbol.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn upsert_unit(
        &self,
        name: &str,
        symbol: &str,
    ) -> Result<UnitOfMeasure, RepositoryError> {
        let row = sqlx::query_as::<_, UnitOfMeasure>(
            r"
            INSERT INTO units_of_measure (name, symbol)
            VALUES ($1, $2)
            ON CONFLICT (symbol) DO UPDATE SET name = EXCLUDED.name
            RETURNING *
            ",
        )
        .bind(name)
        .bind(symbol)
        .fetch_one(self.pool)
        .await
        .map_err(|e| RepositoryError::from_insert(e, "unit"))?;
        Ok(row)
    }

    /// Insert a category, or refresh the existing one with the same slug.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn upsert_category(
        &self,
        name: &str,
        slug: &str,
        image: Option<&str>,
    ) -> Result<Category, RepositoryError> {
        let row = sqlx::query_as::<_, Category>(
            r"
            INSERT INTO categories (name, slug, image)
            VALUES ($1, $2, $3)
            ON CONFLICT (slug) DO UPDATE SET name = EXCLUDED.name, image = EXCLUDED.image
            RETURNING *
            ",
        )
        .bind(name)
        .bind(slug)
        .bind(image)
        .fetch_one(self.pool)
        .await?;
        Ok(row)
    }

    /// Insert a product, or refresh the existing one with the same slug.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    #[instrument(skip(self, product), fields(slug = %product.slug))]
    pub async fn upsert_product(&self, product: &ProductUpsert) -> Result<Product, RepositoryError> {
        let row = sqlx::query_as::<_, Product>(
            r"
            INSERT INTO products
                (id, category_id, name, slug, description, image, base_price,
                 discounted_price, pricing_unit_id, weight_value, weight_unit_id, is_organic)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            ON CONFLICT (slug) DO UPDATE SET
                category_id = EXCLUDED.category_id,
                name = EXCLUDED.name,
                description = EXCLUDED.description,
                image = EXCLUDED.image,
                base_price = EXCLUDED.base_price,
                discounted_price = EXCLUDED.discounted_price,
                pricing_unit_id = EXCLUDED.pricing_unit_id,
                weight_value = EXCLUDED.weight_value,
                weight_unit_id = EXCLUDED.weight_unit_id,
                is_organic = EXCLUDED.is_organic,
                updated_at = NOW()
            RETURNING *
            ",
        )
        .bind(ProductId::generate())
        .bind(product.category_id)
        .bind(&product.name)
        .bind(&product.slug)
        .bind(&product.description)
        .bind(&product.image)
        .bind(product.base_price)
        .bind(product.discounted_price)
        .bind(product.pricing_unit_id)
        .bind(product.weight_value)
        .bind(product.weight_unit_id)
        .bind(product.is_organic)
        .fetch_one(self.pool)
        .await?;
        Ok(row)
    }

    /// Insert or refresh a product keyed by its external ID.
    ///
    /// Existing rows keep their units. Returns `true` if a new row was created.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the slug belongs to another product.
    #[instrument(skip(self, product), fields(external_id = %product.external_id))]
    pub async fn upsert_external(
        &self,
        product: &ExternalProductUpsert,
    ) -> Result<bool, RepositoryError> {
        let outcome = sqlx::query_as::<_, UpsertOutcome>(
            r"
            INSERT INTO products
                (id, name, slug, description, image, external_id, external_source,
                 base_price, discounted_price, is_active, pricing_unit_id, weight_value,
                 weight_unit_id)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, 1, $11)
            ON CONFLICT (external_id) DO UPDATE SET
                name = EXCLUDED.name,
                description = EXCLUDED.description,
                image = EXCLUDED.image,
                external_source = EXCLUDED.external_source,
                base_price = EXCLUDED.base_price,
                discounted_price = EXCLUDED.discounted_price,
                is_active = EXCLUDED.is_active,
                updated_at = NOW()
            RETURNING (xmax = 0) AS inserted
            ",
        )
        .bind(ProductId::generate())
        .bind(&product.name)
        .bind(&product.slug)
        .bind(&product.description)
        .bind(&product.image)
        .bind(&product.external_id)
        .bind(product.external_source)
        .bind(product.base_price)
        .bind(product.discounted_price)
        .bind(product.is_active)
        .bind(product.default_unit_id)
        .fetch_one(self.pool)
        .await
        .map_err(|e| RepositoryError::from_insert(e, "product slug"))?;

        Ok(outcome.inserted)
    }
}
