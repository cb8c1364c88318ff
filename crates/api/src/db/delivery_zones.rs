//! Delivery zone repository.

use sqlx::PgPool;

use super::RepositoryError;
use crate::models::DeliveryZone;

/// Repository for delivery zone lookups.
pub struct DeliveryZoneRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> DeliveryZoneRepository<'a> {
    /// Create a new delivery zone repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// The serviceable zone for a zip code, if any.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn find_serviceable(
        &self,
        zip_code: &str,
    ) -> Result<Option<DeliveryZone>, RepositoryError> {
        let zone = sqlx::query_as::<_, DeliveryZone>(
            "SELECT * FROM delivery_zones WHERE zip_code = $1 AND is_serviceable",
        )
        .bind(zip_code.trim())
        .fetch_optional(self.pool)
        .await?;
        Ok(zone)
    }

    /// Insert a zone, or refresh the existing one for the zip code.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn upsert(
        &self,
        zip_code: &str,
        city: &str,
        delivery_time_hrs: i32,
    ) -> Result<DeliveryZone, RepositoryError> {
        let zone = sqlx::query_as::<_, DeliveryZone>(
            r"
            INSERT INTO delivery_zones (zip_code, city, delivery_time_hrs)
            VALUES ($1, $2, $3)
            ON CONFLICT (zip_code) DO UPDATE SET
                city = EXCLUDED.city,
                delivery_time_hrs = EXCLUDED.delivery_time_hrs,
                is_serviceable = TRUE
            RETURNING *
            ",
        )
        .bind(zip_code)
        .bind(city)
        .bind(delivery_time_hrs)
        .fetch_one(self.pool)
        .await?;
        Ok(zone)
    }
}
