//! Coupon repository.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;

use super::RepositoryError;
use crate::models::Coupon;

/// Repository for coupon database operations.
pub struct CouponRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> CouponRepository<'a> {
    /// Create a new coupon repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Find an active coupon by code, ignoring case.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_active_by_code(&self, code: &str) -> Result<Option<Coupon>, RepositoryError> {
        let coupon = sqlx::query_as::<_, Coupon>(
            "SELECT * FROM coupons WHERE UPPER(code) = UPPER($1) AND is_active",
        )
        .bind(code.trim())
        .fetch_optional(self.pool)
        .await?;
        Ok(coupon)
    }

    /// Active coupons that have not expired at `now`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_available(&self, now: DateTime<Utc>) -> Result<Vec<Coupon>, RepositoryError> {
        let coupons = sqlx::query_as::<_, Coupon>(
            r"
            SELECT * FROM coupons
            WHERE is_active AND (valid_until IS NULL OR valid_until > $1)
            ORDER BY min_order_value, code
            ",
        )
        .bind(now)
        .fetch_all(self.pool)
        .await?;
        Ok(coupons)
    }

    /// Insert a coupon unless one with the same code exists.
    ///
    /// Returns `None` when the code is already taken.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn create_if_missing(
        &self,
        code: &str,
        discount_amount: Decimal,
        min_order_value: Decimal,
        valid_until: Option<DateTime<Utc>>,
    ) -> Result<Option<Coupon>, RepositoryError> {
        let coupon = sqlx::query_as::<_, Coupon>(
            r"
            INSERT INTO coupons (code, discount_amount, min_order_value, valid_until)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (code) DO NOTHING
            RETURNING *
            ",
        )
        .bind(code)
        .bind(discount_amount)
        .bind(min_order_value)
        .bind(valid_until)
        .fetch_optional(self.pool)
        .await?;
        Ok(coupon)
    }
}
