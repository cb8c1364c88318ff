//! Coupon eligibility rules.
//!
//! The same checks run for `POST /api/coupons/apply` and at order placement.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;
use thiserror::Error;

use sabzi_core::{Price, UserId};

use crate::db::{CouponRepository, OrderRepository, RepositoryError};
use crate::models::Coupon;

/// Reasons a coupon cannot be used.
#[derive(Debug, Error)]
pub enum CouponError {
    #[error("Invalid Coupon Code")]
    Invalid,

    #[error("Coupon Expired")]
    Expired,

    #[error("This offer is for new users only.")]
    NewUsersOnly,

    #[error("Minimum order value of {} required", rupees(.minimum))]
    BelowMinimum { minimum: Decimal },

    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

fn rupees(amount: &Decimal) -> String {
    Price::inr(*amount).display_short()
}

/// Check a coupon already loaded from the database.
///
/// `has_completed_order` is only consulted for new-user codes.
///
/// # Errors
///
/// Returns the first rule the coupon fails.
pub fn check_eligibility(
    coupon: &Coupon,
    order_total: Decimal,
    has_completed_order: bool,
    now: DateTime<Utc>,
) -> Result<(), CouponError> {
    if !coupon.is_active {
        return Err(CouponError::Invalid);
    }
    if coupon.is_expired_at(now) {
        return Err(CouponError::Expired);
    }
    if coupon.is_new_user_only() && has_completed_order {
        return Err(CouponError::NewUsersOnly);
    }
    if order_total < coupon.min_order_value {
        return Err(CouponError::BelowMinimum {
            minimum: coupon.min_order_value,
        });
    }
    Ok(())
}

/// Coupon lookups and validation.
pub struct CouponService<'a> {
    coupons: CouponRepository<'a>,
    orders: OrderRepository<'a>,
}

impl<'a> CouponService<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self {
            coupons: CouponRepository::new(pool),
            orders: OrderRepository::new(pool),
        }
    }

    /// Load a coupon by code and check it for this user and order total.
    ///
    /// # Errors
    ///
    /// Returns `CouponError::Invalid` for unknown or inactive codes, or the
    /// first eligibility rule the coupon fails.
    #[tracing::instrument(skip(self))]
    pub async fn validate(
        &self,
        code: &str,
        order_total: Decimal,
        user_id: UserId,
    ) -> Result<Coupon, CouponError> {
        let coupon = self
            .coupons
            .get_active_by_code(code)
            .await?
            .ok_or(CouponError::Invalid)?;

        let has_completed_order = if coupon.is_new_user_only() {
            self.orders.has_completed_order(user_id).await?
        } else {
            false
        };

        check_eligibility(&coupon, order_total, has_completed_order, Utc::now())?;
        Ok(coupon)
    }

    /// Coupons currently on offer.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_available(&self) -> Result<Vec<Coupon>, RepositoryError> {
        self.coupons.list_available(Utc::now()).await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::Duration;
    use sabzi_core::CouponId;

    use super::*;

    fn coupon(code: &str, min: i64) -> Coupon {
        Coupon {
            id: CouponId::new(1),
            code: code.to_string(),
            discount_amount: Decimal::new(50, 0),
            min_order_value: Decimal::new(min, 0),
            is_active: true,
            valid_until: None,
        }
    }

    #[test]
    fn test_accepts_eligible_coupon() {
        let c = coupon("ORGANIC20", 100);
        assert!(check_eligibility(&c, Decimal::new(100, 0), true, Utc::now()).is_ok());
    }

    #[test]
    fn test_rejects_below_minimum() {
        let c = coupon("WELCOME50", 150);
        let err = check_eligibility(&c, Decimal::new(149, 0), false, Utc::now()).unwrap_err();
        assert_eq!(err.to_string(), "Minimum order value of ₹150 required");
    }

    #[test]
    fn test_rejects_expired() {
        let now = Utc::now();
        let mut c = coupon("SAVE100", 500);
        c.valid_until = Some(now - Duration::days(1));
        assert!(matches!(
            check_eligibility(&c, Decimal::new(900, 0), false, now),
            Err(CouponError::Expired)
        ));
    }

    #[test]
    fn test_rejects_inactive() {
        let mut c = coupon("SAVE100", 500);
        c.is_active = false;
        assert!(matches!(
            check_eligibility(&c, Decimal::new(900, 0), false, Utc::now()),
            Err(CouponError::Invalid)
        ));
    }

    #[test]
    fn test_welcome_code_for_new_users_only() {
        let c = coupon("WELCOME50", 150);
        let err = check_eligibility(&c, Decimal::new(200, 0), true, Utc::now()).unwrap_err();
        assert_eq!(err.to_string(), "This offer is for new users only.");
        assert!(check_eligibility(&c, Decimal::new(200, 0), false, Utc::now()).is_ok());
    }
}
