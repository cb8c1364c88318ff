//! Discount coupons.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

use sabzi_core::{CouponId, Price};

/// A flat-discount coupon.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Coupon {
    pub id: CouponId,
    pub code: String,
    /// Rupees taken off the order.
    pub discount_amount: Decimal,
    /// Smallest order total the coupon applies to.
    pub min_order_value: Decimal,
    pub is_active: bool,
    pub valid_until: Option<DateTime<Utc>>,
}

impl Coupon {
    /// Code reserved for first-time customers.
    pub const WELCOME_CODE: &'static str = "WELCOME50";

    /// Whether the coupon has passed its expiry.
    #[must_use]
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.valid_until.is_some_and(|until| until < now)
    }

    /// Whether only customers without a completed order may use it.
    #[must_use]
    pub fn is_new_user_only(&self) -> bool {
        self.code.eq_ignore_ascii_case(Self::WELCOME_CODE)
    }

    /// Marketing line shown in the coupon list, e.g. `Get ₹50 OFF above ₹150`.
    #[must_use]
    pub fn description(&self) -> String {
        format!(
            "Get {} OFF above {}",
            Price::inr(self.discount_amount).display_short(),
            Price::inr(self.min_order_value).display_short()
        )
    }
}

#[cfg(test)]
mod tests {
    use chrono::Duration;

    use super::*;

    fn coupon(code: &str) -> Coupon {
        Coupon {
            id: CouponId::new(1),
            code: code.to_string(),
            discount_amount: Decimal::new(5000, 2),
            min_order_value: Decimal::new(150, 0),
            is_active: true,
            valid_until: None,
        }
    }

    #[test]
    fn test_description() {
        assert_eq!(coupon("WELCOME50").description(), "Get ₹50 OFF above ₹150");
    }

    #[test]
    fn test_expiry() {
        let now = Utc::now();
        let mut c = coupon("SAVE100");
        assert!(!c.is_expired_at(now));
        c.valid_until = Some(now - Duration::hours(1));
        assert!(c.is_expired_at(now));
    }

    #[test]
    fn test_welcome_code_is_case_insensitive() {
        assert!(coupon("welcome50").is_new_user_only());
        assert!(!coupon("ORGANIC20").is_new_user_only());
    }
}
