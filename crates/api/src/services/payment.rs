//! Mock card/UPI gateway.
//!
//! Placement only initiates a payment; completion arrives through the
//! payment webhook.

use rand::Rng;
use rust_decimal::Decimal;
use serde::Serialize;

/// Hosted checkout page clients are sent to.
pub const GATEWAY_URL: &str = "https://mock-gateway.com/pay";

/// Payment initiation payload returned to the client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PaymentInitiation {
    /// Gateway payment ID, `pay_` followed by 10 hex digits.
    pub id: String,
    pub amount: Decimal,
    pub provider: &'static str,
    pub status: &'static str,
    pub gateway_url: &'static str,
}

/// Start a gateway payment for `amount`.
#[must_use]
pub fn initiate(provider: &'static str, amount: Decimal) -> PaymentInitiation {
    let suffix: u64 = rand::rng().random_range(0..=0xff_ffff_ffff);
    PaymentInitiation {
        id: format!("pay_{suffix:010x}"),
        amount,
        provider,
        status: "INITIATED",
        gateway_url: GATEWAY_URL,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_payment_id_shape() {
        let payment = initiate("RAZORPAY", Decimal::new(24000, 2));
        let hex = payment.id.strip_prefix("pay_").unwrap_or_default();
        assert_eq!(hex.len(), 10);
        assert!(hex.chars().all(|c| c.is_ascii_hexdigit()));
        assert_eq!(payment.status, "INITIATED");
        assert_eq!(payment.gateway_url, GATEWAY_URL);
    }
}
